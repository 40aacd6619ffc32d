//! Realtime channel.
//!
//! Opens a single WebSocket connection to the server's `/ws` endpoint,
//! authenticated by the session token in the query string. Text frames
//! are parsed as JSON and handed to an optional callback. There is no
//! reconnection: when the connection drops, the task ends and the
//! caller decides whether to open a new one.
//!
//! # Example
//!
//! ```rust,ignore
//! use mobius_api::{MobiusClient, MessageHandler};
//!
//! let handler: MessageHandler = Box::new(|event| println!("{event}"));
//! let handle = client.create_websocket(Some(handler))?;
//!
//! tokio::signal::ctrl_c().await?;
//! handle.shutdown();
//! handle.closed().await;
//! ```

use futures_util::StreamExt;
use secrecy::ExposeSecret;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use url::Url;

use crate::client::MobiusClient;
use crate::error::Error;

/// API path suffix stripped from the base URL before appending `/ws`.
const API_PATH_SUFFIX: &str = "/api/v1";

/// Callback receiving each parsed frame.
pub type MessageHandler = Box<dyn Fn(serde_json::Value) + Send + Sync + 'static>;

// ── RealtimeHandle ──────────────────────────────────────────────────

/// Handle to a running realtime connection.
pub struct RealtimeHandle {
    url: Url,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RealtimeHandle {
    /// The URL the channel connects to (includes the token).
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Ask the connection task to close the socket and exit.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Whether the connection task has already exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the connection task to exit.
    pub async fn closed(self) {
        if let Err(e) = self.task.await {
            error!(error = %e, "realtime task panicked");
        }
    }
}

impl std::fmt::Debug for RealtimeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeHandle")
            .field("endpoint", &redacted(&self.url))
            .field("finished", &self.task.is_finished())
            .finish_non_exhaustive()
    }
}

// ── Factory ─────────────────────────────────────────────────────────

impl MobiusClient {
    /// Realtime endpoint derived from the base URL.
    ///
    /// `http://host:8081/api/v1` with token `tok` gives
    /// `ws://host:8081/ws?token=tok`. Without a token the query is omitted.
    pub fn websocket_url(&self) -> Result<Url, Error> {
        let token = self.session().token();
        let token = token
            .as_ref()
            .map(ExposeSecret::expose_secret)
            .filter(|t| !t.is_empty());
        realtime_url(self.base_url(), token)
    }

    /// Open the realtime channel on the current tokio runtime.
    ///
    /// Returns as soon as the connection task is spawned. Handshake
    /// failures, socket errors and close frames are logged, not returned.
    pub fn create_websocket(
        &self,
        on_message: Option<MessageHandler>,
    ) -> Result<RealtimeHandle, Error> {
        let url = self.websocket_url()?;
        let cancel = CancellationToken::new();

        let task_url = url.clone();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            run_channel(task_url, on_message, task_cancel).await;
        });

        Ok(RealtimeHandle { url, cancel, task })
    }
}

/// Swap the scheme, drop the API suffix, append `/ws` and the token.
pub(crate) fn realtime_url(base: &Url, token: Option<&str>) -> Result<Url, Error> {
    let scheme = match base.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(Error::WebSocketConnect(format!(
                "unsupported scheme for realtime channel: {other}"
            )));
        }
    };

    let mut url = base.clone();
    url.set_scheme(scheme)
        .map_err(|()| Error::WebSocketConnect(format!("cannot switch {base} to {scheme}")))?;

    let path = base.path().trim_end_matches('/');
    let prefix = path.strip_suffix(API_PATH_SUFFIX).unwrap_or(path);
    url.set_path(&format!("{prefix}/ws"));
    url.set_query(None);
    url.set_fragment(None);

    if let Some(token) = token {
        url.query_pairs_mut().append_pair("token", token);
    }

    Ok(url)
}

/// Scheme, host and path only; keeps the token out of logs.
fn redacted(url: &Url) -> String {
    format!(
        "{}://{}{}",
        url.scheme(),
        url.host_str().unwrap_or_default(),
        url.path()
    )
}

// ── Connection lifecycle ────────────────────────────────────────────

async fn run_channel(url: Url, on_message: Option<MessageHandler>, cancel: CancellationToken) {
    let endpoint = redacted(&url);
    info!(endpoint = %endpoint, "connecting realtime channel");

    let uri: tungstenite::http::Uri = match url.as_str().parse() {
        Ok(uri) => uri,
        Err(e) => {
            error!(error = %e, "invalid realtime URI");
            return;
        }
    };

    let connect = tokio_tungstenite::connect_async(ClientRequestBuilder::new(uri));
    let mut ws = tokio::select! {
        biased;
        () = cancel.cancelled() => return,
        result = connect => match result {
            Ok((stream, _response)) => stream,
            Err(e) => {
                error!(endpoint = %endpoint, error = %e, "realtime connection failed");
                return;
            }
        },
    };

    info!(endpoint = %endpoint, "realtime channel connected");

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("realtime channel shutting down");
                if let Err(e) = ws.close(None).await {
                    debug!(error = %e, "close handshake failed");
                }
                break;
            }
            frame = ws.next() => match frame {
                Some(Ok(tungstenite::Message::Text(text))) => {
                    dispatch_frame(&text, on_message.as_ref());
                }
                Some(Ok(tungstenite::Message::Close(frame))) => {
                    if let Some(ref cf) = frame {
                        info!(code = %cf.code, reason = %cf.reason, "realtime channel closed");
                    } else {
                        info!("realtime channel closed (no payload)");
                    }
                    break;
                }
                Some(Ok(_)) => {
                    // Binary, Ping, Pong -- tungstenite answers pings itself
                }
                Some(Err(e)) => {
                    error!(error = %e, "realtime channel error");
                    break;
                }
                None => {
                    info!("realtime stream ended");
                    break;
                }
            },
        }
    }
}

/// Parse one text frame and forward it. Bad JSON is logged and dropped.
fn dispatch_frame(text: &str, on_message: Option<&MessageHandler>) {
    let Some(handler) = on_message else {
        return;
    };

    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => handler(value),
        Err(e) => error!(error = %e, "failed to parse realtime message"),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;

    fn base(raw: &str) -> Url {
        crate::transport::normalize_base_url(raw).unwrap()
    }

    #[test]
    fn http_base_maps_to_ws() {
        let url = realtime_url(&base("http://localhost:8081/api/v1"), Some("tok")).unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8081/ws?token=tok");
    }

    #[test]
    fn https_base_maps_to_wss() {
        let url = realtime_url(&base("https://mdm.example.com/api/v1/"), Some("abc")).unwrap();
        assert_eq!(url.as_str(), "wss://mdm.example.com/ws?token=abc");
    }

    #[test]
    fn prefix_before_api_path_is_kept() {
        let url = realtime_url(&base("https://example.com/mobius/api/v1"), Some("t")).unwrap();
        assert_eq!(url.as_str(), "wss://example.com/mobius/ws?token=t");
    }

    #[test]
    fn missing_token_omits_query() {
        let url = realtime_url(&base("http://localhost:8081/api/v1"), None).unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8081/ws");
    }

    #[test]
    fn token_is_query_encoded() {
        let url = realtime_url(&base("http://localhost:8081/api/v1"), Some("a+b/c=")).unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8081/ws?token=a%2Bb%2Fc%3D");
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        let result = realtime_url(&base("ftp://localhost/api/v1"), Some("tok"));
        assert!(matches!(result, Err(Error::WebSocketConnect(_))));
    }

    #[test]
    fn redacted_url_hides_token() {
        let url = Url::parse("wss://example.com/ws?token=secret").unwrap();
        assert_eq!(redacted(&url), "wss://example.com/ws");
    }

    #[test]
    fn dispatch_forwards_json_and_drops_garbage() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: MessageHandler = Box::new(move |v| sink.lock().unwrap().push(v));

        dispatch_frame("not json at all", Some(&handler));
        dispatch_frame(r#"{"type":"device_status_change"}"#, Some(&handler));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], json!({ "type": "device_status_change" }));
    }

    #[test]
    fn dispatch_without_handler_is_a_no_op() {
        dispatch_frame(r#"{"type":"connection"}"#, None);
    }
}
