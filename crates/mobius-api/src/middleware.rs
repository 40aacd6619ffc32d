// Request/response middleware
//
// Two single-purpose steps wrapped around every HTTP dispatch:
// `apply_bearer` before send, `intercept_response` after. Kept as free
// functions so each one can be exercised without a live server.

use reqwest::header::{AUTHORIZATION, HeaderValue, RETRY_AFTER};
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use tracing::{debug, warn};

use crate::error::Error;
use crate::session::{Session, SessionEvent};

/// Error body shape returned by the Mobius server.
#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Inject `Authorization: Bearer <token>` when the session holds a token.
///
/// Leaves the request untouched otherwise.
pub fn apply_bearer(builder: RequestBuilder, session: &Session) -> Result<RequestBuilder, Error> {
    let Some(token) = session.token().filter(|t| !t.expose_secret().is_empty()) else {
        return Ok(builder);
    };

    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
        .map_err(|e| Error::InvalidHeader(format!("bearer token: {e}")))?;
    value.set_sensitive(true);

    Ok(builder.header(AUTHORIZATION, value))
}

/// Classify a response.
///
/// - 2xx: returned unchanged.
/// - 401: token cleared, [`SessionEvent::Unauthorized`] emitted, then the
///   rejection is still returned to the caller.
/// - 429: [`Error::RateLimited`].
/// - anything else: [`Error::Api`] with status and body verbatim.
pub async fn intercept_response(
    resp: Response,
    session: &Session,
    path: &str,
) -> Result<Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    if status == StatusCode::UNAUTHORIZED {
        warn!(path, "request rejected with 401, dropping session");
        session.clear();
        session.emit(SessionEvent::Unauthorized { path: path.into() });

        let body = resp.text().await.unwrap_or_default();
        let message = parse_error_body(&body)
            .and_then(|e| e.message.or(e.error))
            .unwrap_or_else(|| "session rejected by server".into());
        return Err(Error::Unauthorized { message });
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        debug!(path, ?retry_after_secs, "rate limited");
        return Err(Error::RateLimited { retry_after_secs });
    }

    let body = resp.text().await.unwrap_or_default();
    Err(api_error(status, body))
}

fn parse_error_body(raw: &str) -> Option<ErrorResponse> {
    serde_json::from_str::<ErrorResponse>(raw).ok()
}

fn api_error(status: StatusCode, body: String) -> Error {
    let (message, code) = match parse_error_body(&body) {
        Some(ErrorResponse { error, message }) => (
            message
                .or_else(|| error.clone())
                .unwrap_or_else(|| status.to_string()),
            error,
        ),
        None if body.is_empty() => (status.to_string(), None),
        None => (body.chars().take(200).collect(), None),
    };

    Error::Api {
        status: status.as_u16(),
        message,
        code,
        body,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Arc;

    use super::*;
    use crate::session::MemoryTokenStore;

    fn build(session: &Session) -> reqwest::Request {
        let builder = reqwest::Client::new().get("http://localhost:8081/api/v1/health");
        apply_bearer(builder, session).unwrap().build().unwrap()
    }

    #[test]
    fn no_token_means_no_authorization_header() {
        let session = Session::in_memory();
        let req = build(&session);
        assert!(req.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn stored_token_becomes_bearer_header() {
        let session = Session::new(Arc::new(MemoryTokenStore::with_token("test-token")));
        let req = build(&session);
        assert_eq!(
            req.headers().get(AUTHORIZATION).unwrap(),
            "Bearer test-token"
        );
        assert!(req.headers().get(AUTHORIZATION).unwrap().is_sensitive());
    }

    #[test]
    fn empty_token_is_not_sent() {
        let session = Session::new(Arc::new(MemoryTokenStore::with_token("")));
        assert!(build(&session).headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn token_with_newline_is_rejected() {
        let session = Session::new(Arc::new(MemoryTokenStore::with_token("bad\ntoken")));
        let builder = reqwest::Client::new().get("http://localhost/");
        assert!(matches!(
            apply_bearer(builder, &session),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn api_error_prefers_server_message() {
        let body = r#"{"error":"Not Found","message":"Device not found","code":404}"#;
        match api_error(StatusCode::NOT_FOUND, body.into()) {
            Error::Api {
                status,
                message,
                code,
                body: raw,
            } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Device not found");
                assert_eq!(code.as_deref(), Some("Not Found"));
                assert_eq!(raw, body);
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn api_error_falls_back_to_raw_body() {
        match api_error(StatusCode::BAD_GATEWAY, "upstream down".into()) {
            Error::Api { message, code, .. } => {
                assert_eq!(message, "upstream down");
                assert!(code.is_none());
            }
            other => panic!("expected Api error, got {other:?}"),
        }

        match api_error(StatusCode::INTERNAL_SERVER_ERROR, String::new()) {
            Error::Api { message, .. } => assert_eq!(message, "500 Internal Server Error"),
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
