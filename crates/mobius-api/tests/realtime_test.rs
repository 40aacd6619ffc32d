#![allow(clippy::unwrap_used)]
// Realtime channel tests against a local tungstenite acceptor.

use std::sync::Arc;
use std::time::Duration;

use futures_util::SinkExt;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

use mobius_api::{MemoryTokenStore, MessageHandler, MobiusClient, Session, TransportConfig};

const WAIT: Duration = Duration::from_secs(5);

/// Accept one connection, report its request target, send `frames`, close.
async fn serve_once(frames: Vec<&'static str>) -> (u16, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (target_tx, target_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            let _ = target_tx.send(req.uri().to_string());
            Ok(resp)
        };
        let mut ws = tokio_tungstenite::accept_hdr_async(stream, callback)
            .await
            .unwrap();

        for frame in frames {
            ws.send(Message::Text(frame.into())).await.unwrap();
        }
        ws.close(None).await.unwrap();
    });

    (port, target_rx)
}

fn client_for(port: u16, token: Option<&str>) -> MobiusClient {
    let session = match token {
        Some(t) => Session::new(Arc::new(MemoryTokenStore::with_token(t))),
        None => Session::in_memory(),
    };
    MobiusClient::new(
        &TransportConfig::new(format!("http://127.0.0.1:{port}/api/v1")),
        session,
    )
    .unwrap()
}

#[tokio::test]
async fn test_connects_with_token_and_forwards_json_frames() {
    let (port, target_rx) = serve_once(vec![
        "not json",
        r#"{"type":"device_status_change","device_id":"d-1","status":"offline"}"#,
    ])
    .await;

    let client = client_for(port, Some("tok"));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handler: MessageHandler = Box::new(move |event| {
        let _ = tx.send(event);
    });

    let handle = client.create_websocket(Some(handler)).unwrap();
    assert_eq!(
        handle.url().as_str(),
        format!("ws://127.0.0.1:{port}/ws?token=tok")
    );

    let target = tokio::time::timeout(WAIT, target_rx).await.unwrap().unwrap();
    assert_eq!(target, "/ws?token=tok");

    let event = tokio::time::timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(
        event,
        json!({ "type": "device_status_change", "device_id": "d-1", "status": "offline" })
    );

    // Server closed; the task ends without reconnecting.
    tokio::time::timeout(WAIT, handle.closed()).await.unwrap();
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_connects_without_token_query() {
    let (port, target_rx) = serve_once(vec![r#"{"type":"connection"}"#]).await;

    let client = client_for(port, None);
    let handle = client.create_websocket(None).unwrap();

    let target = tokio::time::timeout(WAIT, target_rx).await.unwrap().unwrap();
    assert_eq!(target, "/ws");

    tokio::time::timeout(WAIT, handle.closed()).await.unwrap();
}

#[tokio::test]
async fn test_failed_handshake_ends_task() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let client = client_for(port, Some("tok"));
    let handle = client.create_websocket(None).unwrap();

    tokio::time::timeout(WAIT, handle.closed()).await.unwrap();
}

#[tokio::test]
async fn test_shutdown_stops_open_channel() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        // Hold the socket open until the client closes it.
        while let Some(Ok(_)) = futures_util::StreamExt::next(&mut ws).await {}
    });

    let client = client_for(port, Some("tok"));
    let handle = client.create_websocket(None).unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!handle.is_finished());

    handle.shutdown();
    tokio::time::timeout(WAIT, handle.closed()).await.unwrap();
}
