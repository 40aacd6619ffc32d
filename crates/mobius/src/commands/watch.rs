//! Realtime event stream.

use mobius_api::{MessageHandler, MobiusClient};
use tokio::sync::mpsc;

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

/// One line per event in table mode: time, event type, compact payload.
fn event_line(event: &serde_json::Value) -> String {
    let kind = event
        .get("type")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("event");
    format!(
        "{}  {kind:<20} {}",
        chrono::Local::now().format("%H:%M:%S"),
        output::render_json(event, true)
    )
}

pub async fn handle(
    client: &MobiusClient,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if !client.is_authenticated() {
        tracing::warn!("no session token stored; the server may refuse the realtime channel");
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handler: MessageHandler = Box::new(move |event| {
        // Receiver gone means we're shutting down.
        let _ = tx.send(event);
    });
    let handle = client.create_websocket(Some(handler))?;
    tracing::info!(?handle, "watching realtime events");
    output::print_done("Watching for events (Ctrl+C to stop)", global.quiet);

    let mut seen = 0usize;
    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else {
                    output::print_done("realtime channel closed", global.quiet);
                    break;
                };
                let out = output::render_single(&global.output, &event, event_line, |e| {
                    output::render_json(e, true)
                });
                output::print_output(&out, global.quiet);

                seen += 1;
                if args.count.is_some_and(|n| seen >= n) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted");
                break;
            }
        }
    }

    handle.shutdown();
    handle.closed().await;
    Ok(())
}
