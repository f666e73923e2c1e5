//! Serve command: the message channel as JSON lines on stdin/stdout.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{recv_skip_lag, CommandResult};
use extkbd::input::{open_evdev_keyboard, spawn_evdev_reader};
use extkbd::{BoxedHost, BridgeConfig, KeyboardBridge, MethodResponse, WireRequest};

async fn write_line(out: &mut tokio::io::Stdout, value: &Value) -> CommandResult {
    let mut buf = serde_json::to_vec(value)?;
    buf.push(b'\n');
    out.write_all(&buf).await?;
    out.flush().await?;
    Ok(())
}

/// Reply for a line that is not a valid request
fn invalid_request(err: &serde_json::Error) -> Value {
    MethodResponse::Error {
        code: "INVALID_REQUEST".to_string(),
        message: err.to_string(),
        details: None,
    }
    .to_wire(0)
}

/// Run the channel until stdin closes
///
/// `input` enables an evdev key source: `Some(None)` picks the first
/// keyboard, `Some(Some(path))` a specific device.
pub async fn serve(
    host: BoxedHost,
    config: &BridgeConfig,
    input: Option<Option<PathBuf>>,
) -> CommandResult {
    let mut bridge = KeyboardBridge::new(host, config);
    let mut host_rx = bridge.attach()?;
    let mut notes = bridge.subscribe();

    // Key events from the optional evdev reader; the sender is kept alive
    // so the receiver stays pending when there is no reader.
    let (key_tx, mut key_rx) = mpsc::unbounded_channel();
    let shutdown = Arc::new(AtomicBool::new(false));
    if let Some(path) = input {
        let device = open_evdev_keyboard(path.as_deref())?;
        spawn_evdev_reader(device, key_tx.clone(), Arc::clone(&shutdown))?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    info!("Serving channel '{}' on stdin/stdout", config.channel_name);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("stdin closed, shutting down");
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let reply = match WireRequest::parse(line) {
                    Ok(req) => bridge.handle_method_call(&req.call).to_wire(req.id),
                    Err(e) => {
                        warn!("Invalid request: {}", e);
                        invalid_request(&e)
                    }
                };
                write_line(&mut stdout, &reply).await?;
            }
            event = recv_skip_lag(&mut host_rx) => {
                let Some(event) = event else {
                    warn!("Host event channel closed");
                    break;
                };
                bridge.handle_host_event(&event);
            }
            Some(key) = key_rx.recv() => {
                if !bridge.handle_key_event(&key) {
                    debug!("Key passed through: {}", key.code);
                }
            }
            note = recv_skip_lag(&mut notes) => {
                let Some(note) = note else {
                    break;
                };
                write_line(&mut stdout, &note.to_wire()).await?;
            }
        }
    }

    drop(key_tx);
    shutdown.store(true, Ordering::Relaxed);
    bridge.detach();
    Ok(())
}
