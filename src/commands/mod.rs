//! Command handlers for the CLI application.
//!
//! - `scan`: keyboard scan (table or JSON)
//! - `permission`: request access and wait for the answer
//! - `listen`: print decoded key presses
//! - `watch`: print host notifications
//! - `serve`: JSON-lines message channel on stdin/stdout
//! - `list`: every USB device with its classification

pub mod list;
pub mod listen;
pub mod permission;
pub mod scan;
pub mod serve;
pub mod watch;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use extkbd::channel::Notification;
use extkbd::BoxedHost;
use extkbd_host::{LinuxHost, MemoryHost};
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

/// Result type for command handlers
pub type CommandResult = anyhow::Result<()>;

/// Build the host: the in-memory fixture host when a fixture is given,
/// otherwise the OS host
pub fn open_host(fixture: Option<&Path>) -> anyhow::Result<BoxedHost> {
    match fixture {
        Some(path) => {
            info!("Using fixture host from {}", path.display());
            Ok(Arc::new(MemoryHost::load_fixture(path)?))
        }
        None => Ok(Arc::new(LinuxHost::new())),
    }
}

/// Channel that yields once per Ctrl-C
pub fn ctrl_c_channel() -> anyhow::Result<mpsc::UnboundedReceiver<()>> {
    let (tx, rx) = mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })?;
    Ok(rx)
}

/// Receive the next broadcast item, skipping over lag
///
/// Returns `None` once the sender is gone.
pub async fn recv_skip_lag<T: Clone>(rx: &mut broadcast::Receiver<T>) -> Option<T> {
    loop {
        match rx.recv().await {
            Ok(item) => return Some(item),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Missed {} events", n);
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

/// Human-readable one-line description of a notification
pub fn describe(notification: &Notification) -> String {
    match notification {
        Notification::PermissionGranted {
            device_id,
            device_name,
        } => format!("Permission granted: {device_name} ({device_id})"),
        Notification::PermissionDenied { device_id } => format!(
            "Permission denied: {}",
            device_id.as_deref().unwrap_or("unknown device")
        ),
        Notification::DeviceAttached => "USB device attached".to_string(),
        Notification::DeviceDetached => "USB device detached".to_string(),
        Notification::KeyboardInput(text) => format!("Keyboard input: {text:?}"),
    }
}

/// Echo decoded text to the terminal
///
/// `raw` selects raw-mode line endings.
pub fn echo(text: &str, raw: bool) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    for ch in text.chars() {
        match ch {
            '\n' if raw => out.write_all(b"\r\n")?,
            extkbd::decoder::BACKSPACE_CHAR => out.write_all(b"\x08 \x08")?,
            _ => write!(out, "{ch}")?,
        }
    }
    out.flush()
}
