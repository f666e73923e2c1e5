//! udev hot-plug monitor
//!
//! Runs on its own thread with a current-thread runtime so the udev socket
//! never has to cross threads. Events are forwarded on the host's broadcast
//! channel until the shutdown flag is raised.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_udev::{AsyncMonitorSocket, EventType, MonitorBuilder};
use tracing::{debug, info, warn};

use crate::error::HostError;
use crate::types::HostEvent;

/// How often the monitor wakes up to check the shutdown flag
const SHUTDOWN_POLL: Duration = Duration::from_millis(250);

/// Spawn the monitor thread
pub(crate) fn spawn_monitor(
    tx: broadcast::Sender<HostEvent>,
    shutdown: Arc<AtomicBool>,
) -> Result<JoinHandle<()>, HostError> {
    let handle = std::thread::Builder::new()
        .name("udev-hotplug".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    warn!("Hot-plug runtime failed to start: {}", e);
                    return;
                }
            };
            runtime.block_on(run_monitor(tx, shutdown));
        })?;
    Ok(handle)
}

async fn run_monitor(tx: broadcast::Sender<HostEvent>, shutdown: Arc<AtomicBool>) {
    let socket = match MonitorBuilder::new()
        .and_then(|b| b.match_subsystem_devtype("usb", "usb_device"))
        .and_then(|b| b.listen())
    {
        Ok(socket) => socket,
        Err(e) => {
            warn!("Cannot open udev monitor: {}", e);
            return;
        }
    };

    let mut socket = match AsyncMonitorSocket::new(socket) {
        Ok(socket) => socket,
        Err(e) => {
            warn!("Cannot register udev monitor: {}", e);
            return;
        }
    };

    info!("Hot-plug monitor started");

    while !shutdown.load(Ordering::SeqCst) {
        let event = match tokio::time::timeout(SHUTDOWN_POLL, socket.next()).await {
            Err(_) => continue,
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                warn!("udev monitor error: {}", e);
                continue;
            }
            Ok(Some(Ok(event))) => event,
        };

        let device = event.device();
        let name = device
            .devnode()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| device.syspath().to_string_lossy().to_string());

        let host_event = match event.event_type() {
            EventType::Add => HostEvent::DeviceAttached { name },
            EventType::Remove => HostEvent::DeviceDetached { name },
            other => {
                debug!("Ignoring udev {:?} for {}", other, name);
                continue;
            }
        };

        debug!("Hot-plug: {:?}", host_event);
        if tx.send(host_event).is_err() {
            debug!("No host listener subscribed, hot-plug event dropped");
        }
    }

    info!("Hot-plug monitor stopped");
}
