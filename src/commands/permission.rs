//! Permission request command.

use std::time::Duration;

use super::{describe, recv_skip_lag, CommandResult};
use extkbd::{BoxedHost, BridgeConfig, KeyboardBridge, Notification};

/// Request access to a device and wait for the result
pub async fn request(
    host: BoxedHost,
    config: &BridgeConfig,
    device_id: &str,
    wait: u64,
) -> CommandResult {
    let mut bridge = KeyboardBridge::new(host, config);
    let mut host_rx = bridge.attach()?;
    let mut notes = bridge.subscribe();

    bridge.request_permission(Some(device_id))?;
    println!("Permission requested for {device_id}, waiting up to {wait}s...");

    let deadline = tokio::time::sleep(Duration::from_secs(wait));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            event = recv_skip_lag(&mut host_rx) => {
                let Some(event) = event else {
                    anyhow::bail!("Host event channel closed");
                };
                bridge.handle_host_event(&event);
            }
            note = recv_skip_lag(&mut notes) => {
                match note {
                    Some(note @ Notification::PermissionGranted { .. })
                    | Some(note @ Notification::PermissionDenied { .. }) => {
                        println!("{}", describe(&note));
                        break;
                    }
                    Some(_) => {}
                    None => break,
                }
            }
            _ = &mut deadline => {
                println!("No permission result within {wait}s");
                break;
            }
        }
    }

    bridge.detach();
    Ok(())
}
