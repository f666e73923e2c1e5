//! Watch command: print host notifications.

use super::{ctrl_c_channel, describe, recv_skip_lag, CommandResult};
use extkbd::{BoxedHost, BridgeConfig, KeyboardBridge};
use tracing::info;

/// Print attach, detach and permission notifications until Ctrl-C
pub async fn watch(host: BoxedHost, config: &BridgeConfig) -> CommandResult {
    let mut bridge = KeyboardBridge::new(host, config);
    let mut host_rx = bridge.attach()?;
    let mut notes = bridge.subscribe();
    let mut ctrl_c = ctrl_c_channel()?;

    info!("Watching USB events. Press Ctrl+C to exit.");

    loop {
        tokio::select! {
            event = recv_skip_lag(&mut host_rx) => {
                let Some(event) = event else {
                    break;
                };
                bridge.handle_host_event(&event);
            }
            note = recv_skip_lag(&mut notes) => {
                let Some(note) = note else {
                    break;
                };
                println!("{}", describe(&note));
            }
            _ = ctrl_c.recv() => break,
        }
    }

    bridge.detach();
    Ok(())
}
