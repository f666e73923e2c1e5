//! Listen command: print decoded key presses.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossterm::event::{Event, EventStream, KeyCode, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use futures::StreamExt;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use super::{ctrl_c_channel, echo, CommandResult};
use extkbd::input::{from_terminal, open_evdev_keyboard, spawn_evdev_reader};
use extkbd::{BoxedHost, BridgeConfig, KeyboardBridge, Notification};

/// Listen for key presses until Ctrl-C
pub async fn listen(
    host: BoxedHost,
    config: &BridgeConfig,
    device: Option<PathBuf>,
) -> CommandResult {
    let mut bridge = KeyboardBridge::new(host, config);
    let mut notes = bridge.subscribe();
    bridge.start_listening();

    let result = match device {
        Some(path) => listen_evdev(&bridge, &mut notes, path).await,
        None => listen_terminal(&bridge, &mut notes).await,
    };

    bridge.stop_listening();
    result
}

/// Print every queued keyboard input notification
fn drain_input(notes: &mut broadcast::Receiver<Notification>, raw: bool) -> CommandResult {
    while let Ok(note) = notes.try_recv() {
        if let Notification::KeyboardInput(text) = note {
            echo(&text, raw)?;
        }
    }
    Ok(())
}

async fn listen_evdev(
    bridge: &KeyboardBridge,
    notes: &mut broadcast::Receiver<Notification>,
    path: PathBuf,
) -> CommandResult {
    let device = open_evdev_keyboard(Some(&path))?;
    let (key_tx, mut key_rx) = mpsc::unbounded_channel();
    let shutdown = Arc::new(AtomicBool::new(false));
    spawn_evdev_reader(device, key_tx, Arc::clone(&shutdown))?;
    let mut ctrl_c = ctrl_c_channel()?;

    info!("Listening on {}. Press Ctrl+C to exit.", path.display());

    loop {
        tokio::select! {
            key = key_rx.recv() => {
                let Some(key) = key else {
                    info!("Keyboard reader stopped");
                    break;
                };
                if !bridge.handle_key_event(&key) {
                    debug!("Key not handled: {}", key.code);
                }
                drain_input(notes, false)?;
            }
            _ = ctrl_c.recv() => break,
        }
    }

    shutdown.store(true, Ordering::Relaxed);
    println!();
    Ok(())
}

async fn listen_terminal(
    bridge: &KeyboardBridge,
    notes: &mut broadcast::Receiver<Notification>,
) -> CommandResult {
    eprintln!("Listening on terminal input. Press Ctrl+C or Esc to exit.");
    enable_raw_mode()?;

    let mut events = EventStream::new();
    let result = async {
        while let Some(event) = events.next().await {
            let Event::Key(key) = event? else {
                continue;
            };
            let ctrl_c =
                key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
            let quit = key.code == KeyCode::Esc || ctrl_c;
            if quit {
                break;
            }
            if let Some(key_event) = from_terminal(&key) {
                bridge.handle_key_event(&key_event);
                drain_input(notes, true)?;
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    disable_raw_mode()?;
    println!();
    result
}
