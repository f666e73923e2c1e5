//! Key event sources
//!
//! Two sources feed the bridge:
//!
//! - evdev keyboards (`/dev/input/event*`), translated from Linux key codes
//!   to HID usages with the shift state tracked across events
//! - terminal key presses from crossterm, for interactive use

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossterm::event::{
    KeyCode as TermKeyCode, KeyEvent as TermKeyEvent, KeyEventKind, KeyModifiers,
};
use evdev::{Device, InputEventKind, Key};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::keycode::{KeyAction, KeyCode, KeyEvent, Modifiers};

/// Linux key code to HID usage
pub fn evdev_to_hid(key: Key) -> Option<KeyCode> {
    let code = match key {
        Key::KEY_A => 0x04,
        Key::KEY_B => 0x05,
        Key::KEY_C => 0x06,
        Key::KEY_D => 0x07,
        Key::KEY_E => 0x08,
        Key::KEY_F => 0x09,
        Key::KEY_G => 0x0A,
        Key::KEY_H => 0x0B,
        Key::KEY_I => 0x0C,
        Key::KEY_J => 0x0D,
        Key::KEY_K => 0x0E,
        Key::KEY_L => 0x0F,
        Key::KEY_M => 0x10,
        Key::KEY_N => 0x11,
        Key::KEY_O => 0x12,
        Key::KEY_P => 0x13,
        Key::KEY_Q => 0x14,
        Key::KEY_R => 0x15,
        Key::KEY_S => 0x16,
        Key::KEY_T => 0x17,
        Key::KEY_U => 0x18,
        Key::KEY_V => 0x19,
        Key::KEY_W => 0x1A,
        Key::KEY_X => 0x1B,
        Key::KEY_Y => 0x1C,
        Key::KEY_Z => 0x1D,
        Key::KEY_1 => 0x1E,
        Key::KEY_2 => 0x1F,
        Key::KEY_3 => 0x20,
        Key::KEY_4 => 0x21,
        Key::KEY_5 => 0x22,
        Key::KEY_6 => 0x23,
        Key::KEY_7 => 0x24,
        Key::KEY_8 => 0x25,
        Key::KEY_9 => 0x26,
        Key::KEY_0 => 0x27,
        Key::KEY_ENTER | Key::KEY_KPENTER => 0x28,
        Key::KEY_ESC => 0x29,
        Key::KEY_BACKSPACE => 0x2A,
        Key::KEY_TAB => 0x2B,
        Key::KEY_SPACE => 0x2C,
        Key::KEY_MINUS => 0x2D,
        Key::KEY_EQUAL => 0x2E,
        Key::KEY_LEFTBRACE => 0x2F,
        Key::KEY_RIGHTBRACE => 0x30,
        Key::KEY_BACKSLASH => 0x31,
        Key::KEY_SEMICOLON => 0x33,
        Key::KEY_APOSTROPHE => 0x34,
        Key::KEY_GRAVE => 0x35,
        Key::KEY_COMMA => 0x36,
        Key::KEY_DOT => 0x37,
        Key::KEY_SLASH => 0x38,
        Key::KEY_CAPSLOCK => 0x39,
        Key::KEY_F1 => 0x3A,
        Key::KEY_F2 => 0x3B,
        Key::KEY_F3 => 0x3C,
        Key::KEY_F4 => 0x3D,
        Key::KEY_F5 => 0x3E,
        Key::KEY_F6 => 0x3F,
        Key::KEY_F7 => 0x40,
        Key::KEY_F8 => 0x41,
        Key::KEY_F9 => 0x42,
        Key::KEY_F10 => 0x43,
        Key::KEY_F11 => 0x44,
        Key::KEY_F12 => 0x45,
        Key::KEY_INSERT => 0x49,
        Key::KEY_HOME => 0x4A,
        Key::KEY_PAGEUP => 0x4B,
        Key::KEY_DELETE => 0x4C,
        Key::KEY_END => 0x4D,
        Key::KEY_PAGEDOWN => 0x4E,
        Key::KEY_RIGHT => 0x4F,
        Key::KEY_LEFT => 0x50,
        Key::KEY_DOWN => 0x51,
        Key::KEY_UP => 0x52,
        Key::KEY_LEFTCTRL => 0xE0,
        Key::KEY_LEFTSHIFT => 0xE1,
        Key::KEY_LEFTALT => 0xE2,
        Key::KEY_LEFTMETA => 0xE3,
        Key::KEY_RIGHTCTRL => 0xE4,
        Key::KEY_RIGHTSHIFT => 0xE5,
        Key::KEY_RIGHTALT => 0xE6,
        Key::KEY_RIGHTMETA => 0xE7,
        _ => return None,
    };
    Some(KeyCode(code))
}

/// Turns raw evdev key events into [`KeyEvent`]s
///
/// evdev reports modifiers as ordinary keys, so the modifier byte is rebuilt
/// from the press/release history.
#[derive(Debug, Default)]
pub struct EvdevTranslator {
    modifiers: Modifiers,
}

impl EvdevTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Translate one key event (`value`: 0 release, 1 press, 2 repeat)
    pub fn translate(&mut self, key: Key, value: i32) -> Option<KeyEvent> {
        let code = evdev_to_hid(key)?;
        let action = match value {
            0 => KeyAction::Up,
            1 | 2 => KeyAction::Down,
            _ => return None,
        };

        if let Some(bit) = code.modifier_bit() {
            self.modifiers = match action {
                KeyAction::Down => self.modifiers.union(bit),
                KeyAction::Up => self.modifiers.without(bit),
            };
        }

        Some(KeyEvent {
            code,
            action,
            modifiers: self.modifiers,
        })
    }
}

/// Translate a terminal key event
///
/// Characters are mapped back to the key that types them on a US layout, so
/// `'!'` becomes shift + "1".
pub fn from_terminal(event: &TermKeyEvent) -> Option<KeyEvent> {
    let action = match event.kind {
        KeyEventKind::Press | KeyEventKind::Repeat => KeyAction::Down,
        KeyEventKind::Release => KeyAction::Up,
    };

    let mut modifiers = Modifiers::NONE;
    if event.modifiers.contains(KeyModifiers::CONTROL) {
        modifiers = modifiers.union(Modifiers::LEFT_CTRL);
    }
    if event.modifiers.contains(KeyModifiers::ALT) {
        modifiers = modifiers.union(Modifiers::LEFT_ALT);
    }

    let code = match event.code {
        TermKeyCode::Char(ch) => {
            let (code, shift) = KeyCode::from_char(ch)?;
            if shift {
                modifiers = modifiers.union(Modifiers::LEFT_SHIFT);
            }
            code
        }
        TermKeyCode::Enter => KeyCode::ENTER,
        TermKeyCode::Backspace => KeyCode::BACKSPACE,
        TermKeyCode::Tab => KeyCode::TAB,
        TermKeyCode::Esc => KeyCode::ESCAPE,
        TermKeyCode::Delete => KeyCode::DELETE,
        TermKeyCode::Left => KeyCode::LEFT,
        TermKeyCode::Right => KeyCode::RIGHT,
        TermKeyCode::Up => KeyCode::UP,
        TermKeyCode::Down => KeyCode::DOWN,
        TermKeyCode::F(n @ 1..=12) => KeyCode(KeyCode::F1.0 + n - 1),
        _ => return None,
    };

    Some(KeyEvent {
        code,
        action,
        modifiers,
    })
}

/// Whether an evdev device looks like a keyboard (has letter keys and Enter)
pub fn is_evdev_keyboard(device: &Device) -> bool {
    device.supported_keys().is_some_and(|keys| {
        keys.contains(Key::KEY_A) && keys.contains(Key::KEY_Z) && keys.contains(Key::KEY_ENTER)
    })
}

/// List evdev keyboards as (path, name)
pub fn list_evdev_keyboards() -> Vec<(PathBuf, String)> {
    let mut keyboards: Vec<_> = evdev::enumerate()
        .filter(|(_, device)| is_evdev_keyboard(device))
        .map(|(path, device)| (path, device.name().unwrap_or("Unknown").to_string()))
        .collect();
    keyboards.sort_by(|a, b| a.0.cmp(&b.0));
    keyboards
}

/// Open an evdev keyboard, or the first one found when `path` is `None`
pub fn open_evdev_keyboard(path: Option<&Path>) -> anyhow::Result<Device> {
    if let Some(path) = path {
        let device = Device::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", path.display(), e))?;
        if !is_evdev_keyboard(&device) {
            warn!("{} does not report letter keys", path.display());
        }
        return Ok(device);
    }

    let (path, name) = list_evdev_keyboards()
        .into_iter()
        .next()
        .ok_or_else(|| {
            anyhow::anyhow!("No evdev keyboard found (is the user in the 'input' group?)")
        })?;
    info!("Using keyboard {} ({})", name, path.display());
    Ok(Device::open(&path)?)
}

/// Read key events from an evdev device on a dedicated thread
///
/// The thread exits when `shutdown` is set (checked after each batch of
/// events), when the receiver is dropped, or on a read error.
pub fn spawn_evdev_reader(
    mut device: Device,
    tx: mpsc::UnboundedSender<KeyEvent>,
    shutdown: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("evdev-reader".into())
        .spawn(move || {
            let mut translator = EvdevTranslator::new();
            while !shutdown.load(Ordering::Relaxed) {
                let events = match device.fetch_events() {
                    Ok(events) => events,
                    Err(e) => {
                        warn!("evdev read failed: {}", e);
                        break;
                    }
                };
                for event in events {
                    let InputEventKind::Key(key) = event.kind() else {
                        continue;
                    };
                    let Some(key_event) = translator.translate(key, event.value()) else {
                        continue;
                    };
                    if tx.send(key_event).is_err() {
                        debug!("Key event receiver dropped, stopping reader");
                        return;
                    }
                }
            }
            debug!("evdev reader stopped");
        })
}
