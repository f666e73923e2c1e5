//! Listening state machine

use tracing::info;

/// Whether key events are being intercepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListenState {
    /// Key events pass through to the host
    #[default]
    Idle,
    /// Key presses are decoded and forwarded
    Listening,
}

impl ListenState {
    pub fn is_listening(self) -> bool {
        self == ListenState::Listening
    }

    /// Idle -> Listening (idempotent)
    pub fn start(&mut self) {
        if *self != ListenState::Listening {
            info!("Keyboard listening started");
        }
        *self = ListenState::Listening;
    }

    /// Listening -> Idle (idempotent)
    pub fn stop(&mut self) {
        if *self != ListenState::Idle {
            info!("Keyboard listening stopped");
        }
        *self = ListenState::Idle;
    }
}
