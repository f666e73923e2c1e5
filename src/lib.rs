//! External USB keyboard bridge
//!
//! Detects USB keyboards, manages OS permission for them and, while
//! listening, turns key presses into text pushed to an application over a
//! message channel.
//!
//! The OS side lives in the `extkbd-host` crate behind the
//! [`extkbd_host::UsbHost`] trait; this crate holds the bridge logic:
//!
//! - [`scanner`]: keyboard detection
//! - [`permission`]: permission requests and host event translation
//! - [`listening`]: the listening state machine
//! - [`decoder`]: HID usage + shift to text
//! - [`channel`]: method calls, replies and notifications
//! - [`bridge`]: the dispatcher tying them together

pub mod bridge;
pub mod channel;
pub mod config;
pub mod decoder;
pub mod error;
pub mod input;
pub mod keycode;
pub mod listening;
pub mod permission;
pub mod scanner;
pub mod vendors;

pub use bridge::KeyboardBridge;
pub use channel::{MethodCall, MethodResponse, Notification, WireRequest};
pub use config::BridgeConfig;
pub use error::BridgeError;
pub use keycode::{KeyAction, KeyCode, KeyEvent, Modifiers};
pub use listening::ListenState;
pub use scanner::{KeyboardRecord, MatchReason};
pub use vendors::VendorAllowList;

pub use extkbd_host::{BoxedHost, HostError, HostEvent, UsbDevice, UsbHost};
