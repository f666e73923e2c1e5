//! Host error types

use thiserror::Error;

/// Errors that can occur while talking to the host OS
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Enumeration failed: {0}")]
    Enumeration(String),

    // HID-specific errors
    #[error("HID error: {0}")]
    Hid(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No listener registered")]
    ListenerNotRegistered,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<hidapi::HidError> for HostError {
    fn from(e: hidapi::HidError) -> Self {
        let msg = e.to_string();
        if msg.contains("Permission denied") || msg.contains("EPERM") || msg.contains("EACCES") {
            HostError::PermissionDenied(msg)
        } else {
            HostError::Hid(msg)
        }
    }
}

impl HostError {
    /// True when the failure means "the OS refused access"
    pub fn is_permission_denied(&self) -> bool {
        match self {
            HostError::PermissionDenied(_) => true,
            HostError::Io(e) => e.kind() == std::io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }
}
