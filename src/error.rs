//! Bridge error types

use extkbd_host::HostError;
use thiserror::Error;

/// Errors from bridge operations
///
/// Each variant maps to the error code reported on the message channel.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// A required argument was missing
    #[error("{0}")]
    InvalidArgument(String),

    /// The device ID does not resolve to an attached device
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Device enumeration failed
    #[error("Failed to scan USB keyboards: {0}")]
    Scan(#[source] HostError),

    /// Issuing the permission request failed
    #[error("Failed to request permission: {0}")]
    Permission(#[source] HostError),

    /// The device ID argument was present but not a string
    #[error("Failed to request permission: {0}")]
    PermissionArgument(#[source] serde_json::Error),

    /// Any other host failure
    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

impl BridgeError {
    /// Channel error code
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::InvalidArgument(_) => "INVALID_ARGUMENT",
            BridgeError::DeviceNotFound(_) => "DEVICE_NOT_FOUND",
            BridgeError::Scan(_) => "SCAN_ERROR",
            BridgeError::Permission(_) | BridgeError::PermissionArgument(_) => "PERMISSION_ERROR",
            BridgeError::Host(_) => "HOST_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_messages() {
        let err = BridgeError::InvalidArgument("Device ID is required".into());
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        assert_eq!(err.to_string(), "Device ID is required");

        let err = BridgeError::DeviceNotFound("/dev/bus/usb/001/009".into());
        assert_eq!(err.code(), "DEVICE_NOT_FOUND");
        assert_eq!(err.to_string(), "Device not found: /dev/bus/usb/001/009");

        let err = BridgeError::Scan(HostError::Enumeration("boom".into()));
        assert_eq!(err.code(), "SCAN_ERROR");
        assert_eq!(err.to_string(), "Failed to scan USB keyboards: Enumeration failed: boom");

        let err = BridgeError::Permission(HostError::Internal("busy".into()));
        assert_eq!(err.code(), "PERMISSION_ERROR");
        assert!(err.to_string().starts_with("Failed to request permission: "));

        let wrong_type = serde_json::from_value::<String>(serde_json::json!(42)).unwrap_err();
        let err = BridgeError::PermissionArgument(wrong_type);
        assert_eq!(err.code(), "PERMISSION_ERROR");
        assert!(err.to_string().starts_with("Failed to request permission: "));
    }
}
