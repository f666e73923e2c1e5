//! Message channel between the bridge and the application layer
//!
//! Requests are method calls with named arguments; replies are a value, a
//! structured error, or "not implemented". Notifications flow the other way
//! without a request.
//!
//! Wire format used by `extkbd serve` (one JSON object per line):
//!
//! ```text
//! -> {"id": 1, "method": "requestPermission", "args": {"deviceId": "/dev/bus/usb/001/004"}}
//! <- {"id": 1, "result": true}
//! <- {"id": 2, "error": {"code": "DEVICE_NOT_FOUND", "message": "...", "details": null}}
//! <- {"id": 3, "notImplemented": true}
//! <- {"event": "onKeyboardInput", "args": "a"}
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::BridgeError;

/// Method names understood by the bridge
pub mod methods {
    pub const SCAN_USB_KEYBOARDS: &str = "scanUsbKeyboards";
    pub const REQUEST_PERMISSION: &str = "requestPermission";
    pub const START_LISTENING: &str = "startListening";
    pub const STOP_LISTENING: &str = "stopListening";
}

/// Notification names pushed to the application
pub mod events {
    pub const PERMISSION_GRANTED: &str = "onPermissionGranted";
    pub const PERMISSION_DENIED: &str = "onPermissionDenied";
    pub const DEVICE_ATTACHED: &str = "onDeviceAttached";
    pub const DEVICE_DETACHED: &str = "onDeviceDetached";
    pub const KEYBOARD_INPUT: &str = "onKeyboardInput";
}

/// A request from the application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub args: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            args: Value::Null,
        }
    }

    /// Add a named argument
    pub fn with_arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        if !self.args.is_object() {
            self.args = Value::Object(Map::new());
        }
        if let Value::Object(map) = &mut self.args {
            map.insert(key.to_string(), value.into());
        }
        self
    }

    /// Named argument
    ///
    /// `Ok(None)` when absent or null, `Err` when present with the wrong type.
    pub fn argument<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, serde_json::Error> {
        match self.args.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::deserialize(value).map(Some),
        }
    }
}

/// Reply to a method call
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    Success(Value),
    Error {
        code: String,
        message: String,
        details: Option<Value>,
    },
    NotImplemented,
}

impl MethodResponse {
    /// Success carrying any serializable value
    pub fn success<T: Serialize>(value: T) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => MethodResponse::Success(v),
            Err(e) => MethodResponse::Error {
                code: "INTERNAL_ERROR".to_string(),
                message: e.to_string(),
                details: None,
            },
        }
    }

    /// Error code, if this is an error reply
    pub fn error_code(&self) -> Option<&str> {
        match self {
            MethodResponse::Error { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Encode for the wire, tagged with the request id
    pub fn to_wire(&self, id: u64) -> Value {
        match self {
            MethodResponse::Success(result) => json!({ "id": id, "result": result }),
            MethodResponse::Error {
                code,
                message,
                details,
            } => json!({
                "id": id,
                "error": { "code": code, "message": message, "details": details },
            }),
            MethodResponse::NotImplemented => json!({ "id": id, "notImplemented": true }),
        }
    }
}

impl From<BridgeError> for MethodResponse {
    fn from(e: BridgeError) -> Self {
        MethodResponse::Error {
            code: e.code().to_string(),
            message: e.to_string(),
            details: None,
        }
    }
}

/// Asynchronous event pushed to the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    PermissionGranted {
        device_id: String,
        device_name: String,
    },
    PermissionDenied {
        device_id: Option<String>,
    },
    DeviceAttached,
    DeviceDetached,
    /// Decoded text, a single character or control character
    KeyboardInput(String),
}

impl Notification {
    /// Event name on the channel
    pub fn method(&self) -> &'static str {
        match self {
            Notification::PermissionGranted { .. } => events::PERMISSION_GRANTED,
            Notification::PermissionDenied { .. } => events::PERMISSION_DENIED,
            Notification::DeviceAttached => events::DEVICE_ATTACHED,
            Notification::DeviceDetached => events::DEVICE_DETACHED,
            Notification::KeyboardInput(_) => events::KEYBOARD_INPUT,
        }
    }

    /// Event arguments on the channel
    pub fn arguments(&self) -> Value {
        match self {
            Notification::PermissionGranted {
                device_id,
                device_name,
            } => json!({ "deviceId": device_id, "deviceName": device_name }),
            Notification::PermissionDenied { device_id } => json!({ "deviceId": device_id }),
            Notification::DeviceAttached | Notification::DeviceDetached => Value::Null,
            Notification::KeyboardInput(text) => Value::String(text.clone()),
        }
    }

    pub fn to_wire(&self) -> Value {
        json!({ "event": self.method(), "args": self.arguments() })
    }
}

/// A request line on the wire
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WireRequest {
    #[serde(default)]
    pub id: u64,
    #[serde(flatten)]
    pub call: MethodCall,
}

impl WireRequest {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}
