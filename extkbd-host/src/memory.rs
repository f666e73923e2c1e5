//! In-memory host
//!
//! Holds a device table and answers permission requests according to a
//! policy. Used by the test suites and by `--fixture` replay in the CLI.

use std::collections::HashSet;
use std::path::Path;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::HostError;
use crate::types::{HostEvent, UsbDevice};
use crate::{UsbHost, EVENT_CHANNEL_CAPACITY};

/// How the in-memory host answers permission requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionPolicy {
    /// Grant and remember the grant
    #[default]
    Grant,
    /// Deny every request
    Deny,
    /// Never answer (like an OS dialog that is never dismissed)
    Ignore,
}

/// Fixture file layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryFixture {
    #[serde(default)]
    pub devices: Vec<UsbDevice>,
    /// Device names that already have access
    #[serde(default)]
    pub granted: Vec<String>,
    #[serde(default)]
    pub policy: PermissionPolicy,
}

#[derive(Default)]
struct MemoryState {
    devices: Vec<UsbDevice>,
    granted: HashSet<String>,
    policy: PermissionPolicy,
    enumeration_error: Option<String>,
    fail_unregister: bool,
    listener_registered: bool,
    permission_requests: Vec<String>,
}

/// Host backed by an in-memory device table
pub struct MemoryHost {
    state: Mutex<MemoryState>,
    event_tx: broadcast::Sender<HostEvent>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Empty host, granting permission requests
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(MemoryState::default()),
            event_tx,
        }
    }

    /// Host pre-populated with devices
    pub fn with_devices(devices: Vec<UsbDevice>) -> Self {
        let host = Self::new();
        host.state.lock().devices = devices;
        host
    }

    /// Build a host from a parsed fixture
    pub fn from_fixture(fixture: MemoryFixture) -> Self {
        let host = Self::with_devices(fixture.devices);
        {
            let mut state = host.state.lock();
            state.granted = fixture.granted.into_iter().collect();
            state.policy = fixture.policy;
        }
        host
    }

    /// Load a JSON fixture file
    pub fn load_fixture(path: &Path) -> Result<Self, HostError> {
        let content = std::fs::read_to_string(path)?;
        let fixture: MemoryFixture = serde_json::from_str(&content)
            .map_err(|e| HostError::Internal(format!("{}: {e}", path.display())))?;
        Ok(Self::from_fixture(fixture))
    }

    /// Plug a device in and announce it
    pub fn attach(&self, device: UsbDevice) {
        let name = device.name.clone();
        self.state.lock().devices.push(device);
        self.publish(HostEvent::DeviceAttached { name });
    }

    /// Unplug a device and announce it
    pub fn detach(&self, name: &str) -> Option<UsbDevice> {
        let removed = {
            let mut state = self.state.lock();
            let idx = state.devices.iter().position(|d| d.name == name)?;
            state.granted.remove(name);
            state.devices.remove(idx)
        };
        self.publish(HostEvent::DeviceDetached {
            name: name.to_string(),
        });
        Some(removed)
    }

    /// Mark a device as already accessible
    pub fn grant(&self, name: &str) {
        self.state.lock().granted.insert(name.to_string());
    }

    pub fn set_policy(&self, policy: PermissionPolicy) {
        self.state.lock().policy = policy;
    }

    /// Make `device_list` fail with the given message (`None` clears it)
    pub fn fail_enumeration(&self, message: Option<&str>) {
        self.state.lock().enumeration_error = message.map(str::to_string);
    }

    /// Make `unregister_listener` fail
    pub fn fail_unregister(&self, fail: bool) {
        self.state.lock().fail_unregister = fail;
    }

    /// Device names passed to `request_permission`, in call order
    pub fn permission_requests(&self) -> Vec<String> {
        self.state.lock().permission_requests.clone()
    }

    pub fn is_listener_registered(&self) -> bool {
        self.state.lock().listener_registered
    }

    /// Push an arbitrary event, as if the OS sent it
    pub fn emit(&self, event: HostEvent) {
        self.publish(event);
    }

    fn publish(&self, event: HostEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("No host listener subscribed, event dropped");
        }
    }
}

impl UsbHost for MemoryHost {
    fn device_list(&self) -> Result<Vec<UsbDevice>, HostError> {
        let state = self.state.lock();
        if let Some(msg) = &state.enumeration_error {
            return Err(HostError::Enumeration(msg.clone()));
        }
        Ok(state.devices.clone())
    }

    fn has_permission(&self, device: &UsbDevice) -> bool {
        self.state.lock().granted.contains(&device.name)
    }

    fn request_permission(&self, device: &UsbDevice) -> Result<(), HostError> {
        let policy = {
            let mut state = self.state.lock();
            if !state.devices.iter().any(|d| d.name == device.name) {
                return Err(HostError::DeviceNotFound(device.name.clone()));
            }
            state.permission_requests.push(device.name.clone());
            if state.policy == PermissionPolicy::Grant {
                state.granted.insert(device.name.clone());
            }
            state.policy
        };

        match policy {
            PermissionPolicy::Grant => self.publish(HostEvent::PermissionResult {
                device: Some(device.clone()),
                granted: true,
            }),
            PermissionPolicy::Deny => self.publish(HostEvent::PermissionResult {
                device: Some(device.clone()),
                granted: false,
            }),
            PermissionPolicy::Ignore => debug!("Ignoring permission request for {}", device.name),
        }
        Ok(())
    }

    fn register_listener(&self) -> Result<broadcast::Receiver<HostEvent>, HostError> {
        self.state.lock().listener_registered = true;
        Ok(self.event_tx.subscribe())
    }

    fn unregister_listener(&self) -> Result<(), HostError> {
        let mut state = self.state.lock();
        if state.fail_unregister {
            return Err(HostError::Internal("unregister refused".into()));
        }
        if !state.listener_registered {
            return Err(HostError::ListenerNotRegistered);
        }
        state.listener_registered = false;
        Ok(())
    }
}
