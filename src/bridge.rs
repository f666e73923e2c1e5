//! The keyboard bridge: method dispatch, host events and key interception
//!
//! The bridge is driven by its owner, one callback at a time:
//!
//! - [`KeyboardBridge::handle_method_call`] for requests from the application
//! - [`KeyboardBridge::handle_host_event`] for events from the host listener
//! - [`KeyboardBridge::handle_key_event`] for key events from the input source
//!
//! Everything it has to tell the application goes out as a [`Notification`]
//! on a broadcast channel (see [`KeyboardBridge::subscribe`]).

use extkbd_host::{BoxedHost, HostEvent};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::channel::{methods, MethodCall, MethodResponse, Notification};
use crate::config::BridgeConfig;
use crate::decoder;
use crate::error::BridgeError;
use crate::keycode::KeyEvent;
use crate::listening::ListenState;
use crate::permission;
use crate::scanner::{self, KeyboardRecord};
use crate::vendors::VendorAllowList;

/// Bridge between a USB host and the application channel
pub struct KeyboardBridge {
    host: BoxedHost,
    vendors: VendorAllowList,
    state: ListenState,
    notify_tx: broadcast::Sender<Notification>,
    /// Whether a host listener is registered
    attached: bool,
}

impl KeyboardBridge {
    pub fn new(host: BoxedHost, config: &BridgeConfig) -> Self {
        let (notify_tx, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            host,
            vendors: config.vendors(),
            state: ListenState::default(),
            notify_tx,
            attached: false,
        }
    }

    /// Receive notifications pushed to the application
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notify_tx.subscribe()
    }

    pub fn listen_state(&self) -> ListenState {
        self.state
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Register the host listener for attach, detach and permission events
    ///
    /// The returned receiver must be drained by the owner, passing each event
    /// to [`KeyboardBridge::handle_host_event`].
    pub fn attach(&mut self) -> Result<broadcast::Receiver<HostEvent>, BridgeError> {
        let rx = self.host.register_listener()?;
        self.attached = true;
        info!("Keyboard bridge attached");
        Ok(rx)
    }

    /// Unregister the host listener
    ///
    /// Failures are logged and swallowed; teardown never fails.
    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }
        if let Err(e) = self.host.unregister_listener() {
            warn!("Error unregistering host listener: {}", e);
        }
        self.attached = false;
        info!("Keyboard bridge detached");
    }

    /// Scan attached devices for keyboards
    pub fn scan_devices(&self) -> Result<Vec<KeyboardRecord>, BridgeError> {
        scanner::scan_keyboards(self.host.as_ref(), &self.vendors)
    }

    /// Request OS permission for a device
    pub fn request_permission(&self, device_id: Option<&str>) -> Result<bool, BridgeError> {
        permission::request_permission(self.host.as_ref(), device_id)
    }

    pub fn start_listening(&mut self) -> bool {
        self.state.start();
        true
    }

    pub fn stop_listening(&mut self) -> bool {
        self.state.stop();
        true
    }

    /// Dispatch a request from the application
    pub fn handle_method_call(&mut self, call: &MethodCall) -> MethodResponse {
        debug!("Method call: {}", call.method);
        match call.method.as_str() {
            methods::SCAN_USB_KEYBOARDS => match self.scan_devices() {
                Ok(keyboards) => MethodResponse::success(keyboards),
                Err(e) => {
                    warn!("Error scanning keyboards: {}", e);
                    e.into()
                }
            },
            methods::REQUEST_PERMISSION => {
                let issued = call
                    .argument::<String>("deviceId")
                    .map_err(BridgeError::PermissionArgument)
                    .and_then(|id| self.request_permission(id.as_deref()));
                match issued {
                    Ok(issued) => MethodResponse::success(issued),
                    Err(e) => {
                        warn!("Error requesting permission: {}", e);
                        e.into()
                    }
                }
            }
            methods::START_LISTENING => MethodResponse::success(self.start_listening()),
            methods::STOP_LISTENING => MethodResponse::success(self.stop_listening()),
            other => {
                debug!("Method not implemented: {}", other);
                MethodResponse::NotImplemented
            }
        }
    }

    /// Forward a host event to the application
    pub fn handle_host_event(&self, event: &HostEvent) {
        if let Some(notification) = permission::notification_for(event) {
            self.notify(notification);
        }
    }

    /// Offer a key event to the bridge
    ///
    /// Returns `true` when the event was intercepted and forwarded; `false`
    /// means the host should process it normally.
    pub fn handle_key_event(&self, event: &KeyEvent) -> bool {
        let Some(ch) = decoder::intercept(self.state, event) else {
            return false;
        };

        debug!("Key captured: {} -> {:?}", event.code, ch);
        self.notify(Notification::KeyboardInput(ch.to_string()));
        true
    }

    fn notify(&self, notification: Notification) {
        if self.notify_tx.send(notification).is_err() {
            debug!("No subscriber for notification");
        }
    }
}

impl Drop for KeyboardBridge {
    fn drop(&mut self) {
        self.detach();
    }
}
