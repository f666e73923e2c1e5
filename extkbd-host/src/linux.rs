//! Linux host: udev enumeration, hidraw/usbfs access checks, udev hot-plug

use std::ffi::CString;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hidapi::HidApi;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::enumerate::{self, USBFS_ROOT};
use crate::error::HostError;
use crate::types::{HostEvent, UsbDevice};
use crate::{UsbHost, EVENT_CHANNEL_CAPACITY};

/// Running listener registration
struct Listener {
    /// Stop flag for the hot-plug monitor thread
    shutdown: Arc<AtomicBool>,
}

/// Host backed by the Linux kernel interfaces
///
/// Linux has no interactive permission prompt: access is decided by the
/// device node modes (usually set by udev rules). A permission request
/// therefore checks access right away and publishes the answer as a
/// [`HostEvent::PermissionResult`].
pub struct LinuxHost {
    /// Event sender shared with the hot-plug monitor
    event_tx: broadcast::Sender<HostEvent>,
    /// Current listener registration, if any
    listener: Mutex<Option<Listener>>,
}

impl Default for LinuxHost {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxHost {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            event_tx,
            listener: Mutex::new(None),
        }
    }

    /// Try to open one of the device's HID interfaces through hidraw
    ///
    /// Returns `None` when hidapi gives no verdict (device not listed, or
    /// opens failing for reasons other than access).
    fn hid_access(device: &UsbDevice) -> Option<bool> {
        let api = match HidApi::new() {
            Ok(api) => api,
            Err(e) => {
                debug!("hidapi unavailable: {}", e);
                return None;
            }
        };

        let opens = api
            .device_list()
            .filter(|info| {
                info.vendor_id() == device.vendor_id
                    && info.product_id() == device.product_id
                    && match (info.serial_number(), device.serial_number.as_deref()) {
                        (Some(a), Some(b)) if !a.is_empty() => a == b,
                        _ => true,
                    }
            })
            .map(|info| {
                info.open_device(&api).map(drop).map_err(|e| {
                    let err = HostError::from(e);
                    debug!("Cannot open {}: {}", info.path().to_string_lossy(), err);
                    err
                })
            });
        access_from_opens(opens)
    }

    /// Check read/write access to the usbfs node
    fn usbfs_access(device: &UsbDevice) -> bool {
        if !device.name.starts_with(USBFS_ROOT) {
            return false;
        }
        let Ok(path) = CString::new(device.name.as_str()) else {
            return false;
        };
        // SAFETY: `path` is a valid NUL-terminated string for the duration of the call.
        unsafe { libc::access(path.as_ptr(), libc::R_OK | libc::W_OK) == 0 }
    }

    fn publish(&self, event: HostEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("No host listener subscribed, event dropped");
        }
    }

    #[cfg(all(target_os = "linux", feature = "hotplug"))]
    fn start_monitor(&self, shutdown: Arc<AtomicBool>) -> Result<(), HostError> {
        crate::hotplug::spawn_monitor(self.event_tx.clone(), shutdown)?;
        Ok(())
    }

    #[cfg(not(all(target_os = "linux", feature = "hotplug")))]
    fn start_monitor(&self, _shutdown: Arc<AtomicBool>) -> Result<(), HostError> {
        warn!("Hot-plug monitoring not compiled in, only permission events will be delivered");
        Ok(())
    }
}

/// Access verdict from hidraw open attempts
///
/// Any successful open grants access. Otherwise a permission failure denies
/// it; other failures leave the decision to the usbfs check.
fn access_from_opens(opens: impl IntoIterator<Item = Result<(), HostError>>) -> Option<bool> {
    let mut denied = false;
    for open in opens {
        match open {
            Ok(()) => return Some(true),
            Err(e) if e.is_permission_denied() => denied = true,
            Err(_) => {}
        }
    }
    denied.then_some(false)
}

impl UsbHost for LinuxHost {
    fn device_list(&self) -> Result<Vec<UsbDevice>, HostError> {
        enumerate::list_devices()
    }

    fn has_permission(&self, device: &UsbDevice) -> bool {
        if device.interfaces.iter().any(|i| i.is_hid()) {
            if let Some(granted) = Self::hid_access(device) {
                return granted;
            }
        }
        Self::usbfs_access(device)
    }

    fn request_permission(&self, device: &UsbDevice) -> Result<(), HostError> {
        let granted = self.has_permission(device);
        if granted {
            info!("Access to {} is available", device.name);
        } else {
            warn!(
                "Access to {} denied; add a udev rule such as \
                 SUBSYSTEM==\"usb\", ATTR{{idVendor}}==\"{:04x}\", TAG+=\"uaccess\"",
                device.name, device.vendor_id
            );
        }
        self.publish(HostEvent::PermissionResult {
            device: Some(device.clone()),
            granted,
        });
        Ok(())
    }

    fn register_listener(&self) -> Result<broadcast::Receiver<HostEvent>, HostError> {
        let rx = self.event_tx.subscribe();
        let mut listener = self.listener.lock();
        if listener.is_none() {
            let shutdown = Arc::new(AtomicBool::new(false));
            self.start_monitor(Arc::clone(&shutdown))?;
            *listener = Some(Listener { shutdown });
            debug!("Host listener registered");
        }
        Ok(rx)
    }

    fn unregister_listener(&self) -> Result<(), HostError> {
        let listener = self
            .listener
            .lock()
            .take()
            .ok_or(HostError::ListenerNotRegistered)?;
        listener.shutdown.store(true, Ordering::SeqCst);
        debug!("Host listener unregistered");
        Ok(())
    }
}

impl Drop for LinuxHost {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.lock().take() {
            listener.shutdown.store(true, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hid_open_verdicts() {
        let denied = || Err(HostError::PermissionDenied("/dev/hidraw3".into()));
        let busy = || Err(HostError::Hid("device busy".into()));

        assert_eq!(access_from_opens([denied(), Ok(())]), Some(true));
        assert_eq!(access_from_opens([busy(), denied()]), Some(false));
        assert_eq!(access_from_opens([busy()]), None);
        assert_eq!(access_from_opens(Vec::new()), None);
    }

    #[test]
    fn test_non_usbfs_names_have_no_access() {
        let device = UsbDevice::new("3-1", 0x1234, 0x5678);
        assert!(!LinuxHost::usbfs_access(&device));
    }

    #[test]
    fn test_unregister_without_register_fails() {
        let host = LinuxHost::new();
        assert!(matches!(
            host.unregister_listener(),
            Err(HostError::ListenerNotRegistered)
        ));
    }

    #[test]
    fn test_request_permission_publishes_result() {
        let host = LinuxHost::new();
        let mut rx = host.event_tx.subscribe();
        let device = UsbDevice::new("3-1", 0x1234, 0x5678);
        host.request_permission(&device).unwrap();
        match rx.try_recv().unwrap() {
            HostEvent::PermissionResult { device: Some(d), granted } => {
                assert_eq!(d.name, "3-1");
                assert!(!granted);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
