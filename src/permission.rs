//! Permission requests and host event translation

use extkbd_host::{HostEvent, UsbHost};
use tracing::{debug, info, warn};

use crate::channel::Notification;
use crate::error::BridgeError;

/// Issue a permission request for a device by ID
///
/// Returns `Ok(true)` once the request is issued; the decision arrives later
/// as a [`HostEvent::PermissionResult`]. A missing ID is rejected before the
/// host is touched.
pub fn request_permission(
    host: &dyn UsbHost,
    device_id: Option<&str>,
) -> Result<bool, BridgeError> {
    let device_id =
        device_id.ok_or_else(|| BridgeError::InvalidArgument("Device ID is required".into()))?;

    let device = host
        .find_device(device_id)
        .map_err(BridgeError::Permission)?
        .ok_or_else(|| BridgeError::DeviceNotFound(device_id.to_string()))?;

    host.request_permission(&device).map_err(BridgeError::Permission)?;
    info!("Requesting permission for device: {}", device.name);
    Ok(true)
}

/// Translate a host event into the notification sent to the application
pub fn notification_for(event: &HostEvent) -> Option<Notification> {
    match event {
        HostEvent::PermissionResult {
            device: Some(device),
            granted: true,
        } => {
            info!("USB permission granted for device: {}", device.name);
            Some(Notification::PermissionGranted {
                device_id: device.name.clone(),
                device_name: device.display_name().to_string(),
            })
        }
        HostEvent::PermissionResult {
            device: None,
            granted: true,
        } => {
            warn!("Permission granted without a device, ignoring");
            None
        }
        HostEvent::PermissionResult {
            device,
            granted: false,
        } => {
            let device_id = device.as_ref().map(|d| d.name.clone());
            info!("USB permission denied for device: {:?}", device_id);
            Some(Notification::PermissionDenied { device_id })
        }
        HostEvent::DeviceAttached { name } => {
            debug!("USB device attached: {}", name);
            Some(Notification::DeviceAttached)
        }
        HostEvent::DeviceDetached { name } => {
            debug!("USB device detached: {}", name);
            Some(Notification::DeviceDetached)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extkbd_host::{MemoryHost, UsbDevice};

    fn keyboard() -> UsbDevice {
        UsbDevice::new("/dev/bus/usb/001/004", 0x046d, 0xc31c).with_product_name("K120")
    }

    #[test]
    fn test_missing_id_does_not_touch_host() {
        let host = MemoryHost::with_devices(vec![keyboard()]);
        let err = request_permission(&host, None).unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        assert!(host.permission_requests().is_empty());
    }

    #[test]
    fn test_unknown_id() {
        let host = MemoryHost::with_devices(vec![keyboard()]);
        let err = request_permission(&host, Some("/dev/bus/usb/009/009")).unwrap_err();
        assert_eq!(err.code(), "DEVICE_NOT_FOUND");
        assert_eq!(err.to_string(), "Device not found: /dev/bus/usb/009/009");
        assert!(host.permission_requests().is_empty());
    }

    #[test]
    fn test_request_issued() {
        let host = MemoryHost::with_devices(vec![keyboard()]);
        assert!(request_permission(&host, Some("/dev/bus/usb/001/004")).unwrap());
        assert_eq!(host.permission_requests(), vec!["/dev/bus/usb/001/004"]);
    }

    #[test]
    fn test_enumeration_failure_is_permission_error() {
        let host = MemoryHost::with_devices(vec![keyboard()]);
        host.fail_enumeration(Some("gone"));
        let err = request_permission(&host, Some("/dev/bus/usb/001/004")).unwrap_err();
        assert_eq!(err.code(), "PERMISSION_ERROR");
    }

    #[test]
    fn test_granted_notification_uses_display_name() {
        let event = HostEvent::PermissionResult {
            device: Some(keyboard()),
            granted: true,
        };
        assert_eq!(
            notification_for(&event),
            Some(Notification::PermissionGranted {
                device_id: "/dev/bus/usb/001/004".into(),
                device_name: "K120".into(),
            })
        );

        let nameless = HostEvent::PermissionResult {
            device: Some(UsbDevice::new("/dev/bus/usb/001/005", 1, 2)),
            granted: true,
        };
        assert_eq!(
            notification_for(&nameless),
            Some(Notification::PermissionGranted {
                device_id: "/dev/bus/usb/001/005".into(),
                device_name: "/dev/bus/usb/001/005".into(),
            })
        );
    }

    #[test]
    fn test_denied_notifications() {
        let event = HostEvent::PermissionResult {
            device: Some(keyboard()),
            granted: false,
        };
        assert_eq!(
            notification_for(&event),
            Some(Notification::PermissionDenied {
                device_id: Some("/dev/bus/usb/001/004".into())
            })
        );
        let anonymous = HostEvent::PermissionResult {
            device: None,
            granted: false,
        };
        assert_eq!(
            notification_for(&anonymous),
            Some(Notification::PermissionDenied { device_id: None })
        );
    }

    #[test]
    fn test_grant_without_device_is_dropped() {
        let event = HostEvent::PermissionResult {
            device: None,
            granted: true,
        };
        assert_eq!(notification_for(&event), None);
    }

    #[test]
    fn test_hotplug_notifications() {
        assert_eq!(
            notification_for(&HostEvent::DeviceAttached { name: "x".into() }),
            Some(Notification::DeviceAttached)
        );
        assert_eq!(
            notification_for(&HostEvent::DeviceDetached { name: "x".into() }),
            Some(Notification::DeviceDetached)
        );
    }
}
