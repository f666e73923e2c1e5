//! Keyboard detection over the attached USB devices

use extkbd_host::{UsbDevice, UsbHost};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::BridgeError;
use crate::vendors::VendorAllowList;

/// Manufacturer reported when the device has no manufacturer string
pub const UNKNOWN_MANUFACTURER: &str = "Unknown";
/// Serial reported when the device has no serial string
pub const NO_SERIAL: &str = "N/A";

/// Which heuristic classified a device as a keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchReason {
    /// HID interface with boot subclass and keyboard protocol
    HidBootKeyboard,
    /// Vendor ID on the allow-list
    KnownVendor,
    /// Product name mentions "keyboard" or "kbd"
    ProductName,
}

/// Classify a device, first matching rule wins
pub fn classify(device: &UsbDevice, vendors: &VendorAllowList) -> Option<MatchReason> {
    for iface in device.interfaces.iter().filter(|i| i.is_hid()) {
        if iface.is_boot_keyboard() {
            debug!("Device {} matched by HID protocol", device.name);
            return Some(MatchReason::HidBootKeyboard);
        }
        debug!(
            "Device {} is HID device (subclass: {}, protocol: {})",
            device.name, iface.subclass, iface.protocol
        );
    }

    if vendors.contains(device.vendor_id) {
        debug!("Device {} matched by known vendor ID", device.name);
        return Some(MatchReason::KnownVendor);
    }

    let product = device
        .product_name
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    if product.contains("keyboard") || product.contains("kbd") {
        debug!("Device {} matched by product name", device.name);
        return Some(MatchReason::ProductName);
    }

    None
}

/// A device classified as a keyboard, as reported to the application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardRecord {
    pub device_id: String,
    pub device_name: String,
    pub vendor_id: u16,
    pub product_id: u16,
    /// Whether the application already has access to the device
    #[serde(rename = "isConnected")]
    pub permission_granted: bool,
    pub manufacturer_name: String,
    pub serial_number: String,
    pub matched_by: MatchReason,
}

impl KeyboardRecord {
    pub fn new(device: &UsbDevice, permission_granted: bool, matched_by: MatchReason) -> Self {
        Self {
            device_id: device.name.clone(),
            device_name: device.display_name().to_string(),
            vendor_id: device.vendor_id,
            product_id: device.product_id,
            permission_granted,
            manufacturer_name: device
                .manufacturer_name
                .clone()
                .unwrap_or_else(|| UNKNOWN_MANUFACTURER.to_string()),
            serial_number: device
                .serial_number
                .clone()
                .unwrap_or_else(|| NO_SERIAL.to_string()),
            matched_by,
        }
    }
}

/// Enumerate attached devices and keep the keyboards
pub fn scan_keyboards(
    host: &dyn UsbHost,
    vendors: &VendorAllowList,
) -> Result<Vec<KeyboardRecord>, BridgeError> {
    let devices = host.device_list().map_err(BridgeError::Scan)?;
    debug!("Scanning USB devices, found {} total devices", devices.len());

    let mut keyboards = Vec::new();
    for device in &devices {
        debug!(
            "Checking device: {} (VID: 0x{:04x}, PID: 0x{:04x})",
            device.name, device.vendor_id, device.product_id
        );

        let Some(reason) = classify(device, vendors) else {
            continue;
        };

        let record = KeyboardRecord::new(device, host.has_permission(device), reason);
        debug!(
            "Found keyboard device: {} (Permission: {})",
            record.device_name, record.permission_granted
        );
        keyboards.push(record);
    }

    info!("Scan complete, found {} keyboard devices", keyboards.len());
    Ok(keyboards)
}
