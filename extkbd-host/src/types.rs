//! Common types for the host layer

use serde::{Deserialize, Serialize};

/// USB interface class codes used for keyboard detection
pub mod usb_class {
    /// Human Interface Device class
    pub const HID: u8 = 0x03;
    /// Boot interface subclass
    pub const SUBCLASS_BOOT: u8 = 0x01;
    /// Boot protocol: keyboard
    pub const PROTOCOL_KEYBOARD: u8 = 0x01;
    /// Boot protocol: mouse
    pub const PROTOCOL_MOUSE: u8 = 0x02;
}

/// One interface descriptor of a USB device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbInterface {
    /// bInterfaceNumber
    #[serde(default)]
    pub number: u8,
    /// bInterfaceClass
    pub class: u8,
    /// bInterfaceSubClass
    #[serde(default)]
    pub subclass: u8,
    /// bInterfaceProtocol
    #[serde(default)]
    pub protocol: u8,
}

impl UsbInterface {
    /// HID interface with boot subclass and keyboard protocol
    pub const fn boot_keyboard(number: u8) -> Self {
        Self {
            number,
            class: usb_class::HID,
            subclass: usb_class::SUBCLASS_BOOT,
            protocol: usb_class::PROTOCOL_KEYBOARD,
        }
    }

    pub fn is_hid(&self) -> bool {
        self.class == usb_class::HID
    }

    /// Check if this interface advertises a boot-protocol keyboard
    pub fn is_boot_keyboard(&self) -> bool {
        self.is_hid()
            && self.subclass == usb_class::SUBCLASS_BOOT
            && self.protocol == usb_class::PROTOCOL_KEYBOARD
    }
}

/// A USB device as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbDevice {
    /// OS-assigned device name (usbfs node path on Linux)
    pub name: String,
    /// USB Vendor ID
    pub vendor_id: u16,
    /// USB Product ID
    pub product_id: u16,
    /// Product string if available
    #[serde(default)]
    pub product_name: Option<String>,
    /// Manufacturer string if available
    #[serde(default)]
    pub manufacturer_name: Option<String>,
    /// Serial number if available
    #[serde(default)]
    pub serial_number: Option<String>,
    /// Interface descriptors of the active configuration
    #[serde(default)]
    pub interfaces: Vec<UsbInterface>,
}

impl UsbDevice {
    /// Bare device with no strings and no interfaces
    pub fn new(name: impl Into<String>, vendor_id: u16, product_id: u16) -> Self {
        Self {
            name: name.into(),
            vendor_id,
            product_id,
            product_name: None,
            manufacturer_name: None,
            serial_number: None,
            interfaces: Vec::new(),
        }
    }

    pub fn with_product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    pub fn with_manufacturer(mut self, name: impl Into<String>) -> Self {
        self.manufacturer_name = Some(name.into());
        self
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial_number = Some(serial.into());
        self
    }

    pub fn with_interface(mut self, interface: UsbInterface) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Product name, or the device name when the product string is absent
    pub fn display_name(&self) -> &str {
        self.product_name.as_deref().unwrap_or(&self.name)
    }
}

/// Events pushed by the host to a registered listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// A USB device was plugged in
    DeviceAttached { name: String },
    /// A USB device was removed
    DeviceDetached { name: String },
    /// The OS answered a permission request
    PermissionResult {
        /// Device the answer is about, if the OS reported one
        device: Option<UsbDevice>,
        /// Whether access was granted
        granted: bool,
    },
}
