//! USB device enumeration through udev
//!
//! One scan of the `usb` subsystem yields both `usb_device` entries and their
//! `usb_interface` children. Attribute values are the hex strings the kernel
//! exposes (`idVendor = 046d`, `bInterfaceClass = 03`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;
use udev::{Device, Enumerator};

use crate::error::HostError;
use crate::types::{UsbDevice, UsbInterface};

/// Base directory of usbfs device nodes
pub const USBFS_ROOT: &str = "/dev/bus/usb";

/// Build the usbfs node path for a bus/device number pair
pub fn usbfs_path(busnum: u32, devnum: u32) -> String {
    format!("{USBFS_ROOT}/{busnum:03}/{devnum:03}")
}

fn enumeration_error(e: std::io::Error) -> HostError {
    HostError::Enumeration(format!("udev: {e}"))
}

/// Trimmed, non-empty sysfs attribute of a udev device
fn attribute(device: &Device, name: &str) -> Option<String> {
    let value = device.attribute_value(name)?.to_str()?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn hex_u16(value: Option<String>) -> Option<u16> {
    u16::from_str_radix(&value?, 16).ok()
}

fn hex_u8(value: Option<String>) -> Option<u8> {
    u8::from_str_radix(&value?, 16).ok()
}

/// Build an interface from its attributes; `None` without a class
pub(crate) fn interface_from_attrs(
    attr: impl Fn(&str) -> Option<String>,
) -> Option<UsbInterface> {
    Some(UsbInterface {
        number: hex_u8(attr("bInterfaceNumber")).unwrap_or(0),
        class: hex_u8(attr("bInterfaceClass"))?,
        subclass: hex_u8(attr("bInterfaceSubClass")).unwrap_or(0),
        protocol: hex_u8(attr("bInterfaceProtocol")).unwrap_or(0),
    })
}

/// Build a device from its attributes; `None` without a vendor ID
///
/// The name is the usbfs node, derived from `busnum`/`devnum` when udev has
/// no node for the device, and the kernel name as a last resort.
pub(crate) fn device_from_attrs(
    devnode: Option<&Path>,
    sysname: &str,
    attr: impl Fn(&str) -> Option<String>,
    mut interfaces: Vec<UsbInterface>,
) -> Option<UsbDevice> {
    let vendor_id = hex_u16(attr("idVendor"))?;
    let product_id = hex_u16(attr("idProduct")).unwrap_or(0);

    let busnum = attr("busnum").and_then(|s| s.parse().ok());
    let devnum = attr("devnum").and_then(|s| s.parse().ok());
    let name = match (devnode, busnum, devnum) {
        (Some(node), _, _) => node.to_string_lossy().to_string(),
        (None, Some(bus), Some(dev)) => usbfs_path(bus, dev),
        _ => sysname.to_string(),
    };

    interfaces.sort_by_key(|i| i.number);
    Some(UsbDevice {
        name,
        vendor_id,
        product_id,
        product_name: attr("product"),
        manufacturer_name: attr("manufacturer"),
        serial_number: attr("serial"),
        interfaces,
    })
}

/// List every attached USB device, sorted by device name
pub fn list_devices() -> Result<Vec<UsbDevice>, HostError> {
    let mut enumerator = Enumerator::new().map_err(enumeration_error)?;
    enumerator.match_subsystem("usb").map_err(enumeration_error)?;

    let mut usb_devices = Vec::new();
    let mut interfaces: HashMap<PathBuf, Vec<UsbInterface>> = HashMap::new();

    for device in enumerator.scan_devices().map_err(enumeration_error)? {
        match device.devtype().and_then(|t| t.to_str()) {
            Some("usb_device") => usb_devices.push(device),
            Some("usb_interface") => {
                let Some(parent) = device.parent() else {
                    continue;
                };
                if let Some(iface) = interface_from_attrs(|name| attribute(&device, name)) {
                    interfaces
                        .entry(parent.syspath().to_path_buf())
                        .or_default()
                        .push(iface);
                }
            }
            _ => {}
        }
    }

    let mut devices: Vec<UsbDevice> = usb_devices
        .iter()
        .filter_map(|device| {
            let ifaces = interfaces.remove(device.syspath()).unwrap_or_default();
            let parsed = device_from_attrs(
                device.devnode(),
                &device.sysname().to_string_lossy(),
                |name| attribute(device, name),
                ifaces,
            );
            if parsed.is_none() {
                debug!("Skipping {}: no idVendor", device.syspath().display());
            }
            parsed
        })
        .collect();

    devices.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(devices)
}
