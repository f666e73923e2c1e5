//! Device listing command.

use super::CommandResult;
use extkbd::input::list_evdev_keyboards;
use extkbd::scanner::classify;
use extkbd::{BridgeConfig, UsbHost};

/// List every USB device with its classification
pub fn list(host: &dyn UsbHost, config: &BridgeConfig) -> CommandResult {
    let vendors = config.vendors();
    let devices = host.device_list()?;

    println!("All USB devices:");
    for device in &devices {
        let matched = classify(device, &vendors)
            .map(|reason| format!("{reason:?}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {} VID={:04x} PID={:04x} ifaces={} access={} keyboard={} name={}",
            device.name,
            device.vendor_id,
            device.product_id,
            device.interfaces.len(),
            if host.has_permission(device) { "yes" } else { "no" },
            matched,
            device.product_name.as_deref().unwrap_or("?"),
        );
        for iface in device.interfaces.iter().filter(|i| i.is_hid()) {
            println!(
                "      if={} class={} subclass={} protocol={}",
                iface.number, iface.class, iface.subclass, iface.protocol
            );
        }
    }

    let keyboards = list_evdev_keyboards();
    if !keyboards.is_empty() {
        println!("evdev keyboards:");
        for (path, name) in keyboards {
            println!("  {} {}", path.display(), name);
        }
    }
    Ok(())
}
