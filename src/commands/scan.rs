//! Keyboard scan command.

use super::CommandResult;
use extkbd::{BoxedHost, BridgeConfig, KeyboardBridge};

/// Scan for keyboards and print them
pub fn scan(host: BoxedHost, config: &BridgeConfig, json: bool) -> CommandResult {
    let bridge = KeyboardBridge::new(host, config);
    let keyboards = bridge.scan_devices()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&keyboards)?);
        return Ok(());
    }

    if keyboards.is_empty() {
        println!("No USB keyboards found");
        return Ok(());
    }

    println!("Found {} keyboard(s):", keyboards.len());
    for kb in &keyboards {
        println!(
            "  {}  {:04x}:{:04x}  {}",
            kb.device_id, kb.vendor_id, kb.product_id, kb.device_name
        );
        println!(
            "      manufacturer={} serial={} access={} matched={:?}",
            kb.manufacturer_name,
            kb.serial_number,
            if kb.permission_granted { "yes" } else { "no" },
            kb.matched_by
        );
    }
    Ok(())
}
