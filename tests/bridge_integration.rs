//! Integration tests for the keyboard bridge.
//!
//! These drive `KeyboardBridge` through its public surface (method calls,
//! host events, key events) against the in-memory host, checking the replies
//! and the notifications that reach the application.

use std::sync::Arc;

use extkbd::channel::methods;
use extkbd::{
    BridgeConfig, HostEvent, KeyCode, KeyEvent, KeyboardBridge, MethodCall, MethodResponse,
    Modifiers, Notification, UsbDevice, WireRequest,
};
use extkbd_host::{MemoryHost, PermissionPolicy, UsbInterface};
use serde_json::json;
use tokio::sync::broadcast;

fn logitech_receiver() -> UsbDevice {
    UsbDevice::new("/dev/bus/usb/001/003", 0x046d, 0xc52b).with_product_name("USB Receiver")
}

fn generic_keyboard() -> UsbDevice {
    UsbDevice::new("/dev/bus/usb/001/004", 0x1234, 0x5678)
        .with_product_name("Gadget")
        .with_manufacturer("ACME")
        .with_serial("0001")
        .with_interface(UsbInterface::boot_keyboard(0))
}

fn webcam() -> UsbDevice {
    UsbDevice::new("/dev/bus/usb/002/002", 0x2bd9, 0x0011).with_product_name("HD Webcam")
}

fn setup(devices: Vec<UsbDevice>) -> (Arc<MemoryHost>, KeyboardBridge) {
    let host = Arc::new(MemoryHost::with_devices(devices));
    let bridge = KeyboardBridge::new(host.clone(), &BridgeConfig::default());
    (host, bridge)
}

fn drain(rx: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}

/// Type a key and return the text that reached the application
fn type_key(
    bridge: &KeyboardBridge,
    rx: &mut broadcast::Receiver<Notification>,
    code: KeyCode,
    shift: bool,
) -> Option<String> {
    let modifiers = if shift {
        Modifiers::RIGHT_SHIFT
    } else {
        Modifiers::NONE
    };
    let handled = bridge.handle_key_event(&KeyEvent::down(code, modifiers));
    let notes = drain(rx);
    match (handled, notes.as_slice()) {
        (true, [Notification::KeyboardInput(text)]) => Some(text.clone()),
        (false, []) => None,
        other => panic!("handled flag and notifications disagree: {other:?}"),
    }
}

// ── Scanning ──

#[test]
fn scan_reports_only_keyboards() {
    let (host, mut bridge) = setup(vec![logitech_receiver(), generic_keyboard(), webcam()]);
    host.grant("/dev/bus/usb/001/004");

    let reply = bridge.handle_method_call(&MethodCall::new(methods::SCAN_USB_KEYBOARDS));
    let MethodResponse::Success(value) = reply else {
        panic!("scan failed: {reply:?}");
    };
    let records = value.as_array().unwrap();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0]["deviceId"], "/dev/bus/usb/001/003");
    assert_eq!(records[0]["isConnected"], false);
    assert_eq!(records[0]["manufacturerName"], "Unknown");
    assert_eq!(records[0]["serialNumber"], "N/A");

    assert_eq!(records[1]["deviceId"], "/dev/bus/usb/001/004");
    assert_eq!(records[1]["deviceName"], "Gadget");
    assert_eq!(records[1]["isConnected"], true);
    assert_eq!(records[1]["manufacturerName"], "ACME");
    assert_eq!(records[1]["serialNumber"], "0001");
}

#[test]
fn scan_with_no_devices_is_empty_list() {
    let (_host, mut bridge) = setup(vec![]);
    assert_eq!(
        bridge.handle_method_call(&MethodCall::new(methods::SCAN_USB_KEYBOARDS)),
        MethodResponse::Success(json!([]))
    );
}

#[test]
fn scan_failure_is_scan_error() {
    let (host, mut bridge) = setup(vec![generic_keyboard()]);
    host.fail_enumeration(Some("usb stack unavailable"));
    let reply = bridge.handle_method_call(&MethodCall::new(methods::SCAN_USB_KEYBOARDS));
    assert_eq!(reply.error_code(), Some("SCAN_ERROR"));
    let MethodResponse::Error { message, .. } = reply else {
        unreachable!()
    };
    assert!(message.starts_with("Failed to scan USB keyboards: "));
}

#[test]
fn configured_vendor_is_scanned() {
    let host = Arc::new(MemoryHost::with_devices(vec![UsbDevice::new(
        "/dev/bus/usb/003/002",
        0x3151,
        0x4010,
    )]));
    let config = BridgeConfig {
        extra_vendor_ids: vec![0x3151],
        ..BridgeConfig::default()
    };
    let bridge = KeyboardBridge::new(host, &config);
    assert_eq!(bridge.scan_devices().unwrap().len(), 1);
}

// ── Permission ──

#[test]
fn permission_without_device_id_never_reaches_host() {
    let (host, mut bridge) = setup(vec![generic_keyboard()]);
    let reply = bridge.handle_method_call(&MethodCall::new(methods::REQUEST_PERMISSION));
    assert_eq!(reply.error_code(), Some("INVALID_ARGUMENT"));
    assert!(host.permission_requests().is_empty());
}

#[test]
fn permission_for_unknown_device() {
    let (host, mut bridge) = setup(vec![generic_keyboard()]);
    let call =
        MethodCall::new(methods::REQUEST_PERMISSION).with_arg("deviceId", "/dev/bus/usb/009/001");
    let reply = bridge.handle_method_call(&call);
    assert_eq!(reply.error_code(), Some("DEVICE_NOT_FOUND"));
    assert!(host.permission_requests().is_empty());
}

#[test]
fn permission_with_non_string_device_id() {
    let (host, mut bridge) = setup(vec![generic_keyboard()]);
    let call = MethodCall::new(methods::REQUEST_PERMISSION).with_arg("deviceId", 42);
    let reply = bridge.handle_method_call(&call);
    assert_eq!(reply.error_code(), Some("PERMISSION_ERROR"));
    let MethodResponse::Error { message, .. } = reply else {
        unreachable!()
    };
    assert!(message.starts_with("Failed to request permission: "));
    assert!(host.permission_requests().is_empty());
}

#[test]
fn permission_grant_is_forwarded() {
    let (host, mut bridge) = setup(vec![generic_keyboard()]);
    let mut host_rx = bridge.attach().unwrap();
    let mut notes = bridge.subscribe();

    let call =
        MethodCall::new(methods::REQUEST_PERMISSION).with_arg("deviceId", "/dev/bus/usb/001/004");
    assert_eq!(bridge.handle_method_call(&call), MethodResponse::Success(json!(true)));
    assert_eq!(host.permission_requests(), vec!["/dev/bus/usb/001/004"]);

    let event = host_rx.try_recv().unwrap();
    bridge.handle_host_event(&event);
    assert_eq!(
        drain(&mut notes),
        vec![Notification::PermissionGranted {
            device_id: "/dev/bus/usb/001/004".into(),
            device_name: "Gadget".into(),
        }]
    );
}

#[test]
fn permission_denial_is_forwarded() {
    let (host, mut bridge) = setup(vec![generic_keyboard()]);
    host.set_policy(PermissionPolicy::Deny);
    let mut host_rx = bridge.attach().unwrap();
    let mut notes = bridge.subscribe();

    assert!(bridge.request_permission(Some("/dev/bus/usb/001/004")).unwrap());
    bridge.handle_host_event(&host_rx.try_recv().unwrap());
    assert_eq!(
        drain(&mut notes),
        vec![Notification::PermissionDenied {
            device_id: Some("/dev/bus/usb/001/004".into())
        }]
    );
}

#[test]
fn unanswered_permission_request_still_succeeds() {
    let (host, bridge) = setup(vec![generic_keyboard()]);
    host.set_policy(PermissionPolicy::Ignore);
    assert!(bridge.request_permission(Some("/dev/bus/usb/001/004")).unwrap());
}

// ── Host events ──

#[test]
fn hotplug_events_become_notifications() {
    let (host, mut bridge) = setup(vec![]);
    let mut host_rx = bridge.attach().unwrap();
    let mut notes = bridge.subscribe();

    host.attach(generic_keyboard());
    host.detach("/dev/bus/usb/001/004");
    while let Ok(event) = host_rx.try_recv() {
        bridge.handle_host_event(&event);
    }
    assert_eq!(
        drain(&mut notes),
        vec![Notification::DeviceAttached, Notification::DeviceDetached]
    );
}

#[test]
fn grant_without_device_is_ignored() {
    let (host, mut bridge) = setup(vec![]);
    let mut host_rx = bridge.attach().unwrap();
    let mut notes = bridge.subscribe();

    host.emit(HostEvent::PermissionResult {
        device: None,
        granted: true,
    });
    bridge.handle_host_event(&host_rx.try_recv().unwrap());
    assert!(drain(&mut notes).is_empty());
}

#[test]
fn detach_swallows_unregister_failure() {
    let (host, mut bridge) = setup(vec![]);
    let _rx = bridge.attach().unwrap();
    host.fail_unregister(true);
    bridge.detach();
    assert!(!bridge.is_attached());
}

#[test]
fn drop_unregisters_listener() {
    let (host, mut bridge) = setup(vec![]);
    let _rx = bridge.attach().unwrap();
    assert!(host.is_listener_registered());
    drop(bridge);
    assert!(!host.is_listener_registered());
}

// ── Listening and decoding ──

#[test]
fn idle_bridge_never_intercepts() {
    let (_host, bridge) = setup(vec![]);
    let mut notes = bridge.subscribe();
    for code in [KeyCode::A, KeyCode::DIGIT_1, KeyCode::ENTER, KeyCode::SPACE] {
        assert_eq!(type_key(&bridge, &mut notes, code, false), None);
    }
}

#[test]
fn key_up_is_not_intercepted() {
    let (_host, mut bridge) = setup(vec![]);
    let mut notes = bridge.subscribe();
    bridge.start_listening();
    assert!(!bridge.handle_key_event(&KeyEvent::up(KeyCode::A, Modifiers::NONE)));
    assert!(drain(&mut notes).is_empty());
}

#[test]
fn digits_with_and_without_shift() {
    let (_host, mut bridge) = setup(vec![]);
    let mut notes = bridge.subscribe();
    bridge.start_listening();

    let shifted = [")", "!", "@", "#", "$", "%", "^", "&", "*", "("];
    for n in 0..=9u8 {
        let code = KeyCode::digit(n).unwrap();
        assert_eq!(type_key(&bridge, &mut notes, code, false), Some(n.to_string()));
        assert_eq!(
            type_key(&bridge, &mut notes, code, true).as_deref(),
            Some(shifted[n as usize])
        );
    }
}

#[test]
fn letters_with_and_without_shift() {
    let (_host, mut bridge) = setup(vec![]);
    let mut notes = bridge.subscribe();
    bridge.start_listening();

    for ch in 'a'..='z' {
        let code = KeyCode::letter(ch).unwrap();
        assert_eq!(type_key(&bridge, &mut notes, code, false), Some(ch.to_string()));
        assert_eq!(
            type_key(&bridge, &mut notes, code, true),
            Some(ch.to_ascii_uppercase().to_string())
        );
    }
}

#[test]
fn enter_and_backspace_ignore_shift() {
    let (_host, mut bridge) = setup(vec![]);
    let mut notes = bridge.subscribe();
    bridge.start_listening();

    for shift in [false, true] {
        assert_eq!(type_key(&bridge, &mut notes, KeyCode::ENTER, shift).as_deref(), Some("\n"));
        assert_eq!(
            type_key(&bridge, &mut notes, KeyCode::BACKSPACE, shift).as_deref(),
            Some("\u{8}")
        );
        assert_eq!(type_key(&bridge, &mut notes, KeyCode::SPACE, shift).as_deref(), Some(" "));
    }
}

#[test]
fn unmapped_keys_pass_through() {
    let (_host, mut bridge) = setup(vec![]);
    let mut notes = bridge.subscribe();
    bridge.start_listening();
    let unmapped = [
        KeyCode::F1,
        KeyCode::UP,
        KeyCode::ESCAPE,
        KeyCode::LEFT_SHIFT,
        KeyCode::CAPS_LOCK,
    ];
    for code in unmapped {
        assert_eq!(type_key(&bridge, &mut notes, code, false), None);
    }
}

#[test]
fn stop_listening_releases_keys() {
    let (_host, mut bridge) = setup(vec![]);
    let mut notes = bridge.subscribe();

    bridge.handle_method_call(&MethodCall::new(methods::START_LISTENING));
    assert_eq!(type_key(&bridge, &mut notes, KeyCode::A, false).as_deref(), Some("a"));

    bridge.handle_method_call(&MethodCall::new(methods::STOP_LISTENING));
    assert!(!bridge.listen_state().is_listening());
    assert_eq!(type_key(&bridge, &mut notes, KeyCode::A, false), None);
}

#[test]
fn start_and_stop_are_idempotent() {
    let (_host, mut bridge) = setup(vec![]);
    for _ in 0..2 {
        assert_eq!(
            bridge.handle_method_call(&MethodCall::new(methods::START_LISTENING)),
            MethodResponse::Success(json!(true))
        );
    }
    assert!(bridge.listen_state().is_listening());
    for _ in 0..2 {
        assert_eq!(
            bridge.handle_method_call(&MethodCall::new(methods::STOP_LISTENING)),
            MethodResponse::Success(json!(true))
        );
    }
    assert!(!bridge.listen_state().is_listening());
}

// ── Wire protocol ──

#[test]
fn wire_request_round_trip_through_bridge() {
    let (_host, mut bridge) = setup(vec![generic_keyboard()]);

    let req =
        WireRequest::parse(r#"{"id": 4, "method": "requestPermission", "args": {}}"#).unwrap();
    let reply = bridge.handle_method_call(&req.call).to_wire(req.id);
    assert_eq!(reply["id"], 4);
    assert_eq!(reply["error"]["code"], "INVALID_ARGUMENT");
    assert_eq!(reply["error"]["message"], "Device ID is required");

    let req = WireRequest::parse(r#"{"id": 5, "method": "getBatteryLevel"}"#).unwrap();
    assert_eq!(
        bridge.handle_method_call(&req.call).to_wire(req.id),
        json!({ "id": 5, "notImplemented": true })
    );
}
