//! Host abstraction layer for USB keyboard access
//!
//! This crate hides the operating system behind a single trait so the bridge
//! logic can be driven by different backends:
//!
//! - Linux (udev enumeration, hidraw/usbfs permission probing, udev hot-plug)
//! - In-memory (tests and fixture replay)

pub mod enumerate;
pub mod error;
pub mod memory;
pub mod types;

mod linux;

#[cfg(all(target_os = "linux", feature = "hotplug"))]
mod hotplug;

pub use error::HostError;
pub use linux::LinuxHost;
pub use memory::{MemoryFixture, MemoryHost, PermissionPolicy};
pub use types::{usb_class, HostEvent, UsbDevice, UsbInterface};

use std::sync::Arc;
use tokio::sync::broadcast;

/// Broadcast channel capacity for host events
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The host trait - every backend implements this
///
/// All calls are synchronous and return promptly. Anything the OS answers
/// later (permission decisions, hot-plug) is delivered through the receiver
/// handed out by [`UsbHost::register_listener`].
pub trait UsbHost: Send + Sync {
    /// Enumerate the USB devices currently attached
    fn device_list(&self) -> Result<Vec<UsbDevice>, HostError>;

    /// Check whether the application may already open this device
    fn has_permission(&self, device: &UsbDevice) -> bool;

    /// Ask the OS for access to a device
    ///
    /// Returns as soon as the request is issued. The decision arrives as a
    /// [`HostEvent::PermissionResult`] on the listener channel.
    fn request_permission(&self, device: &UsbDevice) -> Result<(), HostError>;

    /// Register for attach, detach and permission-result events
    fn register_listener(&self) -> Result<broadcast::Receiver<HostEvent>, HostError>;

    /// Drop the registration made by [`UsbHost::register_listener`]
    fn unregister_listener(&self) -> Result<(), HostError>;

    /// Find a live device by its OS-assigned name
    fn find_device(&self, name: &str) -> Result<Option<UsbDevice>, HostError> {
        Ok(self.device_list()?.into_iter().find(|d| d.name == name))
    }
}

/// Type alias for a shared host
pub type BoxedHost = Arc<dyn UsbHost>;
