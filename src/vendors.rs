//! Known keyboard vendors
//!
//! USB vendor IDs of manufacturers whose devices are treated as keyboards
//! even when they do not advertise a boot-keyboard interface.

/// Fixed allow-list of keyboard vendor IDs
pub const KNOWN_KEYBOARD_VENDORS: &[u16] = &[
    0x046d, // Logitech
    0x045e, // Microsoft
    0x04f2, // Chicony Electronics
    0x413c, // Dell
    0x04d9, // Holtek Semiconductor
    0x1c4f, // SiGma Micro
    0x258a, // Sino Wealth
    0x05ac, // Apple
    0x04ca, // Lite-On Technology
    0x1a2c, // China Resource Semico
    0x062a, // MosArt Semiconductor
    0x24ae, // Shenzhen Rapoo Technology
    0x0c45, // Microdia
];

/// Check the fixed list only
#[inline]
pub fn is_known_vendor(vid: u16) -> bool {
    KNOWN_KEYBOARD_VENDORS.contains(&vid)
}

/// Fixed list plus vendor IDs added through configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorAllowList {
    extra: Vec<u16>,
}

impl VendorAllowList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extra(extra: &[u16]) -> Self {
        let mut list = Self::new();
        for &vid in extra {
            list.add(vid);
        }
        list
    }

    /// Add a vendor ID on top of the fixed list
    pub fn add(&mut self, vid: u16) {
        if !is_known_vendor(vid) && !self.extra.contains(&vid) {
            self.extra.push(vid);
        }
    }

    pub fn contains(&self, vid: u16) -> bool {
        is_known_vendor(vid) || self.extra.contains(&vid)
    }

    pub fn extra(&self) -> &[u16] {
        &self.extra
    }
}
