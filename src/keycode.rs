//! Key events in USB HID terms
//!
//! Key codes are HID keyboard usage IDs (usage page 0x07), the same numbers a
//! boot-protocol keyboard puts in its reports. Modifiers use the boot-report
//! modifier byte layout.

use std::fmt;

/// HID keyboard usage ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(pub u8);

impl KeyCode {
    pub const A: KeyCode = KeyCode(0x04);
    pub const Z: KeyCode = KeyCode(0x1D);
    /// "1 !" - digits run 1..9 then 0
    pub const DIGIT_1: KeyCode = KeyCode(0x1E);
    pub const DIGIT_9: KeyCode = KeyCode(0x26);
    pub const DIGIT_0: KeyCode = KeyCode(0x27);
    pub const ENTER: KeyCode = KeyCode(0x28);
    pub const ESCAPE: KeyCode = KeyCode(0x29);
    pub const BACKSPACE: KeyCode = KeyCode(0x2A);
    pub const TAB: KeyCode = KeyCode(0x2B);
    pub const SPACE: KeyCode = KeyCode(0x2C);
    pub const MINUS: KeyCode = KeyCode(0x2D);
    pub const EQUAL: KeyCode = KeyCode(0x2E);
    pub const LEFT_BRACKET: KeyCode = KeyCode(0x2F);
    pub const RIGHT_BRACKET: KeyCode = KeyCode(0x30);
    pub const BACKSLASH: KeyCode = KeyCode(0x31);
    pub const SEMICOLON: KeyCode = KeyCode(0x33);
    pub const APOSTROPHE: KeyCode = KeyCode(0x34);
    pub const GRAVE: KeyCode = KeyCode(0x35);
    pub const COMMA: KeyCode = KeyCode(0x36);
    pub const PERIOD: KeyCode = KeyCode(0x37);
    pub const SLASH: KeyCode = KeyCode(0x38);
    pub const CAPS_LOCK: KeyCode = KeyCode(0x39);
    pub const F1: KeyCode = KeyCode(0x3A);
    pub const F12: KeyCode = KeyCode(0x45);
    pub const DELETE: KeyCode = KeyCode(0x4C);
    pub const RIGHT: KeyCode = KeyCode(0x4F);
    pub const LEFT: KeyCode = KeyCode(0x50);
    pub const DOWN: KeyCode = KeyCode(0x51);
    pub const UP: KeyCode = KeyCode(0x52);
    pub const LEFT_CTRL: KeyCode = KeyCode(0xE0);
    pub const LEFT_SHIFT: KeyCode = KeyCode(0xE1);
    pub const LEFT_ALT: KeyCode = KeyCode(0xE2);
    pub const LEFT_GUI: KeyCode = KeyCode(0xE3);
    pub const RIGHT_CTRL: KeyCode = KeyCode(0xE4);
    pub const RIGHT_SHIFT: KeyCode = KeyCode(0xE5);
    pub const RIGHT_ALT: KeyCode = KeyCode(0xE6);
    pub const RIGHT_GUI: KeyCode = KeyCode(0xE7);

    /// Letter key for an ASCII letter (either case)
    pub fn letter(ch: char) -> Option<KeyCode> {
        let lower = ch.to_ascii_lowercase();
        lower
            .is_ascii_lowercase()
            .then(|| KeyCode(Self::A.0 + (lower as u8 - b'a')))
    }

    /// Digit key for 0..=9
    pub fn digit(n: u8) -> Option<KeyCode> {
        match n {
            0 => Some(Self::DIGIT_0),
            1..=9 => Some(KeyCode(Self::DIGIT_1.0 + n - 1)),
            _ => None,
        }
    }

    pub fn is_letter(self) -> bool {
        (Self::A..=Self::Z).contains(&self)
    }

    pub fn is_digit(self) -> bool {
        (Self::DIGIT_1..=Self::DIGIT_0).contains(&self)
    }

    /// Numeric value of a digit key
    pub fn digit_value(self) -> Option<u8> {
        if self == Self::DIGIT_0 {
            Some(0)
        } else if self.is_digit() {
            Some(self.0 - Self::DIGIT_1.0 + 1)
        } else {
            None
        }
    }

    /// Modifier bit for modifier keys (0xE0..=0xE7)
    pub fn modifier_bit(self) -> Option<Modifiers> {
        (Self::LEFT_CTRL..=Self::RIGHT_GUI)
            .contains(&self)
            .then(|| Modifiers(1 << (self.0 - Self::LEFT_CTRL.0)))
    }

    /// Human-readable name of the key
    #[rustfmt::skip]
    pub fn name(self) -> &'static str {
        match self.0 {
            0x00 => "None",
            0x04 => "A", 0x05 => "B", 0x06 => "C", 0x07 => "D",
            0x08 => "E", 0x09 => "F", 0x0A => "G", 0x0B => "H",
            0x0C => "I", 0x0D => "J", 0x0E => "K", 0x0F => "L",
            0x10 => "M", 0x11 => "N", 0x12 => "O", 0x13 => "P",
            0x14 => "Q", 0x15 => "R", 0x16 => "S", 0x17 => "T",
            0x18 => "U", 0x19 => "V", 0x1A => "W", 0x1B => "X",
            0x1C => "Y", 0x1D => "Z",
            0x1E => "1", 0x1F => "2", 0x20 => "3", 0x21 => "4",
            0x22 => "5", 0x23 => "6", 0x24 => "7", 0x25 => "8",
            0x26 => "9", 0x27 => "0",
            0x28 => "Enter", 0x29 => "Escape", 0x2A => "Backspace",
            0x2B => "Tab", 0x2C => "Space", 0x2D => "-", 0x2E => "=",
            0x2F => "[", 0x30 => "]", 0x31 => "\\", 0x32 => "#",
            0x33 => ";", 0x34 => "'", 0x35 => "`", 0x36 => ",",
            0x37 => ".", 0x38 => "/", 0x39 => "CapsLock",
            0x3A => "F1", 0x3B => "F2", 0x3C => "F3", 0x3D => "F4",
            0x3E => "F5", 0x3F => "F6", 0x40 => "F7", 0x41 => "F8",
            0x42 => "F9", 0x43 => "F10", 0x44 => "F11", 0x45 => "F12",
            0x49 => "Insert", 0x4A => "Home", 0x4B => "PageUp",
            0x4C => "Delete", 0x4D => "End", 0x4E => "PageDown",
            0x4F => "Right", 0x50 => "Left", 0x51 => "Down", 0x52 => "Up",
            0xE0 => "LCtrl", 0xE1 => "LShift", 0xE2 => "LAlt", 0xE3 => "LGUI",
            0xE4 => "RCtrl", 0xE5 => "RShift", 0xE6 => "RAlt", 0xE7 => "RGUI",
            _ => "?",
        }
    }

    /// Key and shift state that produce a character on a US layout
    pub fn from_char(ch: char) -> Option<(KeyCode, bool)> {
        if let Some(code) = Self::letter(ch) {
            return Some((code, ch.is_ascii_uppercase()));
        }
        if let Some(n) = ch.to_digit(10) {
            return Some((Self::digit(n as u8)?, false));
        }
        // Shifted digit row, indexed by the digit under each symbol
        if let Some(n) = ")!@#$%^&*(".find(ch) {
            return Some((Self::digit(n as u8)?, true));
        }
        let key = match ch {
            ' ' => (Self::SPACE, false),
            '\n' => (Self::ENTER, false),
            '\t' => (Self::TAB, false),
            '-' => (Self::MINUS, false),
            '_' => (Self::MINUS, true),
            '=' => (Self::EQUAL, false),
            '+' => (Self::EQUAL, true),
            '[' => (Self::LEFT_BRACKET, false),
            '{' => (Self::LEFT_BRACKET, true),
            ']' => (Self::RIGHT_BRACKET, false),
            '}' => (Self::RIGHT_BRACKET, true),
            '\\' => (Self::BACKSLASH, false),
            '|' => (Self::BACKSLASH, true),
            ';' => (Self::SEMICOLON, false),
            ':' => (Self::SEMICOLON, true),
            '\'' => (Self::APOSTROPHE, false),
            '"' => (Self::APOSTROPHE, true),
            '`' => (Self::GRAVE, false),
            '~' => (Self::GRAVE, true),
            ',' => (Self::COMMA, false),
            '<' => (Self::COMMA, true),
            '.' => (Self::PERIOD, false),
            '>' => (Self::PERIOD, true),
            '/' => (Self::SLASH, false),
            '?' => (Self::SLASH, true),
            _ => return None,
        };
        Some(key)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.name(), self.0)
    }
}

/// Boot-report modifier byte
///
/// ```text
/// Bit 0 = Left Ctrl,  Bit 1 = Left Shift,
/// Bit 2 = Left Alt,   Bit 3 = Left GUI,
/// Bit 4 = Right Ctrl, Bit 5 = Right Shift,
/// Bit 6 = Right Alt,  Bit 7 = Right GUI
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Modifiers(pub u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const LEFT_CTRL: Modifiers = Modifiers(0x01);
    pub const LEFT_SHIFT: Modifiers = Modifiers(0x02);
    pub const LEFT_ALT: Modifiers = Modifiers(0x04);
    pub const LEFT_GUI: Modifiers = Modifiers(0x08);
    pub const RIGHT_CTRL: Modifiers = Modifiers(0x10);
    pub const RIGHT_SHIFT: Modifiers = Modifiers(0x20);
    pub const RIGHT_ALT: Modifiers = Modifiers(0x40);
    pub const RIGHT_GUI: Modifiers = Modifiers(0x80);

    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    pub const fn without(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 & !other.0)
    }

    /// Either shift key held
    pub const fn shift(self) -> bool {
        self.0 & (Self::LEFT_SHIFT.0 | Self::RIGHT_SHIFT.0) != 0
    }

    pub const fn ctrl(self) -> bool {
        self.0 & (Self::LEFT_CTRL.0 | Self::RIGHT_CTRL.0) != 0
    }

    pub const fn alt(self) -> bool {
        self.0 & (Self::LEFT_ALT.0 | Self::RIGHT_ALT.0) != 0
    }
}

/// Whether the key went down or up
///
/// Auto-repeat is reported as `Down`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    Down,
    Up,
}

/// A decoded key event as delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub action: KeyAction,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn down(code: KeyCode, modifiers: Modifiers) -> Self {
        Self {
            code,
            action: KeyAction::Down,
            modifiers,
        }
    }

    pub fn up(code: KeyCode, modifiers: Modifiers) -> Self {
        Self {
            code,
            action: KeyAction::Up,
            modifiers,
        }
    }
}
