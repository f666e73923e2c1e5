//! Key event decoder: HID usage + shift -> text, fixed US layout
//!
//! Only shift is consulted. Ctrl, Alt, GUI and Caps Lock do not change the
//! result.

use crate::keycode::{KeyAction, KeyCode, KeyEvent};
use crate::listening::ListenState;

/// Backspace control character forwarded for the Backspace key
pub const BACKSPACE_CHAR: char = '\u{8}';

/// Shifted glyphs of the digit row, indexed by digit value
const SHIFTED_DIGITS: [char; 10] = [')', '!', '@', '#', '$', '%', '^', '&', '*', '('];

/// Punctuation keys: (key, unshifted, shifted)
const PUNCTUATION: &[(KeyCode, char, char)] = &[
    (KeyCode::MINUS, '-', '_'),
    (KeyCode::EQUAL, '=', '+'),
    (KeyCode::LEFT_BRACKET, '[', '{'),
    (KeyCode::RIGHT_BRACKET, ']', '}'),
    (KeyCode::BACKSLASH, '\\', '|'),
    (KeyCode::SEMICOLON, ';', ':'),
    (KeyCode::APOSTROPHE, '\'', '"'),
    (KeyCode::COMMA, ',', '<'),
    (KeyCode::PERIOD, '.', '>'),
    (KeyCode::SLASH, '/', '?'),
    (KeyCode::GRAVE, '`', '~'),
];

/// Decode a key into the character it types
///
/// Returns `None` for keys outside the supported set (function keys,
/// arrows, modifiers, ...), which the host should keep processing.
pub fn decode_key(code: KeyCode, shift: bool) -> Option<char> {
    if code.is_letter() {
        let ch = (b'a' + (code.0 - KeyCode::A.0)) as char;
        return Some(if shift { ch.to_ascii_uppercase() } else { ch });
    }

    if let Some(n) = code.digit_value() {
        return Some(if shift {
            SHIFTED_DIGITS[n as usize]
        } else {
            (b'0' + n) as char
        });
    }

    match code {
        KeyCode::SPACE => Some(' '),
        KeyCode::ENTER => Some('\n'),
        KeyCode::BACKSPACE => Some(BACKSPACE_CHAR),
        _ => PUNCTUATION
            .iter()
            .find(|(key, _, _)| *key == code)
            .map(|&(_, plain, shifted)| if shift { shifted } else { plain }),
    }
}

/// Decide whether an event is intercepted and what it types
///
/// `None` means "not handled": the bridge is idle, the event is not a key
/// press, or the key has no mapping.
pub fn intercept(state: ListenState, event: &KeyEvent) -> Option<char> {
    if !state.is_listening() || event.action != KeyAction::Down {
        return None;
    }
    decode_key(event.code, event.modifiers.shift())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keycode::Modifiers;

    #[test]
    fn test_digits_unshifted() {
        for n in 0..=9u8 {
            let code = KeyCode::digit(n).unwrap();
            assert_eq!(decode_key(code, false), Some((b'0' + n) as char));
        }
    }

    #[test]
    fn test_digits_shifted() {
        let expected = "!@#$%^&*()";
        for (i, ch) in expected.chars().enumerate() {
            let code = KeyCode::digit(((i + 1) % 10) as u8).unwrap();
            assert_eq!(decode_key(code, true), Some(ch), "digit {}", (i + 1) % 10);
        }
    }

    #[test]
    fn test_letters() {
        for (i, lower) in ('a'..='z').enumerate() {
            let code = KeyCode(KeyCode::A.0 + i as u8);
            assert_eq!(decode_key(code, false), Some(lower));
            assert_eq!(decode_key(code, true), Some(lower.to_ascii_uppercase()));
        }
    }

    #[test]
    fn test_enter_and_backspace_ignore_shift() {
        for shift in [false, true] {
            assert_eq!(decode_key(KeyCode::ENTER, shift), Some('\n'));
            assert_eq!(decode_key(KeyCode::BACKSPACE, shift), Some('\u{8}'));
            assert_eq!(decode_key(KeyCode::SPACE, shift), Some(' '));
        }
    }

    #[test]
    fn test_punctuation_table() {
        let cases = [
            (KeyCode::MINUS, '-', '_'),
            (KeyCode::EQUAL, '=', '+'),
            (KeyCode::LEFT_BRACKET, '[', '{'),
            (KeyCode::RIGHT_BRACKET, ']', '}'),
            (KeyCode::BACKSLASH, '\\', '|'),
            (KeyCode::SEMICOLON, ';', ':'),
            (KeyCode::APOSTROPHE, '\'', '"'),
            (KeyCode::COMMA, ',', '<'),
            (KeyCode::PERIOD, '.', '>'),
            (KeyCode::SLASH, '/', '?'),
            (KeyCode::GRAVE, '`', '~'),
        ];
        for (code, plain, shifted) in cases {
            assert_eq!(decode_key(code, false), Some(plain));
            assert_eq!(decode_key(code, true), Some(shifted));
        }
    }

    #[test]
    fn test_decoding_agrees_with_us_layout() {
        for ch in (' '..='~').chain(['\n']) {
            if let Some((code, shift)) = KeyCode::from_char(ch) {
                assert_eq!(decode_key(code, shift), Some(ch), "char {ch:?}");
            }
        }
    }

    #[test]
    fn test_unmapped_keys() {
        for code in [
            KeyCode::ESCAPE,
            KeyCode::TAB,
            KeyCode::CAPS_LOCK,
            KeyCode::F1,
            KeyCode::UP,
            KeyCode::DELETE,
            KeyCode::LEFT_SHIFT,
            KeyCode(0x32), // Non-US #
        ] {
            assert_eq!(decode_key(code, false), None, "{code}");
        }
    }

    #[test]
    fn test_idle_never_intercepts() {
        for raw in 0..=u8::MAX {
            let event = KeyEvent::down(KeyCode(raw), Modifiers::NONE);
            assert_eq!(intercept(ListenState::Idle, &event), None);
        }
    }

    #[test]
    fn test_key_up_not_intercepted() {
        let event = KeyEvent::up(KeyCode::A, Modifiers::NONE);
        assert_eq!(intercept(ListenState::Listening, &event), None);
    }

    #[test]
    fn test_only_shift_is_consulted() {
        let ctrl_alt = Modifiers::LEFT_CTRL.union(Modifiers::LEFT_ALT);
        let event = KeyEvent::down(KeyCode::A, ctrl_alt);
        assert_eq!(intercept(ListenState::Listening, &event), Some('a'));

        let right_shift = KeyEvent::down(KeyCode::A, Modifiers::RIGHT_SHIFT);
        assert_eq!(intercept(ListenState::Listening, &right_shift), Some('A'));
    }
}
