//! Keycodes seen by the pointing pipeline

use keyberon::key_code::KeyCode;

/// Custom events, mostly mouse events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CustomEvent {
    /// Mouse left click
    MouseLeftClick,
    /// Mouse right click
    MouseRightClick,
    /// Mouse Wheel click
    MouseWheelClick,
    /// Ball is wheel while held
    Scroll,
    /// Need more motion before the click layer comes up
    ClickThresholdInc,
    /// Need less motion before the click layer comes up
    ClickThresholdDec,
    /// Reverse the vertical scroll direction
    ScrollReverseV,
    /// Reverse the horizontal scroll direction
    ScrollReverseH,
    /// Increase sensor CPI by 100
    CpiInc100,
    /// Decrease sensor CPI by 100
    CpiDec100,
    /// Increase sensor CPI by 1000
    CpiInc1k,
    /// Decrease sensor CPI by 1000
    CpiDec1k,
    /// Next CPI, wrapping around
    CpiCycle,
    /// Toggle scroll mode on each tap
    ScrollModeToggle,
    /// Scroll mode while held
    ScrollModeMomentary,
    /// Slower scroll
    ScrollDivInc,
    /// Faster scroll
    ScrollDivDec,
    /// Keep the click layer longer
    ClickTimeoutInc,
    /// Drop the click layer sooner
    ClickTimeoutDec,
    /// Use the trackball of the other half or not
    RemoteBallToggle,
    /// Save CPI, scroll divisor and click layer timeout
    KbcSave,
    /// Reset saved settings to their defaults
    KbcReset,
}

impl CustomEvent {
    /// Report button bit of the mouse buttons
    pub fn button_bit(&self) -> Option<u8> {
        match self {
            CustomEvent::MouseLeftClick => Some(1 << 0),
            CustomEvent::MouseRightClick => Some(1 << 1),
            CustomEvent::MouseWheelClick => Some(1 << 2),
            _ => None,
        }
    }
}

/// A key as handed to `process_key`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keycode {
    /// Regular key
    Key(KeyCode),
    /// Custom event
    Custom(CustomEvent),
}

/// Modifiers, both sides
pub const MODIFIER_KEYS: [KeyCode; 8] = [
    KeyCode::LGui,
    KeyCode::LCtrl,
    KeyCode::LAlt,
    KeyCode::LShift,
    KeyCode::RGui,
    KeyCode::RCtrl,
    KeyCode::RAlt,
    KeyCode::RShift,
];

const KC_A: u8 = KeyCode::A as u8;
const KC_Z: u8 = KeyCode::Z as u8;
const KC_1: u8 = KeyCode::Kb1 as u8;
const KC_9: u8 = KeyCode::Kb9 as u8;

/// Character shown in the pressed key history
pub fn key_to_char(kc: KeyCode) -> char {
    match kc as u8 {
        v @ KC_A..=KC_Z => (b'a' + (v - KC_A)) as char,
        v @ KC_1..=KC_9 => (b'1' + (v - KC_1)) as char,
        _ => match kc {
            KeyCode::Kb0 => '0',
            KeyCode::Space => ' ',
            KeyCode::Minus => '-',
            KeyCode::Comma => ',',
            KeyCode::Dot => '.',
            KeyCode::Slash => '/',
            _ => '?',
        },
    }
}
