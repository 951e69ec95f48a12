//! Status text for a small display

use crate::keyball::PRESSED_KEYS_LEN;
use crate::log::*;
use core::fmt::Write;
use heapless::String;

/// Room for the whole status text
pub const STATUS_LEN: usize = 96;

/// Snapshot of what the display shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// CPI, in units of 100
    pub cpi: u8,
    /// 1-based scroll divisor setting
    pub scroll_div: u8,
    /// Motion of the other half is used
    pub remote_enabled: bool,
    /// Speed multiplier, in percent
    pub speed_pct: i32,
    pub keys: [char; PRESSED_KEYS_LEN],
    /// Highest active layer
    pub layer: u8,
    /// Motion counted toward the click threshold
    pub movement: i16,
    pub click_threshold: i16,
    /// Click layer is up, render in reverse video
    pub inverted: bool,
}

/// Hex digit of the low nibble
fn to_1x(x: u8) -> char {
    let x = x & 0x0f;
    if x < 10 {
        (b'0' + x) as char
    } else {
        (b'a' + x - 10) as char
    }
}

impl Status {
    /// Render, one line per item
    pub fn render(&self) -> String<STATUS_LEN> {
        let mut s = String::new();
        if self.write_to(&mut s).is_err() {
            warn!("Status text truncated");
        }
        s
    }

    fn write_to(&self, s: &mut String<STATUS_LEN>) -> core::fmt::Result {
        writeln!(s, "CPI:{:>4}", self.cpi)?;
        writeln!(s, "SCR:{}", to_1x(self.scroll_div))?;
        writeln!(s, "LFT:{}", if self.remote_enabled { "ON" } else { "OFF" })?;
        writeln!(s, "SPD:{:>4}", self.speed_pct)?;
        s.push_str("KEYS:").map_err(|_| core::fmt::Error)?;
        for c in self.keys {
            s.push(c).map_err(|_| core::fmt::Error)?;
        }
        writeln!(s)?;
        write!(
            s,
            "Layer:{:>3} MV:{:>3}/{:>3}",
            self.layer, self.movement, self.click_threshold
        )
    }
}
