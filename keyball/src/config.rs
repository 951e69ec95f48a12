//! Constants, runtime configuration and persisted settings

use crate::error::Error;
use crate::log::*;
use crate::report::BoardModel;
use crate::scroll::ScrollSnapMode;
use bitfield_struct::bitfield;
use fixed::types::I16F16;

/// Default CPI, in units of 100
pub const CPI_DEFAULT: u8 = 11;
/// Upper bound of the CPI, exclusive, in units of 100
pub const CPI_MAX: u8 = 120;
/// Unit of the stored CPI
pub const CPI_UNIT: u16 = 100;

/// Upper bound of the scroll divisor exponent, exclusive
pub const SCROLL_DIV_MAX: u8 = 7;
/// Default scroll divisor setting, 1-based: the divisor is `1 << (4 - 1)`
pub const SCROLL_DIV_DEFAULT: u8 = 4;

/// Scroll snap defaults
pub const SCROLL_SNAP_MODE_DEFAULT: ScrollSnapMode = ScrollSnapMode::Horizontal;
pub const SCROLL_SNAP_TENSION_THRESHOLD: i16 = 12;
pub const SCROLL_SNAP_RESET_MS: u32 = 100;

/// Bounds of the click layer timeout, in ms
pub const AML_TIMEOUT_MIN: u16 = 100;
pub const AML_TIMEOUT_MAX: u16 = 1000;
/// Step of the click layer timeout keys, in ms
pub const AML_TIMEOUT_QU: u16 = 50;

/// Default motion needed to bring the click layer up
pub const CLICK_THRESHOLD_DEFAULT: i16 = 50;
/// Step of the click threshold keys
pub const CLICK_THRESHOLD_STEP: i16 = 5;
/// Lowest click threshold reachable with the keys
pub const CLICK_THRESHOLD_MIN: i16 = 5;

/// Size of a persisted settings record
pub const BLOB_SIZE: usize = 8;
/// A persisted settings record
pub type Blob = [u8; BLOB_SIZE];

/// Storage slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Slot {
    /// Click layer settings
    User,
    /// Sensor and scroll settings
    Keyball,
}

const USER_MAGIC: u8 = 0xC1;
const KB_MAGIC: u8 = 0xBA;

/// Board level configuration, fixed at build time
#[derive(Debug, Clone)]
pub struct KeyballConfig {
    /// Board model, selects the axis mapping
    pub model: BoardModel,
    pub scroll_snap_mode: ScrollSnapMode,
    /// Scroll requested before the snapped axes start scrolling
    pub scroll_snap_threshold: i16,
    /// Rest time after which the snap tension goes back to zero, in ms
    pub scroll_snap_reset_ms: u32,
    /// CPI on first run, in units of 100
    pub default_cpi: u8,
    /// Scroll divisor on first run, 1-based
    pub default_scroll_div: u8,
    /// Initial speed multiplier
    pub speed: I16F16,
}

impl Default for KeyballConfig {
    fn default() -> Self {
        Self {
            model: BoardModel::Keyball44,
            scroll_snap_mode: SCROLL_SNAP_MODE_DEFAULT,
            scroll_snap_threshold: SCROLL_SNAP_TENSION_THRESHOLD,
            scroll_snap_reset_ms: SCROLL_SNAP_RESET_MS,
            default_cpi: CPI_DEFAULT,
            default_scroll_div: SCROLL_DIV_DEFAULT,
            speed: I16F16::ONE,
        }
    }
}

#[bitfield(u8, order = Lsb, defmt = cfg(feature = "defmt"))]
#[derive(PartialEq, Eq)]
struct UserFlags {
    #[bits(1)]
    scroll_reverse_v: bool,
    #[bits(1)]
    scroll_reverse_h: bool,
    #[bits(6)]
    _reserved: u8,
}

/// Settings of the click layer, changed from the keyboard itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UserConfig {
    /// Motion needed, while waiting, to bring the click layer up
    pub click_threshold: i16,
    pub scroll_reverse_h: bool,
    pub scroll_reverse_v: bool,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            click_threshold: CLICK_THRESHOLD_DEFAULT,
            scroll_reverse_h: false,
            scroll_reverse_v: false,
        }
    }
}

impl UserConfig {
    /// Raise or lower the click threshold, never below `CLICK_THRESHOLD_MIN`
    pub fn adjust_click_threshold(&mut self, delta: i16) {
        self.click_threshold = self
            .click_threshold
            .saturating_add(delta)
            .max(CLICK_THRESHOLD_MIN);
    }

    /// Serialize into a blob
    pub fn serialize(&self) -> Blob {
        let t = self.click_threshold.to_le_bytes();
        let flags = UserFlags::new()
            .with_scroll_reverse_v(self.scroll_reverse_v)
            .with_scroll_reverse_h(self.scroll_reverse_h);
        seal([USER_MAGIC, t[0], t[1], flags.into_bits(), 0, 0, 0, 0])
    }

    /// Deserialize a blob written by `serialize`, the click threshold is
    /// floored at `CLICK_THRESHOLD_MIN`
    pub fn deserialize(b: &Blob) -> Result<Self, Error> {
        check(b, USER_MAGIC)?;
        let flags = UserFlags::from_bits(b[3]);
        let click_threshold = i16::from_le_bytes([b[1], b[2]]);
        if click_threshold < CLICK_THRESHOLD_MIN {
            warn!("Click threshold {} raised to {}", click_threshold, CLICK_THRESHOLD_MIN);
        }
        Ok(Self {
            click_threshold: click_threshold.max(CLICK_THRESHOLD_MIN),
            scroll_reverse_h: flags.scroll_reverse_h(),
            scroll_reverse_v: flags.scroll_reverse_v(),
        })
    }
}

/// Sensor and scroll settings saved with `KbcSave`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KbConfig {
    /// In units of 100
    pub cpi: u8,
    /// 1-based scroll divisor setting
    pub scroll_div: u8,
    /// Click layer timeout, in ms
    pub click_timeout: u16,
}

impl KbConfig {
    /// Serialize into a blob
    pub fn serialize(&self) -> Blob {
        let t = self.click_timeout.to_le_bytes();
        seal([KB_MAGIC, self.cpi, self.scroll_div, t[0], t[1], 0, 0, 0])
    }

    /// Deserialize a blob written by `serialize`
    pub fn deserialize(b: &Blob) -> Result<Self, Error> {
        check(b, KB_MAGIC)?;
        Ok(Self {
            cpi: b[1],
            scroll_div: b[2],
            click_timeout: u16::from_le_bytes([b[3], b[4]]),
        })
    }
}

fn crc(b: &Blob) -> u16 {
    crc16::State::<crc16::ARC>::calculate(&b[..BLOB_SIZE - 2])
}

/// Store the CRC in the last two bytes
fn seal(mut b: Blob) -> Blob {
    let c = crc(&b).to_le_bytes();
    b[BLOB_SIZE - 2] = c[0];
    b[BLOB_SIZE - 1] = c[1];
    b
}

fn check(b: &Blob, magic: u8) -> Result<(), Error> {
    let expected = crc(b);
    let found = u16::from_le_bytes([b[BLOB_SIZE - 2], b[BLOB_SIZE - 1]]);
    if expected != found {
        error!("Settings checksum mismatch: {:x} != {:x}", expected, found);
        return Err(Error::Checksum { expected, found });
    }
    if b[0] != magic {
        error!("Settings record {:x} where {:x} was expected", b[0], magic);
        return Err(Error::BadMagic(b[0]));
    }
    Ok(())
}
