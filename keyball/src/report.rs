//! Pointer report sent to the host and the per-model mapping of the ball axes

use crate::error::Error;
use crate::motion::FusedMotion;
use fixed::types::I16F16;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Mouse report handed over to the HID transport
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PointerReport {
    /// Buttons state
    /// Button 1 to 8 where Button1 is the LSB
    pub buttons: u8,
    /// x movement
    pub x: i8,
    /// y movement
    pub y: i8,
    /// Scroll down (negative) or up (positive) this many units
    pub wheel: i8,
    /// Scroll left (negative) or right (positive) this many units
    pub pan: i8,
}

impl PointerReport {
    /// Serialize the report
    pub fn serialize(&self) -> [u8; 5] {
        [
            self.buttons,
            self.x as u8,
            self.y as u8,
            self.wheel as u8,
            self.pan as u8,
        ]
    }

    /// Whether the report moves the pointer
    pub fn has_motion(&self) -> bool {
        self.x != 0 || self.y != 0
    }
}

/// Clip into [-127, 127]
pub fn clip2int8(v: i32) -> i8 {
    v.clamp(-127, 127) as i8
}

/// Apply the speed multiplier, truncating toward zero
pub fn scale(v: i16, speed: I16F16) -> i32 {
    I16F16::from_num(v)
        .saturating_mul(speed)
        .round_to_zero()
        .to_num::<i32>()
}

/// How the ball axes land on the report axes for one board
pub trait MotionMapper {
    /// Motion to `(x, y)` pointer movement
    fn map_move(&self, m: FusedMotion, speed: I16F16, is_left: bool) -> (i8, i8);
    /// Already divided motion to `(h, v)` scroll
    fn map_scroll(&self, m: FusedMotion, speed: I16F16, is_left: bool) -> (i8, i8);
}

/// Keyball models, by number
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BoardModel {
    Keyball39 = 39,
    Keyball44 = 44,
    Keyball46 = 46,
    Keyball61 = 61,
    OneKeyball = 147,
}

impl BoardModel {
    /// Look a model up from its number
    pub fn from_number(n: u8) -> Result<Self, Error> {
        BoardModel::try_from(n).map_err(|_| Error::UnknownBoardModel(n))
    }

    /// Sensor mounted rotated by a quarter turn
    fn is_rotated(&self) -> bool {
        !matches!(self, BoardModel::Keyball46)
    }
}

impl MotionMapper for BoardModel {
    fn map_move(&self, m: FusedMotion, speed: I16F16, is_left: bool) -> (i8, i8) {
        if self.is_rotated() {
            let x = clip2int8(scale(m.y, speed));
            let y = clip2int8(scale(m.x, speed));
            if is_left {
                (-x, -y)
            } else {
                (x, y)
            }
        } else {
            (
                clip2int8(scale(m.x, speed)),
                -clip2int8(scale(m.y, speed)),
            )
        }
    }

    fn map_scroll(&self, m: FusedMotion, speed: I16F16, is_left: bool) -> (i8, i8) {
        if self.is_rotated() {
            let h = clip2int8(scale(m.y, speed));
            let v = -clip2int8(scale(m.x, speed));
            if is_left {
                (-h, -v)
            } else {
                (h, v)
            }
        } else {
            (clip2int8(scale(m.x, speed)), clip2int8(scale(m.y, speed)))
        }
    }
}
