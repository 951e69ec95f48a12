//! Trackball motion, and how both halves' motions are fused

use portable_atomic::{AtomicU32, Ordering};

/// Raw motion read from the sensor of one half
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseMove {
    /// Delta X
    pub dx: i16,
    /// Delta Y
    pub dy: i16,
}

impl MouseMove {
    /// No motion
    pub const ZERO: MouseMove = MouseMove { dx: 0, dy: 0 };

    /// Create a new mouse move event
    pub const fn new(dx: i16, dy: i16) -> Self {
        MouseMove { dx, dy }
    }

    /// Whether the ball did not move
    pub fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    /// Add two motions, clipping at the i16 bounds
    pub fn saturating_add(&self, other: &MouseMove) -> MouseMove {
        MouseMove {
            dx: self.dx.saturating_add(other.dx),
            dy: self.dy.saturating_add(other.dy),
        }
    }

    /// Pack into an u32, dx in the upper half-word
    pub fn to_u32(&self) -> u32 {
        ((self.dx as u16 as u32) << 16) | (self.dy as u16 as u32)
    }

    /// Unpack from an u32 built by `to_u32`
    pub fn from_u32(v: u32) -> Self {
        MouseMove {
            dx: (v >> 16) as i16,
            dy: v as i16,
        }
    }
}

/// Motion of both halves combined, before any mapping to the report
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FusedMotion {
    /// Sum of the X deltas
    pub x: i16,
    /// Sum of the Y deltas
    pub y: i16,
}

/// Fuse the motion of this half with the one of the other half.
///
/// Both halves are mirrored: when `remote_is_flipped` is set, the other half
/// motion is negated before being added. Sums saturate instead of wrapping.
pub fn fuse(local: MouseMove, remote: MouseMove, remote_is_flipped: bool) -> FusedMotion {
    let remote = if remote_is_flipped {
        MouseMove::new(remote.dx.saturating_neg(), remote.dy.saturating_neg())
    } else {
        remote
    };
    FusedMotion {
        x: local.dx.saturating_add(remote.dx),
        y: local.dy.saturating_add(remote.dy),
    }
}

/// Mailbox holding the motion captured on the other half.
///
/// The split transport publishes into it, the scan loop takes from it. The
/// whole motion lives in one atomic word so a reader never sees a torn
/// sample, even when the transport runs on another thread.
#[derive(Debug, Default)]
pub struct MotionSlot {
    raw: AtomicU32,
}

impl MotionSlot {
    /// Create an empty slot
    pub const fn new() -> Self {
        Self {
            raw: AtomicU32::new(0),
        }
    }

    /// Add motion to what is waiting in the slot
    pub fn publish(&self, m: MouseMove) {
        // the closure never returns None, this cannot fail
        let _ = self
            .raw
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| {
                Some(MouseMove::from_u32(v).saturating_add(&m).to_u32())
            });
    }

    /// Take the pending motion, leaving the slot empty
    pub fn take(&self) -> MouseMove {
        MouseMove::from_u32(self.raw.swap(0, Ordering::AcqRel))
    }
}
