//! Collaborators the pointing pipeline is driven through.
//!
//! The matrix scan loop, the sensor driver, the split transport, the layer
//! engine and the settings storage all live in the firmware. The pipeline
//! only sees them through these traits.

use crate::config::{Blob, Slot};
use crate::motion::MouseMove;

/// Monotonic millisecond clock
pub trait Clock {
    /// Current time, in ms. Allowed to wrap.
    fn now_ms(&self) -> u32;
}

/// Time elapsed since `since`, robust to the clock wrapping around
pub fn elapsed(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// Trackball sensor on this half
pub trait MotionSensor {
    /// Power up the sensor, returns whether a ball is present
    fn init(&mut self) -> bool;
    /// Motion since the last read
    fn read_motion(&mut self) -> MouseMove;
    /// Set the sensor resolution, in counts per inch
    fn set_cpi(&mut self, cpi: u16);
}

/// Link to the other half of the keyboard
pub trait SplitLink {
    /// Whether the other half has a trackball
    fn remote_has_ball(&mut self) -> bool;
    /// Motion captured on the other half since the last fetch.
    ///
    /// Must return a zero motion when the link is down. A transport running
    /// in its own task publishes into a `MotionSlot` and this takes from it.
    fn fetch_motion(&mut self) -> MouseMove;
}

/// Layer engine of the keymap
pub trait LayerControl {
    /// Turn a layer on or off. Calling it twice with the same state is a no-op.
    fn set_layer(&mut self, layer: u8, active: bool);
    /// Highest active layer
    fn current_layer(&self) -> u8;
}

/// Persistent settings storage, fire and forget
pub trait ConfigStore {
    /// Read the blob stored in `slot`. Never written slots may return anything.
    fn read(&mut self, slot: Slot) -> Blob;
    /// Write `blob` into `slot`
    fn write(&mut self, slot: Slot, blob: &Blob);
}

/// Everything the firmware has to provide to run the pipeline
pub trait Hardware: Clock + MotionSensor + SplitLink + LayerControl + ConfigStore {}

impl<T> Hardware for T where T: Clock + MotionSensor + SplitLink + LayerControl + ConfigStore {}
