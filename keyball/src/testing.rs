//! Fake collaborators for the unit tests

use crate::config::{Blob, Slot};
use crate::hw::{Clock, ConfigStore, LayerControl, MotionSensor, SplitLink};
use crate::motion::{MotionSlot, MouseMove};

/// Layers as a bit mask
#[derive(Debug, Default)]
pub struct FakeLayers {
    pub mask: u32,
}

impl FakeLayers {
    pub fn is_active(&self, layer: u8) -> bool {
        self.mask & (1 << layer) != 0
    }
}

impl LayerControl for FakeLayers {
    fn set_layer(&mut self, layer: u8, active: bool) {
        if active {
            self.mask |= 1 << layer;
        } else {
            self.mask &= !(1 << layer);
        }
    }

    fn current_layer(&self) -> u8 {
        (31 - self.mask.leading_zeros().min(31)) as u8
    }
}

/// Everything the pipeline needs, driven by hand
#[derive(Debug)]
pub struct FakeHardware {
    /// Current time
    pub now: u32,
    /// Sensor found on this half
    pub has_ball: bool,
    /// Sensor found on the other half
    pub remote_has_ball: bool,
    /// Next local read
    pub local: MouseMove,
    /// Motion published by the other half
    pub remote: MotionSlot,
    /// Number of remote fetches
    pub fetches: usize,
    /// CPI the sensor was last set to
    pub cpi: Option<u16>,
    pub layers: FakeLayers,
    pub user_slot: Blob,
    pub keyball_slot: Blob,
    /// Number of writes to the store
    pub writes: usize,
}

impl Default for FakeHardware {
    fn default() -> Self {
        Self {
            now: 0,
            has_ball: true,
            remote_has_ball: false,
            local: MouseMove::ZERO,
            remote: MotionSlot::new(),
            fetches: 0,
            cpi: None,
            layers: FakeLayers::default(),
            // erased flash
            user_slot: [0xff; 8],
            keyball_slot: [0xff; 8],
            writes: 0,
        }
    }
}

impl Clock for FakeHardware {
    fn now_ms(&self) -> u32 {
        self.now
    }
}

impl MotionSensor for FakeHardware {
    fn init(&mut self) -> bool {
        self.has_ball
    }

    fn read_motion(&mut self) -> MouseMove {
        core::mem::take(&mut self.local)
    }

    fn set_cpi(&mut self, cpi: u16) {
        self.cpi = Some(cpi);
    }
}

impl SplitLink for FakeHardware {
    fn remote_has_ball(&mut self) -> bool {
        self.remote_has_ball
    }

    fn fetch_motion(&mut self) -> MouseMove {
        self.fetches += 1;
        self.remote.take()
    }
}

impl LayerControl for FakeHardware {
    fn set_layer(&mut self, layer: u8, active: bool) {
        self.layers.set_layer(layer, active)
    }

    fn current_layer(&self) -> u8 {
        self.layers.current_layer()
    }
}

impl ConfigStore for FakeHardware {
    fn read(&mut self, slot: Slot) -> Blob {
        match slot {
            Slot::User => self.user_slot,
            Slot::Keyball => self.keyball_slot,
        }
    }

    fn write(&mut self, slot: Slot, blob: &Blob) {
        self.writes += 1;
        match slot {
            Slot::User => self.user_slot = *blob,
            Slot::Keyball => self.keyball_slot = *blob,
        }
    }
}
