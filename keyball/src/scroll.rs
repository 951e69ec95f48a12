//! Turning ball motion into scroll ticks

use crate::error::Error;
use crate::hw::elapsed;

/// Motion needed to emit one scroll tick. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScrollThreshold(i16);

impl ScrollThreshold {
    /// Default threshold of the click layer scroll
    pub const DEFAULT: ScrollThreshold = ScrollThreshold(50);

    /// Create a threshold, zero and negative values are rejected
    pub const fn new(v: i16) -> Result<Self, Error> {
        if v <= 0 {
            Err(Error::InvalidScrollThreshold(v))
        } else {
            Ok(ScrollThreshold(v))
        }
    }

    /// Threshold value
    pub const fn get(self) -> i16 {
        self.0
    }
}

/// Add `value` to `running` and emit one tick for every threshold crossed.
///
/// Ticks are signed like `running`. The remainder stays in `running` and its
/// magnitude is at most `threshold`, so nothing is lost near the i16 bounds.
pub fn quantize(value: i16, running: &mut i16, threshold: ScrollThreshold) -> i32 {
    let t = threshold.get() as i32;
    let r = *running as i32 + value as i32;
    let ticks = if r.abs() > t {
        (r.abs() - 1) / t * r.signum()
    } else {
        0
    };
    *running = (r - ticks * t) as i16;
    ticks
}

/// Axis scrolled by a motion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Vertical scroll wins unless the motion is more than twice as horizontal
pub fn dominant_axis(dx: i16, dy: i16) -> Axis {
    if (dy as i32).abs() * 2 > (dx as i32).abs() {
        Axis::Vertical
    } else {
        Axis::Horizontal
    }
}

/// Remainders of the click layer scroll
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScrollAccumulator {
    /// Horizontal motion not turned into ticks yet
    pub counter_x: i16,
    /// Vertical motion not turned into ticks yet
    pub counter_y: i16,
}

impl ScrollAccumulator {
    /// Drop the remainders
    pub fn reset(&mut self) {
        self.counter_x = 0;
        self.counter_y = 0;
    }

    /// Quantize the dominant axis of a motion, returns `(ticks_x, ticks_y)`.
    /// Only one of them can be non-zero.
    pub fn feed(
        &mut self,
        dx: i16,
        dy: i16,
        threshold_x: ScrollThreshold,
        threshold_y: ScrollThreshold,
    ) -> (i32, i32) {
        match dominant_axis(dx, dy) {
            Axis::Vertical => (0, quantize(dy, &mut self.counter_y, threshold_y)),
            Axis::Horizontal => (quantize(dx, &mut self.counter_x, threshold_x), 0),
        }
    }
}

/// Divide `v` by `div`, keep the remainder in `v`, return the quotient
pub fn divmod(v: &mut i16, div: i16) -> i16 {
    let q = *v / div;
    *v -= q * div;
    q
}

/// Axes filtered by the scroll snap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScrollSnapMode {
    /// No filtering
    Off,
    /// Only horizontal scroll is held back
    Horizontal,
    /// Both axes are held back, each with its own tension
    Both,
}

/// Scroll snap: scroll on an axis is dropped until enough of it has been
/// requested, then flows freely until the ball rests for `reset_ms`.
///
/// Tension keeps accumulating once the threshold is reached, scrolling back
/// the other way far enough engages the dead zone again.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScrollSnap {
    mode: ScrollSnapMode,
    threshold: i16,
    reset_ms: u32,
    tension_h: i16,
    tension_v: i16,
    last: u32,
}

impl ScrollSnap {
    /// Create a new scroll snap filter
    pub fn new(mode: ScrollSnapMode, threshold: i16, reset_ms: u32) -> Self {
        Self {
            mode,
            threshold,
            reset_ms,
            tension_h: 0,
            tension_v: 0,
            last: 0,
        }
    }

    /// Current tensions, `(h, v)`
    pub fn tension(&self) -> (i16, i16) {
        (self.tension_h, self.tension_v)
    }

    /// Filter one tick of scroll, returns the `(h, v)` to report
    pub fn apply(&mut self, mut h: i16, mut v: i16, now: u32) -> (i16, i16) {
        match self.mode {
            ScrollSnapMode::Off => {}
            ScrollSnapMode::Horizontal => {
                if h != 0 || v != 0 {
                    self.last = now;
                } else if elapsed(now, self.last) >= self.reset_ms {
                    self.tension_h = 0;
                }
                Self::hold(&mut self.tension_h, &mut h, self.threshold);
            }
            ScrollSnapMode::Both => {
                if elapsed(now, self.last) >= self.reset_ms {
                    self.tension_h = 0;
                    self.tension_v = 0;
                }
                if h != 0 || v != 0 {
                    self.last = now;
                }
                Self::hold(&mut self.tension_h, &mut h, self.threshold);
                Self::hold(&mut self.tension_v, &mut v, self.threshold);
            }
        }
        (h, v)
    }

    fn hold(tension: &mut i16, value: &mut i16, threshold: i16) {
        let below = tension.unsigned_abs() < threshold.unsigned_abs();
        *tension = tension.saturating_add(*value);
        if below {
            *value = 0;
        }
    }
}
