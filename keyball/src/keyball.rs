//! Trackball runtime: sensor settings and the motion to report pipeline

use crate::config::{KeyballConfig, CPI_MAX, CPI_UNIT, SCROLL_DIV_MAX};
use crate::log::*;
use crate::motion::{fuse, FusedMotion, MouseMove};
use crate::report::{MotionMapper, PointerReport};
use crate::scroll::{divmod, ScrollSnap};
use arraydeque::{behavior::Wrapping, ArrayDeque};
use fixed::types::I16F16;

/// Number of keys kept in the pressed key history
pub const PRESSED_KEYS_LEN: usize = 6;
/// Shown for history slots not filled yet
pub const BLANK: char = '_';

/// Which half this firmware runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SplitRole {
    /// Left half
    pub is_left: bool,
    /// Half connected to the host
    pub is_master: bool,
}

/// Last pressed keys, as characters, oldest first
#[derive(Debug)]
pub struct PressedKeys {
    keys: ArrayDeque<char, PRESSED_KEYS_LEN, Wrapping>,
}

impl Default for PressedKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl PressedKeys {
    /// Empty history
    pub fn new() -> Self {
        Self {
            keys: ArrayDeque::new(),
        }
    }

    /// Record a key, dropping the oldest one when full
    pub fn push(&mut self, c: char) {
        self.keys.push_back(c);
    }

    /// Forget every key
    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// History padded with `BLANK`
    pub fn chars(&self) -> [char; PRESSED_KEYS_LEN] {
        let mut out = [BLANK; PRESSED_KEYS_LEN];
        for (o, c) in out.iter_mut().zip(self.keys.iter()) {
            *o = *c;
        }
        out
    }
}

/// Trackball state of the keyboard
pub struct Keyball<M: MotionMapper> {
    /// Axis mapping of the board
    mapper: M,
    role: SplitRole,
    /// A sensor answered on this half
    this_have_ball: bool,
    /// The other half reported a sensor
    that_have_ball: bool,
    /// Motion of the other half is used
    that_enable: bool,
    /// Motion of this half not consumed yet
    this_motion: MouseMove,
    /// CPI in units of 100
    cpi: u8,
    /// CPI changed since the sensor was last updated
    cpi_changed: bool,
    /// Motion scrolls instead of moving the pointer
    scroll_mode: bool,
    /// Scroll divisor is `1 << scroll_div_exp`
    scroll_div_exp: u8,
    speed: I16F16,
    snap: ScrollSnap,
    pressing_keys: PressedKeys,
}

impl<M: MotionMapper> Keyball<M> {
    /// Create the runtime, no ball found yet
    pub fn new(cfg: &KeyballConfig, mapper: M, role: SplitRole) -> Self {
        let mut kb = Self {
            mapper,
            role,
            this_have_ball: false,
            that_have_ball: false,
            that_enable: false,
            this_motion: MouseMove::ZERO,
            cpi: 0,
            cpi_changed: false,
            scroll_mode: false,
            scroll_div_exp: 0,
            speed: cfg.speed,
            snap: ScrollSnap::new(
                cfg.scroll_snap_mode,
                cfg.scroll_snap_threshold,
                cfg.scroll_snap_reset_ms,
            ),
            pressing_keys: PressedKeys::new(),
        };
        kb.set_cpi(cfg.default_cpi as i16);
        kb.set_scroll_div(cfg.default_scroll_div as i8);
        kb
    }

    /// Record which halves have a trackball. The other half's ball is used
    /// as soon as it is found.
    pub fn set_balls(&mut self, this: bool, that: bool) {
        info!("Trackball: this half {}, other half {}", this, that);
        self.this_have_ball = this;
        self.that_have_ball = that;
        self.that_enable = that;
    }

    /// A sensor answered on this half
    pub fn this_have_ball(&self) -> bool {
        self.this_have_ball
    }

    /// The other half reported a sensor
    pub fn that_have_ball(&self) -> bool {
        self.that_have_ball
    }

    /// Whether motion of the other half is fetched
    pub fn that_enable(&self) -> bool {
        self.that_have_ball && self.that_enable
    }

    /// Use, or ignore, the motion of the other half
    pub fn set_that_enable(&mut self, enable: bool) {
        info!("Other half trackball: {}", enable);
        self.that_enable = enable;
    }

    /// Side and role of this half
    pub fn role(&self) -> SplitRole {
        self.role
    }

    /// CPI, in units of 100
    pub fn cpi(&self) -> u8 {
        self.cpi
    }

    /// Set the CPI, in units of 100, clamped to `[1, CPI_MAX)`
    pub fn set_cpi(&mut self, cpi: i16) {
        let clamped = cpi.clamp(1, CPI_MAX as i16 - 1);
        if clamped != cpi {
            warn!("CPI {} clamped to {}", cpi, clamped);
        }
        self.cpi = clamped as u8;
        self.cpi_changed = true;
    }

    /// Move the CPI by `delta` units of 100, never below 1
    pub fn add_cpi(&mut self, delta: i16) {
        let v = (self.cpi as i16).saturating_add(delta).max(1);
        self.set_cpi(v);
        info!("CPI: {}", self.cpi as u16 * CPI_UNIT);
    }

    /// Step the CPI up by one unit, sticking to the highest one
    pub fn cpi_cycle(&mut self) {
        self.set_cpi((self.cpi % CPI_MAX) as i16 + 1);
        info!("CPI: {}", self.cpi as u16 * CPI_UNIT);
    }

    /// CPI to push to the sensor, in counts per inch, if it changed
    pub fn take_cpi_change(&mut self) -> Option<u16> {
        if self.cpi_changed {
            self.cpi_changed = false;
            Some(self.cpi as u16 * CPI_UNIT)
        } else {
            None
        }
    }

    /// Motion scrolls instead of moving the pointer
    pub fn scroll_mode(&self) -> bool {
        self.scroll_mode
    }

    /// Switch library scroll mode on or off
    pub fn set_scroll_mode(&mut self, scroll_mode: bool) {
        if self.scroll_mode != scroll_mode {
            info!("Scroll mode: {}", scroll_mode);
        }
        self.scroll_mode = scroll_mode;
    }

    /// Scroll divisor setting, 1-based
    pub fn scroll_div(&self) -> u8 {
        self.scroll_div_exp + 1
    }

    /// Set the 1-based scroll divisor setting, the exponent is clamped to
    /// `[0, SCROLL_DIV_MAX)`
    pub fn set_scroll_div(&mut self, div: i8) {
        let exp = (div as i16 - 1).clamp(0, SCROLL_DIV_MAX as i16 - 1);
        if exp != div as i16 - 1 {
            warn!("Scroll divisor {} clamped to {}", div, exp + 1);
        }
        self.scroll_div_exp = exp as u8;
    }

    /// Move the scroll divisor setting, never below 1
    pub fn add_scroll_div(&mut self, delta: i8) {
        let v = (self.scroll_div() as i8).saturating_add(delta).max(1);
        self.set_scroll_div(v);
        info!("Scroll divisor: {}", self.scroll_div());
    }

    /// Motion needed for one scroll step
    pub fn divisor(&self) -> i16 {
        1 << self.scroll_div_exp
    }

    /// Speed multiplier
    pub fn speed(&self) -> I16F16 {
        self.speed
    }

    /// Set the speed multiplier applied to move and scroll output
    pub fn set_speed(&mut self, speed: I16F16) {
        self.speed = speed;
    }

    /// Scroll snap filter
    pub fn scroll_snap(&self) -> &ScrollSnap {
        &self.snap
    }

    /// Last pressed keys
    pub fn pressing_keys(&self) -> &PressedKeys {
        &self.pressing_keys
    }

    /// Last pressed keys, to record or clear them
    pub fn pressing_keys_mut(&mut self) -> &mut PressedKeys {
        &mut self.pressing_keys
    }

    /// Turn this tick's motion into pointer movement or scroll.
    ///
    /// `remote` must be zero when the other half is not used. The motion is
    /// consumed every tick: what the scroll divisor leaves over is dropped.
    pub fn pointing_task(
        &mut self,
        report: &mut PointerReport,
        local: MouseMove,
        remote: MouseMove,
        now: u32,
    ) {
        if !self.this_have_ball && !self.that_have_ball {
            return;
        }
        self.this_motion = self.this_motion.saturating_add(&local);
        let remote = if self.that_enable() {
            remote
        } else {
            MouseMove::ZERO
        };
        let mut m = fuse(self.this_motion, remote, self.role.is_master);
        self.this_motion = MouseMove::ZERO;

        if self.scroll_mode {
            let div = self.divisor();
            let sx = divmod(&mut m.x, div);
            let sy = divmod(&mut m.y, div);
            let (h, v) =
                self.mapper
                    .map_scroll(FusedMotion { x: sx, y: sy }, self.speed, self.role.is_left);
            let (h, v) = self.snap.apply(h as i16, v as i16, now);
            report.x = 0;
            report.y = 0;
            report.pan = h as i8;
            report.wheel = v as i8;
        } else {
            let (x, y) = self.mapper.map_move(m, self.speed, self.role.is_left);
            report.x = x;
            report.y = y;
            report.pan = 0;
            report.wheel = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CPI_DEFAULT, SCROLL_DIV_DEFAULT};
    use crate::report::BoardModel;
    use crate::scroll::ScrollSnapMode;

    const RIGHT_MASTER: SplitRole = SplitRole {
        is_left: false,
        is_master: true,
    };

    fn keyball(model: BoardModel, snap: ScrollSnapMode) -> Keyball<BoardModel> {
        let cfg = KeyballConfig {
            model,
            scroll_snap_mode: snap,
            ..Default::default()
        };
        let mut kb = Keyball::new(&cfg, model, RIGHT_MASTER);
        kb.set_balls(true, false);
        kb
    }

    #[test]
    fn test_defaults() {
        let mut kb = keyball(BoardModel::Keyball44, ScrollSnapMode::Off);
        assert_eq!(kb.cpi(), CPI_DEFAULT);
        assert_eq!(kb.take_cpi_change(), Some(1100));
        assert_eq!(kb.take_cpi_change(), None);
        assert_eq!(kb.scroll_div(), SCROLL_DIV_DEFAULT);
        assert_eq!(kb.divisor(), 8);
        assert!(!kb.scroll_mode());
    }

    #[test]
    fn test_cpi_clamps() {
        crate::log::init_test_logger();
        let mut kb = keyball(BoardModel::Keyball44, ScrollSnapMode::Off);
        kb.set_cpi(0);
        assert_eq!(kb.cpi(), 1);
        kb.set_cpi(CPI_MAX as i16 + 100);
        assert_eq!(kb.cpi(), CPI_MAX - 1);
        kb.set_cpi(-5);
        assert_eq!(kb.cpi(), 1);
        kb.set_cpi(CPI_MAX as i16);
        assert_eq!(kb.cpi(), CPI_MAX - 1);
        assert_eq!(kb.take_cpi_change(), Some(11900));
    }

    #[test]
    fn test_cpi_keys() {
        crate::log::init_test_logger();
        let mut kb = keyball(BoardModel::Keyball44, ScrollSnapMode::Off);
        kb.add_cpi(1);
        assert_eq!(kb.cpi(), 12);
        kb.add_cpi(-10);
        assert_eq!(kb.cpi(), 2);
        kb.add_cpi(-10);
        assert_eq!(kb.cpi(), 1);
        kb.add_cpi(200);
        assert_eq!(kb.cpi(), CPI_MAX - 1);
        kb.cpi_cycle();
        assert_eq!(kb.cpi(), CPI_MAX - 1);
        kb.set_cpi(CPI_MAX as i16 - 2);
        kb.cpi_cycle();
        assert_eq!(kb.cpi(), CPI_MAX - 1);
        kb.set_cpi(5);
        kb.cpi_cycle();
        assert_eq!(kb.cpi(), 6);
    }

    #[test]
    fn test_scroll_div_clamps() {
        crate::log::init_test_logger();
        let mut kb = keyball(BoardModel::Keyball44, ScrollSnapMode::Off);
        kb.set_scroll_div(0);
        assert_eq!(kb.scroll_div(), 1);
        assert_eq!(kb.divisor(), 1);
        kb.set_scroll_div(100);
        assert_eq!(kb.scroll_div(), SCROLL_DIV_MAX);
        assert_eq!(kb.divisor(), 64);
        kb.add_scroll_div(1);
        assert_eq!(kb.scroll_div(), SCROLL_DIV_MAX);
        for _ in 0..10 {
            kb.add_scroll_div(-1);
        }
        assert_eq!(kb.scroll_div(), 1);
    }

    #[test]
    fn test_move() {
        let mut kb = keyball(BoardModel::Keyball44, ScrollSnapMode::Off);
        let mut r = PointerReport {
            buttons: 1,
            wheel: 4,
            ..Default::default()
        };
        kb.pointing_task(&mut r, MouseMove::new(3, -2), MouseMove::ZERO, 0);
        assert_eq!(
            r,
            PointerReport {
                buttons: 1,
                x: -2,
                y: 3,
                wheel: 0,
                pan: 0
            }
        );
        // motion is consumed
        let mut r = PointerReport::default();
        kb.pointing_task(&mut r, MouseMove::ZERO, MouseMove::ZERO, 1);
        assert_eq!(r, PointerReport::default());
    }

    #[test]
    fn test_remote_motion() {
        crate::log::init_test_logger();
        let mut kb = keyball(BoardModel::Keyball46, ScrollSnapMode::Off);
        kb.set_balls(true, true);
        let mut r = PointerReport::default();
        // the master flips the motion of the other half
        kb.pointing_task(&mut r, MouseMove::new(10, 10), MouseMove::new(4, 1), 0);
        assert_eq!((r.x, r.y), (6, -9));
        kb.set_that_enable(false);
        kb.pointing_task(&mut r, MouseMove::new(10, 10), MouseMove::new(4, 1), 1);
        assert_eq!((r.x, r.y), (10, -10));
    }

    #[test]
    fn test_no_ball_leaves_report() {
        let cfg = KeyballConfig::default();
        let mut kb = Keyball::new(&cfg, BoardModel::Keyball44, RIGHT_MASTER);
        let mut r = PointerReport {
            x: 5,
            ..Default::default()
        };
        kb.pointing_task(&mut r, MouseMove::new(3, 3), MouseMove::ZERO, 0);
        assert_eq!(r.x, 5);
    }

    #[test]
    fn test_scroll_drops_remainder() {
        let mut kb = keyball(BoardModel::Keyball46, ScrollSnapMode::Off);
        kb.set_scroll_mode(true);
        // divisor 8
        let mut r = PointerReport::default();
        kb.pointing_task(&mut r, MouseMove::new(5, -20), MouseMove::ZERO, 0);
        assert_eq!((r.x, r.y, r.pan, r.wheel), (0, 0, 0, -2));
        kb.pointing_task(&mut r, MouseMove::new(5, -4), MouseMove::ZERO, 1);
        assert_eq!((r.pan, r.wheel), (0, 0));
        kb.pointing_task(&mut r, MouseMove::ZERO, MouseMove::ZERO, 2);
        assert_eq!((r.pan, r.wheel), (0, 0));
        // leaving scroll mode with the ball at rest does not move the pointer
        kb.pointing_task(&mut r, MouseMove::new(7, 13), MouseMove::ZERO, 3);
        kb.set_scroll_mode(false);
        kb.pointing_task(&mut r, MouseMove::ZERO, MouseMove::ZERO, 4);
        assert_eq!((r.x, r.y, r.pan, r.wheel), (0, 0, 0, 0));
    }

    #[test]
    fn test_scroll_snap_horizontal() {
        let mut kb = keyball(BoardModel::Keyball46, ScrollSnapMode::Horizontal);
        kb.set_scroll_div(1);
        kb.set_scroll_mode(true);
        let mut r = PointerReport::default();
        kb.pointing_task(&mut r, MouseMove::new(5, 5), MouseMove::ZERO, 0);
        assert_eq!((r.pan, r.wheel), (0, 5));
        kb.pointing_task(&mut r, MouseMove::new(5, 5), MouseMove::ZERO, 10);
        assert_eq!((r.pan, r.wheel), (0, 5));
        kb.pointing_task(&mut r, MouseMove::new(5, 5), MouseMove::ZERO, 20);
        assert_eq!((r.pan, r.wheel), (0, 5));
        kb.pointing_task(&mut r, MouseMove::new(5, 5), MouseMove::ZERO, 30);
        assert_eq!((r.pan, r.wheel), (5, 5));
        assert_eq!(kb.scroll_snap().tension(), (20, 0));
    }

    #[test]
    fn test_speed() {
        let mut kb = keyball(BoardModel::Keyball46, ScrollSnapMode::Off);
        kb.set_speed(I16F16::from_num(2));
        let mut r = PointerReport::default();
        kb.pointing_task(&mut r, MouseMove::new(30, -100), MouseMove::ZERO, 0);
        assert_eq!((r.x, r.y), (60, 127));
    }

    #[test]
    fn test_pressed_keys() {
        let mut p = PressedKeys::default();
        assert_eq!(p.chars(), ['_'; 6]);
        p.push('a');
        p.push('b');
        assert_eq!(p.chars(), ['a', 'b', '_', '_', '_', '_']);
        for c in "cdefg".chars() {
            p.push(c);
        }
        assert_eq!(p.chars(), ['b', 'c', 'd', 'e', 'f', 'g']);
        p.clear();
        assert_eq!(p.chars(), ['_'; 6]);
    }
}
