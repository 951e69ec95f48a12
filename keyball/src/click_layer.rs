//! Automatic mouse layer.
//!
//! Moving the ball brings up a layer holding the mouse buttons, typing takes
//! it down. The machine goes through the following states:
//!
//! - `Idle`: layer off
//! - `Waiting`: the ball started moving, motion is counted until it reaches
//!   the click threshold
//! - `Clickable`: layer on, dropped after a while without motion
//! - `Clicking`: a button is held, the pointer is locked for a few counts so
//!   that the click lands where it was aimed
//! - `Scrolling`: the scroll key is held, motion turns into wheel ticks

use crate::config::{UserConfig, AML_TIMEOUT_MAX, AML_TIMEOUT_MIN};
use crate::error::Error;
use crate::hw::{elapsed, LayerControl};
use crate::keycode::MODIFIER_KEYS;
use crate::log::*;
use crate::report::{clip2int8, PointerReport};
use crate::scroll::{ScrollAccumulator, ScrollThreshold};
use keyberon::key_code::KeyCode;

/// Layer brought up by the ball
pub const CLICK_LAYER: u8 = 6;
/// Time without motion before the layer goes down, in ms
pub const CLICK_RESET_TIMEOUT_MS: u16 = 800;
/// Time without motion before giving up waiting, in ms
pub const WAITING_TIMEOUT_MS: u16 = 50;
/// Motion swallowed after a button press
pub const CLICK_LOCK: i16 = 30;

/// State of the click layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClickState {
    Idle,
    Waiting,
    Clickable,
    Clicking,
    Scrolling,
}

/// What the scroll key does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScrollKeyMode {
    /// The click layer turns motion into ticks with its own thresholds
    Threshold,
    /// Library scroll mode is on while the key is held
    Library,
}

/// Click layer behavior
#[derive(Debug, Clone)]
pub struct ClickLayerConfig {
    /// Layer to drive
    pub layer: u8,
    /// Keys that never take the layer down
    pub exempt_keys: &'static [KeyCode],
    /// Time without motion before the layer goes down, in ms
    pub reset_timeout_ms: u16,
    /// Time without motion before giving up waiting, in ms
    pub waiting_timeout_ms: u16,
    /// Motion swallowed after a button press, 0 disables the lock
    pub click_lock: i16,
    pub scroll_threshold_h: ScrollThreshold,
    pub scroll_threshold_v: ScrollThreshold,
    /// When set, a scan seeing a report axis above it while waiting brings
    /// the layer up at once
    pub scan_promote_threshold: Option<i16>,
    pub scroll_key_mode: ScrollKeyMode,
    /// Exempt keys keep the layer up a bit longer
    pub exempt_refreshes_timer: bool,
    /// A key pressed while clicking or scrolling re-arms the layer and is
    /// swallowed, instead of taking the layer down
    pub rearm_on_key_while_held: bool,
}

impl Default for ClickLayerConfig {
    fn default() -> Self {
        Self {
            layer: CLICK_LAYER,
            exempt_keys: &MODIFIER_KEYS,
            reset_timeout_ms: CLICK_RESET_TIMEOUT_MS,
            waiting_timeout_ms: WAITING_TIMEOUT_MS,
            click_lock: CLICK_LOCK,
            scroll_threshold_h: ScrollThreshold::DEFAULT,
            scroll_threshold_v: ScrollThreshold::DEFAULT,
            scan_promote_threshold: None,
            scroll_key_mode: ScrollKeyMode::Threshold,
            exempt_refreshes_timer: true,
            rearm_on_key_while_held: false,
        }
    }
}

impl ClickLayerConfig {
    /// Set the scroll thresholds, rejecting non positive ones
    pub fn with_scroll_thresholds(mut self, h: i16, v: i16) -> Result<Self, Error> {
        self.scroll_threshold_h = ScrollThreshold::new(h).inspect_err(|_| {
            error!("Invalid horizontal scroll threshold: {}", h);
        })?;
        self.scroll_threshold_v = ScrollThreshold::new(v).inspect_err(|_| {
            error!("Invalid vertical scroll threshold: {}", v);
        })?;
        Ok(self)
    }
}

/// Automatic mouse layer state machine
pub struct ClickLayer {
    /// Configuration
    cfg: ClickLayerConfig,
    /// Current state
    state: ClickState,
    /// Start of the current timeout
    timer: u32,
    /// Motion counted while waiting
    movement: i16,
    /// Motion left to swallow while clicking
    lock: i16,
    /// Clicking was entered because the report had buttons
    clicking_from_report: bool,
    /// Scroll remainders
    scroll: ScrollAccumulator,
    /// Time without motion before the layer goes down, adjustable
    reset_timeout_ms: u16,
}

impl ClickLayer {
    /// Create a new click layer, idle
    pub fn new(cfg: ClickLayerConfig) -> Self {
        let reset_timeout_ms = cfg.reset_timeout_ms;
        Self {
            cfg,
            state: ClickState::Idle,
            timer: 0,
            movement: 0,
            lock: 0,
            clicking_from_report: false,
            scroll: ScrollAccumulator::default(),
            reset_timeout_ms,
        }
    }

    /// Back to idle with the layer off
    pub fn init(&mut self, layers: &mut impl LayerControl) {
        self.disable(layers);
    }

    /// Current state
    pub fn state(&self) -> ClickState {
        self.state
    }

    /// Whether the layer is up
    pub fn is_clickable_mode(&self) -> bool {
        matches!(
            self.state,
            ClickState::Clickable | ClickState::Clicking | ClickState::Scrolling
        )
    }

    /// Motion counted while waiting
    pub fn movement(&self) -> i16 {
        self.movement
    }

    /// Configuration
    pub fn config(&self) -> &ClickLayerConfig {
        &self.cfg
    }

    /// Scroll remainders
    pub fn scroll_remainders(&self) -> &ScrollAccumulator {
        &self.scroll
    }

    /// Time without motion before the layer goes down, in ms
    pub fn reset_timeout_ms(&self) -> u16 {
        self.reset_timeout_ms
    }

    /// Set the layer timeout, clamped to `[AML_TIMEOUT_MIN, AML_TIMEOUT_MAX]`
    pub fn set_reset_timeout(&mut self, ms: u16) {
        let clamped = ms.clamp(AML_TIMEOUT_MIN, AML_TIMEOUT_MAX);
        if clamped != ms {
            warn!("Click layer timeout {} clamped to {}", ms, clamped);
        }
        self.reset_timeout_ms = clamped;
    }

    /// Move the layer timeout by `delta` ms
    pub fn adjust_reset_timeout(&mut self, delta: i16) {
        let ms = (self.reset_timeout_ms as i32 + delta as i32)
            .clamp(AML_TIMEOUT_MIN as i32, AML_TIMEOUT_MAX as i32);
        self.reset_timeout_ms = ms as u16;
        info!("Click layer timeout: {} ms", self.reset_timeout_ms);
    }

    fn set_state(&mut self, state: ClickState) {
        if self.state != state {
            info!("Click layer: {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Bring the layer up and (re)start its timeout
    fn enable(&mut self, layers: &mut impl LayerControl, now: u32) {
        layers.set_layer(self.cfg.layer, true);
        self.timer = now;
        self.clicking_from_report = false;
        self.set_state(ClickState::Clickable);
    }

    /// Take the layer down
    fn disable(&mut self, layers: &mut impl LayerControl) {
        self.set_state(ClickState::Idle);
        layers.set_layer(self.cfg.layer, false);
        self.movement = 0;
        self.clicking_from_report = false;
        self.scroll.reset();
    }

    fn start_clicking(&mut self, layers: &mut impl LayerControl, now: u32) {
        layers.set_layer(self.cfg.layer, true);
        self.timer = now;
        self.lock = self.cfg.click_lock;
        self.set_state(ClickState::Clicking);
    }

    fn start_waiting(&mut self, now: u32) {
        self.timer = now;
        self.movement = 0;
        self.set_state(ClickState::Waiting);
    }

    /// A regular key changed state.
    ///
    /// Returns whether the key goes on to the keymap.
    pub fn on_key(
        &mut self,
        kc: KeyCode,
        pressed: bool,
        layers: &mut impl LayerControl,
        now: u32,
    ) -> bool {
        if !pressed {
            return true;
        }
        if self.cfg.rearm_on_key_while_held
            && matches!(self.state, ClickState::Clicking | ClickState::Scrolling)
        {
            self.enable(layers, now);
            return false;
        }
        if self.cfg.exempt_keys.contains(&kc) {
            if self.cfg.exempt_refreshes_timer && self.state != ClickState::Idle {
                self.timer = now;
            }
            return true;
        }
        match self.state {
            ClickState::Idle => self.start_waiting(now),
            _ => self.disable(layers),
        }
        true
    }

    /// A mouse button key changed state, `held` being the buttons still down
    /// after it.
    ///
    /// The layer stays in Clicking, with its lock budget untouched, until the
    /// last button is released.
    pub fn on_button(
        &mut self,
        pressed: bool,
        held: u8,
        layers: &mut impl LayerControl,
        now: u32,
    ) {
        let clicking = self.state == ClickState::Clicking;
        if pressed {
            if clicking {
                self.timer = now;
            } else {
                self.start_clicking(layers, now);
            }
        } else if !clicking || held == 0 {
            self.enable(layers, now);
        }
    }

    /// The scroll key changed state
    pub fn on_scroll_key(&mut self, pressed: bool, layers: &mut impl LayerControl, now: u32) {
        if pressed {
            layers.set_layer(self.cfg.layer, true);
            self.set_state(ClickState::Scrolling);
        } else {
            self.enable(layers, now);
        }
    }

    /// Post-process the report of this tick
    pub fn on_motion(
        &mut self,
        report: &mut PointerReport,
        user: &UserConfig,
        layers: &mut impl LayerControl,
        now: u32,
    ) {
        if report.buttons != 0 && self.state == ClickState::Clickable {
            self.start_clicking(layers, now);
            self.clicking_from_report = true;
        } else if report.buttons == 0
            && self.state == ClickState::Clicking
            && self.clicking_from_report
        {
            self.enable(layers, now);
        }

        let x = report.x as i16;
        let y = report.y as i16;
        if x != 0 || y != 0 {
            match self.state {
                ClickState::Clickable => self.timer = now,
                ClickState::Clicking => {
                    self.lock = self.lock.saturating_sub(x.abs() + y.abs());
                    if self.lock > 0 {
                        report.x = 0;
                        report.y = 0;
                    }
                }
                ClickState::Scrolling => {
                    if self.cfg.scroll_key_mode == ScrollKeyMode::Threshold {
                        let (tx, ty) = self.scroll.feed(
                            x,
                            y,
                            self.cfg.scroll_threshold_h,
                            self.cfg.scroll_threshold_v,
                        );
                        let h = if user.scroll_reverse_h { tx } else { -tx };
                        let v = if user.scroll_reverse_v { -ty } else { ty };
                        report.pan = clip2int8(h);
                        report.wheel = clip2int8(v);
                        report.x = 0;
                        report.y = 0;
                    }
                }
                ClickState::Waiting => {
                    self.movement = self.movement.saturating_add(x.abs() + y.abs());
                    if self.movement >= user.click_threshold {
                        self.movement = 0;
                        self.enable(layers, now);
                    }
                }
                ClickState::Idle => self.start_waiting(now),
            }
        } else {
            match self.state {
                ClickState::Clicking | ClickState::Scrolling => {}
                ClickState::Clickable => {
                    if elapsed(now, self.timer) > self.reset_timeout_ms as u32 {
                        self.disable(layers);
                    }
                }
                ClickState::Waiting => {
                    if elapsed(now, self.timer) > self.cfg.waiting_timeout_ms as u32 {
                        self.movement = 0;
                        self.set_state(ClickState::Idle);
                    }
                }
                ClickState::Idle => self.movement = 0,
            }
        }
    }

    /// Checks run on every matrix scan, with the last report sent
    pub fn on_scan(&mut self, last: &PointerReport, layers: &mut impl LayerControl, now: u32) {
        match self.state {
            ClickState::Waiting => {
                if let Some(t) = self.cfg.scan_promote_threshold {
                    if (last.x as i16).abs() > t || (last.y as i16).abs() > t {
                        self.movement = 0;
                        self.enable(layers, now);
                    }
                }
            }
            ClickState::Clickable => {
                if elapsed(now, self.timer) > self.reset_timeout_ms as u32 {
                    self.disable(layers);
                }
            }
            _ => {}
        }
    }
}
