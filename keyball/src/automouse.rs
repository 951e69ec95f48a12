//! Everything the firmware calls into: key events, pointing ticks and
//! matrix scans, all on one owned context

use crate::click_layer::{ClickLayer, ClickLayerConfig, ClickState, ScrollKeyMode};
use crate::config::{
    KbConfig, KeyballConfig, Slot, UserConfig, AML_TIMEOUT_QU, CLICK_THRESHOLD_STEP,
};
use crate::hw::Hardware;
use crate::keyball::{Keyball, SplitRole};
use crate::keycode::{key_to_char, CustomEvent, Keycode};
use crate::log::*;
use crate::motion::MouseMove;
use crate::report::{BoardModel, MotionMapper, PointerReport};
use crate::status::Status;

/// Trackball pipeline and automatic mouse layer of one keyboard half
pub struct Automouse<H: Hardware, M: MotionMapper = BoardModel> {
    /// Collaborators provided by the firmware
    pub hw: H,
    keyball: Keyball<M>,
    click: ClickLayer,
    /// Settings of the click layer
    user: UserConfig,
    /// Defaults restored by `KbcReset`
    defaults: KbConfig,
    /// Mouse buttons held
    buttons: u8,
    /// Last report handed to the host
    last_report: PointerReport,
}

impl<H: Hardware> Automouse<H> {
    /// Create a new context, using the axis mapping of `cfg.model`
    pub fn new(hw: H, cfg: KeyballConfig, click: ClickLayerConfig, role: SplitRole) -> Self {
        let model = cfg.model;
        Self::with_mapper(hw, model, cfg, click, role)
    }
}

impl<H: Hardware, M: MotionMapper> Automouse<H, M> {
    /// Create a new context with a custom axis mapping
    pub fn with_mapper(
        hw: H,
        mapper: M,
        cfg: KeyballConfig,
        click: ClickLayerConfig,
        role: SplitRole,
    ) -> Self {
        let defaults = KbConfig {
            cpi: cfg.default_cpi,
            scroll_div: cfg.default_scroll_div,
            click_timeout: click.reset_timeout_ms,
        };
        Self {
            hw,
            keyball: Keyball::new(&cfg, mapper, role),
            click: ClickLayer::new(click),
            user: UserConfig::default(),
            defaults,
            buttons: 0,
            last_report: PointerReport::default(),
        }
    }

    /// Probe the sensors and load the saved settings.
    ///
    /// Settings that cannot be read back are replaced by the defaults, which
    /// are written to the store.
    pub fn init(&mut self) {
        let this = self.hw.init();
        let that = self.hw.remote_has_ball();
        self.keyball.set_balls(this, that);

        self.user = match UserConfig::deserialize(&self.hw.read(Slot::User)) {
            Ok(user) => user,
            Err(e) => {
                warn!("User settings unreadable ({:?}), using defaults", e);
                let user = UserConfig::default();
                self.hw.write(Slot::User, &user.serialize());
                user
            }
        };
        let kb = match KbConfig::deserialize(&self.hw.read(Slot::Keyball)) {
            Ok(kb) => kb,
            Err(e) => {
                warn!("Keyball settings unreadable ({:?}), using defaults", e);
                self.hw.write(Slot::Keyball, &self.defaults.serialize());
                self.defaults
            }
        };
        self.apply(&kb);
        self.click.init(&mut self.hw);
        self.push_cpi();
    }

    fn apply(&mut self, kb: &KbConfig) {
        self.keyball.set_cpi(kb.cpi as i16);
        self.keyball
            .set_scroll_div(kb.scroll_div.min(i8::MAX as u8) as i8);
        self.click.set_reset_timeout(kb.click_timeout);
    }

    fn push_cpi(&mut self) {
        if let Some(cpi) = self.keyball.take_cpi_change() {
            self.hw.set_cpi(cpi);
        }
    }

    fn save_user(&mut self) {
        info!("Saving user settings: {:?}", self.user);
        self.hw.write(Slot::User, &self.user.serialize());
    }

    fn current_kb_config(&self) -> KbConfig {
        KbConfig {
            cpi: self.keyball.cpi(),
            scroll_div: self.keyball.scroll_div(),
            click_timeout: self.click.reset_timeout_ms(),
        }
    }

    /// Handle a key event.
    ///
    /// Returns false when the key was consumed and must not reach the keymap.
    pub fn process_key(&mut self, keycode: Keycode, pressed: bool) -> bool {
        let now = self.hw.now_ms();
        debug!("Key {} pressed: {}", Debug2Format(&keycode), pressed);
        match keycode {
            Keycode::Key(kc) => {
                if pressed {
                    self.keyball.pressing_keys_mut().push(key_to_char(kc));
                }
                self.click.on_key(kc, pressed, &mut self.hw, now)
            }
            Keycode::Custom(ev) => {
                self.on_custom(ev, pressed, now);
                false
            }
        }
    }

    fn on_custom(&mut self, ev: CustomEvent, pressed: bool, now: u32) {
        if let Some(bit) = ev.button_bit() {
            if pressed {
                self.buttons |= bit;
            } else {
                self.buttons &= !bit;
            }
            self.click.on_button(pressed, self.buttons, &mut self.hw, now);
            return;
        }
        match ev {
            CustomEvent::Scroll => {
                if self.click.config().scroll_key_mode == ScrollKeyMode::Library {
                    self.keyball.set_scroll_mode(pressed);
                }
                self.click.on_scroll_key(pressed, &mut self.hw, now);
            }
            CustomEvent::ScrollModeMomentary => self.keyball.set_scroll_mode(pressed),
            _ if !pressed => {}
            CustomEvent::ScrollModeToggle => {
                let mode = !self.keyball.scroll_mode();
                self.keyball.set_scroll_mode(mode);
            }
            CustomEvent::ClickThresholdInc => {
                self.user.adjust_click_threshold(CLICK_THRESHOLD_STEP);
                self.save_user();
            }
            CustomEvent::ClickThresholdDec => {
                self.user.adjust_click_threshold(-CLICK_THRESHOLD_STEP);
                self.save_user();
            }
            CustomEvent::ScrollReverseV => {
                self.user.scroll_reverse_v = !self.user.scroll_reverse_v;
                self.save_user();
            }
            CustomEvent::ScrollReverseH => {
                self.user.scroll_reverse_h = !self.user.scroll_reverse_h;
                self.save_user();
            }
            CustomEvent::CpiInc100 => self.keyball.add_cpi(1),
            CustomEvent::CpiDec100 => self.keyball.add_cpi(-1),
            CustomEvent::CpiInc1k => self.keyball.add_cpi(10),
            CustomEvent::CpiDec1k => self.keyball.add_cpi(-10),
            CustomEvent::CpiCycle => self.keyball.cpi_cycle(),
            CustomEvent::ScrollDivInc => self.keyball.add_scroll_div(1),
            CustomEvent::ScrollDivDec => self.keyball.add_scroll_div(-1),
            CustomEvent::ClickTimeoutInc => self.click.adjust_reset_timeout(AML_TIMEOUT_QU as i16),
            CustomEvent::ClickTimeoutDec => {
                self.click.adjust_reset_timeout(-(AML_TIMEOUT_QU as i16))
            }
            CustomEvent::RemoteBallToggle => {
                let enable = !self.keyball.that_enable();
                self.keyball.set_that_enable(enable);
            }
            CustomEvent::KbcSave => {
                let kb = self.current_kb_config();
                info!("Saving keyball settings: {:?}", kb);
                self.hw.write(Slot::Keyball, &kb.serialize());
            }
            CustomEvent::KbcReset => {
                info!("Resetting keyball settings");
                let kb = self.defaults;
                self.apply(&kb);
                self.hw.write(Slot::Keyball, &kb.serialize());
            }
            CustomEvent::MouseLeftClick
            | CustomEvent::MouseRightClick
            | CustomEvent::MouseWheelClick => {}
        }
        self.push_cpi();
    }

    /// Build the report of this tick
    pub fn pointing_task(&mut self) -> PointerReport {
        let now = self.hw.now_ms();
        let local = self.hw.read_motion();
        let remote = if self.keyball.that_enable() {
            self.hw.fetch_motion()
        } else {
            MouseMove::ZERO
        };
        let mut report = PointerReport {
            buttons: self.buttons,
            ..Default::default()
        };
        self.keyball.pointing_task(&mut report, local, remote, now);
        self.click
            .on_motion(&mut report, &self.user, &mut self.hw, now);
        self.push_cpi();
        self.last_report = report;
        report
    }

    /// Timeouts checked on every matrix scan
    pub fn matrix_scan(&mut self) {
        let now = self.hw.now_ms();
        self.click.on_scan(&self.last_report, &mut self.hw, now);
    }

    /// What the status display shows
    pub fn status(&self) -> Status {
        Status {
            cpi: self.keyball.cpi(),
            scroll_div: self.keyball.scroll_div(),
            remote_enabled: self.keyball.that_enable(),
            speed_pct: self
                .keyball
                .speed()
                .saturating_mul_int(100)
                .round_to_zero()
                .to_num::<i32>(),
            keys: self.keyball.pressing_keys().chars(),
            layer: self.hw.current_layer(),
            movement: self.click.movement(),
            click_threshold: self.user.click_threshold,
            inverted: self.click.is_clickable_mode(),
        }
    }

    /// State of the click layer
    pub fn click_state(&self) -> ClickState {
        self.click.state()
    }

    /// Trackball runtime
    pub fn keyball(&self) -> &Keyball<M> {
        &self.keyball
    }

    /// Trackball runtime, to change the speed or clear the key history
    pub fn keyball_mut(&mut self) -> &mut Keyball<M> {
        &mut self.keyball
    }

    /// Settings of the click layer in effect
    pub fn user_config(&self) -> &UserConfig {
        &self.user
    }
}
