//! `Macropad`: owns the collaborators and every piece of per-pad state, and
//! runs one scan cycle at a time.
//!
//! Scan order: switch → modifier hold → LED animation → slider.

use std::sync::Arc;
use std::time::Duration;

use eyre::WrapErr;
use macropad_traits::clock::{Clock, MonotonicClock};
use macropad_traits::{AnalogInput, Chord, DigitalInput, Key, KeyHost, LedOutput, NoteOutput};

use crate::channel::ControlChannel;
use crate::config::{AnimationCfg, ChannelCfg, NoteCfg, SliderMode};
use crate::error::{BuildError, Result};
use crate::hold::{DEFAULT_HOLD_TIMEOUT, ModifierHold, TabDirection};
use crate::hw_error::to_report;
use crate::keymap::{Action, KeySteps, Profile, SliderChords};
use crate::led::{Animation, AnimationKind, LayerIndicator, LedBank, LedFrame};
use crate::notes::NotePad;
use crate::os_switch::{OsMode, OsSwitch, SwitchEvent, SwitchRole};
use crate::status::{Direction, SampleOutcome};

/// Whether a key event was consumed or should go to the host keymap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    PassThrough,
}

/// What happened during one `scan`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub switch: Option<SwitchEvent>,
    pub gui_released: bool,
    pub leds: Option<LedFrame>,
    pub slider: Option<SampleOutcome>,
    pub base_note: Option<u8>,
}

/// Running totals since the pad was built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PadStats {
    pub scans: u64,
    pub steps_up: u64,
    pub steps_down: u64,
    pub resets: u64,
}

pub struct Macropad<A, S, L, H>
where
    A: AnalogInput,
    S: DigitalInput,
    L: LedOutput,
    H: KeyHost + NoteOutput,
{
    slider: A,
    switch_pin: S,
    leds: LedBank<L>,
    host: H,
    clock: Arc<dyn Clock + Send + Sync>,
    profile: Profile,
    slider_mode: SliderMode,
    channel: Option<ControlChannel>,
    chords: SliderChords,
    notes: Option<NotePad>,
    note_gate: bool,
    switch: OsSwitch,
    hold: ModifierHold,
    indicator: LayerIndicator,
    animation: Option<Animation>,
    anim_cfg: AnimationCfg,
    sleep_pending: bool,
    layer: u8,
    stats: PadStats,
}

impl<A, S, L, H> core::fmt::Debug for Macropad<A, S, L, H>
where
    A: AnalogInput,
    S: DigitalInput,
    L: LedOutput,
    H: KeyHost + NoteOutput,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Macropad")
            .field("profile", &self.profile)
            .field("slider_mode", &self.slider_mode)
            .field("layer", &self.layer)
            .field("os", &self.switch.os())
            .field("channel", &self.channel)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<A, S, L, H> Macropad<A, S, L, H>
where
    A: AnalogInput,
    S: DigitalInput,
    L: LedOutput,
    H: KeyHost + NoteOutput,
{
    /// Start building a pad.
    pub fn builder() -> MacropadBuilder<A, S, L, H> {
        MacropadBuilder::default()
    }

    /// Run one scan cycle.
    pub fn scan(&mut self) -> Result<ScanReport> {
        let mut report = ScanReport::default();
        self.stats.scans += 1;

        // Switch
        if self.switch.role() != SwitchRole::Unused {
            let high = self
                .switch_pin
                .is_high()
                .map_err(|e| to_report(&*e))
                .wrap_err("reading switch")?;
            if let Some(ev) = self.switch.poll(high) {
                self.handle_switch(ev)?;
                report.switch = Some(ev);
            }
        }

        // GUI hold
        let now = self.clock.now();
        report.gui_released = self.hold.poll(&mut self.host, now)?;

        // LEDs
        report.leds = self.advance_leds()?;

        // Slider
        match self.slider_mode {
            SliderMode::Volume | SliderMode::Zoom => {
                if let Some(ch) = self.channel.as_mut() {
                    let raw = self
                        .slider
                        .read_analog()
                        .map_err(|e| to_report(&*e))
                        .wrap_err("reading slider")?;
                    let mut out = KeySteps::new(&mut self.host, self.chords);
                    let outcome = ch.on_sample(raw, &mut out)?;
                    match outcome {
                        SampleOutcome::Reset { steps } => {
                            self.stats.resets += 1;
                            self.stats.steps_down += u64::from(steps);
                        }
                        SampleOutcome::Stepped {
                            direction: Direction::Up,
                            steps,
                            ..
                        } => self.stats.steps_up += u64::from(steps),
                        SampleOutcome::Stepped {
                            direction: Direction::Down,
                            steps,
                            ..
                        } => self.stats.steps_down += u64::from(steps),
                        SampleOutcome::NotReady | SampleOutcome::Deadband { .. } => {}
                    }
                    report.slider = Some(outcome);
                }
            }
            SliderMode::Notes => {
                if self.note_gate
                    && let Some(notes) = self.notes.as_mut()
                {
                    let raw = self
                        .slider
                        .read_analog()
                        .map_err(|e| to_report(&*e))
                        .wrap_err("reading slider")?;
                    report.base_note = notes.update(raw);
                }
            }
            SliderMode::Off => {}
        }

        Ok(report)
    }

    /// Handle a key press or release for the action the host resolved.
    pub fn key_event(&mut self, slot: usize, action: Action, pressed: bool) -> Result<KeyOutcome> {
        let os = self.switch.os();
        match action {
            Action::WorkspaceLeft
            | Action::WorkspaceRight
            | Action::MoveWindowLeft
            | Action::MoveWindowRight => {
                if pressed && let Some(chord) = action.shortcut(os) {
                    self.host
                        .tap(chord)
                        .map_err(|e| to_report(&*e))
                        .wrap_err_with(|| format!("tapping {chord}"))?;
                }
                Ok(KeyOutcome::Handled)
            }
            Action::WindowNext | Action::WindowPrev => {
                if pressed {
                    let dir = if action == Action::WindowNext {
                        TabDirection::Forward
                    } else {
                        TabDirection::Backward
                    };
                    let now = self.clock.now();
                    self.hold.tap(dir, &mut self.host, now)?;
                }
                Ok(KeyOutcome::Handled)
            }
            Action::Sleep => {
                if pressed {
                    tracing::info!("sleep requested");
                    self.animation = Some(Animation::sleep(
                        Duration::from_millis(self.anim_cfg.sleep_period_ms),
                        self.anim_cfg.sleep_cycles,
                    ));
                    self.sleep_pending = true;
                }
                Ok(KeyOutcome::Handled)
            }
            Action::Note(chord) => {
                let Some(notes) = self.notes.as_mut() else {
                    return Ok(KeyOutcome::PassThrough);
                };
                if !self.note_gate {
                    return Ok(KeyOutcome::PassThrough);
                }
                if pressed {
                    notes.press(slot, chord, &mut self.host)?;
                } else {
                    notes.release(slot, &mut self.host)?;
                }
                Ok(KeyOutcome::Handled)
            }
            Action::Key(_) | Action::Layer(_) | Action::Transparent => Ok(KeyOutcome::PassThrough),
        }
    }

    /// The host reports a new highest active layer.
    pub fn layer_changed(&mut self, layer: u8) -> Result<()> {
        self.layer = layer;
        if self.animation.is_none() {
            self.leds.show(self.indicator.frame(layer))?;
        }
        Ok(())
    }

    /// Nothing time-driven is still pending: the channel is ready (or
    /// absent), no animation runs and GUI is not held.
    pub fn is_idle(&self) -> bool {
        self.channel.as_ref().is_none_or(ControlChannel::is_ready)
            && self.animation.is_none()
            && !self.hold.is_held()
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn slider_mode(&self) -> SliderMode {
        self.slider_mode
    }

    pub fn layer(&self) -> u8 {
        self.layer
    }

    pub fn os(&self) -> OsMode {
        self.switch.os()
    }

    pub fn stats(&self) -> PadStats {
        self.stats
    }

    pub fn channel(&self) -> Option<&ControlChannel> {
        self.channel.as_ref()
    }

    pub fn notes(&self) -> Option<&NotePad> {
        self.notes.as_ref()
    }

    pub fn slider(&self) -> &A {
        &self.slider
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn leds(&self) -> &L {
        self.leds.leds()
    }

    pub fn shown_frame(&self) -> Option<LedFrame> {
        self.leds.shown()
    }

    fn handle_switch(&mut self, ev: SwitchEvent) -> Result<()> {
        match ev {
            SwitchEvent::OsChanged(os) => self.move_to_layer(os.base_layer()),
            SwitchEvent::ToggleLayer(layer) => self.move_to_layer(layer),
            SwitchEvent::Gate(open) => {
                self.note_gate = open;
                if !open && let Some(notes) = self.notes.as_mut() {
                    notes.release_all(&mut self.host)?;
                }
                Ok(())
            }
        }
    }

    fn move_to_layer(&mut self, layer: u8) -> Result<()> {
        self.host
            .move_to_layer(layer)
            .map_err(|e| to_report(&*e))
            .wrap_err_with(|| format!("moving to layer {layer}"))?;
        self.layer_changed(layer)
    }

    fn advance_leds(&mut self) -> Result<Option<LedFrame>> {
        let Some(anim) = self.animation.as_mut() else {
            let frame = self.indicator.frame(self.layer);
            return Ok(self.leds.show(frame)?.then_some(frame));
        };
        let now = self.clock.now();
        let mut shown = None;
        if let Some(frame) = anim.tick(now) {
            self.leds.show(frame)?;
            shown = Some(frame);
        }
        if anim.is_finished() {
            let kind = anim.kind();
            self.animation = None;
            tracing::debug!(?kind, "animation done");
            if kind == AnimationKind::Sleep && self.sleep_pending {
                self.sleep_pending = false;
                self.host
                    .tap(Chord::plain(Key::SystemSleep))
                    .map_err(|e| to_report(&*e))
                    .wrap_err("tapping system sleep")?;
            }
            let frame = self.indicator.frame(self.layer);
            if self.leds.show(frame)? {
                shown = Some(frame);
            }
        }
        Ok(shown)
    }
}

/// Builder for `Macropad`. Collaborators are required; everything else
/// falls back to the profile's defaults.
pub struct MacropadBuilder<A, S, L, H> {
    slider: Option<A>,
    switch_pin: Option<S>,
    leds: Option<L>,
    host: Option<H>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    profile: Profile,
    slider_mode: Option<SliderMode>,
    switch_role: Option<SwitchRole>,
    active_low: bool,
    channel: Option<ChannelCfg>,
    notes: NoteCfg,
    animation: AnimationCfg,
    startup_animation: bool,
    hold_timeout: Duration,
}

impl<A, S, L, H> Default for MacropadBuilder<A, S, L, H> {
    fn default() -> Self {
        Self {
            slider: None,
            switch_pin: None,
            leds: None,
            host: None,
            clock: None,
            profile: Profile::default(),
            slider_mode: None,
            switch_role: None,
            active_low: true,
            channel: None,
            notes: NoteCfg::default(),
            animation: AnimationCfg::default(),
            startup_animation: true,
            hold_timeout: DEFAULT_HOLD_TIMEOUT,
        }
    }
}

impl<A, S, L, H> MacropadBuilder<A, S, L, H>
where
    A: AnalogInput,
    S: DigitalInput,
    L: LedOutput,
    H: KeyHost + NoteOutput,
{
    pub fn with_slider(mut self, slider: A) -> Self {
        self.slider = Some(slider);
        self
    }

    pub fn with_switch(mut self, pin: S) -> Self {
        self.switch_pin = Some(pin);
        self
    }

    pub fn with_leds(mut self, leds: L) -> Self {
        self.leds = Some(leds);
        self
    }

    pub fn with_host(mut self, host: H) -> Self {
        self.host = Some(host);
        self
    }

    /// Inject a clock (tests use `ManualClock`); defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    /// Override the profile's slider mode.
    pub fn with_slider_mode(mut self, mode: SliderMode) -> Self {
        self.slider_mode = Some(mode);
        self
    }

    /// Override the profile's switch role.
    pub fn with_switch_role(mut self, role: SwitchRole, active_low: bool) -> Self {
        self.switch_role = Some(role);
        self.active_low = active_low;
        self
    }

    /// Replace the channel config. Without it the reset burst and step mode
    /// follow the slider mode.
    pub fn with_channel(mut self, cfg: ChannelCfg) -> Self {
        self.channel = Some(cfg);
        self
    }

    pub fn with_notes(mut self, cfg: NoteCfg) -> Self {
        self.notes = cfg;
        self
    }

    pub fn with_animation(mut self, cfg: AnimationCfg) -> Self {
        self.animation = cfg;
        self
    }

    /// Skip the startup blink (LEDs show the layer immediately).
    pub fn without_startup_animation(mut self) -> Self {
        self.startup_animation = false;
        self
    }

    pub fn with_hold_timeout(mut self, timeout: Duration) -> Self {
        self.hold_timeout = timeout;
        self
    }

    /// Validate and build. A missing collaborator yields `BuildError::Missing`.
    pub fn try_build(self) -> Result<Macropad<A, S, L, H>> {
        let slider = self
            .slider
            .ok_or_else(|| eyre::Report::new(BuildError::Missing("slider")))?;
        let switch_pin = self
            .switch_pin
            .ok_or_else(|| eyre::Report::new(BuildError::Missing("switch")))?;
        let leds = self
            .leds
            .ok_or_else(|| eyre::Report::new(BuildError::Missing("leds")))?;
        let mut host = self
            .host
            .ok_or_else(|| eyre::Report::new(BuildError::Missing("host")))?;
        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(c) => c,
            None => Arc::new(MonotonicClock::new()),
        };

        let profile = self.profile;
        let slider_mode = self.slider_mode.unwrap_or_else(|| profile.slider_mode());
        let role = self.switch_role.unwrap_or_else(|| profile.switch_role());
        let chords = match slider_mode {
            SliderMode::Zoom => SliderChords::ZOOM,
            SliderMode::Volume | SliderMode::Notes | SliderMode::Off => SliderChords::VOLUME,
        };

        let channel = match slider_mode {
            SliderMode::Volume | SliderMode::Zoom => {
                let cfg = self.channel.unwrap_or_else(|| ChannelCfg {
                    reset_burst: slider_mode.default_reset_burst(),
                    step_mode: slider_mode.default_step_mode(),
                    ..ChannelCfg::default()
                });
                let mut out = KeySteps::new(&mut host, chords);
                Some(
                    ControlChannel::initialize(cfg, clock.clone(), &mut out)
                        .wrap_err("building slider channel")?,
                )
            }
            SliderMode::Notes | SliderMode::Off => None,
        };
        let notes = match slider_mode {
            SliderMode::Notes => Some(NotePad::new(&self.notes).map_err(eyre::Report::new)?),
            _ => None,
        };
        let animation = self.startup_animation.then(|| {
            Animation::startup(
                Duration::from_millis(self.animation.startup_period_ms),
                self.animation.startup_cycles,
            )
        });

        tracing::info!(
            profile = profile.name(),
            ?slider_mode,
            ?role,
            "macropad ready"
        );

        Ok(Macropad {
            slider,
            switch_pin,
            leds: LedBank::new(leds),
            host,
            clock,
            profile,
            slider_mode,
            channel,
            chords,
            notes,
            note_gate: role != SwitchRole::MidiGate,
            switch: OsSwitch::new(role, self.active_low),
            hold: ModifierHold::new(self.hold_timeout),
            indicator: profile.indicator(),
            animation,
            anim_cfg: self.animation,
            sleep_pending: false,
            layer: 0,
            stats: PadStats::default(),
        })
    }
}
