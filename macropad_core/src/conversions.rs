//! `From` implementations bridging `macropad_config` types to `macropad_core` types.

use crate::config::{AnimationCfg, ChannelCfg, NoteCfg, SliderMode, StepMode};
use crate::keymap::Profile;
use crate::os_switch::SwitchRole;

// ── Enums ────────────────────────────────────────────────────────────────────

impl From<macropad_config::ProfileName> for Profile {
    fn from(p: macropad_config::ProfileName) -> Self {
        match p {
            macropad_config::ProfileName::Workspace => Profile::Workspace,
            macropad_config::ProfileName::Tetris => Profile::Tetris,
            macropad_config::ProfileName::Midi => Profile::Midi,
            macropad_config::ProfileName::Numpad => Profile::Numpad,
        }
    }
}

impl From<macropad_config::SliderMode> for SliderMode {
    fn from(m: macropad_config::SliderMode) -> Self {
        match m {
            macropad_config::SliderMode::Volume => SliderMode::Volume,
            macropad_config::SliderMode::Zoom => SliderMode::Zoom,
            macropad_config::SliderMode::Notes => SliderMode::Notes,
            macropad_config::SliderMode::Off => SliderMode::Off,
        }
    }
}

impl From<macropad_config::StepMode> for StepMode {
    fn from(m: macropad_config::StepMode) -> Self {
        match m {
            macropad_config::StepMode::PerLevel => StepMode::PerLevel,
            macropad_config::StepMode::PerMotion => StepMode::PerMotion,
        }
    }
}

impl From<macropad_config::SwitchRole> for SwitchRole {
    fn from(r: macropad_config::SwitchRole) -> Self {
        match r {
            macropad_config::SwitchRole::OsSelect => SwitchRole::OsSelect,
            macropad_config::SwitchRole::LayerToggle => SwitchRole::LayerToggle,
            macropad_config::SwitchRole::MidiGate => SwitchRole::MidiGate,
            macropad_config::SwitchRole::Unused => SwitchRole::Unused,
        }
    }
}

// ── ChannelCfg ───────────────────────────────────────────────────────────────

/// Slider mode in effect: `[slider].mode` wins over the profile default.
pub fn effective_slider_mode(c: &macropad_config::Config) -> SliderMode {
    c.slider
        .mode
        .map_or_else(|| Profile::from(c.profile).slider_mode(), SliderMode::from)
}

/// Switch role in effect: `[switch].role` wins over the profile default.
pub fn effective_switch_role(c: &macropad_config::Config) -> SwitchRole {
    c.switch
        .role
        .map_or_else(|| Profile::from(c.profile).switch_role(), SwitchRole::from)
}

impl From<&macropad_config::Config> for ChannelCfg {
    /// Uses the persisted calibration range when present. Step mode and the
    /// reset burst default from the slider mode: only volume resets.
    fn from(c: &macropad_config::Config) -> Self {
        let mode = effective_slider_mode(c);
        let (raw_min, raw_max) = c.slider_range();
        let s = &c.slider;
        Self {
            raw_min,
            raw_max,
            output_steps: s.output_steps,
            deadband: s.deadband,
            ema_alpha: s.ema_alpha,
            settle_ms: s.settle_ms,
            reset_burst: s.reset_burst.unwrap_or_else(|| mode.default_reset_burst()),
            reset_delay_ms: s.reset_delay_ms,
            reset_steps: s.reset_steps,
            step_mode: s
                .step_mode
                .map_or_else(|| mode.default_step_mode(), StepMode::from),
        }
    }
}

// ── NoteCfg ──────────────────────────────────────────────────────────────────

impl From<&macropad_config::NotesCfg> for NoteCfg {
    fn from(c: &macropad_config::NotesCfg) -> Self {
        Self {
            raw_min: c.raw_min,
            raw_max: c.raw_max,
            low_note: c.low_note,
            high_note: c.high_note,
            velocity: c.velocity,
            channel: c.channel,
        }
    }
}

// ── AnimationCfg ─────────────────────────────────────────────────────────────

impl From<&macropad_config::LedsCfg> for AnimationCfg {
    fn from(c: &macropad_config::LedsCfg) -> Self {
        Self {
            startup_cycles: c.startup_cycles,
            startup_period_ms: c.startup_period_ms,
            sleep_cycles: c.sleep_cycles,
            sleep_period_ms: c.sleep_period_ms,
        }
    }
}
