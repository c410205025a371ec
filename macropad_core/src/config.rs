//! Runtime configuration types for the pad logic.
//!
//! These are the structs consumed by `ControlChannel`, `NotePad`, the LED
//! animations and `Macropad`. They are separate from the TOML-deserialized
//! config in `macropad_config`; see `conversions` for the bridge.

/// How a detected slider motion turns into unit actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepMode {
    /// One unit action per output level crossed (volume).
    #[default]
    PerLevel,
    /// One unit action per detected motion, whatever its size (zoom).
    PerMotion,
}

/// What the slider drives on the current profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderMode {
    /// Relative volume up/down keys.
    Volume,
    /// Ctrl+= / Ctrl+- zoom, one per motion.
    Zoom,
    /// Absolute MIDI base note (gated by the switch).
    Notes,
    /// Slider not read.
    Off,
}

impl SliderMode {
    /// Step mode implied by this slider mode when not configured explicitly.
    pub fn default_step_mode(self) -> StepMode {
        match self {
            SliderMode::Zoom => StepMode::PerMotion,
            SliderMode::Volume | SliderMode::Notes | SliderMode::Off => StepMode::PerLevel,
        }
    }

    /// Only volume drives the host level to zero at startup.
    pub fn default_reset_burst(self) -> bool {
        self == SliderMode::Volume
    }
}

/// Analog control channel configuration.
#[derive(Debug, Clone)]
pub struct ChannelCfg {
    /// Lower calibration bound in raw counts.
    pub raw_min: i32,
    /// Upper calibration bound in raw counts; must exceed `raw_min`.
    pub raw_max: i32,
    /// Number of discrete output levels (1..=1000).
    pub output_steps: u32,
    /// Act only when `|target - current| > deadband`.
    pub deadband: u32,
    /// EMA smoothing factor in (0.0, 1.0]; `None` disables smoothing.
    pub ema_alpha: Option<f32>,
    /// Samples are ignored for this long after the reset burst.
    pub settle_ms: u64,
    /// Drive the host level to zero at startup.
    pub reset_burst: bool,
    /// Defer the reset burst until this long after `initialize` (0 = immediately).
    pub reset_delay_ms: u64,
    /// Burst length; `None` means `output_steps`.
    pub reset_steps: Option<u32>,
    pub step_mode: StepMode,
}

impl Default for ChannelCfg {
    fn default() -> Self {
        Self {
            raw_min: 0,
            raw_max: 4095,
            output_steps: 100,
            deadband: 2,
            ema_alpha: None,
            settle_ms: 500,
            reset_burst: true,
            reset_delay_ms: 800,
            reset_steps: None,
            step_mode: StepMode::PerLevel,
        }
    }
}

impl ChannelCfg {
    /// Effective reset burst length.
    pub fn burst_len(&self) -> u32 {
        self.reset_steps.unwrap_or(self.output_steps)
    }
}

/// Slider-to-note mapping for the MIDI keymap.
#[derive(Debug, Clone)]
pub struct NoteCfg {
    pub raw_min: i32,
    pub raw_max: i32,
    /// Lowest base note (C1 = 24).
    pub low_note: u8,
    /// Highest base note (C8 = 108).
    pub high_note: u8,
    pub velocity: u8,
    pub channel: u8,
}

impl Default for NoteCfg {
    fn default() -> Self {
        Self {
            raw_min: 24,
            raw_max: 993,
            low_note: 24,
            high_note: 108,
            velocity: 127,
            channel: 0,
        }
    }
}

/// LED blink animation timings.
#[derive(Debug, Clone)]
pub struct AnimationCfg {
    pub startup_cycles: u32,
    pub startup_period_ms: u64,
    pub sleep_cycles: u32,
    pub sleep_period_ms: u64,
}

impl Default for AnimationCfg {
    fn default() -> Self {
        Self {
            startup_cycles: 10,
            startup_period_ms: 200,
            sleep_cycles: 5,
            sleep_period_ms: 200,
        }
    }
}
