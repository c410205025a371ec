#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and slider calibration parsing for the macro pad.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//!   Every section has defaults matching the stock keymaps, so an empty file
//!   is a valid workspace-profile config.
//! - The calibration CSV loader enforces its header and trims outliers from
//!   both ends of a slider sweep before taking the raw range.
use serde::{Deserialize, Serialize};

/// Largest number of unit actions a single scan may emit.
pub const MAX_OUTPUT_STEPS: u32 = 1000;

/// Keymap variant.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProfileName {
    /// Workspace/window navigation with Linux and macOS layer sets.
    #[default]
    Workspace,
    /// Arrow keys on one layer, modifiers on the other; slider zooms.
    Tetris,
    /// Slider picks a base note, keys play notes and chords.
    Midi,
    /// Plain digit keys, slider unused.
    Numpad,
}

impl ProfileName {
    pub fn as_str(self) -> &'static str {
        match self {
            ProfileName::Workspace => "workspace",
            ProfileName::Tetris => "tetris",
            ProfileName::Midi => "midi",
            ProfileName::Numpad => "numpad",
        }
    }
}

/// What the slider drives.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SliderMode {
    Volume,
    Zoom,
    Notes,
    Off,
}

/// How many actions a detected slider motion produces.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepMode {
    /// One action per output level crossed.
    PerLevel,
    /// One action per motion, whatever its size.
    PerMotion,
}

/// What the toggle switch on GP3 does.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SwitchRole {
    OsSelect,
    LayerToggle,
    MidiGate,
    Unused,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SliderCfg {
    /// Overrides the profile's slider mode when set.
    pub mode: Option<SliderMode>,
    pub raw_min: i32,
    pub raw_max: i32,
    pub output_steps: u32,
    /// Changes of at most this many levels are treated as noise.
    pub deadband: u32,
    /// Optional EMA smoothing factor in (0.0, 1.0]; absent disables smoothing.
    pub ema_alpha: Option<f32>,
    /// Grace period after the reset burst before the slider is honored.
    pub settle_ms: u64,
    /// Drive the host level to zero at startup. Defaults to on for volume,
    /// off for the other modes.
    pub reset_burst: Option<bool>,
    /// Wait this long after boot before sending the reset burst (0 = immediately).
    pub reset_delay_ms: u64,
    /// Burst length; defaults to `output_steps`.
    pub reset_steps: Option<u32>,
    /// Overrides the step mode implied by `mode`.
    pub step_mode: Option<StepMode>,
}

impl Default for SliderCfg {
    fn default() -> Self {
        Self {
            mode: None,
            raw_min: 0,
            raw_max: 4095,
            output_steps: 100,
            deadband: 2,
            ema_alpha: None,
            settle_ms: 500,
            reset_burst: None,
            reset_delay_ms: 800,
            reset_steps: None,
            step_mode: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NotesCfg {
    /// Measured raw range of the slider used for note selection.
    pub raw_min: i32,
    pub raw_max: i32,
    /// Lowest selectable base note (C1 = 24).
    pub low_note: u8,
    /// Highest selectable base note (C8 = 108).
    pub high_note: u8,
    pub velocity: u8,
    pub channel: u8,
}

impl Default for NotesCfg {
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SwitchCfg {
    /// Overrides the profile's switch role when set.
    pub role: Option<SwitchRole>,
    /// Treat a low level as "on" (pulled-up input).
    pub active_low: bool,
}

impl Default for SwitchCfg {
    fn default() -> Self {
        Self {
            role: None,
            active_low: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LedsCfg {
    pub startup_cycles: u32,
    pub startup_period_ms: u64,
    pub sleep_cycles: u32,
    pub sleep_period_ms: u64,
}

impl Default for LedsCfg {
    fn default() -> Self {
        Self {
            startup_cycles: 10,
            startup_period_ms: 200,
            sleep_cycles: 5,
            sleep_period_ms: 200,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HoldCfg {
    /// Release the held GUI modifier this long after the last Tab.
    pub timeout_ms: u64,
}

impl Default for HoldCfg {
    fn default() -> Self {
        Self { timeout_ms: 1000 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScanCfg {
    /// Scan loop rate in Hz.
    pub rate_hz: u32,
}

impl Default for ScanCfg {
    fn default() -> Self {
        Self { rate_hz: 1000 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// Slider range measured by `calibrate`; preferred over `[slider]` bounds.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct PersistedCalibration {
    pub raw_min: i32,
    pub raw_max: i32,
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub profile: ProfileName,
    #[serde(default)]
    pub slider: SliderCfg,
    #[serde(default)]
    pub notes: NotesCfg,
    #[serde(default)]
    pub switch: SwitchCfg,
    #[serde(default)]
    pub leds: LedsCfg,
    #[serde(default)]
    pub hold: HoldCfg,
    #[serde(default)]
    pub scan: ScanCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub calibration: Option<PersistedCalibration>,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    /// Slider raw range in effect: persisted calibration wins over `[slider]`.
    pub fn slider_range(&self) -> (i32, i32) {
        match self.calibration {
            Some(c) => (c.raw_min, c.raw_max),
            None => (self.slider.raw_min, self.slider.raw_max),
        }
    }

    pub fn validate(&self) -> eyre::Result<()> {
        // Slider
        let s = &self.slider;
        if s.raw_max <= s.raw_min {
            eyre::bail!("slider.raw_max must be > slider.raw_min");
        }
        if s.output_steps == 0 {
            eyre::bail!("slider.output_steps must be >= 1");
        }
        if s.output_steps > MAX_OUTPUT_STEPS {
            eyre::bail!("slider.output_steps must be <= {MAX_OUTPUT_STEPS}");
        }
        if s.deadband >= s.output_steps {
            eyre::bail!("slider.deadband must be < slider.output_steps");
        }
        if let Some(alpha) = s.ema_alpha
            && !(alpha > 0.0 && alpha <= 1.0)
        {
            eyre::bail!("slider.ema_alpha must be in (0.0, 1.0]");
        }
        if s.settle_ms > 60_000 {
            eyre::bail!("slider.settle_ms is unreasonably large (>60s)");
        }
        if s.reset_delay_ms > 60_000 {
            eyre::bail!("slider.reset_delay_ms is unreasonably large (>60s)");
        }
        if let Some(n) = s.reset_steps
            && !(1..=MAX_OUTPUT_STEPS).contains(&n)
        {
            eyre::bail!("slider.reset_steps must be in [1, {MAX_OUTPUT_STEPS}]");
        }

        // Notes
        let n = &self.notes;
        if n.raw_max <= n.raw_min {
            eyre::bail!("notes.raw_max must be > notes.raw_min");
        }
        if n.high_note > 127 {
            eyre::bail!("notes.high_note must be <= 127");
        }
        if n.low_note >= n.high_note {
            eyre::bail!("notes.low_note must be < notes.high_note");
        }
        if n.velocity == 0 || n.velocity > 127 {
            eyre::bail!("notes.velocity must be in [1, 127]");
        }
        if n.channel > 15 {
            eyre::bail!("notes.channel must be in [0, 15]");
        }

        // LEDs
        if self.leds.startup_period_ms == 0 {
            eyre::bail!("leds.startup_period_ms must be >= 1");
        }
        if self.leds.sleep_period_ms == 0 {
            eyre::bail!("leds.sleep_period_ms must be >= 1");
        }

        // Hold
        if self.hold.timeout_ms == 0 {
            eyre::bail!("hold.timeout_ms must be >= 1");
        }

        // Scan
        if self.scan.rate_hz == 0 {
            eyre::bail!("scan.rate_hz must be > 0");
        }

        // Calibration
        if let Some(c) = self.calibration
            && c.raw_max <= c.raw_min
        {
            eyre::bail!("calibration.raw_max must be > calibration.raw_min");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}

/// Raw slider range estimated from an end-to-end sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliderCalibration {
    pub raw_min: i32,
    pub raw_max: i32,
    /// Samples the estimate was based on (after trimming).
    pub samples: usize,
}

impl SliderCalibration {
    /// Estimate the range from sweep samples.
    ///
    /// Samples are sorted and `trim_fraction` of them is dropped from each
    /// end, so a few spikes at the rails do not widen the range.
    pub fn from_samples(mut samples: Vec<i32>, trim_fraction: f64) -> eyre::Result<Self> {
        if !(0.0..0.25).contains(&trim_fraction) {
            eyre::bail!("calibration trim fraction must be in [0.0, 0.25)");
        }
        if samples.len() < 2 {
            eyre::bail!(
                "calibration requires at least two samples, got {}",
                samples.len()
            );
        }
        samples.sort_unstable();
        let n = samples.len();
        let k = ((n as f64) * trim_fraction).floor() as usize;
        let kept = n - 2 * k;
        if kept < 2 {
            eyre::bail!("calibration trim leaves fewer than two samples");
        }
        let raw_min = samples[k];
        let raw_max = samples[n - 1 - k];
        if raw_max <= raw_min {
            eyre::bail!("calibration sweep did not move the slider (all samples equal {raw_min})");
        }
        Ok(Self {
            raw_min,
            raw_max,
            samples: kept,
        })
    }

    /// Render as a `[calibration]` TOML section.
    pub fn to_toml(&self) -> eyre::Result<String> {
        #[derive(Serialize)]
        struct Doc {
            calibration: PersistedCalibration,
        }
        let doc = Doc {
            calibration: (*self).into(),
        };
        toml::to_string(&doc).map_err(|e| eyre::eyre!("serialize calibration: {e}"))
    }
}

impl From<SliderCalibration> for PersistedCalibration {
    fn from(c: SliderCalibration) -> Self {
        Self {
            raw_min: c.raw_min,
            raw_max: c.raw_max,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
struct RawRow {
    raw: i32,
}

/// Read a single-column `raw` CSV (calibration sweep or slider trace).
pub fn load_raw_csv(path: &std::path::Path) -> eyre::Result<Vec<i32>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open raw CSV {:?}: {}", path, e))?;

    // Enforce exact header
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != ["raw"] {
        eyre::bail!("raw CSV must have header 'raw', got: {}", actual.join(","));
    }

    let mut out = Vec::new();
    for (idx, rec) in rdr.deserialize::<RawRow>().enumerate() {
        match rec {
            Ok(row) => out.push(row.raw),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    Ok(out)
}

pub fn load_calibration_csv(
    path: &std::path::Path,
    trim_fraction: f64,
) -> eyre::Result<SliderCalibration> {
    let samples = load_raw_csv(path)?;
    SliderCalibration::from_samples(samples, trim_fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_a_valid_workspace_config() {
        let cfg = load_toml("").expect("parse");
        cfg.validate().expect("defaults validate");
        assert_eq!(cfg.profile, ProfileName::Workspace);
        assert_eq!(cfg.slider_range(), (0, 4095));
        assert_eq!(cfg.slider.output_steps, 100);
        assert_eq!(cfg.slider.deadband, 2);
    }

    #[test]
    fn calibration_overrides_slider_bounds() {
        let cfg = load_toml(
            r#"
[calibration]
raw_min = 24
raw_max = 993
"#,
        )
        .expect("parse");
        assert_eq!(cfg.slider_range(), (24, 993));
    }

    #[test]
    fn trimmed_range_ignores_rail_spikes() {
        let mut samples: Vec<i32> = (100..=900).collect();
        samples.push(-500);
        samples.push(5000);
        let cal = SliderCalibration::from_samples(samples, 0.01).expect("calibrate");
        assert!(cal.raw_min >= 100 && cal.raw_min < 120, "{cal:?}");
        assert!(cal.raw_max <= 900 && cal.raw_max > 880, "{cal:?}");
    }

    #[test]
    fn flat_sweep_is_rejected() {
        let err = SliderCalibration::from_samples(vec![512; 50], 0.0).expect_err("flat");
        assert!(err.to_string().contains("did not move"));
    }

    #[test]
    fn calibration_renders_as_toml_section() {
        let cal = SliderCalibration {
            raw_min: 24,
            raw_max: 993,
            samples: 10,
        };
        let text = cal.to_toml().expect("toml");
        let back = load_toml(&text).expect("reparse");
        assert_eq!(
            back.calibration,
            Some(PersistedCalibration {
                raw_min: 24,
                raw_max: 993
            })
        );
    }
}
