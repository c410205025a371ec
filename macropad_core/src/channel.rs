//! Analog control channel: turns a noisy slider into relative unit actions.
//!
//! The host side (system volume, zoom) only understands "one up" and "one
//! down", and nothing can be read back. The channel therefore keeps
//! `current_level` as the authoritative record of what was actually sent, and
//! drives it to zero with a reset burst at startup so that record starts from
//! a known baseline.
//!
//! Startup is a phase machine advanced by `on_sample`, never a blocking wait:
//!
//! ```text
//! AwaitingReset --(reset delay elapsed: burst)--> Settling --(settle elapsed)--> Ready
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use eyre::WrapErr;
use macropad_traits::StepOutput;
use macropad_traits::clock::Clock;

use crate::calibration::RawRange;
use crate::config::{ChannelCfg, StepMode};
use crate::error::{BuildError, Result};
use crate::fixed_point::{ema_step, quantize_raw};
use crate::hw_error::to_report;
use crate::status::{Direction, SampleOutcome};

/// Upper bound on unit actions a single call may emit.
pub const MAX_OUTPUT_STEPS: u32 = macropad_config::MAX_OUTPUT_STEPS;

/// Startup phase of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPhase {
    /// Waiting for the host to come up before sending the reset burst.
    AwaitingReset { since: Instant },
    /// Burst sent (or skipped); ignoring samples until the settle delay passes.
    Settling { since: Instant },
    Ready,
}

/// Check a channel configuration and derive its raw range.
pub fn validate(cfg: &ChannelCfg) -> std::result::Result<RawRange, BuildError> {
    let range = RawRange::new(cfg.raw_min, cfg.raw_max)?;
    if cfg.output_steps == 0 {
        return Err(BuildError::ZeroSteps);
    }
    if cfg.output_steps > MAX_OUTPUT_STEPS {
        return Err(BuildError::TooManySteps(cfg.output_steps));
    }
    if cfg.deadband >= cfg.output_steps {
        return Err(BuildError::DeadbandTooWide {
            deadband: cfg.deadband,
            steps: cfg.output_steps,
        });
    }
    if let Some(alpha) = cfg.ema_alpha
        && !(alpha > 0.0 && alpha <= 1.0)
    {
        return Err(BuildError::InvalidSmoothing(alpha));
    }
    if let Some(n) = cfg.reset_steps
        && n > MAX_OUTPUT_STEPS
    {
        return Err(BuildError::TooManySteps(n));
    }
    Ok(range)
}

pub struct ControlChannel {
    cfg: ChannelCfg,
    range: RawRange,
    clock: Arc<dyn Clock + Send + Sync>,
    phase: ChannelPhase,
    current_level: u32,
    last_target: Option<u32>,
    filtered: Option<f64>,
}

impl core::fmt::Debug for ControlChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ControlChannel")
            .field("range", &self.range)
            .field("output_steps", &self.cfg.output_steps)
            .field("phase", &self.phase)
            .field("current_level", &self.current_level)
            .field("last_target", &self.last_target)
            .finish()
    }
}

impl ControlChannel {
    /// Validate `cfg` and start the channel.
    ///
    /// With `reset_delay_ms == 0` the reset burst is sent to `out` before
    /// returning; otherwise it is deferred to the first `on_sample` after the
    /// delay. Configuration errors carry a `BuildError`.
    pub fn initialize<O: StepOutput + ?Sized>(
        cfg: ChannelCfg,
        clock: Arc<dyn Clock + Send + Sync>,
        out: &mut O,
    ) -> Result<Self> {
        let range = validate(&cfg).map_err(eyre::Report::new)?;
        let now = clock.now();
        let phase = if cfg.reset_burst {
            ChannelPhase::AwaitingReset { since: now }
        } else {
            ChannelPhase::Settling { since: now }
        };
        let mut ch = Self {
            cfg,
            range,
            clock,
            phase,
            current_level: 0,
            last_target: None,
            filtered: None,
        };
        tracing::debug!(
            raw_min = ch.range.min(),
            raw_max = ch.range.max(),
            steps = ch.cfg.output_steps,
            deadband = ch.cfg.deadband,
            "control channel init"
        );
        if ch.cfg.reset_burst && ch.cfg.reset_delay_ms == 0 {
            ch.send_reset(out).wrap_err("initial reset burst")?;
        }
        Ok(ch)
    }

    /// Process one slider sample. Call once per scan cycle.
    ///
    /// Never fails on input: out-of-range samples are clamped. The only error
    /// path is a failing `out`, in which case `current_level` still reflects
    /// exactly the actions that were delivered.
    pub fn on_sample<O: StepOutput + ?Sized>(
        &mut self,
        raw: i32,
        out: &mut O,
    ) -> Result<SampleOutcome> {
        match self.phase {
            ChannelPhase::AwaitingReset { since } => {
                if self.clock.elapsed_since(since) >= Duration::from_millis(self.cfg.reset_delay_ms)
                {
                    let steps = self.send_reset(out)?;
                    return Ok(SampleOutcome::Reset { steps });
                }
                return Ok(SampleOutcome::NotReady);
            }
            ChannelPhase::Settling { since } => {
                if self.clock.elapsed_since(since) < Duration::from_millis(self.cfg.settle_ms) {
                    return Ok(SampleOutcome::NotReady);
                }
                self.phase = ChannelPhase::Ready;
                tracing::debug!("slider ready");
            }
            ChannelPhase::Ready => {}
        }

        let clamped = self.range.clamp(raw);
        let smoothed = self.smooth(clamped);
        let target = self.range.to_level(smoothed, self.cfg.output_steps);
        self.last_target = Some(target);

        let delta = target.abs_diff(self.current_level);
        if delta <= self.cfg.deadband {
            tracing::trace!(raw, target, level = self.current_level, "within deadband");
            return Ok(SampleOutcome::Deadband { target });
        }

        let direction = if target > self.current_level {
            Direction::Up
        } else {
            Direction::Down
        };
        let steps = match self.cfg.step_mode {
            StepMode::PerLevel => {
                self.emit(direction, delta, out)?;
                delta
            }
            StepMode::PerMotion => {
                emit_one(direction, out).wrap_err_with(|| format!("sending {direction:?} motion"))?;
                self.current_level = target;
                1
            }
        };
        tracing::debug!(?direction, steps, level = self.current_level, "slider step");
        Ok(SampleOutcome::Stepped {
            direction,
            steps,
            level: self.current_level,
        })
    }

    /// Last level communicated outward, `0..=output_steps`.
    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    /// Target computed from the most recent processed sample.
    pub fn last_target(&self) -> Option<u32> {
        self.last_target
    }

    pub fn is_ready(&self) -> bool {
        self.phase == ChannelPhase::Ready
    }

    pub fn phase(&self) -> ChannelPhase {
        self.phase
    }

    /// EMA accumulator in raw units, when smoothing is enabled and seeded.
    pub fn filtered(&self) -> Option<f64> {
        self.filtered
    }

    pub fn cfg(&self) -> &ChannelCfg {
        &self.cfg
    }

    pub fn range(&self) -> RawRange {
        self.range
    }

    fn smooth(&mut self, clamped: i32) -> i32 {
        let Some(alpha) = self.cfg.ema_alpha else {
            return clamped;
        };
        let next = match self.filtered {
            None => f64::from(clamped),
            Some(prev) => ema_step(prev, clamped, alpha),
        };
        self.filtered = Some(next);
        quantize_raw(next, self.range.min(), self.range.max())
    }

    fn send_reset<O: StepOutput + ?Sized>(&mut self, out: &mut O) -> Result<u32> {
        let n = self.cfg.burst_len();
        for sent in 0..n {
            out.decrease()
                .map_err(|e| to_report(&*e))
                .wrap_err_with(|| format!("reset burst interrupted after {sent} of {n} steps"))?;
        }
        self.current_level = 0;
        self.last_target = None;
        self.phase = ChannelPhase::Settling {
            since: self.clock.now(),
        };
        tracing::debug!(steps = n, "reset burst sent");
        Ok(n)
    }

    fn emit<O: StepOutput + ?Sized>(
        &mut self,
        direction: Direction,
        n: u32,
        out: &mut O,
    ) -> Result<()> {
        for sent in 0..n {
            emit_one(direction, out)
                .wrap_err_with(|| format!("sending {direction:?} step {} of {n}", sent + 1))?;
            match direction {
                Direction::Up => self.current_level += 1,
                Direction::Down => self.current_level -= 1,
            }
        }
        Ok(())
    }
}

fn emit_one<O: StepOutput + ?Sized>(direction: Direction, out: &mut O) -> Result<()> {
    let r = match direction {
        Direction::Up => out.increase(),
        Direction::Down => out.decrease(),
    };
    r.map_err(|e| to_report(&*e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::RecordingSteps;
    use macropad_traits::clock::test_clock::ManualClock;

    fn ready_channel(cfg: ChannelCfg, out: &mut RecordingSteps) -> ControlChannel {
        let cfg = ChannelCfg {
            reset_burst: false,
            settle_ms: 0,
            ..cfg
        };
        ControlChannel::initialize(cfg, Arc::new(ManualClock::new()), out).unwrap()
    }

    #[test]
    fn volume_scenario_from_zero() {
        let mut out = RecordingSteps::default();
        let mut ch = ready_channel(ChannelCfg::default(), &mut out);

        let o = ch.on_sample(2048, &mut out).unwrap();
        assert_eq!(
            o,
            SampleOutcome::Stepped {
                direction: Direction::Up,
                steps: 50,
                level: 50
            }
        );
        assert_eq!(out.ups(), 50);

        let o = ch.on_sample(2070, &mut out).unwrap();
        assert_eq!(o, SampleOutcome::Deadband { target: 51 });
        assert_eq!(out.total(), 50);
        assert_eq!(ch.current_level(), 50);
    }

    #[test]
    fn down_moves_emit_decreases() {
        let mut out = RecordingSteps::default();
        let mut ch = ready_channel(ChannelCfg::default(), &mut out);
        ch.on_sample(4095, &mut out).unwrap();
        out.clear();
        let o = ch.on_sample(0, &mut out).unwrap();
        assert_eq!(o.emitted(), 100);
        assert_eq!(out.downs(), 100);
        assert_eq!(ch.current_level(), 0);
    }

    #[test]
    fn per_motion_sends_one_action() {
        let mut out = RecordingSteps::default();
        let cfg = ChannelCfg {
            step_mode: StepMode::PerMotion,
            ..ChannelCfg::default()
        };
        let mut ch = ready_channel(cfg, &mut out);
        let o = ch.on_sample(4095, &mut out).unwrap();
        assert_eq!(
            o,
            SampleOutcome::Stepped {
                direction: Direction::Up,
                steps: 1,
                level: 100
            }
        );
        assert_eq!(out.total(), 1);
    }

    #[test]
    fn partial_emission_keeps_level_consistent() {
        let mut out = RecordingSteps::default().fail_after(7);
        let mut ch = ready_channel(ChannelCfg::default(), &mut out);
        let err = ch.on_sample(4095, &mut out).expect_err("sink fails");
        assert!(format!("{err:#}").contains("step 8 of 100"), "{err:#}");
        assert_eq!(ch.current_level(), 7);
        assert_eq!(out.ups(), 7);
    }

    #[test]
    fn validation_errors_are_typed() {
        let mut out = RecordingSteps::default();
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(ManualClock::new());
        let cases = [
            (
                ChannelCfg {
                    raw_min: 10,
                    raw_max: 10,
                    ..ChannelCfg::default()
                },
                BuildError::InvalidRange { min: 10, max: 10 },
            ),
            (
                ChannelCfg {
                    output_steps: 0,
                    ..ChannelCfg::default()
                },
                BuildError::ZeroSteps,
            ),
            (
                ChannelCfg {
                    output_steps: 5000,
                    ..ChannelCfg::default()
                },
                BuildError::TooManySteps(5000),
            ),
            (
                ChannelCfg {
                    deadband: 100,
                    ..ChannelCfg::default()
                },
                BuildError::DeadbandTooWide {
                    deadband: 100,
                    steps: 100,
                },
            ),
        ];
        for (cfg, want) in cases {
            let err = ControlChannel::initialize(cfg, clock.clone(), &mut out).expect_err("invalid");
            assert_eq!(err.downcast_ref::<BuildError>(), Some(&want));
        }
        assert_eq!(out.total(), 0, "nothing sent for rejected configs");
    }
}
