//! Simulated session: config mapping, device assembly, and the scan loop.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use eyre::WrapErr;
use macropad_config::Config;
use macropad_core::conversions::{effective_slider_mode, effective_switch_role};
use macropad_core::error::Result as CoreResult;
use macropad_core::runner::{self, RunParams, RunSummary};
use macropad_core::util::scans_covering;
use macropad_core::{AnimationCfg, ChannelCfg, Macropad, NoteCfg, Profile};
use macropad_hardware::{HostEvent, RecordingHost, ScriptedSwitch, SimulatedSlider, TracingLeds};
use macropad_traits::clock::test_clock::ManualClock;
use macropad_traits::clock::{Clock, MonotonicClock};

/// Test hook: make every slider read after the first N fail with an ADC timeout.
const SIM_FAULT_ENV: &str = "MACROPAD_TEST_SIM_FAULT";
/// Test hook: drop the simulated USB link after N host actions.
const SIM_DISCONNECT_ENV: &str = "MACROPAD_TEST_SIM_DISCONNECT";

pub type SimPad = Macropad<SimulatedSlider, ScriptedSwitch, TracingLeds, RecordingHost>;

/// Outcome of a simulated session.
#[derive(Debug)]
pub struct SessionReport {
    pub profile: Profile,
    pub summary: RunSummary,
    pub base_note: Option<u8>,
    pub events: Vec<HostEvent>,
}

fn env_count(name: &str) -> Option<usize> {
    let v = std::env::var(name).ok()?;
    match v.parse::<usize>() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!(var = name, value = %v, "ignoring non-numeric test hook");
            None
        }
    }
}

/// Assemble a simulated pad from the config.
pub fn build_pad(
    cfg: &Config,
    trace: Vec<i32>,
    clock: Arc<dyn Clock + Send + Sync>,
) -> CoreResult<SimPad> {
    let mut slider = SimulatedSlider::new(trace);
    if let Some(n) = env_count(SIM_FAULT_ENV) {
        slider = slider.fail_after(n);
    }
    let mut host = RecordingHost::new();
    if let Some(n) = env_count(SIM_DISCONNECT_ENV) {
        host = host.disconnect_after(n);
    }

    SimPad::builder()
        .with_slider(slider)
        // Released switch: Linux, base layer, MIDI gate closed
        .with_switch(ScriptedSwitch::constant(cfg.switch.active_low))
        .with_leds(TracingLeds::new())
        .with_host(host)
        .with_clock(clock)
        .with_profile(cfg.profile.into())
        .with_slider_mode(effective_slider_mode(cfg))
        .with_switch_role(effective_switch_role(cfg), cfg.switch.active_low)
        .with_channel(ChannelCfg::from(cfg))
        .with_notes(NoteCfg::from(&cfg.notes))
        .with_animation(AnimationCfg::from(&cfg.leds))
        .with_hold_timeout(Duration::from_millis(cfg.hold.timeout_ms))
        .try_build()
}

/// Scans during which slider samples are ignored after startup, or `None`
/// when the slider does not drive a control channel.
fn warmup_scans(cfg: &Config, pad: &SimPad) -> Option<u64> {
    let ch = pad.channel()?;
    let mut ms = ch.cfg().settle_ms;
    if ch.cfg().reset_burst {
        ms += ch.cfg().reset_delay_ms;
    }
    Some(scans_covering(Duration::from_millis(ms), cfg.scan.rate_hz))
}

/// Replay `trace` through a simulated pad until it is used up and the pad is
/// idle, `max_scans` is reached, or `shutdown` is set.
pub fn run_session(
    cfg: &Config,
    trace: Vec<i32>,
    max_scans: Option<u64>,
    realtime: bool,
    shutdown: &AtomicBool,
) -> CoreResult<SessionReport> {
    if trace.is_empty() {
        eyre::bail!("slider trace is empty");
    }
    let trace_len = trace.len() as u64;

    let clock: Arc<dyn Clock + Send + Sync> = if realtime {
        Arc::new(MonotonicClock::new())
    } else {
        Arc::new(ManualClock::new())
    };

    let mut pad = build_pad(cfg, trace, clock.clone()).wrap_err("building simulated pad")?;
    let profile = pad.profile();
    tracing::info!(
        profile = profile.name(),
        samples = trace_len,
        realtime,
        "session start"
    );

    if let Some(warmup_scans) = warmup_scans(cfg, &pad) {
        if let Some(max) = max_scans
            && max < warmup_scans
        {
            tracing::warn!(
                max_scans = max,
                warmup_scans,
                "session ends before the slider leaves its reset and settle delays"
            );
        }
        if trace_len <= warmup_scans {
            tracing::warn!(
                samples = trace_len,
                warmup_scans,
                "trace ends during the reset and settle delays; only its last sample is used"
            );
        }
    }

    let params = RunParams {
        scan_rate_hz: cfg.scan.rate_hz,
        max_scans,
    };
    // A scan reads at most one sample, so trace_len scans cover the trace
    // even when the slider is not read (notes gate closed, slider off).
    let summary = runner::run(&mut pad, &*clock, params, shutdown, |p| {
        p.stats().scans >= trace_len && p.is_idle()
    })?;

    Ok(SessionReport {
        profile,
        summary,
        base_note: pad.notes().map(|n| n.base_note()),
        events: pad.host().events().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use macropad_core::StopReason;

    #[test]
    fn simulated_session_runs_reset_and_ramp() {
        let cfg = macropad_config::load_toml("").unwrap();
        let trace = vec![4095; 10];
        let r = run_session(&cfg, trace, None, false, &AtomicBool::new(false)).unwrap();
        assert_eq!(r.summary.stop, StopReason::Exhausted);
        assert_eq!(r.summary.steps_down, 100);
        assert_eq!(r.summary.steps_up, 100);
        assert_eq!(r.summary.final_level, Some(100));
        // Startup blink outlasts the reset and settle delays
        assert_eq!(r.summary.duration, Duration::from_millis(4001));
        assert_eq!(r.events.len(), 200);
    }

    #[test]
    fn midi_session_with_closed_gate_finishes() {
        let cfg = macropad_config::load_toml("profile = \"midi\"").unwrap();
        let r = run_session(&cfg, vec![500; 3], None, false, &AtomicBool::new(false)).unwrap();
        assert_eq!(r.summary.final_level, None);
        assert_eq!(r.base_note, Some(60));
        assert!(r.events.is_empty());
    }

    #[test]
    fn warmup_counts_reset_and_settle_scans() {
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(ManualClock::new());
        let cfg = macropad_config::load_toml("").unwrap();
        let pad = build_pad(&cfg, vec![0], clock.clone()).unwrap();
        assert_eq!(warmup_scans(&cfg, &pad), Some(1300));

        // Zoom has no reset burst, so only the settle delay counts
        let cfg = macropad_config::load_toml("profile = \"tetris\"").unwrap();
        let pad = build_pad(&cfg, vec![0], clock.clone()).unwrap();
        assert_eq!(warmup_scans(&cfg, &pad), Some(500));

        let cfg = macropad_config::load_toml("profile = \"numpad\"").unwrap();
        let pad = build_pad(&cfg, vec![0], clock).unwrap();
        assert_eq!(warmup_scans(&cfg, &pad), None);
    }

    #[test]
    fn short_trace_holds_its_last_sample() {
        let cfg = macropad_config::load_toml("").unwrap();
        // 3 samples, all read during warm-up; the last one sets the level
        let r = run_session(&cfg, vec![0, 0, 2048], None, false, &AtomicBool::new(false)).unwrap();
        assert_eq!(r.summary.final_level, Some(50));
    }

    #[test]
    fn empty_trace_is_rejected() {
        let cfg = macropad_config::load_toml("").unwrap();
        let err = run_session(&cfg, vec![], None, false, &AtomicBool::new(false))
            .expect_err("empty trace");
        assert!(err.to_string().contains("empty"));
    }
}
