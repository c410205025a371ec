//! Paced scan loop around `Macropad::scan`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use macropad_traits::clock::Clock;
use macropad_traits::{AnalogInput, DigitalInput, KeyHost, LedOutput, NoteOutput};

use crate::error::Result;
use crate::pad::Macropad;

#[derive(Debug, Clone, Copy)]
pub struct RunParams {
    /// Scan loop rate in Hz.
    pub scan_rate_hz: u32,
    /// Stop after this many scans.
    pub max_scans: Option<u64>,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            scan_rate_hz: 1000,
            max_scans: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    MaxScans,
    /// The caller's `done` predicate returned true (e.g. a replayed trace ran out).
    Exhausted,
    Shutdown,
}

impl StopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            StopReason::MaxScans => "max_scans",
            StopReason::Exhausted => "exhausted",
            StopReason::Shutdown => "shutdown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub scans: u64,
    pub steps_up: u64,
    pub steps_down: u64,
    /// Slider channel level at the end, when the profile has one.
    pub final_level: Option<u32>,
    /// Elapsed time on the run clock.
    pub duration: Duration,
    pub stop: StopReason,
}

/// Scan `pad` at `params.scan_rate_hz` until `max_scans`, `done(pad)` or
/// `shutdown`, whichever comes first.
///
/// The loop sleeps on `clock` between scans, so a simulated clock runs as
/// fast as the host allows. A scan error ends the run.
pub fn run<A, S, L, H, F>(
    pad: &mut Macropad<A, S, L, H>,
    clock: &dyn Clock,
    params: RunParams,
    shutdown: &AtomicBool,
    mut done: F,
) -> Result<RunSummary>
where
    A: AnalogInput,
    S: DigitalInput,
    L: LedOutput,
    H: KeyHost + NoteOutput,
    F: FnMut(&Macropad<A, S, L, H>) -> bool,
{
    let period = crate::util::scan_period(params.scan_rate_hz);
    let start = clock.now();
    let first_scan = pad.stats().scans;
    tracing::info!(
        rate_hz = params.scan_rate_hz,
        max_scans = ?params.max_scans,
        "scan loop start"
    );

    let stop = loop {
        if shutdown.load(Ordering::Relaxed) {
            break StopReason::Shutdown;
        }
        let scans = pad.stats().scans - first_scan;
        if params.max_scans.is_some_and(|max| scans >= max) {
            break StopReason::MaxScans;
        }
        if done(pad) {
            break StopReason::Exhausted;
        }
        pad.scan().wrap_err_with(|| format!("scan {}", scans + 1))?;
        clock.sleep(period);
    };

    let stats = pad.stats();
    let summary = RunSummary {
        scans: stats.scans - first_scan,
        steps_up: stats.steps_up,
        steps_down: stats.steps_down,
        final_level: pad.channel().map(|c| c.current_level()),
        duration: clock.elapsed_since(start),
        stop,
    };
    tracing::info!(
        scans = summary.scans,
        steps_up = summary.steps_up,
        steps_down = summary.steps_down,
        stop = stop.as_str(),
        "scan loop done"
    );
    Ok(summary)
}
