//! Status LEDs: layer indicator frames and time-sliced blink animations.
//!
//! Animations are state machines advanced by the scan loop with the current
//! time; they never sleep, so keys and the slider stay responsive while the
//! LEDs blink.

use std::fmt;
use std::time::{Duration, Instant};

use eyre::WrapErr;
use macropad_traits::LedOutput;

use crate::error::Result;
use crate::hw_error::to_report;

/// Number of status LEDs (left, middle, right).
pub const LED_COUNT: usize = 3;

/// On/off state of the three LEDs, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct LedFrame(pub [bool; LED_COUNT]);

impl LedFrame {
    pub const OFF: LedFrame = LedFrame([false, false, false]);
    pub const ALL: LedFrame = LedFrame([true, true, true]);
    pub const LEFT: LedFrame = LedFrame([true, false, false]);
    pub const MIDDLE: LedFrame = LedFrame([false, true, false]);
    pub const RIGHT: LedFrame = LedFrame([false, false, true]);
    /// Left and right together.
    pub const OUTER: LedFrame = LedFrame([true, false, true]);

    pub fn is_lit(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }
}

impl fmt::Display for LedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for lit in self.0 {
            f.write_str(if lit { "●" } else { "○" })?;
        }
        Ok(())
    }
}

/// Which LED pattern shows which layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayerIndicator {
    /// Layers 0-3 (and their macOS twins 4-7) light left, middle, right, all.
    #[default]
    Workspace,
    /// Layer 0 lights left, layer 4 lights right.
    Tetris,
    /// LEDs stay dark.
    Dark,
}

impl LayerIndicator {
    pub fn frame(self, layer: u8) -> LedFrame {
        match self {
            LayerIndicator::Workspace => match layer {
                0 | 4 => LedFrame::LEFT,
                1 | 5 => LedFrame::MIDDLE,
                2 | 6 => LedFrame::RIGHT,
                3 | 7 => LedFrame::ALL,
                _ => LedFrame::OFF,
            },
            LayerIndicator::Tetris => match layer {
                0 => LedFrame::LEFT,
                4 => LedFrame::RIGHT,
                _ => LedFrame::OFF,
            },
            LayerIndicator::Dark => LedFrame::OFF,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationKind {
    Startup,
    Sleep,
}

/// Two-frame blink that runs for a fixed number of cycles, then goes dark.
///
/// One cycle shows the first frame for `period` and the second for `period`.
/// The clock starts on the first `tick`.
#[derive(Debug, Clone)]
pub struct Animation {
    kind: AnimationKind,
    frames: [LedFrame; 2],
    period: Duration,
    cycles: u32,
    started: Option<Instant>,
    shown: Option<LedFrame>,
    finished: bool,
}

impl Animation {
    /// Outer LEDs alternating with the middle one.
    pub fn startup(period: Duration, cycles: u32) -> Self {
        Self::new(AnimationKind::Startup, [LedFrame::OUTER, LedFrame::MIDDLE], period, cycles)
    }

    /// All LEDs flashing together.
    pub fn sleep(period: Duration, cycles: u32) -> Self {
        Self::new(AnimationKind::Sleep, [LedFrame::ALL, LedFrame::OFF], period, cycles)
    }

    fn new(kind: AnimationKind, frames: [LedFrame; 2], period: Duration, cycles: u32) -> Self {
        Self {
            kind,
            frames,
            period: period.max(Duration::from_millis(1)),
            cycles,
            started: None,
            shown: None,
            finished: false,
        }
    }

    pub fn kind(&self) -> AnimationKind {
        self.kind
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Total running time.
    pub fn duration(&self) -> Duration {
        self.period.saturating_mul(self.cycles.saturating_mul(2))
    }

    /// Advance to `now`; returns the frame to show only when it changed.
    pub fn tick(&mut self, now: Instant) -> Option<LedFrame> {
        if self.finished {
            return None;
        }
        let start = *self.started.get_or_insert(now);
        let elapsed = now.saturating_duration_since(start);
        let slot = elapsed.as_nanos() / self.period.as_nanos().max(1);
        let frame = if slot >= u128::from(self.cycles) * 2 {
            self.finished = true;
            LedFrame::OFF
        } else {
            self.frames[(slot % 2) as usize]
        };
        if self.shown == Some(frame) {
            return None;
        }
        self.shown = Some(frame);
        Some(frame)
    }
}

/// The three LEDs behind a `LedOutput`, written only when the frame changes.
#[derive(Debug)]
pub struct LedBank<L: LedOutput> {
    leds: L,
    shown: Option<LedFrame>,
}

impl<L: LedOutput> LedBank<L> {
    pub fn new(leds: L) -> Self {
        Self { leds, shown: None }
    }

    /// Show `frame`; returns whether any pin was written.
    pub fn show(&mut self, frame: LedFrame) -> Result<bool> {
        if self.shown == Some(frame) {
            return Ok(false);
        }
        for (index, lit) in frame.0.into_iter().enumerate() {
            if let Err(e) = self.leds.set(index, lit) {
                // Pins may be half-written; force a full rewrite next time.
                self.shown = None;
                return Err(to_report(&*e)).wrap_err_with(|| format!("setting LED {index}"));
            }
        }
        tracing::trace!(%frame, "leds");
        self.shown = Some(frame);
        Ok(true)
    }

    pub fn shown(&self) -> Option<LedFrame> {
        self.shown
    }

    pub fn leds(&self) -> &L {
        &self.leds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn workspace_indicator_mirrors_os_layers() {
        let ind = LayerIndicator::Workspace;
        for (a, b) in [(0, 4), (1, 5), (2, 6), (3, 7)] {
            assert_eq!(ind.frame(a), ind.frame(b));
        }
        assert_eq!(ind.frame(3), LedFrame::ALL);
        assert_eq!(ind.frame(9), LedFrame::OFF);
        assert_eq!(LayerIndicator::Tetris.frame(4), LedFrame::RIGHT);
        assert_eq!(LayerIndicator::Tetris.frame(1), LedFrame::OFF);
    }

    #[test]
    fn startup_blink_sequence_then_dark() {
        let t0 = Instant::now();
        let mut a = Animation::startup(ms(200), 2);
        assert_eq!(a.tick(t0), Some(LedFrame::OUTER));
        assert_eq!(a.tick(t0 + ms(100)), None);
        assert_eq!(a.tick(t0 + ms(200)), Some(LedFrame::MIDDLE));
        assert_eq!(a.tick(t0 + ms(400)), Some(LedFrame::OUTER));
        assert_eq!(a.tick(t0 + ms(600)), Some(LedFrame::MIDDLE));
        assert!(!a.is_finished());
        assert_eq!(a.tick(t0 + ms(800)), Some(LedFrame::OFF));
        assert!(a.is_finished());
        assert_eq!(a.tick(t0 + ms(5000)), None);
    }

    #[test]
    fn sleep_blink_skips_straight_to_end_when_late() {
        let t0 = Instant::now();
        let mut a = Animation::sleep(ms(200), 5);
        assert_eq!(a.duration(), ms(2000));
        assert_eq!(a.tick(t0), Some(LedFrame::ALL));
        assert_eq!(a.tick(t0 + ms(10_000)), Some(LedFrame::OFF));
        assert!(a.is_finished());
    }

    #[test]
    fn zero_cycles_finishes_immediately() {
        let mut a = Animation::sleep(ms(200), 0);
        assert_eq!(a.tick(Instant::now()), Some(LedFrame::OFF));
        assert!(a.is_finished());
    }

    #[test]
    fn frame_display() {
        assert_eq!(LedFrame::OUTER.to_string(), "●○●");
    }
}
