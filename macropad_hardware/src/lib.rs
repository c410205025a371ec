//! Simulated macro pad devices.
//!
//! The real pad is an RP2040 board whose firmware owns the ADC, GPIO and USB
//! HID stack. These stand-ins let the core logic run on a desktop: a slider
//! that replays a recorded trace, a scripted switch, an LED bank that logs
//! changes and a host that records every action it receives.

pub mod error;

use error::HwError;
use macropad_traits::{AnalogInput, Chord, DigitalInput, KeyHost, LedOutput, Mods, NoteOutput};

/// Number of status LEDs on the pad.
pub const LED_COUNT: usize = 3;

/// Slider that replays a recorded trace, one sample per read.
///
/// After the trace is exhausted the last sample is repeated, like a slider
/// left where it was. Optional jitter adds deterministic pseudo-random noise.
#[derive(Debug)]
pub struct SimulatedSlider {
    trace: Vec<i32>,
    idx: usize,
    jitter: i32,
    rng: u32,
    fail_after: Option<usize>,
}

impl SimulatedSlider {
    pub fn new(trace: impl Into<Vec<i32>>) -> Self {
        Self {
            trace: trace.into(),
            idx: 0,
            jitter: 0,
            rng: 1,
            fail_after: None,
        }
    }

    /// Add uniform noise in `[-amplitude, +amplitude]` to every sample.
    pub fn with_jitter(mut self, amplitude: i32, seed: u32) -> Self {
        self.jitter = amplitude.max(0);
        self.rng = seed.max(1);
        self
    }

    /// Make every read after the first `n` fail with an ADC timeout.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Number of samples in the trace.
    pub fn len(&self) -> usize {
        self.trace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trace.is_empty()
    }

    /// True once every recorded sample has been read at least once.
    pub fn is_exhausted(&self) -> bool {
        self.idx >= self.trace.len()
    }

    fn next_noise(&mut self) -> i32 {
        if self.jitter == 0 {
            return 0;
        }
        // xorshift32
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        let span = (self.jitter as u32) * 2 + 1;
        (x % span) as i32 - self.jitter
    }
}

impl AnalogInput for SimulatedSlider {
    fn read_analog(&mut self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>> {
        if let Some(n) = self.fail_after
            && self.idx >= n
        {
            return Err(Box::new(HwError::Timeout));
        }
        let base = match self.trace.get(self.idx) {
            Some(v) => *v,
            None => self.trace.last().copied().unwrap_or(0),
        };
        self.idx = self.idx.saturating_add(1);
        let v = base.saturating_add(self.next_noise());
        tracing::trace!(raw = v, "slider sample (simulated)");
        Ok(v)
    }
}

/// Switch pin that follows a scripted sequence of levels, repeating the last.
///
/// An empty script reads high, i.e. a released pulled-up switch.
#[derive(Debug, Default)]
pub struct ScriptedSwitch {
    levels: Vec<bool>,
    idx: usize,
}

impl ScriptedSwitch {
    pub fn new(levels: impl Into<Vec<bool>>) -> Self {
        Self {
            levels: levels.into(),
            idx: 0,
        }
    }

    /// A switch held at one level forever.
    pub fn constant(high: bool) -> Self {
        Self::new(vec![high])
    }
}

impl DigitalInput for ScriptedSwitch {
    fn is_high(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let v = match self.levels.get(self.idx) {
            Some(v) => *v,
            None => self.levels.last().copied().unwrap_or(true),
        };
        self.idx = self.idx.saturating_add(1);
        Ok(v)
    }
}

/// LED bank that keeps the current state and logs every change.
#[derive(Debug, Default)]
pub struct TracingLeds {
    state: [bool; LED_COUNT],
    writes: usize,
}

impl TracingLeds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> [bool; LED_COUNT] {
        self.state
    }

    /// Number of pin writes performed so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl LedOutput for TracingLeds {
    fn set(
        &mut self,
        index: usize,
        lit: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let Some(slot) = self.state.get_mut(index) else {
            return Err(Box::new(HwError::Gpio(format!("no LED at index {index}"))));
        };
        self.writes += 1;
        if *slot != lit {
            *slot = lit;
            tracing::debug!(led = index, lit, "led (simulated)");
        }
        Ok(())
    }
}

/// One action received by [`RecordingHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Tap(Chord),
    Register(Mods),
    Unregister(Mods),
    Layer(u8),
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8 },
}

/// Host stand-in that records every key, layer and note action.
#[derive(Debug, Default)]
pub struct RecordingHost {
    events: Vec<HostEvent>,
    held: Mods,
    disconnect_after: Option<usize>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the USB link dropping after `n` recorded events.
    pub fn disconnect_after(mut self, n: usize) -> Self {
        self.disconnect_after = Some(n);
        self
    }

    pub fn events(&self) -> &[HostEvent] {
        &self.events
    }

    /// Modifiers currently registered and not yet released.
    pub fn held_mods(&self) -> Mods {
        self.held
    }

    /// Number of taps of exactly `chord`.
    pub fn taps_of(&self, chord: Chord) -> usize {
        self.events
            .iter()
            .filter(|e| **e == HostEvent::Tap(chord))
            .count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    fn record(&mut self, ev: HostEvent) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(n) = self.disconnect_after
            && self.events.len() >= n
        {
            return Err(Box::new(HwError::Disconnected));
        }
        self.events.push(ev);
        Ok(())
    }
}

impl KeyHost for RecordingHost {
    fn tap(&mut self, chord: Chord) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.record(HostEvent::Tap(chord))?;
        tracing::debug!(%chord, "tap");
        Ok(())
    }

    fn register_mods(
        &mut self,
        mods: Mods,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.record(HostEvent::Register(mods))?;
        self.held = self.held | mods;
        tracing::debug!(%mods, "register mods");
        Ok(())
    }

    fn unregister_mods(
        &mut self,
        mods: Mods,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.record(HostEvent::Unregister(mods))?;
        self.held = self.held.difference(mods);
        tracing::debug!(%mods, "unregister mods");
        Ok(())
    }

    fn move_to_layer(&mut self, layer: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.record(HostEvent::Layer(layer))?;
        tracing::info!(layer, "layer move");
        Ok(())
    }
}

impl NoteOutput for RecordingHost {
    fn note_on(
        &mut self,
        channel: u8,
        note: u8,
        velocity: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.record(HostEvent::NoteOn {
            channel,
            note,
            velocity,
        })?;
        tracing::debug!(channel, note, velocity, "note on");
        Ok(())
    }

    fn note_off(
        &mut self,
        channel: u8,
        note: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.record(HostEvent::NoteOff { channel, note })?;
        tracing::debug!(channel, note, "note off");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macropad_traits::Key;
    use rstest::rstest;

    #[test]
    fn slider_replays_trace_then_holds_last() {
        let mut s = SimulatedSlider::new(vec![10, 20, 30]);
        let got: Vec<i32> = (0..5).map(|_| s.read_analog().unwrap()).collect();
        assert_eq!(got, vec![10, 20, 30, 30, 30]);
        assert!(s.is_exhausted());
    }

    #[rstest]
    #[case(0)]
    #[case(3)]
    #[case(50)]
    fn jitter_stays_within_amplitude(#[case] amp: i32) {
        let mut s = SimulatedSlider::new(vec![2000; 200]).with_jitter(amp, 7);
        for _ in 0..200 {
            let v = s.read_analog().unwrap();
            assert!((2000 - amp..=2000 + amp).contains(&v), "{v} outside ±{amp}");
        }
    }

    #[test]
    fn slider_fails_after_n_reads() {
        let mut s = SimulatedSlider::new(vec![1, 2, 3]).fail_after(2);
        assert!(s.read_analog().is_ok());
        assert!(s.read_analog().is_ok());
        let err = s.read_analog().expect_err("should time out");
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn scripted_switch_defaults_high() {
        let mut sw = ScriptedSwitch::default();
        assert!(sw.is_high().unwrap());
        let mut sw = ScriptedSwitch::new(vec![true, false]);
        assert!(sw.is_high().unwrap());
        assert!(!sw.is_high().unwrap());
        assert!(!sw.is_high().unwrap());
    }

    #[test]
    fn leds_reject_unknown_index() {
        let mut leds = TracingLeds::new();
        leds.set(2, true).unwrap();
        assert_eq!(leds.state(), [false, false, true]);
        assert!(leds.set(LED_COUNT, true).is_err());
    }

    #[test]
    fn host_tracks_held_mods_and_disconnects() {
        let mut host = RecordingHost::new().disconnect_after(3);
        host.register_mods(Mods::GUI | Mods::SHIFT).unwrap();
        host.unregister_mods(Mods::SHIFT).unwrap();
        assert_eq!(host.held_mods(), Mods::GUI);
        host.tap(Chord::plain(Key::Tab)).unwrap();
        let err = host.tap(Chord::plain(Key::Tab)).expect_err("link should drop");
        assert!(err.to_string().contains("disconnected"));
        assert_eq!(host.taps_of(Chord::plain(Key::Tab)), 1);
    }
}
