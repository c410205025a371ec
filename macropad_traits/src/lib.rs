//! Collaborator seams between the macro pad logic and its host.
//!
//! Everything the firmware framework owns (ADC reads, GPIO, HID key taps,
//! layer moves, MIDI transport) is reached through these traits. Errors use
//! `Box<dyn Error + Send + Sync>` so any backend can plug in; the core maps
//! them to its typed error.

pub mod clock;
pub mod keys;

pub use clock::{Clock, MonotonicClock};
pub use keys::{Chord, Key, Mods};

/// Raw analog sampler (slider ADC).
pub trait AnalogInput {
    /// Read one sample in the device-native range.
    fn read_analog(&mut self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>>;
}

/// Receiver of relative unit actions; there is no absolute-set command.
pub trait StepOutput {
    fn increase(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn decrease(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// A digital input pin (e.g. the mode switch, pulled up).
pub trait DigitalInput {
    fn is_high(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}

/// A bank of single-color status LEDs addressed by index.
pub trait LedOutput {
    fn set(
        &mut self,
        index: usize,
        lit: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Keyboard side of the host framework.
pub trait KeyHost {
    fn tap(&mut self, chord: Chord) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn register_mods(&mut self, mods: Mods)
    -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn unregister_mods(
        &mut self,
        mods: Mods,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Make `layer` the only active base layer.
    fn move_to_layer(&mut self, layer: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// MIDI side of the host framework.
pub trait NoteOutput {
    fn note_on(
        &mut self,
        channel: u8,
        note: u8,
        velocity: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn note_off(
        &mut self,
        channel: u8,
        note: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: StepOutput + ?Sized> StepOutput for &mut T {
    fn increase(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).increase()
    }
    fn decrease(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).decrease()
    }
}

impl<T: AnalogInput + ?Sized> AnalogInput for Box<T> {
    fn read_analog(&mut self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read_analog()
    }
}
