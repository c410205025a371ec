#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core macro pad logic (hardware-agnostic).
//!
//! All hardware and host interactions go through the `macropad_traits`
//! collaborator traits, so everything here runs unchanged against the
//! simulated devices in `macropad_hardware` or a real firmware binding.
//!
//! ## Architecture
//!
//! - **Control channel**: slider → clamped, optionally smoothed, rescaled
//!   level → relative unit actions (`channel` module)
//! - **Notes**: slider → MIDI base note, chord keys (`notes`)
//! - **LEDs**: layer indicator frames, time-sliced blink animations (`led`)
//! - **Switch**: OS select / layer toggle / MIDI gate edge detection (`os_switch`)
//! - **Hold**: GUI+Tab window switching with a timed GUI release (`hold`)
//! - **Keymaps**: actions, OS-aware shortcuts and profiles (`keymap`)
//! - **Composer**: `Macropad` owns all of the above and runs one scan at a time (`pad`)
//! - **Runner**: paced scan loop with shutdown flag (`runner`)
//!
//! ## Integer Arithmetic
//!
//! Rescaling from raw counts to levels uses 64-bit integers with round-half-up
//! (`fixed_point`), so no configured range can overflow and the level for a
//! given sample is exact.

pub mod atomic;
pub mod calibration;
pub mod channel;
pub mod config;
pub mod conversions;
pub mod error;
pub mod fixed_point;
pub mod hold;
pub mod hw_error;
pub mod keymap;
pub mod led;
pub mod mocks;
pub mod notes;
pub mod os_switch;
pub mod pad;
pub mod runner;
pub mod status;
pub mod util;

pub use calibration::RawRange;
pub use channel::{ChannelPhase, ControlChannel};
pub use config::{AnimationCfg, ChannelCfg, NoteCfg, SliderMode, StepMode};
pub use error::{BuildError, PadError, Result};
pub use hold::{ModifierHold, TabDirection};
pub use keymap::{Action, KeySteps, Profile, SliderChords};
pub use led::{Animation, LayerIndicator, LedBank, LedFrame};
pub use notes::{ChordKind, NotePad, NoteRange};
pub use os_switch::{OsMode, OsSwitch, SwitchEvent, SwitchRole};
pub use pad::{KeyOutcome, Macropad, MacropadBuilder, PadStats, ScanReport};
pub use runner::{RunParams, RunSummary, StopReason};
pub use status::{Direction, SampleOutcome};
