//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use macropad_core::Profile;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Config file used when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "etc/macropad.toml";

/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "macropad", version, about = "Macro pad simulator and tools")]
pub struct Cli {
    /// Path to config TOML [default: etc/macropad.toml, built-in defaults if absent]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Optional slider calibration sweep CSV (strict `raw` header)
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// Print results and errors as JSON lines; logs become JSON too
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Log level (error|warn|info|debug|trace) [default: `[logging].level`, else info]
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Keymap profile selectable on the command line.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ProfileArg {
    Workspace,
    Tetris,
    Midi,
    Numpad,
}

impl From<ProfileArg> for Profile {
    fn from(p: ProfileArg) -> Self {
        match p {
            ProfileArg::Workspace => Profile::Workspace,
            ProfileArg::Tetris => Profile::Tetris,
            ProfileArg::Midi => Profile::Midi,
            ProfileArg::Numpad => Profile::Numpad,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a recorded slider trace through a simulated pad
    Run {
        /// Slider trace CSV (header `raw`, one sample per scan)
        #[arg(
            long,
            value_name = "FILE",
            long_help = "Slider trace CSV (header `raw`, one sample per scan).\n\nThe slider is read on every scan, including the reset and settle delays after startup (1300 scans at the defaults), and samples read then are ignored. Once the trace is used up the slider keeps returning its last sample, so a trace shorter than that warm-up acts as one held position."
        )]
        trace: PathBuf,
        /// Stop after this many scans instead of when the trace is used up
        #[arg(long, value_name = "N")]
        scans: Option<u64>,
        /// Pace scans on the wall clock instead of simulated time
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Pace scans on the wall clock.\n\nBy default the session runs on a simulated clock: every scan advances time by one scan period without sleeping, so a long trace finishes immediately while reset delays, settle times and LED animations still see the right timing. With --realtime the loop sleeps between scans like the firmware would."
        )]
        realtime: bool,
        /// Print every action the simulated host received
        #[arg(long, action = ArgAction::SetTrue)]
        events: bool,
    },
    /// Derive the slider raw range from an end-to-end sweep
    Calibrate {
        /// Sweep CSV (header `raw`)
        #[arg(long, value_name = "FILE")]
        samples: PathBuf,
        /// Fraction of samples dropped from each end before taking min/max
        #[arg(long, value_name = "F", default_value_t = 0.01)]
        trim: f64,
        /// Write the result as a `[calibration]` TOML section to this file
        #[arg(long, value_name = "FILE")]
        write: Option<PathBuf>,
    },
    /// Validate the config (and calibration CSV when given) and build a simulated pad
    SelfCheck,
    /// Print the keymap for a profile
    Keymap {
        /// Profile to print; defaults to the configured one
        #[arg(long, value_enum)]
        profile: Option<ProfileArg>,
    },
}
