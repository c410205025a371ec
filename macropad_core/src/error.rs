use thiserror::Error;

/// Runtime failures reported by collaborators during a scan.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PadError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("host disconnected")]
    Disconnected,
}

/// Construction-time validation failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    #[error("invalid raw range: max ({max}) must be greater than min ({min})")]
    InvalidRange { min: i32, max: i32 },
    #[error("output_steps must be >= 1")]
    ZeroSteps,
    #[error("output_steps {0} exceeds the per-scan emission bound of 1000")]
    TooManySteps(u32),
    #[error("deadband {deadband} must be smaller than output_steps {steps}")]
    DeadbandTooWide { deadband: u32, steps: u32 },
    #[error("EMA alpha {0} must be in (0.0, 1.0]")]
    InvalidSmoothing(f32),
    #[error("invalid note range: {0}")]
    InvalidNoteRange(&'static str),
    #[error("missing {0}")]
    Missing(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
