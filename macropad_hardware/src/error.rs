use thiserror::Error;

/// Failures reported by the simulated devices, shaped like the firmware's.
#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("adc conversion timeout")]
    Timeout,
    #[error("usb host disconnected")]
    Disconnected,
}
