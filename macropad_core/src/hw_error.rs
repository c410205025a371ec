//! Maps `Box<dyn Error>` from trait boundaries to typed `PadError`.
//!
//! The traits in `macropad_traits` use `Box<dyn Error + Send + Sync>` so any
//! backend can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `macropad_hardware::HwError`.

use crate::error::PadError;

/// Map a trait-boundary error to a typed `PadError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> PadError {
    #[cfg(feature = "hardware-errors")]
    {
        use macropad_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout => PadError::Timeout,
                HwError::Disconnected => PadError::Disconnected,
                other => PadError::HardwareFault(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("timeout") {
        PadError::Timeout
    } else if lower.contains("disconnect") {
        PadError::Disconnected
    } else {
        PadError::Hardware(s)
    }
}

/// Convert a boxed collaborator error into an `eyre::Report` carrying a `PadError`.
pub(crate) fn to_report(e: &(dyn std::error::Error + Send + Sync + 'static)) -> eyre::Report {
    eyre::Report::new(map_hw_error(e))
}
