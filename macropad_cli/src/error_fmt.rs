//! Human-readable error descriptions and structured JSON error formatting.

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use macropad_core::error::{BuildError, PadError};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::Missing(what) => format!(
                "What happened: No {what} was provided to the pad.\nLikely causes: A device failed to initialize or was not wired into the builder.\nHow to fix: Pass the device via with_{what}(...) before try_build()."
            ),
            BuildError::InvalidNoteRange(msg) => format!(
                "What happened: Invalid [notes] settings ({msg}).\nLikely causes: Note, velocity or channel values outside the MIDI range.\nHow to fix: Keep notes and velocity within 0..=127 and the channel within 0..=15."
            ),
            other => format!(
                "What happened: Invalid slider settings ({other}).\nLikely causes: Out-of-range values in [slider] or a stale [calibration] section.\nHow to fix: Edit the config file or recalibrate, then run `macropad self-check`."
            ),
        };
    }

    if let Some(pe) = err.downcast_ref::<PadError>() {
        return match pe {
            PadError::Timeout => "What happened: Slider read timed out.\nLikely causes: ADC pin not wired, slider unpowered, or the trace source stalled.\nHow to fix: Verify the slider wiring and power, then rerun.".to_string(),
            PadError::Disconnected => "What happened: The host stopped accepting key actions.\nLikely causes: USB link dropped or the host went to sleep mid-burst.\nHow to fix: Reconnect the pad; the slider resynchronizes on the next motion.".to_string(),
            PadError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then run `macropad self-check`."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from config and CSV loading
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("must have header") {
        return "Invalid headers in CSV. Expected a single 'raw' column.".to_string();
    }

    if lower.starts_with("parse config") || lower.starts_with("read config") {
        let cause = err.root_cause();
        return format!(
            "What happened: Could not load the config ({msg}).\nLikely causes: Wrong path or invalid TOML ({cause}).\nHow to fix: Check --config and the file syntax; see etc/macropad.toml for a sample."
        );
    }

    if lower.contains(" must be ") || lower.contains("unreasonably large") {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file and try again."
        );
    }

    if lower.contains("calibration") {
        return format!(
            "What happened: Calibration failed ({msg}).\nLikely causes: The sweep did not cover the slider travel or the file is too short.\nHow to fix: Record a full end-to-end sweep and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable name for the error class, used in JSON output.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    use macropad_core::error::{BuildError, PadError};
    if err.downcast_ref::<BuildError>().is_some() {
        return "Build";
    }
    match err.downcast_ref::<PadError>() {
        Some(PadError::Timeout) => "Timeout",
        Some(PadError::Disconnected) => "Disconnected",
        Some(PadError::Hardware(_) | PadError::HardwareFault(_)) => "Hardware",
        Some(PadError::Config(_)) => "Config",
        None => "Error",
    }
}

/// Map typed errors to stable exit codes; everything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match reason_name(err) {
        "Build" | "Config" => 3,
        "Timeout" => 4,
        "Disconnected" => 5,
        "Hardware" => 6,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
