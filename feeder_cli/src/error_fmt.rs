//! Human-readable error descriptions and structured JSON error formatting.

use feeder_core::error::{BuildError, ControlError};

/// Map an eyre::Report to a human-readable explanation with likely causes
/// and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML or on the command line.\nHow to fix: Edit the config file (or flag), then rerun. See README for a sample."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<ControlError>() {
        return match ce {
            ControlError::Hardware(_) | ControlError::HardwareFault(_) => format!(
                "What happened: {ce}.\nLikely causes: H-bridge or GPIO failed to respond, or the [pins] wiring is wrong.\nHow to fix: Verify pin assignments, power and wiring, then rerun."
            ),
            ControlError::Sensor(_) => format!(
                "What happened: {ce}.\nLikely causes: Encoder disconnected or the decoder driver returned an invalid reading.\nHow to fix: Check the encoder wiring and the decoder configuration."
            ),
            _ => format!(
                "What happened: {ce}.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: invalid config 2, hardware 3, sensor 4, other errors 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    match err.downcast_ref::<ControlError>() {
        Some(ControlError::Hardware(_) | ControlError::HardwareFault(_)) => 3,
        Some(ControlError::Sensor(_)) => 4,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = if err.downcast_ref::<BuildError>().is_some() {
        "InvalidConfig"
    } else {
        match err.downcast_ref::<ControlError>() {
            Some(ControlError::Hardware(_)) => "Hardware",
            Some(ControlError::HardwareFault(_)) => "HardwareFault",
            Some(ControlError::Sensor(_)) => "Sensor",
            Some(ControlError::Config(_)) => "Config",
            Some(ControlError::State(_)) => "State",
            None => "Error",
        }
    };
    json!({ "reason": reason, "message": humanize(err) }).to_string()
}
