//! Human-readable error descriptions and structured JSON error formatting.

use sprayer_core::error::{BuildError, SprayError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingGeometry => {
                "What happened: No machine geometry was provided to the program assembler.\nLikely causes: The [geometry] section was not mapped into the builder.\nHow to fix: Ensure the configuration has a [geometry] section and is passed via with_geometry(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/sprayer.toml for a sample."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<SprayError>() {
        return match se {
            SprayError::Validation(msg) => format!(
                "What happened: The spray parameters were rejected ({msg}).\nLikely causes: A zero or negative pitch/speed, a solution port that is not configured, or too many cycles for the work area.\nHow to fix: Adjust --distance/--speed/--cycles/--solution and rerun; `sprayer plan` shows the derived dose without writing a program."
            ),
            SprayError::Capacity {
                quantity: "program commands",
                value,
                limit,
            } => format!(
                "What happened: The program would need about {value:.0} commands, over the limit of {limit:.0}.\nLikely causes: A very fine pitch combined with many cycles.\nHow to fix: Raise --distance or lower --cycles, or raise output.max_commands in the config."
            ),
            SprayError::Capacity {
                quantity,
                value,
                limit,
            } => format!(
                "What happened: {quantity} of {value:.3} exceeds the syringe limit of {limit:.3}.\nLikely causes: High flow, low speed, or a fine pitch drawing more than one syringe per cycle.\nHow to fix: Lower --flow, raise --speed or --distance, or split the dose over more --cycles."
            ),
        };
    }

    // String-based heuristics for errors coming from config or I/O
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    // Calibration CSV header special-case
    if lower.contains("calibration csv must have headers") {
        return "Invalid headers in calibration CSV. Expected 'travel,volume'.".to_string();
    }

    if lower.contains("read config") || lower.contains("parse config") {
        return format!(
            "What happened: Could not load the configuration.\nLikely causes: Wrong --config path or a TOML syntax error.\nHow to fix: Check the file exists and is valid TOML. Original: {msg}"
        );
    }

    if lower.contains("valves") {
        return format!(
            "What happened: The valve layout is inconsistent ({msg}).\nLikely causes: Two roles share a port, or a solution port overlaps waste/wash/head.\nHow to fix: Edit the [valves] section so every port has exactly one role."
        );
    }

    if lower.contains(" must ") {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: Out-of-range values in the TOML or calibration data.\nHow to fix: Edit the named key and rerun `sprayer self-check`."
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

/// Stable exit codes: validation 2, capacity 3, anything else 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<SprayError>() {
        Some(SprayError::Validation(_)) => 2,
        Some(SprayError::Capacity { .. }) => 3,
        None => 1,
    }
}

/// Stable reason name for JSON consumers.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(se) = err.downcast_ref::<SprayError>() {
        return match se {
            SprayError::Validation(_) => "Validation",
            SprayError::Capacity { .. } => "Capacity",
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "InvalidConfig";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    if let Some(SprayError::Capacity {
        quantity,
        value,
        limit,
    }) = err.downcast_ref::<SprayError>()
    {
        return json!({
            "reason": reason_name(err),
            "details": { "quantity": quantity, "value": value, "limit": limit },
            "message": humanize(err),
        })
        .to_string();
    }

    json!({ "reason": reason_name(err), "message": humanize(err) }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        let v = eyre::Report::new(SprayError::Validation("distance must be > 0".into()));
        let c = eyre::Report::new(SprayError::Capacity {
            quantity: "volume per cycle",
            value: 250.0,
            limit: 200.0,
        });
        let other = eyre::eyre!("read config foo.toml: not found");
        assert_eq!(exit_code_for_error(&v), 2);
        assert_eq!(exit_code_for_error(&c), 3);
        assert_eq!(exit_code_for_error(&other), 1);
    }

    #[test]
    fn oversized_program_names_the_command_cap() {
        let c = eyre::Report::new(SprayError::Capacity {
            quantity: "program commands",
            value: 2.0e10,
            limit: 1.0e6,
        });
        assert!(humanize(&c).contains("output.max_commands"));
        assert_eq!(exit_code_for_error(&c), 3);
    }

    #[test]
    fn capacity_json_carries_details() {
        let c = eyre::Report::new(SprayError::Capacity {
            quantity: "volume per cycle",
            value: 250.0,
            limit: 200.0,
        });
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&c)).unwrap();
        assert_eq!(v["reason"], "Capacity");
        assert_eq!(v["details"]["limit"], 200.0);
        assert!(v["message"].as_str().unwrap().contains("What happened"));
    }
}
