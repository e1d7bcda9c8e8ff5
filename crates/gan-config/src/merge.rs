//! Validate and merge a parsed inline `gan-config` table over a prior
//! `SessionConfig` (spec §4.1 "inline config parsing", §8 boundary
//! behaviors). Unknown keys are ignored; recognized keys are validated
//! and clamped individually so one bad field never discards the rest.

use gan_core::{ConfigMergeOutcome, Scope, SessionConfig};
use toml::Value;
use tracing::warn;

/// Merge an optional parsed inline-config table over `prior`. `inline =
/// None` (no block present, or the block failed to parse) returns
/// `prior` unchanged with no warnings.
pub fn merge_inline_over_session(
    prior: &SessionConfig,
    inline: Option<&toml::Table>,
) -> ConfigMergeOutcome {
    let Some(table) = inline else {
        return ConfigMergeOutcome {
            config: prior.clone(),
            warnings: Vec::new(),
        };
    };

    let mut cfg = prior.clone();
    let mut warnings = Vec::new();

    if let Some(Value::String(s)) = table.get("task") {
        if !s.trim().is_empty() {
            cfg.task = s.clone();
        }
    }

    if let Some(Value::String(s)) = table.get("scope") {
        match s.parse::<Scope>() {
            Ok(scope) => cfg.scope = scope,
            Err(_) => {
                let msg = format!(
                    "invalid scope '{s}'; falling back to prior value '{}'",
                    prior.scope
                );
                warn!("{msg}");
                warnings.push(msg);
            }
        }
    }

    if let Some(Value::Array(arr)) = table.get("paths") {
        cfg.paths = arr
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect();
    }

    // Checked against the final merged state, not just this call's own
    // fields — a prior cycle may have set scope=paths and this one only
    // clears `paths`, which must still trigger the downgrade.
    if cfg.scope == Scope::Paths && cfg.paths.is_empty() {
        cfg.scope = Scope::Workspace;
        let msg = "scope=paths requires a non-empty 'paths' array; downgraded to scope=workspace";
        warn!("{msg}");
        warnings.push(msg.to_string());
    }

    if let Some(v) = table.get("threshold") {
        if let Some(i) = v.as_integer() {
            cfg.threshold = i.clamp(0, 100) as u8;
        } else {
            warnings.push("'threshold' must be an integer; keeping prior value".to_string());
        }
    }

    if let Some(v) = table.get("maxCycles") {
        if let Some(i) = v.as_integer() {
            cfg.max_cycles = i.max(1) as u32;
        } else {
            warnings.push("'maxCycles' must be an integer; keeping prior value".to_string());
        }
    }

    if let Some(v) = table.get("candidates") {
        if let Some(i) = v.as_integer() {
            cfg.candidates = i.max(1) as u32;
        } else {
            warnings.push("'candidates' must be an integer; keeping prior value".to_string());
        }
    }

    if let Some(Value::Array(arr)) = table.get("judges") {
        let judges: Vec<String> = arr
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect();
        if !judges.is_empty() {
            cfg.judges = judges;
        }
    }

    if let Some(v) = table.get("applyFixes") {
        if let Some(b) = v.as_bool() {
            cfg.apply_fixes = b;
        } else {
            warnings.push("'applyFixes' must be a boolean; keeping prior value".to_string());
        }
    }

    ConfigMergeOutcome {
        config: cfg,
        warnings,
    }
}
