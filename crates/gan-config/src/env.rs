//! Environment-variable configuration recognized by the service (spec
//! §6), excluding the tiered-completion variables (see [`crate::tiers`]).

use std::collections::HashMap;

/// Master switch plus judge/process tunables and the production-policy
/// flags that gate fail-fast behavior (spec §4.3 "Production policy").
#[derive(Clone, Debug, PartialEq)]
pub struct EnvConfig {
    pub enable_gan_auditing: bool,
    pub judge_executable: Option<String>,
    pub judge_executable_paths: Vec<String>,
    pub timeout_ms: u64,
    pub max_concurrent_processes: usize,
    pub process_cleanup_timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub fail_fast: bool,
    pub allow_mock_fallback: bool,
    pub require_available: bool,
    pub validate_on_startup: bool,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            enable_gan_auditing: true,
            judge_executable: None,
            judge_executable_paths: Vec::new(),
            timeout_ms: 30_000,
            max_concurrent_processes: 4,
            process_cleanup_timeout_ms: 5_000,
            max_retries: 1,
            retry_delay_ms: 2_000,
            fail_fast: true,
            allow_mock_fallback: false,
            require_available: true,
            validate_on_startup: true,
        }
    }
}

impl EnvConfig {
    /// Build from a map of environment-variable-style keys. Missing or
    /// unparseable values fall back to the field's default.
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let d = Self::default();
        Self {
            enable_gan_auditing: parse_bool(map, "ENABLE_GAN_AUDITING", d.enable_gan_auditing),
            judge_executable: map.get("CODEX_EXECUTABLE").cloned(),
            judge_executable_paths: map
                .get("CODEX_EXECUTABLE_PATHS")
                .map(|v| v.split(':').filter(|s| !s.is_empty()).map(str::to_string).collect())
                .unwrap_or_default(),
            timeout_ms: parse_u64(map, "CODEX_TIMEOUT", d.timeout_ms),
            max_concurrent_processes: parse_usize(
                map,
                "CODEX_MAX_CONCURRENT_PROCESSES",
                d.max_concurrent_processes,
            ),
            process_cleanup_timeout_ms: parse_u64(
                map,
                "CODEX_PROCESS_CLEANUP_TIMEOUT",
                d.process_cleanup_timeout_ms,
            ),
            max_retries: parse_u32(map, "CODEX_MAX_RETRIES", d.max_retries),
            retry_delay_ms: parse_u64(map, "CODEX_RETRY_DELAY", d.retry_delay_ms),
            fail_fast: parse_bool(map, "CODEX_FAIL_FAST", d.fail_fast),
            allow_mock_fallback: parse_bool(
                map,
                "CODEX_ALLOW_MOCK_FALLBACK",
                d.allow_mock_fallback,
            ),
            require_available: parse_bool(map, "CODEX_REQUIRE_AVAILABLE", d.require_available),
            validate_on_startup: parse_bool(
                map,
                "CODEX_VALIDATE_ON_STARTUP",
                d.validate_on_startup,
            ),
        }
    }

    pub fn from_env() -> Self {
        Self::from_map(&std::env::vars().collect())
    }

    /// Spec §4.3/§6: `CODEX_FAIL_FAST` must be true, `CODEX_ALLOW_MOCK_FALLBACK`
    /// must be false, `CODEX_REQUIRE_AVAILABLE`/`CODEX_VALIDATE_ON_STARTUP`
    /// must be true in production. Returns the list of violated policies;
    /// an empty vec means the configuration is production-safe.
    pub fn production_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if !self.fail_fast {
            violations.push("CODEX_FAIL_FAST must be true in production".to_string());
        }
        if self.allow_mock_fallback {
            violations.push("CODEX_ALLOW_MOCK_FALLBACK must be false in production".to_string());
        }
        if !self.require_available {
            violations.push("CODEX_REQUIRE_AVAILABLE must be true in production".to_string());
        }
        if !self.validate_on_startup {
            violations.push("CODEX_VALIDATE_ON_STARTUP must be true in production".to_string());
        }
        violations
    }
}

fn parse_bool(map: &HashMap<String, String>, key: &str, default: bool) -> bool {
    map.get(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

fn parse_u64(map: &HashMap<String, String>, key: &str, default: u64) -> u64 {
    map.get(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_u32(map: &HashMap<String, String>, key: &str, default: u32) -> u32 {
    map.get(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_usize(map: &HashMap<String, String>, key: &str, default: usize) -> usize {
    map.get(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}
