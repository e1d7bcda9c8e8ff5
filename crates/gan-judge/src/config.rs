//! Configuration driving executable discovery and invocation. Populated
//! by `gan-config` from environment variables; defaults here are
//! conservative values for each tunable.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Explicit executable path; bypasses PATH/extra-dir scanning.
    pub executable_override: Option<PathBuf>,
    /// Name to search for on PATH/extra directories when no override is set.
    pub executable_name: String,
    /// Additional directories scanned after PATH.
    pub extra_search_dirs: Vec<PathBuf>,
    /// Explicit working-directory override.
    pub working_dir_override: Option<PathBuf>,
    /// Extra args appended after the fixed invocation arguments.
    pub extra_args: Vec<String>,
    /// Environment variables overlaid on top of the allow-listed copy.
    pub env_overlay: HashMap<String, String>,
    /// Per-call timeout handed to the Process Manager.
    pub timeout: Duration,
    /// Max retries for transient errors.
    pub max_retries: u32,
    /// MUST be false in production; rejected at `JudgeRuntime::new`.
    pub allow_mock_fallback: bool,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            executable_override: None,
            executable_name: "codex".to_string(),
            extra_search_dirs: Vec::new(),
            working_dir_override: None,
            extra_args: Vec::new(),
            env_overlay: HashMap::new(),
            timeout: Duration::from_secs(30),
            max_retries: 1,
            allow_mock_fallback: false,
        }
    }
}

/// Environment variables the ambient environment is allowed to pass
/// through to the judge process untouched.
pub const ALLOWED_ENV_VARS: &[&str] = &["PATH", "HOME", "USER", "SHELL", "LANG"];
