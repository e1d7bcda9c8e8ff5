//! Executable discovery: working directory resolution, allow-listed
//! environment preparation, PATH/extra-dir executable scanning, and a
//! best-effort version probe.

use crate::config::{ALLOWED_ENV_VARS, JudgeConfig};
use gan_core::GanError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

const MAX_REPO_ROOT_WALK: usize = 10;
const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct DiscoveredJudge {
    pub executable: PathBuf,
    pub working_dir: PathBuf,
    pub env: HashMap<String, String>,
    pub version: Option<String>,
}

/// Run the full discovery algorithm against `config`.
pub async fn discover(config: &JudgeConfig) -> Result<DiscoveredJudge, GanError> {
    let working_dir = resolve_working_dir(config);
    let env = prepare_environment(config)?;
    let executable = locate_executable(config, &working_dir)?;
    let version = probe_version(&executable).await;

    Ok(DiscoveredJudge {
        executable,
        working_dir,
        env,
        version,
    })
}

/// Explicit override → nearest enclosing repo root → current directory →
/// configured default. First candidate that exists and is a directory wins.
fn resolve_working_dir(config: &JudgeConfig) -> PathBuf {
    if let Some(dir) = &config.working_dir_override {
        if dir.is_dir() {
            return dir.clone();
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(root) = find_repo_root(&cwd, MAX_REPO_ROOT_WALK) {
            return root;
        }
        return cwd;
    }
    PathBuf::from(".")
}

fn find_repo_root(start: &Path, max_depth: usize) -> Option<PathBuf> {
    let mut current = start;
    for _ in 0..=max_depth {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
    None
}

fn prepare_environment(config: &JudgeConfig) -> Result<HashMap<String, String>, GanError> {
    let mut env = HashMap::new();
    for key in ALLOWED_ENV_VARS {
        if let Ok(value) = std::env::var(key) {
            env.insert(key.to_string(), value);
        }
    }
    for (key, value) in &config.env_overlay {
        env.insert(key.clone(), value.clone());
    }
    if !env.contains_key("PATH") {
        return Err(GanError::JudgeUnavailable);
    }
    Ok(env)
}

fn locate_executable(config: &JudgeConfig, working_dir: &Path) -> Result<PathBuf, GanError> {
    if let Some(path) = &config.executable_override {
        return if is_executable(path) {
            Ok(path.clone())
        } else {
            Err(GanError::JudgeUnavailable)
        };
    }

    let path_var = std::env::var("PATH").unwrap_or_default();
    let extra = config
        .extra_search_dirs
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(":");
    let search_path = if extra.is_empty() {
        path_var
    } else if path_var.is_empty() {
        extra
    } else {
        format!("{path_var}:{extra}")
    };

    which::which_in(&config.executable_name, Some(search_path), working_dir)
        .map_err(|_| GanError::JudgeUnavailable)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

async fn probe_version(executable: &Path) -> Option<String> {
    let probe = tokio::process::Command::new(executable)
        .arg("--version")
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::null())
        .output();

    match tokio::time::timeout(VERSION_PROBE_TIMEOUT, probe).await {
        Ok(Ok(output)) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if version.is_empty() { None } else { Some(version) }
        }
        Ok(Ok(_)) => {
            warn!("judge executable did not report a version");
            None
        }
        Ok(Err(e)) => {
            warn!(error = %e, "failed to probe judge version");
            None
        }
        Err(_) => {
            warn!("judge version probe timed out");
            None
        }
    }
}
