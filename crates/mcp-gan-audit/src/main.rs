//! Process entrypoint: newline-delimited JSON transport over stdio.
//!
//! Reads one Thought object per line from stdin, dispatches it to the
//! Audit Orchestrator, and writes one success or error object per line
//! to stdout. Tracing goes to stderr so it never corrupts the stdout
//! framing, mirroring `mcp_server::run_mcp_server`'s stdio discipline.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use gan_config::{EnvConfig, TierLadder};
use gan_core::{GanError, Thought, classify};
use gan_judge::{JudgeConfig, JudgeRuntime};
use gan_orchestrator::{GitDiffContextBuilder, Orchestrator};
use gan_process::{ProcessManager, ProcessManagerConfig};
use gan_session::SessionStore;
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Serialize)]
struct ErrorDetails {
    category: String,
    recoverable: bool,
    suggestions: Vec<String>,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: String,
    status: &'static str,
    details: ErrorDetails,
}

fn envelope_for(err: &GanError) -> ErrorEnvelope {
    let classification = classify(err);
    ErrorEnvelope {
        error: err.to_string(),
        status: "failed",
        details: ErrorDetails {
            category: classification.category.to_string(),
            recoverable: classification.recoverable,
            suggestions: classification.suggestions,
        },
    }
}

fn malformed_request_envelope(detail: &str) -> ErrorEnvelope {
    ErrorEnvelope {
        error: format!("malformed request: {detail}"),
        status: "failed",
        details: ErrorDetails {
            category: "config".to_string(),
            recoverable: true,
            suggestions: vec![
                "Send one JSON object per line matching the documented Thought input shape"
                    .to_string(),
            ],
        },
    }
}

fn write_line(out: &mut impl Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer(&mut *out, value).context("failed to serialize response")?;
    out.write_all(b"\n").context("failed to write newline to stdout")?;
    out.flush().context("failed to flush stdout")?;
    Ok(())
}

fn judge_config_from_env(env: &EnvConfig) -> JudgeConfig {
    let mut config = JudgeConfig::default();
    if let Some(executable) = &env.judge_executable {
        config.executable_override = Some(PathBuf::from(executable));
    }
    config.extra_search_dirs = env.judge_executable_paths.iter().map(PathBuf::from).collect();
    config.timeout = Duration::from_millis(env.timeout_ms);
    config.max_retries = env.max_retries;
    config.allow_mock_fallback = env.allow_mock_fallback;
    config
}

fn process_manager_config_from_env(env: &EnvConfig) -> ProcessManagerConfig {
    let mut config = ProcessManagerConfig::default();
    config.max_concurrent = env.max_concurrent_processes;
    config.default_timeout_ms = env.timeout_ms;
    config.cleanup_grace_ms = env.process_cleanup_timeout_ms;
    config
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let env = EnvConfig::from_env();
    let ladder = TierLadder::from_env();

    if env.validate_on_startup {
        for violation in env.production_violations() {
            warn!("{violation}");
        }
    }

    let cwd = std::env::current_dir().context("failed to determine current working directory")?;
    let user = current_user();

    let process_manager = Arc::new(ProcessManager::new(process_manager_config_from_env(&env)));
    let judge_config = judge_config_from_env(&env);

    if env.validate_on_startup && env.require_available {
        if let Err(e) = gan_judge::discovery::discover(&judge_config).await {
            error!("judge executable is unavailable at startup: {e}");
            return Err(e.into());
        }
    }

    let judge = JudgeRuntime::new(judge_config, process_manager.clone())
        .context("judge runtime rejected its configuration")?;

    let store = SessionStore::new(SessionStore::default_dir(&cwd));
    let context_builder = Arc::new(GitDiffContextBuilder::new(process_manager, cwd.clone()));
    let orchestrator = Orchestrator::new(env, ladder, store, judge, context_builder, cwd, user);

    info!("mcp-gan-audit ready, reading thoughts from stdin");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    for line in stdin.lock().lines() {
        let line = line.context("failed to read line from stdin")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let thought: Thought = match serde_json::from_str(trimmed) {
            Ok(t) => t,
            Err(e) => {
                write_line(&mut stdout, &malformed_request_envelope(&e.to_string()))?;
                continue;
            }
        };

        match orchestrator.process(thought).await {
            Ok(response) => write_line(&mut stdout, &response)?,
            Err(e) => {
                error!("audit cycle failed: {e}");
                write_line(&mut stdout, &envelope_for(&e))?;
            }
        }
    }

    info!("mcp-gan-audit shutting down");
    Ok(())
}
