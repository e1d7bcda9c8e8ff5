//! Context Builder: gathers a bounded, truncatable "context pack" for
//! the Judge Runtime. Modeled as a trait so any caller may plug in a
//! richer implementation; [`GitDiffContextBuilder`] is the default,
//! runnable-standalone implementation, built on `git` via the Process
//! Manager so context gathering shares the same bounded-concurrency,
//! timeout-bearing subprocess path as judge invocation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gan_core::{GanError, Scope};
use gan_process::{ExecuteSpec, ProcessError, ProcessManager};

const APPROX_CHARS_PER_TOKEN: usize = 4;
const GIT_TIMEOUT: Duration = Duration::from_secs(10);
const TRUNCATION_MARKER: &str = "\n\n[... context truncated to fit token budget ...]\n";

#[async_trait]
pub trait ContextBuilder: Send + Sync {
    /// Build a context pack bounded to roughly `token_budget` tokens.
    async fn build(&self, scope: Scope, paths: &[String], token_budget: usize) -> Result<String, GanError>;
}

/// Default `ContextBuilder`: `git status --short` as a header (always
/// kept intact), plus a scope-dependent body, truncated from the tail
/// to fit the token budget.
pub struct GitDiffContextBuilder {
    process_manager: Arc<ProcessManager>,
    repo_root: PathBuf,
}

impl GitDiffContextBuilder {
    pub fn new(process_manager: Arc<ProcessManager>, repo_root: PathBuf) -> Self {
        Self { process_manager, repo_root }
    }

    async fn run_git(&self, args: &[&str]) -> Result<String, GanError> {
        let spec = ExecuteSpec {
            executable: PathBuf::from("git"),
            args: args.iter().map(|s| s.to_string()).collect(),
            cwd: Some(self.repo_root.clone()),
            env: std::env::vars().collect(),
            stdin: None,
            timeout: GIT_TIMEOUT,
        };
        let outcome = self.process_manager.execute(spec).await.map_err(|e| match e {
            ProcessError::Spawn(detail) => GanError::FileNotFound(format!("git: {detail}")),
            ProcessError::QueueTimeout(d) => GanError::QueueTimeout(d.as_millis() as u64),
            ProcessError::ShutDown => GanError::ManagerShutdown,
        })?;
        if outcome.exit_code != 0 {
            return Err(GanError::FileNotFound(format!(
                "git {} exited with {}",
                args.join(" "),
                outcome.exit_code
            )));
        }
        Ok(String::from_utf8_lossy(&outcome.stdout).into_owned())
    }

    fn read_paths(&self, paths: &[String]) -> String {
        let mut out = String::new();
        for path in paths {
            let full = self.repo_root.join(path);
            match std::fs::read_to_string(&full) {
                Ok(contents) => {
                    out.push_str(&format!("=== {path} ===\n"));
                    out.push_str(&contents);
                    out.push('\n');
                }
                Err(e) => {
                    out.push_str(&format!("=== {path} (unreadable: {e}) ===\n"));
                }
            }
        }
        out
    }
}

#[async_trait]
impl ContextBuilder for GitDiffContextBuilder {
    async fn build(&self, scope: Scope, paths: &[String], token_budget: usize) -> Result<String, GanError> {
        let header = self.run_git(&["status", "--short"]).await.unwrap_or_default();
        let body = match scope {
            Scope::Diff => self.run_git(&["diff"]).await?,
            Scope::Workspace => self.run_git(&["ls-files"]).await?,
            Scope::Paths => self.read_paths(paths),
        };
        let max_chars = token_budget.saturating_mul(APPROX_CHARS_PER_TOKEN);
        Ok(truncate_tail(&header, &body, max_chars))
    }
}

/// Minimal context pack used when the Context Builder fails: continue
/// with a minimal context (a bare header, no diff body).
pub fn minimal_context(header: &str) -> String {
    header.to_string()
}

fn truncate_tail(header: &str, body: &str, max_chars: usize) -> String {
    let combined_len = header.len() + 2 + body.len();
    if combined_len <= max_chars {
        return format!("{header}\n\n{body}");
    }
    let reserved = header.len() + 2 + TRUNCATION_MARKER.len();
    let body_budget = max_chars.saturating_sub(reserved);
    let cut = floor_char_boundary(body, body_budget.min(body.len()));
    format!("{header}\n\n{}{TRUNCATION_MARKER}", &body[..cut])
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    if idx >= s.len() {
        return s.len();
    }
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_tail_keeps_everything_when_under_budget() {
        let result = truncate_tail("HEADER", "short body", 1000);
        assert_eq!(result, "HEADER\n\nshort body");
    }

    #[test]
    fn test_truncate_tail_keeps_header_and_truncates_body() {
        let body = "a".repeat(1000);
        let result = truncate_tail("HEADER", &body, 100);
        assert!(result.starts_with("HEADER\n\n"));
        assert!(result.contains("truncated"));
        assert!(result.len() <= 100 + TRUNCATION_MARKER.len() + 8);
    }

    #[test]
    fn test_truncate_tail_respects_utf8_boundaries() {
        let body = "é".repeat(200);
        let result = truncate_tail("H", &body, 50);
        assert!(std::str::from_utf8(result.as_bytes()).is_ok());
    }

    #[test]
    fn test_minimal_context_is_header_only() {
        assert_eq!(minimal_context("git header"), "git header");
    }
}
