//! Judge Runtime: translates an `AuditRequest` into a judge invocation
//! and a normalized `Verdict`.

pub mod config;
pub mod discovery;
pub mod invoke;
pub mod parse;
pub mod prompt;
pub mod retry;

use std::sync::Arc;
use std::time::Duration;

use gan_core::{AuditRequest, GanError, Verdict};
use gan_process::ProcessManager;
use tracing::warn;

pub use config::JudgeConfig;
pub use discovery::DiscoveredJudge;

/// Result of one successful judge call: the normalized verdict plus any
/// non-fatal warnings accumulated along the way. Missing required fields
/// in the judge's response produce warnings, not errors.
#[derive(Debug, Clone)]
pub struct JudgeOutcome {
    pub verdict: Verdict,
    pub warnings: Vec<String>,
}

/// Owns judge executable discovery, invocation via the Process Manager,
/// and response parsing/retry. One runtime is shared across all audit
/// cycles; the process-wide concurrency bound lives in the
/// `ProcessManager` it holds, not here.
pub struct JudgeRuntime {
    config: JudgeConfig,
    process_manager: Arc<ProcessManager>,
}

impl JudgeRuntime {
    /// Construct a runtime. Rejects configurations that would allow a
    /// synthetic fallback verdict to stand in for a real judge call.
    pub fn new(config: JudgeConfig, process_manager: Arc<ProcessManager>) -> Result<Self, GanError> {
        if config.allow_mock_fallback {
            return Err(GanError::InvalidInlineConfig(
                "allow_mock_fallback is not permitted; the judge must fail fast when unavailable"
                    .to_string(),
            ));
        }
        Ok(Self {
            config,
            process_manager,
        })
    }

    /// Run one audit cycle end to end: discover the executable, assemble
    /// the prompt, invoke it under retry, and parse the response.
    pub async fn run(&self, request: &AuditRequest) -> Result<JudgeOutcome, GanError> {
        let discovered = discovery::discover(&self.config).await?;
        let document = prompt::assemble(request);

        let mut attempt: u32 = 0;
        loop {
            let result =
                invoke::invoke(&discovered, &document, &self.config, &self.process_manager).await;

            match result {
                Ok(outcome) if outcome.timed_out => {
                    return Err(GanError::JudgeTimeout {
                        elapsed_ms: outcome.duration.as_millis() as u64,
                    });
                }
                Ok(outcome) if outcome.exit_code != 0 => {
                    let stdout = String::from_utf8_lossy(&outcome.stdout).into_owned();
                    let stderr = String::from_utf8_lossy(&outcome.stderr).into_owned();
                    let transient = retry::is_transient(&stdout, &stderr, outcome.exit_code);
                    if transient && attempt < self.config.max_retries {
                        attempt += 1;
                        let backoff = Duration::from_secs(2u64.saturating_pow(attempt));
                        warn!(
                            attempt,
                            backoff_secs = backoff.as_secs(),
                            "retrying transient judge failure"
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    return Err(GanError::JudgeExecution {
                        exit_code: outcome.exit_code,
                        stderr,
                    });
                }
                Ok(outcome) => {
                    let stdout = String::from_utf8_lossy(&outcome.stdout).into_owned();
                    let (verdict, warnings) = parse::parse_response(
                        &stdout,
                        &request.rubric,
                        request.system_prompt.is_some(),
                    );
                    return Ok(JudgeOutcome { verdict, warnings });
                }
                Err(gan_process::ProcessError::QueueTimeout(d)) => {
                    return Err(GanError::QueueTimeout(d.as_millis() as u64));
                }
                Err(gan_process::ProcessError::ShutDown) => {
                    return Err(GanError::ManagerShutdown);
                }
                Err(gan_process::ProcessError::Spawn(_)) => {
                    return Err(GanError::JudgeUnavailable);
                }
            }
        }
    }
}
