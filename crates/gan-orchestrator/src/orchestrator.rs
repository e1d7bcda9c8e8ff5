//! Audit Orchestrator: the single entry point tying trigger detection,
//! session resolution, inline-config merge, context building, and judge
//! invocation into one audit cycle per incoming thought.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use gan_config::{EnvConfig, TierLadder, merge_inline_over_session};
use gan_core::{Budget, CombinedResponse, GanError, Scope, SessionConfig, SessionState, Thought, VerdictTag};
use gan_judge::JudgeRuntime;
use gan_session::SessionStore;
use tracing::{debug, warn};

use crate::completion;
use crate::context::ContextBuilder;
use crate::locks::SessionLocks;
use crate::rubric::default_rubric;
use crate::session_key::resolve_session_key;
use crate::stagnation;
use crate::trigger::has_trigger;

/// Everything the Orchestrator needs to run one audit cycle, assembled
/// once at startup and shared across every call.
pub struct Orchestrator {
    env: EnvConfig,
    ladder: TierLadder,
    store: SessionStore,
    judge: JudgeRuntime,
    context_builder: Arc<dyn ContextBuilder>,
    locks: SessionLocks,
    cwd: PathBuf,
    user: String,
}

impl Orchestrator {
    pub fn new(
        env: EnvConfig,
        ladder: TierLadder,
        store: SessionStore,
        judge: JudgeRuntime,
        context_builder: Arc<dyn ContextBuilder>,
        cwd: PathBuf,
        user: String,
    ) -> Self {
        Self {
            env,
            ladder,
            store,
            judge,
            context_builder,
            locks: SessionLocks::new(),
            cwd,
            user,
        }
    }

    /// Run one audit cycle for `thought`. Returns `Err` only for judge
    /// faults, which propagate and are never synthesized into a passing
    /// verdict; every other failure mode degrades gracefully and is
    /// surfaced as a warning on the response.
    pub async fn process(&self, thought: Thought) -> Result<CombinedResponse, GanError> {
        let mut baseline = CombinedResponse {
            thought_number: thought.thought_number,
            total_thoughts: thought.total_thoughts,
            next_thought_needed: thought.next_thought_needed,
            branches: thought.branch_id.clone().into_iter().collect(),
            thought_history_length: 0,
            session_id: None,
            gan: None,
            termination_reason: None,
            warnings: Vec::new(),
        };

        if !self.env.enable_gan_auditing || !has_trigger(&thought.thought) {
            return Ok(baseline);
        }

        let session_key = resolve_session_key(
            thought.branch_id.as_deref(),
            &self.cwd,
            &self.user,
            Utc::now(),
        );
        let lock = self.locks.get_or_create(&session_key);
        let _guard = lock.lock().await;

        let mut warnings = Vec::new();

        let mut session = match self.store.load(&session_key) {
            Ok(Some(existing)) => existing,
            Ok(None) => SessionState::new(session_key.clone(), SessionConfig::default()),
            Err(GanError::SessionCorrupted(_)) => {
                warnings.push(format!(
                    "session '{session_key}' state was corrupted; starting a fresh session"
                ));
                SessionState::new(session_key.clone(), SessionConfig::default())
            }
            Err(other) => return Err(other),
        };

        let inline = gan_config::inline::extract_and_parse(&thought.thought);
        let merge_outcome = merge_inline_over_session(&session.config, inline.as_ref());
        session.config = merge_outcome.config;
        warnings.extend(merge_outcome.warnings);

        if let Err(e) = self.store.save(&session_key, &session) {
            warnings.push(format!("session '{session_key}' could not be persisted: {e}"));
        }

        let loop_number = session.loop_count() + 1;
        if loop_number > session.config.max_cycles {
            debug!(
                session_key,
                loop_number,
                max_cycles = session.config.max_cycles,
                "loop count exceeds configured maxCycles (advisory only)"
            );
        }

        let candidate = thought.thought.clone();
        let context_pack = match self
            .context_builder
            .build(session.config.scope, &session.config.paths, context_token_budget())
            .await
        {
            Ok(pack) => pack,
            Err(e) => {
                warn!(session_key, error = %e, "context build failed; continuing with minimal context");
                warnings.push(format!("context gathering failed ({e}); continuing with minimal context"));
                crate::context::minimal_context("")
            }
        };

        let request = gan_core::AuditRequest {
            task: session.config.task.clone(),
            candidate: candidate.clone(),
            context_pack,
            rubric: default_rubric(),
            budget: Budget {
                max_cycles: session.config.max_cycles,
                candidates: session.config.candidates,
                threshold: session.config.threshold,
            },
            system_prompt: None,
        };

        let outcome = self.judge.run(&request).await?;
        warnings.extend(outcome.warnings.clone());

        let stagnation_outcome = stagnation::evaluate(
            loop_number,
            self.ladder.stagnation_start_loop,
            &candidate,
            &session.recent_candidates,
            self.ladder.stagnation_threshold,
            session.consecutive_stagnant_loops,
        );
        session.consecutive_stagnant_loops = stagnation_outcome.consecutive_stagnant_loops;
        session.push_candidate(candidate);
        session.push_entry(thought.thought_number, outcome.verdict.clone());

        let termination_reason = completion::evaluate(
            &self.ladder,
            loop_number,
            outcome.verdict.overall,
            stagnation_outcome.should_terminate,
        );

        if let Err(e) = self.store.save(&session_key, &session) {
            warnings.push(format!("session '{session_key}' could not be persisted: {e}"));
        }

        let mut next_thought_needed = thought.next_thought_needed;
        if outcome.verdict.verdict != VerdictTag::Pass {
            next_thought_needed = true;
        }
        if termination_reason.is_some() {
            next_thought_needed = false;
        }

        baseline.next_thought_needed = next_thought_needed;
        baseline.thought_history_length = session.history.len() as u32;
        baseline.session_id = Some(session_key);
        baseline.gan = Some(outcome.verdict);
        baseline.termination_reason = termination_reason;
        baseline.warnings = warnings;

        Ok(baseline)
    }
}

/// Rough token budget handed to the Context Builder. A generous default
/// that keeps most real diffs intact.
fn context_token_budget() -> usize {
    4_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gan_process::{ProcessManager, ProcessManagerConfig};
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    struct StubContextBuilder {
        result: Result<String, String>,
    }

    #[async_trait]
    impl ContextBuilder for StubContextBuilder {
        async fn build(&self, _scope: Scope, _paths: &[String], _budget: usize) -> Result<String, GanError> {
            match &self.result {
                Ok(s) => Ok(s.clone()),
                Err(_) => Err(GanError::FileNotFound("stub".to_string())),
            }
        }
    }

    fn thought(body: &str) -> Thought {
        Thought {
            thought: body.to_string(),
            next_thought_needed: true,
            thought_number: 1,
            total_thoughts: 1,
            is_revision: None,
            revises_thought: None,
            branch_from_thought: None,
            branch_id: None,
            needs_more_thoughts: None,
        }
    }

    fn make_orchestrator(dir: &std::path::Path, builder: Arc<dyn ContextBuilder>) -> Orchestrator {
        let process_manager = Arc::new(ProcessManager::new(ProcessManagerConfig::default()));
        let judge_config = gan_judge::JudgeConfig {
            executable_override: None,
            executable_name: "codex-nonexistent-test-binary".to_string(),
            extra_search_dirs: Vec::new(),
            working_dir_override: None,
            extra_args: Vec::new(),
            env_overlay: HashMap::new(),
            timeout: std::time::Duration::from_millis(200),
            max_retries: 0,
            allow_mock_fallback: false,
        };
        let judge = JudgeRuntime::new(judge_config, process_manager).unwrap();
        Orchestrator::new(
            EnvConfig::default(),
            TierLadder::default(),
            SessionStore::new(dir),
            judge,
            builder,
            PathBuf::from("/repo"),
            "tester".to_string(),
        )
    }

    #[tokio::test]
    async fn test_no_trigger_returns_baseline_with_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let builder = Arc::new(StubContextBuilder { result: Ok("ctx".to_string()) });
        let orch = make_orchestrator(dir.path(), builder);
        let response = orch.process(thought("just plain prose, nothing to audit")).await.unwrap();
        assert!(response.session_id.is_none());
        assert!(response.gan.is_none());
        assert!(response.next_thought_needed);
    }

    #[tokio::test]
    async fn test_disabled_auditing_never_triggers() {
        let dir = tempfile::tempdir().unwrap();
        let builder = Arc::new(StubContextBuilder { result: Ok("ctx".to_string()) });
        let mut orch = make_orchestrator(dir.path(), builder);
        orch.env.enable_gan_auditing = false;
        let response = orch
            .process(thought("```rust\nfn main() {}\n```"))
            .await
            .unwrap();
        assert!(response.session_id.is_none());
    }

    #[tokio::test]
    async fn test_triggering_thought_with_unavailable_judge_propagates_error() {
        let dir = tempfile::tempdir().unwrap();
        let builder = Arc::new(StubContextBuilder { result: Ok("ctx".to_string()) });
        let orch = make_orchestrator(dir.path(), builder);
        let result = orch.process(thought("```rust\nfn main() {}\n```")).await;
        assert!(matches!(result, Err(GanError::JudgeUnavailable)));

        // The session must still have been created/persisted before the
        // judge call was attempted.
        assert!(dir.path().read_dir().unwrap().count() > 0);
    }

    #[tokio::test]
    async fn test_context_build_failure_degrades_to_minimal_context_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let builder = Arc::new(StubContextBuilder { result: Err("boom".to_string()) });
        let orch = make_orchestrator(dir.path(), builder);
        // Judge is still unavailable, so this exercises the degrade path
        // without asserting on the final (unreachable) response.
        let result = orch.process(thought("```rust\nfn main() {}\n```")).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_session_lock_registry_is_reused_across_calls() {
        let registry = StdMutex::new(());
        let _ = registry.lock().unwrap();
    }
}
