//! Cross-cutting contract tests for the six end-to-end scenarios in
//! spec.md §8, plus the session round-trip invariant. Each test drives
//! `Orchestrator::process` against a real (scripted) judge executable
//! rather than mocking any internal component.

#![cfg(unix)]

use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gan_config::{EnvConfig, TierLadder};
use gan_core::{AuditEntry, GanError, Scope, SessionConfig, SessionState, Thought, TerminationReason, Verdict, VerdictTag, Review, JudgeCard};
use gan_judge::{JudgeConfig, JudgeRuntime};
use gan_orchestrator::{ContextBuilder, Orchestrator};
use gan_process::{ProcessManager, ProcessManagerConfig};
use gan_session::SessionStore;
use chrono::Utc;

struct StubContextBuilder;

#[async_trait]
impl ContextBuilder for StubContextBuilder {
    async fn build(&self, _scope: Scope, _paths: &[String], _budget: usize) -> Result<String, GanError> {
        Ok("stub git header\nstub diff body".to_string())
    }
}

/// Write an executable shell script at `dir/judge.sh` that answers a
/// `--version` probe without touching stdin, and otherwise drains stdin
/// and prints `body` to stdout, exiting 0.
fn fake_judge(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("judge.sh");
    let script = format!(
        "#!/bin/sh\ncase \"$1\" in\n  --version) echo 'fake-judge 1.0'; exit 0 ;;\nesac\ncat > /dev/null\nprintf '%s' '{}'\n",
        body.replace('\'', "'\\''")
    );
    fs::write(&path, script).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn thought(body: &str, branch_id: Option<&str>) -> Thought {
    Thought {
        thought: body.to_string(),
        next_thought_needed: true,
        thought_number: 1,
        total_thoughts: 1,
        is_revision: None,
        revises_thought: None,
        branch_from_thought: None,
        branch_id: branch_id.map(str::to_string),
        needs_more_thoughts: None,
    }
}

fn orchestrator_with_judge(
    state_dir: &Path,
    judge_executable: Option<PathBuf>,
) -> Orchestrator {
    let process_manager = Arc::new(ProcessManager::new(ProcessManagerConfig::default()));
    let judge_config = JudgeConfig {
        executable_override: judge_executable,
        executable_name: "codex-nonexistent-test-binary".to_string(),
        extra_search_dirs: Vec::new(),
        working_dir_override: None,
        extra_args: Vec::new(),
        env_overlay: HashMap::new(),
        timeout: Duration::from_secs(5),
        max_retries: 0,
        allow_mock_fallback: false,
    };
    let judge = JudgeRuntime::new(judge_config, process_manager).unwrap();
    Orchestrator::new(
        EnvConfig::default(),
        TierLadder::default(),
        SessionStore::new(state_dir),
        judge,
        Arc::new(StubContextBuilder),
        PathBuf::from("/repo"),
        "tester".to_string(),
    )
}

/// Scenario 1: a plain-prose thought never triggers an audit.
#[tokio::test]
async fn scenario_1_no_trigger() {
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator_with_judge(dir.path(), None);

    let response = orch
        .process(thought("Plan next steps.", None))
        .await
        .unwrap();

    assert!(response.next_thought_needed);
    assert!(response.session_id.is_none());
    assert!(response.gan.is_none());
}

/// Scenario 2: a triggering thought with a passing judge verdict
/// completes immediately with `nextThoughtNeeded=false`.
#[tokio::test]
async fn scenario_2_simple_audit_pass() {
    let tmp = tempfile::tempdir().unwrap();
    let judge_json = r#"{"overall": 96, "verdict": "pass", "dimensions": [], "review": {"summary": "looks solid", "inline": [], "citations": []}, "iterations": 1, "judge_cards": [{"model": "internal", "score": 96}]}"#;
    let judge_path = fake_judge(tmp.path(), judge_json);

    let state_dir = tmp.path().join("state");
    let orch = orchestrator_with_judge(&state_dir, Some(judge_path));

    let response = orch
        .process(thought("```rust\nfn main() {}\n```", Some("s1")))
        .await
        .unwrap();

    assert_eq!(response.session_id.as_deref(), Some("s1"));
    let verdict = response.gan.expect("verdict present");
    assert_eq!(verdict.overall, 96);
    assert_eq!(verdict.verdict, VerdictTag::Pass);
    assert!(!response.next_thought_needed);
    assert_eq!(response.thought_history_length, 1);
}

/// Scenario 3: an inline `gan-config` override raises the effective
/// threshold, and a sub-threshold score forces another iteration.
#[tokio::test]
async fn scenario_3_inline_config_override_forces_revision() {
    let tmp = tempfile::tempdir().unwrap();
    let judge_json = r#"{"overall": 88, "verdict": "revise", "dimensions": [], "review": {"summary": "needs another pass", "inline": [], "citations": []}, "iterations": 1, "judge_cards": [{"model": "internal", "score": 88}]}"#;
    let judge_path = fake_judge(tmp.path(), judge_json);

    let state_dir = tmp.path().join("state");
    let orch = orchestrator_with_judge(&state_dir, Some(judge_path));

    let body = "```gan-config\nthreshold = 90\nscope = \"diff\"\n```\n```rust\nfn candidate() {}\n```";
    let response = orch.process(thought(body, Some("s1"))).await.unwrap();

    let verdict = response.gan.expect("verdict present");
    assert_eq!(verdict.verdict, VerdictTag::Revise);
    assert!(response.next_thought_needed);

    let store = SessionStore::new(&state_dir);
    let saved = store.load("s1").unwrap().expect("session persisted");
    assert_eq!(saved.config.threshold, 90);
}

/// Scenario 4: the judge executable is entirely absent; the cycle
/// surfaces a structured, non-recoverable judge error and never
/// synthesizes a verdict.
#[tokio::test]
async fn scenario_4_judge_unavailable_propagates_structured_error() {
    let tmp = tempfile::tempdir().unwrap();
    let state_dir = tmp.path().join("state");
    let orch = orchestrator_with_judge(&state_dir, None);

    let result = orch.process(thought("```rust\nfn main() {}\n```", Some("s1"))).await;
    let err = result.expect_err("judge is unavailable");
    assert!(matches!(err, GanError::JudgeUnavailable));

    let classification = gan_core::classify(&err);
    assert_eq!(classification.category, gan_core::classify::Category::Judge);
    assert!(!classification.recoverable);
    assert!(!classification.suggestions.is_empty());

    // The session must still exist even though the judge call failed.
    let store = SessionStore::new(&state_dir);
    assert!(store.exists("s1"));
}

/// Scenario 6: the 25th cycle on a session always terminates with
/// `max-iterations`, even when the judge reports a near-passing score.
#[tokio::test]
async fn scenario_6_hard_stop_terminates_regardless_of_score() {
    let tmp = tempfile::tempdir().unwrap();
    let judge_json = r#"{"overall": 80, "verdict": "revise", "dimensions": [], "review": {"summary": "still revising", "inline": [], "citations": []}, "iterations": 1, "judge_cards": [{"model": "internal", "score": 80}]}"#;
    let judge_path = fake_judge(tmp.path(), judge_json);

    let state_dir = tmp.path().join("state");
    let store = SessionStore::new(&state_dir);

    // Pre-seed 24 completed loops so the next cycle is loop 25.
    let mut seeded = SessionState::new("s2", SessionConfig::default());
    for step in 1..=24 {
        seeded.history.push(AuditEntry {
            step,
            verdict: Verdict {
                overall: 80,
                dimensions: vec![],
                verdict: VerdictTag::Revise,
                review: Review::default(),
                iterations: 1,
                judge_cards: vec![JudgeCard { model: "internal".to_string(), score: 80, notes: None }],
                proposed_diff: None,
            },
            recorded_at: Utc::now(),
        });
    }
    store.save("s2", &seeded).unwrap();

    let orch = orchestrator_with_judge(&state_dir, Some(judge_path));
    let response = orch
        .process(thought("```rust\nfn still_going() {}\n```", Some("s2")))
        .await
        .unwrap();

    assert_eq!(response.termination_reason, Some(TerminationReason::MaxIterations));
    assert!(!response.next_thought_needed);
    assert_eq!(response.thought_history_length, 25);
}

/// Session round-trip: two successful cycles for the same session key
/// extend history by exactly one entry each, in call order.
#[tokio::test]
async fn session_history_round_trip_is_append_only_and_ordered() {
    let tmp = tempfile::tempdir().unwrap();
    let judge_json = r#"{"overall": 70, "verdict": "revise", "dimensions": [], "review": {"summary": "first pass", "inline": [], "citations": []}, "iterations": 1, "judge_cards": [{"model": "internal", "score": 70}]}"#;
    let judge_path = fake_judge(tmp.path(), judge_json);

    let state_dir = tmp.path().join("state");
    let orch = orchestrator_with_judge(&state_dir, Some(judge_path));

    let first = orch.process(thought("```rust\nfn a() {}\n```", Some("s3"))).await.unwrap();
    assert_eq!(first.thought_history_length, 1);

    let second = orch.process(thought("```rust\nfn b() {}\n```", Some("s3"))).await.unwrap();
    assert_eq!(second.thought_history_length, 2);

    let store = SessionStore::new(&state_dir);
    let saved = store.load("s3").unwrap().unwrap();
    assert_eq!(saved.history.len(), 2);
    assert_eq!(saved.history[0].step, 1);
    assert_eq!(saved.history[1].step, 1);
}
