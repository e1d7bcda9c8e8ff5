//! Core data model: Thought, SessionConfig, SessionState, AuditRequest, Verdict,
//! and the combined tool response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scope of repository context the Context Builder should gather.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Diff,
    Paths,
    Workspace,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Diff => "diff",
            Self::Paths => "paths",
            Self::Workspace => "workspace",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Scope {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "diff" => Ok(Self::Diff),
            "paths" => Ok(Self::Paths),
            "workspace" => Ok(Self::Workspace),
            _ => Err(()),
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::Diff
    }
}

/// Incoming "thought" — one free-text reasoning step that may embed code,
/// diffs, or an inline `gan-config` block.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thought {
    pub thought: String,
    pub next_thought_needed: bool,
    pub thought_number: u32,
    pub total_thoughts: u32,
    #[serde(default)]
    pub is_revision: Option<bool>,
    #[serde(default)]
    pub revises_thought: Option<u32>,
    #[serde(default)]
    pub branch_from_thought: Option<u32>,
    #[serde(default)]
    pub branch_id: Option<String>,
    #[serde(default)]
    pub needs_more_thoughts: Option<bool>,
}

/// Per-session configuration, either defaulted, loaded from a persisted
/// session, or merged with an inline `gan-config` block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_task")]
    pub task: String,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default = "default_threshold")]
    pub threshold: u8,
    #[serde(default = "default_max_cycles")]
    pub max_cycles: u32,
    #[serde(default = "default_candidates")]
    pub candidates: u32,
    #[serde(default = "default_judges")]
    pub judges: Vec<String>,
    #[serde(default)]
    pub apply_fixes: bool,
}

fn default_task() -> String {
    "Audit and improve the provided candidate".to_string()
}
fn default_threshold() -> u8 {
    85
}
fn default_max_cycles() -> u32 {
    1
}
fn default_candidates() -> u32 {
    1
}
fn default_judges() -> Vec<String> {
    vec!["internal".to_string()]
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            task: default_task(),
            scope: Scope::default(),
            paths: Vec::new(),
            threshold: default_threshold(),
            max_cycles: default_max_cycles(),
            candidates: default_candidates(),
            judges: default_judges(),
            apply_fixes: false,
        }
    }
}

/// Result of validating/clamping a (possibly partial) inline config
/// against the prior/default session config.
#[derive(Debug, Clone, Default)]
pub struct ConfigMergeOutcome {
    pub config: SessionConfig,
    pub warnings: Vec<String>,
}

/// A single completed audit cycle recorded in session history.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    pub step: u32,
    pub verdict: Verdict,
    pub recorded_at: DateTime<Utc>,
}

/// Durable per-session state, exclusively owned by the Session Store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionState {
    pub id: String,
    pub config: SessionConfig,
    #[serde(default)]
    pub history: Vec<AuditEntry>,
    #[serde(default)]
    pub last_verdict: Option<Verdict>,
    /// Bounded rolling window of recent candidate texts, kept only for
    /// stagnation comparison — not part of the append-only audit-entry
    /// history, since candidates are otherwise ephemeral.
    #[serde(default)]
    pub recent_candidates: Vec<String>,
    /// Count of consecutive loops whose candidate matched a prior one
    /// above the stagnation similarity threshold. Must never terminate
    /// on the very first stagnation sample; two consecutive samples are
    /// required.
    #[serde(default)]
    pub consecutive_stagnant_loops: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How many recent candidates [`SessionState::push_candidate`] retains.
pub const RECENT_CANDIDATES_CAPACITY: usize = 5;

impl SessionState {
    pub fn new(id: impl Into<String>, config: SessionConfig) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            config,
            history: Vec::new(),
            recent_candidates: Vec::new(),
            consecutive_stagnant_loops: 0,
            last_verdict: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Number of audit loops recorded for this session so far.
    pub fn loop_count(&self) -> u32 {
        self.history.len() as u32
    }

    pub fn push_entry(&mut self, step: u32, verdict: Verdict) {
        self.last_verdict = Some(verdict.clone());
        self.history.push(AuditEntry {
            step,
            verdict,
            recorded_at: Utc::now(),
        });
        self.updated_at = Utc::now();
    }

    /// Record a candidate text for future stagnation comparisons,
    /// keeping only the most recent [`RECENT_CANDIDATES_CAPACITY`].
    pub fn push_candidate(&mut self, candidate: String) {
        self.recent_candidates.push(candidate);
        if self.recent_candidates.len() > RECENT_CANDIDATES_CAPACITY {
            let overflow = self.recent_candidates.len() - RECENT_CANDIDATES_CAPACITY;
            self.recent_candidates.drain(0..overflow);
        }
    }
}

/// One rubric dimension the judge is asked to score.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RubricDimension {
    pub name: String,
    pub weight: f64,
    #[serde(default)]
    pub description: Option<String>,
}

/// Cycle budget carried alongside a request.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Budget {
    pub max_cycles: u32,
    pub candidates: u32,
    pub threshold: u8,
}

/// Immutable per-call bundle handed to the Judge Runtime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditRequest {
    pub task: String,
    pub candidate: String,
    pub context_pack: String,
    pub rubric: Vec<RubricDimension>,
    pub budget: Budget,
    /// Optional system-prompt text enabling prompt-aware response validation.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

/// Verdict tag returned by the judge for one audit cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictTag {
    Pass,
    Revise,
    Reject,
}

impl VerdictTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Revise => "revise",
            Self::Reject => "reject",
        }
    }

    pub fn parse_loose(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pass" => Self::Pass,
            "reject" => Self::Reject,
            _ => Self::Revise,
        }
    }
}

impl std::fmt::Display for VerdictTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Score assigned to a single rubric dimension.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DimensionScore {
    pub name: String,
    pub score: u8,
}

/// One inline review comment anchored to a file/line.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InlineComment {
    pub path: String,
    pub line: u32,
    pub comment: String,
}

/// Free-text summary plus inline comments and citations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub inline: Vec<InlineComment>,
    #[serde(default)]
    pub citations: Vec<String>,
}

/// Per-model scorecard contributing to the overall verdict.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JudgeCard {
    pub model: String,
    pub score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Structured result of one audit cycle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Verdict {
    pub overall: u8,
    pub dimensions: Vec<DimensionScore>,
    pub verdict: VerdictTag,
    pub review: Review,
    pub iterations: u32,
    pub judge_cards: Vec<JudgeCard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_diff: Option<String>,
}

impl Verdict {
    /// Clamp/normalize fields so these invariants always hold: overall in
    /// [0,100], every rubric dimension present exactly once, iterations
    /// >= 1, judge_cards non-empty.
    pub fn normalize(mut self, rubric: &[RubricDimension]) -> Self {
        self.overall = self.overall.min(100);
        for dim in &mut self.dimensions {
            dim.score = dim.score.min(100);
        }
        for rubric_dim in rubric {
            if !self.dimensions.iter().any(|d| d.name == rubric_dim.name) {
                self.dimensions.push(DimensionScore {
                    name: rubric_dim.name.clone(),
                    score: self.overall,
                });
            }
        }
        self.review.inline.retain(|c| !c.path.is_empty() && c.line >= 1 && !c.comment.is_empty());
        self.review.citations.retain(|c| is_repo_citation(c));
        if self.iterations < 1 {
            self.iterations = 1;
        }
        if self.judge_cards.is_empty() {
            self.judge_cards.push(JudgeCard {
                model: "internal".to_string(),
                score: self.overall,
                notes: None,
            });
        }
        self
    }
}

/// Citations must look like `repo://<path>:<start>-<end>`.
pub fn is_repo_citation(s: &str) -> bool {
    let Some(rest) = s.strip_prefix("repo://") else {
        return false;
    };
    let Some((path, range)) = rest.rsplit_once(':') else {
        return false;
    };
    if path.is_empty() {
        return false;
    }
    let Some((start, end)) = range.split_once('-') else {
        return false;
    };
    start.parse::<u32>().is_ok() && end.parse::<u32>().is_ok()
}

/// Why an audit session stopped producing further required iterations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminationReason {
    /// A completion tier's threshold was satisfied within its loop budget.
    TierComplete,
    MaxIterations,
    Stagnation,
}

/// Combined response returned to the caller for one tool invocation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedResponse {
    pub thought_number: u32,
    pub total_thoughts: u32,
    pub next_thought_needed: bool,
    #[serde(default)]
    pub branches: Vec<String>,
    pub thought_history_length: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gan: Option<Verdict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_reason: Option<TerminationReason>,
    #[serde(default)]
    pub warnings: Vec<String>,
}
