//! Response parsing: strict structured parse first, falling back to
//! greedy field-level extraction, then normalization. Never fails
//! outright — every malformed response still yields a valid [`Verdict`]
//! with safe defaults for whatever could not be recovered.

use gan_core::{DimensionScore, InlineComment, JudgeCard, Review, RubricDimension, Verdict, VerdictTag};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;

#[derive(Deserialize, Default)]
struct RawInline {
    #[serde(default)]
    path: String,
    #[serde(default)]
    line: i64,
    #[serde(default)]
    comment: String,
}

#[derive(Deserialize, Default)]
struct RawReview {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    inline: Vec<RawInline>,
    #[serde(default)]
    citations: Vec<String>,
}

#[derive(Deserialize, Default)]
struct RawDimension {
    #[serde(default)]
    name: String,
    #[serde(default)]
    score: i64,
}

#[derive(Deserialize, Default)]
struct RawJudgeCard {
    #[serde(default)]
    model: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Deserialize, Default)]
struct RawVerdict {
    #[serde(default)]
    overall: i64,
    #[serde(default)]
    dimensions: Vec<RawDimension>,
    #[serde(default)]
    verdict: String,
    #[serde(default)]
    review: RawReview,
    #[serde(default)]
    iterations: i64,
    #[serde(default)]
    judge_cards: Vec<RawJudgeCard>,
    #[serde(default)]
    proposed_diff: Option<String>,
    #[serde(default)]
    workflow_steps: Option<Value>,
    #[serde(default)]
    completion_analysis: Option<Value>,
}

/// Parse one judge response. Returns the normalized verdict plus any
/// non-fatal warnings (strict-parse fallback, missing prompt-aware
/// fields when `enhanced` is true).
pub fn parse_response(
    raw: &str,
    rubric: &[RubricDimension],
    enhanced: bool,
) -> (Verdict, Vec<String>) {
    let mut warnings = Vec::new();

    let parsed: RawVerdict = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(_) => {
            warnings.push("strict parse failed; used greedy field extraction".to_string());
            greedy_extract(raw)
        }
    };

    if enhanced {
        if parsed.workflow_steps.is_none() {
            warnings.push("judge response is missing workflow_steps".to_string());
        }
        if parsed.completion_analysis.is_none() {
            warnings.push("judge response is missing completion_analysis".to_string());
        }
    }

    let verdict = Verdict {
        overall: clamp_score(parsed.overall),
        dimensions: parsed
            .dimensions
            .into_iter()
            .filter(|d| !d.name.is_empty())
            .map(|d| DimensionScore {
                name: d.name,
                score: clamp_score(d.score),
            })
            .collect(),
        verdict: if parsed.verdict.is_empty() {
            VerdictTag::Revise
        } else {
            VerdictTag::parse_loose(&parsed.verdict)
        },
        review: Review {
            summary: if parsed.review.summary.is_empty() {
                "The judge did not provide a summary.".to_string()
            } else {
                parsed.review.summary
            },
            inline: parsed
                .review
                .inline
                .into_iter()
                .filter(|c| !c.path.is_empty() && c.line >= 1 && !c.comment.is_empty())
                .map(|c| InlineComment {
                    path: c.path,
                    line: c.line as u32,
                    comment: c.comment,
                })
                .collect(),
            citations: parsed.review.citations,
        },
        iterations: parsed.iterations.max(0) as u32,
        judge_cards: parsed
            .judge_cards
            .into_iter()
            .filter(|c| !c.model.is_empty())
            .map(|c| JudgeCard {
                model: c.model,
                score: clamp_score(c.score),
                notes: c.notes,
            })
            .collect(),
        proposed_diff: parsed.proposed_diff,
    }
    .normalize(rubric);

    (verdict, warnings)
}

fn clamp_score(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

static OVERALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""?overall"?\s*[:=]\s*(-?\d+)"#).expect("valid regex"));
static VERDICT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""?verdict"?\s*[:=]\s*"?(\w+)"?"#).expect("valid regex"));
static ITERATIONS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""?iterations"?\s*[:=]\s*(\d+)"#).expect("valid regex"));
static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""summary"\s*:\s*"((?:[^"\\]|\\.)*)""#).expect("valid regex")
});
static DIMENSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""name"\s*:\s*"([^"]+)"\s*,\s*"score"\s*:\s*(-?\d+)"#).expect("valid regex")
});

/// Best-effort field-level extraction from a malformed response. Every
/// field defaults to its spec-mandated safe value if not recoverable.
fn greedy_extract(raw: &str) -> RawVerdict {
    let mut v = RawVerdict::default();

    if let Some(caps) = OVERALL_RE.captures(raw) {
        v.overall = caps[1].parse().unwrap_or(0);
    }
    if let Some(caps) = VERDICT_RE.captures(raw) {
        v.verdict = caps[1].to_string();
    }
    if let Some(caps) = ITERATIONS_RE.captures(raw) {
        v.iterations = caps[1].parse().unwrap_or(1);
    }
    if let Some(caps) = SUMMARY_RE.captures(raw) {
        v.review.summary = caps[1].replace("\\\"", "\"").replace("\\n", "\n");
    }
    for caps in DIMENSION_RE.captures_iter(raw) {
        v.dimensions.push(RawDimension {
            name: caps[1].to_string(),
            score: caps[2].parse().unwrap_or(0),
        });
    }

    v
}
