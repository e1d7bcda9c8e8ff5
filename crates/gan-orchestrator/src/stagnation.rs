//! Stagnation detection: token-set Jaccard similarity over
//! whitespace-tokenized candidate text, chosen because it is
//! deterministic, symmetric, dependency-free, and cheap enough to run
//! against every prior candidate in a session's history.

use std::collections::HashSet;

/// Token-set Jaccard similarity between two candidate texts, in [0, 1].
/// Two empty token sets are defined as identical (similarity 1.0).
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let tokens_a: HashSet<&str> = a.split_whitespace().collect();
    let tokens_b: HashSet<&str> = b.split_whitespace().collect();

    if tokens_a.is_empty() && tokens_b.is_empty() {
        return 1.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// True if `candidate` matches any of `prior_candidates` at or above
/// `threshold`.
pub fn matches_any_prior(candidate: &str, prior_candidates: &[String], threshold: f64) -> bool {
    prior_candidates
        .iter()
        .any(|prior| jaccard_similarity(candidate, prior) >= threshold)
}

/// Result of one stagnation sample for the current loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagnationOutcome {
    /// Whether this loop's candidate looked stagnant against history.
    pub sampled_stagnant: bool,
    /// Updated consecutive-stagnant-loop counter to persist on the session.
    pub consecutive_stagnant_loops: u32,
    /// True only once two *consecutive* samples have been stagnant —
    /// the signal the Orchestrator actually terminates on.
    pub should_terminate: bool,
}

/// Evaluate one loop's stagnation sample. `loop_number` is 1-based (the
/// loop just completed); sampling only begins at `start_loop`.
pub fn evaluate(
    loop_number: u32,
    start_loop: u32,
    candidate: &str,
    prior_candidates: &[String],
    threshold: f64,
    previous_consecutive: u32,
) -> StagnationOutcome {
    if loop_number < start_loop {
        return StagnationOutcome {
            sampled_stagnant: false,
            consecutive_stagnant_loops: 0,
            should_terminate: false,
        };
    }

    let sampled_stagnant = matches_any_prior(candidate, prior_candidates, threshold);
    let consecutive = if sampled_stagnant { previous_consecutive + 1 } else { 0 };

    StagnationOutcome {
        sampled_stagnant,
        consecutive_stagnant_loops: consecutive,
        should_terminate: consecutive >= 2,
    }
}
