//! Tiered completion ladder evaluation. Combines the tier/hard-stop
//! table with the stagnation signal into a single "why did this session
//! stop" decision.

use gan_config::TierLadder;
use gan_core::TerminationReason;

/// Evaluate completion for the loop that was just recorded.
///
/// Precedence: the hard stop is checked first and always wins — even a
/// near-perfect score on that loop still terminates — then tier
/// satisfaction (a good outcome), then stagnation (only relevant when no
/// tier was met).
pub fn evaluate(
    ladder: &TierLadder,
    loop_number: u32,
    overall_score: u8,
    stagnation_should_terminate: bool,
) -> Option<TerminationReason> {
    if loop_number >= ladder.hard_stop_loops {
        return Some(TerminationReason::MaxIterations);
    }

    for tier in ladder.tiers() {
        if loop_number <= tier.loops && overall_score >= tier.score {
            return Some(TerminationReason::TierComplete);
        }
    }

    if stagnation_should_terminate {
        return Some(TerminationReason::Stagnation);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier1_satisfied_within_budget() {
        let ladder = TierLadder::default();
        assert_eq!(evaluate(&ladder, 5, 96, false), Some(TerminationReason::TierComplete));
    }

    #[test]
    fn test_tier1_score_met_but_past_its_loop_budget_falls_to_tier2() {
        let ladder = TierLadder::default();
        // loop 12 is past tier1's budget (10) but within tier2's (15).
        assert_eq!(evaluate(&ladder, 12, 96, false), Some(TerminationReason::TierComplete));
    }

    #[test]
    fn test_no_tier_satisfied_and_no_stagnation_continues() {
        let ladder = TierLadder::default();
        assert_eq!(evaluate(&ladder, 3, 50, false), None);
    }

    #[test]
    fn test_hard_stop_wins_even_with_high_score() {
        let ladder = TierLadder::default();
        assert_eq!(
            evaluate(&ladder, 25, 99, false),
            Some(TerminationReason::MaxIterations)
        );
    }

    #[test]
    fn test_stagnation_only_applies_when_no_tier_met() {
        let ladder = TierLadder::default();
        assert_eq!(
            evaluate(&ladder, 11, 50, true),
            Some(TerminationReason::Stagnation)
        );
    }

    #[test]
    fn test_tier_completion_takes_priority_over_stagnation() {
        let ladder = TierLadder::default();
        assert_eq!(
            evaluate(&ladder, 11, 90, true),
            Some(TerminationReason::TierComplete)
        );
    }
}
