//! Tiered completion ladder defaults and `SYNC_AUDIT_*` environment
//! overrides.

use std::collections::HashMap;

/// A single (score threshold, loop budget) rung of the completion ladder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tier {
    pub score: u8,
    pub loops: u32,
}

/// The full three-tier ladder plus hard stop and stagnation parameters.
/// Defaults match spec §4.1's table exactly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TierLadder {
    pub tier1: Tier,
    pub tier2: Tier,
    pub tier3: Tier,
    pub hard_stop_loops: u32,
    pub stagnation_start_loop: u32,
    pub stagnation_threshold: f64,
}

impl Default for TierLadder {
    fn default() -> Self {
        Self {
            tier1: Tier { score: 95, loops: 10 },
            tier2: Tier { score: 90, loops: 15 },
            tier3: Tier { score: 85, loops: 20 },
            hard_stop_loops: 25,
            stagnation_start_loop: 10,
            stagnation_threshold: 0.95,
        }
    }
}

impl TierLadder {
    /// Tiers in the order they should be checked (tightest first).
    pub fn tiers(&self) -> [Tier; 3] {
        [self.tier1, self.tier2, self.tier3]
    }

    /// Build from a map of environment-variable-style keys. Unknown or
    /// unparseable values fall back to the default for that field.
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let d = Self::default();
        Self {
            tier1: Tier {
                score: parse_u8(map, "SYNC_AUDIT_TIER1_SCORE", d.tier1.score),
                loops: parse_u32(map, "SYNC_AUDIT_TIER1_LOOPS", d.tier1.loops),
            },
            tier2: Tier {
                score: parse_u8(map, "SYNC_AUDIT_TIER2_SCORE", d.tier2.score),
                loops: parse_u32(map, "SYNC_AUDIT_TIER2_LOOPS", d.tier2.loops),
            },
            tier3: Tier {
                score: parse_u8(map, "SYNC_AUDIT_TIER3_SCORE", d.tier3.score),
                loops: parse_u32(map, "SYNC_AUDIT_TIER3_LOOPS", d.tier3.loops),
            },
            hard_stop_loops: parse_u32(map, "SYNC_AUDIT_HARD_STOP_LOOPS", d.hard_stop_loops),
            stagnation_start_loop: parse_u32(
                map,
                "SYNC_AUDIT_STAGNATION_START_LOOP",
                d.stagnation_start_loop,
            ),
            stagnation_threshold: parse_f64(
                map,
                "SYNC_AUDIT_STAGNATION_THRESHOLD",
                d.stagnation_threshold,
            ),
        }
    }

    pub fn from_env() -> Self {
        Self::from_map(&std::env::vars().collect())
    }
}

fn parse_u8(map: &HashMap<String, String>, key: &str, default: u8) -> u8 {
    map.get(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_u32(map: &HashMap<String, String>, key: &str, default: u32) -> u32 {
    map.get(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_f64(map: &HashMap<String, String>, key: &str, default: f64) -> f64 {
    map.get(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}
