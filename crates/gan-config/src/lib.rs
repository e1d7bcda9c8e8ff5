//! Inline `gan-config` block parsing, `SessionConfig` merge/clamp
//! semantics, and environment-variable loading.
//!
//! This crate is pure data/validation: it has no I/O beyond reading from
//! an already-collected environment map, and no knowledge of sessions,
//! processes, or the judge. The Audit Orchestrator owns *when* to call
//! into it (trigger detection, merge-then-persist); this crate only
//! owns *how* a recognized option is validated.

pub mod env;
pub mod inline;
pub mod merge;
pub mod tiers;

pub use env::EnvConfig;
pub use merge::merge_inline_over_session;
pub use tiers::{Tier, TierLadder};
