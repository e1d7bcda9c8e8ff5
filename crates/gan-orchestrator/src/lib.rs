//! Audit Orchestrator: trigger detection, session resolution,
//! inline-config merge, context building, stagnation/completion tracking,
//! and judge invocation for one incoming thought at a time.

pub mod completion;
pub mod context;
pub mod locks;
pub mod orchestrator;
pub mod rubric;
pub mod session_key;
pub mod stagnation;
pub mod trigger;

pub use context::{ContextBuilder, GitDiffContextBuilder};
pub use orchestrator::Orchestrator;
pub use session_key::resolve_session_key;
