//! Durable, per-session-key `SessionState` storage on disk. One file per
//! session, named after its id, written with temp-file-then-rename
//! atomicity.
//!
//! The store is the sole owner of `SessionState` persistence. It never
//! mutates a `SessionState` itself and holds no lock beyond the single
//! file operation in progress — per-session serialization of *callers*
//! is the Audit Orchestrator's job.

pub mod key;
pub mod store;

pub use key::sanitize_key;
pub use store::SessionStore;
