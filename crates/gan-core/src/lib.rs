//! Shared data model, error taxonomy, and fault classification for the
//! auditing service. Every other crate in this workspace depends on this
//! one; it has no internal dependencies of its own.

pub mod classify;
pub mod error;
pub mod types;

pub use classify::{Classification, Recoverability, Severity, Strategy, classify};
pub use error::GanError;
pub use types::*;
