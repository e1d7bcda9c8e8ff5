//! Error Classifier: maps any [`GanError`] to a category, severity,
//! recoverability, recovery strategy, and a fixed table of user-facing
//! suggestions.

use crate::error::GanError;
use serde::{Deserialize, Serialize};

/// One of the four fault categories the Orchestrator reasons about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Config,
    Judge,
    Filesystem,
    Session,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Judge => "judge",
            Self::Filesystem => "filesystem",
            Self::Session => "session",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Whether the classified fault can be recovered from within the current call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recoverability {
    Recoverable,
    Terminal,
}

/// How the Orchestrator should respond to this fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Absorb the fault, keep going without the affected feature.
    Skip,
    /// Retry the operation (only ever judge-layer transient errors).
    Retry,
    /// Fall back to defaults/degraded behavior (config, filesystem).
    Fallback,
    /// Propagate as a structured error; never synthesize a result.
    Abort,
}

/// Full classification of a single fault, ready to drop into the
/// `details` field of an error envelope.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub severity: Severity,
    pub recoverable: bool,
    pub strategy: Strategy,
    pub suggestions: Vec<String>,
}

fn suggestion(s: &str) -> String {
    s.to_string()
}

/// Pure mapping from a concrete fault to its classification. Judge
/// faults are never mapped to `Fallback` — they always `Abort` and
/// propagate to the caller as a structured error.
pub fn classify(err: &GanError) -> Classification {
    match err {
        GanError::InvalidInlineConfig(_) => Classification {
            category: Category::Config,
            severity: Severity::Low,
            recoverable: true,
            strategy: Strategy::Fallback,
            suggestions: vec![suggestion(
                "Check the gan-config block is valid structured data",
            )],
        },
        GanError::OptionOutOfRange { key, .. } => Classification {
            category: Category::Config,
            severity: Severity::Low,
            recoverable: true,
            strategy: Strategy::Fallback,
            suggestions: vec![format!("Check the value provided for '{key}' against its documented range")],
        },
        GanError::MissingOption(key) => Classification {
            category: Category::Config,
            severity: Severity::Medium,
            recoverable: true,
            strategy: Strategy::Fallback,
            suggestions: vec![
                format!("Provide an explicit '{key}' value"),
                suggestion("Provide an explicit `paths` array when scope=paths"),
            ],
        },

        GanError::JudgeUnavailable => Classification {
            category: Category::Judge,
            severity: Severity::Critical,
            recoverable: false,
            strategy: Strategy::Abort,
            suggestions: vec![suggestion("Install the judge and ensure it is on PATH")],
        },
        GanError::JudgeExecution { .. } => Classification {
            category: Category::Judge,
            severity: Severity::High,
            recoverable: false,
            strategy: Strategy::Abort,
            suggestions: vec![suggestion(
                "Inspect the judge's standard error output for the underlying cause",
            )],
        },
        GanError::JudgeTimeout { .. } => Classification {
            category: Category::Judge,
            severity: Severity::High,
            recoverable: false,
            strategy: Strategy::Abort,
            suggestions: vec![suggestion("Increase the timeout")],
        },
        GanError::JudgeResponseInvalid(_) => Classification {
            category: Category::Judge,
            severity: Severity::High,
            recoverable: false,
            strategy: Strategy::Abort,
            suggestions: vec![suggestion(
                "Check the judge is emitting the documented response schema",
            )],
        },
        GanError::QueueTimeout(_) => Classification {
            category: Category::Judge,
            severity: Severity::Medium,
            recoverable: false,
            strategy: Strategy::Abort,
            suggestions: vec![
                suggestion("Increase maxConcurrent or queueTimeoutMs"),
                suggestion("Retry later once the queue has drained"),
            ],
        },
        GanError::ManagerShutdown => Classification {
            category: Category::Judge,
            severity: Severity::Medium,
            recoverable: false,
            strategy: Strategy::Abort,
            suggestions: vec![suggestion("Retry after the service has restarted")],
        },

        GanError::FileNotFound(_) => Classification {
            category: Category::Filesystem,
            severity: Severity::Low,
            recoverable: true,
            strategy: Strategy::Skip,
            suggestions: vec![suggestion("Verify the path exists and is readable")],
        },
        GanError::AccessDenied(_) => Classification {
            category: Category::Filesystem,
            severity: Severity::Medium,
            recoverable: true,
            strategy: Strategy::Skip,
            suggestions: vec![suggestion("Check file permissions for the service user")],
        },
        GanError::DirectoryCreationFailed { .. } => Classification {
            category: Category::Filesystem,
            severity: Severity::Medium,
            recoverable: true,
            strategy: Strategy::Retry,
            suggestions: vec![suggestion(
                "Ensure the state directory's parent exists and is writable",
            )],
        },

        GanError::SessionNotFound(_) => Classification {
            category: Category::Session,
            severity: Severity::Low,
            recoverable: true,
            strategy: Strategy::Fallback,
            suggestions: vec![suggestion("A fresh session will be created automatically")],
        },
        GanError::SessionCorrupted(_) => Classification {
            category: Category::Session,
            severity: Severity::Medium,
            recoverable: true,
            strategy: Strategy::Fallback,
            suggestions: vec![suggestion(
                "The corrupted session file was backed up; a fresh session was started",
            )],
        },
        GanError::SessionPersistenceFailed { .. } => Classification {
            category: Category::Session,
            severity: Severity::Medium,
            recoverable: true,
            strategy: Strategy::Skip,
            suggestions: vec![suggestion(
                "Check available disk space and permissions on the state directory",
            )],
        },
    }
}
