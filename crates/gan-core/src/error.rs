//! Fault taxonomy for the auditing service. One variant per concrete
//! failure mode the service can hit; [`crate::classify`] maps each to a
//! category/severity/strategy triple.

use thiserror::Error;

/// All faults the service can surface, grouped loosely by the four
/// categories the Error Classifier recognizes (config/judge/filesystem/
/// session) — see [`crate::classify::classify`].
#[derive(Debug, Error)]
pub enum GanError {
    // --- config ---
    #[error("inline gan-config block is invalid: {0}")]
    InvalidInlineConfig(String),

    #[error("option '{key}' is out of range: {detail}")]
    OptionOutOfRange { key: String, detail: String },

    #[error("required option '{0}' is missing")]
    MissingOption(String),

    // --- judge ---
    #[error("judge executable not found on PATH or in configured search directories")]
    JudgeUnavailable,

    #[error("judge execution failed (exit code {exit_code}): {stderr}")]
    JudgeExecution { exit_code: i32, stderr: String },

    #[error("judge call timed out after {elapsed_ms}ms")]
    JudgeTimeout { elapsed_ms: u64 },

    #[error("judge response could not be parsed even with greedy recovery: {0}")]
    JudgeResponseInvalid(String),

    #[error("process pool is at capacity; queue wait exceeded {0}ms")]
    QueueTimeout(u64),

    #[error("process manager has been shut down")]
    ManagerShutdown,

    // --- filesystem ---
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("failed to create directory '{path}': {detail}")]
    DirectoryCreationFailed { path: String, detail: String },

    // --- session ---
    #[error("session '{0}' not found")]
    SessionNotFound(String),

    #[error("session '{0}' state is corrupted")]
    SessionCorrupted(String),

    #[error("failed to persist session '{session_id}': {detail}")]
    SessionPersistenceFailed { session_id: String, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_invalid_inline_config() {
        let err = GanError::InvalidInlineConfig("not valid toml".to_string());
        assert_eq!(
            err.to_string(),
            "inline gan-config block is invalid: not valid toml"
        );
    }

    #[test]
    fn test_display_option_out_of_range() {
        let err = GanError::OptionOutOfRange {
            key: "threshold".to_string(),
            detail: "must be 0-100".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "option 'threshold' is out of range: must be 0-100"
        );
    }

    #[test]
    fn test_display_missing_option() {
        let err = GanError::MissingOption("paths".to_string());
        assert_eq!(err.to_string(), "required option 'paths' is missing");
    }

    #[test]
    fn test_display_judge_unavailable() {
        let err = GanError::JudgeUnavailable;
        assert_eq!(
            err.to_string(),
            "judge executable not found on PATH or in configured search directories"
        );
    }

    #[test]
    fn test_display_judge_execution() {
        let err = GanError::JudgeExecution {
            exit_code: 1,
            stderr: "boom".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "judge execution failed (exit code 1): boom"
        );
    }

    #[test]
    fn test_display_judge_timeout() {
        let err = GanError::JudgeTimeout { elapsed_ms: 30_000 };
        assert_eq!(err.to_string(), "judge call timed out after 30000ms");
    }

    #[test]
    fn test_display_judge_response_invalid() {
        let err = GanError::JudgeResponseInvalid("missing closing brace".to_string());
        assert_eq!(
            err.to_string(),
            "judge response could not be parsed even with greedy recovery: missing closing brace"
        );
    }

    #[test]
    fn test_display_queue_timeout() {
        let err = GanError::QueueTimeout(5_000);
        assert_eq!(
            err.to_string(),
            "process pool is at capacity; queue wait exceeded 5000ms"
        );
    }

    #[test]
    fn test_display_manager_shutdown() {
        let err = GanError::ManagerShutdown;
        assert_eq!(err.to_string(), "process manager has been shut down");
    }

    #[test]
    fn test_display_file_not_found() {
        let err = GanError::FileNotFound("/tmp/missing".to_string());
        assert_eq!(err.to_string(), "file not found: /tmp/missing");
    }

    #[test]
    fn test_display_access_denied() {
        let err = GanError::AccessDenied("/etc/shadow".to_string());
        assert_eq!(err.to_string(), "access denied: /etc/shadow");
    }

    #[test]
    fn test_display_directory_creation_failed() {
        let err = GanError::DirectoryCreationFailed {
            path: ".mcp-gan-state".to_string(),
            detail: "permission denied".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to create directory '.mcp-gan-state': permission denied"
        );
    }

    #[test]
    fn test_display_session_not_found() {
        let err = GanError::SessionNotFound("s1".to_string());
        assert_eq!(err.to_string(), "session 's1' not found");
    }

    #[test]
    fn test_display_session_corrupted() {
        let err = GanError::SessionCorrupted("s1".to_string());
        assert_eq!(err.to_string(), "session 's1' state is corrupted");
    }

    #[test]
    fn test_display_session_persistence_failed() {
        let err = GanError::SessionPersistenceFailed {
            session_id: "s1".to_string(),
            detail: "disk full".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to persist session 's1': disk full"
        );
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GanError>();
    }
}
