//! Transient-vs-terminal classification for judge execution failures:
//! only transient errors get retried, and only up to `maxRetries` with
//! exponential backoff.

const TRANSIENT_PATTERNS: &[&str] = &["rate limit", "429", "timed out", "temporarily unavailable"];

/// Whether a non-zero-exit judge call looks like a transient failure
/// worth retrying, based on its combined stdout+stderr text.
pub fn is_transient(stdout: &str, stderr: &str, exit_code: i32) -> bool {
    if exit_code == 0 {
        return false;
    }
    let combined = format!("{stdout}\n{stderr}").to_ascii_lowercase();
    TRANSIENT_PATTERNS
        .iter()
        .any(|pattern| combined.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_exit_is_never_transient() {
        assert!(!is_transient("rate limit exceeded", "", 0));
    }

    #[test]
    fn test_rate_limit_message_is_transient() {
        assert!(is_transient("", "Error: rate limit exceeded", 1));
    }

    #[test]
    fn test_http_429_is_transient() {
        assert!(is_transient("request failed with 429", "", 2));
    }

    #[test]
    fn test_unrelated_failure_is_not_transient() {
        assert!(!is_transient("", "panic: index out of bounds", 101));
    }

    #[test]
    fn test_case_insensitive_match() {
        assert!(is_transient("", "RATE LIMIT", 1));
    }
}
