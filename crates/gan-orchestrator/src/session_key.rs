//! Session key resolution: explicit `branchId` wins; absent that, a
//! deterministic hash of working directory + user identity + coarse
//! timestamp bucket gives repeated calls within the same rough window a
//! stable, collision-resistant key without any caller state.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Width of the timestamp bucket: calls made close together in time
/// resolve to the same generated key, so a burst of un-branched thoughts
/// in one sitting still serializes through one session.
pub const DEFAULT_BUCKET_SECONDS: i64 = 3600;

/// Resolve the session key: explicit `branch_id` if present, otherwise a
/// generated stable key.
pub fn resolve_session_key(branch_id: Option<&str>, cwd: &Path, user: &str, now: DateTime<Utc>) -> String {
    match branch_id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => generate_stable_key(cwd, user, now, DEFAULT_BUCKET_SECONDS),
    }
}

/// Deterministic hash of (working dir, user identity, coarse time bucket).
pub fn generate_stable_key(cwd: &Path, user: &str, now: DateTime<Utc>, bucket_seconds: i64) -> String {
    let bucket = now.timestamp().div_euclid(bucket_seconds.max(1));
    let mut hasher = Sha256::new();
    hasher.update(cwd.to_string_lossy().as_bytes());
    hasher.update(b"\0");
    hasher.update(user.as_bytes());
    hasher.update(b"\0");
    hasher.update(bucket.to_le_bytes());
    let digest = hasher.finalize();
    format!("auto-{:x}", digest)[..21].to_string()
}
