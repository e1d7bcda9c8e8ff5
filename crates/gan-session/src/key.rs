//! Turn an arbitrary session key (typically a caller-supplied `branchId`)
//! into a filesystem-safe file stem, without relying on the key's shape.

/// Replace any character outside `[A-Za-z0-9_-]` with `_`. If the result
/// would be empty, or differs from the input (meaning it contained
/// characters that could otherwise enable path traversal such as `/` or
/// `..`), a short stable suffix derived from the original key's bytes is
/// appended so distinct unsafe keys don't collide after sanitization.
pub fn sanitize_key(key: &str) -> String {
    let sanitized: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();

    if sanitized == key && !sanitized.is_empty() {
        return sanitized;
    }

    let suffix = fnv1a_hex(key.as_bytes());
    if sanitized.is_empty() {
        format!("session_{suffix}")
    } else {
        format!("{sanitized}_{suffix}")
    }
}

/// Tiny dependency-free FNV-1a hash, hex-encoded. Only used to disambiguate
/// sanitized keys; not a security boundary by itself.
fn fnv1a_hex(bytes: &[u8]) -> String {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    format!("{hash:016x}")
}
