//! Extraction and permissive parsing of the inline `gan-config` fenced
//! block embedded in a thought body.

/// Find the first fenced code block tagged `gan-config` and return its
/// body (the text between the opening fence line and the closing
/// fence), or `None` if no such block is present.
pub fn extract_block(body: &str) -> Option<&str> {
    let marker = "```gan-config";
    let start = body.find(marker)?;
    let after_marker = &body[start + marker.len()..];
    // Skip to the end of the fence's opening line (allows a trailing
    // language-tag suffix or stray whitespace before the newline).
    let content_start = after_marker.find('\n').map(|i| i + 1).unwrap_or(0);
    let rest = &after_marker[content_start..];
    let end = rest.find("```")?;
    Some(&rest[..end])
}

/// Parse the block body as permissive structured data (TOML). Returns
/// `None` on any parse failure; the caller treats that the same as no
/// block being present, with no error surfaced.
pub fn parse_block(raw: &str) -> Option<toml::Table> {
    toml::from_str::<toml::Table>(raw).ok()
}

/// Convenience: extract + parse in one step.
pub fn extract_and_parse(body: &str) -> Option<toml::Table> {
    parse_block(extract_block(body)?)
}
