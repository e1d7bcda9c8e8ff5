//! Trigger detection: a thought warrants an audit only when its body
//! matches at least one of a fenced `gan-config` block, any fenced code
//! block, diff markers, or recognizable language tokens.

const LANGUAGE_TOKENS: &[&str] = &[
    "fn ", "fn(", "pub fn", "impl ", "struct ", "def ", "class ", "function ", "function(",
    "const ", "let ", "var ", "import ", "#include", "public class", "public static",
    "=> {", "=>{", "return ", "async fn", "async function",
];

/// True if `body` contains anything that should make the Orchestrator
/// attempt an audit cycle.
pub fn has_trigger(body: &str) -> bool {
    has_gan_config_block(body) || has_fenced_code_block(body) || has_diff_markers(body) || has_language_tokens(body)
}

fn has_gan_config_block(body: &str) -> bool {
    body.contains("```gan-config")
}

fn has_fenced_code_block(body: &str) -> bool {
    body.contains("```")
}

fn has_diff_markers(body: &str) -> bool {
    if body.contains("diff --git") || body.contains("@@") {
        return true;
    }
    body.lines().any(|line| {
        let bytes = line.as_bytes();
        matches!(bytes.first(), Some(b'+') | Some(b'-')) && !matches!(bytes.get(1), Some(b' ') | None)
    })
}

fn has_language_tokens(body: &str) -> bool {
    LANGUAGE_TOKENS.iter().any(|tok| body.contains(tok))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_prose_has_no_trigger() {
        assert!(!has_trigger("Plan next steps."));
    }

    #[test]
    fn test_fenced_code_block_triggers() {
        assert!(has_trigger("here is some code:\n```rust\nfn main() {}\n```\n"));
    }

    #[test]
    fn test_gan_config_block_triggers() {
        assert!(has_trigger("```gan-config\nthreshold = 90\n```"));
    }

    #[test]
    fn test_diff_git_header_triggers() {
        assert!(has_trigger("diff --git a/src/lib.rs b/src/lib.rs\n+fn new() {}\n"));
    }

    #[test]
    fn test_unified_diff_hunk_triggers() {
        assert!(has_trigger("@@ -1,3 +1,4 @@\n+added line\n"));
    }

    #[test]
    fn test_markdown_bullet_list_does_not_trigger() {
        assert!(!has_trigger("- first item\n- second item\n- third item\n"));
    }

    #[test]
    fn test_bare_language_token_triggers_without_fence() {
        assert!(has_trigger("I added a new function fn compute(x: i32) -> i32 { x + 1 }"));
    }
}
