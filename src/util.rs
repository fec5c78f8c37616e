//! Small helpers shared across modules.

/// Sanitizes text for safe logging by truncating and escaping control characters.
///
/// This function:
/// - Truncates long text to prevent log flooding
/// - Replaces control characters that could manipulate log output
/// - Escapes newlines to prevent log injection
pub(crate) fn sanitize_for_logging(text: &str, max_len: usize) -> String {
    let sanitized: String = text
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect();

    if sanitized.chars().count() > max_len {
        let truncated: String = sanitized.chars().take(max_len).collect();
        format!("{}... [truncated, {} total bytes]", truncated, text.len())
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_control_characters() {
        assert_eq!(sanitize_for_logging("a\nb\rc\td\u{7}", 50), "a b c d?");
    }

    #[test]
    fn test_sanitize_truncates_on_char_boundary() {
        let text = "ééééé";
        assert_eq!(
            sanitize_for_logging(text, 2),
            "éé... [truncated, 10 total bytes]"
        );
    }
}
