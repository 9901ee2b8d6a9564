//! Utilities for sanitizing error messages.
//!
//! Removes control characters from error messages before they are stored in
//! the database or printed in the run summary, and truncates long ones.

/// Sanitizes an error message by removing control characters.
///
/// Newline, tab and carriage return are kept; non-ASCII text (shop names,
/// Cyrillic product names) is preserved.
pub fn sanitize_error_message(message: &str) -> String {
    message
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'))
        .collect()
}

/// Sanitizes and truncates an error message to `MAX_ERROR_MESSAGE_LENGTH` characters.
///
/// Truncation counts characters, not bytes, so multi-byte text is never cut
/// inside a code point.
pub fn sanitize_and_truncate_error_message(message: &str) -> String {
    truncate_chars(
        &sanitize_error_message(message),
        crate::config::MAX_ERROR_MESSAGE_LENGTH,
    )
}

/// Truncates `text` to at most `max_chars` characters, noting the original length.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(50).max(1);
    let head: String = text.chars().take(keep).collect();
    format!("{}... (truncated, original length: {} chars)", head, total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_error_message_removes_control_chars() {
        let input = "Error\x00message\x01with\x02control\x03chars";
        assert_eq!(sanitize_error_message(input), "Errormessagewithcontrolchars");
    }

    #[test]
    fn test_sanitize_keeps_whitespace_and_unicode() {
        let input = "Ошибка:\tстрока\nдва";
        assert_eq!(sanitize_error_message(input), input);
    }

    #[test]
    fn test_truncate_is_char_boundary_safe() {
        let input = "ж".repeat(3000);
        let out = sanitize_and_truncate_error_message(&input);
        assert!(out.contains("truncated, original length: 3000 chars"));
        assert!(out.starts_with("жж"));
    }

    #[test]
    fn test_short_message_unchanged() {
        assert_eq!(sanitize_and_truncate_error_message("short"), "short");
    }
}
