//! String utilities
//!
//! Contains helper functions for safe string manipulation.

/// Safely truncate a string at a character boundary
///
/// Truncates to at most `max_chars` characters, never splitting a multi-byte
/// UTF-8 sequence. Submitted code and captured output routinely carry emoji
/// and non-ASCII text, so byte-index slicing is not an option for log
/// previews.
///
/// # Example
/// ```
/// use pyterm::utils::truncate_str;
///
/// let code = "print('Hello World 🌍')";
/// assert_eq!(truncate_str(code, 5), "print");
/// assert_eq!(truncate_str(code, 100), code);
/// ```
pub fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Safely truncate a string and append a suffix if truncated
///
/// # Example
/// ```
/// use pyterm::utils::truncate_with_suffix;
///
/// assert_eq!(truncate_with_suffix("for i in range(5):", 8, "…"), "for i in…");
/// assert_eq!(truncate_with_suffix("1/0", 8, "…"), "1/0");
/// ```
pub fn truncate_with_suffix(s: &str, max_chars: usize, suffix: &str) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        format!("{}{}", truncate_str(s, max_chars), suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str_ascii() {
        let text = "print('Count:', i)";
        assert_eq!(truncate_str(text, 5), "print");
        assert_eq!(truncate_str(text, 100), "print('Count:', i)");
    }

    #[test]
    fn test_truncate_str_unicode() {
        let text = "Hello, 世界!";
        assert_eq!(truncate_str(text, 7), "Hello, ");
        assert_eq!(truncate_str(text, 8), "Hello, 世");
        assert_eq!(truncate_str(text, 9), "Hello, 世界");
    }

    #[test]
    fn test_truncate_str_emoji() {
        let text = "print('Hello World 🌍')";
        // The globe sits at character 19
        assert_eq!(truncate_str(text, 19), "print('Hello World ");
        assert_eq!(truncate_str(text, 20), "print('Hello World 🌍");
    }

    #[test]
    fn test_truncate_with_suffix() {
        let text = "n = 10\na, b = 0, 1";
        assert_eq!(truncate_with_suffix(text, 6, "…"), "n = 10…");
        assert_eq!(truncate_with_suffix("1/0", 6, "…"), "1/0");
    }

    #[test]
    fn test_truncate_empty() {
        assert_eq!(truncate_str("", 10), "");
        assert_eq!(truncate_with_suffix("", 10, "…"), "");
    }
}
