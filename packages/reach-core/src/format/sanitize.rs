//! Markup escaping and line-ending normalization.

/// Escape the characters that are significant inside element text.
///
/// Model output is untrusted; this runs before any other pass so later passes
/// only ever see inert text.
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Reverse [`escape_markup`] for plain-text display.
pub fn unescape_markup(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Convert `\r\n` and lone `\r` to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markup() {
        assert_eq!(
            escape_markup("<script>alert('x')</script> & more"),
            "&lt;script&gt;alert('x')&lt;/script&gt; &amp; more"
        );
    }

    #[test]
    fn test_escape_is_not_double_applied_by_unescape_roundtrip() {
        let raw = "Tom &amp; Jerry <b>";
        assert_eq!(unescape_markup(&escape_markup(raw)), raw);
    }

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
    }
}
