use crate::constants::audit::{PREVIEW_CHARS, TRUNCATION_MARKER};

/// First `max_chars` characters of `value`, never splitting a code point.
pub fn truncate_chars(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((end, _)) => &value[..end],
        None => value,
    }
}

/// Audit preview of a response body: the body itself when it fits in
/// `PREVIEW_CHARS` characters, else that prefix plus the truncation marker.
pub fn content_preview(body: &str) -> String {
    let prefix = truncate_chars(body, PREVIEW_CHARS);
    if prefix.len() == body.len() {
        return body.to_string();
    }
    format!("{}{}", prefix, TRUNCATION_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_chars_counts_code_points() {
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("a😀b", 2), "a😀");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn preview_keeps_short_bodies_intact() {
        let body = "x".repeat(500);
        assert_eq!(content_preview(&body), body);
        assert_eq!(content_preview(""), "");
    }

    #[test]
    fn preview_truncates_long_bodies_with_marker() {
        let body = "y".repeat(501);
        let preview = content_preview(&body);
        assert_eq!(preview, format!("{}...", "y".repeat(500)));
    }

    #[test]
    fn preview_limit_is_in_characters_not_bytes() {
        let body = "é".repeat(500);
        assert_eq!(content_preview(&body), body);

        let body = "é".repeat(600);
        let preview = content_preview(&body);
        assert_eq!(preview.chars().count(), 503);
        assert!(preview.ends_with("..."));
    }
}
