//! Markup helpers for rich article content.
//!
//! # Responsibility
//! - Strip markup tags to produce plain text.
//! - Derive stored excerpts and transient previews.
//! - Escape text and attribute values inserted into markup.
//!
//! # Invariants
//! - Excerpt and preview always end with the ellipsis marker.
//! - Truncation counts characters, never splits a code point.

use once_cell::sync::Lazy;
use regex::Regex;

static MARKUP_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid markup tag regex"));

/// Maximum excerpt length before the ellipsis marker.
pub const EXCERPT_MAX_CHARS: usize = 150;
/// Maximum preview length before the ellipsis marker.
pub const PREVIEW_MAX_CHARS: usize = 300;
pub const ELLIPSIS: &str = "...";

/// Removes every `<...>` tag. Entities are left untouched.
pub fn strip_markup(content: &str) -> String {
    MARKUP_TAG_RE.replace_all(content, "").into_owned()
}

/// Keeps the first `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Stored summary: markup stripped, first 150 chars, ellipsis appended.
pub fn derive_excerpt(content: &str) -> String {
    summarize(content, EXCERPT_MAX_CHARS)
}

/// Display-only preview: markup stripped, first 300 chars, ellipsis appended.
pub fn derive_preview(content: &str) -> String {
    summarize(content, PREVIEW_MAX_CHARS)
}

fn summarize(content: &str, max_chars: usize) -> String {
    let plain = strip_markup(content);
    let mut summary = truncate_chars(&plain, max_chars).to_string();
    summary.push_str(ELLIPSIS);
    summary
}

/// Escapes text for use between tags.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Escapes a value for a double-quoted attribute.
pub fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::{derive_excerpt, derive_preview, escape_attribute, strip_markup, truncate_chars};

    #[test]
    fn excerpt_strips_tags_and_appends_ellipsis() {
        assert_eq!(derive_excerpt("<p>World</p>"), "World...");
        assert_eq!(
            derive_excerpt("<p>Use <strong>bold</strong> and <em>italic</em></p>"),
            "Use bold and italic..."
        );
    }

    #[test]
    fn excerpt_limits_to_150_chars() {
        let body = format!("<p>{}</p>", "a".repeat(400));
        let excerpt = derive_excerpt(&body);
        assert_eq!(excerpt.chars().count(), 153);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn preview_limits_to_300_chars() {
        let body = "é".repeat(500);
        let preview = derive_preview(&body);
        assert_eq!(preview.chars().count(), 303);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }

    #[test]
    fn strip_markup_removes_img_tags_entirely() {
        assert_eq!(strip_markup(r#"a<img src="x.png" />b"#), "ab");
    }

    #[test]
    fn escape_attribute_quotes() {
        assert_eq!(escape_attribute(r#"a"b<c>&"#), "a&quot;b&lt;c&gt;&amp;");
    }
}
