//! HTML fragment generation for the clipboard payload
//!
//! The copy action writes rich content to the clipboard. The payload is an
//! HTML fragment produced by comrak from the current source text, using the
//! same fixed GFM option set as the preview renderer so the pasted content
//! matches what is on screen.

use crate::markdown::parser::comrak_options;
use comrak::markdown_to_html;

/// Generate an HTML fragment (no doctype or head) for clipboard use.
pub fn html_fragment(source: &str) -> String {
    markdown_to_html(source, &comrak_options())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_has_no_document_wrapper() {
        let html = html_fragment("**Bold** and *italic*");
        assert!(!html.contains("<!DOCTYPE"));
        assert!(html.contains("<strong>"));
        assert!(html.contains("<em>"));
    }

    #[test]
    fn test_fragment_renders_gfm_table() {
        let html = html_fragment("| A | B |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>A</th>"));
    }

    #[test]
    fn test_fragment_escapes_raw_html() {
        // Safe rendering: script content must not survive as executable markup
        let html = html_fragment("<script>alert('x')</script>");
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_empty_source_yields_empty_fragment() {
        assert_eq!(html_fragment(""), "");
    }
}
