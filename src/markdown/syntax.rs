//! Syntax highlighting for fenced code blocks
//!
//! Integrates syntect to color code blocks in the preview pane. The syntax
//! and theme sets are expensive to load, so a single global highlighter is
//! lazily initialized and shared.
//!
//! Unknown or missing language identifiers fall back to unhighlighted text;
//! highlighting never fails the render.

use eframe::egui::Color32;
use log::{debug, warn};
use std::sync::OnceLock;
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Style, Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Default dark theme name from syntect's built-in themes
const DARK_THEME: &str = "base16-ocean.dark";

/// Default light theme name from syntect's built-in themes
const LIGHT_THEME: &str = "InspiredGitHub";

// ─────────────────────────────────────────────────────────────────────────────
// Highlighted Segments
// ─────────────────────────────────────────────────────────────────────────────

/// A run of highlighted code with its foreground color.
#[derive(Debug, Clone)]
pub struct HighlightedSegment {
    /// The text content of this segment
    pub text: String,
    /// Foreground color for this segment
    pub foreground: Color32,
    /// Whether this segment should be italic
    pub italic: bool,
}

/// A line of highlighted segments.
#[derive(Debug, Clone)]
pub struct HighlightedLine {
    /// The segments that make up this line
    pub segments: Vec<HighlightedSegment>,
}

impl HighlightedLine {
    /// Create an unhighlighted line with a single segment.
    fn plain(text: &str, color: Color32) -> Self {
        Self {
            segments: vec![HighlightedSegment {
                text: text.to_string(),
                foreground: color,
                italic: false,
            }],
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Syntax Highlighter
// ─────────────────────────────────────────────────────────────────────────────

/// Syntax highlighter holding the cached syntect sets.
pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl SyntaxHighlighter {
    /// Load the default syntax and theme sets bundled with syntect.
    fn new() -> Self {
        debug!("Loading syntect syntax and theme sets");
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let theme_set = ThemeSet::load_defaults();
        Self {
            syntax_set,
            theme_set,
        }
    }

    /// Get the appropriate syntect theme for dark or light mode.
    fn theme_for_mode(&self, dark_mode: bool) -> &Theme {
        let name = if dark_mode { DARK_THEME } else { LIGHT_THEME };
        self.theme_set
            .themes
            .get(name)
            .or_else(|| self.theme_set.themes.values().next())
            .expect("syntect default theme set is never empty")
    }

    /// Highlight code for the given language and display mode.
    ///
    /// Falls back to plain lines in `fallback_color` when the language is not
    /// recognized or a line fails to highlight.
    pub fn highlight(
        &self,
        code: &str,
        language: &str,
        dark_mode: bool,
        fallback_color: Color32,
    ) -> Vec<HighlightedLine> {
        let theme = self.theme_for_mode(dark_mode);

        let Some(syntax) = self.find_syntax(language) else {
            debug!("No syntax found for language: {}", language);
            return code
                .lines()
                .map(|line| HighlightedLine::plain(line, fallback_color))
                .collect();
        };

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut lines = Vec::new();

        for line in LinesWithEndings::from(code) {
            match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(ranges) => {
                    let segments = ranges
                        .into_iter()
                        .map(|(style, text)| style_to_segment(style, text))
                        .collect();
                    lines.push(HighlightedLine { segments });
                }
                Err(e) => {
                    warn!("Failed to highlight line: {}", e);
                    lines.push(HighlightedLine::plain(line, fallback_color));
                }
            }
        }

        lines
    }

    /// Find a syntax definition for a fenced-code language identifier.
    fn find_syntax(&self, language: &str) -> Option<&syntect::parsing::SyntaxReference> {
        if language.is_empty() {
            return None;
        }

        let lang_lower = language.to_lowercase();

        // Map common fence identifiers to file extensions
        let extension = match lang_lower.as_str() {
            "rust" | "rs" => "rs",
            "python" | "py" => "py",
            "javascript" | "js" => "js",
            "typescript" | "ts" => "ts",
            "c" => "c",
            "cpp" | "c++" | "cxx" => "cpp",
            "csharp" | "c#" | "cs" => "cs",
            "java" => "java",
            "go" | "golang" => "go",
            "ruby" | "rb" => "rb",
            "html" | "htm" => "html",
            "css" => "css",
            "json" => "json",
            "yaml" | "yml" => "yaml",
            "toml" => "toml",
            "xml" => "xml",
            "markdown" | "md" => "md",
            "sql" => "sql",
            "shell" | "sh" | "bash" | "zsh" => "sh",
            other => other,
        };

        self.syntax_set
            .find_syntax_by_extension(extension)
            .or_else(|| self.syntax_set.find_syntax_by_name(language))
            .or_else(|| {
                self.syntax_set
                    .syntaxes()
                    .iter()
                    .find(|syntax| syntax.name.to_lowercase() == lang_lower)
            })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helper Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Convert a syntect color to egui Color32.
fn syntect_to_egui_color(color: syntect::highlighting::Color) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

/// Convert a syntect style and text run to a highlighted segment.
fn style_to_segment(style: Style, text: &str) -> HighlightedSegment {
    HighlightedSegment {
        text: text.trim_end_matches('\n').to_string(),
        foreground: syntect_to_egui_color(style.foreground),
        italic: style.font_style.contains(FontStyle::ITALIC),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Global Highlighter Instance
// ─────────────────────────────────────────────────────────────────────────────

static HIGHLIGHTER: OnceLock<SyntaxHighlighter> = OnceLock::new();

/// Get or create the global syntax highlighter.
pub fn highlighter() -> &'static SyntaxHighlighter {
    HIGHLIGHTER.get_or_init(SyntaxHighlighter::new)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_rust_code() {
        let lines = highlighter().highlight("fn main() {}\n", "rust", true, Color32::GRAY);
        assert_eq!(lines.len(), 1);
        assert!(!lines[0].segments.is_empty());
        // "fn" keyword gets its own colored segment
        assert!(lines[0].segments.iter().any(|s| s.text.contains("fn")));
    }

    #[test]
    fn test_unknown_language_falls_back_to_plain() {
        let fallback = Color32::from_rgb(1, 2, 3);
        let lines = highlighter().highlight("whatever\n", "no-such-lang", false, fallback);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].segments.len(), 1);
        assert_eq!(lines[0].segments[0].foreground, fallback);
    }

    #[test]
    fn test_empty_language_falls_back() {
        let lines = highlighter().highlight("plain text\n", "", false, Color32::GRAY);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].segments[0].text, "plain text");
    }

    #[test]
    fn test_alias_resolution() {
        // "golang" and "go" should both find the Go syntax
        let h = highlighter();
        assert!(h.find_syntax("golang").is_some());
        assert!(h.find_syntax("go").is_some());
    }

    #[test]
    fn test_segments_carry_no_trailing_newline() {
        let lines = highlighter().highlight("let x = 1;\n", "rust", false, Color32::GRAY);
        for line in &lines {
            for seg in &line.segments {
                assert!(!seg.text.ends_with('\n'));
            }
        }
    }

    #[test]
    fn test_theme_for_mode_differs() {
        let h = highlighter();
        let dark = h.theme_for_mode(true);
        let light = h.theme_for_mode(false);
        assert_ne!(dark.settings.background, light.settings.background);
    }
}
