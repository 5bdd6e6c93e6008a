//! Application state management for Markpane
//!
//! The central `AppState` owns the only piece of session data: the Markdown
//! source text. Everything else shown on screen (the preview tree, statistics,
//! the export artifact) is derived from it on demand and never stored across
//! frames. Nothing here is persisted; the session state dies with the window.

use crate::theme::Theme;

// ─────────────────────────────────────────────────────────────────────────────
// Default Document
// ─────────────────────────────────────────────────────────────────────────────

/// The welcome document shown when the editor starts.
pub const WELCOME_TEXT: &str = r#"# Welcome to Markpane

Type your **Markdown** here and see it rendered in real-time on the right!

## Features
- Real-time preview
- GitHub Flavored Markdown
- Copy the rendered content as rich text
- Export the preview to PDF

Try typing some Markdown below:

```rust
fn hello() {
    println!("Hello, Markdown!");
}
```
"#;

// ─────────────────────────────────────────────────────────────────────────────
// Source Text (Editor State Holder)
// ─────────────────────────────────────────────────────────────────────────────

/// The editor state holder: a single mutable Markdown string.
///
/// `set` is synchronous and total; any string is accepted, including empty
/// text and unmatched Markdown syntax. The preview derives from this value
/// within the same frame, so any copy or export action dispatched afterwards
/// observes the text it was invoked against.
#[derive(Debug, Clone)]
pub struct SourceText {
    text: String,
}

impl Default for SourceText {
    fn default() -> Self {
        Self {
            text: WELCOME_TEXT.to_string(),
        }
    }
}

impl SourceText {
    /// Create a source holder with the given initial text.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Read the current source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the source text.
    pub fn set(&mut self, new_text: String) {
        self.text = new_text;
    }

    /// Mutable access for the editor widget, which edits in place.
    pub fn text_mut(&mut self) -> &mut String {
        &mut self.text
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Text Statistics
// ─────────────────────────────────────────────────────────────────────────────

/// Word, character, and line counts for the status bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStats {
    /// Number of words (sequences of non-whitespace characters)
    pub words: usize,
    /// Number of characters including whitespace
    pub characters: usize,
    /// Number of lines (including empty lines)
    pub lines: usize,
}

impl TextStats {
    /// Calculate statistics from the given text in a single pass.
    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            return Self {
                words: 0,
                characters: 0,
                lines: 1, // Empty document has 1 line
            };
        }

        let mut stats = Self {
            lines: 1,
            ..Self::default()
        };
        let mut in_word = false;

        for ch in text.chars() {
            stats.characters += 1;
            if ch == '\n' {
                stats.lines += 1;
            }
            if ch.is_whitespace() {
                in_word = false;
            } else if !in_word {
                in_word = true;
                stats.words += 1;
            }
        }

        stats
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// UI State
// ─────────────────────────────────────────────────────────────────────────────

/// Transient UI state: toast notifications.
#[derive(Debug, Clone, Default)]
struct UiState {
    /// Temporary toast message (shown in the status bar)
    toast_message: Option<String>,
    /// When the toast message should expire (seconds since app start)
    toast_expires_at: Option<f64>,
    /// Whether the toast reports a failure (rendered in the error color)
    toast_is_error: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// App State
// ─────────────────────────────────────────────────────────────────────────────

/// Central application state.
pub struct AppState {
    /// The Markdown source text, the only session data
    pub source: SourceText,
    /// Active theme variant
    pub theme: Theme,
    /// Transient UI state
    ui: UiState,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Create the initial state with the welcome document.
    pub fn new() -> Self {
        Self {
            source: SourceText::default(),
            theme: Theme::default(),
            ui: UiState::default(),
        }
    }

    /// Statistics for the current source text.
    pub fn stats(&self) -> TextStats {
        TextStats::from_text(self.source.text())
    }

    /// Show a temporary toast message.
    pub fn show_toast(&mut self, message: impl Into<String>, current_time: f64, duration: f64) {
        self.ui.toast_message = Some(message.into());
        self.ui.toast_expires_at = Some(current_time + duration);
        self.ui.toast_is_error = false;
    }

    /// Show a failure toast in the error color.
    pub fn show_error_toast(
        &mut self,
        message: impl Into<String>,
        current_time: f64,
        duration: f64,
    ) {
        self.show_toast(message, current_time, duration);
        self.ui.toast_is_error = true;
    }

    /// Clear expired toasts.
    pub fn update_toast(&mut self, current_time: f64) {
        if let Some(expires_at) = self.ui.toast_expires_at {
            if current_time >= expires_at {
                self.ui.toast_message = None;
                self.ui.toast_expires_at = None;
                self.ui.toast_is_error = false;
            }
        }
    }

    /// The active toast, if any, and whether it is an error.
    pub fn toast(&self) -> Option<(&str, bool)> {
        self.ui
            .toast_message
            .as_deref()
            .map(|msg| (msg, self.ui.toast_is_error))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_defaults_to_welcome() {
        let source = SourceText::default();
        assert!(source.text().starts_with("# Welcome to Markpane"));
    }

    #[test]
    fn test_set_accepts_any_string() {
        let mut source = SourceText::default();
        for input in ["", "   ", "**unmatched", "<script>x</script>"] {
            source.set(input.to_string());
            assert_eq!(source.text(), input);
        }
    }

    #[test]
    fn test_set_is_synchronous() {
        let mut source = SourceText::with_text("old");
        source.set("new".to_string());
        // The next read reflects the new value immediately
        assert_eq!(source.text(), "new");
    }

    #[test]
    fn test_stats_empty() {
        let stats = TextStats::from_text("");
        assert_eq!(stats.words, 0);
        assert_eq!(stats.characters, 0);
        assert_eq!(stats.lines, 1);
    }

    #[test]
    fn test_stats_counts() {
        let stats = TextStats::from_text("Hello, World!\nSecond line");
        assert_eq!(stats.words, 4);
        assert_eq!(stats.lines, 2);
        assert_eq!(stats.characters, 25);
    }

    #[test]
    fn test_stats_whitespace_only() {
        let stats = TextStats::from_text("  \n \t ");
        assert_eq!(stats.words, 0);
        assert_eq!(stats.lines, 2);
    }

    #[test]
    fn test_toast_lifecycle() {
        let mut state = AppState::new();
        assert!(state.toast().is_none());

        state.show_toast("Copied", 1.0, 2.0);
        assert_eq!(state.toast(), Some(("Copied", false)));

        state.update_toast(2.5);
        assert!(state.toast().is_some());

        state.update_toast(3.5);
        assert!(state.toast().is_none());
    }

    #[test]
    fn test_error_toast_flag() {
        let mut state = AppState::new();
        state.show_error_toast("Copy failed", 0.0, 3.0);
        assert_eq!(state.toast(), Some(("Copy failed", true)));
    }
}
