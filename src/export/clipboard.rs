//! Clipboard operations for the copy action
//!
//! Writes the rendered content to the system clipboard as rich HTML with a
//! plain-text fallback, using arboard. Apps that understand the HTML format
//! (mail clients, word processors) paste formatted content; everything else
//! gets the flattened text of the rendered view.
//!
//! Clipboard failures (permission denied, no display server) are returned to
//! the caller, which surfaces them as a toast. The source text is never
//! touched on any path.

use crate::error::{Error, Result};
use arboard::Clipboard;

/// Copy rich HTML with a plain-text fallback to the system clipboard.
pub fn copy_rich_text(html: &str, plain_text: &str) -> Result<()> {
    let mut clipboard = Clipboard::new().map_err(|e| Error::ClipboardAccess(e.to_string()))?;

    clipboard
        .set_html(html, Some(plain_text))
        .map_err(|e| Error::ClipboardWrite(e.to_string()))?;

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
