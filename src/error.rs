//! Centralized error handling for Markpane
//!
//! This module provides a unified error type covering the two fallible
//! action boundaries of the application: clipboard copy and PDF export.
//! Both are recovered locally and surfaced to the user as a toast; neither
//! ever mutates the source text.

use std::fmt;
use std::io;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Custom Result Type Alias
// ─────────────────────────────────────────────────────────────────────────────

/// A specialized `Result` type for the application.
pub type Result<T> = std::result::Result<T, Error>;

/// The centralized error type for the application.
#[derive(Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Clipboard Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to open the system clipboard (permission denied / unavailable)
    ClipboardAccess(String),

    /// Failed to write content to the clipboard
    ClipboardWrite(String),

    // ─────────────────────────────────────────────────────────────────────────
    // Export Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// PDF typesetting or document assembly failed
    PdfRender(String),

    /// Failed to write the PDF file to disk
    PdfWrite { path: PathBuf, source: io::Error },
}

impl From<arboard::Error> for Error {
    fn from(err: arboard::Error) -> Self {
        Error::ClipboardWrite(err.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Display trait implementation for user-friendly error messages
// ─────────────────────────────────────────────────────────────────────────────
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ClipboardAccess(msg) => write!(f, "Clipboard unavailable: {}", msg),
            Error::ClipboardWrite(msg) => write!(f, "Clipboard write failed: {}", msg),
            Error::PdfRender(msg) => write!(f, "PDF rendering failed: {}", msg),
            Error::PdfWrite { path, source } => {
                write!(f, "Failed to write '{}': {}", path.display(), source)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// std::error::Error trait implementation for error chaining
// ─────────────────────────────────────────────────────────────────────────────
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::PdfWrite { source, .. } => Some(source),
            Error::ClipboardAccess(_)
            | Error::ClipboardWrite(_)
            | Error::PdfRender(_) => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clipboard_access_display() {
        let err = Error::ClipboardAccess("no display".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("Clipboard unavailable"));
        assert!(msg.contains("no display"));
    }

    #[test]
    fn test_pdf_write_error() {
        let path = PathBuf::from("/tmp/markdown-export.pdf");
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "read-only");
        let err = Error::PdfWrite {
            path: path.clone(),
            source: io_err,
        };
        assert!(matches!(err, Error::PdfWrite { path: p, .. } if p == path));
    }

    #[test]
    fn test_pdf_write_has_source() {
        use std::error::Error as StdError;
        let err = Error::PdfWrite {
            path: PathBuf::from("out.pdf"),
            source: io::Error::new(io::ErrorKind::Other, "disk full"),
        };
        assert!(err.source().is_some());
    }

    #[test]
    fn test_simple_variants_have_no_source() {
        use std::error::Error as StdError;
        assert!(Error::PdfRender("layout".to_string()).source().is_none());
        assert!(Error::ClipboardWrite("denied".to_string()).source().is_none());
    }

    #[test]
    fn test_display_pdf_render() {
        let err = Error::PdfRender("zero-width page".to_string());
        assert!(err.to_string().contains("PDF rendering failed"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_err() -> super::Result<()> {
            Err(Error::PdfRender("test".to_string()))
        }
        assert!(returns_err().is_err());
    }
}
