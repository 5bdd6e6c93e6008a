//! Export functionality
//!
//! Everything that leaves the editor: rich-text clipboard copy, HTML
//! fragment generation, preview snapshotting, and PDF export.

pub mod clipboard;
pub mod html;
pub mod pdf;
pub mod snapshot;

pub use clipboard::copy_rich_text;
pub use html::html_fragment;
pub use pdf::{ExportController, EXPORT_FILE_NAME};
pub use snapshot::PreviewSnapshot;
