//! Native file dialog integration using the rfd crate

use crate::export::EXPORT_FILE_NAME;
use rfd::FileDialog;
use std::path::PathBuf;

const PDF_EXTENSIONS: &[&str] = &["pdf"];

/// Opens a native save dialog for the PDF export.
///
/// The suggested filename is always the same; the user picks the directory
/// and may rename. Returns `None` if cancelled.
pub fn save_pdf_dialog() -> Option<PathBuf> {
    FileDialog::new()
        .add_filter("PDF Files", PDF_EXTENSIONS)
        .set_file_name(EXPORT_FILE_NAME)
        .save_file()
}
