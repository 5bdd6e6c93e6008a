//! Rendered Markdown preview
//!
//! Paints the rendered view tree into the preview pane and reports the
//! realized content width, which the PDF exporter captures alongside the
//! tree when it snapshots the preview.

mod renderer;

pub use renderer::show_preview;
