//! Preview snapshots and style normalization for export
//!
//! The export action never reads the live preview. It captures a snapshot of
//! the rendered view together with the realized preview metrics (content
//! width, active palette) at invocation time, then normalizes that snapshot
//! into a portable form the PDF typesetter can consume.
//!
//! Normalization is a pure transformation producing a new value rather than
//! mutating anything shared with the on-screen view, so the preview and the
//! export artifact can never alias. Every theme color is flattened to a fixed
//! opaque RGB triple (translucent colors are composited over the page
//! background); skipping this step would hand the typesetter colors it cannot
//! resolve offline.

use crate::markdown::RenderedView;
use crate::theme::Palette;
use eframe::egui::Color32;

// ─────────────────────────────────────────────────────────────────────────────
// Preview Snapshot
// ─────────────────────────────────────────────────────────────────────────────

/// A snapshot of the preview at export invocation time.
///
/// Owned by the export pipeline from the moment it is captured; the live
/// preview keeps rendering from the source text independently.
#[derive(Debug, Clone)]
pub struct PreviewSnapshot {
    /// The rendered view tree as displayed
    pub view: RenderedView,
    /// Realized width of the preview content area, in points
    pub preview_width: f32,
    /// The palette the preview was drawn with
    pub palette: Palette,
}

// ─────────────────────────────────────────────────────────────────────────────
// Portable Colors
// ─────────────────────────────────────────────────────────────────────────────

/// A fixed opaque RGB color, the only color form the typesetter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Red/green/blue as 0.0..=1.0 fractions (the PDF color space).
    pub fn to_fractions(self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

/// Flatten a possibly-translucent color to opaque RGB by alpha-compositing
/// over the given background.
fn flatten(color: Color32, background: Color32) -> Rgb8 {
    let alpha = color.a() as u16;
    if alpha == 255 {
        return Rgb8::new(color.r(), color.g(), color.b());
    }
    let blend = |fg: u8, bg: u8| -> u8 {
        ((fg as u16 * alpha + bg as u16 * (255 - alpha)) / 255) as u8
    };
    Rgb8::new(
        blend(color.r(), background.r()),
        blend(color.g(), background.g()),
        blend(color.b(), background.b()),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Portable Snapshot
// ─────────────────────────────────────────────────────────────────────────────

/// Palette reduced to fixed opaque RGB values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortablePalette {
    pub background: Rgb8,
    pub text: Rgb8,
    pub heading: Rgb8,
    pub link: Rgb8,
    pub code_text: Rgb8,
    pub code_block_bg: Rgb8,
    pub code_block_border: Rgb8,
    pub blockquote_text: Rgb8,
    pub blockquote_border: Rgb8,
    pub list_marker: Rgb8,
    pub table_border: Rgb8,
    pub table_header_bg: Rgb8,
    pub horizontal_rule: Rgb8,
}

/// A snapshot normalized for offline rasterization: the view tree plus
/// portable styling only.
#[derive(Debug, Clone)]
pub struct PortableSnapshot {
    /// The rendered view tree as displayed at capture time
    pub view: RenderedView,
    /// Realized width of the preview content area, in points
    pub preview_width: f32,
    /// Flattened palette
    pub colors: PortablePalette,
}

/// Normalize a preview snapshot into its portable form.
///
/// Pure: consumes the snapshot and produces a new value. The white-point for
/// alpha compositing is the preview background, so the exported colors equal
/// the colors the user actually saw.
pub fn normalize(snapshot: PreviewSnapshot) -> PortableSnapshot {
    let bg = snapshot.palette.background;
    let p = &snapshot.palette;

    let colors = PortablePalette {
        background: flatten(p.background, bg),
        text: flatten(p.text, bg),
        heading: flatten(p.heading, bg),
        link: flatten(p.link, bg),
        code_text: flatten(p.code_text, p.code_block_bg),
        code_block_bg: flatten(p.code_block_bg, bg),
        code_block_border: flatten(p.code_block_border, bg),
        blockquote_text: flatten(p.blockquote_text, bg),
        blockquote_border: flatten(p.blockquote_border, bg),
        list_marker: flatten(p.list_marker, bg),
        table_border: flatten(p.table_border, bg),
        table_header_bg: flatten(p.table_header_bg, bg),
        horizontal_rule: flatten(p.horizontal_rule, bg),
    };

    PortableSnapshot {
        view: snapshot.view,
        preview_width: snapshot.preview_width,
        colors,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
