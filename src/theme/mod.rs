//! Theme system for Markpane
//!
//! Defines the light and dark palettes used by the preview pane and, through
//! the export snapshot, by the PDF pipeline. The palette is the single source
//! of truth for preview colors: the exporter captures it at snapshot time and
//! flattens it to portable RGB values.

use eframe::egui::{Color32, Visuals};

// ─────────────────────────────────────────────────────────────────────────────
// Theme Variant
// ─────────────────────────────────────────────────────────────────────────────

/// The active theme variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Toggle between light and dark.
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Get the palette for this theme variant.
    pub fn palette(self) -> Palette {
        match self {
            Theme::Light => Palette::light(),
            Theme::Dark => Palette::dark(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Palette
// ─────────────────────────────────────────────────────────────────────────────

/// Colors for the preview pane and UI chrome.
///
/// Every color here may be captured into an export snapshot, so all values
/// are plain opaque RGB. Anything translucent would be flattened by
/// `export::snapshot::normalize` anyway, but starting opaque keeps the
/// on-screen preview and the exported PDF visually identical.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    /// Window and preview background
    pub background: Color32,
    /// Editor pane background
    pub editor_background: Color32,
    /// Primary text color
    pub text: Color32,
    /// Muted text (status bar, placeholders)
    pub text_muted: Color32,
    /// Heading text color (H1-H6)
    pub heading: Color32,
    /// Link text color
    pub link: Color32,
    /// Inline code text color
    pub code_text: Color32,
    /// Code block background
    pub code_block_bg: Color32,
    /// Code block border
    pub code_block_border: Color32,
    /// Block quote text color
    pub blockquote_text: Color32,
    /// Block quote border color
    pub blockquote_border: Color32,
    /// List marker color (bullets, numbers, checkboxes)
    pub list_marker: Color32,
    /// Table border color
    pub table_border: Color32,
    /// Table header background
    pub table_header_bg: Color32,
    /// Horizontal rule color
    pub horizontal_rule: Color32,
    /// Accent color (buttons, active elements)
    pub accent: Color32,
    /// Error feedback color
    pub error: Color32,
    /// Success feedback color
    pub success: Color32,
}

impl Palette {
    /// Light theme palette.
    pub fn light() -> Self {
        Self {
            background: Color32::from_rgb(255, 255, 255),
            editor_background: Color32::from_rgb(250, 250, 250),
            text: Color32::from_rgb(30, 30, 30),
            text_muted: Color32::from_rgb(120, 120, 120),
            heading: Color32::from_rgb(0, 100, 180),
            link: Color32::from_rgb(0, 100, 180),
            code_text: Color32::from_rgb(80, 80, 80),
            code_block_bg: Color32::from_rgb(233, 236, 239),
            code_block_border: Color32::from_rgb(195, 202, 210),
            blockquote_text: Color32::from_rgb(100, 100, 100),
            blockquote_border: Color32::from_rgb(200, 200, 200),
            list_marker: Color32::from_rgb(100, 100, 100),
            table_border: Color32::from_rgb(200, 205, 210),
            table_header_bg: Color32::from_rgb(240, 242, 245),
            horizontal_rule: Color32::from_rgb(200, 200, 200),
            accent: Color32::from_rgb(0, 120, 212),
            error: Color32::from_rgb(220, 53, 69),
            success: Color32::from_rgb(40, 167, 69),
        }
    }

    /// Dark theme palette.
    pub fn dark() -> Self {
        Self {
            background: Color32::from_rgb(30, 30, 30),
            editor_background: Color32::from_rgb(37, 37, 37),
            text: Color32::from_rgb(220, 220, 220),
            text_muted: Color32::from_rgb(140, 140, 140),
            heading: Color32::from_rgb(100, 180, 255),
            link: Color32::from_rgb(100, 180, 255),
            code_text: Color32::from_rgb(200, 200, 150),
            code_block_bg: Color32::from_rgb(35, 39, 46),
            code_block_border: Color32::from_rgb(55, 60, 68),
            blockquote_text: Color32::from_rgb(180, 180, 180),
            blockquote_border: Color32::from_rgb(80, 80, 80),
            list_marker: Color32::from_rgb(150, 150, 150),
            table_border: Color32::from_rgb(60, 65, 75),
            table_header_bg: Color32::from_rgb(45, 50, 60),
            horizontal_rule: Color32::from_rgb(80, 80, 80),
            accent: Color32::from_rgb(100, 180, 255),
            error: Color32::from_rgb(255, 100, 100),
            success: Color32::from_rgb(75, 210, 100),
        }
    }

    /// Check if this is a dark palette.
    pub fn is_dark(&self) -> bool {
        self.background.r() < 128
    }

    /// Convert to egui Visuals for UI styling.
    pub fn to_visuals(&self) -> Visuals {
        let mut visuals = if self.is_dark() {
            Visuals::dark()
        } else {
            Visuals::light()
        };
        visuals.panel_fill = self.background;
        visuals.window_fill = self.background;
        visuals.extreme_bg_color = self.editor_background;
        visuals.hyperlink_color = self.link;
        visuals.selection.bg_fill = self.accent.linear_multiply(0.4);
        visuals
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_palette_is_light() {
        let palette = Palette::light();
        assert!(palette.background.r() > 200);
        assert!(!palette.is_dark());
    }

    #[test]
    fn test_dark_palette_is_dark() {
        let palette = Palette::dark();
        assert!(palette.background.r() < 50);
        assert!(palette.is_dark());
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }

    #[test]
    fn test_theme_palette_roundtrip() {
        assert!(!Theme::Light.palette().is_dark());
        assert!(Theme::Dark.palette().is_dark());
    }

    #[test]
    fn test_text_contrast() {
        // Dark text on light background, light text on dark background
        assert!(Palette::light().text.r() < 50);
        assert!(Palette::dark().text.r() > 200);
    }

    #[test]
    fn test_all_colors_opaque() {
        // Snapshot capture assumes opaque palette colors
        let palettes = [Palette::light(), Palette::dark()];
        for p in palettes {
            for c in [
                p.background,
                p.text,
                p.heading,
                p.link,
                p.code_text,
                p.code_block_bg,
                p.blockquote_text,
                p.table_header_bg,
            ] {
                assert_eq!(c.a(), 255);
            }
        }
    }

    #[test]
    fn test_to_visuals_matches_mode() {
        assert!(!Palette::light().to_visuals().dark_mode);
        assert!(Palette::dark().to_visuals().dark_mode);
        assert_eq!(
            Palette::dark().to_visuals().panel_fill,
            Palette::dark().background
        );
    }
}
