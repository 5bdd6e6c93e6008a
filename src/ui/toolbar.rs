//! Toolbar UI component
//!
//! Icon-based toolbar strip across the top of the window. Rendering returns
//! the triggered action, if any; the app loop dispatches it.

use crate::theme::Palette;
use eframe::egui::{self, Color32, Response, RichText, Ui, Vec2};

/// Toolbar height.
const TOOLBAR_HEIGHT: f32 = 36.0;

/// Size of icon buttons.
const ICON_BUTTON_SIZE: Vec2 = Vec2::new(32.0, 28.0);

/// Actions that can be triggered from the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    /// Copy the rendered document to the clipboard as rich text
    CopyRichText,
    /// Export the rendered document as a PDF file
    ExportPdf,
    /// Switch between light and dark theme
    ToggleTheme,
}

/// Toolbar rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct Toolbar;

impl Toolbar {
    pub fn new() -> Self {
        Self
    }

    pub fn height(&self) -> f32 {
        TOOLBAR_HEIGHT
    }

    /// Render the toolbar and return any triggered action.
    ///
    /// `export_busy` disables the export button while a PDF export is in
    /// flight; copy stays available throughout.
    pub fn show(
        &self,
        ui: &mut Ui,
        palette: &Palette,
        is_dark: bool,
        export_busy: bool,
    ) -> Option<ToolbarAction> {
        let mut action: Option<ToolbarAction> = None;

        let toolbar_bg = if is_dark {
            Color32::from_rgb(40, 40, 40)
        } else {
            Color32::from_rgb(248, 248, 248)
        };
        let separator_color = if is_dark {
            Color32::from_rgb(70, 70, 70)
        } else {
            Color32::from_rgb(210, 210, 210)
        };

        ui.painter()
            .rect_filled(ui.available_rect_before_wrap(), 0.0, toolbar_bg);

        ui.horizontal(|ui| {
            ui.set_height(TOOLBAR_HEIGHT);
            ui.spacing_mut().item_spacing.x = 2.0;

            ui.add_space(6.0);
            ui.label(
                RichText::new("Export")
                    .size(10.0)
                    .color(palette.text_muted),
            );

            if icon_button(ui, "📋", "Copy as rich text (Ctrl+Shift+C)", true, is_dark).clicked() {
                action = Some(ToolbarAction::CopyRichText);
            }

            let export_tooltip = if export_busy {
                "Export in progress"
            } else {
                "Export as PDF (Ctrl+E)"
            };
            if icon_button(ui, "📄", export_tooltip, !export_busy, is_dark).clicked() {
                action = Some(ToolbarAction::ExportPdf);
            }

            ui.add_space(4.0);
            vertical_separator(ui, separator_color, TOOLBAR_HEIGHT - 8.0);
            ui.add_space(4.0);

            ui.label(
                RichText::new("View")
                    .size(10.0)
                    .color(palette.text_muted),
            );

            let theme_icon = if is_dark { "☀" } else { "🌙" };
            let theme_tooltip = if is_dark {
                "Switch to light theme"
            } else {
                "Switch to dark theme"
            };
            if icon_button(ui, theme_icon, theme_tooltip, true, is_dark).clicked() {
                action = Some(ToolbarAction::ToggleTheme);
            }
        });

        action
    }
}

/// Render an icon button with hover highlight and tooltip.
fn icon_button(ui: &mut Ui, icon: &str, tooltip: &str, enabled: bool, is_dark: bool) -> Response {
    let text_color = if enabled {
        if is_dark {
            Color32::from_rgb(220, 220, 220)
        } else {
            Color32::from_rgb(50, 50, 50)
        }
    } else if is_dark {
        Color32::from_rgb(100, 100, 100)
    } else {
        Color32::from_rgb(160, 160, 160)
    };

    let hover_bg = if is_dark {
        Color32::from_rgb(60, 60, 60)
    } else {
        Color32::from_rgb(220, 220, 220)
    };

    let btn = ui.add_enabled(
        enabled,
        egui::Button::new(RichText::new(" ").size(16.0))
            .frame(false)
            .min_size(ICON_BUTTON_SIZE),
    );

    if btn.hovered() && enabled {
        ui.painter()
            .rect_filled(btn.rect, egui::Rounding::same(3.0), hover_bg);
    }

    ui.painter().text(
        btn.rect.center(),
        egui::Align2::CENTER_CENTER,
        icon,
        egui::FontId::proportional(16.0),
        text_color,
    );

    btn.on_hover_text(tooltip)
}

fn vertical_separator(ui: &mut Ui, color: Color32, height: f32) {
    let (rect, _response) = ui.allocate_exact_size(Vec2::new(1.0, height), egui::Sense::hover());
    ui.painter().line_segment(
        [rect.center_top(), rect.center_bottom()],
        egui::Stroke::new(1.0, color),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toolbar_height() {
        let toolbar = Toolbar::new();
        assert_eq!(toolbar.height(), TOOLBAR_HEIGHT);
    }
}
