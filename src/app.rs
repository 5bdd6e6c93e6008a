//! Main application
//!
//! Owns the split-pane layout: Markdown source editor on the left, rendered
//! preview on the right. The preview is re-derived from the source text every
//! frame, so edits are visible within the same frame they are typed. Copy and
//! export always operate on the text as it stands when triggered.

use crate::export::{self, ExportController, PreviewSnapshot};
use crate::files;
use crate::markdown::render;
use crate::preview::show_preview;
use crate::state::AppState;
use crate::theme::Theme;
use crate::ui::{Toolbar, ToolbarAction};
use eframe::egui;
use log::{debug, info, warn};

/// The split-pane Markdown editor application.
pub struct MarkpaneApp {
    /// Central application state
    state: AppState,
    /// Toolbar component
    toolbar: Toolbar,
    /// Single-flight PDF export pipeline
    export: ExportController,
    /// Realized preview content width from the last frame, in ui points
    preview_width: f32,
    /// Theme applied to the egui context, to avoid resetting visuals per frame
    applied_theme: Option<Theme>,
    /// Application start time for timing toast messages
    start_time: std::time::Instant,
}

impl MarkpaneApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        info!("Initializing Markpane");

        Self {
            state: AppState::new(),
            toolbar: Toolbar::new(),
            export: ExportController::new(),
            preview_width: 0.0,
            applied_theme: None,
            start_time: std::time::Instant::now(),
        }
    }

    /// Get elapsed time since app start in seconds.
    fn get_app_time(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Apply the active theme to the egui context when it changes.
    fn apply_theme(&mut self, ctx: &egui::Context) {
        if self.applied_theme != Some(self.state.theme) {
            ctx.set_visuals(self.state.theme.palette().to_visuals());
            self.applied_theme = Some(self.state.theme);
            debug!("Applied theme: {:?}", self.state.theme);
        }
    }

    /// Check for keyboard shortcuts and return the matching action.
    fn handle_keyboard_shortcuts(&self, ctx: &egui::Context) -> Option<ToolbarAction> {
        ctx.input(|i| {
            // Ctrl+Shift+C: Copy as rich text
            if i.modifiers.ctrl && i.modifiers.shift && i.key_pressed(egui::Key::C) {
                debug!("Keyboard shortcut: Ctrl+Shift+C (Copy Rich Text)");
                return Some(ToolbarAction::CopyRichText);
            }

            // Ctrl+E: Export PDF
            if i.modifiers.ctrl && !i.modifiers.shift && i.key_pressed(egui::Key::E) {
                debug!("Keyboard shortcut: Ctrl+E (Export PDF)");
                return Some(ToolbarAction::ExportPdf);
            }

            // Ctrl+Shift+T: Toggle theme
            if i.modifiers.ctrl && i.modifiers.shift && i.key_pressed(egui::Key::T) {
                debug!("Keyboard shortcut: Ctrl+Shift+T (Toggle Theme)");
                return Some(ToolbarAction::ToggleTheme);
            }

            None
        })
    }

    fn handle_action(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::CopyRichText => self.handle_copy(),
            ToolbarAction::ExportPdf => self.handle_export(),
            ToolbarAction::ToggleTheme => {
                self.state.theme = self.state.theme.toggled();
                info!("Switched theme to {:?}", self.state.theme);
            }
        }
    }

    /// Copy the rendered document to the clipboard as rich text with a plain
    /// text fallback. Failure never touches the source text.
    fn handle_copy(&mut self) {
        let source = self.state.source.text();
        let html = export::html_fragment(source);
        let plain = render(source).plain_text();

        let time = self.get_app_time();
        match export::copy_rich_text(&html, &plain) {
            Ok(()) => {
                info!("Copied rich text to clipboard");
                self.state.show_toast("Copied to clipboard", time, 2.0);
            }
            Err(e) => {
                warn!("Failed to copy to clipboard: {}", e);
                self.state
                    .show_error_toast(format!("Copy failed: {}", e), time, 3.0);
            }
        }
    }

    /// Snapshot the preview and hand it to the export pipeline.
    ///
    /// A second trigger while an export runs is ignored with a notice; the
    /// running export owns the snapshot and finishes undisturbed.
    fn handle_export(&mut self) {
        let time = self.get_app_time();
        if self.export.is_busy() {
            self.state
                .show_toast("Export already in progress", time, 2.0);
            return;
        }

        let Some(path) = files::save_pdf_dialog() else {
            debug!("PDF export cancelled");
            return;
        };

        let snapshot = PreviewSnapshot {
            view: render(self.state.source.text()),
            preview_width: self.preview_width,
            palette: self.state.theme.palette(),
        };

        if self.export.try_start(snapshot, path) {
            self.state.show_toast("Exporting PDF\u{2026}", time, 2.0);
        } else {
            self.state
                .show_toast("Export already in progress", time, 2.0);
        }
    }

    /// Collect the outcome of a finished export, if any.
    fn poll_export(&mut self) {
        if let Some(outcome) = self.export.poll() {
            let time = self.get_app_time();
            match outcome {
                Ok(path) => {
                    let name = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("PDF")
                        .to_string();
                    self.state
                        .show_toast(format!("Exported {}", name), time, 3.0);
                }
                Err(e) => {
                    self.state
                        .show_error_toast(format!("Export failed: {}", e), time, 4.0);
                }
            }
        }
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        let palette = self.state.theme.palette();
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let stats = self.state.stats();
                ui.label(format!("{} words", stats.words));
                ui.separator();
                ui.label(format!("{} characters", stats.characters));
                ui.separator();
                ui.label(format!("{} lines", stats.lines));

                if self.export.is_busy() {
                    ui.separator();
                    ui.label(
                        egui::RichText::new(format!("Export: {}", self.export.phase().label()))
                            .color(palette.text_muted),
                    );
                }

                if let Some((message, is_error)) = self.state.toast() {
                    let color = if is_error {
                        palette.error
                    } else {
                        palette.success
                    };
                    let text = egui::RichText::new(message).italics().color(color);
                    ui.with_layout(
                        egui::Layout::centered_and_justified(egui::Direction::LeftToRight),
                        |ui| {
                            ui.label(text);
                        },
                    );
                }
            });
        });
    }
}

impl eframe::App for MarkpaneApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_theme(ctx);

        let time = self.get_app_time();
        self.state.update_toast(time);

        self.poll_export();
        if self.export.is_busy() {
            // Keep polling while the worker runs
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        let mut action = self.handle_keyboard_shortcuts(ctx);

        let palette = self.state.theme.palette();
        let is_dark = palette.is_dark();

        egui::TopBottomPanel::top("toolbar")
            .exact_height(self.toolbar.height())
            .show(ctx, |ui| {
            if let Some(toolbar_action) =
                self.toolbar
                    .show(ui, &palette, is_dark, self.export.is_busy())
            {
                action = Some(toolbar_action);
            }
        });

        self.show_status_bar(ctx);

        // Editor pane (left)
        egui::SidePanel::left("editor_pane")
            .resizable(true)
            .default_width(ctx.screen_rect().width() / 2.0)
            .min_width(200.0)
            .show(ctx, |ui| {
                egui::Frame::none()
                    .fill(palette.editor_background)
                    .show(ui, |ui| {
                        egui::ScrollArea::vertical()
                            .id_source("editor_scroll")
                            .show(ui, |ui| {
                                ui.add_sized(
                                    ui.available_size(),
                                    egui::TextEdit::multiline(self.state.source.text_mut())
                                        .font(egui::TextStyle::Monospace)
                                        .frame(false)
                                        .desired_width(f32::INFINITY),
                                );
                            });
                    });
            });

        // Preview pane (right); re-rendered from the source every frame
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .id_source("preview_scroll")
                .show(ui, |ui| {
                    let view = render(self.state.source.text());
                    self.preview_width = show_preview(ui, &view, &palette, is_dark);
                });
        });

        if let Some(action) = action {
            self.handle_action(action);
        }
    }
}
