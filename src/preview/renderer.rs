//! Read-only preview rendering
//!
//! Walks the rendered view tree and paints it with egui widgets. The preview
//! is a pure projection of the tree: it holds no state of its own and never
//! writes back to the source text. Inline styling accumulates down the tree
//! so nested emphasis (bold inside italic inside a link) composes correctly.

use crate::markdown::{HeadingLevel, ListKind, RenderNode, RenderNodeKind, RenderedView};
use crate::markdown::syntax::highlighter;
use crate::theme::Palette;
use eframe::egui::{self, Color32, FontId, RichText, TextFormat, Ui, Vec2};
use eframe::egui::text::LayoutJob;

const BASE_FONT_SIZE: f32 = 15.0;
const INDENT_STEP: f32 = 20.0;

// ─────────────────────────────────────────────────────────────────────────────
// Inline Style Accumulation
// ─────────────────────────────────────────────────────────────────────────────

/// Accumulated inline formatting inherited from parent nodes.
#[derive(Debug, Clone, Copy, Default)]
struct InlineStyle {
    bold: bool,
    italic: bool,
    strikethrough: bool,
    /// Overrides the palette text color when set (links, headings).
    color: Option<Color32>,
}

impl InlineStyle {
    fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn with_italic(mut self) -> Self {
        self.italic = true;
        self
    }

    fn with_strikethrough(mut self) -> Self {
        self.strikethrough = true;
        self
    }

    fn with_color(mut self, color: Color32) -> Self {
        self.color = Some(color);
        self
    }

    fn apply(&self, text: &str, font_size: f32, fallback: Color32) -> RichText {
        let mut styled = RichText::new(text)
            .size(font_size)
            .color(self.color.unwrap_or(fallback));
        if self.bold {
            styled = styled.strong();
        }
        if self.italic {
            styled = styled.italics();
        }
        if self.strikethrough {
            styled = styled.strikethrough();
        }
        styled
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry Point
// ─────────────────────────────────────────────────────────────────────────────

/// Render context threaded through the tree walk.
struct RenderCtx<'a> {
    palette: &'a Palette,
    dark_mode: bool,
}

/// Paint the rendered view into the preview pane.
///
/// Returns the realized content width in ui points, captured by the PDF
/// export snapshot so page typesetting can mirror the on-screen layout.
pub fn show_preview(ui: &mut Ui, view: &RenderedView, palette: &Palette, dark_mode: bool) -> f32 {
    let content_width = ui.available_width();
    let ctx = RenderCtx { palette, dark_mode };

    for child in &view.root.children {
        render_block(ui, child, &ctx, 0);
    }

    content_width
}

// ─────────────────────────────────────────────────────────────────────────────
// Block Rendering
// ─────────────────────────────────────────────────────────────────────────────

fn heading_font_size(level: HeadingLevel) -> f32 {
    match level {
        HeadingLevel::H1 => BASE_FONT_SIZE * 2.0,
        HeadingLevel::H2 => BASE_FONT_SIZE * 1.6,
        HeadingLevel::H3 => BASE_FONT_SIZE * 1.35,
        HeadingLevel::H4 => BASE_FONT_SIZE * 1.15,
        HeadingLevel::H5 => BASE_FONT_SIZE * 1.05,
        HeadingLevel::H6 => BASE_FONT_SIZE,
    }
}

fn render_block(ui: &mut Ui, node: &RenderNode, ctx: &RenderCtx, indent_level: usize) {
    match &node.kind {
        RenderNodeKind::Heading { level } => render_heading(ui, node, ctx, *level),
        RenderNodeKind::Paragraph => {
            render_inline_content(ui, node, ctx, BASE_FONT_SIZE, indent_level);
            ui.add_space(6.0);
        }
        RenderNodeKind::BlockQuote => render_blockquote(ui, node, ctx, indent_level),
        RenderNodeKind::List { kind, tight } => {
            render_list(ui, node, ctx, indent_level, *kind, *tight);
            if indent_level == 0 {
                ui.add_space(4.0);
            }
        }
        RenderNodeKind::CodeBlock { language, literal } => {
            render_code_block(ui, ctx, language, literal);
        }
        RenderNodeKind::HtmlBlock(html) => {
            // Raw HTML stays literal; it is shown, never interpreted
            render_code_block(ui, ctx, "html", html);
        }
        RenderNodeKind::ThematicBreak => {
            ui.add_space(8.0);
            ui.separator();
            ui.add_space(8.0);
        }
        RenderNodeKind::Table { num_columns, .. } => {
            render_table(ui, node, ctx, *num_columns);
        }
        _ => {
            // Unexpected block content renders as a plain paragraph
            let text = node.text_content();
            if !text.trim().is_empty() {
                ui.label(RichText::new(text).size(BASE_FONT_SIZE).color(ctx.palette.text));
            }
        }
    }
}

fn render_heading(ui: &mut Ui, node: &RenderNode, ctx: &RenderCtx, level: HeadingLevel) {
    let font_size = heading_font_size(level);
    ui.add_space(font_size * 0.5);

    ui.horizontal_wrapped(|ui| {
        let style = InlineStyle::default()
            .with_bold()
            .with_color(ctx.palette.heading);
        for child in &node.children {
            render_inline_node(ui, child, ctx, font_size, style);
        }
    });

    if matches!(level, HeadingLevel::H1 | HeadingLevel::H2) {
        ui.separator();
    }
    ui.add_space(font_size * 0.3);
}

fn render_blockquote(ui: &mut Ui, node: &RenderNode, ctx: &RenderCtx, indent_level: usize) {
    ui.horizontal(|ui| {
        let (rect, _) =
            ui.allocate_exact_size(Vec2::new(4.0, ui.available_height()), egui::Sense::hover());
        ui.painter()
            .rect_filled(rect, 0.0, ctx.palette.blockquote_border);

        ui.add_space(8.0);

        ui.vertical(|ui| {
            for child in &node.children {
                render_quoted_block(ui, child, ctx, indent_level + 1);
            }
        });
    });
    ui.add_space(4.0);
}

/// Quoted paragraphs use the muted quote text color; everything else renders
/// normally inside the indented column.
fn render_quoted_block(ui: &mut Ui, node: &RenderNode, ctx: &RenderCtx, indent_level: usize) {
    if let RenderNodeKind::Paragraph = node.kind {
        ui.horizontal_wrapped(|ui| {
            let style = InlineStyle::default().with_color(ctx.palette.blockquote_text);
            for child in &node.children {
                render_inline_node(ui, child, ctx, BASE_FONT_SIZE, style);
            }
        });
        ui.add_space(4.0);
    } else {
        render_block(ui, node, ctx, indent_level);
    }
}

fn render_list(
    ui: &mut Ui,
    node: &RenderNode,
    ctx: &RenderCtx,
    indent_level: usize,
    kind: ListKind,
    tight: bool,
) {
    let mut item_number = match kind {
        ListKind::Ordered { start, .. } => start,
        ListKind::Bullet => 0,
    };

    for child in &node.children {
        match &child.kind {
            RenderNodeKind::Item => {
                render_list_item(ui, child, ctx, indent_level, kind, item_number, None);
                item_number += 1;
            }
            RenderNodeKind::TaskItem { checked } => {
                render_list_item(ui, child, ctx, indent_level, kind, item_number, Some(*checked));
                item_number += 1;
            }
            _ => {}
        }
        // Loose lists get breathing room between items
        if !tight {
            ui.add_space(4.0);
        }
    }
}

fn render_list_item(
    ui: &mut Ui,
    node: &RenderNode,
    ctx: &RenderCtx,
    indent_level: usize,
    kind: ListKind,
    item_number: u32,
    task_checked: Option<bool>,
) {
    // First paragraph shares the row with the marker; nested content stacks
    // below at one deeper indent level
    let paragraph = node
        .children
        .iter()
        .find(|c| matches!(c.kind, RenderNodeKind::Paragraph));

    ui.horizontal_wrapped(|ui| {
        ui.add_space(4.0 + indent_level as f32 * INDENT_STEP);

        match task_checked {
            Some(checked) => {
                // Read-only checkbox; the preview never edits the source
                let mut state = checked;
                ui.add_enabled(false, egui::Checkbox::new(&mut state, ""));
            }
            None => {
                let marker = match kind {
                    ListKind::Bullet => "\u{2022}".to_string(),
                    ListKind::Ordered { delimiter, .. } => {
                        format!("{}{}", item_number, delimiter)
                    }
                };
                ui.label(
                    RichText::new(marker)
                        .size(BASE_FONT_SIZE)
                        .color(ctx.palette.list_marker),
                );
            }
        }

        if let Some(paragraph) = paragraph {
            let style = InlineStyle::default();
            for child in &paragraph.children {
                render_inline_node(ui, child, ctx, BASE_FONT_SIZE, style);
            }
        }
    });

    for child in &node.children {
        if !matches!(child.kind, RenderNodeKind::Paragraph) {
            render_block(ui, child, ctx, indent_level + 1);
        }
    }
}

fn render_code_block(ui: &mut Ui, ctx: &RenderCtx, language: &str, literal: &str) {
    let font_size = BASE_FONT_SIZE * 0.9;

    ui.add_space(4.0);
    egui::Frame::none()
        .fill(ctx.palette.code_block_bg)
        .stroke(egui::Stroke::new(1.0, ctx.palette.code_block_border))
        .inner_margin(egui::Margin::symmetric(10.0, 8.0))
        .rounding(4.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());

            let lines = highlighter().highlight(
                literal,
                language,
                ctx.dark_mode,
                ctx.palette.code_text,
            );

            let mut job = LayoutJob::default();
            let line_count = lines.len();
            for (i, line) in lines.iter().enumerate() {
                for segment in &line.segments {
                    job.append(
                        &segment.text,
                        0.0,
                        TextFormat {
                            font_id: FontId::monospace(font_size),
                            color: segment.foreground,
                            italics: segment.italic,
                            ..Default::default()
                        },
                    );
                }
                if i + 1 < line_count {
                    job.append(
                        "\n",
                        0.0,
                        TextFormat {
                            font_id: FontId::monospace(font_size),
                            color: ctx.palette.code_text,
                            ..Default::default()
                        },
                    );
                }
            }
            ui.label(job);
        });
    ui.add_space(8.0);
}

fn render_table(ui: &mut Ui, node: &RenderNode, ctx: &RenderCtx, num_columns: usize) {
    if num_columns == 0 {
        return;
    }

    ui.add_space(4.0);
    egui::Frame::none()
        .stroke(egui::Stroke::new(1.0, ctx.palette.table_border))
        .inner_margin(egui::Margin::same(4.0))
        .rounding(4.0)
        .show(ui, |ui| {
            egui::Grid::new(ui.id().with("preview_table"))
                .num_columns(num_columns)
                .spacing(Vec2::new(16.0, 6.0))
                .striped(true)
                .show(ui, |ui| {
                    for row in &node.children {
                        if let RenderNodeKind::TableRow { header } = row.kind {
                            for cell in &row.children {
                                ui.horizontal_wrapped(|ui| {
                                    let style = if header {
                                        InlineStyle::default()
                                            .with_bold()
                                            .with_color(ctx.palette.heading)
                                    } else {
                                        InlineStyle::default()
                                    };
                                    for child in &cell.children {
                                        render_inline_node(ui, child, ctx, BASE_FONT_SIZE, style);
                                    }
                                });
                            }
                            ui.end_row();
                        }
                    }
                });
        });
    ui.add_space(8.0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Inline Rendering
// ─────────────────────────────────────────────────────────────────────────────

fn render_inline_content(
    ui: &mut Ui,
    node: &RenderNode,
    ctx: &RenderCtx,
    font_size: f32,
    indent_level: usize,
) {
    ui.horizontal_wrapped(|ui| {
        ui.add_space(4.0 + indent_level as f32 * INDENT_STEP);

        let style = InlineStyle::default();
        for child in &node.children {
            render_inline_node(ui, child, ctx, font_size, style);
        }
    });
}

fn render_inline_node(
    ui: &mut Ui,
    node: &RenderNode,
    ctx: &RenderCtx,
    font_size: f32,
    style: InlineStyle,
) {
    match &node.kind {
        RenderNodeKind::Text(text) => {
            ui.label(style.apply(text, font_size, ctx.palette.text));
        }
        RenderNodeKind::Code(code) => {
            // Inline code keeps its own styling rather than inheriting
            ui.label(
                RichText::new(code)
                    .color(ctx.palette.code_text)
                    .font(FontId::monospace(font_size * 0.9))
                    .background_color(ctx.palette.code_block_bg),
            );
        }
        RenderNodeKind::Strong => {
            let style = style.with_bold();
            for child in &node.children {
                render_inline_node(ui, child, ctx, font_size, style);
            }
        }
        RenderNodeKind::Emphasis => {
            let style = style.with_italic();
            for child in &node.children {
                render_inline_node(ui, child, ctx, font_size, style);
            }
        }
        RenderNodeKind::Strikethrough => {
            let style = style.with_strikethrough();
            for child in &node.children {
                render_inline_node(ui, child, ctx, font_size, style);
            }
        }
        RenderNodeKind::Link { url, title } => {
            let text = node.text_content();
            let label = ui.label(
                style
                    .with_color(ctx.palette.link)
                    .apply(&text, font_size, ctx.palette.link)
                    .underline(),
            );
            let hover = if title.is_empty() { url } else { title };
            label.on_hover_text(hover);
        }
        RenderNodeKind::Image { url, .. } => {
            // Alt text stands in for the image
            let alt = node.text_content();
            ui.label(
                style
                    .with_italic()
                    .apply(&alt, font_size, ctx.palette.text_muted),
            )
            .on_hover_text(url);
        }
        RenderNodeKind::HtmlInline(html) => {
            // Inert literal, monospaced so it reads as markup
            ui.label(
                RichText::new(html)
                    .color(ctx.palette.code_text)
                    .font(FontId::monospace(font_size * 0.9)),
            );
        }
        RenderNodeKind::SoftBreak => {
            ui.label(" ");
        }
        RenderNodeKind::LineBreak => {
            ui.end_row();
        }
        _ => {
            if !node.children.is_empty() {
                for child in &node.children {
                    render_inline_node(ui, child, ctx, font_size, style);
                }
            } else {
                let text = node.text_content();
                if !text.is_empty() {
                    ui.label(style.apply(&text, font_size, ctx.palette.text));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_sizes_decrease_with_level() {
        let sizes: Vec<f32> = [
            HeadingLevel::H1,
            HeadingLevel::H2,
            HeadingLevel::H3,
            HeadingLevel::H4,
            HeadingLevel::H5,
            HeadingLevel::H6,
        ]
        .into_iter()
        .map(heading_font_size)
        .collect();

        for pair in sizes.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
        assert_eq!(sizes[5], BASE_FONT_SIZE);
    }

    #[test]
    fn test_inline_style_accumulates() {
        let style = InlineStyle::default().with_bold().with_italic();
        assert!(style.bold);
        assert!(style.italic);
        assert!(!style.strikethrough);
        assert!(style.color.is_none());
    }
}
