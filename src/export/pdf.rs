//! PDF export pipeline
//!
//! Turns a normalized preview snapshot into a paginated A4 portrait PDF.
//! The pipeline runs in stages:
//!
//! 1. **Collect** — flatten the view tree into typesettable blocks
//! 2. **Typeset** — word-wrap and paginate the blocks against the fixed page
//!    geometry, producing device-independent page operations
//! 3. **Emit** — draw the operations into a printpdf document
//!
//! Collect and typeset are pure; only the final file write touches the
//! filesystem. The whole pipeline runs on a worker thread owned by
//! [`ExportController`], which guarantees at most one export in flight and
//! reports the result back over a channel polled by the UI loop. The
//! snapshot is moved into the worker and dropped on every exit path.

use crate::error::{Error, Result};
use crate::export::snapshot::{PortablePalette, PortableSnapshot, PreviewSnapshot, Rgb8};
use crate::markdown::{HeadingLevel, ListKind, RenderNode, RenderNodeKind, TableAlignment};
use log::{debug, info, warn};
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line as PdfLine, Mm, PdfDocument, PdfLayerReference,
    Point, Polygon, Rgb,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

// ─────────────────────────────────────────────────────────────────────────────
// Page Geometry
// ─────────────────────────────────────────────────────────────────────────────

/// A4 portrait, in points.
const PAGE_WIDTH_PT: f32 = 595.28;
const PAGE_HEIGHT_PT: f32 = 841.89;

/// Fixed margins on all sides, in points.
const MARGIN_PT: f32 = 40.0;

/// Usable content width.
const CONTENT_WIDTH_PT: f32 = PAGE_WIDTH_PT - 2.0 * MARGIN_PT;

/// The fixed export filename suggested to the user.
pub const EXPORT_FILE_NAME: &str = "markdown-export.pdf";

const BODY_SIZE: f32 = 11.0;
const CODE_SIZE: f32 = 9.5;
const LINE_FACTOR: f32 = 1.45;
const LIST_INDENT: f32 = 18.0;
const MARKER_GAP: f32 = 16.0;
const QUOTE_INDENT: f32 = 14.0;
const CELL_PADDING: f32 = 4.0;

const PT_PER_MM: f32 = 72.0 / 25.4;

fn heading_size(level: HeadingLevel) -> f32 {
    match level {
        HeadingLevel::H1 => 22.0,
        HeadingLevel::H2 => 18.0,
        HeadingLevel::H3 => 15.0,
        HeadingLevel::H4 => 13.0,
        HeadingLevel::H5 => 12.0,
        HeadingLevel::H6 => 11.0,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fonts & Width Estimation
// ─────────────────────────────────────────────────────────────────────────────

/// Portable font classes mapped onto the builtin PDF fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontClass {
    Regular,
    Bold,
    Italic,
    BoldItalic,
    Mono,
}

impl FontClass {
    fn builtin(self) -> BuiltinFont {
        match self {
            FontClass::Regular => BuiltinFont::Helvetica,
            FontClass::Bold => BuiltinFont::HelveticaBold,
            FontClass::Italic => BuiltinFont::HelveticaOblique,
            FontClass::BoldItalic => BuiltinFont::HelveticaBoldOblique,
            FontClass::Mono => BuiltinFont::Courier,
        }
    }

    /// Average glyph advance as a fraction of the font size.
    ///
    /// Courier is fixed at 0.6 em per glyph; the Helvetica values are
    /// conservative averages so wrapped lines never overflow the margin.
    fn width_factor(self) -> f32 {
        match self {
            FontClass::Mono => 0.60,
            FontClass::Bold | FontClass::BoldItalic => 0.53,
            FontClass::Regular | FontClass::Italic => 0.50,
        }
    }
}

/// Estimated width of a text run in points.
fn text_width(text: &str, font: FontClass, size: f32) -> f32 {
    text.chars().count() as f32 * size * font.width_factor()
}

// ─────────────────────────────────────────────────────────────────────────────
// Spans (flattened inline content)
// ─────────────────────────────────────────────────────────────────────────────

/// A styled run of inline text.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    pub underline: bool,
    pub code: bool,
    pub color: Rgb8,
}

impl Span {
    fn font(&self) -> FontClass {
        if self.code {
            FontClass::Mono
        } else {
            match (self.bold, self.italic) {
                (true, true) => FontClass::BoldItalic,
                (true, false) => FontClass::Bold,
                (false, true) => FontClass::Italic,
                (false, false) => FontClass::Regular,
            }
        }
    }

    fn width(&self, size: f32) -> f32 {
        text_width(&self.text, self.font(), size)
    }

    fn with_text(&self, text: String) -> Span {
        Span {
            text,
            ..self.clone()
        }
    }
}

/// Inline styling context accumulated while walking the tree.
#[derive(Debug, Clone, Copy)]
struct InlineCtx {
    bold: bool,
    italic: bool,
    strike: bool,
    underline: bool,
    code: bool,
    color: Rgb8,
}

/// Flatten inline children into styled spans.
///
/// Hard line breaks become `\n` markers that the wrapper treats as forced
/// breaks; soft breaks become single spaces. Raw inline HTML is carried as
/// literal code-styled text, never as markup.
fn flatten_inlines(
    nodes: &[RenderNode],
    ctx: InlineCtx,
    colors: &PortablePalette,
    out: &mut Vec<Span>,
) {
    for node in nodes {
        match &node.kind {
            RenderNodeKind::Text(text) => out.push(Span {
                text: text.clone(),
                bold: ctx.bold,
                italic: ctx.italic,
                strike: ctx.strike,
                underline: ctx.underline,
                code: ctx.code,
                color: ctx.color,
            }),
            RenderNodeKind::Code(code) => out.push(Span {
                text: code.clone(),
                bold: ctx.bold,
                italic: ctx.italic,
                strike: ctx.strike,
                underline: ctx.underline,
                code: true,
                color: colors.code_text,
            }),
            RenderNodeKind::SoftBreak => out.push(Span {
                text: " ".to_string(),
                bold: ctx.bold,
                italic: ctx.italic,
                strike: ctx.strike,
                underline: ctx.underline,
                code: ctx.code,
                color: ctx.color,
            }),
            RenderNodeKind::LineBreak => out.push(Span {
                text: "\n".to_string(),
                bold: ctx.bold,
                italic: ctx.italic,
                strike: ctx.strike,
                underline: ctx.underline,
                code: ctx.code,
                color: ctx.color,
            }),
            RenderNodeKind::Emphasis => {
                flatten_inlines(&node.children, InlineCtx { italic: true, ..ctx }, colors, out)
            }
            RenderNodeKind::Strong => {
                flatten_inlines(&node.children, InlineCtx { bold: true, ..ctx }, colors, out)
            }
            RenderNodeKind::Strikethrough => {
                flatten_inlines(&node.children, InlineCtx { strike: true, ..ctx }, colors, out)
            }
            RenderNodeKind::Link { .. } => flatten_inlines(
                &node.children,
                InlineCtx {
                    underline: true,
                    color: colors.link,
                    ..ctx
                },
                colors,
                out,
            ),
            // Images are not embedded; the alt text flows inline
            RenderNodeKind::Image { .. } => flatten_inlines(
                &node.children,
                InlineCtx { italic: true, ..ctx },
                colors,
                out,
            ),
            RenderNodeKind::HtmlInline(html) => out.push(Span {
                text: html.clone(),
                bold: ctx.bold,
                italic: ctx.italic,
                strike: ctx.strike,
                underline: ctx.underline,
                code: true,
                color: colors.code_text,
            }),
            // Nested block content inside inline position (defensive): flatten
            // to its text so nothing is silently dropped
            _ => {
                let text = node.text_content();
                if !text.is_empty() {
                    out.push(Span {
                        text,
                        bold: ctx.bold,
                        italic: ctx.italic,
                        strike: ctx.strike,
                        underline: ctx.underline,
                        code: ctx.code,
                        color: ctx.color,
                    });
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Blocks
// ─────────────────────────────────────────────────────────────────────────────

/// A table row ready for typesetting.
#[derive(Debug, Clone)]
struct TableRow {
    header: bool,
    cells: Vec<Vec<Span>>,
}

/// A typesettable block produced from the view tree.
#[derive(Debug, Clone)]
enum Block {
    Heading {
        level: HeadingLevel,
        spans: Vec<Span>,
    },
    Paragraph {
        spans: Vec<Span>,
        indent: f32,
        quote_depth: u32,
    },
    ListItem {
        marker: String,
        spans: Vec<Span>,
        indent: f32,
        quote_depth: u32,
    },
    CodeBlock {
        lines: Vec<String>,
    },
    Rule,
    Table {
        alignments: Vec<TableAlignment>,
        num_columns: usize,
        rows: Vec<TableRow>,
    },
}

/// Block-level walking context.
#[derive(Debug, Clone, Copy)]
struct BlockCtx {
    indent: f32,
    quote_depth: u32,
}

fn base_inline_ctx(color: Rgb8) -> InlineCtx {
    InlineCtx {
        bold: false,
        italic: false,
        strike: false,
        underline: false,
        code: false,
        color,
    }
}

/// Flatten the view tree into a block list.
fn collect_blocks(root: &RenderNode, colors: &PortablePalette) -> Vec<Block> {
    let mut blocks = Vec::new();
    let ctx = BlockCtx {
        indent: 0.0,
        quote_depth: 0,
    };
    for child in &root.children {
        collect_block(child, ctx, colors, &mut blocks);
    }
    blocks
}

fn collect_block(node: &RenderNode, ctx: BlockCtx, colors: &PortablePalette, out: &mut Vec<Block>) {
    let text_color = if ctx.quote_depth > 0 {
        colors.blockquote_text
    } else {
        colors.text
    };

    match &node.kind {
        RenderNodeKind::Heading { level } => {
            let mut spans = Vec::new();
            flatten_inlines(
                &node.children,
                InlineCtx {
                    bold: true,
                    ..base_inline_ctx(colors.heading)
                },
                colors,
                &mut spans,
            );
            out.push(Block::Heading {
                level: *level,
                spans,
            });
        }
        RenderNodeKind::Paragraph => {
            let mut spans = Vec::new();
            flatten_inlines(&node.children, base_inline_ctx(text_color), colors, &mut spans);
            out.push(Block::Paragraph {
                spans,
                indent: ctx.indent,
                quote_depth: ctx.quote_depth,
            });
        }
        RenderNodeKind::BlockQuote => {
            let inner = BlockCtx {
                quote_depth: ctx.quote_depth + 1,
                ..ctx
            };
            for child in &node.children {
                collect_block(child, inner, colors, out);
            }
        }
        RenderNodeKind::List { kind, .. } => {
            collect_list(node, *kind, ctx, colors, out);
        }
        RenderNodeKind::CodeBlock { literal, .. } => {
            out.push(Block::CodeBlock {
                lines: literal.lines().map(str::to_string).collect(),
            });
        }
        RenderNodeKind::HtmlBlock(html) => {
            // Inert literal rendering; raw HTML is never interpreted
            out.push(Block::CodeBlock {
                lines: html.lines().map(str::to_string).collect(),
            });
        }
        RenderNodeKind::ThematicBreak => out.push(Block::Rule),
        RenderNodeKind::Table {
            alignments,
            num_columns,
        } => {
            let mut rows = Vec::new();
            for row in &node.children {
                if let RenderNodeKind::TableRow { header } = row.kind {
                    let cells = row
                        .children
                        .iter()
                        .map(|cell| {
                            let mut spans = Vec::new();
                            flatten_inlines(
                                &cell.children,
                                base_inline_ctx(text_color),
                                colors,
                                &mut spans,
                            );
                            spans
                        })
                        .collect();
                    rows.push(TableRow { header, cells });
                }
            }
            out.push(Block::Table {
                alignments: alignments.clone(),
                num_columns: *num_columns,
                rows,
            });
        }
        // Anything unexpected at block level degrades to a paragraph of its text
        _ => {
            let text = node.text_content();
            if !text.trim().is_empty() {
                out.push(Block::Paragraph {
                    spans: vec![Span {
                        text,
                        bold: false,
                        italic: false,
                        strike: false,
                        underline: false,
                        code: false,
                        color: text_color,
                    }],
                    indent: ctx.indent,
                    quote_depth: ctx.quote_depth,
                });
            }
        }
    }
}

fn collect_list(
    list: &RenderNode,
    kind: ListKind,
    ctx: BlockCtx,
    colors: &PortablePalette,
    out: &mut Vec<Block>,
) {
    let mut ordinal = match kind {
        ListKind::Ordered { start, .. } => start,
        ListKind::Bullet => 0,
    };

    for item in &list.children {
        let marker = match (&item.kind, kind) {
            (RenderNodeKind::TaskItem { checked: true }, _) => "[x]".to_string(),
            (RenderNodeKind::TaskItem { checked: false }, _) => "[ ]".to_string(),
            (_, ListKind::Ordered { delimiter, .. }) => format!("{}{}", ordinal, delimiter),
            (_, ListKind::Bullet) => "\u{2022}".to_string(),
        };
        ordinal += 1;

        let text_color = if ctx.quote_depth > 0 {
            colors.blockquote_text
        } else {
            colors.text
        };

        // The first paragraph carries the item marker; everything after it
        // (continuation paragraphs, nested lists, code blocks) indents under
        // the marker.
        let mut first_paragraph_done = false;
        let inner = BlockCtx {
            indent: ctx.indent + LIST_INDENT,
            ..ctx
        };

        for child in &item.children {
            match &child.kind {
                RenderNodeKind::Paragraph if !first_paragraph_done => {
                    first_paragraph_done = true;
                    let mut spans = Vec::new();
                    flatten_inlines(
                        &child.children,
                        base_inline_ctx(text_color),
                        colors,
                        &mut spans,
                    );
                    out.push(Block::ListItem {
                        marker: marker.clone(),
                        spans,
                        indent: ctx.indent,
                        quote_depth: ctx.quote_depth,
                    });
                }
                _ => collect_block(child, inner, colors, out),
            }
        }

        // An item with no paragraph at all (e.g. only a nested list) still
        // needs its marker rendered
        if !first_paragraph_done {
            out.push(Block::ListItem {
                marker,
                spans: Vec::new(),
                indent: ctx.indent,
                quote_depth: ctx.quote_depth,
            });
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Word Wrapping
// ─────────────────────────────────────────────────────────────────────────────

/// Wrap spans to the given width, returning lines of spans.
///
/// Break opportunities are whitespace boundaries; `\n` spans force a break.
/// A single word wider than the line is hard-split so nothing ever overflows
/// the margin.
fn wrap_spans(spans: &[Span], width: f32, size: f32) -> Vec<Vec<Span>> {
    let mut lines: Vec<Vec<Span>> = Vec::new();
    let mut current: Vec<Span> = Vec::new();
    let mut current_width = 0.0_f32;

    let push_line = |current: &mut Vec<Span>, current_width: &mut f32, lines: &mut Vec<Vec<Span>>| {
        // Trailing spaces don't count against the margin but look odd kept
        if let Some(last) = current.last_mut() {
            let trimmed = last.text.trim_end().to_string();
            last.text = trimmed;
        }
        lines.push(std::mem::take(current));
        *current_width = 0.0;
    };

    for span in spans {
        for (i, piece) in span.text.split('\n').enumerate() {
            if i > 0 {
                push_line(&mut current, &mut current_width, &mut lines);
            }

            // Split into words, keeping the separating spaces attached
            let mut word = String::new();
            let flush_word = |word: &mut String,
                                  current: &mut Vec<Span>,
                                  current_width: &mut f32,
                                  lines: &mut Vec<Vec<Span>>| {
                if word.is_empty() {
                    return;
                }
                let mut w = text_width(word, span.font(), size);
                if *current_width + w > width && !current.is_empty() {
                    if let Some(last) = current.last_mut() {
                        last.text = last.text.trim_end().to_string();
                    }
                    lines.push(std::mem::take(current));
                    *current_width = 0.0;
                    // Leading space on a fresh line is dropped
                    while word.starts_with(' ') {
                        word.remove(0);
                    }
                    w = text_width(word, span.font(), size);
                }
                // Hard-split oversized words
                while w > width && word.chars().count() > 1 {
                    let per_char = size * span.font().width_factor();
                    let fit = ((width - *current_width) / per_char).max(1.0) as usize;
                    let head: String = word.chars().take(fit).collect();
                    let tail: String = word.chars().skip(fit).collect();
                    current.push(span.with_text(head));
                    lines.push(std::mem::take(current));
                    *current_width = 0.0;
                    *word = tail;
                    w = text_width(word, span.font(), size);
                }
                *current_width += w;
                current.push(span.with_text(std::mem::take(word)));
            };

            for ch in piece.chars() {
                word.push(ch);
                if ch == ' ' {
                    flush_word(&mut word, &mut current, &mut current_width, &mut lines);
                }
            }
            flush_word(&mut word, &mut current, &mut current_width, &mut lines);
        }
    }

    if !current.is_empty() {
        push_line(&mut current, &mut current_width, &mut lines);
    }
    if lines.is_empty() {
        lines.push(Vec::new());
    }
    lines
}

// ─────────────────────────────────────────────────────────────────────────────
// Page Operations
// ─────────────────────────────────────────────────────────────────────────────

/// A device-independent drawing operation. Coordinates are in points with the
/// origin at the top-left of the page; the emitter flips to PDF space.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOp {
    Text {
        x: f32,
        baseline: f32,
        size: f32,
        font: FontClass,
        color: Rgb8,
        text: String,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        thickness: f32,
        color: Rgb8,
    },
    /// Filled rectangle; `y` is the top edge.
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgb8,
    },
}

/// One typeset page.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub ops: Vec<PageOp>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Typesetting
// ─────────────────────────────────────────────────────────────────────────────

struct Typesetter<'a> {
    pages: Vec<Page>,
    y: f32,
    colors: &'a PortablePalette,
    scale: f32,
}

impl<'a> Typesetter<'a> {
    fn new(colors: &'a PortablePalette, scale: f32) -> Self {
        Self {
            pages: vec![Page::default()],
            y: MARGIN_PT,
            colors,
            scale,
        }
    }

    fn page(&mut self) -> &mut Page {
        self.pages.last_mut().expect("at least one page")
    }

    /// Start a new page if the next `height` points don't fit.
    fn ensure_room(&mut self, height: f32) {
        if self.y + height > PAGE_HEIGHT_PT - MARGIN_PT && self.y > MARGIN_PT {
            self.pages.push(Page::default());
            self.y = MARGIN_PT;
        }
    }

    fn add_space(&mut self, space: f32) {
        // Whitespace never forces a page break on its own
        self.y = (self.y + space).min(PAGE_HEIGHT_PT - MARGIN_PT);
    }

    /// Emit one wrapped line of spans at the current cursor.
    fn emit_line(&mut self, line: &[Span], x: f32, size: f32, quote_depth: u32) {
        let line_height = size * LINE_FACTOR;
        self.ensure_room(line_height);

        let y_top = self.y;
        let baseline = y_top + size;

        // Quote bars for every enclosing blockquote level
        let bar_color = self.colors.blockquote_border;
        for depth in 0..quote_depth {
            let bar_x = MARGIN_PT + depth as f32 * QUOTE_INDENT + 2.0;
            self.page().ops.push(PageOp::Line {
                from: (bar_x, y_top),
                to: (bar_x, y_top + line_height),
                thickness: 2.0,
                color: bar_color,
            });
        }

        let mut cursor_x = x;

        for span in line {
            if span.text.is_empty() {
                continue;
            }
            let w = span.width(size);
            self.page().ops.push(PageOp::Text {
                x: cursor_x,
                baseline,
                size,
                font: span.font(),
                color: span.color,
                text: span.text.clone(),
            });
            if span.strike {
                self.page().ops.push(PageOp::Line {
                    from: (cursor_x, baseline - size * 0.3),
                    to: (cursor_x + w, baseline - size * 0.3),
                    thickness: 0.6,
                    color: span.color,
                });
            }
            if span.underline {
                self.page().ops.push(PageOp::Line {
                    from: (cursor_x, baseline + 1.5),
                    to: (cursor_x + w, baseline + 1.5),
                    thickness: 0.6,
                    color: span.color,
                });
            }
            cursor_x += w;
        }

        self.y += line_height;
    }

    fn emit_block(&mut self, block: &Block) {
        match block {
            Block::Heading { level, spans } => {
                let size = heading_size(*level) * self.scale;
                self.add_space(size * 0.8);
                let lines = wrap_spans(spans, CONTENT_WIDTH_PT, size);
                for line in &lines {
                    self.emit_line(line, MARGIN_PT, size, 0);
                }
                // H1/H2 carry an underline rule, matching the preview
                if matches!(level, HeadingLevel::H1 | HeadingLevel::H2) {
                    self.ensure_room(4.0);
                    let y = self.y + 1.0;
                    let rule_color = self.colors.horizontal_rule;
                    self.page().ops.push(PageOp::Line {
                        from: (MARGIN_PT, y),
                        to: (MARGIN_PT + CONTENT_WIDTH_PT, y),
                        thickness: 0.8,
                        color: rule_color,
                    });
                    self.y += 4.0;
                }
                self.add_space(size * 0.4);
            }
            Block::Paragraph {
                spans,
                indent,
                quote_depth,
            } => {
                let size = BODY_SIZE * self.scale;
                let x = MARGIN_PT + indent + *quote_depth as f32 * QUOTE_INDENT;
                let width = (CONTENT_WIDTH_PT - indent - *quote_depth as f32 * QUOTE_INDENT).max(size);
                let lines = wrap_spans(spans, width, size);
                for line in &lines {
                    self.emit_line(line, x, size, *quote_depth);
                }
                self.add_space(size * 0.6);
            }
            Block::ListItem {
                marker,
                spans,
                indent,
                quote_depth,
            } => {
                let size = BODY_SIZE * self.scale;
                let quote_offset = *quote_depth as f32 * QUOTE_INDENT;
                let marker_x = MARGIN_PT + indent + quote_offset;
                let text_x = marker_x + MARKER_GAP;
                let width = (CONTENT_WIDTH_PT - indent - quote_offset - MARKER_GAP).max(size);
                let lines = wrap_spans(spans, width, size);

                // Marker shares the first line's baseline
                let line_height = size * LINE_FACTOR;
                self.ensure_room(line_height);
                let baseline = self.y + size;
                let marker_color = self.colors.list_marker;
                self.page().ops.push(PageOp::Text {
                    x: marker_x,
                    baseline,
                    size,
                    font: FontClass::Regular,
                    color: marker_color,
                    text: marker.clone(),
                });
                for line in &lines {
                    self.emit_line(line, text_x, size, *quote_depth);
                }
                self.add_space(size * 0.2);
            }
            Block::CodeBlock { lines } => {
                let size = CODE_SIZE * self.scale;
                let line_height = size * LINE_FACTOR;
                self.add_space(4.0);
                // Per-line background keeps blocks contiguous across page breaks
                let source_lines: Vec<&str> = if lines.is_empty() {
                    vec![""]
                } else {
                    lines.iter().map(String::as_str).collect()
                };
                let bg = self.colors.code_block_bg;
                let border = self.colors.code_block_border;
                let code_color = self.colors.code_text;
                for text in source_lines {
                    self.ensure_room(line_height);
                    let y_top = self.y;
                    self.page().ops.push(PageOp::Rect {
                        x: MARGIN_PT,
                        y: y_top,
                        w: CONTENT_WIDTH_PT,
                        h: line_height,
                        color: bg,
                    });
                    self.page().ops.push(PageOp::Line {
                        from: (MARGIN_PT, y_top),
                        to: (MARGIN_PT, y_top + line_height),
                        thickness: 1.5,
                        color: border,
                    });
                    if !text.is_empty() {
                        self.page().ops.push(PageOp::Text {
                            x: MARGIN_PT + 6.0,
                            baseline: y_top + size,
                            size,
                            font: FontClass::Mono,
                            color: code_color,
                            text: text.to_string(),
                        });
                    }
                    self.y += line_height;
                }
                self.add_space(8.0);
            }
            Block::Rule => {
                self.ensure_room(12.0);
                let y = self.y + 6.0;
                let rule_color = self.colors.horizontal_rule;
                self.page().ops.push(PageOp::Line {
                    from: (MARGIN_PT, y),
                    to: (MARGIN_PT + CONTENT_WIDTH_PT, y),
                    thickness: 1.0,
                    color: rule_color,
                });
                self.y += 12.0;
            }
            Block::Table {
                alignments,
                num_columns,
                rows,
            } => self.emit_table(alignments, *num_columns, rows),
        }
    }

    fn emit_table(&mut self, alignments: &[TableAlignment], num_columns: usize, rows: &[TableRow]) {
        if num_columns == 0 || rows.is_empty() {
            return;
        }
        let size = BODY_SIZE * self.scale;
        let line_height = size * LINE_FACTOR;
        let col_width = CONTENT_WIDTH_PT / num_columns as f32;
        let text_width_avail = (col_width - 2.0 * CELL_PADDING).max(size);
        let border_color = self.colors.table_border;
        let header_bg = self.colors.table_header_bg;

        self.add_space(4.0);

        for row in rows {
            // Wrap every cell first so the row height is known up front
            let wrapped: Vec<Vec<Vec<Span>>> = (0..num_columns)
                .map(|col| {
                    row.cells
                        .get(col)
                        .map(|spans| wrap_spans(spans, text_width_avail, size))
                        .unwrap_or_else(|| vec![Vec::new()])
                })
                .collect();
            let max_lines = wrapped.iter().map(Vec::len).max().unwrap_or(1);
            let row_height = max_lines as f32 * line_height + 2.0 * CELL_PADDING;

            self.ensure_room(row_height);
            let row_top = self.y;

            if row.header {
                self.page().ops.push(PageOp::Rect {
                    x: MARGIN_PT,
                    y: row_top,
                    w: CONTENT_WIDTH_PT,
                    h: row_height,
                    color: header_bg,
                });
            }

            for (col, cell_lines) in wrapped.iter().enumerate() {
                let cell_x = MARGIN_PT + col as f32 * col_width + CELL_PADDING;
                let align = alignments.get(col).copied().unwrap_or_default();
                let mut line_y = row_top + CELL_PADDING;
                for line in cell_lines {
                    let baseline = line_y + size;
                    let used: f32 = line.iter().map(|s| s.width(size)).sum();
                    let mut x = cell_x;
                    match align {
                        TableAlignment::Center => {
                            x += ((text_width_avail - used) / 2.0).max(0.0);
                        }
                        TableAlignment::Right => {
                            x += (text_width_avail - used).max(0.0);
                        }
                        TableAlignment::Left | TableAlignment::None => {}
                    }
                    for span in line {
                        if span.text.is_empty() {
                            continue;
                        }
                        let mut font = span.font();
                        if row.header && !span.code {
                            font = FontClass::Bold;
                        }
                        self.page().ops.push(PageOp::Text {
                            x,
                            baseline,
                            size,
                            font,
                            color: span.color,
                            text: span.text.clone(),
                        });
                        x += span.width(size);
                    }
                    line_y += line_height;
                }
            }

            // Row borders: top edge plus verticals; the final bottom edge is
            // drawn after the last row
            self.page().ops.push(PageOp::Line {
                from: (MARGIN_PT, row_top),
                to: (MARGIN_PT + CONTENT_WIDTH_PT, row_top),
                thickness: 0.6,
                color: border_color,
            });
            for col in 0..=num_columns {
                let x = MARGIN_PT + col as f32 * col_width;
                self.page().ops.push(PageOp::Line {
                    from: (x, row_top),
                    to: (x, row_top + row_height),
                    thickness: 0.6,
                    color: border_color,
                });
            }

            self.y = row_top + row_height;
        }

        let y = self.y;
        self.page().ops.push(PageOp::Line {
            from: (MARGIN_PT, y),
            to: (MARGIN_PT + CONTENT_WIDTH_PT, y),
            thickness: 0.6,
            color: border_color,
        });
        self.add_space(10.0);
    }
}

/// Typeset a portable snapshot into pages.
///
/// The font scale maps the realized preview width onto the fixed content
/// width so line breaks land where the user saw them; it only ever shrinks,
/// never enlarges.
pub fn typeset(snapshot: &PortableSnapshot) -> Vec<Page> {
    let scale = if snapshot.preview_width > 0.0 {
        (CONTENT_WIDTH_PT / snapshot.preview_width).min(1.0)
    } else {
        1.0
    };

    let blocks = collect_blocks(&snapshot.view.root, &snapshot.colors);
    let mut typesetter = Typesetter::new(&snapshot.colors, scale);
    for block in &blocks {
        typesetter.emit_block(block);
    }

    debug!(
        "Typeset {} blocks onto {} page(s) at scale {:.2}",
        blocks.len(),
        typesetter.pages.len(),
        scale
    );
    typesetter.pages
}

// ─────────────────────────────────────────────────────────────────────────────
// PDF Emission
// ─────────────────────────────────────────────────────────────────────────────

struct BuiltinFonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
    bold_italic: IndirectFontRef,
    mono: IndirectFontRef,
}

impl BuiltinFonts {
    fn load(doc: &printpdf::PdfDocumentReference) -> Result<Self> {
        let add = |font: BuiltinFont| {
            doc.add_builtin_font(font)
                .map_err(|e| Error::PdfRender(e.to_string()))
        };
        Ok(Self {
            regular: add(BuiltinFont::Helvetica)?,
            bold: add(BuiltinFont::HelveticaBold)?,
            italic: add(BuiltinFont::HelveticaOblique)?,
            bold_italic: add(BuiltinFont::HelveticaBoldOblique)?,
            mono: add(BuiltinFont::Courier)?,
        })
    }

    fn get(&self, class: FontClass) -> &IndirectFontRef {
        match class {
            FontClass::Regular => &self.regular,
            FontClass::Bold => &self.bold,
            FontClass::Italic => &self.italic,
            FontClass::BoldItalic => &self.bold_italic,
            FontClass::Mono => &self.mono,
        }
    }
}

fn pt_to_mm(pt: f32) -> Mm {
    Mm(pt / PT_PER_MM)
}

fn pdf_color(color: Rgb8) -> Color {
    let (r, g, b) = color.to_fractions();
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn draw_page(layer: &PdfLayerReference, page: &Page, fonts: &BuiltinFonts) {
    for op in &page.ops {
        match op {
            PageOp::Text {
                x,
                baseline,
                size,
                font,
                color,
                text,
            } => {
                layer.set_fill_color(pdf_color(*color));
                layer.use_text(
                    text.clone(),
                    *size,
                    pt_to_mm(*x),
                    pt_to_mm(PAGE_HEIGHT_PT - baseline),
                    fonts.get(*font),
                );
            }
            PageOp::Line {
                from,
                to,
                thickness,
                color,
            } => {
                layer.set_outline_color(pdf_color(*color));
                layer.set_outline_thickness(*thickness);
                layer.add_line(PdfLine {
                    points: vec![
                        (
                            Point::new(pt_to_mm(from.0), pt_to_mm(PAGE_HEIGHT_PT - from.1)),
                            false,
                        ),
                        (
                            Point::new(pt_to_mm(to.0), pt_to_mm(PAGE_HEIGHT_PT - to.1)),
                            false,
                        ),
                    ],
                    is_closed: false,
                });
            }
            PageOp::Rect { x, y, w, h, color } => {
                layer.set_fill_color(pdf_color(*color));
                let ring = vec![
                    (
                        Point::new(pt_to_mm(*x), pt_to_mm(PAGE_HEIGHT_PT - y)),
                        false,
                    ),
                    (
                        Point::new(pt_to_mm(x + w), pt_to_mm(PAGE_HEIGHT_PT - y)),
                        false,
                    ),
                    (
                        Point::new(pt_to_mm(x + w), pt_to_mm(PAGE_HEIGHT_PT - y - h)),
                        false,
                    ),
                    (
                        Point::new(pt_to_mm(*x), pt_to_mm(PAGE_HEIGHT_PT - y - h)),
                        false,
                    ),
                ];
                layer.add_polygon(Polygon {
                    rings: vec![ring],
                    mode: PaintMode::Fill,
                    winding_order: WindingOrder::NonZero,
                });
            }
        }
    }
}

/// Render a portable snapshot into PDF bytes.
pub fn render_pdf(snapshot: &PortableSnapshot) -> Result<Vec<u8>> {
    let pages = typeset(snapshot);

    let (doc, first_page, first_layer) = PdfDocument::new(
        "Markdown Export",
        pt_to_mm(PAGE_WIDTH_PT),
        pt_to_mm(PAGE_HEIGHT_PT),
        "Content",
    );
    let fonts = BuiltinFonts::load(&doc)?;

    for (index, page) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_ref, layer_ref) =
                doc.add_page(pt_to_mm(PAGE_WIDTH_PT), pt_to_mm(PAGE_HEIGHT_PT), "Content");
            doc.get_page(page_ref).get_layer(layer_ref)
        };
        draw_page(&layer, page, &fonts);
    }

    doc.save_to_bytes()
        .map_err(|e| Error::PdfRender(e.to_string()))
}

/// Render a portable snapshot and write the PDF to `path`.
pub fn export_to_file(snapshot: &PortableSnapshot, path: &Path) -> Result<()> {
    let bytes = render_pdf(snapshot)?;
    std::fs::write(path, bytes).map_err(|source| Error::PdfWrite {
        path: path.to_path_buf(),
        source,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Export State Machine & Controller
// ─────────────────────────────────────────────────────────────────────────────

/// The phases an export moves through. Any failure drops straight back to
/// `Idle` with the error surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExportPhase {
    Idle = 0,
    Snapshotting = 1,
    Normalizing = 2,
    Rasterizing = 3,
    Emitting = 4,
}

impl ExportPhase {
    /// Short status-bar label for the phase.
    pub fn label(self) -> &'static str {
        match self {
            ExportPhase::Idle => "idle",
            ExportPhase::Snapshotting => "capturing preview",
            ExportPhase::Normalizing => "normalizing",
            ExportPhase::Rasterizing => "laying out pages",
            ExportPhase::Emitting => "writing file",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => ExportPhase::Snapshotting,
            2 => ExportPhase::Normalizing,
            3 => ExportPhase::Rasterizing,
            4 => ExportPhase::Emitting,
            _ => ExportPhase::Idle,
        }
    }
}

struct ExportJob {
    receiver: Receiver<Result<PathBuf>>,
}

/// Owns the single in-flight export.
///
/// At most one export runs at a time. A trigger while one is in flight is
/// refused and its snapshot dropped; the running worker owns the snapshot
/// for the whole pipeline.
pub struct ExportController {
    job: Option<ExportJob>,
    phase: Arc<AtomicU8>,
}

impl Default for ExportController {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportController {
    pub fn new() -> Self {
        Self {
            job: None,
            phase: Arc::new(AtomicU8::new(ExportPhase::Idle as u8)),
        }
    }

    /// Whether an export is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.job.is_some()
    }

    /// Current pipeline phase.
    pub fn phase(&self) -> ExportPhase {
        ExportPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Start an export if none is in flight.
    ///
    /// Normalization happens here, synchronously, so the snapshot is portable
    /// before it crosses the thread boundary; typesetting and emission run on
    /// the worker. Returns `false` (and drops the snapshot) when busy.
    pub fn try_start(&mut self, snapshot: PreviewSnapshot, path: PathBuf) -> bool {
        if self.job.is_some() {
            debug!("Export already in flight; ignoring trigger");
            return false;
        }

        self.phase
            .store(ExportPhase::Snapshotting as u8, Ordering::Release);
        self.phase
            .store(ExportPhase::Normalizing as u8, Ordering::Release);
        let portable = super::snapshot::normalize(snapshot);

        let (sender, receiver) = std::sync::mpsc::channel();
        let phase = Arc::clone(&self.phase);

        thread::spawn(move || {
            phase.store(ExportPhase::Rasterizing as u8, Ordering::Release);
            let result = render_pdf(&portable).and_then(|bytes| {
                phase.store(ExportPhase::Emitting as u8, Ordering::Release);
                std::fs::write(&path, bytes).map_err(|source| Error::PdfWrite {
                    path: path.clone(),
                    source,
                })
            });
            // The portable snapshot drops here on success and failure alike
            phase.store(ExportPhase::Idle as u8, Ordering::Release);
            match &result {
                Ok(()) => info!("Exported PDF to {}", path.display()),
                Err(e) => warn!("PDF export failed: {}", e),
            }
            let _ = sender.send(result.map(|()| path));
        });

        self.job = Some(ExportJob { receiver });
        true
    }

    /// Poll for a finished export. Returns the outcome once, then goes idle.
    pub fn poll(&mut self) -> Option<Result<PathBuf>> {
        let outcome = match &self.job {
            Some(job) => match job.receiver.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => Some(Err(Error::PdfRender(
                    "export worker terminated unexpectedly".to_string(),
                ))),
            },
            None => None,
        };

        if outcome.is_some() {
            self.job = None;
            self.phase
                .store(ExportPhase::Idle as u8, Ordering::Release);
        }
        outcome
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::snapshot::{normalize, PreviewSnapshot};
    use crate::markdown::render;
    use crate::theme::Palette;
    use std::time::Duration;

    fn portable(source: &str) -> PortableSnapshot {
        normalize(PreviewSnapshot {
            view: render(source),
            preview_width: CONTENT_WIDTH_PT,
            palette: Palette::light(),
        })
    }

    fn all_text(pages: &[Page]) -> String {
        let mut out = String::new();
        for page in pages {
            for op in &page.ops {
                if let PageOp::Text { text, .. } = op {
                    out.push_str(text);
                    out.push(' ');
                }
            }
        }
        out
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Width Estimation & Wrapping
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_text_width_mono_is_exact_courier() {
        // Courier advance is exactly 0.6 em
        let w = text_width("abcde", FontClass::Mono, 10.0);
        assert!((w - 30.0).abs() < 0.001);
    }

    #[test]
    fn test_wrap_short_line_stays_single() {
        let spans = vec![Span {
            text: "hello world".to_string(),
            bold: false,
            italic: false,
            strike: false,
            underline: false,
            code: false,
            color: Rgb8::new(0, 0, 0),
        }];
        let lines = wrap_spans(&spans, 500.0, 11.0);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_wrap_breaks_long_text() {
        let spans = vec![Span {
            text: "word ".repeat(100),
            bold: false,
            italic: false,
            strike: false,
            underline: false,
            code: false,
            color: Rgb8::new(0, 0, 0),
        }];
        let lines = wrap_spans(&spans, 100.0, 11.0);
        assert!(lines.len() > 1);
        // No line may exceed the wrap width
        for line in &lines {
            let used: f32 = line.iter().map(|s| s.width(11.0)).sum();
            assert!(used <= 100.0 + 0.001, "line too wide: {}", used);
        }
    }

    #[test]
    fn test_wrap_hard_splits_oversized_word() {
        let spans = vec![Span {
            text: "x".repeat(400),
            bold: false,
            italic: false,
            strike: false,
            underline: false,
            code: false,
            color: Rgb8::new(0, 0, 0),
        }];
        let lines = wrap_spans(&spans, 50.0, 11.0);
        assert!(lines.len() > 1);
    }

    #[test]
    fn test_wrap_honors_hard_break() {
        let spans = vec![Span {
            text: "first\nsecond".to_string(),
            bold: false,
            italic: false,
            strike: false,
            underline: false,
            code: false,
            color: Rgb8::new(0, 0, 0),
        }];
        let lines = wrap_spans(&spans, 500.0, 11.0);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_wrap_empty_spans_yield_one_empty_line() {
        let lines = wrap_spans(&[], 500.0, 11.0);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].is_empty());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Block Collection
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_collect_heading_and_paragraph() {
        let snapshot = portable("# Title\n\nBody text");
        let blocks = collect_blocks(&snapshot.view.root, &snapshot.colors);
        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks[0], Block::Heading { .. }));
        assert!(matches!(blocks[1], Block::Paragraph { .. }));
    }

    #[test]
    fn test_collect_task_list_markers() {
        let snapshot = portable("- [x] done\n- [ ] todo");
        let blocks = collect_blocks(&snapshot.view.root, &snapshot.colors);
        let markers: Vec<&str> = blocks
            .iter()
            .filter_map(|b| match b {
                Block::ListItem { marker, .. } => Some(marker.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(markers, vec!["[x]", "[ ]"]);
    }

    #[test]
    fn test_collect_ordered_list_numbers_from_start() {
        let snapshot = portable("3. third\n4. fourth");
        let blocks = collect_blocks(&snapshot.view.root, &snapshot.colors);
        let markers: Vec<&str> = blocks
            .iter()
            .filter_map(|b| match b {
                Block::ListItem { marker, .. } => Some(marker.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(markers, vec!["3.", "4."]);
    }

    #[test]
    fn test_collect_nested_list_indents() {
        let snapshot = portable("- outer\n  - inner");
        let blocks = collect_blocks(&snapshot.view.root, &snapshot.colors);
        let indents: Vec<f32> = blocks
            .iter()
            .filter_map(|b| match b {
                Block::ListItem { indent, .. } => Some(*indent),
                _ => None,
            })
            .collect();
        assert_eq!(indents.len(), 2);
        assert!(indents[1] > indents[0]);
    }

    #[test]
    fn test_collect_blockquote_sets_depth_and_color() {
        let snapshot = portable("> quoted text");
        let blocks = collect_blocks(&snapshot.view.root, &snapshot.colors);
        match &blocks[0] {
            Block::Paragraph {
                quote_depth, spans, ..
            } => {
                assert_eq!(*quote_depth, 1);
                assert_eq!(spans[0].color, snapshot.colors.blockquote_text);
            }
            other => panic!("expected quoted paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_collect_raw_html_block_is_literal() {
        let snapshot = portable("<div onclick=\"evil()\">x</div>");
        let blocks = collect_blocks(&snapshot.view.root, &snapshot.colors);
        assert!(matches!(blocks[0], Block::CodeBlock { .. }));
    }

    #[test]
    fn test_link_spans_are_underlined_and_colored() {
        let snapshot = portable("[text](https://example.com)");
        let blocks = collect_blocks(&snapshot.view.root, &snapshot.colors);
        match &blocks[0] {
            Block::Paragraph { spans, .. } => {
                let link = spans.iter().find(|s| s.text == "text").unwrap();
                assert!(link.underline);
                assert_eq!(link.color, snapshot.colors.link);
            }
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Typesetting & Pagination
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_typeset_empty_view_is_single_blank_page() {
        let pages = typeset(&portable(""));
        assert_eq!(pages.len(), 1);
        assert!(pages[0].ops.is_empty());
    }

    #[test]
    fn test_typeset_heading_text_present() {
        let pages = typeset(&portable("# Hello"));
        assert!(all_text(&pages).contains("Hello"));
    }

    #[test]
    fn test_typeset_long_document_paginates() {
        let source = "lorem ipsum dolor sit amet\n\n".repeat(200);
        let pages = typeset(&portable(&source));
        assert!(pages.len() > 1, "200 paragraphs must spill pages");
    }

    #[test]
    fn test_typeset_respects_margins() {
        let source = "# Title\n\n".to_string() + &"body line of text\n\n".repeat(150);
        let pages = typeset(&portable(&source));
        for page in &pages {
            for op in &page.ops {
                if let PageOp::Text { x, baseline, .. } = op {
                    assert!(*x >= MARGIN_PT - 0.001);
                    assert!(*baseline <= PAGE_HEIGHT_PT - MARGIN_PT + BODY_SIZE);
                    assert!(*baseline >= MARGIN_PT);
                }
            }
        }
    }

    #[test]
    fn test_typeset_table_draws_borders() {
        let pages = typeset(&portable("| A | B |\n|---|---|\n| 1 | 2 |"));
        let line_count = pages[0]
            .ops
            .iter()
            .filter(|op| matches!(op, PageOp::Line { .. }))
            .count();
        // Two rows of borders plus the closing bottom edge
        assert!(line_count >= 7);
        assert!(all_text(&pages).contains('A'));
    }

    #[test]
    fn test_typeset_code_block_uses_mono_and_bg() {
        let pages = typeset(&portable("```rust\nfn main() {}\n```"));
        let has_bg = pages[0]
            .ops
            .iter()
            .any(|op| matches!(op, PageOp::Rect { .. }));
        let has_mono = pages[0].ops.iter().any(
            |op| matches!(op, PageOp::Text { font, .. } if *font == FontClass::Mono),
        );
        assert!(has_bg);
        assert!(has_mono);
    }

    #[test]
    fn test_typeset_ops_carry_palette_colors() {
        // Every decoration op takes its color from the snapshot palette:
        // quote bar, H2 rule, list marker, code background, table borders
        let snapshot = portable(
            "## Title\n\n> quoted\n\n- item\n\n```\ncode\n```\n\n---\n\n| a | b |\n|---|---|\n| 1 | 2 |",
        );
        let colors = snapshot.colors;
        let pages = typeset(&snapshot);

        let line_color = |c: Rgb8| {
            pages
                .iter()
                .flat_map(|p| p.ops.iter())
                .any(|op| matches!(op, PageOp::Line { color, .. } if *color == c))
        };
        let rect_color = |c: Rgb8| {
            pages
                .iter()
                .flat_map(|p| p.ops.iter())
                .any(|op| matches!(op, PageOp::Rect { color, .. } if *color == c))
        };
        let text_color = |c: Rgb8| {
            pages
                .iter()
                .flat_map(|p| p.ops.iter())
                .any(|op| matches!(op, PageOp::Text { color, .. } if *color == c))
        };

        assert!(line_color(colors.blockquote_border));
        assert!(line_color(colors.horizontal_rule));
        assert!(line_color(colors.code_block_border));
        assert!(line_color(colors.table_border));
        assert!(rect_color(colors.code_block_bg));
        assert!(rect_color(colors.table_header_bg));
        assert!(text_color(colors.list_marker));
    }

    #[test]
    fn test_typeset_scale_shrinks_wide_preview() {
        let mut snapshot = portable("some body text");
        snapshot.preview_width = CONTENT_WIDTH_PT * 2.0;
        let pages = typeset(&snapshot);
        let size = pages[0]
            .ops
            .iter()
            .find_map(|op| match op {
                PageOp::Text { size, .. } => Some(*size),
                _ => None,
            })
            .unwrap();
        assert!((size - BODY_SIZE / 2.0).abs() < 0.01);
    }

    #[test]
    fn test_typeset_never_enlarges_narrow_preview() {
        let mut snapshot = portable("some body text");
        snapshot.preview_width = 100.0;
        let pages = typeset(&snapshot);
        let size = pages[0]
            .ops
            .iter()
            .find_map(|op| match op {
                PageOp::Text { size, .. } => Some(*size),
                _ => None,
            })
            .unwrap();
        assert!((size - BODY_SIZE).abs() < 0.01);
    }

    #[test]
    fn test_typeset_is_deterministic() {
        let a = typeset(&portable("# A\n\n- x\n- y\n\n> q"));
        let b = typeset(&portable("# A\n\n- x\n- y\n\n> q"));
        assert_eq!(a.len(), b.len());
        assert_eq!(a[0].ops, b[0].ops);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // PDF Emission
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_render_pdf_produces_pdf_bytes() {
        let bytes = render_pdf(&portable("# Hello\n\nWorld")).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_pdf_empty_source_single_page() {
        // Scenario: empty source still exports a valid near-blank document
        let bytes = render_pdf(&portable("")).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_export_to_file_writes_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(EXPORT_FILE_NAME);
        export_to_file(&portable("content"), &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_export_to_file_bad_path_errors() {
        let result = export_to_file(
            &portable("content"),
            Path::new("/nonexistent-dir/out.pdf"),
        );
        assert!(matches!(result, Err(Error::PdfWrite { .. })));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Export Controller
    // ─────────────────────────────────────────────────────────────────────────

    fn preview_snapshot(source: &str) -> PreviewSnapshot {
        PreviewSnapshot {
            view: render(source),
            preview_width: CONTENT_WIDTH_PT,
            palette: Palette::light(),
        }
    }

    #[test]
    fn test_controller_starts_idle() {
        let controller = ExportController::new();
        assert!(!controller.is_busy());
        assert_eq!(controller.phase(), ExportPhase::Idle);
    }

    #[test]
    fn test_second_trigger_while_busy_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = ExportController::new();

        let started = controller.try_start(
            preview_snapshot("# doc"),
            dir.path().join("first.pdf"),
        );
        assert!(started);
        assert!(controller.is_busy());

        // Immediate second trigger must be refused while the first runs
        let second = controller.try_start(
            preview_snapshot("# doc"),
            dir.path().join("second.pdf"),
        );
        assert!(!second);

        // Drain the first job
        let outcome = loop {
            if let Some(outcome) = controller.poll() {
                break outcome;
            }
            thread::sleep(Duration::from_millis(10));
        };
        assert!(outcome.is_ok());
        assert!(!controller.is_busy());
        assert_eq!(controller.phase(), ExportPhase::Idle);
        assert!(!dir.path().join("second.pdf").exists());
    }

    #[test]
    fn test_failed_export_returns_to_idle() {
        let mut controller = ExportController::new();
        let started = controller.try_start(
            preview_snapshot("text"),
            PathBuf::from("/nonexistent-dir/out.pdf"),
        );
        assert!(started);

        let outcome = loop {
            if let Some(outcome) = controller.poll() {
                break outcome;
            }
            thread::sleep(Duration::from_millis(10));
        };
        assert!(outcome.is_err());
        assert!(!controller.is_busy());
        assert_eq!(controller.phase(), ExportPhase::Idle);

        // The controller accepts a new export after a failure
        let dir = tempfile::tempdir().unwrap();
        assert!(controller.try_start(preview_snapshot("text"), dir.path().join("ok.pdf")));
    }

    #[test]
    fn test_poll_without_job_is_none() {
        let mut controller = ExportController::new();
        assert!(controller.poll().is_none());
    }
}
