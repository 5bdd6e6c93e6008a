//! Markdown parsing using comrak
//!
//! This module wraps comrak to produce the rendered view: an owned tree of
//! render nodes derived from the source text. The feature set is fixed to
//! GitHub Flavored Markdown extensions (tables, strikethrough, task lists,
//! autolinks) and is not user-configurable.
//!
//! Rendering is total: any input string, including empty text and unmatched
//! Markdown syntax, produces a valid tree. Unrecognized syntax falls back to
//! literal text, and raw HTML is carried as inert literal content, never
//! executed or interpreted.

use comrak::{
    nodes::{
        AstNode, ListDelimType, ListType as ComrakListType, NodeValue,
        TableAlignment as ComrakTableAlignment,
    },
    parse_document, Arena, Options,
};

// ─────────────────────────────────────────────────────────────────────────────
// Public Types
// ─────────────────────────────────────────────────────────────────────────────

/// Heading level (H1-H6)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    H1 = 1,
    H2 = 2,
    H3 = 3,
    H4 = 4,
    H5 = 5,
    H6 = 6,
}

impl From<u8> for HeadingLevel {
    fn from(level: u8) -> Self {
        match level {
            1 => HeadingLevel::H1,
            2 => HeadingLevel::H2,
            3 => HeadingLevel::H3,
            4 => HeadingLevel::H4,
            5 => HeadingLevel::H5,
            _ => HeadingLevel::H6,
        }
    }
}

/// List type (ordered or unordered)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Ordered { start: u32, delimiter: char },
}

/// Table cell alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableAlignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

impl From<ComrakTableAlignment> for TableAlignment {
    fn from(align: ComrakTableAlignment) -> Self {
        match align {
            ComrakTableAlignment::None => TableAlignment::None,
            ComrakTableAlignment::Left => TableAlignment::Left,
            ComrakTableAlignment::Center => TableAlignment::Center,
            ComrakTableAlignment::Right => TableAlignment::Right,
        }
    }
}

/// The kind of a node in the rendered view.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderNodeKind {
    /// Root document node
    Document,
    /// Paragraph
    Paragraph,
    /// Heading (H1-H6)
    Heading { level: HeadingLevel },
    /// Block quote (>)
    BlockQuote,
    /// List container
    List { kind: ListKind, tight: bool },
    /// List item
    Item,
    /// Task list marker (- [ ] / - [x])
    TaskItem { checked: bool },
    /// Fenced or indented code block
    CodeBlock { language: String, literal: String },
    /// Thematic break (horizontal rule)
    ThematicBreak,
    /// Table
    Table {
        alignments: Vec<TableAlignment>,
        num_columns: usize,
    },
    /// Table row
    TableRow { header: bool },
    /// Table cell
    TableCell,
    /// Inline text content
    Text(String),
    /// Inline code span
    Code(String),
    /// Soft line break
    SoftBreak,
    /// Hard line break
    LineBreak,
    /// Emphasis (italic)
    Emphasis,
    /// Strong emphasis (bold)
    Strong,
    /// Strikethrough (~~text~~)
    Strikethrough,
    /// Link (explicit or autolinked)
    Link { url: String, title: String },
    /// Image
    Image { url: String, title: String },
    /// Raw HTML block, carried as inert literal text
    HtmlBlock(String),
    /// Raw inline HTML, carried as inert literal text
    HtmlInline(String),
}

/// A node in the rendered view.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
    /// The kind of this node
    pub kind: RenderNodeKind,
    /// Child nodes
    pub children: Vec<RenderNode>,
}

impl RenderNode {
    fn new(kind: RenderNodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    /// Get all text content from this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, output: &mut String) {
        match &self.kind {
            RenderNodeKind::Text(t) => output.push_str(t),
            RenderNodeKind::Code(t) => output.push_str(t),
            RenderNodeKind::CodeBlock { literal, .. } => output.push_str(literal),
            RenderNodeKind::SoftBreak => output.push(' '),
            RenderNodeKind::LineBreak => output.push('\n'),
            _ => {}
        }
        for child in &self.children {
            child.collect_text(output);
        }
    }
}

/// The rendered view: a tree of render nodes derived from the source text.
///
/// Pure function of the source at the moment of render; holds no identity
/// beyond the current render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedView {
    /// Root node of the tree
    pub root: RenderNode,
}

impl RenderedView {
    /// Flatten the view to plain text (the clipboard fallback payload).
    pub fn plain_text(&self) -> String {
        self.root.text_content()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API Functions
// ─────────────────────────────────────────────────────────────────────────────

/// The fixed comrak options used for every render pass.
///
/// `unsafe_` stays false so raw HTML is never emitted executable; the node
/// tree carries it as literal content only.
pub(crate) fn comrak_options() -> Options {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.tasklist = true;
    options.extension.autolink = true;
    options.render.unsafe_ = false;
    options
}

/// Render source text into a view tree.
///
/// Total over all input strings: malformed Markdown degrades to literal
/// text rather than failing.
///
/// # Example
/// ```ignore
/// let view = render("# Hello");
/// assert_eq!(view.root.children.len(), 1);
/// ```
pub fn render(source: &str) -> RenderedView {
    let arena = Arena::new();
    let options = comrak_options();
    let root = parse_document(&arena, source, &options);

    RenderedView {
        root: convert_node(root),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal Conversion Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Convert a comrak AST node into an owned render node.
fn convert_node<'a>(node: &'a AstNode<'a>) -> RenderNode {
    let ast = node.data.borrow();
    let mut render_node = RenderNode::new(convert_node_value(&ast.value));

    for child in node.children() {
        render_node.children.push(convert_node(child));
    }

    render_node
}

/// Convert a comrak NodeValue to a RenderNodeKind.
fn convert_node_value(value: &NodeValue) -> RenderNodeKind {
    match value {
        NodeValue::Document => RenderNodeKind::Document,
        NodeValue::Paragraph => RenderNodeKind::Paragraph,
        NodeValue::Heading(heading) => RenderNodeKind::Heading {
            level: HeadingLevel::from(heading.level),
        },
        NodeValue::BlockQuote => RenderNodeKind::BlockQuote,
        NodeValue::List(list) => {
            let kind = match list.list_type {
                ComrakListType::Bullet => ListKind::Bullet,
                ComrakListType::Ordered => ListKind::Ordered {
                    start: list.start as u32,
                    delimiter: if list.delimiter == ListDelimType::Period {
                        '.'
                    } else {
                        ')'
                    },
                },
            };
            RenderNodeKind::List {
                kind,
                tight: list.tight,
            }
        }
        NodeValue::Item(_) => RenderNodeKind::Item,
        NodeValue::TaskItem(checked) => RenderNodeKind::TaskItem {
            checked: checked.map(|c| c == 'x' || c == 'X').unwrap_or(false),
        },
        NodeValue::CodeBlock(code) => RenderNodeKind::CodeBlock {
            language: code.info.clone(),
            literal: code.literal.clone(),
        },
        NodeValue::ThematicBreak => RenderNodeKind::ThematicBreak,
        NodeValue::Table(table) => RenderNodeKind::Table {
            alignments: table
                .alignments
                .iter()
                .map(|a| TableAlignment::from(*a))
                .collect(),
            num_columns: table.num_columns,
        },
        NodeValue::TableRow(header) => RenderNodeKind::TableRow { header: *header },
        NodeValue::TableCell => RenderNodeKind::TableCell,
        NodeValue::Text(text) => RenderNodeKind::Text(text.clone()),
        NodeValue::Code(code) => RenderNodeKind::Code(code.literal.clone()),
        NodeValue::SoftBreak => RenderNodeKind::SoftBreak,
        NodeValue::LineBreak => RenderNodeKind::LineBreak,
        NodeValue::Emph => RenderNodeKind::Emphasis,
        NodeValue::Strong => RenderNodeKind::Strong,
        NodeValue::Strikethrough => RenderNodeKind::Strikethrough,
        NodeValue::Link(link) => RenderNodeKind::Link {
            url: link.url.clone(),
            title: link.title.clone(),
        },
        NodeValue::Image(image) => RenderNodeKind::Image {
            url: image.url.clone(),
            title: image.title.clone(),
        },
        NodeValue::HtmlBlock(html) => RenderNodeKind::HtmlBlock(html.literal.clone()),
        NodeValue::HtmlInline(html) => RenderNodeKind::HtmlInline(html.clone()),
        // Extensions we don't enable still need a safe fallback if comrak
        // ever hands them to us: degrade to their flattened text.
        _ => RenderNodeKind::Text(String::new()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ─────────────────────────────────────────────────────────────────────────
    // Basic Rendering Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_render_empty_document() {
        let view = render("");
        assert!(view.root.children.is_empty());
        assert!(matches!(view.root.kind, RenderNodeKind::Document));
    }

    #[test]
    fn test_render_whitespace_only() {
        let view = render("   \n\n  \t\n");
        assert!(matches!(view.root.kind, RenderNodeKind::Document));
    }

    #[test]
    fn test_render_simple_paragraph() {
        let view = render("Hello, world!");
        assert_eq!(view.root.children.len(), 1);
        assert!(matches!(
            view.root.children[0].kind,
            RenderNodeKind::Paragraph
        ));
    }

    #[test]
    fn test_render_heading_with_text() {
        let view = render("# Hello");
        assert_eq!(view.root.children.len(), 1);

        let heading = &view.root.children[0];
        if let RenderNodeKind::Heading { level } = heading.kind {
            assert_eq!(level, HeadingLevel::H1);
        } else {
            panic!("Expected heading node, got {:?}", heading.kind);
        }
        assert_eq!(heading.text_content(), "Hello");
    }

    #[test]
    fn test_render_is_deterministic() {
        let source = "# Title\n\nSome **bold** text\n\n- a\n- b\n";
        assert_eq!(render(source), render(source));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // List Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_render_unordered_list_two_items() {
        let view = render("- a\n- b");

        let list = &view.root.children[0];
        if let RenderNodeKind::List { kind, .. } = &list.kind {
            assert!(matches!(kind, ListKind::Bullet));
        } else {
            panic!("Expected list node");
        }
        assert_eq!(list.children.len(), 2);
        assert_eq!(list.children[0].text_content(), "a");
        assert_eq!(list.children[1].text_content(), "b");
    }

    #[test]
    fn test_render_ordered_list() {
        let view = render("1. First\n2. Second");

        let list = &view.root.children[0];
        if let RenderNodeKind::List { kind, .. } = &list.kind {
            if let ListKind::Ordered { start, .. } = kind {
                assert_eq!(*start, 1);
            } else {
                panic!("Expected ordered list");
            }
        } else {
            panic!("Expected list node");
        }
    }

    #[test]
    fn test_render_task_list() {
        let view = render("- [ ] todo\n- [x] done");

        let list = &view.root.children[0];
        assert_eq!(list.children.len(), 2);

        let checked: Vec<bool> = list
            .children
            .iter()
            .map(|item| match item.kind {
                RenderNodeKind::TaskItem { checked } => checked,
                _ => panic!("Expected task item, got {:?}", item.kind),
            })
            .collect();
        assert_eq!(checked, vec![false, true]);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inline Element Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_render_strong_structure() {
        let view = render("This is **bold** text");
        let para = &view.root.children[0];

        let has_strong = para
            .children
            .iter()
            .any(|c| matches!(c.kind, RenderNodeKind::Strong));
        assert!(has_strong, "Paragraph should contain a Strong node");

        let strong = para
            .children
            .iter()
            .find(|c| matches!(c.kind, RenderNodeKind::Strong))
            .unwrap();
        assert_eq!(strong.text_content(), "bold");
    }

    #[test]
    fn test_render_strikethrough() {
        let view = render("~~gone~~");
        let para = &view.root.children[0];
        assert!(para
            .children
            .iter()
            .any(|c| matches!(c.kind, RenderNodeKind::Strikethrough)));
    }

    #[test]
    fn test_render_autolink() {
        let view = render("Visit https://example.com today");
        let para = &view.root.children[0];
        let link = para
            .children
            .iter()
            .find(|c| matches!(c.kind, RenderNodeKind::Link { .. }));
        assert!(link.is_some(), "Autolink extension should produce a link");
    }

    #[test]
    fn test_render_inline_code() {
        let view = render("call `foo()` here");
        let para = &view.root.children[0];
        assert!(para
            .children
            .iter()
            .any(|c| matches!(&c.kind, RenderNodeKind::Code(t) if t == "foo()")));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Table Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_render_table() {
        let view = render("| A | B |\n|---|---|\n| 1 | 2 |");
        let table = view
            .root
            .children
            .iter()
            .find(|n| matches!(n.kind, RenderNodeKind::Table { .. }))
            .expect("table extension should be on");

        if let RenderNodeKind::Table { num_columns, .. } = &table.kind {
            assert_eq!(*num_columns, 2);
        }
        // Header row plus one body row
        assert_eq!(table.children.len(), 2);
        assert!(
            matches!(table.children[0].kind, RenderNodeKind::TableRow { header } if header)
        );
    }

    #[test]
    fn test_render_table_alignment() {
        let view = render("| L | C | R |\n|:--|:-:|--:|\n| a | b | c |");
        let table = view
            .root
            .children
            .iter()
            .find(|n| matches!(n.kind, RenderNodeKind::Table { .. }))
            .unwrap();

        if let RenderNodeKind::Table { alignments, .. } = &table.kind {
            assert_eq!(
                alignments,
                &vec![
                    TableAlignment::Left,
                    TableAlignment::Center,
                    TableAlignment::Right
                ]
            );
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Containment & Degradation Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_raw_html_is_inert() {
        let view = render("<script>alert('x')</script>");
        // The block is carried as literal text, never as executable content
        let block = &view.root.children[0];
        assert!(matches!(block.kind, RenderNodeKind::HtmlBlock(_)));
    }

    #[test]
    fn test_malformed_markdown_never_fails() {
        let inputs = [
            "# Unclosed heading",
            "```\nunclosed code block",
            "| broken | table",
            "[unclosed link(",
            "![broken image",
            "***nested emphasis**",
            "~~~half fence",
        ];

        for input in inputs {
            let view = render(input);
            assert!(
                matches!(view.root.kind, RenderNodeKind::Document),
                "input {:?} should still yield a document",
                input
            );
        }
    }

    #[test]
    fn test_unmatched_syntax_degrades_to_text() {
        let view = render("**never closed");
        assert!(view.plain_text().contains("never closed"));
    }

    #[test]
    fn test_code_block_literal_preserved() {
        let view = render("```rust\nfn main() {}\n```");
        let block = &view.root.children[0];
        if let RenderNodeKind::CodeBlock { language, literal } = &block.kind {
            assert_eq!(language, "rust");
            assert_eq!(literal, "fn main() {}\n");
        } else {
            panic!("Expected code block");
        }
    }

    #[test]
    fn test_plain_text_flattening() {
        let view = render("# Title\n\nBody with **bold**.");
        let text = view.plain_text();
        assert!(text.contains("Title"));
        assert!(text.contains("bold"));
        assert!(!text.contains('#'));
        assert!(!text.contains("**"));
    }
}
