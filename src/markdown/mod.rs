//! Markdown rendering module
//!
//! Wraps comrak to turn source text into the rendered view tree, and syntect
//! to color fenced code blocks in the preview. The feature set is fixed to
//! GitHub Flavored Markdown: tables, strikethrough, task lists, autolinks.

pub mod parser;
pub mod syntax;

pub use parser::{
    render, HeadingLevel, ListKind, RenderNode, RenderNodeKind, RenderedView, TableAlignment,
};
