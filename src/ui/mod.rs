//! UI components

mod toolbar;

pub use toolbar::{Toolbar, ToolbarAction};
