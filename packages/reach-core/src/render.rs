//! Block renderers.
//!
//! Formatting produces [`FormattedBlock`]s; how they are displayed is up to the
//! front-end. Two renderers ship with the crate: HTML for embedding in a page
//! and plain text for terminals.

use crate::format::sanitize::unescape_markup;
use crate::types::{BlockKind, FormattedBlock};

/// Turns formatted blocks into display text.
pub trait BlockRenderer {
    /// Render a single block.
    fn render_block(&self, block: &FormattedBlock) -> String;

    /// Text placed between two consecutive blocks.
    fn separator(&self, _prev: &FormattedBlock, _next: &FormattedBlock) -> &'static str {
        ""
    }

    /// Render a whole message.
    fn render(&self, blocks: &[FormattedBlock]) -> String {
        let mut out = String::new();
        for (i, block) in blocks.iter().enumerate() {
            if i > 0 {
                out.push_str(self.separator(&blocks[i - 1], block));
            }
            out.push_str(&self.render_block(block));
        }
        out
    }
}

/// `<p>` per paragraph and a `<div>` per list item.
///
/// Block text is already escaped, so it is inserted as-is.
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    pub list_item_class: String,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self {
            list_item_class: "cr-list-item".to_string(),
        }
    }
}

impl BlockRenderer for HtmlRenderer {
    fn render_block(&self, block: &FormattedBlock) -> String {
        match block.kind {
            BlockKind::Paragraph => format!("<p>{}</p>", block.text),
            BlockKind::ListItem => {
                format!("<div class=\"{}\">{}</div>", self.list_item_class, block.text)
            }
        }
    }
}

/// Terminal output: blank line between paragraphs, list items indented and
/// kept together.
#[derive(Debug, Clone)]
pub struct PlainRenderer {
    pub indent: String,
}

impl Default for PlainRenderer {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
        }
    }
}

impl BlockRenderer for PlainRenderer {
    fn render_block(&self, block: &FormattedBlock) -> String {
        let text = unescape_markup(&block.text);
        match block.kind {
            BlockKind::Paragraph => text,
            BlockKind::ListItem => format!("{}{}", self.indent, text),
        }
    }

    fn separator(&self, prev: &FormattedBlock, next: &FormattedBlock) -> &'static str {
        if prev.is_list_item() && next.is_list_item() {
            "\n"
        } else {
            "\n\n"
        }
    }
}
