//! Grouping classified lines into display blocks.

use once_cell::sync::Lazy;
use regex::Regex;

use super::lines::{collapse_whitespace, Line};
use crate::types::{BlockKind, FormattedBlock};

/// Paragraphs longer than this are considered for re-splitting
pub const LONG_PARAGRAPH_CHARS: usize = 200;
/// A re-split group is closed once it grows past this
pub const GROUP_TARGET_CHARS: usize = 150;

static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid regex"));

/// List lines become one `list-item` block each; each run of text lines is
/// joined into a single paragraph.
pub fn group_blocks(lines: &[Line]) -> Vec<FormattedBlock> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    for line in lines {
        match line {
            Line::Text(text) => paragraph.push(text),
            Line::Blank => flush_paragraph(&mut paragraph, &mut blocks),
            Line::Bullet(_) | Line::Numbered { .. } => {
                flush_paragraph(&mut paragraph, &mut blocks);
                blocks.push(FormattedBlock::list_item(line.render()));
            }
        }
    }
    flush_paragraph(&mut paragraph, &mut blocks);
    blocks
}

fn flush_paragraph(parts: &mut Vec<&str>, blocks: &mut Vec<FormattedBlock>) {
    if parts.is_empty() {
        return;
    }
    blocks.push(FormattedBlock::paragraph(collapse_whitespace(&parts.join(" "))));
    parts.clear();
}

/// Break a long paragraph into groups of sentences.
///
/// Sentences are added to the current group until it exceeds
/// [`GROUP_TARGET_CHARS`]. When that yields a single group the paragraph is
/// returned unchanged.
pub fn split_long_paragraph(text: &str) -> Vec<String> {
    if text.chars().count() <= LONG_PARAGRAPH_CHARS {
        return vec![text.to_string()];
    }

    let mut groups = Vec::new();
    let mut current = String::new();
    let mut last = 0;
    for end in SENTENCE_END.find_iter(text).map(|m| m.end()) {
        current.push_str(&text[last..end]);
        last = end;
        if current.chars().count() > GROUP_TARGET_CHARS {
            groups.push(current.trim().to_string());
            current.clear();
        }
    }
    current.push_str(&text[last..]);
    if !current.trim().is_empty() {
        groups.push(current.trim().to_string());
    }

    if groups.len() > 1 {
        groups
    } else {
        vec![text.to_string()]
    }
}

/// Apply [`split_long_paragraph`] to every paragraph block.
pub fn split_long_paragraphs(blocks: Vec<FormattedBlock>) -> Vec<FormattedBlock> {
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        match block.kind {
            BlockKind::Paragraph => out.extend(
                split_long_paragraph(&block.text)
                    .into_iter()
                    .map(FormattedBlock::paragraph),
            ),
            BlockKind::ListItem => out.push(block),
        }
    }
    out
}
