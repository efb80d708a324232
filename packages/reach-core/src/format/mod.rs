//! Incremental text formatter.
//!
//! [`format_message`] turns raw (possibly partial) model output into
//! paragraphs and list items. It is a pure function of its input and is re-run
//! over the whole accumulated text after every chunk, so a block that looks
//! cut off mid-stream is corrected once the rest of the text arrives.
//!
//! The pipeline is a fixed sequence of named passes:
//!
//! 1. [`sanitize`]: escape markup, normalize line endings
//! 2. [`markdown`]: strip headings, emphasis, code markers and link targets
//! 3. [`segment`]: re-insert breaks lost in run-on output
//! 4. [`lines`]: classify lines and normalize blank lines
//! 5. [`blocks`]: group lines into blocks, re-split long paragraphs
//!
//! Empty blocks never reach the output.

pub mod blocks;
pub mod lines;
pub mod markdown;
pub mod sanitize;
pub mod segment;

use crate::types::FormattedBlock;

/// Format raw message text into display blocks.
///
/// Total over arbitrary input: the result may be empty but never fails.
pub fn format_message(raw: &str) -> Vec<FormattedBlock> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let text = sanitize::escape_markup(raw);
    let text = sanitize::normalize_line_endings(&text);
    let text = markdown::strip_emphasis(&text);
    let text = segment::split_run_on_numbers(&text);
    let text = segment::split_labeled_terms(&text);
    let text = segment::split_sentences(&text);

    let lines = lines::normalize_spacing(lines::classify_lines(&text));
    let blocks = blocks::split_long_paragraphs(blocks::group_blocks(&lines));

    blocks
        .into_iter()
        .filter(|block| !block.text.trim().is_empty())
        .collect()
}
