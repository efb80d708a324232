//! Residual markdown removal.
//!
//! Display is block based, so markdown emphasis from the model is discarded
//! and only the enclosed text is kept.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*```[^\n]*$\n?").expect("valid regex"));
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]+)`").expect("valid regex"));
static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]\n]+)\]\([^)\s]*\)").expect("valid regex"));
static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+(.*)$").expect("valid regex"));
static BOLD_STARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid regex"));
static BOLD_UNDERSCORES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"__(.*?)__").expect("valid regex"));
// Opening marker must touch its text, so a `* item` bullet never matches
static ITALIC_STAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*([^*\s][^*\n]*?)\*").expect("valid regex"));
static ITALIC_UNDERSCORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_([^_\s][^_\n]*?)_").expect("valid regex"));

/// Remove headings, emphasis, code markers and link targets.
pub fn strip_emphasis(text: &str) -> String {
    let text = CODE_FENCE.replace_all(text, "");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = LINK.replace_all(&text, "$1");
    // A heading becomes its own section
    let text = HEADING.replace_all(&text, "\n$1\n");
    let text = BOLD_STARS.replace_all(&text, "$1");
    let text = BOLD_UNDERSCORES.replace_all(&text, "$1");
    let text = ITALIC_STAR.replace_all(&text, "$1");
    strip_underscore_italic(&text)
}

/// `_x_` only counts as emphasis at word boundaries (`snake_case` is kept).
fn strip_underscore_italic(text: &str) -> String {
    ITALIC_UNDERSCORE
        .replace_all(text, |caps: &Captures<'_>| match caps.get(0) {
            Some(m) if is_word_bounded(text, m.start(), m.end()) => caps[1].to_string(),
            _ => caps[0].to_string(),
        })
        .into_owned()
}

fn is_word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
