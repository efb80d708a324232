//! Heuristic re-segmentation of run-on model output.
//!
//! Models frequently drop the line breaks between enumerated points, labeled
//! items and sentences. Each pass here re-inserts a break at one kind of
//! boundary. They are applied in this order:
//!
//! 1. [`split_run_on_numbers`]: `...end1. Next` becomes `...end` / `1. Next`
//! 2. [`split_labeled_terms`]: `Sales AI: ...leads.Support AI: ...`
//! 3. [`split_sentences`]: `done. Next` becomes `done.` / `Next`
//!
//! Numbers and labels get a paragraph break (`\n\n`). Sentences only get a
//! line break: consecutive sentence lines are joined back into one paragraph,
//! and long paragraphs are re-split later by length. The sentence pass has no
//! abbreviation list and splits `Dr. Smith`.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const PARAGRAPH_BREAK: &str = "\n\n";
const LINE_BREAK: &str = "\n";
/// Non-colon characters a label needs after its capital letter
const MIN_LABEL_TAIL: usize = 5;
/// Characters a label's description needs before the next label may start
const MIN_DESCRIPTION: usize = 10;

static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([.!?])[ \t]+([A-Z])").expect("valid regex"));

/// Break before `<n>. ` when the digit run is glued to preceding text.
pub fn split_run_on_numbers(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_ascii_digit() {
            let prev = chars[i - 1];
            if !prev.is_ascii_digit() && !prev.is_whitespace() && is_marker_tail(&chars, i) {
                out.push_str(PARAGRAPH_BREAK);
            }
        }
        out.push(c);
    }
    out
}

/// Whether the digit run starting at `start` is followed by `.` and a space.
fn is_marker_tail(chars: &[char], start: usize) -> bool {
    let end = start + chars[start..].iter().take_while(|c| c.is_ascii_digit()).count();
    chars.get(end) == Some(&'.') && matches!(chars.get(end + 1), Some(' ' | '\t'))
}

/// Line break between a sentence end and a capital letter on the same line.
///
/// Punctuation right after a digit (`3. Then`, `item 2. Next`) is a number or
/// list marker and never ends a sentence here.
pub fn split_sentences(text: &str) -> String {
    SENTENCE_BOUNDARY
        .replace_all(text, |caps: &Captures<'_>| {
            let after_digit = caps
                .get(1)
                .and_then(|m| text[..m.start()].chars().next_back())
                .is_some_and(|c| c.is_ascii_digit());
            if after_digit {
                caps[0].to_string()
            } else {
                format!("{}{}{}", &caps[1], LINE_BREAK, &caps[2])
            }
        })
        .into_owned()
}

/// Break before a capitalized `Label: ` that directly follows the description
/// of a previous label, as in `Sales AI Agents: find leads.Support AI Agents: ...`.
///
/// A label is a capital letter, at least five non-colon characters, a colon
/// and a space, all on one line. The description in between must be at least
/// ten characters without a colon or newline.
pub fn split_labeled_terms(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut breaks = Vec::new();
    let mut pos = 0;

    while let Some(colon) = find_char(&chars, pos, ':') {
        if !has_label_before(&chars, pos, colon) {
            pos = colon + 1;
            continue;
        }
        match next_label_start(&chars, colon) {
            Some(next) => {
                breaks.push(next);
                pos = next;
            }
            None => pos = colon + 1,
        }
    }

    if breaks.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + breaks.len() * PARAGRAPH_BREAK.len());
    let mut breaks = breaks.into_iter().peekable();
    for (i, &c) in chars.iter().enumerate() {
        if breaks.next_if_eq(&i).is_some() {
            out.push_str(PARAGRAPH_BREAK);
        }
        out.push(c);
    }
    out
}

fn find_char(chars: &[char], from: usize, target: char) -> Option<usize> {
    chars
        .get(from..)?
        .iter()
        .position(|&c| c == target)
        .map(|offset| from + offset)
}

/// A capital letter on the colon's line, far enough from it to start a label.
fn has_label_before(chars: &[char], from: usize, colon: usize) -> bool {
    let line_start = chars[from..colon]
        .iter()
        .rposition(|&c| c == '\n')
        .map_or(from, |offset| from + offset + 1);
    (line_start..colon).any(|i| chars[i].is_ascii_uppercase() && colon - i > MIN_LABEL_TAIL)
}

fn is_inline_space(c: Option<&char>) -> bool {
    matches!(c, Some(' ' | '\t'))
}

/// Where the label following the description after `colon` begins, if any.
///
/// The label is the run of letters and spaces that ends at the next colon. It
/// starts at the first capitalized word of that run, so capitals earlier in
/// the description (`for Acme quickly.`) are never mistaken for it.
fn next_label_start(chars: &[char], colon: usize) -> Option<usize> {
    let mut body = colon + 1;
    if !is_inline_space(chars.get(body)) {
        return None;
    }
    while is_inline_space(chars.get(body)) {
        body += 1;
    }

    let next_colon = find_char(chars, body, ':')?;
    if !is_inline_space(chars.get(next_colon + 1)) || chars[body..next_colon].contains(&'\n') {
        return None;
    }

    let run_start = next_colon
        - chars[body..next_colon]
            .iter()
            .rev()
            .take_while(|c| c.is_ascii_alphabetic() || **c == ' ')
            .count();

    (run_start.max(body + MIN_DESCRIPTION)..next_colon).find(|&i| {
        chars[i].is_ascii_uppercase()
            && (i == run_start || chars[i - 1] == ' ')
            && next_colon - i > MIN_LABEL_TAIL
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_on_numbers() {
        assert_eq!(
            split_run_on_numbers("First item2. Second item3. Third"),
            "First item\n\n2. Second item\n\n3. Third"
        );
    }

    #[test]
    fn test_run_on_numbers_keeps_whitespace_preceded_and_decimals() {
        assert_eq!(split_run_on_numbers("Intro. 1. First"), "Intro. 1. First");
        assert_eq!(split_run_on_numbers("up 3.5x in Q2"), "up 3.5x in Q2");
        // The whole digit run moves, not its last digit
        assert_eq!(split_run_on_numbers("end12. Twelve"), "end\n\n12. Twelve");
    }

    #[test]
    fn test_run_on_numbers_waits_for_the_space() {
        assert_eq!(split_run_on_numbers("item2."), "item2.");
    }

    #[test]
    fn test_sentences() {
        assert_eq!(
            split_sentences("We build agents. They never sleep! Want one? Sure"),
            "We build agents.\nThey never sleep!\nWant one?\nSure"
        );
    }

    #[test]
    fn test_sentences_before_single_letters_and_acronyms() {
        assert_eq!(
            split_sentences("Thanks for asking. I can help. AI agents work"),
            "Thanks for asking.\nI can help.\nAI agents work"
        );
    }

    #[test]
    fn test_sentences_keep_existing_breaks() {
        let text = "First part.\n\nSecond part.";
        assert_eq!(split_sentences(text), text);
    }

    #[test]
    fn test_sentences_skip_numbers_and_lowercase() {
        assert_eq!(split_sentences("1. First item"), "1. First item");
        assert_eq!(split_sentences("Costs rose 3. Then fell"), "Costs rose 3. Then fell");
        assert_eq!(split_sentences("done. and then"), "done. and then");
        assert_eq!(split_sentences("pi is 3.14 roughly"), "pi is 3.14 roughly");
    }

    #[test]
    fn test_sentences_over_split_abbreviations() {
        assert_eq!(split_sentences("Ask Dr. Smith today"), "Ask Dr.\nSmith today");
    }

    #[test]
    fn test_labeled_terms() {
        assert_eq!(
            split_labeled_terms("Sales AI Agents: find leads.Support AI Agents: handle tickets."),
            "Sales AI Agents: find leads.\n\nSupport AI Agents: handle tickets."
        );
    }

    #[test]
    fn test_labeled_terms_chain() {
        assert_eq!(
            split_labeled_terms(
                "Sales AI Agents: find leads fast.Support AI Agents: handle tickets.Voice AI Agents: answer calls."
            ),
            "Sales AI Agents: find leads fast.\n\nSupport AI Agents: handle tickets.\n\nVoice AI Agents: answer calls."
        );
    }

    #[test]
    fn test_labeled_terms_ignore_capitals_inside_description() {
        assert_eq!(
            split_labeled_terms(
                "Sales AI Agents: find new leads for Acme quickly.Support AI Agents: handle tickets."
            ),
            "Sales AI Agents: find new leads for Acme quickly.\n\nSupport AI Agents: handle tickets."
        );
    }

    #[test]
    fn test_labeled_terms_need_long_enough_parts() {
        let text = "Name: Bob.Title: CEO";
        assert_eq!(split_labeled_terms(text), text);

        let text = "Visit https://example.com today";
        assert_eq!(split_labeled_terms(text), text);
    }

    #[test]
    fn test_labeled_terms_stop_at_newline() {
        let text = "Sales AI Agents: find\nSupport AI Agents: tickets";
        assert_eq!(split_labeled_terms(text), text);
    }
}
