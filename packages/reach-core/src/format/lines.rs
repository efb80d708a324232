//! Line classification and blank-line normalization.

use once_cell::sync::Lazy;
use regex::Regex;

static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-*•]\s+(.*)$").expect("valid regex"));
static NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\.\s+(.*)$").expect("valid regex"));
// Numbered item further into a line: marker after whitespace, then content
static EMBEDDED_NUMBERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s(\d+\.\s+[^\d\s])").expect("valid regex"));

/// One classified line of re-segmented text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Blank,
    /// `-`, `*` or `•` item
    Bullet(String),
    /// `<n>.` item
    Numbered { number: String, text: String },
    Text(String),
}

impl Line {
    pub fn is_list_item(&self) -> bool {
        matches!(self, Line::Bullet(_) | Line::Numbered { .. })
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Line::Blank)
    }

    /// Display form with the list marker normalized.
    pub fn render(&self) -> String {
        match self {
            Line::Blank => String::new(),
            Line::Bullet(text) => format!("• {}", text),
            Line::Numbered { number, text } => format!("{}. {}", number, text),
            Line::Text(text) => text.clone(),
        }
    }
}

/// Split text into lines and classify each trimmed line.
///
/// A line with numbered items after its start (`Intro text. 1. First`) is
/// expanded into its leading fragment plus one line per item.
pub fn classify_lines(text: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    for raw in text.split('\n') {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            lines.push(Line::Blank);
            continue;
        }
        for segment in split_embedded_items(trimmed) {
            lines.push(classify_segment(segment));
        }
    }
    lines
}

fn split_embedded_items(line: &str) -> Vec<&str> {
    let starts: Vec<usize> = EMBEDDED_NUMBERED
        .captures_iter(line)
        .filter_map(|caps| caps.get(1).map(|m| m.start()))
        .collect();
    if starts.is_empty() {
        return vec![line];
    }

    let mut segments = Vec::with_capacity(starts.len() + 1);
    let mut from = 0;
    for start in starts {
        segments.push(line[from..start].trim());
        from = start;
    }
    segments.push(line[from..].trim());
    segments.retain(|s| !s.is_empty());
    segments
}

fn classify_segment(segment: &str) -> Line {
    if let Some(caps) = BULLET.captures(segment) {
        return Line::Bullet(collapse_whitespace(&caps[1]));
    }
    if let Some(caps) = NUMBERED.captures(segment) {
        return Line::Numbered {
            number: caps[1].to_string(),
            text: collapse_whitespace(&caps[2]),
        };
    }
    Line::Text(collapse_whitespace(segment))
}

/// Collapse blank lines and set off list runs.
///
/// At most one blank separates two non-blank lines, a blank is forced where a
/// list run starts or ends, and there are no leading or trailing blanks.
pub fn normalize_spacing(lines: Vec<Line>) -> Vec<Line> {
    let mut out: Vec<Line> = Vec::with_capacity(lines.len());
    let mut gap = false;

    for line in lines {
        if line.is_blank() {
            gap = true;
            continue;
        }
        if let Some(prev) = out.last() {
            if gap || prev.is_list_item() != line.is_list_item() {
                out.push(Line::Blank);
            }
        }
        out.push(line);
        gap = false;
    }
    out
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn numbered(number: &str, text: &str) -> Line {
        Line::Numbered {
            number: number.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_classify_basic_lines() {
        let lines = classify_lines("Intro\n\n- one\n* two\n•  three\n12.   Twelve  items\n   ");
        assert_eq!(
            lines,
            vec![
                Line::Text("Intro".to_string()),
                Line::Blank,
                Line::Bullet("one".to_string()),
                Line::Bullet("two".to_string()),
                Line::Bullet("three".to_string()),
                numbered("12", "Twelve items"),
                Line::Blank,
            ]
        );
    }

    #[test]
    fn test_mixed_line_is_expanded() {
        let lines = classify_lines("Intro text. 1. First item 2. Second item");
        assert_eq!(
            lines,
            vec![
                Line::Text("Intro text.".to_string()),
                numbered("1", "First item"),
                numbered("2", "Second item"),
            ]
        );
    }

    #[test]
    fn test_decimals_are_not_items() {
        let lines = classify_lines("Growth of 3.5 percent and 2. 5 more");
        assert_eq!(
            lines,
            vec![Line::Text("Growth of 3.5 percent and 2. 5 more".to_string())]
        );
    }

    #[test]
    fn test_render_normalizes_markers() {
        assert_eq!(Line::Bullet("Fast".to_string()).render(), "• Fast");
        assert_eq!(numbered("3", "Third").render(), "3. Third");
    }

    #[test]
    fn test_normalize_spacing() {
        let lines = vec![
            Line::Blank,
            Line::Text("Intro".to_string()),
            numbered("1", "One"),
            Line::Blank,
            Line::Blank,
            Line::Blank,
            numbered("2", "Two"),
            Line::Text("Outro".to_string()),
            Line::Blank,
        ];
        assert_eq!(
            normalize_spacing(lines),
            vec![
                Line::Text("Intro".to_string()),
                Line::Blank,
                numbered("1", "One"),
                Line::Blank,
                numbered("2", "Two"),
                Line::Blank,
                Line::Text("Outro".to_string()),
            ]
        );
    }

    #[test]
    fn test_normalize_spacing_keeps_adjacent_items_together() {
        let lines = classify_lines("- a\n- b\nafter");
        assert_eq!(
            normalize_spacing(lines),
            vec![
                Line::Bullet("a".to_string()),
                Line::Bullet("b".to_string()),
                Line::Blank,
                Line::Text("after".to_string()),
            ]
        );
    }
}
