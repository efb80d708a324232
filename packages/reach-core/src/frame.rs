//! Wire frame classification.
//!
//! A frame is one newline-delimited line of the response body. Three shapes
//! are recognized, checked in this order:
//!
//! 1. `<digits>:<json>` - data stream parts (`0:{"type":"text-delta",...}`)
//! 2. `data: <json>` - server-sent events
//! 3. anything else - literal text
//!
//! JSON that fails to parse never aborts the stream: the line falls back to
//! literal text.

use serde::Deserialize;
use serde_json::Value;

const SSE_PREFIX: &str = "data: ";
const SSE_DONE: &str = "[DONE]";
const TEXT_PART_CODE: &str = "0";

/// Decoded content of a JSON-carrying frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaPayload {
    /// A text delta to append
    Text(String),
    /// End of the assistant turn
    Finish,
    /// Valid JSON without a recognized shape; carries no text
    Other,
    /// JSON parsing failed; the raw text is used literally
    Malformed(String),
}

/// One classified line from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    NumberedDelta(DeltaPayload),
    SseDelta(DeltaPayload),
    PlainText(String),
}

impl StreamFrame {
    /// Text this frame contributes to the accumulated message, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamFrame::NumberedDelta(payload) | StreamFrame::SseDelta(payload) => match payload {
                DeltaPayload::Text(text) | DeltaPayload::Malformed(text) => Some(text),
                DeltaPayload::Finish | DeltaPayload::Other => None,
            },
            StreamFrame::PlainText(text) => Some(text),
        }
    }

    /// Whether this frame ends the turn.
    pub fn is_finish(&self) -> bool {
        matches!(
            self,
            StreamFrame::NumberedDelta(DeltaPayload::Finish) | StreamFrame::SseDelta(DeltaPayload::Finish)
        )
    }

    /// Whether the text came from a literal-text path (plain or fallback).
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            StreamFrame::PlainText(_)
                | StreamFrame::NumberedDelta(DeltaPayload::Malformed(_))
                | StreamFrame::SseDelta(DeltaPayload::Malformed(_))
        )
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            StreamFrame::NumberedDelta(_) => "numbered-delta",
            StreamFrame::SseDelta(_) => "sse-delta",
            StreamFrame::PlainText(_) => "plain-text",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeltaEnvelope {
    #[serde(rename = "type")]
    kind: Option<String>,
    text_delta: Option<String>,
    /// Newer data stream protocol name for `textDelta`
    delta: Option<String>,
}

/// Classify a single line (without its terminator).
pub fn classify_line(line: &str) -> StreamFrame {
    if let Some((code, rest)) = split_numbered_prefix(line) {
        let payload = parse_payload(Some(code), rest).unwrap_or_else(|e| {
            tracing::trace!("numbered frame is not JSON ({}), using literal line", e);
            DeltaPayload::Malformed(line.to_string())
        });
        return StreamFrame::NumberedDelta(payload);
    }

    if let Some(rest) = line.strip_prefix(SSE_PREFIX) {
        if rest.trim() == SSE_DONE {
            return StreamFrame::SseDelta(DeltaPayload::Finish);
        }
        let payload = parse_payload(None, rest).unwrap_or_else(|e| {
            tracing::trace!("sse frame is not JSON ({}), using literal remainder", e);
            DeltaPayload::Malformed(rest.to_string())
        });
        return StreamFrame::SseDelta(payload);
    }

    StreamFrame::PlainText(line.to_string())
}

/// Split `"<digits>:<rest>"` into its code and remainder.
fn split_numbered_prefix(line: &str) -> Option<(&str, &str)> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || line.as_bytes().get(digits) != Some(&b':') {
        return None;
    }
    Some((&line[..digits], &line[digits + 1..]))
}

fn parse_payload(code: Option<&str>, raw: &str) -> Result<DeltaPayload, serde_json::Error> {
    let value: Value = serde_json::from_str(raw)?;

    // Plain string parts carry text on code 0
    if let Value::String(text) = &value {
        if code == Some(TEXT_PART_CODE) && !text.is_empty() {
            return Ok(DeltaPayload::Text(text.clone()));
        }
        return Ok(DeltaPayload::Other);
    }

    let Ok(envelope) = serde_json::from_value::<DeltaEnvelope>(value) else {
        return Ok(DeltaPayload::Other);
    };

    match envelope.kind.as_deref() {
        Some("text-delta") => {
            let text = envelope.text_delta.or(envelope.delta).unwrap_or_default();
            if text.is_empty() {
                Ok(DeltaPayload::Other)
            } else {
                Ok(DeltaPayload::Text(text))
            }
        }
        Some("finish") => Ok(DeltaPayload::Finish),
        _ => Ok(DeltaPayload::Other),
    }
}
