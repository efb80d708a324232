//! Request, response and event types for the chat endpoint.

use reach_core::{FormattedBlock, WireMessage};
use serde::{Deserialize, Serialize};

/// Reply used when a non-streaming body carries no text.
pub const FALLBACK_REPLY: &str = "Sorry, I didn't understand that.";

// ============================================================================
// Wire Types
// ============================================================================

/// Request body: the full conversation so far.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub messages: &'a [WireMessage],
}

/// Non-streaming reply body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplyBody {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl ReplyBody {
    /// `reply`, then `text`, then the fallback reply. Empty strings are skipped.
    pub fn into_reply(self) -> String {
        non_empty(self.reply)
            .or_else(|| non_empty(self.text))
            .unwrap_or_else(|| FALLBACK_REPLY.to_string())
    }
}

/// Error body of a non-2xx response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// First non-empty of `error`, `details`, `message`.
    pub fn into_message(self) -> Option<String> {
        non_empty(self.error)
            .or_else(|| non_empty(self.details))
            .or_else(|| non_empty(self.message))
    }

    /// Parse a raw error body; anything that is not a JSON object yields `None`.
    pub fn message_from(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(ErrorBody::into_message)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Whether a response with this `Content-Type` is read as a stream.
pub fn is_streaming_content_type(content_type: &str) -> bool {
    content_type.contains("text/event-stream")
        || content_type.contains("application/x-ndjson")
        || content_type.contains("text/")
}

// ============================================================================
// Turn Events
// ============================================================================

/// How a turn's stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEnd {
    /// The body ended (or a single JSON reply was read)
    Completed,
    /// A finish marker arrived
    Finished,
    /// The user cancelled the turn
    Cancelled,
    /// The read failed part way; carries the notice to display
    Interrupted(String),
}

/// Progress of one assistant turn, as seen by the widget.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    /// The accumulated text grew; `blocks` is its formatting
    Delta {
        text: String,
        blocks: Vec<FormattedBlock>,
    },
    /// Final text of the turn
    Sealed {
        text: String,
        blocks: Vec<FormattedBlock>,
        end: TurnEnd,
    },
    /// No reply at all; `message` replaces it in the transcript
    Failed { message: String },
}

impl TurnEvent {
    /// Whether this event ends the turn.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TurnEvent::Delta { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reach_core::Role;

    #[test]
    fn test_request_shape() {
        let messages = vec![WireMessage {
            role: Role::User,
            content: "Hi".to_string(),
        }];
        let body = serde_json::to_value(ChatRequest { messages: &messages }).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "messages": [{ "role": "user", "content": "Hi" }] })
        );
    }

    #[test]
    fn test_reply_fields_in_order() {
        let body: ReplyBody = serde_json::from_str(r#"{"reply":"Hi there","text":"no"}"#).unwrap();
        assert_eq!(body.into_reply(), "Hi there");

        let body: ReplyBody = serde_json::from_str(r#"{"reply":"","text":"From text"}"#).unwrap();
        assert_eq!(body.into_reply(), "From text");

        let body: ReplyBody = serde_json::from_str(r#"{"other":1}"#).unwrap();
        assert_eq!(body.into_reply(), FALLBACK_REPLY);
    }

    #[test]
    fn test_error_fields_in_order() {
        assert_eq!(
            ErrorBody::message_from(r#"{"error":"rate limited","details":"x"}"#).as_deref(),
            Some("rate limited")
        );
        assert_eq!(
            ErrorBody::message_from(r#"{"details":"upstream timeout"}"#).as_deref(),
            Some("upstream timeout")
        );
        assert_eq!(
            ErrorBody::message_from(r#"{"message":"bad request"}"#).as_deref(),
            Some("bad request")
        );
        assert_eq!(ErrorBody::message_from("<html>502</html>"), None);
        assert_eq!(ErrorBody::message_from(r#"{"error":""}"#), None);
    }

    #[test]
    fn test_streaming_content_types() {
        assert!(is_streaming_content_type("text/event-stream"));
        assert!(is_streaming_content_type("text/plain; charset=utf-8"));
        assert!(is_streaming_content_type("application/x-ndjson"));
        assert!(!is_streaming_content_type("application/json"));
        assert!(!is_streaming_content_type(""));
    }
}
