//! Core data types for the Reach chat widget.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Who authored a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single conversation message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Author of the message
    pub role: Role,
    /// Message text as received (never formatted)
    pub content: String,
    /// When the message was appended
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// The `{role, content}` pair sent to the chat endpoint.
    pub fn to_wire(&self) -> WireMessage {
        WireMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Message shape on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

/// Ordered, append-only message history owned by one widget.
///
/// At most one assistant turn is in flight at a time. While in flight, the
/// trailing assistant message is the only mutable entry and it may only grow.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    in_flight: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages, including the in-flight assistant message if any.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether an assistant turn is currently streaming.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Append a user message.
    pub fn push_user(&mut self, content: &str) -> Result<()> {
        if self.in_flight {
            return Err(Error::TurnInFlight);
        }
        if content.trim().is_empty() {
            return Err(Error::EmptyMessage);
        }
        self.messages.push(Message::user(content));
        Ok(())
    }

    /// Append a complete assistant message (greeting, non-streaming reply).
    pub fn push_assistant(&mut self, content: &str) -> Result<()> {
        if self.in_flight {
            return Err(Error::TurnInFlight);
        }
        if content.is_empty() {
            return Err(Error::EmptyMessage);
        }
        self.messages.push(Message::assistant(content));
        Ok(())
    }

    /// Begin a new assistant turn with empty content.
    pub fn start_turn(&mut self) -> Result<()> {
        if self.in_flight {
            return Err(Error::TurnInFlight);
        }
        self.messages.push(Message::assistant(String::new()));
        self.in_flight = true;
        Ok(())
    }

    /// Replace the in-flight content with a longer accumulation of itself.
    pub fn update_turn(&mut self, text: &str) -> Result<()> {
        let current = self.in_flight_message_mut()?;
        if !text.starts_with(current.content.as_str()) {
            return Err(Error::NonMonotonicUpdate {
                current: current.content.len(),
                proposed: text.len(),
            });
        }
        let known = current.content.len();
        current.content.push_str(&text[known..]);
        Ok(())
    }

    /// Finalize the in-flight turn.
    ///
    /// Returns the sealed message, or `None` when the turn produced no text; an
    /// empty assistant message is dropped instead of being kept in history.
    pub fn seal_turn(&mut self) -> Result<Option<&Message>> {
        if !self.in_flight {
            return Err(Error::NoTurnInFlight);
        }
        self.in_flight = false;

        let empty = self
            .messages
            .last()
            .map(|m| m.content.is_empty())
            .unwrap_or(true);
        if empty {
            self.messages.pop();
            return Ok(None);
        }
        Ok(self.messages.last())
    }

    /// Messages in the request body shape.
    pub fn wire_messages(&self) -> Vec<WireMessage> {
        self.messages
            .iter()
            .filter(|m| !m.content.is_empty())
            .map(Message::to_wire)
            .collect()
    }

    fn in_flight_message_mut(&mut self) -> Result<&mut Message> {
        if !self.in_flight {
            return Err(Error::NoTurnInFlight);
        }
        self.messages.last_mut().ok_or(Error::NoTurnInFlight)
    }
}

/// Kind of formatted output unit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Paragraph,
    ListItem,
}

/// A unit of formatted output ready for display.
///
/// Text is markup-safe: markup-significant characters are already escaped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormattedBlock {
    pub kind: BlockKind,
    pub text: String,
}

impl FormattedBlock {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            text: text.into(),
        }
    }

    pub fn list_item(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::ListItem,
            text: text.into(),
        }
    }

    pub fn is_list_item(&self) -> bool {
        self.kind == BlockKind::ListItem
    }
}

/// JSON envelope printed by the command line tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let wire = WireMessage {
            role: Role::Assistant,
            content: "hi".to_string(),
        };
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "hi"}));
    }

    #[test]
    fn test_block_kind_serializes_kebab_case() {
        let block = FormattedBlock::list_item("1. First");
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["kind"], "list-item");
    }

    #[test]
    fn test_turn_lifecycle() {
        let mut conversation = Conversation::new();
        conversation.push_user("What do you offer?").unwrap();
        conversation.start_turn().unwrap();
        assert!(conversation.is_in_flight());

        conversation.update_turn("We").unwrap();
        conversation.update_turn("We offer").unwrap();

        let sealed = conversation.seal_turn().unwrap().unwrap();
        assert_eq!(sealed.role, Role::Assistant);
        assert_eq!(sealed.content, "We offer");
        assert!(!conversation.is_in_flight());
        assert_eq!(conversation.len(), 2);
    }

    #[test]
    fn test_push_user_rejected_while_in_flight() {
        let mut conversation = Conversation::new();
        conversation.push_user("hello").unwrap();
        conversation.start_turn().unwrap();

        assert!(matches!(
            conversation.push_user("again"),
            Err(Error::TurnInFlight)
        ));
        assert!(matches!(conversation.start_turn(), Err(Error::TurnInFlight)));
    }

    #[test]
    fn test_update_turn_must_extend_content() {
        let mut conversation = Conversation::new();
        conversation.start_turn().unwrap();
        conversation.update_turn("Hello world").unwrap();

        let result = conversation.update_turn("Hello");
        assert!(matches!(result, Err(Error::NonMonotonicUpdate { .. })));

        let result = conversation.update_turn("Goodbye world!");
        assert!(matches!(result, Err(Error::NonMonotonicUpdate { .. })));
        assert_eq!(conversation.messages()[0].content, "Hello world");
    }

    #[test]
    fn test_empty_turn_is_dropped_on_seal() {
        let mut conversation = Conversation::new();
        conversation.push_user("hello").unwrap();
        conversation.start_turn().unwrap();

        assert!(conversation.seal_turn().unwrap().is_none());
        assert_eq!(conversation.len(), 1);
        assert!(matches!(conversation.seal_turn(), Err(Error::NoTurnInFlight)));
    }

    #[test]
    fn test_wire_messages_skip_in_flight_placeholder() {
        let mut conversation = Conversation::new();
        conversation.push_assistant("Hi! How can I help?").unwrap();
        conversation.push_user("Pricing?").unwrap();
        conversation.start_turn().unwrap();

        let wire = conversation.wire_messages();
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[1].role, Role::User);
        assert_eq!(wire[1].content, "Pricing?");
    }

    #[test]
    fn test_blank_user_message_rejected() {
        let mut conversation = Conversation::new();
        assert!(matches!(
            conversation.push_user("   "),
            Err(Error::EmptyMessage)
        ));
        assert!(conversation.is_empty());
    }

    #[test]
    fn test_api_response_skips_missing_fields() {
        let ok = serde_json::to_value(ApiResponse::ok(1)).unwrap();
        assert_eq!(ok, serde_json::json!({"ok": true, "data": 1}));

        let err = serde_json::to_value(ApiResponse::<()>::err("no input")).unwrap();
        assert_eq!(err, serde_json::json!({"ok": false, "error": "no input"}));
    }
}
