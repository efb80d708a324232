//! Chat widget state
//!
//! One [`ChatWidget`] owns the conversation, the open/closed state and the
//! display transcript. All mutation goes through its methods; the front-end
//! only reads [`ChatWidget::transcript`].

use chrono::{DateTime, Utc};
use reach_core::format::sanitize::escape_markup;
use reach_core::{format_message, Conversation, FormattedBlock, Role, WireMessage};

use crate::api::{TurnEnd, TurnEvent};
use crate::config::ChatConfig;

/// An error shown in the transcript but never sent back to the endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
enum Entry {
    /// Display-only greeting; never part of the conversation
    Greeting(Vec<FormattedBlock>),
    /// Index into the conversation with its formatted blocks
    Message {
        index: usize,
        blocks: Vec<FormattedBlock>,
    },
    Notice(Notice),
}

/// The in-flight assistant message as last formatted
#[derive(Debug, Clone, Default)]
pub struct StreamingMessage {
    pub blocks: Vec<FormattedBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Greeting,
    Message,
    /// The assistant message still being received
    Streaming,
    Notice,
}

/// One row of the rendered conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub role: Role,
    pub kind: EntryKind,
    pub blocks: Vec<FormattedBlock>,
}

#[derive(Debug)]
pub struct ChatWidget {
    name: String,
    greeting: String,
    welcome: String,
    conversation: Conversation,
    entries: Vec<Entry>,
    streaming: Option<StreamingMessage>,
    is_open: bool,
    greeted: bool,
}

// ============================================================================
// State Actions
// ============================================================================

impl ChatWidget {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            name: config.name.clone(),
            greeting: config.greeting_text(),
            welcome: config.welcome.clone(),
            conversation: Conversation::new(),
            entries: Vec::new(),
            streaming: None,
            is_open: false,
            greeted: false,
        }
    }

    /// Open the widget; the first open shows the greeting.
    ///
    /// The greeting is only displayed. It is not sent with requests. Returns
    /// whether it was added.
    pub fn open(&mut self) -> bool {
        self.is_open = true;
        if self.greeted {
            return false;
        }
        self.greeted = true;
        self.entries.push(Entry::Greeting(format_message(&self.greeting)));
        true
    }

    pub fn close(&mut self) {
        self.is_open = false;
    }

    /// Flip open/closed; returns the new state.
    pub fn toggle(&mut self) -> bool {
        if self.is_open {
            self.close();
        } else {
            self.open();
        }
        self.is_open
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Teaser text, hidden for good once the widget has been opened.
    pub fn welcome(&self) -> Option<&str> {
        (!self.greeted).then_some(self.welcome.as_str())
    }

    /// Whether a reply is streaming; input is disabled meanwhile.
    pub fn is_streaming(&self) -> bool {
        self.conversation.is_in_flight()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Append the user's message and start an assistant turn.
    ///
    /// Returns the request history. Blank input, or any input while a reply is
    /// streaming, is rejected and leaves the widget unchanged.
    pub fn begin_send(&mut self, input: &str) -> reach_core::Result<Vec<WireMessage>> {
        if self.conversation.is_in_flight() {
            return Err(reach_core::Error::TurnInFlight);
        }
        let text = input.trim();
        self.conversation.push_user(text)?;
        self.push_message_entry(vec![FormattedBlock::paragraph(escape_markup(text))]);

        let messages = self.conversation.wire_messages();
        self.conversation.start_turn()?;
        self.streaming = Some(StreamingMessage::default());
        tracing::debug!(messages = messages.len(), "turn started");
        Ok(messages)
    }

    /// Apply one event from the client to the in-flight turn.
    pub fn apply(&mut self, event: TurnEvent) {
        if !self.conversation.is_in_flight() {
            tracing::warn!(?event, "event without a turn in flight");
            return;
        }

        match event {
            TurnEvent::Delta { text, blocks } => {
                if let Err(e) = self.conversation.update_turn(&text) {
                    tracing::warn!(error = %e, "delta ignored");
                    return;
                }
                if let Some(streaming) = self.streaming.as_mut() {
                    streaming.blocks = blocks;
                }
            }
            TurnEvent::Sealed { text, blocks, end } => {
                if let Err(e) = self.conversation.update_turn(&text) {
                    tracing::warn!(error = %e, "final text ignored");
                }
                self.seal(text, blocks);
                if let TurnEnd::Interrupted(message) = end {
                    self.push_notice(message);
                }
            }
            TurnEvent::Failed { message } => {
                self.seal(String::new(), Vec::new());
                self.push_notice(message);
            }
        }
    }

    /// Display rows in order, ending with the streaming message if any.
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        let messages = self.conversation.messages();
        let mut rows: Vec<TranscriptEntry> = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Greeting(blocks) => Some(TranscriptEntry {
                    role: Role::Assistant,
                    kind: EntryKind::Greeting,
                    blocks: blocks.clone(),
                }),
                Entry::Message { index, blocks } => {
                    messages.get(*index).map(|message| TranscriptEntry {
                        role: message.role,
                        kind: EntryKind::Message,
                        blocks: blocks.clone(),
                    })
                }
                Entry::Notice(notice) => Some(TranscriptEntry {
                    role: Role::Assistant,
                    kind: EntryKind::Notice,
                    blocks: vec![FormattedBlock::paragraph(escape_markup(&notice.text))],
                }),
            })
            .collect();

        if let Some(streaming) = &self.streaming {
            rows.push(TranscriptEntry {
                role: Role::Assistant,
                kind: EntryKind::Streaming,
                blocks: streaming.blocks.clone(),
            });
        }
        rows
    }

    fn seal(&mut self, text: String, blocks: Vec<FormattedBlock>) {
        self.streaming = None;
        let sealed = match self.conversation.seal_turn() {
            Ok(sealed) => sealed.map(|message| message.content == text),
            Err(e) => {
                tracing::warn!(error = %e, "no turn to seal");
                return;
            }
        };

        match sealed {
            Some(true) => self.push_message_entry(blocks),
            Some(false) => {
                let content = self
                    .conversation
                    .messages()
                    .last()
                    .map(|message| message.content.clone())
                    .unwrap_or_default();
                self.push_message_entry(format_message(&content));
            }
            None => tracing::debug!("empty turn dropped"),
        }
    }

    fn push_message_entry(&mut self, blocks: Vec<FormattedBlock>) {
        let index = self.conversation.len().saturating_sub(1);
        self.entries.push(Entry::Message { index, blocks });
    }

    fn push_notice(&mut self, text: String) {
        self.entries.push(Entry::Notice(Notice {
            text,
            created_at: Utc::now(),
        }));
    }
}
