//! Reach Core - streaming ingestion and message formatting for the Reach chat widget.
//!
//! This crate provides the parts of the widget that do real work:
//!
//! - **Stream ingestion**: line framing across chunk boundaries, wire frame
//!   classification, and text delta accumulation ([`reader::TurnReader`])
//! - **Message formatting**: a pure, ordered pipeline that turns raw model
//!   output into paragraphs and list items ([`format::format_message`])
//! - **Conversation model**: append-only history with a single in-flight turn
//! - **Rendering**: HTML and plain-text renderers over formatted blocks
//!
//! # Example
//!
//! ```rust
//! use reach_core::{format_message, BlockKind, TurnReader};
//!
//! let mut reader = TurnReader::new();
//! reader.push_chunk(b"0:{\"type\":\"text-delta\",\"textDelta\":\"Intro text. \"}\n");
//! reader.push_chunk(b"0:{\"type\":\"text-delta\",\"textDelta\":\"1. First item2. Second item\"}\n");
//! reader.finish();
//!
//! let blocks = format_message(reader.text());
//! assert_eq!(blocks[0].kind, BlockKind::Paragraph);
//! assert_eq!(blocks[1].text, "1. First item");
//! ```

pub mod decoder;
pub mod format;
pub mod frame;
pub mod reader;
pub mod render;
pub mod types;

// Re-export commonly used types
pub use types::{ApiResponse, BlockKind, Conversation, FormattedBlock, Message, Role, WireMessage};

// Re-export main functionality
pub use decoder::LineDecoder;
pub use format::format_message;
pub use frame::{classify_line, DeltaPayload, StreamFrame};
pub use reader::{ChunkOutcome, TurnReader};
pub use render::{BlockRenderer, HtmlRenderer, PlainRenderer};

/// Error types for reach-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("An assistant turn is already in flight")]
    TurnInFlight,

    #[error("No assistant turn is in flight")]
    NoTurnInFlight,

    #[error("Streaming update does not extend the current content ({current} -> {proposed} bytes)")]
    NonMonotonicUpdate { current: usize, proposed: usize },

    #[error("Message content is empty")]
    EmptyMessage,
}

/// Result type for reach-core operations.
pub type Result<T> = std::result::Result<T, Error>;
