//! Reach Chat - streaming chat client for the Reach widget
//!
//! - [`api`]: POSTs the conversation and turns the reply into [`api::TurnEvent`]s
//! - [`state`]: the widget itself (open/close, send guard, transcript)
//! - [`config`]: TOML config with environment overrides
//!
//! Formatting and stream decoding live in `reach_core`.

pub mod api;
pub mod config;
pub mod error;
pub mod state;

pub use api::{ChatClient, TurnEnd, TurnEvent};
pub use config::ChatConfig;
pub use error::{ChatError, Result};
pub use state::{ChatWidget, EntryKind, TranscriptEntry};
