//! HTTP client for the chat endpoint.
//!
//! One POST per turn; the reply either streams back as text frames or arrives
//! as a single JSON body.

pub mod client;
pub mod types;

pub use client::*;
pub use types::*;
