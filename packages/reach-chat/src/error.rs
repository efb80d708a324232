//! Error types for the chat client.

use std::time::Duration;

use thiserror::Error;

/// Shown when the endpoint cannot be reached or the stream breaks.
pub const CONNECTIVITY_MESSAGE: &str =
    "Sorry, I'm having trouble connecting. Please try again later.";

/// Shown for a non-2xx response whose body names no reason.
pub const GENERIC_FAILURE: &str = "Network response was not ok";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request failed with status {status}")]
    Status { status: u16, message: Option<String> },

    #[error("No data received for {0:?}")]
    IdleTimeout(Duration),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl ChatError {
    /// Text displayed in the transcript in place of a reply.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Status {
                message: Some(message),
                ..
            } => message.clone(),
            ChatError::Status { message: None, .. } => GENERIC_FAILURE.to_string(),
            ChatError::Config(message) => message.clone(),
            _ => CONNECTIVITY_MESSAGE.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        let err = ChatError::Status {
            status: 500,
            message: Some("rate limited".to_string()),
        };
        assert_eq!(err.user_message(), "rate limited");

        let err = ChatError::Status {
            status: 502,
            message: None,
        };
        assert_eq!(err.user_message(), GENERIC_FAILURE);

        let err = ChatError::IdleTimeout(Duration::from_secs(30));
        assert_eq!(err.user_message(), CONNECTIVITY_MESSAGE);
    }
}
