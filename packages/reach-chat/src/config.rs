//! Widget configuration.
//!
//! Loaded from a TOML file, then overridden by environment variables and
//! command-line flags. A missing file means all defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};

/// Path of the config file, overriding the platform config dir.
pub const CONFIG_ENV: &str = "REACH_CHAT_CONFIG";
/// Chat endpoint URL, overriding the config file.
pub const ENDPOINT_ENV: &str = "REACH_CHAT_ENDPOINT";

const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/chat";
const DEFAULT_GREETING: &str = "Hi! I'm {name}, your AI assistant. How can I help you today?";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Chat endpoint receiving `POST {messages}`
    pub endpoint: String,
    /// Assistant display name
    pub name: String,
    /// Teaser shown before the widget is first opened
    pub welcome: String,
    /// First-open greeting; `{name}` is replaced with the assistant name
    pub greeting: String,
    /// Seconds without response bytes before a turn is aborted (0 disables)
    pub idle_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            name: "Reach".to_string(),
            welcome: "Have any questions?".to_string(),
            greeting: DEFAULT_GREETING.to_string(),
            idle_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl ChatConfig {
    /// Load from `$REACH_CHAT_CONFIG` or the default location, then apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match default_path() {
            Some(path) => Self::load_from_path(&path)?,
            None => Self::default(),
        };
        config.apply_endpoint_override(std::env::var(ENDPOINT_ENV).ok());
        Ok(config)
    }

    /// Load a config file; a missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ChatError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| ChatError::Config(format!("Invalid config {}: {}", path.display(), e)))?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Use `endpoint` when it is set and non-empty.
    pub fn apply_endpoint_override(&mut self, endpoint: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            self.endpoint = endpoint.trim().to_string();
        }
    }

    /// The greeting with the assistant name filled in.
    pub fn greeting_text(&self) -> String {
        self.greeting.replace("{name}", &self.name)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// `$REACH_CHAT_CONFIG` if set, else `<config dir>/reach-chat/config.toml`.
pub fn default_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    ProjectDirs::from("", "", "reach-chat").map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ChatConfig::load_from_path(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, ChatConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "endpoint = \"https://chat.example.com/api\"\nname = \"Ava\"\nidle_timeout_secs = 0"
        )
        .unwrap();

        let config = ChatConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.endpoint, "https://chat.example.com/api");
        assert_eq!(config.name, "Ava");
        assert_eq!(config.welcome, "Have any questions?");
        assert_eq!(config.idle_timeout(), None);
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "name = [unclosed").unwrap();
        assert!(matches!(
            ChatConfig::load_from_path(file.path()),
            Err(ChatError::Config(_))
        ));
    }

    #[test]
    fn test_default_greeting() {
        assert_eq!(
            ChatConfig::default().greeting_text(),
            "Hi! I'm Reach, your AI assistant. How can I help you today?"
        );
    }

    #[test]
    fn test_greeting_uses_name() {
        let config = ChatConfig {
            name: "Ava".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.greeting_text(),
            "Hi! I'm Ava, your AI assistant. How can I help you today?"
        );
    }

    #[test]
    fn test_endpoint_override_ignores_empty() {
        let mut config = ChatConfig::default();
        config.apply_endpoint_override(Some("   ".to_string()));
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);

        config.apply_endpoint_override(Some("http://127.0.0.1:8080/chat".to_string()));
        assert_eq!(config.endpoint, "http://127.0.0.1:8080/chat");

        config.apply_endpoint_override(None);
        assert_eq!(config.endpoint, "http://127.0.0.1:8080/chat");
    }
}
