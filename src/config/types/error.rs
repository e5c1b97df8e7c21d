//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation error:\n{0}")]
    Validation(String),
}

impl ConfigError {
    /// Build a validation error from collected messages.
    pub fn from_messages(messages: &[String]) -> Self {
        let lines: Vec<_> = messages.iter().map(|m| format!("- {m}")).collect();
        Self::Validation(lines.join("\n"))
    }
}
