//! Error type for the command-line tool.

use crate::config::ConfigError;

/// Errors surfaced by CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from the client library.
    #[error(transparent)]
    Aura(#[from] aura::Error),

    /// Configuration file problem.
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Output could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bad command-line input.
    #[error("invalid input: {0}")]
    Input(String),
}

impl CliError {
    /// Create an input error.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Aura(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Result type for CLI commands.
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_delegates_to_library() {
        let err = CliError::from(aura::Error::rate_limited("business-assistant"));
        assert_eq!(err.user_message(), aura::Error::rate_limited("x").user_message());

        let err = CliError::input("no data");
        assert_eq!(err.user_message(), "invalid input: no data");
    }
}
