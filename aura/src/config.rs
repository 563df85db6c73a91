//! Client configuration.

use crate::error::{Error, Result};

/// Configuration for the [`Aura`](crate::Aura) client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuraConfig {
    /// Base URL of the hosted functions (e.g. `https://<project>.supabase.co/functions/v1`).
    pub functions_url: String,
    /// API key sent as both bearer token and `apikey` header.
    pub api_key: String,
    /// Whole-request timeout in seconds for non-streaming calls.
    pub timeout_secs: Option<u64>,
    /// Maximum silence between stream chunks before the stream is abandoned.
    pub idle_timeout_secs: Option<u64>,
    /// Name of the streaming chat function.
    pub chat_function: String,
}

impl AuraConfig {
    /// Default functions base URL (local development server).
    pub const DEFAULT_FUNCTIONS_URL: &'static str = "http://localhost:54321/functions/v1";
    /// Default streaming chat function.
    pub const DEFAULT_CHAT_FUNCTION: &'static str = "business-assistant";
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Creates a new configuration with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Reads from:
    /// - `AURA_API_KEY` - Required API key
    /// - `AURA_FUNCTIONS_URL` - Optional functions base URL
    /// - `AURA_TIMEOUT_SECS` - Optional request timeout
    /// - `AURA_IDLE_TIMEOUT_SECS` - Optional stream idle timeout
    /// - `AURA_CHAT_FUNCTION` - Optional chat function name
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the key is missing or a number fails to parse.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("AURA_API_KEY")
            .map_err(|_| Error::config("AURA_API_KEY environment variable not set"))?;

        let mut config = Self::new(api_key);
        config.apply_env()?;
        Ok(config)
    }

    /// Overrides fields with any `AURA_*` environment variables that are set,
    /// including `AURA_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a numeric variable fails to parse.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(key) = std::env::var("AURA_API_KEY") {
            self.api_key = key;
        }
        if let Ok(url) = std::env::var("AURA_FUNCTIONS_URL") {
            self.functions_url = url.trim_end_matches('/').to_owned();
        }
        if let Ok(name) = std::env::var("AURA_CHAT_FUNCTION") {
            self.chat_function = name;
        }
        if let Some(secs) = env_secs("AURA_TIMEOUT_SECS")? {
            self.timeout_secs = Some(secs);
        }
        if let Some(secs) = env_secs("AURA_IDLE_TIMEOUT_SECS")? {
            self.idle_timeout_secs = Some(secs);
        }
        Ok(())
    }

    /// Sets the functions base URL. A trailing slash is dropped.
    #[must_use]
    pub fn with_functions_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.functions_url = url.trim_end_matches('/').to_owned();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Sets the stream idle timeout.
    #[must_use]
    pub const fn with_idle_timeout(mut self, secs: u64) -> Self {
        self.idle_timeout_secs = Some(secs);
        self
    }

    /// Sets the chat function name.
    #[must_use]
    pub fn with_chat_function(mut self, name: impl Into<String>) -> Self {
        self.chat_function = name.into();
        self
    }
}

impl Default for AuraConfig {
    fn default() -> Self {
        Self {
            functions_url: Self::DEFAULT_FUNCTIONS_URL.to_owned(),
            api_key: String::new(),
            timeout_secs: Some(Self::DEFAULT_TIMEOUT_SECS),
            idle_timeout_secs: None,
            chat_function: Self::DEFAULT_CHAT_FUNCTION.to_owned(),
        }
    }
}

fn env_secs(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::config(format!("{name}: {e}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new() {
        let config = AuraConfig::new("test-key");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.functions_url, AuraConfig::DEFAULT_FUNCTIONS_URL);
        assert_eq!(config.chat_function, "business-assistant");
        assert_eq!(config.idle_timeout_secs, None);
    }

    #[test]
    fn test_config_builder() {
        let config = AuraConfig::new("key")
            .with_functions_url("https://example.test/functions/v1/")
            .with_timeout(30)
            .with_idle_timeout(15)
            .with_chat_function("chat");

        assert_eq!(config.functions_url, "https://example.test/functions/v1");
        assert_eq!(config.timeout_secs, Some(30));
        assert_eq!(config.idle_timeout_secs, Some(15));
        assert_eq!(config.chat_function, "chat");
    }
}
