//! Configuration schema definitions.

use aura::AuraConfig;
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// Hosted functions endpoint.
    #[serde(default)]
    pub api: ApiSettings,

    /// Request and stream timeouts.
    #[serde(default)]
    pub stream: StreamSettings,

    /// Market watch settings.
    #[serde(default)]
    pub market: MarketSettings,
}

/// Hosted functions endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSettings {
    /// Base URL of the functions.
    #[serde(default = "default_functions_url")]
    pub functions_url: String,
    /// API key; `AURA_API_KEY` takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Name of the streaming chat function.
    #[serde(default = "default_chat_function")]
    pub chat_function: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            functions_url: default_functions_url(),
            api_key: None,
            chat_function: default_chat_function(),
        }
    }
}

fn default_functions_url() -> String {
    AuraConfig::DEFAULT_FUNCTIONS_URL.to_owned()
}

fn default_chat_function() -> String {
    AuraConfig::DEFAULT_CHAT_FUNCTION.to_owned()
}

/// Request and stream timeouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSettings {
    /// Timeout for non-streaming calls, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Longest silence tolerated inside a chat stream, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout_secs: Option<u64>,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            idle_timeout_secs: None,
        }
    }
}

const fn default_timeout() -> u64 {
    AuraConfig::DEFAULT_TIMEOUT_SECS
}

/// Market watch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSettings {
    /// Refresh interval for `aura market --watch` without a value.
    #[serde(default = "default_refresh")]
    pub refresh_secs: u64,
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            refresh_secs: default_refresh(),
        }
    }
}

const fn default_refresh() -> u64 {
    aura::market::DEFAULT_REFRESH.as_secs()
}

impl CliConfig {
    /// Validate the configuration and return any issues found.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        let url = self.api.functions_url.trim();
        if url.is_empty() {
            issues.push(ConfigIssue::error("api.functionsUrl", "Functions URL is empty"));
        } else if !url.starts_with("http://") && !url.starts_with("https://") {
            issues.push(ConfigIssue::error(
                "api.functionsUrl",
                "Functions URL must start with http:// or https://",
            ));
        }

        if self.api.api_key.is_none() && std::env::var("AURA_API_KEY").is_err() {
            issues.push(ConfigIssue::warning(
                "api.apiKey",
                "No API key configured. Set AURA_API_KEY env var.",
            ));
        }

        if self.api.chat_function.trim().is_empty() {
            issues.push(ConfigIssue::error("api.chatFunction", "Chat function name is empty"));
        }

        if self.stream.timeout_secs == 0 {
            issues.push(ConfigIssue::warning(
                "stream.timeoutSecs",
                "Timeout is 0, requests will time out immediately",
            ));
        }

        if self.stream.idle_timeout_secs == Some(0) {
            issues.push(ConfigIssue::error(
                "stream.idleTimeoutSecs",
                "Idle timeout must be at least 1 second",
            ));
        }

        issues
    }

    /// Check if the configuration is valid (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate()
            .iter()
            .all(|issue| issue.level != IssueLevel::Error)
    }

    /// Build the client configuration, letting `AURA_*` variables override
    /// file values.
    ///
    /// # Errors
    ///
    /// Returns [`aura::Error::Config`] when an environment variable is malformed.
    pub fn to_aura_config(&self) -> aura::Result<AuraConfig> {
        let mut config = AuraConfig::new(self.api.api_key.clone().unwrap_or_default())
            .with_functions_url(self.api.functions_url.trim())
            .with_chat_function(self.api.chat_function.trim())
            .with_timeout(self.stream.timeout_secs);
        config.idle_timeout_secs = self.stream.idle_timeout_secs;
        config.apply_env()?;
        Ok(config)
    }

    /// Copy with the API key hidden, for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.api.api_key.is_some() {
            config.api.api_key = Some("********".to_owned());
        }
        config
    }
}

/// Issue severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueLevel {
    /// Configuration cannot be used.
    Error,
    /// Configuration works but is probably not what was intended.
    Warning,
}

/// A configuration problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Issue severity level.
    pub level: IssueLevel,
    /// Configuration path (e.g., "api.functionsUrl").
    pub path: String,
    /// Human-readable message.
    pub message: String,
}

impl ConfigIssue {
    /// Create an error-level issue.
    #[must_use]
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a warning-level issue.
    #[must_use]
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.level {
            IssueLevel::Error => "ERROR",
            IssueLevel::Warning => "WARN",
        };
        write!(f, "[{}] {}: {}", prefix, self.path, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: CliConfig = toml::from_str(
            r#"
            [api]
            functionsUrl = "https://abc.example.test/functions/v1/"
            apiKey = "k"

            [stream]
            idleTimeoutSecs = 30
            "#,
        )
        .expect("parse");

        assert_eq!(config.api.chat_function, "business-assistant");
        assert_eq!(config.stream.timeout_secs, 120);
        assert_eq!(config.stream.idle_timeout_secs, Some(30));
        assert_eq!(config.market.refresh_secs, 60);
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<CliConfig, _> = toml::from_str("[telegram]\nenabled = true\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_reports_errors() {
        let mut config = CliConfig::default();
        config.api.api_key = Some("k".into());
        assert!(config.is_valid());

        config.api.functions_url = "ftp://nope".into();
        config.stream.idle_timeout_secs = Some(0);
        let issues = config.validate();
        assert_eq!(
            issues
                .iter()
                .filter(|issue| issue.level == IssueLevel::Error)
                .count(),
            2
        );
        assert!(!config.is_valid());
        assert!(issues[0].to_string().starts_with("[ERROR] api.functionsUrl"));
    }

    #[test]
    fn test_redacted_hides_key() {
        let mut config = CliConfig::default();
        config.api.api_key = Some("secret".into());
        let shown = toml::to_string(&config.redacted()).expect("toml");
        assert!(!shown.contains("secret"));
    }
}
