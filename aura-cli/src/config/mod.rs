//! Configuration file handling for the `aura` tool.
//!
//! Settings are resolved in order:
//! 1. Default values
//! 2. Config file (`~/.aura/config.toml`, or `--config` / `AURA_CONFIG`)
//! 3. `AURA_*` environment variables

mod schema;

pub use schema::{ApiSettings, CliConfig, ConfigIssue, IssueLevel, MarketSettings, StreamSettings};

use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// TOML serialization error.
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    /// An explicitly requested file does not exist.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Get the default config directory path.
#[must_use]
pub fn default_config_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".aura")
}

/// Get the default config file path.
#[must_use]
pub fn config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Load configuration.
///
/// An explicit `path` must exist; the default file may be absent, in which
/// case defaults are used.
pub async fn load_config(path: Option<&Path>) -> ConfigResult<CliConfig> {
    match path {
        Some(path) if !path.exists() => Err(ConfigError::NotFound(path.to_path_buf())),
        Some(path) => load_config_from(path).await,
        None => {
            let path = config_path();
            if path.exists() {
                load_config_from(&path).await
            } else {
                info!(path = %path.display(), "config file not found, using defaults");
                Ok(CliConfig::default())
            }
        }
    }
}

/// Load configuration from a specific path.
pub async fn load_config_from(path: &Path) -> ConfigResult<CliConfig> {
    let content = tokio::fs::read_to_string(path).await?;
    let config: CliConfig = toml::from_str(&content)?;
    debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Save configuration to a specific path, creating parent directories.
pub async fn save_config_to(config: &CliConfig, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let content = toml::to_string_pretty(config)?;
    tokio::fs::write(path, content).await?;
    info!(path = %path.display(), "saved config file");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("aura-cli-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_default_paths() {
        assert!(default_config_dir().ends_with(".aura"));
        assert!(config_path().ends_with("config.toml"));
    }

    #[tokio::test]
    async fn test_explicit_missing_file_is_error() {
        let err = load_config(Some(scratch("missing.toml").as_path()))
            .await
            .expect_err("missing");
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let path = scratch("nested/config.toml");
        let mut config = CliConfig::default();
        config.api.functions_url = "https://example.test/functions/v1".into();
        config.stream.idle_timeout_secs = Some(20);

        save_config_to(&config, &path).await.expect("save");
        let loaded = load_config(Some(path.as_path())).await.expect("load");
        assert_eq!(loaded, config);

        let _ = tokio::fs::remove_dir_all(path.parent().and_then(Path::parent).expect("dir")).await;
    }
}
