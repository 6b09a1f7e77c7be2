//! Configuration loading
//!
//! The API token always comes from the environment. Base URL and timeout
//! may come from a TOML file named by `SEVDESK_MCP_CONFIG`; `SEVDESK_API_URL`
//! overrides the base URL.

use crate::auth::ApiToken;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the API token
pub const TOKEN_ENV: &str = "SEVDESK_API_TOKEN";
/// Environment variable naming an optional TOML config file
pub const CONFIG_PATH_ENV: &str = "SEVDESK_MCP_CONFIG";
/// Environment variable overriding the API base URL
pub const BASE_URL_ENV: &str = "SEVDESK_API_URL";

pub const DEFAULT_BASE_URL: &str = "https://my.sevdesk.de/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing credential: set the {0} environment variable")]
    MissingCredential(&'static str),

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Config file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sevdesk: SevDeskSection,
}

/// `[sevdesk]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SevDeskSection {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Fully resolved settings used by the running server
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub api_token: ApiToken,
    pub base_url: String,
    pub timeout: Duration,
}

impl Config {
    /// Load from the file named by `SEVDESK_MCP_CONFIG`, or defaults if unset
    pub fn load_default() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Parse TOML config content
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve against the process environment
    pub fn to_runtime(&self) -> Result<RuntimeConfig, ConfigError> {
        self.to_runtime_with(|key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary environment lookup
    pub fn to_runtime_with<F>(&self, env: F) -> Result<RuntimeConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = env(TOKEN_ENV)
            .map(ApiToken::new)
            .filter(|token| !token.is_blank())
            .ok_or(ConfigError::MissingCredential(TOKEN_ENV))?;

        let base_url = env(BASE_URL_ENV)
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.sevdesk.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = self.sevdesk.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let timeout = Duration::from_secs(timeout_secs);

        Ok(RuntimeConfig {
            api_token,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_token_is_error() {
        let err = Config::default().to_runtime_with(env_of(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(TOKEN_ENV)));
        assert!(err.to_string().contains("SEVDESK_API_TOKEN"));
    }

    #[test]
    fn test_blank_token_is_error() {
        let err = Config::default()
            .to_runtime_with(env_of(&[(TOKEN_ENV, "   ")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(_)));
    }

    #[test]
    fn test_defaults() {
        let runtime = Config::default()
            .to_runtime_with(env_of(&[(TOKEN_ENV, "abc")]))
            .unwrap();
        assert_eq!(runtime.api_token, ApiToken::new("abc"));
        assert_eq!(runtime.base_url, DEFAULT_BASE_URL);
        assert_eq!(runtime.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_file_values_and_env_override() {
        let config = Config::from_toml_str(
            r#"
            [sevdesk]
            base_url = "https://example.test/api/v1/"
            timeout_secs = 5
            "#,
        )
        .unwrap();

        let runtime = config
            .to_runtime_with(env_of(&[(TOKEN_ENV, "abc")]))
            .unwrap();
        assert_eq!(runtime.base_url, "https://example.test/api/v1");
        assert_eq!(runtime.timeout, Duration::from_secs(5));

        let runtime = config
            .to_runtime_with(env_of(&[(TOKEN_ENV, "abc"), (BASE_URL_ENV, "http://localhost:9999")]))
            .unwrap();
        assert_eq!(runtime.base_url, "http://localhost:9999");
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = Config::from_toml_str("").unwrap();
        assert!(config.sevdesk.base_url.is_none());
        assert!(config.sevdesk.timeout_secs.is_none());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let err = Config::from_toml_str("[sevdesk\nbase_url = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_unreadable_file_is_io_error() {
        let err = Config::load(Path::new("/nonexistent/sevdesk-mcp.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
