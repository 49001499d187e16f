//! Application configuration
//!
//! Loaded from `config/<env>.yaml`. Every section except the logging fields
//! has defaults, so a minimal file only needs to say where logs go.
//! `BANK_API_URL` overrides `api.base_url`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding [`ApiConfig::base_url`]
pub const ENV_API_URL: &str = "BANK_API_URL";

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CREDENTIALS_PATH: &str = ".bank-dashboard/credentials.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "CONFIG_IO",
            ConfigError::Parse(_) => "CONFIG_PARSE",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    /// never | hourly | daily
    pub rotation: String,
    /// Per-request HTTP debug logs
    #[serde(default)]
    pub enable_tracing: bool,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Server root; `/api/v1` is appended when missing
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CredentialsConfig {
    pub path: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_CREDENTIALS_PATH.to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "bank-dashboard.log".to_string(),
            use_json: false,
            rotation: "never".to_string(),
            enable_tracing: false,
            api: ApiConfig::default(),
            credentials: CredentialsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load `config/<env>.yaml` and apply environment overrides
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let config_path = format!("config/{}.yaml", env);
        let mut config = Self::load_from(Path::new(&config_path))?;
        config.apply_api_url(std::env::var(ENV_API_URL).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Replace the base URL when `url` is set and non-blank
    pub fn apply_api_url(&mut self, url: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.api.base_url = url;
        }
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
log_level: debug
log_dir: ./logs
log_file: test.log
use_json: true
rotation: daily
"#;

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let config = AppConfig::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.log_level, "debug");
        assert!(config.use_json);
        assert!(!config.enable_tracing);
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
        assert_eq!(config.api_timeout(), Duration::from_secs(30));
        assert_eq!(config.credentials.path, DEFAULT_CREDENTIALS_PATH);
    }

    #[test]
    fn test_full_yaml() {
        let yaml = format!(
            "{}enable_tracing: true\napi:\n  base_url: https://bank.example.com\n  timeout_secs: 5\ncredentials:\n  path: /tmp/token.json\n",
            MINIMAL
        );
        let config = AppConfig::from_yaml(&yaml).unwrap();
        assert!(config.enable_tracing);
        assert_eq!(config.api.base_url, "https://bank.example.com");
        assert_eq!(config.api_timeout(), Duration::from_secs(5));
        assert_eq!(config.credentials.path, "/tmp/token.json");
    }

    #[test]
    fn test_api_url_override() {
        let mut config = AppConfig::default();
        config.apply_api_url(None);
        assert_eq!(config.api.base_url, DEFAULT_API_URL);

        config.apply_api_url(Some("  ".to_string()));
        assert_eq!(config.api.base_url, DEFAULT_API_URL);

        config.apply_api_url(Some("http://10.0.0.1:9000".to_string()));
        assert_eq!(config.api.base_url, "http://10.0.0.1:9000");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.log_file, "test.log");
    }

    #[test]
    fn test_errors() {
        let err = AppConfig::load_from(Path::new("/nonexistent/dev.yaml")).unwrap_err();
        assert_eq!(err.code(), "CONFIG_IO");

        let err = AppConfig::from_yaml("log_level: [").unwrap_err();
        assert_eq!(err.code(), "CONFIG_PARSE");
    }
}
