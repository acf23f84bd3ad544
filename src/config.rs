/// Configuration loading and management for the application.
///
/// This module handles loading, parsing, and validating configuration
/// settings from a YAML configuration file or environment variables. It
/// provides strongly typed access to server properties and the
/// OpenAI-compatible backend connection.
///
/// # Configuration Flow
///
/// 1. Load configuration from YAML file or environment variables
/// 2. Parse into structured types
/// 3. Validate all required settings
/// 4. Make configuration available to application components
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, Error)]
#[allow(clippy::enum_variant_names)]
pub enum ConfigError {
    /// File I/O errors when reading the configuration file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing errors in the configuration file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yml::Error),

    /// Configuration validation errors
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration settings
    pub server: ServerConfig,

    /// OpenAI-compatible backend settings
    pub backend: BackendConfig,
}

/// Server configuration settings.
///
/// Controls how the proxy server listens for connections.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// IP address to bind the server to
    pub host: String,

    /// Port number to listen on
    pub port: u16,

    /// Logging level (e.g., "INFO", "DEBUG", "ERROR")
    pub debug_level: String,
}

/// Which flavor of OpenAI-compatible backend the proxy talks to.
///
/// The two flavors share the completion protocol; they differ in message
/// content encoding and in the LiteLLM-specific settings injected into
/// outbound requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The OpenAI API directly
    #[default]
    OpenAi,

    /// A LiteLLM-compatible gateway
    LiteLlm,
}

impl BackendKind {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "openai" => Some(Self::OpenAi),
            "litellm" => Some(Self::LiteLlm),
            _ => None,
        }
    }
}

/// OpenAI-compatible backend settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend (e.g., "https://api.openai.com/v1")
    pub base_url: String,

    /// API key for bearer authentication; empty means no Authorization header
    #[serde(default)]
    pub api_key: String,

    /// Backend flavor, controls request encoding
    #[serde(default)]
    pub kind: BackendKind,

    /// Upper bound in seconds on outbound call setup. An already-started
    /// stream is not subject to this limit.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

/// Loads configuration from environment variables.
///
/// Reads configuration values from environment variables, falling back to
/// default values where appropriate. The backend base URL has no default;
/// validation rejects the result if it is absent.
fn load_from_env() -> Config {
    info!("Loading configuration from environment variables");

    let server = ServerConfig {
        host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
        port: env::var("SERVER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(11434),
        debug_level: env::var("SERVER_DEBUG_LEVEL").unwrap_or_else(|_| "INFO".to_string()),
    };

    let backend = BackendConfig {
        base_url: env::var("BACKEND_BASE_URL").unwrap_or_default(),
        // OPENAI_API_KEY is accepted as a fallback for compatibility with
        // stock OpenAI tooling.
        api_key: env::var("BACKEND_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .unwrap_or_default(),
        kind: parse_backend_kind_env().unwrap_or_default(),
        timeout_secs: env::var("BACKEND_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_timeout_secs),
    };

    Config { server, backend }
}

fn parse_backend_kind_env() -> Option<BackendKind> {
    let value = env::var("BACKEND_KIND").ok()?;
    let kind = BackendKind::parse(&value);
    if kind.is_none() {
        warn!("Unknown BACKEND_KIND '{}', expected 'openai' or 'litellm'", value);
    }
    kind
}

/// Loads configuration from a YAML file or environment variables.
///
/// This function first attempts to load configuration from the specified
/// file path. If the file doesn't exist, it falls back to environment
/// variables. In either case environment variables override file values and
/// the result is validated before being returned.
///
/// # Arguments
///
/// * `path` - Path to the YAML configuration file (optional, will use env vars if file not found)
///
/// # Returns
///
/// * `Ok(Config)` - Validated configuration object
/// * `Err(ConfigError)` - If loading or validation fails
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    if Path::new(path).exists() {
        info!("Loading configuration from file: {}", path);

        let content = fs::read_to_string(path)?;
        debug!("Successfully read configuration file");

        let mut config: Config = serde_yml::from_str(&content)?;
        debug!("Successfully parsed YAML configuration");

        override_with_env(&mut config);

        config.validate()?;
        info!("Configuration validated successfully");

        Ok(config)
    } else {
        info!(
            "Configuration file not found: {}. Using environment variables.",
            path
        );
        let config = load_from_env();
        config.validate()?;
        info!("Configuration from environment variables validated successfully");
        Ok(config)
    }
}

/// Override configuration values with environment variables if present
fn override_with_env(config: &mut Config) {
    if let Ok(host) = env::var("SERVER_HOST") {
        config.server.host = host;
    }

    if let Ok(port) = env::var("SERVER_PORT") {
        if let Ok(port) = port.parse() {
            config.server.port = port;
        }
    }

    if let Ok(debug_level) = env::var("SERVER_DEBUG_LEVEL") {
        config.server.debug_level = debug_level;
    }

    if let Ok(base_url) = env::var("BACKEND_BASE_URL") {
        config.backend.base_url = base_url;
    }

    if let Ok(api_key) = env::var("BACKEND_API_KEY") {
        config.backend.api_key = api_key;
    }

    if let Some(kind) = parse_backend_kind_env() {
        config.backend.kind = kind;
    }

    if let Ok(timeout) = env::var("BACKEND_TIMEOUT_SECS") {
        if let Ok(timeout) = timeout.parse() {
            config.backend.timeout_secs = timeout;
        }
    }
}

impl Config {
    /// Validates all configuration settings.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If all validation checks pass
    /// * `Err(ConfigError)` - If any validation check fails
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.is_empty() {
            return Err(ConfigError::ValidationError(
                "Server host cannot be empty".into(),
            ));
        }

        // The backend base URL is the one setting with no usable default.
        if self.backend.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "Backend base URL is required".into(),
            ));
        }

        if !self.backend.base_url.starts_with("http") {
            return Err(ConfigError::ValidationError(
                "Backend base URL must start with http:// or https://".into(),
            ));
        }

        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "Backend timeout must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 11434,
                debug_level: "INFO".to_string(),
            },
            backend: BackendConfig {
                base_url: "http://localhost:4000".to_string(),
                api_key: String::new(),
                kind: BackendKind::LiteLlm,
                timeout_secs: 60,
            },
        }
    }

    #[test]
    fn accepts_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn rejects_missing_base_url() {
        let mut config = valid_config();
        config.backend.base_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_http_base_url() {
        let mut config = valid_config();
        config.backend.base_url = "localhost:4000".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut config = valid_config();
        config.backend.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_backend_kind_values() {
        assert_eq!(BackendKind::parse("openai"), Some(BackendKind::OpenAi));
        assert_eq!(BackendKind::parse("litellm"), Some(BackendKind::LiteLlm));
        assert_eq!(BackendKind::parse("ollama"), None);
    }

    #[test]
    fn yaml_defaults_apply() {
        let yaml = r#"
server:
  host: 127.0.0.1
  port: 11434
  debug_level: DEBUG
backend:
  base_url: https://api.openai.com/v1
"#;
        let config: Config = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.backend.kind, BackendKind::OpenAi);
        assert!(config.backend.api_key.is_empty());
        assert_eq!(config.backend.timeout_secs, 60);
        assert!(config.validate().is_ok());
    }
}
