//! Configuration management for NeuroWrite
//!
//! Parses TOML configuration files and provides typed access to settings.
//! The API credential is never stored in the file; `[model].api_key_env`
//! names the environment variable it is read from at startup.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::str::FromStr;

/// Upper bound for any request timeout, in seconds
const MAX_TIMEOUT_SECONDS: u64 = 300;

/// Upper bound for the streaming hand-off buffer
const MAX_STREAM_BUFFER: usize = 1024;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl ServerConfig {
    /// Address to bind; `host` must be a literal IP address
    pub fn socket_addr(&self) -> AppResult<SocketAddr> {
        let ip: IpAddr = self.host.trim().parse().map_err(|_| {
            AppError::Config(format!(
                "server.host '{}' must be an IP address such as 127.0.0.1 or 0.0.0.0",
                self.host
            ))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

fn default_request_timeout() -> u64 {
    60
}

/// Generation service configuration
///
/// Fields are private; configuration is loaded via deserialization and
/// checked by `Config::validate()`, after which it is never mutated.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    name: String,
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default = "default_api_key_env")]
    api_key_env: String,
    /// Capacity of the bounded fragment channel used for streaming
    #[serde(default = "default_stream_buffer")]
    stream_buffer: usize,
}

impl ModelConfig {
    /// Model identifier, e.g. `gemini-2.0-flash-exp`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// API base URL, without a trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Name of the environment variable holding the credential
    pub fn api_key_env(&self) -> &str {
        &self.api_key_env
    }

    pub fn stream_buffer(&self) -> usize {
        self.stream_buffer
    }

    /// Read the credential from the configured environment variable
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` if the variable is unset or blank.
    pub fn resolve_api_key(&self) -> AppResult<ApiKey> {
        match std::env::var(&self.api_key_env) {
            Ok(value) if !value.trim().is_empty() => Ok(ApiKey(value.trim().to_string())),
            _ => Err(AppError::MissingCredential {
                env_var: self.api_key_env.clone(),
            }),
        }
    }
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_stream_buffer() -> usize {
    16
}

/// Generation service credential
///
/// `Debug` and `Display` are redacted so the key cannot leak through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw credential, for the request header only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        let config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Validate configuration after parsing
    ///
    /// Called by `from_file()` and `from_str()`; tests that build a `Config`
    /// via `toml::from_str` directly can call it explicitly.
    pub fn validate(&self) -> AppResult<()> {
        self.server.socket_addr()?;

        if self.server.request_timeout_seconds == 0 {
            return Err(AppError::Config(
                "server.request_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if self.server.request_timeout_seconds > MAX_TIMEOUT_SECONDS {
            return Err(AppError::Config(format!(
                "server.request_timeout_seconds cannot exceed {} seconds, got {}",
                MAX_TIMEOUT_SECONDS, self.server.request_timeout_seconds
            )));
        }

        if self.model.name.trim().is_empty() {
            return Err(AppError::Config("model.name cannot be empty".to_string()));
        }

        if !self.model.base_url.starts_with("http://")
            && !self.model.base_url.starts_with("https://")
        {
            return Err(AppError::Config(format!(
                "model.base_url '{}' must start with 'http://' or 'https://'",
                self.model.base_url
            )));
        }

        if self.model.api_key_env.trim().is_empty() {
            return Err(AppError::Config(
                "model.api_key_env cannot be empty".to_string(),
            ));
        }

        if self.model.stream_buffer == 0 || self.model.stream_buffer > MAX_STREAM_BUFFER {
            return Err(AppError::Config(format!(
                "model.stream_buffer must be in 1..={}, got {}",
                MAX_STREAM_BUFFER, self.model.stream_buffer
            )));
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}
