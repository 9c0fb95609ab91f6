//! Error types for NeuroWrite
//!
//! Request-path errors are caught by the feature router and rendered as
//! failure envelopes; `ErrorKind` carries the HTTP status decision.

use axum::http::StatusCode;
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Missing API credential: environment variable {env_var} is not set")]
    MissingCredential { env_var: String },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Unknown feature '{0}'")]
    UnknownFeature(String),

    #[error("Generation service unavailable: {reason}")]
    UpstreamUnavailable { reason: String },

    #[error("Generation service did not respond within {timeout_seconds} seconds")]
    UpstreamTimeout { timeout_seconds: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure class of an [`AppError`], used to pick the transport status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    UnknownFeature,
    UpstreamUnavailable,
    UpstreamTimeout,
    Internal,
}

impl ErrorKind {
    /// HTTP status for this failure class
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::UnknownFeature => StatusCode::NOT_FOUND,
            Self::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Label used in log lines
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::UnknownFeature => "unknown_feature",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::UpstreamTimeout => "upstream_timeout",
            Self::Internal => "internal",
        }
    }
}

impl AppError {
    /// Classify this error for the transport layer
    ///
    /// Startup-only errors (config, credential) never reach a request, so they
    /// fall into `Internal` if they ever do.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::UnknownFeature(_) => ErrorKind::UnknownFeature,
            Self::UpstreamUnavailable { .. } => ErrorKind::UpstreamUnavailable,
            Self::UpstreamTimeout { .. } => ErrorKind::UpstreamTimeout,
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::MissingCredential { .. }
            | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Shorthand for an upstream failure with a reason
    pub fn upstream(reason: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
