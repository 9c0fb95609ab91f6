//! Completion client abstraction
//!
//! The feature router talks to the generation service only through the
//! [`CompletionClient`] trait. [`GeminiClient`] is the production adapter;
//! tests substitute scripted clients.

pub mod gemini;
pub mod sse;
pub mod stream;

pub use gemini::GeminiClient;
pub use stream::{FragmentStream, StreamState};

use crate::error::{AppError, AppResult};
use async_trait::async_trait;

/// Sampling parameters sent with every generation call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParameters {
    /// Sampling temperature in `[0, 1]`
    pub temperature: f64,
    /// Maximum output length; `None` leaves the service default
    pub max_output_tokens: Option<u32>,
    /// Whether the caller wants incremental fragments
    pub stream: bool,
}

impl GenerationParameters {
    pub const fn new(temperature: f64) -> Self {
        Self {
            temperature,
            max_output_tokens: None,
            stream: false,
        }
    }

    pub const fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub const fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }

    /// Apply request-supplied overrides field-by-field
    ///
    /// A supplied field wins; an absent one keeps this value.
    pub fn merge(self, overrides: &GenerationOverrides) -> Self {
        Self {
            temperature: overrides.temperature.unwrap_or(self.temperature),
            max_output_tokens: overrides.max_output_tokens.or(self.max_output_tokens),
            stream: overrides.stream.unwrap_or(self.stream),
        }
    }

    /// Check the documented ranges
    pub fn validate(&self) -> AppResult<()> {
        if !self.temperature.is_finite() || !(0.0..=1.0).contains(&self.temperature) {
            return Err(AppError::Validation(format!(
                "temperature must be between 0.0 and 1.0, got {}",
                self.temperature
            )));
        }
        if self.max_output_tokens == Some(0) {
            return Err(AppError::Validation(
                "max_tokens must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Optional per-request parameter overrides
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationOverrides {
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
    pub stream: Option<bool>,
}

/// Opaque binary payload (image) sent alongside the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    mime_type: String,
    data: Vec<u8>,
}

impl Attachment {
    pub fn new(mime_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// One call to the generation service
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub params: GenerationParameters,
    pub attachment: Option<Attachment>,
}

/// Text-completion service
///
/// Neither method retries; each call is at-most-once.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Return the full generated text
    ///
    /// # Errors
    ///
    /// `UpstreamUnavailable` if the service cannot be reached or faults,
    /// `UpstreamTimeout` if it does not answer in time.
    async fn complete(&self, request: &CompletionRequest) -> AppResult<String>;

    /// Start a streaming completion
    ///
    /// Fails only if the service faults before producing any data; later
    /// failures surface in-band as the stream's final fragment.
    async fn stream(&self, request: &CompletionRequest) -> AppResult<FragmentStream>;
}
