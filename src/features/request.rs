//! Inbound feature request
//!
//! A request is free text plus a flat bag of scalar options. Feature-specific
//! JSON bodies (`{"text": ..., "tone": "formal", "intensity": 80}`) deserialize
//! into this one shape; the registry entry decides which options matter.

use crate::completion::Attachment;
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Maximum allowed text length in characters (100K chars)
pub const MAX_TEXT_LENGTH: usize = 100_000;

/// One scalar option value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl OptionValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "number",
            Self::Text(_) => "string",
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// Validated feature request
///
/// Text length is enforced during deserialization. Emptiness is checked by the
/// router, because image features carry an attachment instead of text.
#[derive(Debug, Clone, Default)]
pub struct FeatureRequest {
    text: String,
    options: BTreeMap<String, OptionValue>,
    temperature: Option<f64>,
    max_output_tokens: Option<u32>,
    attachment: Option<Attachment>,
}

impl FeatureRequest {
    /// Create a text request with no options
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Create an image request carrying an opaque attachment
    pub fn with_attachment(attachment: Attachment) -> Self {
        Self {
            attachment: Some(attachment),
            ..Self::default()
        }
    }

    /// Builder-style option setter
    pub fn option(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Builder-style temperature override
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Builder-style output length override
    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &BTreeMap<String, OptionValue> {
        &self.options
    }

    pub fn temperature_override(&self) -> Option<f64> {
        self.temperature
    }

    pub fn max_output_tokens_override(&self) -> Option<u32> {
        self.max_output_tokens
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub(crate) fn take_attachment(&mut self) -> Option<Attachment> {
        self.attachment.take()
    }

    /// String option, or a validation error if present with another type
    pub fn string(&self, key: &str) -> AppResult<Option<&str>> {
        match self.options.get(key) {
            None => Ok(None),
            Some(OptionValue::Text(value)) => Ok(Some(value.as_str())),
            Some(other) => Err(type_mismatch(key, "string", other)),
        }
    }

    /// Boolean option
    pub fn flag(&self, key: &str) -> AppResult<Option<bool>> {
        match self.options.get(key) {
            None => Ok(None),
            Some(OptionValue::Bool(value)) => Ok(Some(*value)),
            Some(other) => Err(type_mismatch(key, "boolean", other)),
        }
    }

    /// Integer option; whole-valued floats such as `50.0` are accepted
    pub fn integer(&self, key: &str) -> AppResult<Option<i64>> {
        match self.options.get(key) {
            None => Ok(None),
            Some(OptionValue::Integer(value)) => Ok(Some(*value)),
            Some(OptionValue::Float(value)) if value.fract() == 0.0 && value.is_finite() => {
                Ok(Some(*value as i64))
            }
            Some(other) => Err(type_mismatch(key, "integer", other)),
        }
    }

    /// Numeric option (integer or float)
    pub fn number(&self, key: &str) -> AppResult<Option<f64>> {
        match self.options.get(key) {
            None => Ok(None),
            Some(OptionValue::Integer(value)) => Ok(Some(*value as f64)),
            Some(OptionValue::Float(value)) => Ok(Some(*value)),
            Some(other) => Err(type_mismatch(key, "number", other)),
        }
    }

    /// Required, non-blank string option
    pub fn required_string(&self, key: &str) -> AppResult<&str> {
        match self.string(key)? {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(AppError::Validation(format!("{} is required", key))),
        }
    }
}

fn type_mismatch(key: &str, expected: &str, actual: &OptionValue) -> AppError {
    AppError::Validation(format!(
        "{} must be of type {}, got {}",
        key,
        expected,
        actual.type_name()
    ))
}

/// Custom Deserialize implementation that validates during deserialization
///
/// Accepts `prompt` as an alias for `text`, `max_tokens` as an alias for
/// `max_output_tokens`, and a nested `options` object whose entries are merged
/// with the top-level scalar fields (top-level wins on conflict).
impl<'de> Deserialize<'de> for FeatureRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawFeatureRequest {
            #[serde(default, alias = "prompt")]
            text: String,
            #[serde(default)]
            temperature: Option<f64>,
            #[serde(default, alias = "max_tokens")]
            max_output_tokens: Option<u32>,
            #[serde(default)]
            options: BTreeMap<String, Option<OptionValue>>,
            #[serde(flatten)]
            extra: BTreeMap<String, Option<OptionValue>>,
        }

        let raw = RawFeatureRequest::deserialize(deserializer)?;

        let char_count = raw.text.chars().count();
        if char_count > MAX_TEXT_LENGTH {
            return Err(serde::de::Error::custom(format!(
                "text exceeds maximum length of {} characters (got {})",
                MAX_TEXT_LENGTH, char_count
            )));
        }

        // `null` means "not supplied"
        let mut merged = raw.options;
        merged.extend(raw.extra);
        let options = merged
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| (key, value)))
            .collect();

        Ok(FeatureRequest {
            text: raw.text,
            options,
            temperature: raw.temperature,
            max_output_tokens: raw.max_output_tokens,
            attachment: None,
        })
    }
}

/// A bounded count option such as `num_variations`
///
/// Used both to phrase the prompt ("Generate 3 versions") and to truncate the
/// normalized list to the same size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountOption {
    pub key: &'static str,
    pub default: usize,
    pub max: usize,
}

impl CountOption {
    pub const fn new(key: &'static str, default: usize, max: usize) -> Self {
        Self { key, default, max }
    }

    /// Resolve the count from a request, enforcing `1..=max`
    pub fn resolve(&self, request: &FeatureRequest) -> AppResult<usize> {
        match request.integer(self.key)? {
            None => Ok(self.default),
            Some(value) if value >= 1 && value as u64 <= self.max as u64 => Ok(value as usize),
            Some(value) => Err(AppError::Validation(format!(
                "{} must be between 1 and {}, got {}",
                self.key, self.max, value
            ))),
        }
    }
}
