//! Response normalization
//!
//! Reshapes raw model text into the output shape a feature declares. The
//! normalizer never fails: output that does not fit the shape produces an
//! empty list rather than an error.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Field names for grammar-check records
pub const GRAMMAR_FIELDS: &[&str] = &["error", "type", "correction", "explanation"];

/// Field names for spelling-check records
pub const SPELLING_FIELDS: &[&str] = &["misspelled", "correction"];

/// Delimiter the paraphrase template asks the model to use
pub const BLOCK_DELIMITER: &str = "---";

/// How a feature's raw output is reshaped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    /// Trimmed text
    Plain,
    /// One record per `|`-separated line with the given field names
    Records(&'static [&'static str]),
    /// Segments between a delimiter
    Blocks { delimiter: &'static str },
    /// One entry per non-blank line
    Lines,
    /// JSON-shaped text passed through untouched
    Structured,
}

/// Normalized feature output
///
/// Serializes as its bare payload: a string, an array of objects, or an array
/// of strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedResponse {
    PlainText(String),
    RecordList(Vec<Record>),
    StructuredText(String),
    TextList(Vec<String>),
}

impl NormalizedResponse {
    /// Text used for length metadata; `None` for list shapes
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::PlainText(text) | Self::StructuredText(text) => Some(text),
            Self::RecordList(_) | Self::TextList(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::PlainText(text) | Self::StructuredText(text) => text.len(),
            Self::RecordList(records) => records.len(),
            Self::TextList(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordered name → value mapping; serializes as a JSON object in field order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record(Vec<(String, String)>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push((name.into(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Reshape `raw` according to `shape`
///
/// `limit` truncates list shapes to the requested count; other shapes ignore it.
pub fn normalize(shape: OutputShape, raw: &str, limit: Option<usize>) -> NormalizedResponse {
    match shape {
        OutputShape::Plain => NormalizedResponse::PlainText(raw.trim().to_string()),
        OutputShape::Structured => NormalizedResponse::StructuredText(raw.to_string()),
        OutputShape::Records(fields) => NormalizedResponse::RecordList(parse_records(raw, fields)),
        OutputShape::Blocks { delimiter } => {
            let blocks = raw
                .split(delimiter)
                .map(str::trim)
                .filter(|segment| !segment.is_empty());
            NormalizedResponse::TextList(truncate(blocks, limit))
        }
        OutputShape::Lines => {
            let lines = raw.lines().map(str::trim).filter(|line| !line.is_empty());
            NormalizedResponse::TextList(truncate(lines, limit))
        }
    }
}

fn truncate<'a>(items: impl Iterator<Item = &'a str>, limit: Option<usize>) -> Vec<String> {
    items
        .take(limit.unwrap_or(usize::MAX))
        .map(str::to_string)
        .collect()
}

fn parse_records(raw: &str, fields: &[&str]) -> Vec<Record> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let values: Vec<&str> = line.split('|').map(str::trim).collect();
            if values.len() < fields.len() {
                return None;
            }
            Some(Record(
                fields
                    .iter()
                    .zip(values)
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect(),
            ))
        })
        .collect()
}

/// Number of whitespace-delimited tokens
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Number of sentence terminators (`.`, `!`, `?`)
pub fn sentence_count(text: &str) -> usize {
    text.chars().filter(|c| matches!(c, '.' | '!' | '?')).count()
}

/// Round to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
