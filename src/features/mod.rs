//! Feature catalogue
//!
//! A feature is one prompt template plus one output shape. This module holds
//! the identifiers, the request model, the template builders, the response
//! normalizer and the registry tying them together.

pub mod metadata;
pub mod normalize;
pub mod prompt;
pub mod registry;
pub mod request;

pub use normalize::{NormalizedResponse, OutputShape, Record};
pub use registry::{FeatureSpec, InputKind, Registry};
pub use request::{CountOption, FeatureRequest, OptionValue};

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every exposed feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureId {
    Prompt,
    AnalyzeIntent,
    Summarize,
    KeyPoints,
    Write,
    Complete,
    Expand,
    Rewrite,
    Paraphrase,
    Simplify,
    Humanize,
    AdjustTone,
    StreamRewrite,
    Translate,
    DetectLanguage,
    Proofread,
    GrammarCheck,
    SpellingCheck,
    Readability,
    AutoFix,
    Ocr,
    DescribeImage,
    DetectObjects,
    AnalyzeScene,
    AnalyzeDocument,
}

impl FeatureId {
    pub const ALL: [FeatureId; 25] = [
        Self::Prompt,
        Self::AnalyzeIntent,
        Self::Summarize,
        Self::KeyPoints,
        Self::Write,
        Self::Complete,
        Self::Expand,
        Self::Rewrite,
        Self::Paraphrase,
        Self::Simplify,
        Self::Humanize,
        Self::AdjustTone,
        Self::StreamRewrite,
        Self::Translate,
        Self::DetectLanguage,
        Self::Proofread,
        Self::GrammarCheck,
        Self::SpellingCheck,
        Self::Readability,
        Self::AutoFix,
        Self::Ocr,
        Self::DescribeImage,
        Self::DetectObjects,
        Self::AnalyzeScene,
        Self::AnalyzeDocument,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::AnalyzeIntent => "analyze-intent",
            Self::Summarize => "summarize",
            Self::KeyPoints => "key-points",
            Self::Write => "write",
            Self::Complete => "complete",
            Self::Expand => "expand",
            Self::Rewrite => "rewrite",
            Self::Paraphrase => "paraphrase",
            Self::Simplify => "simplify",
            Self::Humanize => "humanize",
            Self::AdjustTone => "adjust-tone",
            Self::StreamRewrite => "stream-rewrite",
            Self::Translate => "translate",
            Self::DetectLanguage => "detect-language",
            Self::Proofread => "proofread",
            Self::GrammarCheck => "grammar-check",
            Self::SpellingCheck => "spelling-check",
            Self::Readability => "readability",
            Self::AutoFix => "auto-fix",
            Self::Ocr => "ocr",
            Self::DescribeImage => "describe-image",
            Self::DetectObjects => "detect-objects",
            Self::AnalyzeScene => "analyze-scene",
            Self::AnalyzeDocument => "analyze-document",
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| AppError::UnknownFeature(s.to_string()))
    }
}
