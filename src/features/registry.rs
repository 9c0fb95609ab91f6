//! Feature registry
//!
//! Explicit identifier → entry table, built once at startup and shared
//! read-only by every request.

use super::FeatureId;
use super::metadata::{self, MetadataFn};
use super::normalize::{BLOCK_DELIMITER, GRAMMAR_FIELDS, OutputShape, SPELLING_FIELDS};
use super::prompt::{self, NUM_COMPLETIONS, NUM_VARIATIONS, PromptBuilder};
use super::request::{CountOption, FeatureRequest};
use crate::completion::GenerationParameters;
use crate::error::{AppError, AppResult};
use std::collections::HashMap;

const CREATIVE: GenerationParameters = GenerationParameters::new(0.9);
const BALANCED: GenerationParameters = GenerationParameters::new(0.7);
const PRECISE: GenerationParameters = GenerationParameters::new(0.2);

/// What a feature consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Non-empty `text`
    Text,
    /// Non-empty image attachment
    Image,
}

/// One registry entry
#[derive(Debug, Clone, Copy)]
pub struct FeatureSpec {
    pub id: FeatureId,
    pub input: InputKind,
    pub shape: OutputShape,
    pub defaults: GenerationParameters,
    pub build: PromptBuilder,
    pub metadata: MetadataFn,
    /// Count option that phrases the prompt and truncates the list output
    pub count: Option<CountOption>,
    /// Request option mapped onto the sampling temperature
    pub temperature_option: Option<&'static str>,
}

impl FeatureSpec {
    const fn text(id: FeatureId, shape: OutputShape, defaults: GenerationParameters) -> Self {
        Self {
            id,
            input: InputKind::Text,
            shape,
            defaults,
            build: prompt::prompt,
            metadata: metadata::none,
            count: None,
            temperature_option: None,
        }
    }

    const fn image(id: FeatureId, shape: OutputShape) -> Self {
        Self {
            input: InputKind::Image,
            ..Self::text(id, shape, PRECISE)
        }
    }

    const fn build(mut self, build: PromptBuilder) -> Self {
        self.build = build;
        self
    }

    const fn metadata(mut self, metadata: MetadataFn) -> Self {
        self.metadata = metadata;
        self
    }

    const fn count(mut self, count: CountOption) -> Self {
        self.count = Some(count);
        self
    }

    const fn temperature_option(mut self, key: &'static str) -> Self {
        self.temperature_option = Some(key);
        self
    }

    /// Resolved list limit for this request, if the feature has one
    pub fn limit(&self, request: &FeatureRequest) -> AppResult<Option<usize>> {
        self.count.map(|count| count.resolve(request)).transpose()
    }
}

fn standard_entries() -> Vec<FeatureSpec> {
    use FeatureId::*;
    use OutputShape::{Lines, Plain, Structured};

    let blocks = OutputShape::Blocks {
        delimiter: BLOCK_DELIMITER,
    };

    vec![
        FeatureSpec::text(Prompt, Plain, BALANCED.with_max_output_tokens(1024))
            .metadata(metadata::prompt),
        FeatureSpec::text(AnalyzeIntent, Structured, PRECISE).build(prompt::analyze_intent),
        FeatureSpec::text(Summarize, Plain, BALANCED)
            .build(prompt::summarize)
            .metadata(metadata::summarize),
        FeatureSpec::text(KeyPoints, Lines, BALANCED)
            .build(prompt::key_points)
            .metadata(metadata::item_count),
        FeatureSpec::text(Write, Plain, CREATIVE)
            .build(prompt::write)
            .metadata(metadata::write),
        FeatureSpec::text(Complete, Lines, CREATIVE)
            .build(prompt::complete)
            .metadata(metadata::item_count)
            .count(NUM_COMPLETIONS),
        FeatureSpec::text(Expand, Plain, CREATIVE)
            .build(prompt::expand)
            .metadata(metadata::expand),
        FeatureSpec::text(Rewrite, Plain, BALANCED)
            .build(prompt::rewrite)
            .metadata(metadata::rewrite)
            .temperature_option("creativity_level"),
        FeatureSpec::text(Paraphrase, blocks, CREATIVE)
            .build(prompt::paraphrase)
            .metadata(metadata::item_count)
            .count(NUM_VARIATIONS),
        FeatureSpec::text(Simplify, Plain, BALANCED)
            .build(prompt::simplify)
            .metadata(metadata::simplify),
        FeatureSpec::text(Humanize, Plain, CREATIVE)
            .build(prompt::humanize)
            .metadata(metadata::humanize),
        FeatureSpec::text(AdjustTone, Plain, BALANCED)
            .build(prompt::adjust_tone)
            .metadata(metadata::adjust_tone),
        FeatureSpec::text(StreamRewrite, Plain, BALANCED.streaming())
            .build(prompt::stream_rewrite),
        FeatureSpec::text(Translate, Plain, BALANCED)
            .build(prompt::translate)
            .metadata(metadata::translate),
        FeatureSpec::text(DetectLanguage, Structured, PRECISE)
            .build(prompt::detect_language)
            .metadata(metadata::detect_language),
        FeatureSpec::text(Proofread, Structured, PRECISE)
            .build(prompt::proofread)
            .metadata(metadata::proofread),
        FeatureSpec::text(GrammarCheck, OutputShape::Records(GRAMMAR_FIELDS), PRECISE)
            .build(prompt::grammar_check)
            .metadata(metadata::error_count),
        FeatureSpec::text(SpellingCheck, OutputShape::Records(SPELLING_FIELDS), PRECISE)
            .build(prompt::spelling_check)
            .metadata(metadata::error_count),
        FeatureSpec::text(Readability, Structured, PRECISE)
            .build(prompt::readability)
            .metadata(metadata::readability),
        FeatureSpec::text(AutoFix, Plain, PRECISE).build(prompt::auto_fix),
        FeatureSpec::image(Ocr, Plain).build(prompt::ocr),
        FeatureSpec::image(DescribeImage, Plain).build(prompt::describe_image),
        FeatureSpec::image(DetectObjects, Lines)
            .build(prompt::detect_objects)
            .metadata(metadata::item_count),
        FeatureSpec::image(AnalyzeScene, Structured).build(prompt::analyze_scene),
        FeatureSpec::image(AnalyzeDocument, Structured).build(prompt::analyze_document),
    ]
}

/// Identifier → entry table
#[derive(Debug, Clone)]
pub struct Registry {
    entries: HashMap<FeatureId, FeatureSpec>,
}

impl Registry {
    /// Registry with every built-in feature
    pub fn standard() -> Self {
        Self::from_entries(standard_entries())
    }

    /// Build from an explicit entry list; later duplicates replace earlier ones
    pub fn from_entries(entries: impl IntoIterator<Item = FeatureSpec>) -> Self {
        Self {
            entries: entries.into_iter().map(|spec| (spec.id, spec)).collect(),
        }
    }

    pub fn get(&self, id: FeatureId) -> Option<&FeatureSpec> {
        self.entries.get(&id)
    }

    /// Look up by wire name
    ///
    /// # Errors
    ///
    /// `UnknownFeature` if the name is not an identifier or has no entry.
    pub fn lookup(&self, name: &str) -> AppResult<&FeatureSpec> {
        let id: FeatureId = name.parse()?;
        self.get(id)
            .ok_or_else(|| AppError::UnknownFeature(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered identifiers in declaration order
    pub fn ids(&self) -> Vec<FeatureId> {
        FeatureId::ALL
            .into_iter()
            .filter(|id| self.entries.contains_key(id))
            .collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}
