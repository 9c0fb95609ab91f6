//! Response metadata
//!
//! Counts are computed locally from whitespace-delimited tokens of the input
//! and the normalized output; model self-reports are never trusted. Options
//! that shaped the prompt are echoed back.

use super::normalize::{NormalizedResponse, round_to, sentence_count, word_count};
use super::prompt;
use super::request::FeatureRequest;
use crate::completion::GenerationParameters;
use serde_json::{Map, Value, json};

pub type Metadata = Map<String, Value>;

/// Signature shared by every metadata function in the registry
pub type MetadataFn = fn(&MetadataContext<'_>) -> Option<Metadata>;

/// Everything a metadata function may look at
pub struct MetadataContext<'a> {
    pub request: &'a FeatureRequest,
    /// Composed prompt as sent upstream
    pub prompt: &'a str,
    pub output: &'a NormalizedResponse,
    pub params: &'a GenerationParameters,
}

impl MetadataContext<'_> {
    fn original_words(&self) -> usize {
        word_count(self.request.text())
    }

    fn output_words(&self) -> usize {
        self.output.as_text().map(word_count).unwrap_or(0)
    }

    /// `original_length` and `<result>_length`
    fn lengths(&self, result_key: &str) -> Metadata {
        let mut meta = Metadata::new();
        meta.insert("original_length".into(), json!(self.original_words()));
        meta.insert(result_key.into(), json!(self.output_words()));
        meta
    }

    /// Output/input word ratio, or `None` when the input has no words
    fn ratio(&self) -> Option<f64> {
        match self.original_words() {
            0 => None,
            original => Some(round_to(self.output_words() as f64 / original as f64, 2)),
        }
    }

    fn echo(&self, meta: &mut Metadata, key: &str) {
        if let Some(value) = self.request.options().get(key) {
            meta.insert(key.into(), json!(value));
        }
    }

    fn echo_or(&self, meta: &mut Metadata, key: &str, default: &str) {
        match self.request.options().get(key) {
            Some(value) => meta.insert(key.into(), json!(value)),
            None => meta.insert(key.into(), json!(default)),
        };
    }
}

pub fn none(_ctx: &MetadataContext<'_>) -> Option<Metadata> {
    None
}

pub fn prompt(ctx: &MetadataContext<'_>) -> Option<Metadata> {
    let mut meta = Metadata::new();
    meta.insert("temperature".into(), json!(ctx.params.temperature));
    if let Some(max_tokens) = ctx.params.max_output_tokens {
        meta.insert("max_tokens".into(), json!(max_tokens));
    }
    meta.insert("prompt_tokens".into(), json!(word_count(ctx.prompt)));
    meta.insert("completion_tokens".into(), json!(ctx.output_words()));
    Some(meta)
}

pub fn summarize(ctx: &MetadataContext<'_>) -> Option<Metadata> {
    let mut meta = ctx.lengths("summary_length");
    if let Some(ratio) = ctx.ratio() {
        meta.insert("compression_ratio".into(), json!(ratio));
    }
    ctx.echo_or(&mut meta, "style", "paragraph");
    ctx.echo_or(&mut meta, "length", "medium");
    Some(meta)
}

pub fn write(ctx: &MetadataContext<'_>) -> Option<Metadata> {
    let mut meta = Metadata::new();
    meta.insert("word_count".into(), json!(ctx.output_words()));
    ctx.echo(&mut meta, "style");
    ctx.echo(&mut meta, "tone");
    if let Some(requested) = ctx.request.options().get("word_count") {
        meta.insert("requested_words".into(), json!(requested));
    }
    Some(meta)
}

pub fn expand(ctx: &MetadataContext<'_>) -> Option<Metadata> {
    let mut meta = ctx.lengths("expanded_length");
    if let Ok(target) = prompt::target_length(ctx.request) {
        meta.insert("target_length".into(), json!(target));
    }
    if let Some(ratio) = ctx.ratio() {
        meta.insert("expansion_ratio".into(), json!(ratio));
    }
    Some(meta)
}

pub fn rewrite(ctx: &MetadataContext<'_>) -> Option<Metadata> {
    let mut meta = ctx.lengths("rewritten_length");
    ctx.echo(&mut meta, "style");
    if let Ok(creativity) = prompt::creativity_level(ctx.request) {
        meta.insert("creativity_level".into(), json!(creativity));
    }
    Some(meta)
}

pub fn simplify(ctx: &MetadataContext<'_>) -> Option<Metadata> {
    Some(ctx.lengths("simplified_length"))
}

pub fn humanize(ctx: &MetadataContext<'_>) -> Option<Metadata> {
    let mut meta = ctx.lengths("humanized_length");
    let applied = prompt::enabled_techniques(ctx.request).unwrap_or_default();
    meta.insert("applied_options".into(), json!(applied));
    Some(meta)
}

pub fn adjust_tone(ctx: &MetadataContext<'_>) -> Option<Metadata> {
    let mut meta = ctx.lengths("adjusted_length");
    ctx.echo(&mut meta, "tone");
    if let Ok(intensity) = prompt::intensity(ctx.request) {
        meta.insert("intensity".into(), json!(intensity));
    }
    Some(meta)
}

pub fn translate(ctx: &MetadataContext<'_>) -> Option<Metadata> {
    let mut meta = ctx.lengths("translated_length");
    let source = prompt::source_language(ctx.request).unwrap_or("auto");
    meta.insert("source_language".into(), json!(source));
    ctx.echo(&mut meta, "target_language");
    Some(meta)
}

pub fn detect_language(ctx: &MetadataContext<'_>) -> Option<Metadata> {
    let sample: String = ctx.request.text().chars().take(100).collect();
    let mut meta = Metadata::new();
    meta.insert("text_sample".into(), json!(sample));
    Some(meta)
}

pub fn proofread(ctx: &MetadataContext<'_>) -> Option<Metadata> {
    let mut meta = Metadata::new();
    meta.insert("text_length".into(), json!(ctx.original_words()));
    Some(meta)
}

pub fn readability(ctx: &MetadataContext<'_>) -> Option<Metadata> {
    let words = ctx.original_words();
    let sentences = sentence_count(ctx.request.text());
    let average = round_to(words as f64 / sentences.max(1) as f64, 1);

    let mut meta = Metadata::new();
    meta.insert("word_count".into(), json!(words));
    meta.insert("sentence_count".into(), json!(sentences));
    meta.insert("avg_words_per_sentence".into(), json!(average));
    Some(meta)
}

/// Error-list features report how many records survived normalization
pub fn error_count(ctx: &MetadataContext<'_>) -> Option<Metadata> {
    let mut meta = Metadata::new();
    meta.insert("error_count".into(), json!(ctx.output.len()));
    Some(meta)
}

pub fn item_count(ctx: &MetadataContext<'_>) -> Option<Metadata> {
    let mut meta = Metadata::new();
    meta.insert("count".into(), json!(ctx.output.len()));
    Some(meta)
}
