//! Supported translation languages

use crate::features::{NormalizedResponse, Record};
use crate::router::ResponseEnvelope;
use serde_json::json;

/// ISO 639-1 code and English name of each listed language
pub const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh", "Chinese"),
    ("ar", "Arabic"),
    ("hi", "Hindi"),
    ("bn", "Bengali"),
    ("tr", "Turkish"),
    ("vi", "Vietnamese"),
    ("th", "Thai"),
    ("pl", "Polish"),
    ("nl", "Dutch"),
    ("sv", "Swedish"),
    ("id", "Indonesian"),
];

/// GET /gemini/translate/languages
///
/// Static list; translation itself accepts any language name the model knows.
pub async fn handler() -> ResponseEnvelope {
    let records = LANGUAGES
        .iter()
        .map(|(code, name)| Record::new().with("code", *code).with("name", *name))
        .collect();

    let mut metadata = serde_json::Map::new();
    metadata.insert("count".into(), json!(LANGUAGES.len()));

    ResponseEnvelope::success(NormalizedResponse::RecordList(records), Some(metadata))
}
