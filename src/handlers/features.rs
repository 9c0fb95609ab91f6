//! JSON feature endpoints
//!
//! Every text feature has a fixed path; `/features/{feature_id}` reaches any
//! of them by identifier.

use crate::features::{FeatureId, FeatureRequest};
use crate::handlers::AppState;
use crate::handlers::extractor::EnvelopeJson;
use crate::middleware::RequestId;
use crate::router::ResponseEnvelope;
use axum::{
    Extension,
    extract::{Path, State},
    routing::{MethodRouter, post},
};

/// Fixed path of each JSON feature
pub const FEATURE_ROUTES: &[(&str, FeatureId)] = &[
    ("/gemini/prompt", FeatureId::Prompt),
    ("/gemini/prompt/analyze-intent", FeatureId::AnalyzeIntent),
    ("/gemini/summarize", FeatureId::Summarize),
    ("/gemini/summarize/key-points", FeatureId::KeyPoints),
    ("/gemini/write", FeatureId::Write),
    ("/gemini/write/complete", FeatureId::Complete),
    ("/gemini/write/expand", FeatureId::Expand),
    ("/gemini/rewrite", FeatureId::Rewrite),
    ("/gemini/rewrite/paraphrase", FeatureId::Paraphrase),
    ("/gemini/rewrite/simplify", FeatureId::Simplify),
    ("/gemini/rewrite/humanize", FeatureId::Humanize),
    ("/gemini/rewrite/tone", FeatureId::AdjustTone),
    ("/gemini/translate", FeatureId::Translate),
    ("/gemini/translate/detect", FeatureId::DetectLanguage),
    ("/gemini/proofread", FeatureId::Proofread),
    ("/gemini/proofread/grammar", FeatureId::GrammarCheck),
    ("/gemini/proofread/spelling", FeatureId::SpellingCheck),
    ("/gemini/proofread/readability", FeatureId::Readability),
    ("/gemini/proofread/auto-fix", FeatureId::AutoFix),
];

/// POST handler bound to one feature
pub fn route(feature: FeatureId) -> MethodRouter<AppState> {
    post(
        move |State(state): State<AppState>,
              Extension(request_id): Extension<RequestId>,
              EnvelopeJson(request): EnvelopeJson<FeatureRequest>| async move {
            tracing::debug!(
                request_id = %request_id,
                feature = %feature,
                text_length = request.text().len(),
                option_count = request.options().len(),
                "Received feature request"
            );
            state
                .router()
                .dispatch_feature(feature, request, request_id)
                .await
        },
    )
}

/// POST /features/{feature_id}
pub async fn by_name(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(feature_id): Path<String>,
    EnvelopeJson(request): EnvelopeJson<FeatureRequest>,
) -> ResponseEnvelope {
    tracing::debug!(
        request_id = %request_id,
        feature = %feature_id,
        text_length = request.text().len(),
        "Received feature request by identifier"
    );
    state
        .router()
        .dispatch(&feature_id, request, request_id)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_feature_routes_are_unique() {
        let paths: HashSet<_> = FEATURE_ROUTES.iter().map(|(path, _)| *path).collect();
        let features: HashSet<_> = FEATURE_ROUTES.iter().map(|(_, id)| *id).collect();
        assert_eq!(paths.len(), FEATURE_ROUTES.len());
        assert_eq!(features.len(), FEATURE_ROUTES.len());
    }

    #[test]
    fn test_feature_routes_are_text_features() {
        let registry = crate::features::Registry::standard();
        for (path, id) in FEATURE_ROUTES {
            let spec = registry.get(*id).expect("registered");
            assert_eq!(
                spec.input,
                crate::features::InputKind::Text,
                "{} should take JSON text",
                path
            );
        }
    }
}
