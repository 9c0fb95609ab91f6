//! Image feature endpoints
//!
//! The request body is the raw image; its `Content-Type` travels with it to
//! the generation service.

use crate::completion::Attachment;
use crate::error::ErrorKind;
use crate::features::{FeatureId, FeatureRequest};
use crate::handlers::AppState;
use crate::middleware::RequestId;
use crate::router::ResponseEnvelope;
use axum::{
    Extension, Json,
    body::Bytes,
    extract::{DefaultBodyLimit, State, rejection::BytesRejection},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
    routing::{MethodRouter, post},
};

/// Largest image accepted inline by the generation service
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

pub const VISION_ROUTES: &[(&str, FeatureId)] = &[
    ("/ai/vision/ocr", FeatureId::Ocr),
    ("/ai/vision/describe", FeatureId::DescribeImage),
    ("/ai/vision/objects", FeatureId::DetectObjects),
    ("/ai/vision/scene", FeatureId::AnalyzeScene),
    ("/ai/vision/document", FeatureId::AnalyzeDocument),
];

/// POST handler bound to one image feature
pub fn route(feature: FeatureId) -> MethodRouter<AppState> {
    post(
        move |State(state): State<AppState>,
              Extension(request_id): Extension<RequestId>,
              headers: HeaderMap,
              body: Result<Bytes, BytesRejection>| async move {
            handle(state, feature, request_id, headers, body).await
        },
    )
    .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES))
}

async fn handle(
    state: AppState,
    feature: FeatureId,
    request_id: RequestId,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let image = match body {
        Ok(image) => image,
        Err(rejection) => {
            let envelope = ResponseEnvelope::rejection(ErrorKind::Validation, rejection.body_text());
            return (rejection.status(), Json(envelope)).into_response();
        }
    };

    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or(value).trim().to_ascii_lowercase())
        .unwrap_or_default();

    tracing::debug!(
        request_id = %request_id,
        feature = %feature,
        mime_type = %mime_type,
        image_bytes = image.len(),
        "Received image request"
    );

    let request = FeatureRequest::with_attachment(Attachment::new(mime_type, image.to_vec()));
    state
        .router()
        .dispatch_feature(feature, request, request_id)
        .await
        .into_response()
}
