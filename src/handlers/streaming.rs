//! Streaming rewrite endpoint
//!
//! POST /gemini/rewrite/stream answers with a chunked `text/plain` body whose
//! chunks are the generation fragments in emission order. A failure before the
//! first fragment is an ordinary failure envelope; a later one arrives as a
//! final `Error: <message>` chunk.

use crate::features::{FeatureId, FeatureRequest};
use crate::handlers::AppState;
use crate::handlers::extractor::EnvelopeJson;
use crate::middleware::RequestId;
use axum::{
    Extension,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use std::convert::Infallible;

const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    EnvelopeJson(request): EnvelopeJson<FeatureRequest>,
) -> Response {
    tracing::debug!(
        request_id = %request_id,
        text_length = request.text().len(),
        "Received streaming rewrite request"
    );

    let fragments = match state
        .router()
        .dispatch_stream(FeatureId::StreamRewrite.as_str(), request, request_id)
        .await
    {
        Ok(fragments) => fragments,
        Err(envelope) => return envelope.into_response(),
    };

    // Dropping the body (client disconnect) drops the stream, which aborts the
    // upstream producer
    let body = Body::from_stream(fragments.map(|fragment| Ok::<_, Infallible>(Bytes::from(fragment))));

    let mut response = Response::new(body);
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(TEXT_PLAIN_UTF8),
    );
    response
}
