//! JSON extractor whose rejections are failure envelopes
//!
//! Wraps Axum's `Json` extractor so that a malformed body produces the same
//! `{"success": false, "detail": ...}` shape as every other failure.

use crate::error::ErrorKind;
use crate::router::ResponseEnvelope;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

/// JSON extraction error rendered as a failure envelope
///
/// Status depends on the rejection:
/// - JSON syntax errors → 400 Bad Request
/// - Data validation errors → 422 Unprocessable Entity
/// - Missing content type → 415 Unsupported Media Type
#[derive(Debug)]
pub struct EnvelopeJsonRejection(JsonRejection);

impl EnvelopeJsonRejection {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            JsonRejection::JsonSyntaxError(_) => StatusCode::BAD_REQUEST,
            JsonRejection::JsonDataError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            // BytesRejection or future rejection types
            _ => StatusCode::BAD_REQUEST,
        }
    }

    pub fn message(&self) -> String {
        match &self.0 {
            JsonRejection::MissingJsonContentType(_) => {
                "Content-Type must be application/json".to_string()
            }
            other => other.body_text(),
        }
    }
}

impl IntoResponse for EnvelopeJsonRejection {
    fn into_response(self) -> Response {
        tracing::debug!(
            status = self.status().as_u16(),
            reason = %self.message(),
            "Rejected request body"
        );
        let envelope = ResponseEnvelope::rejection(ErrorKind::Validation, self.message());
        (self.status(), Json(envelope)).into_response()
    }
}

/// Drop-in replacement for `axum::Json` in feature handlers
pub struct EnvelopeJson<T>(pub T);

impl<S, T> FromRequest<S> for EnvelopeJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = EnvelopeJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(EnvelopeJson(value)),
            Err(rejection) => Err(EnvelopeJsonRejection(rejection)),
        }
    }
}
