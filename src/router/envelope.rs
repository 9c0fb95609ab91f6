//! Uniform response envelope

use crate::error::{AppError, ErrorKind};
use crate::features::NormalizedResponse;
use crate::features::metadata::Metadata;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Success/failure wrapper returned by every feature endpoint
///
/// Success envelopes carry `data` and optional `metadata`; failure envelopes
/// carry `detail`. The failure class is kept for the transport but never
/// serialized.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEnvelope {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<NormalizedResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Metadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip)]
    kind: Option<ErrorKind>,
}

impl ResponseEnvelope {
    pub fn success(data: NormalizedResponse, metadata: Option<Metadata>) -> Self {
        Self {
            success: true,
            data: Some(data),
            metadata,
            detail: None,
            kind: None,
        }
    }

    pub fn failure(error: &AppError) -> Self {
        Self {
            success: false,
            data: None,
            metadata: None,
            detail: Some(error.to_string()),
            kind: Some(error.kind()),
        }
    }

    /// Failure with an explicit class, for rejections raised outside the router
    pub fn rejection(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            metadata: None,
            detail: Some(detail.into()),
            kind: Some(kind),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&NormalizedResponse> {
        self.data.as_ref()
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.kind
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind
            .map(ErrorKind::status_code)
            .unwrap_or(StatusCode::OK)
    }
}

impl From<AppError> for ResponseEnvelope {
    fn from(error: AppError) -> Self {
        Self::failure(&error)
    }
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}
