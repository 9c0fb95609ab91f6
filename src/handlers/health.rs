//! Service banner and health check
//!
//! Neither endpoint touches the generation service.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::features::FeatureId;
use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health
pub async fn handler() -> (StatusCode, Json<HealthResponse>) {
    (StatusCode::OK, Json(HealthResponse { status: "healthy" }))
}

/// Service banner listing the registered features
#[derive(Debug, Serialize)]
pub struct BannerResponse {
    pub service: &'static str,
    pub status: &'static str,
    pub version: &'static str,
    pub model: String,
    pub features: Vec<FeatureId>,
}

/// GET /
pub async fn banner(State(state): State<AppState>) -> Json<BannerResponse> {
    Json(BannerResponse {
        service: "NeuroWrite",
        status: "running",
        version: env!("CARGO_PKG_VERSION"),
        model: state.config().model.name().to_string(),
        features: state.router().registry().ids(),
    })
}
