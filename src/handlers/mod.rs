//! HTTP request handlers for the NeuroWrite API

use crate::completion::CompletionClient;
use crate::config::Config;
use crate::features::Registry;
use crate::middleware::request_id_middleware;
use crate::router::FeatureRouter;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod extractor;
pub mod features;
pub mod health;
pub mod languages;
pub mod streaming;
pub mod vision;

/// Application state shared across all handlers
///
/// All fields are Arc'd for cheap cloning across Axum handlers and are never
/// mutated after startup.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    router: Arc<FeatureRouter>,
}

impl AppState {
    /// Create state with the standard feature registry
    pub fn new(config: Config, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            config: Arc::new(config),
            router: Arc::new(FeatureRouter::new(Registry::standard(), client)),
        }
    }

    /// Get reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get reference to the feature router
    pub fn router(&self) -> &FeatureRouter {
        &self.router
    }
}

/// Build the complete HTTP application
pub fn app(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(health::banner))
        .route("/health", get(health::handler))
        .route("/gemini/translate/languages", get(languages::handler))
        .route("/gemini/rewrite/stream", post(streaming::handler))
        .route("/features/{feature_id}", post(features::by_name));

    for (path, feature) in features::FEATURE_ROUTES {
        app = app.route(path, features::route(*feature));
    }
    for (path, feature) in vision::VISION_ROUTES {
        app = app.route(path, vision::route(*feature));
    }

    app.layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
