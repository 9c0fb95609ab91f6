//! NeuroWrite HTTP server
//!
//! Starts an Axum web server exposing the writing-assistant features.

use clap::Parser;
use neurowrite::cli::{Cli, Command, generate_config_template};
use neurowrite::completion::GeminiClient;
use neurowrite::config::Config;
use neurowrite::handlers::{self, AppState};
use neurowrite::telemetry;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                eprintln!("Configuration template written to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    // A missing .env file is fine; real environment variables still apply
    let dotenv_path = dotenvy::dotenv().ok();

    let config = Config::from_file(&cli.config)?;

    telemetry::init(&config.observability.log_level);

    if let Some(path) = dotenv_path {
        tracing::debug!(path = %path.display(), "Loaded environment from .env");
    }

    let api_key = config.model.resolve_api_key()?;
    let client = GeminiClient::new(&config, api_key)?;

    tracing::info!(
        config_path = %cli.config,
        model = %client.model(),
        request_timeout_seconds = config.server.request_timeout_seconds,
        "Starting NeuroWrite server on {}:{}",
        config.server.host,
        config.server.port
    );

    let addr = config.server.socket_addr()?;

    let state = AppState::new(config, Arc::new(client));
    let app = handlers::app(state);

    tracing::info!("Listening on {}", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
