//! Command-line interface for NeuroWrite
//!
//! Provides argument parsing and subcommand handling for the NeuroWrite binary.

use clap::{Parser, Subcommand};

/// AI writing-assistant gateway over a hosted language model
#[derive(Parser)]
#[command(name = "neurowrite")]
#[command(version)]
#[command(about = "AI writing-assistant gateway over a hosted language model")]
#[command(
    long_about = "NeuroWrite exposes summarize, rewrite, translate, proofread and image \
    analysis endpoints, each backed by a prompt template sent to the Gemini API."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# NeuroWrite Configuration
# =========================
#
# This file configures the HTTP server, the generation model and logging.
# The API key itself is NOT stored here; see [model].api_key_env.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 8001

# Upper bound for one non-streaming generation call, in seconds (1-300).
# Streaming calls are bounded only until the first response bytes arrive.
request_timeout_seconds = 60

# ─────────────────────────────────────────────────────────────────────────────
# GENERATION MODEL
# ─────────────────────────────────────────────────────────────────────────────

[model]
# Gemini model identifier
name = "gemini-2.0-flash-exp"

# REST API root (the client appends /models/{name}:generateContent)
base_url = "https://generativelanguage.googleapis.com/v1beta"

# Environment variable holding the API key (a .env file is also honored)
api_key_env = "GEMINI_API_KEY"

# Fragments buffered between the upstream stream and a slow client (1-1024)
stream_buffer = 16

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
# RUST_LOG overrides this when set.
log_level = "info"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use clap::CommandFactory;
    use std::str::FromStr;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn default_config_path() {
        let cli = Cli::parse_from(["neurowrite"]);
        assert_eq!(cli.config, "config.toml");
        assert!(cli.command.is_none());
    }

    #[test]
    fn custom_config_path() {
        let cli = Cli::parse_from(["neurowrite", "--config", "custom.toml"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn config_subcommand() {
        let cli = Cli::parse_from(["neurowrite", "config"]);
        assert!(matches!(
            cli.command,
            Some(Command::Config { output: None })
        ));
    }

    #[test]
    fn config_subcommand_with_output() {
        let cli = Cli::parse_from(["neurowrite", "config", "-o", "my-config.toml"]);
        assert!(matches!(
            cli.command,
            Some(Command::Config { output: Some(ref path) }) if path == "my-config.toml"
        ));
    }

    #[test]
    fn template_is_a_valid_config() {
        let config = Config::from_str(generate_config_template())
            .expect("template should parse and validate");
        assert_eq!(config.server.port, 8001);
        assert_eq!(config.model.name(), "gemini-2.0-flash-exp");
        assert_eq!(config.model.api_key_env(), "GEMINI_API_KEY");
    }

    #[test]
    fn template_has_all_sections() {
        let template = generate_config_template();
        assert!(template.contains("[server]"));
        assert!(template.contains("[model]"));
        assert!(template.contains("[observability]"));
    }
}
