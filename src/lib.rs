//! NeuroWrite - AI writing-assistant gateway
//!
//! Exposes summarize, rewrite, translate, proofread and image-analysis
//! features over HTTP. Each feature is a prompt template sent to a hosted
//! language model, with the raw reply reshaped into a uniform JSON envelope.

pub mod cli;
pub mod completion;
pub mod config;
pub mod error;
pub mod features;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod telemetry;
