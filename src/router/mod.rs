//! Feature routing
//!
//! Maps a feature identifier plus payload onto one registry entry, drives the
//! completion client and wraps the outcome in a [`ResponseEnvelope`]. Every
//! failure below this layer is converted into a failure envelope here.

pub mod envelope;

pub use envelope::ResponseEnvelope;

use crate::completion::{CompletionClient, CompletionRequest, FragmentStream, GenerationOverrides};
use crate::error::{AppError, AppResult, ErrorKind};
use crate::features::metadata::MetadataContext;
use crate::features::normalize::normalize;
use crate::features::{FeatureId, FeatureRequest, FeatureSpec, InputKind, Registry};
use crate::middleware::RequestId;
use std::sync::Arc;
use std::time::Instant;

/// Dispatches feature requests to the completion client
///
/// Holds only immutable state; one instance is shared by every request.
pub struct FeatureRouter {
    registry: Registry,
    client: Arc<dyn CompletionClient>,
}

impl FeatureRouter {
    pub fn new(registry: Registry, client: Arc<dyn CompletionClient>) -> Self {
        Self { registry, client }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run a feature by wire name and return the envelope
    ///
    /// Never fails: unknown features, validation errors and upstream faults
    /// all come back as failure envelopes.
    pub async fn dispatch(
        &self,
        feature: &str,
        request: FeatureRequest,
        request_id: RequestId,
    ) -> ResponseEnvelope {
        let started = Instant::now();

        match self.run(feature, request, request_id).await {
            Ok(envelope) => {
                tracing::info!(
                    request_id = %request_id,
                    feature = %feature,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Feature request completed"
                );
                envelope
            }
            Err(error) => {
                log_failure(&error, feature, request_id, started);
                ResponseEnvelope::failure(&error)
            }
        }
    }

    /// [`dispatch`](Self::dispatch) for an already-parsed identifier
    pub async fn dispatch_feature(
        &self,
        feature: FeatureId,
        request: FeatureRequest,
        request_id: RequestId,
    ) -> ResponseEnvelope {
        self.dispatch(feature.as_str(), request, request_id).await
    }

    /// Start a streaming run
    ///
    /// Failures before the first fragment come back as a failure envelope;
    /// later failures surface in-band as the stream's final fragment.
    pub async fn dispatch_stream(
        &self,
        feature: &str,
        request: FeatureRequest,
        request_id: RequestId,
    ) -> Result<FragmentStream, ResponseEnvelope> {
        let started = Instant::now();

        match self.start_stream(feature, request, request_id).await {
            Ok(stream) => {
                tracing::info!(
                    request_id = %request_id,
                    feature = %feature,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Streaming response started"
                );
                Ok(stream)
            }
            Err(error) => {
                log_failure(&error, feature, request_id, started);
                Err(ResponseEnvelope::failure(&error))
            }
        }
    }

    async fn start_stream(
        &self,
        feature: &str,
        mut request: FeatureRequest,
        request_id: RequestId,
    ) -> AppResult<FragmentStream> {
        let spec = self.registry.lookup(feature)?;
        let mut completion = prepare(spec, &mut request)?;
        completion.params.stream = true;

        tracing::debug!(
            request_id = %request_id,
            feature = %feature,
            prompt_length = completion.prompt.len(),
            "Starting streaming completion"
        );
        self.client.stream(&completion).await
    }

    async fn run(
        &self,
        feature: &str,
        mut request: FeatureRequest,
        request_id: RequestId,
    ) -> AppResult<ResponseEnvelope> {
        let spec = self.registry.lookup(feature)?;
        let limit = spec.limit(&request)?;
        let completion = prepare(spec, &mut request)?;

        tracing::debug!(
            request_id = %request_id,
            feature = %feature,
            prompt_length = completion.prompt.len(),
            temperature = completion.params.temperature,
            stream = completion.params.stream,
            has_attachment = completion.attachment.is_some(),
            "Calling generation service"
        );

        let raw = if completion.params.stream {
            self.client.stream(&completion).await?.collect_text().await?
        } else {
            self.client.complete(&completion).await?
        };

        let output = normalize(spec.shape, &raw, limit);
        let metadata = (spec.metadata)(&MetadataContext {
            request: &request,
            prompt: &completion.prompt,
            output: &output,
            params: &completion.params,
        });

        Ok(ResponseEnvelope::success(output, metadata))
    }
}

/// Validate the request against its entry and build the upstream call
fn prepare(spec: &FeatureSpec, request: &mut FeatureRequest) -> AppResult<CompletionRequest> {
    match spec.input {
        InputKind::Text => {
            if request.text().trim().is_empty() {
                return Err(AppError::Validation("text cannot be empty".to_string()));
            }
        }
        InputKind::Image => match request.attachment() {
            None => return Err(AppError::Validation("image is required".to_string())),
            Some(image) if image.is_empty() => {
                return Err(AppError::Validation("image cannot be empty".to_string()));
            }
            Some(image) if !image.mime_type().starts_with("image/") => {
                return Err(AppError::Validation(format!(
                    "expected an image content type, got {}",
                    image.mime_type()
                )));
            }
            Some(_) => {}
        },
    }

    let prompt = (spec.build)(request)?;

    // A top-level temperature beats one derived from a feature option
    let derived_temperature = match spec.temperature_option {
        Some(key) => request.number(key)?,
        None => None,
    };
    let overrides = GenerationOverrides {
        temperature: request.temperature_override().or(derived_temperature),
        max_output_tokens: request.max_output_tokens_override(),
        stream: request.flag("stream")?,
    };
    let params = spec.defaults.merge(&overrides);
    params.validate()?;

    let attachment = match spec.input {
        InputKind::Image => request.take_attachment(),
        InputKind::Text => None,
    };

    Ok(CompletionRequest {
        prompt,
        params,
        attachment,
    })
}

fn log_failure(error: &AppError, feature: &str, request_id: RequestId, started: Instant) {
    let kind = error.kind();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match kind {
        ErrorKind::Validation | ErrorKind::UnknownFeature => tracing::warn!(
            request_id = %request_id,
            feature = %feature,
            error_kind = kind.as_str(),
            error = %error,
            elapsed_ms = elapsed_ms,
            "Feature request rejected"
        ),
        _ => tracing::error!(
            request_id = %request_id,
            feature = %feature,
            error_kind = kind.as_str(),
            error = %error,
            elapsed_ms = elapsed_ms,
            "Feature request failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::Attachment;
    use crate::features::NormalizedResponse;
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::Mutex;

    /// Returns a fixed reply and records every call
    struct ScriptedClient {
        reply: Result<String, String>,
        calls: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedClient {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing(reason: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(reason.to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<CompletionRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, request: &CompletionRequest) -> AppResult<String> {
            self.calls.lock().unwrap().push(request.clone());
            self.reply.clone().map_err(AppError::upstream)
        }

        async fn stream(&self, request: &CompletionRequest) -> AppResult<FragmentStream> {
            self.calls.lock().unwrap().push(request.clone());
            let text = self.reply.clone().map_err(AppError::upstream)?;
            let fragments = text.split_inclusive(' ').map(str::to_string).collect();
            Ok(FragmentStream::from_fragments(fragments, 4))
        }
    }

    fn router(client: Arc<ScriptedClient>) -> FeatureRouter {
        FeatureRouter::new(Registry::standard(), client)
    }

    #[tokio::test]
    async fn test_unknown_feature_makes_no_upstream_call() {
        let client = ScriptedClient::replying("unused");
        let envelope = router(client.clone())
            .dispatch("teleport", FeatureRequest::new("hi"), RequestId::new())
            .await;

        assert!(!envelope.is_success());
        assert_eq!(envelope.kind(), Some(ErrorKind::UnknownFeature));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_blank_text_is_rejected_before_upstream() {
        let client = ScriptedClient::replying("unused");
        let envelope = router(client.clone())
            .dispatch("summarize", FeatureRequest::new("   \n"), RequestId::new())
            .await;

        assert_eq!(envelope.kind(), Some(ErrorKind::Validation));
        assert_eq!(envelope.detail(), Some("Invalid request: text cannot be empty"));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_bad_option_is_rejected_before_upstream() {
        let client = ScriptedClient::replying("unused");
        let request = FeatureRequest::new("hi").option("tone", "calm").option("intensity", 250i64);
        let envelope = router(client.clone())
            .dispatch("adjust-tone", request, RequestId::new())
            .await;

        assert_eq!(envelope.kind(), Some(ErrorKind::Validation));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_summarize_success_envelope() {
        let client = ScriptedClient::replying("  Rust is fast.  \n");
        let envelope = router(client.clone())
            .dispatch(
                "summarize",
                FeatureRequest::new("Rust is a fast and safe systems language"),
                RequestId::new(),
            )
            .await;

        assert!(envelope.is_success());
        assert_eq!(
            envelope.data(),
            Some(&NormalizedResponse::PlainText("Rust is fast.".to_string()))
        );
        let metadata = envelope.metadata().expect("summarize has metadata");
        assert_eq!(metadata["original_length"], 8);
        assert_eq!(metadata["summary_length"], 3);

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].params.temperature, 0.7);
        assert!(calls[0].prompt.ends_with("Summary:"));
    }

    #[tokio::test]
    async fn test_request_overrides_win_per_field() {
        let client = ScriptedClient::replying("ok");
        let request = FeatureRequest::new("Tell me a joke").temperature(0.1);
        router(client.clone())
            .dispatch("prompt", request, RequestId::new())
            .await;

        let params = client.calls()[0].params;
        assert_eq!(params.temperature, 0.1);
        assert_eq!(params.max_output_tokens, Some(1024));
    }

    #[tokio::test]
    async fn test_max_output_tokens_override_keeps_default_temperature() {
        let client = ScriptedClient::replying("Why did the chicken cross");
        let request = FeatureRequest::new("Tell me a joke").max_output_tokens(64);
        let envelope = router(client.clone())
            .dispatch("prompt", request, RequestId::new())
            .await;

        let calls = client.calls();
        let call = &calls[0];
        assert_eq!(call.params.temperature, 0.7);
        assert_eq!(call.params.max_output_tokens, Some(64));

        let metadata = envelope.metadata().expect("prompt has metadata");
        assert_eq!(metadata["max_tokens"], 64);
        assert_eq!(
            metadata["prompt_tokens"],
            call.prompt.split_whitespace().count()
        );
        assert_eq!(metadata["completion_tokens"], 5);
    }

    #[tokio::test]
    async fn test_rewrite_maps_creativity_onto_temperature() {
        let client = ScriptedClient::replying("ok");
        let request = FeatureRequest::new("text").option("creativity_level", 0.3);
        router(client.clone())
            .dispatch("rewrite", request, RequestId::new())
            .await;
        assert_eq!(client.calls()[0].params.temperature, 0.3);
    }

    #[tokio::test]
    async fn test_out_of_range_temperature_rejected() {
        let client = ScriptedClient::replying("ok");
        let request = FeatureRequest::new("text").temperature(1.7);
        let envelope = router(client.clone())
            .dispatch("simplify", request, RequestId::new())
            .await;
        assert_eq!(envelope.kind(), Some(ErrorKind::Validation));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_paraphrase_truncates_to_requested_count() {
        let client = ScriptedClient::replying("A---B---C");
        let request = FeatureRequest::new("text").option("num_variations", 2i64);
        let envelope = router(client)
            .dispatch("paraphrase", request, RequestId::new())
            .await;

        assert_eq!(
            envelope.data(),
            Some(&NormalizedResponse::TextList(vec![
                "A".to_string(),
                "B".to_string()
            ]))
        );
    }

    #[tokio::test]
    async fn test_upstream_failure_becomes_failure_envelope() {
        let client = ScriptedClient::failing("API key not valid");
        let envelope = router(client)
            .dispatch_feature(FeatureId::Simplify, FeatureRequest::new("x"), RequestId::new())
            .await;

        assert_eq!(envelope.kind(), Some(ErrorKind::UpstreamUnavailable));
        assert_eq!(
            envelope.detail(),
            Some("Generation service unavailable: API key not valid")
        );
    }

    #[tokio::test]
    async fn test_streaming_default_collects_fragments() {
        let client = ScriptedClient::replying("Clearer text here");
        let envelope = router(client.clone())
            .dispatch("stream-rewrite", FeatureRequest::new("text"), RequestId::new())
            .await;

        assert_eq!(
            envelope.data(),
            Some(&NormalizedResponse::PlainText("Clearer text here".to_string()))
        );
        assert!(client.calls()[0].params.stream);
    }

    #[tokio::test]
    async fn test_dispatch_stream_yields_fragments_in_order() {
        let client = ScriptedClient::replying("one two three");
        let stream = router(client)
            .dispatch_stream("stream-rewrite", FeatureRequest::new("text"), RequestId::new())
            .await
            .expect("stream starts");

        let fragments: Vec<String> = stream.collect().await;
        assert_eq!(fragments, vec!["one ", "two ", "three"]);
    }

    #[tokio::test]
    async fn test_dispatch_stream_unknown_feature() {
        let client = ScriptedClient::replying("unused");
        let Err(envelope) = router(client.clone())
            .dispatch_stream("nope", FeatureRequest::new("text"), RequestId::new())
            .await
        else {
            panic!("unknown feature must not start a stream");
        };
        assert_eq!(envelope.kind(), Some(ErrorKind::UnknownFeature));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_image_feature_requires_attachment() {
        let client = ScriptedClient::replying("text");
        let envelope = router(client.clone())
            .dispatch("ocr", FeatureRequest::default(), RequestId::new())
            .await;
        assert_eq!(envelope.kind(), Some(ErrorKind::Validation));

        let request = FeatureRequest::with_attachment(Attachment::new("application/pdf", vec![1u8]));
        let envelope = router(client.clone())
            .dispatch("ocr", request, RequestId::new())
            .await;
        assert_eq!(envelope.kind(), Some(ErrorKind::Validation));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_image_feature_forwards_attachment() {
        let client = ScriptedClient::replying("cat\n\ndog\n");
        let request = FeatureRequest::with_attachment(Attachment::new("image/png", vec![1u8, 2]));
        let envelope = router(client.clone())
            .dispatch("detect-objects", request, RequestId::new())
            .await;

        assert_eq!(
            envelope.data(),
            Some(&NormalizedResponse::TextList(vec![
                "cat".to_string(),
                "dog".to_string()
            ]))
        );
        let calls = client.calls();
        assert_eq!(calls[0].attachment.as_ref().map(Attachment::len), Some(2));
    }
}
