//! Gemini `generateContent` adapter
//!
//! Talks to the REST API directly with reqwest. The model name and credential
//! are fixed at construction and never change afterwards.

use super::sse::SseDecoder;
use super::{CompletionClient, CompletionRequest, FragmentStream};
use crate::config::{ApiKey, Config};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::{Stream, StreamExt, stream};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::Display;
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";
const CONNECT_TIMEOUT_SECONDS: u64 = 10;

/// Production [`CompletionClient`] backed by the Gemini REST API
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: ApiKey,
    timeout_seconds: u64,
    stream_buffer: usize,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl GeminiClient {
    /// Build a client from validated configuration and a resolved credential
    pub fn new(config: &Config, api_key: ApiKey) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECONDS))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.model.base_url().to_string(),
            model: config.model.name().to_string(),
            api_key,
            timeout_seconds: config.server.request_timeout_seconds,
            stream_buffer: config.model.stream_buffer(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.model, method)
    }

    /// POST the request and fail on transport errors or non-2xx statuses
    async fn send(&self, url: &str, request: &CompletionRequest) -> AppResult<reqwest::Response> {
        let body = GenerateContentRequest::from_completion(request);

        tracing::debug!(
            model = %self.model,
            prompt_length = request.prompt.len(),
            temperature = request.params.temperature,
            max_output_tokens = ?request.params.max_output_tokens,
            stream = request.params.stream,
            has_attachment = request.attachment.is_some(),
            "Sending generation request"
        );

        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(model = %self.model, error = %e, "Generation request failed");
                AppError::upstream(format!("request to model {} failed: {}", self.model, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = upstream_error_message(&body)
                .unwrap_or_else(|| format!("HTTP {} from generation service", status.as_u16()));
            tracing::error!(
                model = %self.model,
                status = status.as_u16(),
                message = %message,
                "Generation service returned an error status"
            );
            return Err(AppError::upstream(message));
        }

        Ok(response)
    }

    async fn timed<T>(&self, call: impl Future<Output = AppResult<T>>) -> AppResult<T> {
        tokio::time::timeout(Duration::from_secs(self.timeout_seconds), call)
            .await
            .map_err(|_| AppError::UpstreamTimeout {
                timeout_seconds: self.timeout_seconds,
            })?
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, request: &CompletionRequest) -> AppResult<String> {
        let url = self.url("generateContent");
        self.timed(async {
            let response = self.send(&url, request).await?;
            let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
                AppError::upstream(format!("unreadable response from generation service: {}", e))
            })?;
            parsed.into_text()
        })
        .await
    }

    async fn stream(&self, request: &CompletionRequest) -> AppResult<FragmentStream> {
        let url = format!("{}?alt=sse", self.url("streamGenerateContent"));
        // only the wait for response headers is bounded; the body may take longer
        let response = self.timed(self.send(&url, request)).await?;
        let fragments = decode_event_stream(Box::pin(response.bytes_stream()));
        FragmentStream::start(fragments, self.stream_buffer).await
    }
}

/// Turn an SSE byte stream of partial `GenerateContentResponse`s into text fragments
pub(crate) fn decode_event_stream<S, B, E>(bytes: S) -> impl Stream<Item = AppResult<String>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    struct State<S> {
        bytes: S,
        decoder: SseDecoder,
        pending: VecDeque<AppResult<String>>,
        done: bool,
    }

    let initial = State {
        bytes,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(initial, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                if item.is_err() {
                    state.done = true;
                    state.pending.clear();
                }
                return Some((item, state));
            }
            if state.done {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    for payload in state.decoder.push(chunk.as_ref()) {
                        if let Some(item) = parse_event_payload(&payload) {
                            state.pending.push_back(item);
                        }
                    }
                }
                Some(Err(e)) => {
                    state.pending.push_back(Err(AppError::upstream(format!(
                        "stream interrupted: {}",
                        e
                    ))));
                }
                None => {
                    if let Some(item) = state.decoder.finish().and_then(|p| parse_event_payload(&p))
                    {
                        state.pending.push_back(item);
                    }
                    state.done = true;
                }
            }
        }
    })
}

/// Parse one SSE payload; `None` for payloads without text (e.g. usage-only events)
///
/// A blocked prompt carries no text either but is reported as an error.
fn parse_event_payload(payload: &str) -> Option<AppResult<String>> {
    let payload = payload.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }

    if let Some(message) = upstream_error_message(payload) {
        return Some(Err(AppError::upstream(message)));
    }

    match serde_json::from_str::<GenerateContentResponse>(payload) {
        Ok(chunk) => match chunk.text().filter(|t| !t.is_empty()) {
            Some(text) => Some(Ok(text)),
            None => chunk
                .block_reason()
                .map(|reason| Err(AppError::upstream(format!("prompt blocked: {}", reason)))),
        },
        Err(e) => Some(Err(AppError::upstream(format!(
            "unreadable stream event from generation service: {}",
            e
        )))),
    }
}

/// Extract `error.message` from a Gemini error body
fn upstream_error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let message = parsed.error.message.trim().to_string();
    (!message.is_empty()).then_some(message)
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

impl<'a> GenerateContentRequest<'a> {
    fn from_completion(request: &'a CompletionRequest) -> Self {
        let mut parts = vec![Part::Text {
            text: &request.prompt,
        }];
        if let Some(attachment) = &request.attachment {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: attachment.mime_type(),
                    data: BASE64.encode(attachment.data()),
                },
            });
        }

        Self {
            contents: vec![Content {
                role: "user",
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: request.params.temperature,
                max_output_tokens: request.params.max_output_tokens,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    InlineData {
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        Some(text)
    }

    fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }

    fn into_text(self) -> AppResult<String> {
        match self.text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => {
                if let Some(reason) = self.block_reason() {
                    return Err(AppError::upstream(format!("prompt blocked: {}", reason)));
                }
                let finish_reason = self
                    .candidates
                    .first()
                    .and_then(|c| c.finish_reason.as_deref())
                    .unwrap_or("none");
                Err(AppError::upstream(format!(
                    "generation service returned no content (finish reason: {})",
                    finish_reason
                )))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}
