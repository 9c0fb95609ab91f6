//! Integration tests for the JSON feature endpoints
//!
//! Drives the full axum application with `oneshot` against a scripted
//! completion client, so no network is involved.

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use neurowrite::completion::{CompletionClient, CompletionRequest, FragmentStream};
use neurowrite::config::Config;
use neurowrite::error::{AppError, AppResult};
use neurowrite::handlers::{self, AppState};
use neurowrite::middleware::REQUEST_ID_HEADER;
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Replies with a fixed text and records every prompt it receives
struct ScriptedClient {
    reply: Result<String, String>,
    prompts: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(reason.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<CompletionRequest> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> AppResult<String> {
        self.prompts.lock().unwrap().push(request.clone());
        self.reply.clone().map_err(AppError::upstream)
    }

    async fn stream(&self, request: &CompletionRequest) -> AppResult<FragmentStream> {
        self.prompts.lock().unwrap().push(request.clone());
        let text = self.reply.clone().map_err(AppError::upstream)?;
        Ok(FragmentStream::from_fragments(vec![text], 4))
    }
}

fn test_config() -> Config {
    Config::from_str(
        r#"
[server]
host = "127.0.0.1"
port = 8001

[model]
name = "gemini-test"
"#,
    )
    .expect("test config is valid")
}

fn app(client: Arc<ScriptedClient>) -> Router {
    handlers::app(AppState::new(test_config(), client))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).expect("response body is JSON")
}

#[tokio::test]
async fn test_summarize_returns_success_envelope() {
    let client = ScriptedClient::replying("  Rust is fast and safe.\n");
    let response = app(client.clone())
        .oneshot(post_json(
            "/gemini/summarize",
            json!({"text": "Rust is a language empowering everyone to build reliable software", "length": "short"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], "Rust is fast and safe.");
    assert_eq!(body["metadata"]["original_length"], 10);
    assert_eq!(body["metadata"]["summary_length"], 5);
    assert_eq!(body["metadata"]["compression_ratio"], 0.5);
    assert_eq!(body["metadata"]["length"], "short");
    assert!(body.get("detail").is_none());

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].prompt.contains("in 2-3 sentences"));
}

#[tokio::test]
async fn test_unknown_feature_is_404_without_upstream_call() {
    let client = ScriptedClient::replying("unused");
    let response = app(client.clone())
        .oneshot(post_json("/features/teleport", json!({"text": "hi"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body, json!({"success": false, "detail": "Unknown feature 'teleport'"}));
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_generic_route_reaches_feature_by_identifier() {
    let client = ScriptedClient::replying("he go | agreement | he goes | verb must agree\nnoise");
    let response = app(client)
        .oneshot(post_json("/features/grammar-check", json!({"text": "he go home"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["data"],
        json!([{
            "error": "he go",
            "type": "agreement",
            "correction": "he goes",
            "explanation": "verb must agree"
        }])
    );
    assert_eq!(body["metadata"]["error_count"], 1);
}

#[tokio::test]
async fn test_empty_text_is_400() {
    let client = ScriptedClient::replying("unused");
    let response = app(client.clone())
        .oneshot(post_json("/gemini/rewrite/simplify", json!({"text": "   "})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["detail"], "Invalid request: text cannot be empty");
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_missing_required_option_is_400() {
    let client = ScriptedClient::replying("unused");
    let response = app(client.clone())
        .oneshot(post_json("/gemini/translate", json!({"text": "Hola"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["detail"], "Invalid request: target_language is required");
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_json_is_failure_envelope() {
    let client = ScriptedClient::replying("unused");
    let request = Request::builder()
        .method("POST")
        .uri("/gemini/summarize")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"text\": "))
        .unwrap();

    let response = app(client).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_missing_content_type_is_415() {
    let client = ScriptedClient::replying("unused");
    let request = Request::builder()
        .method("POST")
        .uri("/gemini/summarize")
        .body(Body::from(json!({"text": "hi"}).to_string()))
        .unwrap();

    let response = app(client).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_upstream_failure_is_502_with_message() {
    let client = ScriptedClient::failing("API key not valid. Please pass a valid API key.");
    let response = app(client)
        .oneshot(post_json("/gemini/proofread/auto-fix", json!({"text": "teh cat"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(
        body["detail"],
        "Generation service unavailable: API key not valid. Please pass a valid API key."
    );
}

#[tokio::test]
async fn test_paraphrase_returns_requested_number_of_variations() {
    let client = ScriptedClient::replying("First version.\n---\nSecond version.\n---\nThird version.\n---\n");
    let response = app(client)
        .oneshot(post_json(
            "/gemini/rewrite/paraphrase",
            json!({"text": "Original sentence.", "num_variations": 2}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"], json!(["First version.", "Second version."]));
    assert_eq!(body["metadata"]["count"], 2);
}

#[tokio::test]
async fn test_prompt_route_accepts_prompt_field_and_overrides() {
    let client = ScriptedClient::replying("42");
    let response = app(client.clone())
        .oneshot(post_json(
            "/gemini/prompt",
            json!({"prompt": "What is the answer?", "context": "Be brief.", "temperature": 0.2}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let calls = client.calls();
    assert_eq!(calls[0].prompt, "Be brief.\n\nWhat is the answer?");
    assert_eq!(calls[0].params.temperature, 0.2);
    assert_eq!(calls[0].params.max_output_tokens, Some(1024));
}

#[tokio::test]
async fn test_humanize_nested_options_disable_clauses() {
    let client = ScriptedClient::replying("Sounds human now.");
    let response = app(client.clone())
        .oneshot(post_json(
            "/gemini/rewrite/humanize",
            json!({"text": "Robotic text.", "options": {"idiom_integration": false}}),
        ))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(
        body["metadata"]["applied_options"],
        json!(["pattern_breaking", "natural_flow", "contraction_control", "emotional_tone"])
    );
    assert!(!client.calls()[0].prompt.contains("idioms"));
}

#[tokio::test]
async fn test_structured_text_passes_through_unparsed() {
    let raw = "```json\n{\"language\": \"Spanish\", \"code\": \"es\"}\n```";
    let client = ScriptedClient::replying(raw);
    let response = app(client)
        .oneshot(post_json("/gemini/translate/detect", json!({"text": "Hola amigo"})))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["data"], raw);
    assert_eq!(body["metadata"]["text_sample"], "Hola amigo");
}

#[tokio::test]
async fn test_language_list_and_health_need_no_upstream() {
    let client = ScriptedClient::replying("unused");

    let response = app(client.clone())
        .oneshot(
            Request::builder()
                .uri("/gemini/translate/languages")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(20));
    assert_eq!(body["data"][2], json!({"code": "fr", "name": "French"}));

    let response = app(client.clone())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!({"status": "healthy"}));

    let response = app(client.clone())
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let banner = body_json(response).await;
    assert_eq!(banner["status"], "running");
    assert_eq!(banner["model"], "gemini-test");
    assert_eq!(banner["features"].as_array().map(Vec::len), Some(25));

    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_caller_request_id_is_echoed() {
    let client = ScriptedClient::replying("ok");
    let id = "6f1c2a4e-9b7d-4c3e-8a2f-1d0e5b6c7a89";
    let request = Request::builder()
        .uri("/health")
        .header(REQUEST_ID_HEADER, id)
        .body(Body::empty())
        .unwrap();

    let response = app(client).oneshot(request).await.unwrap();
    assert_eq!(response.headers()[REQUEST_ID_HEADER], id);
}

#[tokio::test]
async fn test_ocr_accepts_raw_image_body() {
    let client = ScriptedClient::replying("  INVOICE #42  ");
    let request = Request::builder()
        .method("POST")
        .uri("/ai/vision/ocr")
        .header(header::CONTENT_TYPE, "image/png")
        .body(Body::from(vec![0x89u8, b'P', b'N', b'G']))
        .unwrap();

    let response = app(client.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"], "INVOICE #42");

    let calls = client.calls();
    let attachment = calls[0].attachment.as_ref().expect("image forwarded");
    assert_eq!(attachment.mime_type(), "image/png");
    assert_eq!(attachment.len(), 4);
    assert!(calls[0].prompt.starts_with("Extract all text from this image."));
}

#[tokio::test]
async fn test_vision_rejects_non_image_body() {
    let client = ScriptedClient::replying("unused");
    let request = Request::builder()
        .method("POST")
        .uri("/ai/vision/describe")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("not an image"))
        .unwrap();

    let response = app(client.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_vision_rejects_empty_body() {
    let client = ScriptedClient::replying("unused");
    let request = Request::builder()
        .method("POST")
        .uri("/ai/vision/objects")
        .header(header::CONTENT_TYPE, "image/jpeg")
        .body(Body::empty())
        .unwrap();

    let response = app(client.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(client.calls().is_empty());
}
