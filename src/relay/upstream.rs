//! Upstream completion API.
//!
//! The provider response is kept as an untyped [`Value`]; its shape is
//! handled by [`super::extract`].

use super::RelayRequest;
use crate::config::{Settings, ToolChoice};
use crate::error::{RelayError, Result};
use crate::openai::{create_config, create_http_client};
use async_openai::config::{Config, OpenAIConfig};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, error, instrument};

/// Longest slice of a provider error body kept for logging.
const SNIPPET_LEN: usize = 300;

/// A provider able to answer a query against a vector store.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    /// Run one non-streaming completion and return the raw response.
    async fn create_response(&self, request: &RelayRequest) -> Result<Value>;
}

#[derive(Debug, Serialize)]
struct FileSearchTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    vector_store_ids: Vec<&'a str>,
    max_num_results: u32,
}

#[derive(Debug, Serialize)]
struct CreateResponseBody<'a> {
    model: &'a str,
    input: &'a str,
    tools: Vec<FileSearchTool<'a>>,
    tool_choice: ToolChoice,
    stream: bool,
}

impl<'a> CreateResponseBody<'a> {
    fn new(request: &'a RelayRequest, tool_choice: ToolChoice) -> Self {
        Self {
            model: &request.model,
            input: &request.query,
            tools: vec![FileSearchTool {
                kind: "file_search",
                vector_store_ids: vec![request.vector_store_id.as_str()],
                max_num_results: request.top_k,
            }],
            tool_choice,
            stream: false,
        }
    }
}

/// Client for the OpenAI Responses API with the file search tool.
pub struct OpenAIResponses {
    http: reqwest::Client,
    config: OpenAIConfig,
    tool_choice: ToolChoice,
    timeout: Duration,
}

impl OpenAIResponses {
    /// Create a client from settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        let timeout = settings.openai.timeout();
        Ok(Self {
            http: create_http_client(timeout)?,
            config: create_config(&settings.openai)?,
            tool_choice: settings.openai.tool_choice,
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        self.config.url("/responses")
    }
}

#[async_trait]
impl CompletionApi for OpenAIResponses {
    #[instrument(skip(self, request), fields(model = %request.model, top_k = request.top_k))]
    async fn create_response(&self, request: &RelayRequest) -> Result<Value> {
        let started = Instant::now();
        let url = self.endpoint();
        let body = CreateResponseBody::new(request, self.tool_choice);

        debug!(query_len = request.query.len(), "POST {}", url);

        let resp = self
            .http
            .post(&url)
            .headers(self.config.headers())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RelayError::UpstreamTimeout(self.timeout)
                } else {
                    RelayError::Http(e)
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);
            error!(
                %status,
                %snippet,
                latency_ms = started.elapsed().as_millis() as u64,
                "Responses API returned non-success status"
            );
            return Err(RelayError::upstream_status(status.as_u16(), snippet));
        }

        let value: Value = resp.json().await?;

        if let Some(err) = value.get("error").filter(|e| !e.is_null()) {
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("response carried an error object")
                .to_string();
            error!(%message, "Responses API reported a failed response");
            return Err(RelayError::Upstream {
                status: None,
                message,
            });
        }

        debug!(
            latency_ms = started.elapsed().as_millis() as u64,
            "Responses API call completed"
        );
        Ok(value)
    }
}

/// Shorten a provider body for logs, on a char boundary.
fn make_snippet(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(SNIPPET_LEN) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    fn request() -> RelayRequest {
        RelayRequest {
            query: "what is the refund policy?".to_string(),
            vector_store_id: "vs_123".to_string(),
            model: "gpt-4.1-mini".to_string(),
            top_k: 6,
        }
    }

    #[test]
    fn test_request_body_shape() {
        let req = request();
        let body = serde_json::to_value(CreateResponseBody::new(&req, ToolChoice::Auto)).unwrap();

        assert_eq!(
            body,
            json!({
                "model": "gpt-4.1-mini",
                "input": "what is the refund policy?",
                "tools": [{
                    "type": "file_search",
                    "vector_store_ids": ["vs_123"],
                    "max_num_results": 6
                }],
                "tool_choice": "auto",
                "stream": false
            })
        );
    }

    #[test]
    fn test_required_tool_choice() {
        let req = request();
        let body =
            serde_json::to_value(CreateResponseBody::new(&req, ToolChoice::Required)).unwrap();
        assert_eq!(body["tool_choice"], "required");
    }

    #[test]
    fn test_client_needs_api_key() {
        let settings = Settings::default();
        assert!(matches!(
            OpenAIResponses::new(&settings),
            Err(RelayError::Config(_))
        ));
    }

    #[test]
    fn test_endpoint_from_base() {
        let mut settings = Settings::default();
        settings.openai.api_key = Some("sk-test".to_string());
        settings.openai.api_base = "http://127.0.0.1:9999/v1".to_string();
        let client = OpenAIResponses::new(&settings).unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:9999/v1/responses");
    }

    #[test]
    fn test_make_snippet() {
        assert_eq!(make_snippet("  short  "), "short");
        let long = "é".repeat(SNIPPET_LEN + 10);
        let snippet = make_snippet(&long);
        assert!(snippet.ends_with("..."));
        assert_eq!(snippet.chars().count(), SNIPPET_LEN + 3);
    }

    /// Serve `router` on a random local port and return its `/v1` base URL.
    async fn spawn_provider(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    fn client_for(api_base: String, timeout_secs: u64) -> OpenAIResponses {
        let mut settings = Settings::default();
        settings.openai.api_key = Some("sk-test-key".to_string());
        settings.openai.api_base = api_base;
        settings.openai.timeout_secs = timeout_secs;
        OpenAIResponses::new(&settings).unwrap()
    }

    #[tokio::test]
    async fn test_posts_request_to_provider() {
        let router = Router::new().route(
            "/v1/responses",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let auth = headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({ "output_text": "Yes, 30 days.", "auth": auth, "sent": body }))
            }),
        );
        let client = client_for(spawn_provider(router).await, 5);

        let value = client.create_response(&request()).await.unwrap();
        assert_eq!(value["output_text"], "Yes, 30 days.");
        assert_eq!(value["auth"], "Bearer sk-test-key");
        assert_eq!(value["sent"]["model"], "gpt-4.1-mini");
        assert_eq!(value["sent"]["tools"][0]["vector_store_ids"], json!(["vs_123"]));
        assert_eq!(value["sent"]["tools"][0]["max_num_results"], 6);
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_error() {
        let router = Router::new().route(
            "/v1/responses",
            post(|| async {
                (StatusCode::UNAUTHORIZED, "invalid api key sk-test-key").into_response()
            }),
        );
        let client = client_for(spawn_provider(router).await, 5);

        let err = client.create_response(&request()).await.unwrap_err();
        assert!(matches!(err, RelayError::Upstream { status: Some(401), .. }));
        let detail = err.client_detail().unwrap();
        assert_eq!(detail, "upstream returned HTTP 401");
        assert!(!detail.contains("sk-test-key"));
    }

    #[tokio::test]
    async fn test_error_object_is_upstream_error() {
        let router = Router::new().route(
            "/v1/responses",
            post(|| async { Json(json!({ "error": { "message": "boom" } })) }),
        );
        let client = client_for(spawn_provider(router).await, 5);

        let err = client.create_response(&request()).await.unwrap_err();
        assert!(matches!(err, RelayError::Upstream { status: None, .. }));
        assert_eq!(err.client_detail().as_deref(), Some("upstream request failed"));
    }

    #[tokio::test]
    async fn test_null_error_field_is_success() {
        let router = Router::new().route(
            "/v1/responses",
            post(|| async { Json(json!({ "error": null, "output_text": "ok" })) }),
        );
        let client = client_for(spawn_provider(router).await, 5);

        let value = client.create_response(&request()).await.unwrap();
        assert_eq!(value["output_text"], "ok");
    }

    #[tokio::test]
    async fn test_invalid_json_body_fails() {
        let router = Router::new().route("/v1/responses", post(|| async { "not json" }));
        let client = client_for(spawn_provider(router).await, 5);

        let err = client.create_response(&request()).await.unwrap_err();
        assert!(matches!(err, RelayError::Http(_)));
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.client_detail().as_deref(), Some("upstream request failed"));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let router = Router::new().route(
            "/v1/responses",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({ "output_text": "too late" }))
            }),
        );
        let client = client_for(spawn_provider(router).await, 1);

        let err = client.create_response(&request()).await.unwrap_err();
        assert!(matches!(err, RelayError::UpstreamTimeout(_)));
        assert_eq!(
            err.client_detail().as_deref(),
            Some("upstream request timed out after 1s")
        );
    }

    #[tokio::test]
    async fn test_unreachable_provider_fails() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = client_for(format!("http://{}/v1", addr), 5);

        let err = client.create_response(&request()).await.unwrap_err();
        assert_eq!(err.client_detail().as_deref(), Some("upstream request failed"));
    }
}
