//! Ollama enrichment backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use marque_core::{
    defaults, Enricher, Enrichment, EnrichmentRequest, Error, RawEnrichment, Result,
};

use crate::prompt::{build_prompt, SYSTEM_PROMPT};

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = defaults::OLLAMA_URL;

/// Default generation model.
pub const DEFAULT_GEN_MODEL: &str = defaults::GEN_MODEL;

/// Ollama-backed bookmark enricher.
///
/// Uses the `/api/chat` endpoint with JSON format enforcement, which keeps
/// thinking models (gpt-oss, qwen3) from leaking reasoning into the output.
pub struct OllamaEnricher {
    client: Client,
    base_url: String,
    model: String,
    model_version: String,
    timeout_secs: u64,
}

impl OllamaEnricher {
    /// Create a new enricher with default settings.
    pub fn new() -> Self {
        Self::with_config(DEFAULT_OLLAMA_URL.to_string(), DEFAULT_GEN_MODEL.to_string())
    }

    /// Create a new enricher with custom endpoint and model.
    pub fn with_config(base_url: String, model: String) -> Self {
        let timeout_secs = std::env::var("MARQUE_ENRICH_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::ENRICH_TIMEOUT_SECS);

        // Build without a client-wide timeout; the per-request timeout below
        // is the one that matters.
        let client = Client::new();

        info!(
            subsystem = "inference",
            component = "ollama",
            url = %base_url,
            model = %model,
            timeout_secs,
            "Initializing Ollama enricher"
        );

        // Version string travels with every content row for audit; Ollama
        // model tags double as the version identifier.
        let model_version = model
            .split_once(':')
            .map(|(_, tag)| tag.to_string())
            .unwrap_or_else(|| "latest".to_string());

        Self {
            client,
            base_url,
            model,
            model_version,
            timeout_secs,
        }
    }

    /// Create from environment variables (`OLLAMA_BASE`, `OLLAMA_GEN_MODEL`).
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("OLLAMA_BASE").unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string());
        let model =
            std::env::var("OLLAMA_GEN_MODEL").unwrap_or_else(|_| DEFAULT_GEN_MODEL.to_string());
        Self::with_config(base_url, model)
    }

    async fn chat(&self, system: &str, prompt: &str) -> Result<String> {
        let start = Instant::now();

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            stream: false,
            format: Some(serde_json::json!("json")),
            think: Some(false),
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Enrichment(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Enrichment(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Enrichment(format!("Failed to parse response: {}", e)))?;

        let content = result.message.content;
        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            response_len = content.len(),
            duration_ms = elapsed,
            "Enrichment generation complete"
        );
        if elapsed > 30_000 {
            warn!(
                duration_ms = elapsed,
                prompt_len = prompt.len(),
                slow = true,
                "Slow enrichment generation"
            );
        }
        Ok(content)
    }
}

impl Default for OllamaEnricher {
    fn default() -> Self {
        Self::new()
    }
}

/// Chat API message for `/api/chat`.
#[derive(Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Request payload for the Ollama `/api/chat` endpoint.
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    /// Ollama format enforcement. Set to `"json"` for guaranteed valid JSON output.
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<serde_json::Value>,
    /// Disable thinking/reasoning for models that support it.
    #[serde(skip_serializing_if = "Option::is_none")]
    think: Option<bool>,
}

/// Response from the Ollama `/api/chat` endpoint.
#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[async_trait]
impl Enricher for OllamaEnricher {
    #[instrument(skip(self, req), fields(subsystem = "inference", component = "ollama", op = "enrich", model = %self.model, url = %req.url()))]
    async fn enrich(&self, req: &EnrichmentRequest) -> Result<Enrichment> {
        let prompt = build_prompt(req);
        let raw_json = self.chat(SYSTEM_PROMPT, &prompt).await?;

        // Shape deviations become validation errors, never silent partials.
        let raw: RawEnrichment = serde_json::from_str(&raw_json).map_err(|e| {
            Error::EnrichmentValidation(format!("model output is not valid JSON: {}", e))
        })?;
        raw.validate()
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn model_version(&self) -> &str {
        &self.model_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chat_reply(content: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": {
                "role": "assistant",
                "content": content.to_string(),
            }
        }))
    }

    fn content_request() -> EnrichmentRequest {
        EnrichmentRequest::Content {
            url: "https://example.com/post".to_string(),
            title: Some("A Post".to_string()),
            meta_description: None,
            content_text: Some("Article text about Rust.".to_string()),
        }
    }

    #[tokio::test]
    async fn test_enrich_parses_and_validates_model_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "stream": false,
                "format": "json",
                "think": false,
            })))
            .respond_with(chat_reply(serde_json::json!({
                "title": "A Post",
                "language": "en",
                "category": "technology",
                "tags": ["rust", " systems "],
                "summary_short": "One sentence.",
                "summary_long": "One paragraph."
            })))
            .mount(&server)
            .await;

        let enricher = OllamaEnricher::with_config(server.uri(), "gpt-oss:20b".to_string());
        let enrichment = enricher.enrich(&content_request()).await.unwrap();
        assert_eq!(enrichment.title, "A Post");
        assert_eq!(enrichment.language, "en");
        assert_eq!(enrichment.tags, vec!["rust", "systems"]);
        assert_eq!(enrichment.category.as_deref(), Some("technology"));
    }

    #[tokio::test]
    async fn test_enrich_rejects_non_json_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": { "role": "assistant", "content": "Sure! Here is the summary..." }
            })))
            .mount(&server)
            .await;

        let enricher = OllamaEnricher::with_config(server.uri(), "gpt-oss:20b".to_string());
        let err = enricher.enrich(&content_request()).await.unwrap_err();
        assert!(matches!(err, Error::EnrichmentValidation(_)));
    }

    #[tokio::test]
    async fn test_enrich_rejects_missing_required_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(chat_reply(serde_json::json!({
                "language": "en",
                "tags": ["rust"]
            })))
            .mount(&server)
            .await;

        let enricher = OllamaEnricher::with_config(server.uri(), "gpt-oss:20b".to_string());
        let err = enricher.enrich(&content_request()).await.unwrap_err();
        assert!(matches!(err, Error::EnrichmentValidation(_)));
        assert!(err.to_string().contains("title"));
    }

    #[tokio::test]
    async fn test_enrich_surfaces_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .mount(&server)
            .await;

        let enricher = OllamaEnricher::with_config(server.uri(), "gpt-oss:20b".to_string());
        let err = enricher.enrich(&content_request()).await.unwrap_err();
        match err {
            Error::Enrichment(msg) => assert!(msg.contains("model not loaded")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_model_version_from_tag() {
        let enricher =
            OllamaEnricher::with_config("http://localhost:1".to_string(), "gpt-oss:20b".to_string());
        assert_eq!(enricher.model_name(), "gpt-oss:20b");
        assert_eq!(enricher.model_version(), "20b");

        let untagged =
            OllamaEnricher::with_config("http://localhost:1".to_string(), "llama3".to_string());
        assert_eq!(untagged.model_version(), "latest");
    }
}
