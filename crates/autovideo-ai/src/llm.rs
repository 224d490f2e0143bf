//! Gemini language model client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::error::{check_status, AiError, AiResult};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// A text completion service.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Free-form completion, trimmed.
    async fn complete_text(&self, prompt: &str) -> AiResult<String>;

    /// Completion parsed as a JSON value. Markdown fences are tolerated.
    async fn complete_json(&self, prompt: &str) -> AiResult<serde_json::Value>;
}

#[async_trait]
impl<T: LanguageModel + ?Sized> LanguageModel for Arc<T> {
    async fn complete_text(&self, prompt: &str) -> AiResult<String> {
        (**self).complete_text(prompt).await
    }

    async fn complete_json(&self, prompt: &str) -> AiResult<serde_json::Value> {
        (**self).complete_json(prompt).await
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
        }
    }

    /// Override the service root. Full method URLs are reduced to their origin.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.base_url = sanitize_endpoint(endpoint);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Normalize a user-supplied Gemini endpoint.
///
/// A Google API URL that already names a model (`.../v1beta/models/x:generateContent`)
/// is cut back to `scheme://host`. Anything else only loses trailing slashes.
pub fn sanitize_endpoint(endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    if endpoint.contains("googleapis.com") && endpoint.contains("/models/") {
        if let Ok(url) = Url::parse(endpoint) {
            if let Some(host) = url.host_str() {
                return match url.port() {
                    Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
                    None => format!("{}://{}", url.scheme(), host),
                };
            }
        }
    }
    endpoint.trim_end_matches('/').to_string()
}

/// Remove a surrounding Markdown code fence (```` ```json ... ``` ````).
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (`json`, `JSON`, ...) on the opening line
    let rest = match rest.find('\n') {
        Some(newline) if rest[..newline].chars().all(|c| c.is_ascii_alphanumeric()) => {
            &rest[newline + 1..]
        }
        _ => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(http: Client, config: GeminiConfig) -> Self {
        Self { http, config }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str, mime_type: Option<&str>) -> AiResult<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: mime_type.map(|m| GenerationConfig {
                response_mime_type: m.to_string(),
            }),
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await?;
        let body: GeminiResponse = check_status("gemini", response).await?.json().await?;

        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AiError::invalid_response("gemini", "no content in response"))?;

        debug!(model = %self.config.model, chars = text.len(), "Gemini completion received");
        Ok(text)
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn complete_text(&self, prompt: &str) -> AiResult<String> {
        let text = self.generate(prompt, None).await?;
        Ok(text.trim().to_string())
    }

    async fn complete_json(&self, prompt: &str) -> AiResult<serde_json::Value> {
        let text = self.generate(prompt, Some("application/json")).await?;
        serde_json::from_str(strip_code_fences(&text)).map_err(|e| {
            AiError::invalid_response("gemini", format!("failed to parse JSON: {}", e))
        })
    }
}
