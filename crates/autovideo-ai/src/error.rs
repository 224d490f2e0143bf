//! Error types for external service clients.

use thiserror::Error;

pub type AiResult<T> = Result<T, AiError>;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("{service} request failed: {message}")]
    RequestFailed {
        service: &'static str,
        status: Option<u16>,
        message: String,
    },

    #[error("Invalid response from {service}: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },

    #[error("Speech synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Download failed for {url}: {message}")]
    DownloadFailed { url: String, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AiError {
    pub fn request_failed(service: &'static str, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            service,
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response(service: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            service,
            message: message.into(),
        }
    }

    pub fn synthesis_failed(message: impl Into<String>) -> Self {
        Self::SynthesisFailed(message.into())
    }

    pub fn download_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            url: url.into(),
            message: message.into(),
        }
    }

    /// HTTP status of a failed request, when the service answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            AiError::RequestFailed { status, .. } => *status,
            AiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Turn a non-success response into an error carrying the body text.
pub(crate) async fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> AiResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body: String = body.chars().take(500).collect();
    Err(AiError::request_failed(
        service,
        Some(status.as_u16()),
        format!("{} returned {}: {}", service, status, body),
    ))
}
