//! Pipeline error types.
//!
//! [`PipelineError`] is what a job returns when it cannot produce a video.
//! The remaining types describe failures the pipeline recovers from; they are
//! logged and emitted as events but never returned to the caller.

use autovideo_ai::AiError;
use autovideo_media::MediaError;
use autovideo_models::JobRequestError;
use std::path::PathBuf;
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Script contains no sentences")]
    EmptyScript,

    #[error("Narration unavailable: {0}")]
    NarrationUnavailable(String),

    #[error("Encoding failed (primary: {primary}; software fallback: {fallback})")]
    EncodingFailure { primary: String, fallback: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] JobRequestError),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Service setup failed: {0}")]
    Service(#[from] AiError),

    #[error("Media error: {0}")]
    Media(MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn narration_unavailable(msg: impl Into<String>) -> Self {
        Self::NarrationUnavailable(msg.into())
    }

    pub fn invalid_manifest(msg: impl Into<String>) -> Self {
        Self::InvalidManifest(msg.into())
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::EmptyScript => "empty_script",
            PipelineError::NarrationUnavailable(_) => "narration_unavailable",
            PipelineError::EncodingFailure { .. } => "encoding_failure",
            PipelineError::InvalidRequest(_) => "invalid_request",
            PipelineError::InvalidManifest(_) => "invalid_manifest",
            PipelineError::Service(_) => "service",
            PipelineError::Media(_) => "media",
            PipelineError::Io(_) => "io",
        }
    }
}

impl From<MediaError> for PipelineError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::EncodingFailed { primary, fallback } => {
                PipelineError::EncodingFailure { primary, fallback }
            }
            other => PipelineError::Media(other),
        }
    }
}

/// A content strategy could not supply a visual for a scene.
#[derive(Debug, Error)]
#[error("{strategy} sourcing failed: {reason}")]
pub struct SourcingFailure {
    pub strategy: &'static str,
    pub reason: String,
}

impl SourcingFailure {
    pub fn new(strategy: &'static str, reason: impl Into<String>) -> Self {
        Self {
            strategy,
            reason: reason.into(),
        }
    }
}

/// Caption styling fell back to the default style.
#[derive(Debug, Error)]
pub enum StylingFailure {
    #[error("no language model configured")]
    NotConfigured,

    #[error("styling request failed: {0}")]
    Service(#[from] AiError),

    #[error("malformed styling response: {0}")]
    Malformed(String),
}

/// A scene render step failed and the next rung of the ladder was used.
#[derive(Debug, Error)]
#[error("scene {scene_index} {stage} render failed: {source}")]
pub struct CompositionFailure {
    pub scene_index: usize,
    pub stage: &'static str,
    #[source]
    pub source: MediaError,
}

/// A transient file or directory could not be removed.
#[derive(Debug, Error)]
#[error("failed to remove {}: {source}", path.display())]
pub struct CleanupFailure {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}
