//! Error types for media operations.

use autovideo_models::FrameSize;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid media file: {0}")]
    InvalidMedia(String),

    #[error("Rendered frame is {actual}, expected {expected}")]
    DimensionMismatch {
        expected: FrameSize,
        actual: FrameSize,
    },

    #[error("Encoding failed (primary: {primary}; software retry: {fallback})")]
    EncodingFailed { primary: String, fallback: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an invalid media error.
    pub fn invalid_media(message: impl Into<String>) -> Self {
        Self::InvalidMedia(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the error means the FFmpeg toolchain itself is missing.
    pub fn is_toolchain_missing(&self) -> bool {
        matches!(self, MediaError::FfmpegNotFound | MediaError::FfprobeNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MediaError::DimensionMismatch {
            expected: FrameSize::new(1920, 1080),
            actual: FrameSize::new(1280, 720),
        };
        assert_eq!(err.to_string(), "Rendered frame is 1280x720, expected 1920x1080");

        let err = MediaError::ffmpeg_failed("exit 1", Some("bad filter".into()), Some(1));
        assert!(err.to_string().contains("exit 1"));
        assert!(!err.is_toolchain_missing());
        assert!(MediaError::FfmpegNotFound.is_toolchain_missing());
    }
}
