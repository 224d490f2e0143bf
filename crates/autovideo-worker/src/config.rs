//! Worker configuration.

use autovideo_ai::DEFAULT_GEMINI_MODEL;
use autovideo_models::caption::CAPTION_LINE_WIDTH;
use autovideo_models::ProviderCredentials;
use std::path::PathBuf;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Parent of per-job temporary directories (system temp when unset)
    pub work_dir: Option<PathBuf>,
    /// Where finished videos are published
    pub output_dir: PathBuf,
    /// Results requested from each stock provider
    pub stock_per_page: u32,
    /// Keyword phrases extracted per scene
    pub max_keywords: usize,
    /// Caption line width in characters
    pub caption_width: usize,
    /// Text-to-speech executable
    pub tts_command: String,
    /// Seed for stock provider ordering; random when unset
    pub shuffle_seed: Option<u64>,
    /// Capacity of the pipeline event channel
    pub event_buffer: usize,
    pub gemini_model: String,
    /// Credentials used when a job does not carry its own
    pub credentials: ProviderCredentials,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: None,
            output_dir: PathBuf::from("./output"),
            stock_per_page: 3,
            max_keywords: 3,
            caption_width: CAPTION_LINE_WIDTH,
            tts_command: "edge-tts".to_string(),
            shuffle_seed: None,
            event_buffer: 256,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            credentials: ProviderCredentials::default(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("AUTOVIDEO_WORK_DIR")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            output_dir: std::env::var("AUTOVIDEO_OUTPUT_DIR")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            stock_per_page: std::env::var("AUTOVIDEO_STOCK_PER_PAGE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.stock_per_page),
            max_keywords: std::env::var("AUTOVIDEO_MAX_KEYWORDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_keywords),
            caption_width: std::env::var("AUTOVIDEO_CAPTION_WIDTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.caption_width),
            tts_command: std::env::var("AUTOVIDEO_TTS_COMMAND")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.tts_command),
            shuffle_seed: std::env::var("AUTOVIDEO_SHUFFLE_SEED")
                .ok()
                .and_then(|s| s.parse().ok()),
            event_buffer: std::env::var("AUTOVIDEO_EVENT_BUFFER")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.event_buffer),
            gemini_model: std::env::var("GEMINI_MODEL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.gemini_model),
            credentials: credentials_from_env(),
        }
    }
}

/// Provider credentials from `PEXELS_API_KEY`, `PIXABAY_API_KEY`,
/// `GEMINI_API_KEY` and `GEMINI_API_ENDPOINT`.
pub fn credentials_from_env() -> ProviderCredentials {
    ProviderCredentials {
        pexels_api_key: std::env::var("PEXELS_API_KEY").ok(),
        pixabay_api_key: std::env::var("PIXABAY_API_KEY").ok(),
        gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
        gemini_endpoint: std::env::var("GEMINI_API_ENDPOINT").ok(),
    }
    // Drops blank values
    .or(ProviderCredentials::default())
}
