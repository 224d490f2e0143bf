//! Clients for the external services a narrated video is built from.
//!
//! - [`tts`]: speech synthesis through the `edge-tts` CLI
//! - [`stock`]: Pexels and Pixabay stock footage search
//! - [`llm`]: Gemini text and JSON completions
//! - [`image`]: Pollinations prompt-to-image generation
//! - [`download`]: streaming asset downloads
//!
//! Every client sits behind an `async_trait` so the pipeline can swap in fakes.

pub mod download;
pub mod error;
pub mod image;
pub mod llm;
pub mod stock;
pub mod tts;

pub use download::{http_client, AssetDownloader, HttpDownloader};
pub use error::{AiError, AiResult};
pub use image::{ImageGenerator, PollinationsClient, PollinationsConfig};
pub use llm::{
    sanitize_endpoint, strip_code_fences, GeminiClient, GeminiConfig, LanguageModel,
    DEFAULT_GEMINI_MODEL,
};
pub use stock::{
    PexelsClient, PexelsConfig, PixabayClient, PixabayConfig, StockCandidate, StockProvider,
};
pub use tts::{resolve_voice, EdgeTts, TextToSpeech, DEFAULT_VOICE_ID, VOICE_TABLE};
