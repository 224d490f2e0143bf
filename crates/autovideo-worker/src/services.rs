//! External services a job runs against.

use autovideo_ai::{
    http_client, AssetDownloader, EdgeTts, GeminiClient, GeminiConfig, HttpDownloader,
    ImageGenerator, LanguageModel, PexelsClient, PexelsConfig, PixabayClient, PixabayConfig,
    PollinationsClient, PollinationsConfig, StockProvider, TextToSpeech,
};
use autovideo_media::{
    FfmpegRunner, FfmpegToolkit, FfmpegVideoEncoder, HardwareProbe, MediaToolkit,
    SystemHardwareProbe, VideoEncoder,
};
use autovideo_models::ProviderCredentials;
use std::sync::Arc;
use tracing::info;

use crate::config::WorkerConfig;
use crate::error::PipelineResult;

/// Every collaborator of the pipeline, behind its trait.
///
/// Absent credentials leave the matching service out: no stock providers
/// without keys, no language model or image generation without a Gemini key.
#[derive(Clone)]
pub struct PipelineServices {
    pub tts: Arc<dyn TextToSpeech>,
    pub stock_providers: Vec<Arc<dyn StockProvider>>,
    pub downloader: Arc<dyn AssetDownloader>,
    pub language_model: Option<Arc<dyn LanguageModel>>,
    pub image_generator: Option<Arc<dyn ImageGenerator>>,
    pub media: Arc<dyn MediaToolkit>,
    pub hardware: Arc<dyn HardwareProbe>,
    pub encoder: Arc<dyn VideoEncoder>,
}

impl PipelineServices {
    /// Production services for one set of credentials.
    pub fn from_credentials(
        config: &WorkerConfig,
        credentials: &ProviderCredentials,
    ) -> PipelineResult<Self> {
        let http = http_client()?;
        let downloader: Arc<dyn AssetDownloader> = Arc::new(HttpDownloader::new(http.clone()));

        let mut stock_providers: Vec<Arc<dyn StockProvider>> = Vec::new();
        if let Some(key) = &credentials.pexels_api_key {
            stock_providers.push(Arc::new(PexelsClient::new(http.clone(), PexelsConfig::new(key))));
        }
        if let Some(key) = &credentials.pixabay_api_key {
            stock_providers.push(Arc::new(PixabayClient::new(http.clone(), PixabayConfig::new(key))));
        }

        let (language_model, image_generator) = match &credentials.gemini_api_key {
            Some(key) if credentials.has_gemini() => {
                let mut gemini = GeminiConfig::new(key).with_model(&config.gemini_model);
                if let Some(endpoint) = &credentials.gemini_endpoint {
                    gemini = gemini.with_endpoint(endpoint);
                }
                let model: Arc<dyn LanguageModel> = Arc::new(GeminiClient::new(http.clone(), gemini));
                let images: Arc<dyn ImageGenerator> = Arc::new(PollinationsClient::new(
                    downloader.clone(),
                    image_config(config),
                ));
                (Some(model), Some(images))
            }
            _ => (None, None),
        };

        info!(
            stock_providers = stock_providers.len(),
            language_model = language_model.is_some(),
            image_generator = image_generator.is_some(),
            "Pipeline services configured"
        );

        let runner = FfmpegRunner::new();
        Ok(Self {
            tts: Arc::new(EdgeTts::new(&config.tts_command)),
            stock_providers,
            downloader,
            language_model,
            image_generator,
            media: Arc::new(FfmpegToolkit::new(runner.clone())),
            hardware: Arc::new(SystemHardwareProbe::new()),
            encoder: Arc::new(FfmpegVideoEncoder::new(runner)),
        })
    }
}

/// Image generation follows the worker's shuffle seed so seeded runs repeat.
fn image_config(config: &WorkerConfig) -> PollinationsConfig {
    PollinationsConfig::default().with_seed(config.shuffle_seed)
}
