//! Prompt-to-image generation through Pollinations.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::download::AssetDownloader;
use crate::error::AiResult;

/// Upper bound (exclusive) for per-request seeds.
const MAX_SEED: u32 = 1_000_000;

/// Generates a still image for a prompt.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, dest: &Path) -> AiResult<()>;
}

#[async_trait]
impl<T: ImageGenerator + ?Sized> ImageGenerator for Arc<T> {
    async fn generate(&self, prompt: &str, dest: &Path) -> AiResult<()> {
        (**self).generate(prompt, dest).await
    }
}

#[derive(Debug, Clone)]
pub struct PollinationsConfig {
    pub base_url: String,
    /// Fixed seed for a repeatable sequence of image seeds
    pub seed: Option<u64>,
}

impl Default for PollinationsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://image.pollinations.ai".to_string(),
            seed: None,
        }
    }
}

impl PollinationsConfig {
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

pub struct PollinationsClient<D> {
    downloader: D,
    config: PollinationsConfig,
    rng: Mutex<StdRng>,
}

impl<D: AssetDownloader> PollinationsClient<D> {
    pub fn new(downloader: D, config: PollinationsConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            downloader,
            config,
            rng: Mutex::new(rng),
        }
    }

    fn next_seed(&self) -> u32 {
        match self.rng.lock() {
            Ok(mut rng) => rng.random_range(0..MAX_SEED),
            Err(poisoned) => poisoned.into_inner().random_range(0..MAX_SEED),
        }
    }

    /// URL for a prompt with an explicit seed.
    pub fn image_url(&self, prompt: &str, seed: u32) -> String {
        format!(
            "{}/prompt/{}?seed={}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(prompt.trim()),
            seed
        )
    }
}

#[async_trait]
impl<D: AssetDownloader> ImageGenerator for PollinationsClient<D> {
    async fn generate(&self, prompt: &str, dest: &Path) -> AiResult<()> {
        let seed = self.next_seed();
        let url = self.image_url(prompt, seed);
        debug!(seed, prompt, "Requesting generated image");
        self.downloader.download(&url, dest).await
    }
}
