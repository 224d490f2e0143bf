//! Scene visual sourcing.
//!
//! Strategies are tried in order until one yields a visual:
//!
//! ```text
//! stock footage -> AI image -> solid color placeholder
//! ```
//!
//! A strategy failure is a [`SourcingFailure`] value; it is logged, emitted
//! as an event and counted, then the next strategy runs.

use async_trait::async_trait;
use autovideo_ai::{AssetDownloader, ImageGenerator, LanguageModel, StockProvider};
use autovideo_media::{remove_if_exists, MediaToolkit};
use autovideo_models::{PipelineStep, Scene, StepOutcome, VisualAsset};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::error::SourcingFailure;
use crate::events::EventEmitter;
use crate::keywords::search_query;
use crate::metrics;
use crate::workspace::scene_file;

/// What a strategy knows about the scene it is sourcing for.
#[derive(Debug, Clone, Copy)]
pub struct SceneContext<'a> {
    pub scene: &'a Scene,
    pub genre: &'a str,
    pub keywords: &'a [String],
    /// Job workspace; downloads land here
    pub dir: &'a Path,
}

impl SceneContext<'_> {
    /// `"{genre} {keywords}"` search query.
    pub fn query(&self) -> String {
        search_query(self.genre, self.keywords)
    }

    fn file(&self, suffix: &str) -> PathBuf {
        scene_file(self.dir, self.scene.index, suffix)
    }
}

/// One rung of the fallback ladder.
#[async_trait]
pub trait ContentStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn resolve(&self, ctx: &SceneContext<'_>) -> Result<VisualAsset, SourcingFailure>;
}

// ---------------------------------------------------------------------------
// Stock footage
// ---------------------------------------------------------------------------

/// Searches every configured stock provider, in shuffled order, and accepts
/// the first candidate that downloads and decodes.
pub struct StockStrategy {
    providers: Vec<Arc<dyn StockProvider>>,
    downloader: Arc<dyn AssetDownloader>,
    media: Arc<dyn MediaToolkit>,
    per_page: u32,
    rng: Mutex<StdRng>,
}

impl StockStrategy {
    pub fn new(
        providers: Vec<Arc<dyn StockProvider>>,
        downloader: Arc<dyn AssetDownloader>,
        media: Arc<dyn MediaToolkit>,
        per_page: u32,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            providers,
            downloader,
            media,
            per_page,
            rng: Mutex::new(rng),
        }
    }

    /// Provider visiting order for one scene.
    fn provider_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.providers.len()).collect();
        match self.rng.lock() {
            Ok(mut rng) => order.shuffle(&mut *rng),
            Err(poisoned) => order.shuffle(&mut *poisoned.into_inner()),
        }
        order
    }

    async fn try_candidate(&self, url: &str, dest: &Path) -> Result<(), String> {
        self.downloader
            .download(url, dest)
            .await
            .map_err(|e| e.to_string())?;
        match self.media.probe_visual(dest).await {
            Ok(info) => {
                debug!(url, width = info.width, height = info.height, "Stock clip accepted");
                Ok(())
            }
            Err(e) => {
                remove_if_exists(dest).await;
                Err(format!("downloaded clip does not decode: {e}"))
            }
        }
    }
}

#[async_trait]
impl ContentStrategy for StockStrategy {
    fn name(&self) -> &'static str {
        "stock"
    }

    async fn resolve(&self, ctx: &SceneContext<'_>) -> Result<VisualAsset, SourcingFailure> {
        if self.providers.is_empty() {
            return Err(SourcingFailure::new(self.name(), "no stock providers configured"));
        }

        let query = ctx.query();
        let mut candidates = Vec::new();
        for i in self.provider_order() {
            let provider = &self.providers[i];
            match provider.search(&query, self.per_page).await {
                Ok(found) => {
                    debug!(provider = provider.name(), query = %query, results = found.len(), "Stock search");
                    candidates.extend(found);
                }
                // Provider errors count as empty results
                Err(e) => warn!(provider = provider.name(), error = %e, "Stock search failed"),
            }
        }

        let mut attempted = 0usize;
        for candidate in candidates {
            let dest = ctx.file(&format!("stock_{attempted}.mp4"));
            attempted += 1;
            match self.try_candidate(&candidate.url, &dest).await {
                Ok(()) => {
                    return Ok(VisualAsset::Stock {
                        source_url: candidate.url,
                        local_path: dest,
                    })
                }
                Err(reason) => {
                    warn!(scene_index = ctx.scene.index, url = %candidate.url, %reason, "Stock candidate rejected")
                }
            }
        }

        Err(SourcingFailure::new(
            self.name(),
            if attempted == 0 {
                format!("no results for '{query}'")
            } else {
                format!("none of {attempted} candidates for '{query}' were usable")
            },
        ))
    }
}

// ---------------------------------------------------------------------------
// AI image
// ---------------------------------------------------------------------------

/// Prompt asking the model for an image description.
pub fn image_prompt_request(sentence: &str, genre: &str) -> String {
    format!(
        "Create a vivid, cinematic image prompt for this scene: '{sentence}'. \
         Genre: {genre}. Keep it under 20 words."
    )
}

/// Asks the language model for an image prompt, then renders it.
pub struct AiImageStrategy {
    model: Arc<dyn LanguageModel>,
    images: Arc<dyn ImageGenerator>,
    media: Arc<dyn MediaToolkit>,
}

impl AiImageStrategy {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        images: Arc<dyn ImageGenerator>,
        media: Arc<dyn MediaToolkit>,
    ) -> Self {
        Self { model, images, media }
    }
}

#[async_trait]
impl ContentStrategy for AiImageStrategy {
    fn name(&self) -> &'static str {
        "ai_image"
    }

    async fn resolve(&self, ctx: &SceneContext<'_>) -> Result<VisualAsset, SourcingFailure> {
        let fail = |reason: String| SourcingFailure::new("ai_image", reason);

        let prompt = self
            .model
            .complete_text(&image_prompt_request(&ctx.scene.text, ctx.genre))
            .await
            .map_err(|e| fail(format!("prompt request failed: {e}")))?;
        let prompt = prompt.trim().trim_matches('"').trim().to_string();
        if prompt.is_empty() {
            return Err(fail("model returned an empty prompt".into()));
        }
        info!(scene_index = ctx.scene.index, prompt = %prompt, "Generated image prompt");

        let dest = ctx.file("ai.jpg");
        self.images
            .generate(&prompt, &dest)
            .await
            .map_err(|e| fail(format!("image generation failed: {e}")))?;

        if let Err(e) = self.media.probe_visual(&dest).await {
            remove_if_exists(&dest).await;
            return Err(fail(format!("generated image does not decode: {e}")));
        }

        Ok(VisualAsset::AiImage {
            prompt,
            local_path: dest,
        })
    }
}

// ---------------------------------------------------------------------------
// Placeholder
// ---------------------------------------------------------------------------

/// Flat dark color; never fails.
pub struct PlaceholderStrategy;

#[async_trait]
impl ContentStrategy for PlaceholderStrategy {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    async fn resolve(&self, _ctx: &SceneContext<'_>) -> Result<VisualAsset, SourcingFailure> {
        Ok(VisualAsset::placeholder())
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Runs the ladder for each scene.
pub struct SceneContentResolver {
    strategies: Vec<Box<dyn ContentStrategy>>,
}

impl SceneContentResolver {
    pub fn new(strategies: Vec<Box<dyn ContentStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// First successful strategy wins; a placeholder when the ladder runs out.
    pub async fn resolve(&self, ctx: &SceneContext<'_>, events: &EventEmitter) -> VisualAsset {
        let index = ctx.scene.index;
        for strategy in &self.strategies {
            match strategy.resolve(ctx).await {
                Ok(asset) => {
                    metrics::record_scene_visual(asset.kind().as_str());
                    events.emit_scene(
                        index,
                        PipelineStep::ContentSourcing,
                        StepOutcome::Succeeded,
                        format!("{} visual via {}", asset.kind().as_str(), strategy.name()),
                    );
                    return asset;
                }
                Err(failure) => {
                    warn!(scene_index = index, strategy = failure.strategy, reason = %failure.reason, "Sourcing failed, trying next strategy");
                    metrics::record_sourcing_failure(failure.strategy);
                    events.emit_scene(
                        index,
                        PipelineStep::ContentSourcing,
                        StepOutcome::FellBack,
                        failure.to_string(),
                    );
                }
            }
        }

        let asset = VisualAsset::placeholder();
        metrics::record_scene_visual(asset.kind().as_str());
        events.emit_scene(
            index,
            PipelineStep::ContentSourcing,
            StepOutcome::Succeeded,
            "placeholder visual",
        );
        asset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autovideo_ai::{AiError, AiResult, StockCandidate};
    use autovideo_media::{MediaError, MediaInfo, MediaResult, MixRequest, RenderedScene, SceneRenderRequest};
    use autovideo_models::{JobId, VisualKind};
    use tempfile::TempDir;

    struct FakeProvider {
        name: &'static str,
        urls: Vec<&'static str>,
        fail: bool,
    }

    #[async_trait]
    impl StockProvider for FakeProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn search(&self, _query: &str, _per_page: u32) -> AiResult<Vec<StockCandidate>> {
            if self.fail {
                return Err(AiError::request_failed("fake", Some(500), "boom"));
            }
            Ok(self
                .urls
                .iter()
                .map(|u| StockCandidate {
                    url: u.to_string(),
                    width: 1920,
                    height: 1080,
                })
                .collect())
        }
    }

    /// Writes the URL as the file body; URLs containing "broken" fail.
    struct FakeDownloader;

    #[async_trait]
    impl AssetDownloader for FakeDownloader {
        async fn download(&self, url: &str, dest: &Path) -> AiResult<()> {
            if url.contains("broken") {
                return Err(AiError::download_failed(url, "HTTP 404"));
            }
            tokio::fs::write(dest, url).await?;
            Ok(())
        }
    }

    /// Files whose contents mention "corrupt" do not decode.
    struct FakeMedia;

    #[async_trait]
    impl MediaToolkit for FakeMedia {
        async fn probe_duration(&self, _path: &Path) -> MediaResult<f64> {
            Ok(1.0)
        }

        async fn probe_visual(&self, path: &Path) -> MediaResult<MediaInfo> {
            let body = tokio::fs::read_to_string(path).await?;
            if body.contains("corrupt") {
                return Err(MediaError::invalid_media("no video stream"));
            }
            Ok(MediaInfo {
                duration: 1.0,
                width: 1920,
                height: 1080,
                fps: 24.0,
                video_codec: Some("h264".into()),
                audio_codec: None,
            })
        }

        async fn render_scene(&self, _request: &SceneRenderRequest) -> MediaResult<RenderedScene> {
            Err(MediaError::internal("unused"))
        }

        async fn mix_audio(&self, _request: &MixRequest) -> MediaResult<PathBuf> {
            Err(MediaError::internal("unused"))
        }
    }

    struct FakeModel(Option<&'static str>);

    #[async_trait]
    impl LanguageModel for FakeModel {
        async fn complete_text(&self, _prompt: &str) -> AiResult<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| AiError::request_failed("fake", Some(503), "down"))
        }

        async fn complete_json(&self, _prompt: &str) -> AiResult<serde_json::Value> {
            Err(AiError::invalid_response("fake", "unused"))
        }
    }

    struct FakeImages;

    #[async_trait]
    impl ImageGenerator for FakeImages {
        async fn generate(&self, prompt: &str, dest: &Path) -> AiResult<()> {
            tokio::fs::write(dest, prompt).await?;
            Ok(())
        }
    }

    fn stock(providers: Vec<FakeProvider>, seed: u64) -> StockStrategy {
        StockStrategy::new(
            providers
                .into_iter()
                .map(|p| Arc::new(p) as Arc<dyn StockProvider>)
                .collect(),
            Arc::new(FakeDownloader),
            Arc::new(FakeMedia),
            3,
            Some(seed),
        )
    }

    fn keywords() -> Vec<String> {
        vec!["cat".to_string()]
    }

    #[tokio::test]
    async fn test_stock_skips_broken_and_corrupt_candidates() {
        let dir = TempDir::new().unwrap();
        let scene = Scene::new(0, "A cat sleeps.", 2.0);
        let keywords = keywords();
        let ctx = SceneContext {
            scene: &scene,
            genre: "Nature",
            keywords: &keywords,
            dir: dir.path(),
        };
        let strategy = stock(
            vec![FakeProvider {
                name: "pexels",
                urls: vec!["https://cdn/broken.mp4", "https://cdn/corrupt.mp4", "https://cdn/good.mp4"],
                fail: false,
            }],
            1,
        );

        let asset = strategy.resolve(&ctx).await.unwrap();
        match asset {
            VisualAsset::Stock { source_url, local_path } => {
                assert_eq!(source_url, "https://cdn/good.mp4");
                assert!(local_path.exists());
            }
            other => panic!("unexpected {other:?}"),
        }
        // Rejected download removed immediately
        assert!(!dir.path().join("scene_000_stock_1.mp4").exists());
    }

    #[tokio::test]
    async fn test_stock_provider_errors_are_empty_results() {
        let dir = TempDir::new().unwrap();
        let scene = Scene::new(4, "A dog runs.", 1.0);
        let ctx = SceneContext {
            scene: &scene,
            genre: "Nature",
            keywords: &[],
            dir: dir.path(),
        };
        let strategy = stock(
            vec![
                FakeProvider {
                    name: "pexels",
                    urls: vec![],
                    fail: true,
                },
                FakeProvider {
                    name: "pixabay",
                    urls: vec!["https://cdn/dog.mp4"],
                    fail: false,
                },
            ],
            9,
        );
        let asset = strategy.resolve(&ctx).await.unwrap();
        assert_eq!(asset.kind(), VisualKind::Stock);
    }

    #[test]
    fn test_provider_order_is_seedable() {
        let make = |seed| {
            stock(
                (0..5)
                    .map(|_| FakeProvider {
                        name: "p",
                        urls: vec![],
                        fail: false,
                    })
                    .collect(),
                seed,
            )
        };
        let (a, b) = (make(42), make(42));
        for _ in 0..4 {
            let order = a.provider_order();
            assert_eq!(order, b.provider_order());
            let mut sorted = order.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, vec![0, 1, 2, 3, 4]);
        }
    }

    #[tokio::test]
    async fn test_ai_image_strategy() {
        let dir = TempDir::new().unwrap();
        let scene = Scene::new(1, "A cat sleeps.", 1.0);
        let ctx = SceneContext {
            scene: &scene,
            genre: "Nature",
            keywords: &[],
            dir: dir.path(),
        };

        let strategy = AiImageStrategy::new(
            Arc::new(FakeModel(Some("\"A tabby cat asleep in golden light\"\n"))),
            Arc::new(FakeImages),
            Arc::new(FakeMedia),
        );
        match strategy.resolve(&ctx).await.unwrap() {
            VisualAsset::AiImage { prompt, local_path } => {
                assert_eq!(prompt, "A tabby cat asleep in golden light");
                assert_eq!(local_path, dir.path().join("scene_001_ai.jpg"));
            }
            other => panic!("unexpected {other:?}"),
        }

        let offline = AiImageStrategy::new(
            Arc::new(FakeModel(None)),
            Arc::new(FakeImages),
            Arc::new(FakeMedia),
        );
        let failure = offline.resolve(&ctx).await.unwrap_err();
        assert_eq!(failure.strategy, "ai_image");
    }

    #[test]
    fn test_image_prompt_request() {
        assert_eq!(
            image_prompt_request("A cat sleeps.", "Nature"),
            "Create a vivid, cinematic image prompt for this scene: 'A cat sleeps.'. Genre: Nature. Keep it under 20 words."
        );
    }

    #[tokio::test]
    async fn test_resolver_falls_through_to_placeholder() {
        let dir = TempDir::new().unwrap();
        let scene = Scene::new(0, "A cat sleeps.", 1.0);
        let ctx = SceneContext {
            scene: &scene,
            genre: "Nature",
            keywords: &[],
            dir: dir.path(),
        };
        let resolver = SceneContentResolver::new(vec![
            Box::new(stock(Vec::new(), 0)),
            Box::new(PlaceholderStrategy),
        ]);
        let (events, mut rx) = EventEmitter::channel(JobId::from_string("job"), 16);

        let asset = resolver.resolve(&ctx, &events).await;
        assert_eq!(asset, VisualAsset::placeholder());

        let fell_back = rx.recv().await.unwrap();
        assert_eq!(fell_back.outcome, StepOutcome::FellBack);
        assert_eq!(fell_back.scene_index, Some(0));
        let succeeded = rx.recv().await.unwrap();
        assert_eq!(succeeded.outcome, StepOutcome::Succeeded);
    }

    #[tokio::test]
    async fn test_empty_ladder_still_yields_placeholder() {
        let dir = TempDir::new().unwrap();
        let scene = Scene::new(0, "x", 1.0);
        let ctx = SceneContext {
            scene: &scene,
            genre: "Nature",
            keywords: &[],
            dir: dir.path(),
        };
        let resolver = SceneContentResolver::new(Vec::new());
        let asset = resolver.resolve(&ctx, &EventEmitter::noop(JobId::new())).await;
        assert_eq!(asset.kind(), VisualKind::Placeholder);
    }
}
