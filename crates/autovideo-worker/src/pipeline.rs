//! Pipeline orchestration for one narrated video job.
//!
//! ```text
//! split script ─┬─ narration ──────┐
//!               └─ hardware probe ─┴─ apportion scenes
//!                                      │
//!        per scene: keywords -> visual -> style -> render
//!                                      │
//!              assemble timeline -> mix audio -> encode -> publish
//! ```
//!
//! Every transient file lives in one [`JobWorkspace`] that is removed on
//! every exit path.

use autovideo_media::{
    publish_output, BackgroundMusic, EncoderSelector, MixRequest, SceneClip, Timeline,
};
use autovideo_models::{
    CaptionStyle, HardwareProfile, JobId, JobRequest, NarrationAudio, PipelineStep, Scene,
    StepOutcome, OUTPUT_FPS,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn, Instrument};

use crate::captions::CaptionStyler;
use crate::composer::SceneComposer;
use crate::config::WorkerConfig;
use crate::content::{
    AiImageStrategy, ContentStrategy, PlaceholderStrategy, SceneContentResolver, SceneContext,
    StockStrategy,
};
use crate::error::{PipelineError, PipelineResult};
use crate::events::EventEmitter;
use crate::keywords::extract_keywords;
use crate::logging::JobLogger;
use crate::metrics;
use crate::narration::{NarrationProvider, NarrationSource};
use crate::segmenter::{apportion, split_sentences};
use crate::services::PipelineServices;
use crate::workspace::JobWorkspace;

/// Runs narrated video jobs.
pub struct PipelineOrchestrator {
    config: WorkerConfig,
    services: PipelineServices,
}

impl PipelineOrchestrator {
    pub fn new(config: WorkerConfig, services: PipelineServices) -> Self {
        Self { config, services }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Produce `<output_dir>/<job_id>.mp4` or fail without partial output.
    pub async fn run(
        &self,
        job_id: &JobId,
        request: &JobRequest,
        events: &EventEmitter,
    ) -> PipelineResult<PathBuf> {
        let logger = JobLogger::new(job_id, "narrated_video");
        let span = logger.create_span();

        async {
            logger.log_start(&format!(
                "genre={} aspect={} voice={}",
                request.genre, request.aspect_ratio, request.voice_name
            ));
            events.emit(PipelineStep::Job, StepOutcome::Started, "job started");

            let result = self.run_job(job_id, request, events, &logger).await;

            match &result {
                Ok(path) => {
                    metrics::record_job_completed(logger.elapsed_secs());
                    logger.log_completion(&path.display().to_string());
                    events.emit(PipelineStep::Job, StepOutcome::Succeeded, path.display().to_string());
                }
                Err(e) => {
                    metrics::record_job_failed(e.kind(), logger.elapsed_secs());
                    logger.log_error(&e.to_string());
                    events.emit(PipelineStep::Job, StepOutcome::Failed, e.to_string());
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_job(
        &self,
        job_id: &JobId,
        request: &JobRequest,
        events: &EventEmitter,
        logger: &JobLogger,
    ) -> PipelineResult<PathBuf> {
        request.validate()?;

        // Split before narration so an empty script never reaches the speech engine
        let sentences = split_sentences(&request.script);
        if sentences.is_empty() {
            events.emit(PipelineStep::Segmentation, StepOutcome::Failed, "script contains no sentences");
            return Err(PipelineError::EmptyScript);
        }

        let workspace = JobWorkspace::create(self.config.work_dir.as_deref(), job_id).await?;
        let result = self.run_in_workspace(job_id, request, sentences, &workspace, events, logger).await;

        match workspace.close() {
            Ok(()) => events.emit(PipelineStep::Cleanup, StepOutcome::Succeeded, "workspace removed"),
            Err(failure) => {
                logger.log_warning(&failure.to_string());
                events.emit(PipelineStep::Cleanup, StepOutcome::Failed, failure.to_string());
            }
        }
        result
    }

    async fn run_in_workspace(
        &self,
        job_id: &JobId,
        request: &JobRequest,
        sentences: Vec<String>,
        workspace: &JobWorkspace,
        events: &EventEmitter,
        logger: &JobLogger,
    ) -> PipelineResult<PathBuf> {
        let services = &self.services;

        // Narration and hardware probe are independent
        let narration_source = match &request.narration_audio {
            Some(bytes) => NarrationSource::Supplied(bytes),
            None => NarrationSource::Synthesize {
                text: &request.script,
                voice_name: &request.voice_name,
            },
        };
        events.emit(PipelineStep::Narration, StepOutcome::Started, "providing narration");
        events.emit(PipelineStep::HardwareProbe, StepOutcome::Started, "probing encoders");
        let provider = NarrationProvider::new(services.tts.as_ref(), services.media.as_ref());
        let (narration, hardware) = tokio::join!(
            provider.provide(narration_source, workspace.path()),
            services.hardware.profile()
        );
        events.emit(
            PipelineStep::HardwareProbe,
            StepOutcome::Succeeded,
            format!("{} with {} encoders", hardware.device, hardware.encoders.len()),
        );
        let narration = match narration {
            Ok(narration) => narration,
            Err(e) => {
                events.emit(PipelineStep::Narration, StepOutcome::Failed, e.to_string());
                return Err(e);
            }
        };
        events.emit(
            PipelineStep::Narration,
            StepOutcome::Succeeded,
            format!("{:.3}s narration", narration.duration),
        );

        let scenes = apportion(sentences, narration.duration);
        events.emit(
            PipelineStep::Segmentation,
            StepOutcome::Succeeded,
            format!("{} scenes", scenes.len()),
        );
        logger.log_step(
            PipelineStep::Segmentation,
            &format!("{} scenes over {:.3}s of narration", scenes.len(), narration.duration),
        );

        let clips = self.render_scenes(&scenes, request, workspace, events, logger).await?;

        let timeline = Timeline::assemble(
            clips,
            narration.duration,
            OUTPUT_FPS,
            workspace.file("concat.txt"),
        )
        .await
        .inspect_err(|e| events.emit(PipelineStep::Assembly, StepOutcome::Failed, e.to_string()))?;
        events.emit(
            PipelineStep::Assembly,
            StepOutcome::Succeeded,
            format!("{:?}", timeline.reconciliation()),
        );

        let audio = self.mix_audio(request, &narration, workspace, events, logger).await;
        let staged = self.encode(&timeline, &audio, &hardware, workspace, events).await?;
        self.publish(job_id, &staged, events).await
    }

    async fn render_scenes(
        &self,
        scenes: &[Scene],
        request: &JobRequest,
        workspace: &JobWorkspace,
        events: &EventEmitter,
        logger: &JobLogger,
    ) -> PipelineResult<Vec<SceneClip>> {
        let resolver = SceneContentResolver::new(self.content_strategies());
        debug!(strategies = ?resolver.strategy_names(), "Content ladder");
        let styler = CaptionStyler::new(self.services.language_model.clone());
        let composer = SceneComposer::new(
            self.services.media.clone(),
            request.aspect_ratio,
            self.config.caption_width,
        );

        let mut clips = Vec::with_capacity(scenes.len());
        for scene in scenes {
            info!(
                scene_index = scene.index,
                duration = scene.duration,
                text = %scene.preview(40),
                "Processing scene"
            );

            let keywords = extract_keywords(&scene.text, self.config.max_keywords);
            events.emit_scene(
                scene.index,
                PipelineStep::Keywords,
                StepOutcome::Succeeded,
                keywords.join(", "),
            );

            let ctx = SceneContext {
                scene,
                genre: &request.genre,
                keywords: &keywords,
                dir: workspace.path(),
            };
            let visual = resolver.resolve(&ctx, events).await;

            let style = match styler.style(&scene.text, &request.genre).await {
                Ok(style) => {
                    events.emit_scene(scene.index, PipelineStep::Styling, StepOutcome::Succeeded, "styled");
                    style
                }
                Err(failure) => {
                    if styler.is_configured() {
                        logger.log_scene_warning(scene.index, &format!("caption styling: {failure}"));
                    }
                    metrics::record_caption_style_fallback();
                    events.emit_scene(
                        scene.index,
                        PipelineStep::Styling,
                        StepOutcome::FellBack,
                        failure.to_string(),
                    );
                    CaptionStyle::default()
                }
            };

            let rendered = composer
                .compose(scene, &visual, &style, workspace.path(), events, logger)
                .await?;
            clips.push(SceneClip {
                index: scene.index,
                path: rendered.path,
                duration: rendered.duration,
            });
        }
        Ok(clips)
    }

    /// Ladder for this job's credentials.
    fn content_strategies(&self) -> Vec<Box<dyn ContentStrategy>> {
        let services = &self.services;
        let mut strategies: Vec<Box<dyn ContentStrategy>> = Vec::new();
        if !services.stock_providers.is_empty() {
            strategies.push(Box::new(StockStrategy::new(
                services.stock_providers.clone(),
                services.downloader.clone(),
                services.media.clone(),
                self.config.stock_per_page,
                self.config.shuffle_seed,
            )));
        }
        if let (Some(model), Some(images)) =
            (&services.language_model, &services.image_generator)
        {
            strategies.push(Box::new(AiImageStrategy::new(
                model.clone(),
                images.clone(),
                services.media.clone(),
            )));
        }
        strategies.push(Box::new(PlaceholderStrategy));
        strategies
    }

    /// Narration with music under it, or the bare narration when there is
    /// no music or mixing fails.
    async fn mix_audio(
        &self,
        request: &JobRequest,
        narration: &NarrationAudio,
        workspace: &JobWorkspace,
        events: &EventEmitter,
        logger: &JobLogger,
    ) -> PathBuf {
        let Some(bytes) = request.background_music.as_deref().filter(|b| !b.is_empty()) else {
            return narration.path.clone();
        };

        let music_path = workspace.file("music.mp3");
        let music = match self.load_music(bytes, &music_path).await {
            Ok(duration) => BackgroundMusic {
                path: music_path,
                duration,
                volume: request.effective_music_volume(),
            },
            Err(reason) => {
                logger.log_warning(&format!("background music ignored: {reason}"));
                events.emit(PipelineStep::AudioMix, StepOutcome::FellBack, reason);
                return narration.path.clone();
            }
        };

        let mix = MixRequest {
            narration: narration.path.clone(),
            music: Some(music),
            duration: narration.duration,
            output: workspace.file("mixed.wav"),
        };
        match self.services.media.mix_audio(&mix).await {
            Ok(path) => {
                events.emit(PipelineStep::AudioMix, StepOutcome::Succeeded, "music mixed under narration");
                path
            }
            Err(e) => {
                logger.log_warning(&format!("audio mix failed, using narration only: {e}"));
                events.emit(PipelineStep::AudioMix, StepOutcome::FellBack, e.to_string());
                narration.path.clone()
            }
        }
    }

    async fn load_music(&self, bytes: &[u8], path: &Path) -> Result<f64, String> {
        tokio::fs::write(path, bytes).await.map_err(|e| e.to_string())?;
        self.services
            .media
            .probe_duration(path)
            .await
            .map_err(|e| format!("music could not be probed: {e}"))
    }

    async fn encode(
        &self,
        timeline: &Timeline,
        audio: &Path,
        hardware: &HardwareProfile,
        workspace: &JobWorkspace,
        events: &EventEmitter,
    ) -> PipelineResult<PathBuf> {
        events.emit(PipelineStep::Encoding, StepOutcome::Started, "encoding");
        let staged = workspace.file("output.mp4");
        let selector = EncoderSelector::new(self.services.encoder.clone());
        match selector.encode(timeline, audio, hardware, &staged).await {
            Ok(outcome) => {
                let mut message = format!("encoded with {}", outcome.profile.codec);
                let step_outcome = if outcome.used_fallback() {
                    if let Some(primary) = &outcome.primary_error {
                        message.push_str(&format!(" after: {primary}"));
                    }
                    StepOutcome::FellBack
                } else {
                    StepOutcome::Succeeded
                };
                events.emit(PipelineStep::Encoding, step_outcome, message);
                Ok(staged)
            }
            Err(e) => {
                events.emit(PipelineStep::Encoding, StepOutcome::Failed, e.to_string());
                Err(e.into())
            }
        }
    }

    async fn publish(&self, job_id: &JobId, staged: &Path, events: &EventEmitter) -> PipelineResult<PathBuf> {
        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        let destination = self.config.output_dir.join(format!("{job_id}.mp4"));
        if let Err(e) = publish_output(staged, &destination).await {
            warn!(error = %e, destination = %destination.display(), "Publishing output failed");
            events.emit(PipelineStep::Publish, StepOutcome::Failed, e.to_string());
            return Err(e.into());
        }
        events.emit(PipelineStep::Publish, StepOutcome::Succeeded, destination.display().to_string());
        Ok(destination)
    }
}
