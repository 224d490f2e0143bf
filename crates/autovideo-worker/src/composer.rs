//! Scene composition: visual plus caption, rendered to an exact-length clip.
//!
//! Degradation ladder:
//!
//! ```text
//! captioned render -> uncaptioned render -> uncaptioned placeholder render
//! ```
//!
//! Only a failing placeholder render is fatal; it means FFmpeg itself is
//! unusable.

use autovideo_media::filters::caption_font_size;
use autovideo_media::{
    remove_if_exists, CaptionOverlay, MediaError, MediaToolkit, RenderedScene, SceneRenderRequest,
    SceneSource,
};
use autovideo_models::{
    AspectRatio, CaptionStyle, PipelineStep, Scene, StepOutcome, VisualAsset, OUTPUT_FPS,
    PLACEHOLDER_COLOR,
};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::captions::caption_text;
use crate::error::{CompositionFailure, PipelineResult};
use crate::events::EventEmitter;
use crate::logging::JobLogger;
use crate::workspace::scene_file;

/// Renders scenes for one job.
pub struct SceneComposer {
    media: Arc<dyn MediaToolkit>,
    aspect: AspectRatio,
    caption_width: usize,
}

impl SceneComposer {
    pub fn new(media: Arc<dyn MediaToolkit>, aspect: AspectRatio, caption_width: usize) -> Self {
        Self {
            media,
            aspect,
            caption_width,
        }
    }

    /// Render one scene into `dir`.
    pub async fn compose(
        &self,
        scene: &Scene,
        visual: &VisualAsset,
        style: &CaptionStyle,
        dir: &Path,
        events: &EventEmitter,
        logger: &JobLogger,
    ) -> PipelineResult<RenderedScene> {
        let text_file = scene_file(dir, scene.index, "caption.txt");
        let captioned = SceneRenderRequest {
            source: SceneSource::from(visual),
            caption: Some(CaptionOverlay {
                text_file: text_file.clone(),
                style: style.clone(),
                font_size: caption_font_size(self.aspect),
            }),
            frame: self.aspect.frame_size(),
            fps: OUTPUT_FPS,
            duration: scene.duration,
            output: scene_file(dir, scene.index, "clip.mp4"),
        };
        let base = captioned.without_caption();

        // Captioned
        match tokio::fs::write(&text_file, caption_text(&scene.text, self.caption_width)).await {
            Ok(()) => match self.media.render_scene(&captioned).await {
                Ok(rendered) => {
                    self.succeeded(scene, &rendered, "captioned", events);
                    return Ok(rendered);
                }
                Err(e) => self.fell_back(scene.index, "captioned", e, &base, events, logger).await,
            },
            Err(e) => self.fell_back(scene.index, "captioned", MediaError::Io(e), &base, events, logger).await,
        }

        // Uncaptioned
        match self.media.render_scene(&base).await {
            Ok(rendered) => {
                self.succeeded(scene, &rendered, "uncaptioned", events);
                return Ok(rendered);
            }
            Err(e) => {
                // A placeholder source would only fail the same way again
                if matches!(base.source, SceneSource::Color(_)) {
                    return Err(self.fatal(scene.index, e, events));
                }
                self.fell_back(scene.index, "uncaptioned", e, &base, events, logger).await;
            }
        }

        // Placeholder
        let placeholder = base.with_source(SceneSource::Color(PLACEHOLDER_COLOR));
        match self.media.render_scene(&placeholder).await {
            Ok(rendered) => {
                self.succeeded(scene, &rendered, "placeholder", events);
                Ok(rendered)
            }
            Err(e) => Err(self.fatal(scene.index, e, events)),
        }
    }

    fn succeeded(&self, scene: &Scene, rendered: &RenderedScene, stage: &str, events: &EventEmitter) {
        debug!(
            scene_index = scene.index,
            frames = rendered.frames,
            duration = rendered.duration,
            stage,
            "Scene rendered"
        );
        events.emit_scene(
            scene.index,
            PipelineStep::Composition,
            StepOutcome::Succeeded,
            format!("{stage} clip, {} frames", rendered.frames),
        );
    }

    async fn fell_back(
        &self,
        scene_index: usize,
        stage: &'static str,
        source: MediaError,
        request: &SceneRenderRequest,
        events: &EventEmitter,
        logger: &JobLogger,
    ) {
        let failure = CompositionFailure {
            scene_index,
            stage,
            source,
        };
        logger.log_scene_warning(scene_index, &failure.to_string());
        events.emit_scene(
            scene_index,
            PipelineStep::Composition,
            StepOutcome::FellBack,
            failure.to_string(),
        );
        remove_if_exists(&request.output).await;
    }

    fn fatal(&self, scene_index: usize, err: MediaError, events: &EventEmitter) -> crate::error::PipelineError {
        events.emit_scene(
            scene_index,
            PipelineStep::Composition,
            StepOutcome::Failed,
            err.to_string(),
        );
        err.into()
    }
}
