//! Scene clip rendering.
//!
//! Every scene becomes an intermediate H.264 clip at the target frame size,
//! 24 fps, without audio. Intermediates favour speed over size since they are
//! re-encoded by the final pass.

use autovideo_models::{CaptionStyle, FrameSize, Rgb, VisualAsset};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::{caption_drawtext, color_source, cover_crop};
use crate::probe::probe_visual;

/// Codec used for scene intermediates.
const INTERMEDIATE_CODEC: &str = "libx264";
const INTERMEDIATE_PRESET: &str = "ultrafast";
const INTERMEDIATE_CRF: u8 = 18;
const INTERMEDIATE_PIXEL_FORMAT: &str = "yuv420p";

/// What fills the scene frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneSource {
    /// Motion footage, looped and trimmed to length
    Video(PathBuf),
    /// Still image held for the whole scene
    Still(PathBuf),
    /// Flat color
    Color(Rgb),
}

impl From<&VisualAsset> for SceneSource {
    fn from(asset: &VisualAsset) -> Self {
        match asset {
            VisualAsset::Stock { local_path, .. } => SceneSource::Video(local_path.clone()),
            VisualAsset::AiImage { local_path, .. } => SceneSource::Still(local_path.clone()),
            VisualAsset::ColorPlaceholder { color } => SceneSource::Color(*color),
        }
    }
}

/// Caption burned into a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionOverlay {
    /// File holding the already-wrapped caption text
    pub text_file: PathBuf,
    pub style: CaptionStyle,
    pub font_size: u32,
}

/// Everything needed to render one scene clip.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRenderRequest {
    pub source: SceneSource,
    pub caption: Option<CaptionOverlay>,
    pub frame: FrameSize,
    pub fps: u32,
    /// Target duration in seconds
    pub duration: f64,
    pub output: PathBuf,
}

impl SceneRenderRequest {
    /// Same request without the caption.
    pub fn without_caption(&self) -> Self {
        Self {
            caption: None,
            ..self.clone()
        }
    }

    /// Same request with another source.
    pub fn with_source(&self, source: SceneSource) -> Self {
        Self {
            source,
            ..self.clone()
        }
    }

    /// Number of frames the clip will hold.
    pub fn frame_count(&self) -> u64 {
        quantize_frames(self.duration, self.fps)
    }
}

/// A rendered scene clip.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedScene {
    pub path: PathBuf,
    pub frames: u64,
    /// Clip duration in seconds (`frames / fps`)
    pub duration: f64,
}

/// Whole frames covering `duration` at `fps`, never fewer than one.
pub fn quantize_frames(duration: f64, fps: u32) -> u64 {
    if !duration.is_finite() || duration <= 0.0 {
        return 1;
    }
    ((duration * fps as f64).round() as u64).max(1)
}

/// Build the FFmpeg command for a scene render.
pub fn build_scene_command(req: &SceneRenderRequest) -> FfmpegCommand {
    let frames = req.frame_count();
    // Source length with one frame of headroom; output is bounded by frame count
    let source_secs = (frames + 1) as f64 / req.fps as f64;

    let mut filters = Vec::new();
    let cmd = FfmpegCommand::new(&req.output).operation("scene_render");
    let cmd = match &req.source {
        SceneSource::Video(path) => {
            filters.push(format!("fps={}", req.fps));
            filters.push(cover_crop(req.frame));
            cmd.looped_input(path)
        }
        SceneSource::Still(path) => {
            filters.push(cover_crop(req.frame));
            cmd.still_input(path, req.fps)
        }
        SceneSource::Color(color) => cmd.lavfi(color_source(*color, req.frame, req.fps, source_secs)),
    };

    if let Some(caption) = &req.caption {
        filters.push(caption_drawtext(&caption.text_file, &caption.style, caption.font_size));
    }

    let cmd = if filters.is_empty() {
        cmd
    } else {
        cmd.video_filter(filters.join(","))
    };

    cmd.output_args(["-frames:v".to_string(), frames.to_string()])
        .no_audio()
        .frame_rate(req.fps)
        .video_codec(INTERMEDIATE_CODEC)
        .preset(INTERMEDIATE_PRESET)
        .crf(INTERMEDIATE_CRF)
        .pixel_format(INTERMEDIATE_PIXEL_FORMAT)
}

/// Render a scene and verify the clip has the target frame size.
pub async fn render_scene(runner: &FfmpegRunner, req: &SceneRenderRequest) -> MediaResult<RenderedScene> {
    let cmd = build_scene_command(req);
    runner.run(&cmd).await?;
    verify_rendered(&req.output, req.frame).await?;

    let frames = req.frame_count();
    let duration = frames as f64 / req.fps as f64;
    debug!(
        output = %req.output.display(),
        frames,
        duration,
        "Rendered scene clip"
    );

    Ok(RenderedScene {
        path: req.output.clone(),
        frames,
        duration,
    })
}

async fn verify_rendered(path: &Path, expected: FrameSize) -> MediaResult<()> {
    let info = probe_visual(path).await?;
    let actual = info.frame_size();
    if actual != expected {
        return Err(MediaError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
