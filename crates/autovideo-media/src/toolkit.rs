//! Media operations the pipeline depends on, behind one seam.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::audio::{mix_audio, MixRequest};
use crate::command::FfmpegRunner;
use crate::error::MediaResult;
use crate::probe::{self, MediaInfo};
use crate::scene::{render_scene, RenderedScene, SceneRenderRequest};

#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Duration of a playable media file; zero-length media is an error.
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64>;

    /// Probe a file that must decode to a picture.
    async fn probe_visual(&self, path: &Path) -> MediaResult<MediaInfo>;

    /// Render one scene clip at the requested size and length.
    async fn render_scene(&self, request: &SceneRenderRequest) -> MediaResult<RenderedScene>;

    /// Mix narration with optional music, returning the track to encode.
    async fn mix_audio(&self, request: &MixRequest) -> MediaResult<PathBuf>;
}

#[async_trait]
impl<T: MediaToolkit + ?Sized> MediaToolkit for Arc<T> {
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64> {
        (**self).probe_duration(path).await
    }

    async fn probe_visual(&self, path: &Path) -> MediaResult<MediaInfo> {
        (**self).probe_visual(path).await
    }

    async fn render_scene(&self, request: &SceneRenderRequest) -> MediaResult<RenderedScene> {
        (**self).render_scene(request).await
    }

    async fn mix_audio(&self, request: &MixRequest) -> MediaResult<PathBuf> {
        (**self).mix_audio(request).await
    }
}

/// Toolkit backed by the FFmpeg and FFprobe CLIs.
#[derive(Debug, Clone, Default)]
pub struct FfmpegToolkit {
    runner: FfmpegRunner,
}

impl FfmpegToolkit {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64> {
        probe::probe_duration(path).await
    }

    async fn probe_visual(&self, path: &Path) -> MediaResult<MediaInfo> {
        probe::probe_visual(path).await
    }

    async fn render_scene(&self, request: &SceneRenderRequest) -> MediaResult<RenderedScene> {
        render_scene(&self.runner, request).await
    }

    async fn mix_audio(&self, request: &MixRequest) -> MediaResult<PathBuf> {
        mix_audio(&self.runner, request).await
    }
}
