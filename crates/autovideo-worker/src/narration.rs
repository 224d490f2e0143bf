//! Narration track provisioning.

use autovideo_ai::{resolve_voice, TextToSpeech};
use autovideo_media::{remove_if_exists, MediaToolkit};
use autovideo_models::{NarrationAudio, NarrationOrigin};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{PipelineError, PipelineResult};

/// Where the narration comes from.
#[derive(Debug, Clone, Copy)]
pub enum NarrationSource<'a> {
    /// Caller-supplied audio bytes
    Supplied(&'a [u8]),
    /// Script text read by the speech engine
    Synthesize { text: &'a str, voice_name: &'a str },
}

/// Produces the narration track inside a job workspace.
pub struct NarrationProvider<'a> {
    tts: &'a dyn TextToSpeech,
    media: &'a dyn MediaToolkit,
}

impl<'a> NarrationProvider<'a> {
    pub fn new(tts: &'a dyn TextToSpeech, media: &'a dyn MediaToolkit) -> Self {
        Self { tts, media }
    }

    /// Write or synthesize the narration into `dir` and probe its length.
    pub async fn provide(&self, source: NarrationSource<'_>, dir: &Path) -> PipelineResult<NarrationAudio> {
        match source {
            NarrationSource::Supplied(bytes) => {
                if bytes.is_empty() {
                    return Err(PipelineError::narration_unavailable("supplied narration is empty"));
                }
                let path = dir.join("narration_supplied.mp3");
                tokio::fs::write(&path, bytes).await?;
                let duration = self.probe(&path).await?;
                debug!(bytes = bytes.len(), duration, "Using supplied narration");
                Ok(NarrationAudio {
                    path,
                    duration,
                    origin: NarrationOrigin::Supplied,
                })
            }
            NarrationSource::Synthesize { text, voice_name } => {
                let voice_id = resolve_voice(voice_name);
                let path = dir.join("narration.mp3");
                info!(voice_name, voice_id, "Synthesizing narration");
                if let Err(e) = self.tts.synthesize(text, voice_id, &path).await {
                    remove_if_exists(&path).await;
                    return Err(PipelineError::narration_unavailable(e.to_string()));
                }
                let duration = self.probe(&path).await?;
                Ok(NarrationAudio {
                    path,
                    duration,
                    origin: NarrationOrigin::Synthesized,
                })
            }
        }
    }

    async fn probe(&self, path: &Path) -> PipelineResult<f64> {
        match self.media.probe_duration(path).await {
            Ok(duration) if duration.is_finite() && duration > 0.0 => Ok(duration),
            Ok(duration) => Err(PipelineError::narration_unavailable(format!(
                "narration has no usable duration ({duration})"
            ))),
            Err(e) => Err(PipelineError::narration_unavailable(format!(
                "narration could not be probed: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use autovideo_ai::{AiError, AiResult};
    use autovideo_media::{MediaError, MediaInfo, MediaResult, MixRequest, RenderedScene, SceneRenderRequest};
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Reports the byte length of a file as its duration.
    struct SizeAsDuration;

    #[async_trait]
    impl MediaToolkit for SizeAsDuration {
        async fn probe_duration(&self, path: &Path) -> MediaResult<f64> {
            let len = tokio::fs::metadata(path).await?.len();
            if len < 4 {
                return Err(MediaError::invalid_media("too short to decode"));
            }
            Ok(len as f64)
        }

        async fn probe_visual(&self, _path: &Path) -> MediaResult<MediaInfo> {
            Err(MediaError::internal("unused"))
        }

        async fn render_scene(&self, _request: &SceneRenderRequest) -> MediaResult<RenderedScene> {
            Err(MediaError::internal("unused"))
        }

        async fn mix_audio(&self, _request: &MixRequest) -> MediaResult<PathBuf> {
            Err(MediaError::internal("unused"))
        }
    }

    #[derive(Default)]
    struct RecordingTts {
        fail: bool,
        voices: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextToSpeech for RecordingTts {
        async fn synthesize(&self, text: &str, voice_id: &str, dest: &Path) -> AiResult<()> {
            self.voices.lock().unwrap().push(voice_id.to_string());
            if self.fail {
                return Err(AiError::synthesis_failed("engine offline"));
            }
            tokio::fs::write(dest, text.repeat(2)).await?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_supplied_bytes_are_probed() {
        let dir = TempDir::new().unwrap();
        let tts = RecordingTts::default();
        let provider = NarrationProvider::new(&tts, &SizeAsDuration);

        let narration = provider
            .provide(NarrationSource::Supplied(&[1u8; 12]), dir.path())
            .await
            .unwrap();
        assert_eq!(narration.origin, NarrationOrigin::Supplied);
        assert_eq!(narration.duration, 12.0);
        assert!(narration.path.starts_with(dir.path()));
        assert!(tts.voices.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unprobeable_supplied_bytes() {
        let dir = TempDir::new().unwrap();
        let tts = RecordingTts::default();
        let provider = NarrationProvider::new(&tts, &SizeAsDuration);

        let err = provider
            .provide(NarrationSource::Supplied(&[1u8, 2]), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NarrationUnavailable(_)));

        let err = provider
            .provide(NarrationSource::Supplied(&[]), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NarrationUnavailable(_)));
    }

    #[tokio::test]
    async fn test_synthesis_maps_voice_names() {
        let dir = TempDir::new().unwrap();
        let tts = RecordingTts::default();
        let provider = NarrationProvider::new(&tts, &SizeAsDuration);

        let narration = provider
            .provide(
                NarrationSource::Synthesize {
                    text: "A cat sleeps.",
                    voice_name: "Deep (Male)",
                },
                dir.path(),
            )
            .await
            .unwrap();
        assert_eq!(narration.origin, NarrationOrigin::Synthesized);
        assert_eq!(narration.duration, 26.0);

        provider
            .provide(
                NarrationSource::Synthesize {
                    text: "Hello.",
                    voice_name: "Unknown Voice",
                },
                dir.path(),
            )
            .await
            .unwrap();
        assert_eq!(
            *tts.voices.lock().unwrap(),
            vec!["en-US-EricNeural".to_string(), "en-US-AriaNeural".to_string()]
        );
    }

    #[tokio::test]
    async fn test_synthesis_failure_is_fatal_without_retry() {
        let dir = TempDir::new().unwrap();
        let tts = RecordingTts {
            fail: true,
            ..Default::default()
        };
        let provider = NarrationProvider::new(&tts, &SizeAsDuration);

        let err = provider
            .provide(
                NarrationSource::Synthesize {
                    text: "Hello.",
                    voice_name: "Female (Default)",
                },
                dir.path(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NarrationUnavailable(_)));
        assert_eq!(tts.voices.lock().unwrap().len(), 1);
    }
}
