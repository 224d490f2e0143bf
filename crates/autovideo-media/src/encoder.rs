//! Final encode with hardware selection and software fallback.
//!
//! ```text
//! SELECT -> ENCODE_PRIMARY -> DONE
//!                 |
//!                 v
//!           ENCODE_SOFTWARE -> DONE | FATAL
//! ```

use async_trait::async_trait;
use autovideo_models::encoding::{AMF_CODEC, NVENC_CODEC, QSV_CODEC};
use autovideo_models::{DeviceClass, EncodingProfile, HardwareProfile};
use metrics::counter;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::remove_if_exists;
use crate::timeline::Timeline;

/// Counter of encode attempts, labelled by codec and outcome.
pub const ENCODES_METRIC: &str = "autovideo_encodes_total";

/// Pick the encoding profile for the probed hardware.
pub fn select_profile(hardware: &HardwareProfile) -> EncodingProfile {
    match hardware.device {
        DeviceClass::GpuNvidia if hardware.has_encoder(NVENC_CODEC) => EncodingProfile::nvenc(),
        DeviceClass::GpuAmd if hardware.has_encoder(AMF_CODEC) => EncodingProfile::amf(),
        DeviceClass::GpuIntel if hardware.has_encoder(QSV_CODEC) => EncodingProfile::qsv(),
        _ => EncodingProfile::software(),
    }
}

/// Writes a timeline plus audio track to a video file.
#[async_trait]
pub trait VideoEncoder: Send + Sync {
    async fn encode(
        &self,
        timeline: &Timeline,
        audio: &Path,
        profile: &EncodingProfile,
        output: &Path,
    ) -> MediaResult<()>;
}

#[async_trait]
impl<T: VideoEncoder + ?Sized> VideoEncoder for Arc<T> {
    async fn encode(
        &self,
        timeline: &Timeline,
        audio: &Path,
        profile: &EncodingProfile,
        output: &Path,
    ) -> MediaResult<()> {
        (**self).encode(timeline, audio, profile, output).await
    }
}

/// FFmpeg-backed encoder reading the timeline's concat list.
#[derive(Debug, Clone, Default)]
pub struct FfmpegVideoEncoder {
    runner: FfmpegRunner,
}

impl FfmpegVideoEncoder {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner }
    }
}

/// Build the final encode command.
pub fn build_encode_command(
    timeline: &Timeline,
    audio: &Path,
    profile: &EncodingProfile,
    output: &Path,
) -> FfmpegCommand {
    let cmd = FfmpegCommand::new(output)
        .operation("encode")
        .concat_input(timeline.concat_list())
        .input(audio);

    let cmd = match timeline.reconciliation().video_filter() {
        Some(filter) => cmd.video_filter(filter),
        None => cmd,
    };

    cmd.map("0:v:0")
        .map("1:a:0")
        .output_args(profile.to_ffmpeg_args())
        .duration(timeline.target_duration())
        .output_args(["-movflags", "+faststart"])
}

#[async_trait]
impl VideoEncoder for FfmpegVideoEncoder {
    async fn encode(
        &self,
        timeline: &Timeline,
        audio: &Path,
        profile: &EncodingProfile,
        output: &Path,
    ) -> MediaResult<()> {
        let cmd = build_encode_command(timeline, audio, profile, output);
        let target = timeline.target_duration();
        let codec = profile.codec.clone();
        self.runner
            .run_with_progress(&cmd, move |p| {
                tracing::trace!(codec = %codec, percent = p.percentage(target), "Encoding");
            })
            .await
    }
}

/// Result of a successful encode.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOutcome {
    /// Profile that produced the output
    pub profile: EncodingProfile,
    /// Error from the first attempt when the software retry was needed
    pub primary_error: Option<String>,
}

impl EncodeOutcome {
    pub fn used_fallback(&self) -> bool {
        self.primary_error.is_some()
    }
}

enum EncodeState {
    Select,
    Primary(EncodingProfile),
    Software { primary_error: String },
    Done(EncodeOutcome),
    Fatal(MediaError),
}

/// Drives one encode through selection, the primary attempt and a single
/// software retry.
pub struct EncoderSelector<E> {
    encoder: E,
}

impl<E: VideoEncoder> EncoderSelector<E> {
    pub fn new(encoder: E) -> Self {
        Self { encoder }
    }

    pub async fn encode(
        &self,
        timeline: &Timeline,
        audio: &Path,
        hardware: &HardwareProfile,
        output: &Path,
    ) -> MediaResult<EncodeOutcome> {
        let mut state = EncodeState::Select;
        loop {
            state = match state {
                EncodeState::Select => {
                    let profile = select_profile(hardware);
                    info!(device = %hardware.device, codec = %profile.codec, "Selected encoder");
                    EncodeState::Primary(profile)
                }
                EncodeState::Primary(profile) => {
                    match self.encoder.encode(timeline, audio, &profile, output).await {
                        Ok(()) => {
                            record_encode(&profile.codec, "success");
                            EncodeState::Done(EncodeOutcome {
                                profile,
                                primary_error: None,
                            })
                        }
                        Err(e) => {
                            record_encode(&profile.codec, "failure");
                            warn!(codec = %profile.codec, error = %e, "Encode failed, retrying with software encoder");
                            remove_if_exists(output).await;
                            EncodeState::Software {
                                primary_error: e.to_string(),
                            }
                        }
                    }
                }
                EncodeState::Software { primary_error } => {
                    let profile = EncodingProfile::software();
                    match self.encoder.encode(timeline, audio, &profile, output).await {
                        Ok(()) => {
                            record_encode(&profile.codec, "success");
                            EncodeState::Done(EncodeOutcome {
                                profile,
                                primary_error: Some(primary_error),
                            })
                        }
                        Err(e) => {
                            record_encode(&profile.codec, "failure");
                            remove_if_exists(output).await;
                            EncodeState::Fatal(MediaError::EncodingFailed {
                                primary: primary_error,
                                fallback: e.to_string(),
                            })
                        }
                    }
                }
                EncodeState::Done(outcome) => return Ok(outcome),
                EncodeState::Fatal(err) => return Err(err),
            };
        }
    }
}

fn record_encode(codec: &str, outcome: &'static str) {
    let labels = [("codec", codec.to_string()), ("outcome", outcome.to_string())];
    counter!(ENCODES_METRIC, &labels).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::SceneClip;
    use autovideo_models::EncoderFamily;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn hardware(device: DeviceClass, encoders: &[&str]) -> HardwareProfile {
        HardwareProfile::new(device, encoders.iter().map(|e| e.to_string()).collect())
    }

    #[test]
    fn test_select_profile() {
        assert_eq!(select_profile(&hardware(DeviceClass::GpuNvidia, &["h264_nvenc"])).family, EncoderFamily::Nvenc);
        assert_eq!(select_profile(&hardware(DeviceClass::GpuAmd, &["h264_amf"])).family, EncoderFamily::Amf);
        assert_eq!(select_profile(&hardware(DeviceClass::GpuIntel, &["h264_qsv"])).family, EncoderFamily::Qsv);
        // Device without its encoder falls to software
        assert_eq!(select_profile(&hardware(DeviceClass::GpuNvidia, &["libx264"])).family, EncoderFamily::Software);
        // Encoder present but device mismatch
        assert_eq!(select_profile(&hardware(DeviceClass::Cpu, &["h264_nvenc"])).family, EncoderFamily::Software);
    }

    /// Encoder that fails for the listed codecs and records every attempt.
    struct ScriptedEncoder {
        failing: Vec<&'static str>,
        attempts: Mutex<Vec<String>>,
    }

    impl ScriptedEncoder {
        fn failing(codecs: &[&'static str]) -> Arc<Self> {
            Arc::new(Self {
                failing: codecs.to_vec(),
                attempts: Mutex::new(Vec::new()),
            })
        }

        fn attempts(&self) -> Vec<String> {
            self.attempts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VideoEncoder for ScriptedEncoder {
        async fn encode(
            &self,
            _timeline: &Timeline,
            _audio: &Path,
            profile: &EncodingProfile,
            output: &Path,
        ) -> MediaResult<()> {
            self.attempts.lock().unwrap().push(profile.codec.clone());
            // Partial output exists either way
            tokio::fs::write(output, b"partial").await?;
            if self.failing.contains(&profile.codec.as_str()) {
                return Err(MediaError::ffmpeg_failed("encoder unavailable", None, Some(1)));
            }
            Ok(())
        }
    }

    async fn timeline(dir: &TempDir) -> Timeline {
        let clips = vec![SceneClip {
            index: 0,
            path: PathBuf::from("scene_000.mp4"),
            duration: 2.0,
        }];
        Timeline::assemble(clips, 2.0, 24, dir.path().join("concat.txt")).await.unwrap()
    }

    #[tokio::test]
    async fn test_hardware_success_single_attempt() {
        let dir = TempDir::new().unwrap();
        let encoder = ScriptedEncoder::failing(&[]);
        let selector = EncoderSelector::new(encoder.clone());
        let outcome = selector
            .encode(&timeline(&dir).await, Path::new("a.wav"), &hardware(DeviceClass::GpuNvidia, &["h264_nvenc"]), &dir.path().join("out.mp4"))
            .await
            .unwrap();
        assert_eq!(outcome.profile.codec, "h264_nvenc");
        assert!(!outcome.used_fallback());
        assert_eq!(encoder.attempts(), vec!["h264_nvenc"]);
    }

    #[tokio::test]
    async fn test_hardware_failure_falls_back_to_software() {
        let dir = TempDir::new().unwrap();
        let encoder = ScriptedEncoder::failing(&["h264_nvenc"]);
        let selector = EncoderSelector::new(encoder.clone());
        let outcome = selector
            .encode(&timeline(&dir).await, Path::new("a.wav"), &hardware(DeviceClass::GpuNvidia, &["h264_nvenc"]), &dir.path().join("out.mp4"))
            .await
            .unwrap();
        assert_eq!(outcome.profile.codec, "libx264");
        assert!(outcome.used_fallback());
        assert_eq!(encoder.attempts(), vec!["h264_nvenc", "libx264"]);
    }

    #[tokio::test]
    async fn test_both_attempts_fail_is_fatal_without_third_try() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.mp4");
        let encoder = ScriptedEncoder::failing(&["h264_qsv", "libx264"]);
        let selector = EncoderSelector::new(encoder.clone());
        let err = selector
            .encode(&timeline(&dir).await, Path::new("a.wav"), &hardware(DeviceClass::GpuIntel, &["h264_qsv"]), &output)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::EncodingFailed { .. }));
        assert_eq!(encoder.attempts().len(), 2);
        assert!(!output.exists(), "partial output must be removed");
    }

    #[tokio::test]
    async fn test_software_primary_still_gets_one_retry() {
        let dir = TempDir::new().unwrap();
        let encoder = ScriptedEncoder::failing(&["libx264"]);
        let selector = EncoderSelector::new(encoder.clone());
        let result = selector
            .encode(&timeline(&dir).await, Path::new("a.wav"), &HardwareProfile::cpu_only(), &dir.path().join("out.mp4"))
            .await;
        assert!(result.is_err());
        assert_eq!(encoder.attempts(), vec!["libx264", "libx264"]);
    }

    #[tokio::test]
    async fn test_encode_command_bounds_output() {
        let dir = TempDir::new().unwrap();
        let clips = vec![SceneClip {
            index: 0,
            path: PathBuf::from("scene_000.mp4"),
            duration: 1.5,
        }];
        let timeline = Timeline::assemble(clips, 2.0, 24, dir.path().join("concat.txt")).await.unwrap();
        let args = build_encode_command(&timeline, Path::new("mix.wav"), &EncodingProfile::software(), Path::new("out.mp4"))
            .build_args()
            .join(" ");
        assert!(args.contains("-f concat -safe 0 -i"));
        assert!(args.contains("-vf tpad=stop_mode=clone:stop_duration=0.500"));
        assert!(args.contains("-map 0:v:0 -map 1:a:0 -c:v libx264"));
        assert!(args.contains("-t 2.000 -movflags +faststart"));
    }
}
