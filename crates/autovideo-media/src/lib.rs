#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for the AutoVideo pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a runner that parses `-progress pipe:2`
//! - FFprobe media inspection
//! - Scene clip rendering (cover/crop, looping, captions, placeholders)
//! - Timeline concatenation with duration reconciliation
//! - Narration and background music mixing
//! - Hardware probing and encoder selection with software fallback

pub mod audio;
pub mod command;
pub mod encoder;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod hardware;
pub mod probe;
pub mod progress;
pub mod scene;
pub mod timeline;
pub mod toolkit;

pub use audio::{mix_audio, BackgroundMusic, MixRequest, MusicFit};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner, FFMPEG_DURATION_METRIC};
pub use encoder::{
    select_profile, EncodeOutcome, EncoderSelector, FfmpegVideoEncoder, VideoEncoder,
    ENCODES_METRIC,
};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{publish_output, remove_if_exists};
pub use hardware::{classify_gpu_listing, parse_encoder_list, HardwareProbe, SystemHardwareProbe};
pub use probe::{probe_duration, probe_media, probe_visual, MediaInfo};
pub use progress::FfmpegProgress;
pub use scene::{quantize_frames, render_scene, CaptionOverlay, RenderedScene, SceneRenderRequest, SceneSource};
pub use timeline::{Reconciliation, SceneClip, Timeline};
pub use toolkit::{FfmpegToolkit, MediaToolkit};
