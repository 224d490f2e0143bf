//! Shared data models for the AutoVideo pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Scenes and narration tracks
//! - Caption styles
//! - Per-scene visual assets
//! - Hardware and encoding profiles
//! - Job requests and pipeline events

pub mod aspect;
pub mod caption;
pub mod encoding;
pub mod event;
pub mod job;
pub mod scene;
pub mod visual;

// Re-export common types
pub use aspect::{AspectRatio, FrameSize};
pub use caption::{wrap_caption, CaptionPosition, CaptionStyle, FontMood, HexColor};
pub use encoding::{DeviceClass, EncoderFamily, EncodingProfile, HardwareProfile, OUTPUT_FPS};
pub use event::{PipelineEvent, PipelineStep, StepOutcome};
pub use job::{JobId, JobRequest, JobRequestError, ProviderCredentials};
pub use scene::{NarrationAudio, NarrationOrigin, Scene};
pub use visual::{Rgb, VisualAsset, VisualKind, PLACEHOLDER_COLOR};
