//! Narrated video pipeline.
//!
//! This crate provides:
//! - Script segmentation and keyword extraction
//! - Narration provisioning (supplied or synthesized)
//! - Per-scene visual sourcing with a degradation ladder
//! - Caption styling and scene composition
//! - Timeline assembly, audio mixing, encoding and publishing
//! - Job manifests, configuration, logging, metrics and events

pub mod captions;
pub mod composer;
pub mod config;
pub mod content;
pub mod error;
pub mod events;
pub mod keywords;
pub mod logging;
pub mod manifest;
pub mod metrics;
pub mod narration;
pub mod pipeline;
pub mod segmenter;
pub mod services;
pub mod workspace;

pub use captions::CaptionStyler;
pub use composer::SceneComposer;
pub use config::WorkerConfig;
pub use content::{ContentStrategy, SceneContentResolver, SceneContext};
pub use error::{PipelineError, PipelineResult};
pub use events::EventEmitter;
pub use logging::JobLogger;
pub use manifest::JobManifest;
pub use pipeline::PipelineOrchestrator;
pub use services::PipelineServices;
pub use workspace::JobWorkspace;
