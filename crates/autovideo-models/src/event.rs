//! Structured progress events.
//!
//! Events describe what the pipeline did; they never drive control flow.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::JobId;

/// Pipeline step an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Job,
    Segmentation,
    Narration,
    HardwareProbe,
    Keywords,
    ContentSourcing,
    Styling,
    Composition,
    Assembly,
    AudioMix,
    Encoding,
    Publish,
    Cleanup,
}

impl PipelineStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStep::Job => "job",
            PipelineStep::Segmentation => "segmentation",
            PipelineStep::Narration => "narration",
            PipelineStep::HardwareProbe => "hardware_probe",
            PipelineStep::Keywords => "keywords",
            PipelineStep::ContentSourcing => "content_sourcing",
            PipelineStep::Styling => "styling",
            PipelineStep::Composition => "composition",
            PipelineStep::Assembly => "assembly",
            PipelineStep::AudioMix => "audio_mix",
            PipelineStep::Encoding => "encoding",
            PipelineStep::Publish => "publish",
            PipelineStep::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Started,
    Succeeded,
    /// A recoverable failure; the next fallback was taken
    FellBack,
    Failed,
}

impl StepOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepOutcome::Started => "started",
            StepOutcome::Succeeded => "succeeded",
            StepOutcome::FellBack => "fell_back",
            StepOutcome::Failed => "failed",
        }
    }
}

/// One progress record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PipelineEvent {
    pub job_id: JobId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_index: Option<usize>,
    pub step: PipelineStep,
    pub outcome: StepOutcome,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl PipelineEvent {
    pub fn new(
        job_id: JobId,
        step: PipelineStep,
        outcome: StepOutcome,
        message: impl Into<String>,
    ) -> Self {
        Self {
            job_id,
            scene_index: None,
            step,
            outcome,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Attach a scene index.
    pub fn for_scene(mut self, scene_index: usize) -> Self {
        self.scene_index = Some(scene_index);
        self
    }
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scene_index {
            Some(i) => write!(
                f,
                "[{}] scene {} {} {}: {}",
                self.job_id,
                i,
                self.step,
                self.outcome.as_str(),
                self.message
            ),
            None => write!(
                f,
                "[{}] {} {}: {}",
                self.job_id,
                self.step,
                self.outcome.as_str(),
                self.message
            ),
        }
    }
}
