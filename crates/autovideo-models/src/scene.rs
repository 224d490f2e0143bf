//! Scenes and narration tracks.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One script sentence with its slice of narration time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    /// Zero-based position in the script
    pub index: usize,
    /// Sentence text (trimmed)
    pub text: String,
    /// Apportioned duration in seconds
    pub duration: f64,
}

impl Scene {
    pub fn new(index: usize, text: impl Into<String>, duration: f64) -> Self {
        Self {
            index,
            text: text.into(),
            duration,
        }
    }

    /// Short preview of the scene text for log lines.
    pub fn preview(&self, max_chars: usize) -> String {
        if self.text.chars().count() <= max_chars {
            return self.text.clone();
        }
        let head: String = self.text.chars().take(max_chars).collect();
        format!("{head}...")
    }
}

/// Total duration of a set of scenes.
pub fn total_duration(scenes: &[Scene]) -> f64 {
    scenes.iter().map(|s| s.duration).sum()
}

/// Where the narration track came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NarrationOrigin {
    /// Caller supplied the audio bytes
    Supplied,
    /// Produced by the text-to-speech engine
    Synthesized,
}

/// The narration track that fixes the job's total duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NarrationAudio {
    pub path: PathBuf,
    /// Duration in seconds
    pub duration: f64,
    pub origin: NarrationOrigin,
}
