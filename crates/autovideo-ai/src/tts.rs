//! Text-to-speech through the `edge-tts` command line tool.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{AiError, AiResult};

/// Voice used when the requested name is unknown.
pub const DEFAULT_VOICE_ID: &str = "en-US-AriaNeural";

/// Friendly voice names offered to callers.
pub const VOICE_TABLE: &[(&str, &str)] = &[
    ("Male (Default)", "en-US-ChristopherNeural"),
    ("Female (Default)", "en-US-AriaNeural"),
    ("Islamic (Male)", "ar-SA-HamedNeural"),
    ("Islamic (Female)", "ar-SA-ZariyahNeural"),
    ("Deep (Male)", "en-US-EricNeural"),
];

/// Map a friendly voice name to an engine voice id.
///
/// Engine ids such as `en-GB-SoniaNeural` pass through unchanged; anything
/// else falls back to [`DEFAULT_VOICE_ID`].
pub fn resolve_voice(name: &str) -> &str {
    let name = name.trim();
    if let Some((_, id)) = VOICE_TABLE.iter().find(|(friendly, _)| *friendly == name) {
        return id;
    }
    if is_voice_id(name) {
        return name;
    }
    DEFAULT_VOICE_ID
}

fn is_voice_id(name: &str) -> bool {
    let parts: Vec<&str> = name.split('-').collect();
    parts.len() >= 3
        && name.ends_with("Neural")
        && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Converts text to a narration audio file.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    async fn synthesize(&self, text: &str, voice_id: &str, dest: &Path) -> AiResult<()>;
}

#[async_trait]
impl<T: TextToSpeech + ?Sized> TextToSpeech for Arc<T> {
    async fn synthesize(&self, text: &str, voice_id: &str, dest: &Path) -> AiResult<()> {
        (**self).synthesize(text, voice_id, dest).await
    }
}

/// `edge-tts` CLI engine.
#[derive(Debug, Clone)]
pub struct EdgeTts {
    binary: String,
}

impl Default for EdgeTts {
    fn default() -> Self {
        Self::new("edge-tts")
    }
}

impl EdgeTts {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }
}

#[async_trait]
impl TextToSpeech for EdgeTts {
    async fn synthesize(&self, text: &str, voice_id: &str, dest: &Path) -> AiResult<()> {
        if text.trim().is_empty() {
            return Err(AiError::synthesis_failed("nothing to synthesize"));
        }

        // Script goes through a file so long texts never hit argv limits
        let text_file = dest.with_extension("txt");
        tokio::fs::write(&text_file, text).await?;

        info!(voice = voice_id, chars = text.chars().count(), "Synthesizing narration");
        let result = Command::new(&self.binary)
            .arg("--voice")
            .arg(voice_id)
            .arg("--file")
            .arg(&text_file)
            .arg("--write-media")
            .arg(dest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;
        let _ = tokio::fs::remove_file(&text_file).await;

        let output = result
            .map_err(|e| AiError::synthesis_failed(format!("failed to run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AiError::synthesis_failed(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        let size = tokio::fs::metadata(dest).await.map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(AiError::synthesis_failed("engine produced no audio"));
        }
        debug!(bytes = size, dest = %dest.display(), "Narration written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_voice_table() {
        assert_eq!(resolve_voice("Male (Default)"), "en-US-ChristopherNeural");
        assert_eq!(resolve_voice("Female (Default)"), "en-US-AriaNeural");
        assert_eq!(resolve_voice("Islamic (Male)"), "ar-SA-HamedNeural");
        assert_eq!(resolve_voice("Islamic (Female)"), "ar-SA-ZariyahNeural");
        assert_eq!(resolve_voice("Deep (Male)"), "en-US-EricNeural");
    }

    #[test]
    fn test_resolve_voice_unknown_and_ids() {
        assert_eq!(resolve_voice("Robot"), DEFAULT_VOICE_ID);
        assert_eq!(resolve_voice(""), DEFAULT_VOICE_ID);
        assert_eq!(resolve_voice("en-GB-SoniaNeural"), "en-GB-SoniaNeural");
        assert_eq!(resolve_voice("not-a Neural"), DEFAULT_VOICE_ID);
    }

    #[tokio::test]
    async fn test_missing_binary_fails() {
        let dir = TempDir::new().unwrap();
        let tts = EdgeTts::new("definitely-not-edge-tts");
        let err = tts
            .synthesize("Hello.", DEFAULT_VOICE_ID, &dir.path().join("narration.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::SynthesisFailed(_)));
    }

    #[tokio::test]
    async fn test_empty_text_fails() {
        let dir = TempDir::new().unwrap();
        let err = EdgeTts::default()
            .synthesize("  ", DEFAULT_VOICE_ID, &dir.path().join("n.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::SynthesisFailed(_)));
    }
}
