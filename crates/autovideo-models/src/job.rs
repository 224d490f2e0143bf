//! Job identity and request payload.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::AspectRatio;

/// Default genre when the caller gives none.
pub const DEFAULT_GENRE: &str = "Documentary";
/// Default friendly voice name.
pub const DEFAULT_VOICE_NAME: &str = "Female (Default)";
/// Default background music volume factor.
pub const DEFAULT_MUSIC_VOLUME: f64 = 0.1;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// API credentials for external providers. A missing key disables its provider.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProviderCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pexels_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixabay_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
    /// Custom Gemini endpoint (proxy or regional host)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_endpoint: Option<String>,
}

impl ProviderCredentials {
    /// Fill unset keys from `fallback`.
    pub fn or(self, fallback: ProviderCredentials) -> Self {
        Self {
            pexels_api_key: non_blank(self.pexels_api_key).or(non_blank(fallback.pexels_api_key)),
            pixabay_api_key: non_blank(self.pixabay_api_key)
                .or(non_blank(fallback.pixabay_api_key)),
            gemini_api_key: non_blank(self.gemini_api_key).or(non_blank(fallback.gemini_api_key)),
            gemini_endpoint: non_blank(self.gemini_endpoint)
                .or(non_blank(fallback.gemini_endpoint)),
        }
    }

    pub fn has_gemini(&self) -> bool {
        self.gemini_api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// Keys never reach log output.
impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(v: &Option<String>) -> &'static str {
            if v.is_some() {
                "<set>"
            } else {
                "<unset>"
            }
        }
        f.debug_struct("ProviderCredentials")
            .field("pexels_api_key", &mask(&self.pexels_api_key))
            .field("pixabay_api_key", &mask(&self.pixabay_api_key))
            .field("gemini_api_key", &mask(&self.gemini_api_key))
            .field("gemini_endpoint", &self.gemini_endpoint)
            .finish()
    }
}

/// Everything needed to produce one video.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub script: String,
    /// Pre-recorded narration; when absent the script is synthesized
    pub narration_audio: Option<Vec<u8>>,
    pub background_music: Option<Vec<u8>>,
    pub genre: String,
    pub aspect_ratio: AspectRatio,
    pub voice_name: String,
    /// Background music gain in [0, 1]
    pub music_volume: f64,
    pub credentials: ProviderCredentials,
}

impl JobRequest {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            narration_audio: None,
            background_music: None,
            genre: DEFAULT_GENRE.to_string(),
            aspect_ratio: AspectRatio::default(),
            voice_name: DEFAULT_VOICE_NAME.to_string(),
            music_volume: DEFAULT_MUSIC_VOLUME,
            credentials: ProviderCredentials::default(),
        }
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = genre.into();
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_voice(mut self, voice_name: impl Into<String>) -> Self {
        self.voice_name = voice_name.into();
        self
    }

    pub fn with_narration(mut self, bytes: Vec<u8>) -> Self {
        self.narration_audio = Some(bytes);
        self
    }

    pub fn with_music(mut self, bytes: Vec<u8>, volume: f64) -> Self {
        self.background_music = Some(bytes);
        self.music_volume = volume;
        self
    }

    pub fn with_credentials(mut self, credentials: ProviderCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Music volume clamped to [0, 1]; NaN is treated as silence.
    pub fn effective_music_volume(&self) -> f64 {
        if self.music_volume.is_nan() {
            0.0
        } else {
            self.music_volume.clamp(0.0, 1.0)
        }
    }

    /// Reject requests that cannot produce a video at all.
    pub fn validate(&self) -> Result<(), JobRequestError> {
        if self.narration_audio.as_ref().is_some_and(|b| b.is_empty()) {
            return Err(JobRequestError::EmptyNarration);
        }
        if self.genre.trim().is_empty() {
            return Err(JobRequestError::MissingGenre);
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobRequestError {
    #[error("Narration audio was supplied but is empty")]
    EmptyNarration,
    #[error("Genre must not be blank")]
    MissingGenre,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let req = JobRequest::new("Hello there.");
        assert_eq!(req.genre, "Documentary");
        assert_eq!(req.voice_name, "Female (Default)");
        assert_eq!(req.aspect_ratio, AspectRatio::Landscape);
        assert!((req.effective_music_volume() - 0.1).abs() < 1e-9);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_music_volume_is_clamped() {
        let req = JobRequest::new("x").with_music(vec![1, 2, 3], 4.0);
        assert_eq!(req.effective_music_volume(), 1.0);
        let req = JobRequest::new("x").with_music(vec![1], -0.5);
        assert_eq!(req.effective_music_volume(), 0.0);
        let req = JobRequest::new("x").with_music(vec![1], f64::NAN);
        assert_eq!(req.effective_music_volume(), 0.0);
    }

    #[test]
    fn test_validate_rejects_empty_narration() {
        let req = JobRequest::new("x").with_narration(Vec::new());
        assert_eq!(req.validate(), Err(JobRequestError::EmptyNarration));
    }

    #[test]
    fn test_credentials_fallback_and_masking() {
        let explicit = ProviderCredentials {
            pexels_api_key: Some("job-key".into()),
            gemini_api_key: Some("  ".into()),
            ..Default::default()
        };
        let env = ProviderCredentials {
            pexels_api_key: Some("env-key".into()),
            gemini_api_key: Some("gem".into()),
            ..Default::default()
        };
        let merged = explicit.or(env);
        assert_eq!(merged.pexels_api_key.as_deref(), Some("job-key"));
        assert_eq!(merged.gemini_api_key.as_deref(), Some("gem"));
        assert!(merged.has_gemini());
        assert!(merged.pixabay_api_key.is_none());

        let debug = format!("{merged:?}");
        assert!(!debug.contains("job-key"));
        assert!(debug.contains("<set>"));
    }

    #[test]
    fn test_job_id_is_unique() {
        assert_ne!(JobId::new(), JobId::new());
        assert_eq!(JobId::from_string("abc").to_string(), "abc");
    }
}
