//! Job manifests read by the worker binary.

use autovideo_models::job::{DEFAULT_GENRE, DEFAULT_MUSIC_VOLUME, DEFAULT_VOICE_NAME};
use autovideo_models::{AspectRatio, JobId, JobRequest, ProviderCredentials};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};

/// One job, as a JSON file.
///
/// Relative paths are resolved against the manifest's directory.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct JobManifest {
    /// Job ID; generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    /// Inline script text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// Script file, used when `script` is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_path: Option<PathBuf>,
    /// Pre-recorded narration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_path: Option<PathBuf>,
    #[serde(default = "default_genre")]
    pub genre: String,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_music_volume")]
    pub music_volume: f64,
    #[serde(default)]
    pub credentials: ProviderCredentials,
}

fn default_genre() -> String {
    DEFAULT_GENRE.to_string()
}

fn default_voice() -> String {
    DEFAULT_VOICE_NAME.to_string()
}

fn default_music_volume() -> f64 {
    DEFAULT_MUSIC_VOLUME
}

impl JobManifest {
    /// Parse a manifest from JSON text.
    pub fn from_json(json: &str) -> PipelineResult<Self> {
        serde_json::from_str(json).map_err(|e| PipelineError::invalid_manifest(e.to_string()))
    }

    /// Read and parse a manifest file.
    pub async fn load(path: &Path) -> PipelineResult<Self> {
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            PipelineError::invalid_manifest(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// JSON schema of the manifest format.
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(JobManifest)
    }

    pub fn job_id(&self) -> JobId {
        match self.job_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => JobId::from_string(id),
            _ => JobId::new(),
        }
    }

    /// Load referenced files and build the request.
    pub async fn to_request(&self, base_dir: &Path) -> PipelineResult<JobRequest> {
        let script = match (&self.script, &self.script_path) {
            (Some(script), _) => script.clone(),
            (None, Some(path)) => {
                let bytes = read_referenced(base_dir, path, "script").await?;
                String::from_utf8(bytes).map_err(|_| {
                    PipelineError::invalid_manifest(format!("script {} is not UTF-8", path.display()))
                })?
            }
            (None, None) => {
                return Err(PipelineError::invalid_manifest(
                    "either script or script_path is required",
                ))
            }
        };

        let mut request = JobRequest::new(script)
            .with_genre(&self.genre)
            .with_aspect_ratio(self.aspect_ratio)
            .with_voice(&self.voice)
            .with_credentials(self.credentials.clone());
        request.music_volume = self.music_volume;

        if let Some(path) = &self.narration_path {
            request = request.with_narration(read_referenced(base_dir, path, "narration").await?);
        }
        if let Some(path) = &self.music_path {
            request.background_music = Some(read_referenced(base_dir, path, "music").await?);
        }
        Ok(request)
    }
}

async fn read_referenced(base_dir: &Path, path: &Path, what: &str) -> PipelineResult<Vec<u8>> {
    let resolved = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    };
    tokio::fs::read(&resolved).await.map_err(|e| {
        PipelineError::invalid_manifest(format!("cannot read {what} {}: {e}", resolved.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_minimal_manifest_defaults() {
        let manifest = JobManifest::from_json(r#"{"script": "A cat sleeps."}"#).unwrap();
        assert_eq!(manifest.genre, "Documentary");
        assert_eq!(manifest.voice, "Female (Default)");
        assert_eq!(manifest.aspect_ratio, AspectRatio::Landscape);
        assert!((manifest.music_volume - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_unknown_fields_and_bad_aspect() {
        assert!(matches!(
            JobManifest::from_json(r#"{"script": "x", "colour": "red"}"#),
            Err(PipelineError::InvalidManifest(_))
        ));
        assert!(JobManifest::from_json(r#"{"script": "x", "aspect_ratio": "4:3"}"#).is_err());
    }

    #[test]
    fn test_job_id() {
        let manifest = JobManifest::from_json(r#"{"script": "x", "job_id": "demo"}"#).unwrap();
        assert_eq!(manifest.job_id().as_str(), "demo");

        let manifest = JobManifest::from_json(r#"{"script": "x", "job_id": "  "}"#).unwrap();
        assert_ne!(manifest.job_id().as_str().trim(), "");
    }

    #[tokio::test]
    async fn test_relative_paths_resolve_against_manifest_dir() {
        let dir = TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("script.txt"), "A dog runs.").await.unwrap();
        tokio::fs::write(dir.path().join("voice.mp3"), b"ID3").await.unwrap();

        let manifest = JobManifest::from_json(
            r#"{"script_path": "script.txt", "narration_path": "voice.mp3", "genre": "Nature", "aspect_ratio": "9:16"}"#,
        )
        .unwrap();
        let request = manifest.to_request(dir.path()).await.unwrap();
        assert_eq!(request.script, "A dog runs.");
        assert_eq!(request.narration_audio.as_deref(), Some(&b"ID3"[..]));
        assert_eq!(request.genre, "Nature");
        assert_eq!(request.aspect_ratio, AspectRatio::Portrait);
    }

    #[tokio::test]
    async fn test_missing_script_or_file_is_invalid() {
        let dir = TempDir::new().unwrap();
        let manifest = JobManifest::from_json(r#"{"genre": "Nature"}"#).unwrap();
        assert!(matches!(
            manifest.to_request(dir.path()).await,
            Err(PipelineError::InvalidManifest(_))
        ));

        let manifest = JobManifest::from_json(r#"{"script": "x", "music_path": "missing.mp3"}"#).unwrap();
        assert!(matches!(
            manifest.to_request(dir.path()).await,
            Err(PipelineError::InvalidManifest(_))
        ));
    }

    #[test]
    fn test_schema_lists_fields() {
        let schema = serde_json::to_value(JobManifest::schema()).unwrap();
        let properties = schema["properties"].as_object().unwrap();
        assert!(properties.contains_key("script_path"));
        assert!(properties.contains_key("credentials"));
    }
}
