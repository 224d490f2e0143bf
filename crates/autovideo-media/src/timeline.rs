//! Timeline assembly and duration reconciliation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{MediaError, MediaResult};
use crate::filters::hold_last_frame;

/// A rendered scene clip placed on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneClip {
    pub index: usize,
    pub path: PathBuf,
    /// Clip duration in seconds
    pub duration: f64,
}

/// How the concatenated clips must be adjusted to match the narration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "seconds", rename_all = "snake_case")]
pub enum Reconciliation {
    /// Clips already match within half a frame
    Exact,
    /// Clips run long; the output bound cuts this much
    Trim(f64),
    /// Clips run short; the last frame is held this long
    Extend(f64),
}

impl Reconciliation {
    /// Compare the clip total against the narration duration.
    pub fn compute(clips_total: f64, target: f64, fps: u32) -> Self {
        let half_frame = 0.5 / fps.max(1) as f64;
        let drift = clips_total - target;
        if drift.abs() < half_frame {
            Reconciliation::Exact
        } else if drift > 0.0 {
            Reconciliation::Trim(drift)
        } else {
            Reconciliation::Extend(-drift)
        }
    }

    /// Video filter needed to realize the adjustment, if any.
    pub fn video_filter(&self) -> Option<String> {
        match self {
            Reconciliation::Extend(seconds) => Some(hold_last_frame(*seconds)),
            Reconciliation::Exact | Reconciliation::Trim(_) => None,
        }
    }
}

/// Ordered scene clips reconciled against the narration length.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    clips: Vec<SceneClip>,
    /// Concat demuxer list on disk
    concat_list: PathBuf,
    /// Narration duration the output is bounded to
    target_duration: f64,
    reconciliation: Reconciliation,
}

impl Timeline {
    /// Order the clips, write the concat list and compute the reconciliation.
    pub async fn assemble(
        mut clips: Vec<SceneClip>,
        target_duration: f64,
        fps: u32,
        concat_list: impl AsRef<Path>,
    ) -> MediaResult<Self> {
        if clips.is_empty() {
            return Err(MediaError::invalid_media("timeline has no clips"));
        }
        if !(target_duration.is_finite() && target_duration > 0.0) {
            return Err(MediaError::invalid_media(format!(
                "invalid target duration {target_duration}"
            )));
        }

        clips.sort_by_key(|c| c.index);
        let concat_list = concat_list.as_ref().to_path_buf();
        fs::write(&concat_list, concat_list_contents(&clips)).await?;

        let total: f64 = clips.iter().map(|c| c.duration).sum();
        let reconciliation = Reconciliation::compute(total, target_duration, fps);

        Ok(Self {
            clips,
            concat_list,
            target_duration,
            reconciliation,
        })
    }

    pub fn clips(&self) -> &[SceneClip] {
        &self.clips
    }

    pub fn concat_list(&self) -> &Path {
        &self.concat_list
    }

    pub fn target_duration(&self) -> f64 {
        self.target_duration
    }

    pub fn reconciliation(&self) -> Reconciliation {
        self.reconciliation
    }

    /// Sum of clip durations before reconciliation.
    pub fn clips_duration(&self) -> f64 {
        self.clips.iter().map(|c| c.duration).sum()
    }
}

/// Concat demuxer list for the clips, in order.
pub fn concat_list_contents(clips: &[SceneClip]) -> String {
    clips
        .iter()
        .map(|c| {
            let path = c.path.to_string_lossy().replace('\'', "'\\''");
            format!("file '{}'\n", path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn clip(index: usize, duration: f64) -> SceneClip {
        SceneClip {
            index,
            path: PathBuf::from(format!("/tmp/job/scene_{index:03}.mp4")),
            duration,
        }
    }

    #[test]
    fn test_reconciliation_thresholds() {
        // Half a frame at 24 fps is ~0.0208s
        assert_eq!(Reconciliation::compute(3.01, 3.0, 24), Reconciliation::Exact);
        assert!(matches!(Reconciliation::compute(3.5, 3.0, 24), Reconciliation::Trim(d) if (d - 0.5).abs() < 1e-9));
        assert!(matches!(Reconciliation::compute(2.75, 3.0, 24), Reconciliation::Extend(d) if (d - 0.25).abs() < 1e-9));
    }

    #[test]
    fn test_only_extend_needs_filter() {
        assert!(Reconciliation::Exact.video_filter().is_none());
        assert!(Reconciliation::Trim(1.0).video_filter().is_none());
        assert_eq!(
            Reconciliation::Extend(0.5).video_filter().as_deref(),
            Some("tpad=stop_mode=clone:stop_duration=0.500")
        );
    }

    #[test]
    fn test_concat_list_escapes_quotes() {
        let clips = vec![SceneClip {
            index: 0,
            path: PathBuf::from("/tmp/it's/scene.mp4"),
            duration: 1.0,
        }];
        assert_eq!(concat_list_contents(&clips), "file '/tmp/it'\\''s/scene.mp4'\n");
    }

    #[tokio::test]
    async fn test_assemble_orders_clips_and_writes_list() {
        let dir = TempDir::new().unwrap();
        let list = dir.path().join("concat.txt");
        let timeline = Timeline::assemble(vec![clip(1, 1.5), clip(0, 1.0)], 2.5, 24, &list)
            .await
            .unwrap();

        assert_eq!(timeline.clips()[0].index, 0);
        assert_eq!(timeline.reconciliation(), Reconciliation::Exact);
        let contents = fs::read_to_string(&list).await.unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines, vec!["file '/tmp/job/scene_000.mp4'", "file '/tmp/job/scene_001.mp4'"]);
    }

    #[tokio::test]
    async fn test_assemble_rejects_empty() {
        let dir = TempDir::new().unwrap();
        let err = Timeline::assemble(Vec::new(), 1.0, 24, dir.path().join("c.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidMedia(_)));
    }
}
