//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding process installs a recorder.

use metrics::{counter, histogram};

// =============================================================================
// Metric Names
// =============================================================================

pub mod names {
    /// Jobs that produced a video.
    pub const JOBS_COMPLETED_TOTAL: &str = "autovideo_jobs_completed_total";

    /// Jobs that failed, by error kind.
    pub const JOBS_FAILED_TOTAL: &str = "autovideo_jobs_failed_total";

    /// Wall time per job in seconds, by outcome.
    pub const JOB_DURATION_SECONDS: &str = "autovideo_job_duration_seconds";

    /// Visuals chosen per scene, by kind.
    pub const SCENE_VISUALS_TOTAL: &str = "autovideo_scene_visuals_total";

    /// Recovered sourcing failures, by strategy.
    pub const SOURCING_FAILURES_TOTAL: &str = "autovideo_sourcing_failures_total";

    /// Scenes captioned with the default style after a styling failure.
    pub const CAPTION_STYLE_FALLBACKS_TOTAL: &str = "autovideo_caption_style_fallbacks_total";

    /// Encode attempts, by codec and outcome (recorded in `autovideo-media`).
    pub use autovideo_media::ENCODES_METRIC as ENCODES_TOTAL;

    /// FFmpeg wall time, by operation (recorded in `autovideo-media`).
    pub use autovideo_media::FFMPEG_DURATION_METRIC as FFMPEG_DURATION_SECONDS;
}

// =============================================================================
// Recording Functions
// =============================================================================

pub fn record_job_completed(duration_secs: f64) {
    counter!(names::JOBS_COMPLETED_TOTAL).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, "outcome" => "success").record(duration_secs);
}

pub fn record_job_failed(error_kind: &'static str, duration_secs: f64) {
    counter!(names::JOBS_FAILED_TOTAL, "error" => error_kind).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, "outcome" => "failure").record(duration_secs);
}

pub fn record_scene_visual(kind: &'static str) {
    counter!(names::SCENE_VISUALS_TOTAL, "kind" => kind).increment(1);
}

pub fn record_sourcing_failure(strategy: &'static str) {
    counter!(names::SOURCING_FAILURES_TOTAL, "strategy" => strategy).increment(1);
}

pub fn record_caption_style_fallback() {
    counter!(names::CAPTION_STYLE_FALLBACKS_TOTAL).increment(1);
}
