//! Structured job logging.

use autovideo_models::{JobId, PipelineStep};
use std::time::Instant;
use tracing::{error, info, warn, Span};

/// Logger bound to one job run.
///
/// Every line carries the job ID and operation; completion and failure lines
/// also carry the elapsed wall time.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: String,
    started: Instant,
}

impl JobLogger {
    pub fn new(job_id: &JobId, operation: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation: operation.to_string(),
            started: Instant::now(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    /// Progress within one pipeline step.
    pub fn log_step(&self, step: PipelineStep, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            step = step.as_str(),
            elapsed_secs = self.elapsed_secs(),
            "{}: {}", step, message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    /// Warning about a recovered per-scene failure.
    pub fn log_scene_warning(&self, scene_index: usize, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = %self.operation,
            scene_index,
            "Scene warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            operation = %self.operation,
            elapsed_secs = self.elapsed_secs(),
            "Job failed: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            elapsed_secs = self.elapsed_secs(),
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Seconds since the logger was created.
    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Span wrapping the whole job; scene work nests under it.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            operation = %self.operation
        )
    }
}
