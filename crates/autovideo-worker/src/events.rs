//! Pipeline event emission.

use autovideo_models::{JobId, PipelineEvent, PipelineStep, StepOutcome};
use tokio::sync::mpsc;

/// Sends [`PipelineEvent`]s for one job.
///
/// Uses a bounded channel and never blocks the pipeline: when the consumer
/// lags, events are dropped.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    job_id: JobId,
    tx: Option<mpsc::Sender<PipelineEvent>>,
}

impl EventEmitter {
    /// Emitter plus the receiving end of its channel.
    pub fn channel(job_id: JobId, buffer: usize) -> (Self, mpsc::Receiver<PipelineEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { job_id, tx: Some(tx) }, rx)
    }

    /// Emitter that discards everything.
    pub fn noop(job_id: JobId) -> Self {
        Self { job_id, tx: None }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Send an event (non-blocking).
    pub fn send(&self, event: PipelineEvent) {
        if let Some(tx) = &self.tx {
            // Drop on full or closed channel
            let _ = tx.try_send(event);
        }
    }

    /// Job-level event.
    pub fn emit(&self, step: PipelineStep, outcome: StepOutcome, message: impl Into<String>) {
        self.send(PipelineEvent::new(self.job_id.clone(), step, outcome, message));
    }

    /// Event about one scene.
    pub fn emit_scene(
        &self,
        scene_index: usize,
        step: PipelineStep,
        outcome: StepOutcome,
        message: impl Into<String>,
    ) {
        self.send(
            PipelineEvent::new(self.job_id.clone(), step, outcome, message).for_scene(scene_index),
        );
    }
}
