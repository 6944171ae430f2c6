//! Error taxonomy for the simulation core.

use crate::{JobId, Ticks};

/// Result type returned by collaborator hooks (aging, expiry, visualizer).
///
/// Hooks report failures as plain messages; the clock wraps them with the
/// job or tick they occurred on.
pub type HandlerResult = Result<(), String>;

/// Errors raised by the queue and the simulation clock.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Duplicate job: {0}")]
    DuplicateJob(JobId),

    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Aging failed for job {job_id}: {reason}")]
    Aging { job_id: JobId, reason: String },

    #[error("Expiry notification failed for job {job_id}: {reason}")]
    Expiry { job_id: JobId, reason: String },

    #[error("Visualizer failed at tick {tick}: {reason}")]
    Visualizer { tick: Ticks, reason: String },
}

impl SimError {
    /// Whether this error came from a collaborator during a tick.
    pub fn is_tick_failure(&self) -> bool {
        matches!(
            self,
            SimError::Aging { .. } | SimError::Expiry { .. } | SimError::Visualizer { .. }
        )
    }
}
