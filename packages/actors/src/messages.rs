//! Message types for actor communication.

use ractor::RpcReplyPort;
use sim_core::{Job, JobId, JobRequest, QueueSnapshot, SimError, SimEvent, Ticks, TickReport};
use tokio::sync::broadcast;

/// Messages for the QueueActor.
///
/// The actor handles one message at a time, so every variant below is
/// applied to the queue atomically with respect to the others.
#[derive(Debug)]
pub enum QueueMessage {
    /// Insert a new job.
    Submit {
        request: Box<JobRequest>,
        reply: RpcReplyPort<Result<Job, SimError>>,
    },

    /// Advance the clock by one tick.
    Tick {
        reply: RpcReplyPort<Result<TickReport, SimError>>,
    },

    /// Remove a job by ID.
    Remove {
        job_id: JobId,
        reply: RpcReplyPort<Result<Job, SimError>>,
    },

    /// Get a read-only view of the queue.
    Snapshot { reply: RpcReplyPort<QueueSnapshot> },

    /// Get the current logical time.
    CurrentTime { reply: RpcReplyPort<Ticks> },

    /// Forward events to another broadcaster.
    Subscribe { sender: broadcast::Sender<SimEvent> },

    /// Stop the actor.
    Shutdown,
}

/// Result type for actor-facing operations.
pub type ActorResult<T> = Result<T, ActorError>;

/// Error type for actor operations.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    #[error(transparent)]
    Sim(#[from] SimError),

    #[error("Failed to spawn actor: {0}")]
    Spawn(String),

    #[error("Actor error: {0}")]
    Actor(String),

    #[error("Timeout")]
    Timeout,
}

impl ActorError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, ActorError::Sim(SimError::DuplicateJob(_)))
    }
}
