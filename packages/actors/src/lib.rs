//! Actor layer for the job queue simulation.
//!
//! This crate wraps the synchronous tick engine from `sim_core` in a
//! Ractor actor so that many producers and one clock can share a queue.
//!
//! # Architecture
//!
//! - `QueueActor` - Sole owner of the job queue and the clock; applies
//!   submissions, ticks and removals one message at a time
//! - `ConcurrentSubmitter` - Fans a batch out to one task per request and
//!   joins them, collecting per-job failures
//! - `Simulation` - Handle that spawns the actor and drives ticks
//!
//! # Usage
//!
//! ```ignore
//! use actors::Simulation;
//! use sim_core::{JobRequest, SimulationConfig};
//!
//! let sim = Simulation::with_defaults(SimulationConfig::new(3, 5)).await?;
//! let report = sim.submit_batch(vec![JobRequest::new("alice", "job-1", 3)]).await;
//! sim.run_simulation(10).await?;
//! ```

mod messages;
mod queue_actor;
mod simulation;
mod submitter;

pub use messages::{ActorError, ActorResult, QueueMessage};
pub use queue_actor::{QueueActor, QueueActorState, drain_events};
pub use simulation::Simulation;
pub use submitter::{BatchReport, ConcurrentSubmitter, SubmissionFailure};

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort};
/// Re-export the cancellation token used by `Simulation::run_until_cancelled`.
pub use tokio_util::sync::CancellationToken;
