//! Core types and the tick engine for the job queue simulation.
//!
//! This crate contains everything that does not need a runtime:
//! - Job, JobRequest and JobQueue for the work items and their container
//! - PriorityAger, ExpiryPolicy and Visualizer collaborators
//! - SimulationClock, which advances logical time over a queue
//! - Events for observing a run

pub mod aging;
mod clock;
mod config;
mod error;
mod events;
pub mod expiry;
mod job;
mod queue;
pub mod visualizer;

pub use aging::{PriorityAger, PriorityHandler};
pub use clock::{AgedJob, SimulationClock, TickReport};
pub use config::{CONFIG_PATH_ENV, SimulationConfig};
pub use error::{HandlerResult, SimError};
pub use events::SimEvent;
pub use expiry::{DeadLetterHandler, ExpiryHandler, ExpiryPolicy, LogExpiryHandler};
pub use job::{Job, JobId, JobRequest, Priority, Ticks, UserId};
pub use queue::{JobQueue, QueueSnapshot};
pub use visualizer::{TableVisualizer, TracingVisualizer, Visualizer, render_table};
