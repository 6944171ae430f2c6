//! Event types for observing a running simulation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Job, JobId, Priority, Ticks, UserId};

/// Events emitted by the simulation as it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    /// A job was accepted into the queue.
    JobSubmitted { job: Job, timestamp: DateTime<Utc> },
    /// A submission was refused.
    JobRejected {
        job_id: JobId,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    /// A job's priority was promoted.
    JobAged {
        job_id: JobId,
        from: Priority,
        to: Priority,
        tick: Ticks,
        timestamp: DateTime<Utc>,
    },
    /// A job waited too long and was removed.
    JobExpired {
        job_id: JobId,
        user_id: UserId,
        waiting_time: Ticks,
        tick: Ticks,
        timestamp: DateTime<Utc>,
    },
    /// A tick completed.
    TickCompleted {
        tick: Ticks,
        queued: usize,
        timestamp: DateTime<Utc>,
    },
    /// A tick was aborted by a failing collaborator.
    TickFailed {
        tick: Ticks,
        error: String,
        timestamp: DateTime<Utc>,
    },
    /// The simulation shut down.
    SimulationStopped { tick: Ticks, timestamp: DateTime<Utc> },
}

impl SimEvent {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            SimEvent::JobSubmitted { timestamp, .. } => *timestamp,
            SimEvent::JobRejected { timestamp, .. } => *timestamp,
            SimEvent::JobAged { timestamp, .. } => *timestamp,
            SimEvent::JobExpired { timestamp, .. } => *timestamp,
            SimEvent::TickCompleted { timestamp, .. } => *timestamp,
            SimEvent::TickFailed { timestamp, .. } => *timestamp,
            SimEvent::SimulationStopped { timestamp, .. } => *timestamp,
        }
    }

    /// Get the job ID associated with this event, if any.
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            SimEvent::JobSubmitted { job, .. } => Some(&job.job_id),
            SimEvent::JobRejected { job_id, .. } => Some(job_id),
            SimEvent::JobAged { job_id, .. } => Some(job_id),
            SimEvent::JobExpired { job_id, .. } => Some(job_id),
            _ => None,
        }
    }

    /// Get the logical time of this event, if it happened during a tick.
    pub fn tick(&self) -> Option<Ticks> {
        match self {
            SimEvent::JobAged { tick, .. } => Some(*tick),
            SimEvent::JobExpired { tick, .. } => Some(*tick),
            SimEvent::TickCompleted { tick, .. } => Some(*tick),
            SimEvent::TickFailed { tick, .. } => Some(*tick),
            SimEvent::SimulationStopped { tick, .. } => Some(*tick),
            _ => None,
        }
    }

    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            SimEvent::JobSubmitted { job, .. } => {
                format!("Job {} submitted by {} at priority {}", job.job_id, job.user_id, job.priority)
            }
            SimEvent::JobRejected { job_id, reason, .. } => {
                format!("Job {} rejected: {}", job_id, reason)
            }
            SimEvent::JobAged {
                job_id, from, to, ..
            } => format!("Job {} aged {} -> {}", job_id, from, to),
            SimEvent::JobExpired {
                job_id,
                waiting_time,
                ..
            } => format!("Job {} expired after {} ticks", job_id, waiting_time),
            SimEvent::TickCompleted { tick, queued, .. } => {
                format!("Tick {} completed, {} queued", tick, queued)
            }
            SimEvent::TickFailed { tick, error, .. } => format!("Tick {} failed: {}", tick, error),
            SimEvent::SimulationStopped { tick, .. } => format!("Simulation stopped at tick {}", tick),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JobRequest;

    #[test]
    fn accessors_cover_job_and_tick_events() {
        let job = Job::from_request(JobRequest::new("u", "j1", 2), 0);
        let submitted = SimEvent::JobSubmitted {
            job,
            timestamp: Utc::now(),
        };
        assert_eq!(submitted.job_id(), Some(&JobId::from("j1")));
        assert_eq!(submitted.tick(), None);

        let completed = SimEvent::TickCompleted {
            tick: 4,
            queued: 0,
            timestamp: Utc::now(),
        };
        assert_eq!(completed.job_id(), None);
        assert_eq!(completed.tick(), Some(4));
        assert_eq!(completed.description(), "Tick 4 completed, 0 queued");
    }

    #[test]
    fn serializes_with_event_tag() {
        let event = SimEvent::SimulationStopped {
            tick: 3,
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "simulation_stopped");
        assert_eq!(value["tick"], 3);
    }
}
