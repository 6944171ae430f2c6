//! Job domain types for work items waiting in the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Logical time, counted in ticks.
pub type Ticks = u64;

/// Opaque identifier for a job, unique per job instance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh ULID-backed job ID.
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque identifier for the user who submitted a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Scheduling priority. Lower values are more urgent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Priority(pub u32);

impl Priority {
    pub fn value(self) -> u32 {
        self.0
    }

    /// Move one step toward urgency, saturating at `floor`.
    ///
    /// Returns `true` if the priority changed.
    pub fn promote(&mut self, floor: Priority) -> bool {
        if self.0 > floor.0 {
            self.0 -= 1;
            true
        } else {
            false
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request to enqueue a job, as received from a submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub user_id: UserId,
    pub job_id: JobId,
    pub priority: Priority,
}

impl JobRequest {
    pub fn new(user_id: impl Into<String>, job_id: impl Into<String>, priority: u32) -> Self {
        Self {
            user_id: UserId::new(user_id),
            job_id: JobId::new(job_id),
            priority: Priority(priority),
        }
    }
}

/// A job waiting in the queue along with its dynamic state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Submitting user.
    pub user_id: UserId,
    /// Unique identifier for this job.
    pub job_id: JobId,
    /// Current priority; only the aging pass changes it.
    pub priority: Priority,
    /// Ticks spent waiting since submission.
    pub waiting_time: Ticks,
    /// Clock value when the job entered the queue.
    pub submitted_tick: Ticks,
    /// Wall-clock time of submission.
    pub submitted_at: DateTime<Utc>,
}

impl Job {
    /// Create a job from a request at the given logical time.
    pub fn from_request(request: JobRequest, now: Ticks) -> Self {
        Self {
            user_id: request.user_id,
            job_id: request.job_id,
            priority: request.priority,
            waiting_time: 0,
            submitted_tick: now,
            submitted_at: Utc::now(),
        }
    }

    /// Set the waiting time for this job.
    pub fn with_waiting_time(mut self, waiting_time: Ticks) -> Self {
        self.waiting_time = waiting_time;
        self
    }

    /// Key that defines scheduling order: `(priority, waiting_time)` ascending.
    pub fn schedule_key(&self) -> (Priority, Ticks) {
        (self.priority, self.waiting_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promote_saturates_at_floor() {
        let floor = Priority(1);
        let mut priority = Priority(2);
        assert!(priority.promote(floor));
        assert_eq!(priority, Priority(1));
        assert!(!priority.promote(floor));
        assert_eq!(priority, Priority(1));
    }

    #[test]
    fn request_becomes_fresh_job() {
        let job = Job::from_request(JobRequest::new("alice", "job-1", 4), 7);
        assert_eq!(job.job_id, JobId::from("job-1"));
        assert_eq!(job.user_id, UserId::from("alice"));
        assert_eq!(job.priority, Priority(4));
        assert_eq!(job.waiting_time, 0);
        assert_eq!(job.submitted_tick, 7);
    }

    #[test]
    fn request_deserializes_from_json() {
        let request: JobRequest =
            serde_json::from_str(r#"{"user_id":"bob","job_id":"j9","priority":2}"#).unwrap();
        assert_eq!(request, JobRequest::new("bob", "j9", 2));
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(JobId::generate(), JobId::generate());
    }
}
