//! Expiry of starved jobs.

use std::sync::{Arc, Mutex};

use crate::{HandlerResult, Job, Ticks};

/// Decides whether a job has waited too long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    expiry_time: Ticks,
}

impl ExpiryPolicy {
    pub fn new(expiry_time: Ticks) -> Self {
        Self { expiry_time }
    }

    pub fn expiry_time(&self) -> Ticks {
        self.expiry_time
    }

    pub fn is_expired(&self, job: &Job) -> bool {
        job.waiting_time >= self.expiry_time
    }
}

/// Notification hook run once for each expiring job, before it is removed.
///
/// Handlers must not remove the job themselves; removal belongs to the clock.
pub trait ExpiryHandler: Send + Sync + 'static {
    fn on_expired(&self, job: &Job, tick: Ticks) -> HandlerResult;
}

impl<F> ExpiryHandler for F
where
    F: Fn(&Job, Ticks) -> HandlerResult + Send + Sync + 'static,
{
    fn on_expired(&self, job: &Job, tick: Ticks) -> HandlerResult {
        (self)(job, tick)
    }
}

/// Logs each expiry as a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogExpiryHandler;

impl ExpiryHandler for LogExpiryHandler {
    fn on_expired(&self, job: &Job, tick: Ticks) -> HandlerResult {
        tracing::warn!(
            job_id = %job.job_id,
            user_id = %job.user_id,
            priority = job.priority.value(),
            waiting_time = job.waiting_time,
            tick,
            "job expired"
        );
        Ok(())
    }
}

/// Records expired jobs so they can be inspected after the run.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct DeadLetterHandler {
    expired: Arc<Mutex<Vec<(Ticks, Job)>>>,
}

impl DeadLetterHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expired jobs with the tick they expired on, oldest first.
    pub fn expired(&self) -> Vec<(Ticks, Job)> {
        self.expired
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.expired.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ExpiryHandler for DeadLetterHandler {
    fn on_expired(&self, job: &Job, tick: Ticks) -> HandlerResult {
        let mut expired = self
            .expired
            .lock()
            .map_err(|_| "dead letter record poisoned".to_string())?;
        expired.push((tick, job.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JobRequest;

    fn job(waiting_time: Ticks) -> Job {
        Job::from_request(JobRequest::new("u", "j", 1), 0).with_waiting_time(waiting_time)
    }

    #[test]
    fn expired_at_or_beyond_threshold() {
        let policy = ExpiryPolicy::new(5);
        assert!(!policy.is_expired(&job(4)));
        assert!(policy.is_expired(&job(5)));
        assert!(policy.is_expired(&job(9)));
    }

    #[test]
    fn dead_letter_clones_share_record() {
        let handler = DeadLetterHandler::new();
        let observer = handler.clone();
        handler.on_expired(&job(5), 5).unwrap();

        assert_eq!(observer.len(), 1);
        let (tick, recorded) = &observer.expired()[0];
        assert_eq!(*tick, 5);
        assert_eq!(recorded.waiting_time, 5);
    }
}
