//! Priority aging.
//!
//! Aging is incremental: whenever a job's waiting time reaches a positive
//! multiple of the aging interval it is promoted one step toward urgency.
//! Waiting time keeps accumulating, so aging never postpones expiry.

use crate::{HandlerResult, Job, Priority, Ticks};

/// Capability invoked for each job that is due for aging.
pub trait PriorityHandler: Send + Sync + 'static {
    /// Mutate the job in place.
    fn age_job(&self, job: &mut Job) -> HandlerResult;
}

impl<F> PriorityHandler for F
where
    F: Fn(&mut Job) -> HandlerResult + Send + Sync + 'static,
{
    fn age_job(&self, job: &mut Job) -> HandlerResult {
        (self)(job)
    }
}

/// Whether `waiting_time` is a positive multiple of `aging_interval`.
pub fn is_aging_due(waiting_time: Ticks, aging_interval: Ticks) -> bool {
    aging_interval > 0 && waiting_time > 0 && waiting_time % aging_interval == 0
}

/// Default aging policy: promote by one, saturating at a floor.
#[derive(Debug, Clone, Copy)]
pub struct PriorityAger {
    floor: Priority,
}

impl PriorityAger {
    pub fn new(floor: Priority) -> Self {
        Self { floor }
    }

    pub fn floor(&self) -> Priority {
        self.floor
    }
}

impl Default for PriorityAger {
    fn default() -> Self {
        Self::new(Priority(1))
    }
}

impl PriorityHandler for PriorityAger {
    fn age_job(&self, job: &mut Job) -> HandlerResult {
        if job.priority.promote(self.floor) {
            tracing::debug!(
                job_id = %job.job_id,
                priority = job.priority.value(),
                waiting_time = job.waiting_time,
                "job aged"
            );
        }
        Ok(())
    }
}
