//! The discrete-time engine that drives waiting, aging and expiry.

use serde::{Deserialize, Serialize};

use crate::aging::{PriorityAger, PriorityHandler, is_aging_due};
use crate::expiry::{ExpiryHandler, ExpiryPolicy, LogExpiryHandler};
use crate::visualizer::{TracingVisualizer, Visualizer};
use crate::{Job, JobId, JobQueue, Priority, SimError, SimulationConfig, Ticks};

/// A priority change applied during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgedJob {
    pub job_id: JobId,
    pub from: Priority,
    pub to: Priority,
}

/// What happened during one successful tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: Ticks,
    pub aged: Vec<AgedJob>,
    pub expired: Vec<Job>,
    /// Jobs left in the queue after expiry.
    pub remaining: usize,
}

/// Advances logical time over a [`JobQueue`].
///
/// The clock owns its collaborators, injected at construction, and never
/// swaps them. It borrows the queue for the duration of each tick, so the
/// caller decides how the queue is shared.
pub struct SimulationClock {
    config: SimulationConfig,
    current_time: Ticks,
    expiry: ExpiryPolicy,
    ager: Box<dyn PriorityHandler>,
    expiry_handler: Box<dyn ExpiryHandler>,
    visualizer: Box<dyn Visualizer>,
}

impl std::fmt::Debug for SimulationClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationClock")
            .field("config", &self.config)
            .field("current_time", &self.current_time)
            .finish_non_exhaustive()
    }
}

impl SimulationClock {
    /// Build a clock, failing fast on an invalid configuration.
    pub fn new(
        config: SimulationConfig,
        ager: impl PriorityHandler,
        expiry_handler: impl ExpiryHandler,
        visualizer: impl Visualizer,
    ) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            expiry: ExpiryPolicy::new(config.expiry_time),
            config,
            current_time: 0,
            ager: Box::new(ager),
            expiry_handler: Box::new(expiry_handler),
            visualizer: Box::new(visualizer),
        })
    }

    /// Clock with the stock ager, a logging expiry hook and a tracing visualizer.
    pub fn with_defaults(config: SimulationConfig) -> Result<Self, SimError> {
        let ager = PriorityAger::new(config.floor());
        Self::new(config, ager, LogExpiryHandler, TracingVisualizer)
    }

    pub fn current_time(&self) -> Ticks {
        self.current_time
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run one logical step.
    ///
    /// Order: advance time, bump every waiting time, age due jobs (each at
    /// most once), re-sort, expire from a snapshot, then notify the
    /// visualizer. A collaborator error aborts the rest of the step; time
    /// has already advanced and earlier mutations stay applied.
    pub fn tick(&mut self, queue: &mut JobQueue) -> Result<TickReport, SimError> {
        self.current_time += 1;
        let tick = self.current_time;
        tracing::debug!(tick, queued = queue.len(), "tick started");

        for job in queue.iter_mut() {
            job.waiting_time += 1;
        }

        let aged = self.age_due_jobs(queue)?;
        queue.sort_by_schedule();

        let expired = self.expire_jobs(queue, tick)?;

        let snapshot = queue.enumerate();
        self.visualizer
            .display(&snapshot, tick)
            .map_err(|reason| SimError::Visualizer { tick, reason })?;

        tracing::debug!(
            tick,
            aged = aged.len(),
            expired = expired.len(),
            remaining = queue.len(),
            "tick finished"
        );
        Ok(TickReport {
            tick,
            aged,
            expired,
            remaining: queue.len(),
        })
    }

    /// Run `ticks` ticks back to back, stopping at the first failure.
    pub fn run_simulation(
        &mut self,
        queue: &mut JobQueue,
        ticks: Ticks,
    ) -> Result<Vec<TickReport>, SimError> {
        (0..ticks).map(|_| self.tick(queue)).collect()
    }

    fn age_due_jobs(&self, queue: &mut JobQueue) -> Result<Vec<AgedJob>, SimError> {
        let interval = self.config.aging_interval;
        let mut aged = Vec::new();

        // One pass over the queue, so each job is aged at most once.
        for job in queue.iter_mut() {
            if !is_aging_due(job.waiting_time, interval) {
                continue;
            }
            let from = job.priority;
            self.ager.age_job(job).map_err(|reason| SimError::Aging {
                job_id: job.job_id.clone(),
                reason,
            })?;
            if job.priority != from {
                aged.push(AgedJob {
                    job_id: job.job_id.clone(),
                    from,
                    to: job.priority,
                });
            }
        }
        Ok(aged)
    }

    fn expire_jobs(&self, queue: &mut JobQueue, tick: Ticks) -> Result<Vec<Job>, SimError> {
        let due: Vec<JobId> = queue
            .iter()
            .filter(|job| self.expiry.is_expired(job))
            .map(|job| job.job_id.clone())
            .collect();

        let mut expired = Vec::with_capacity(due.len());
        for job_id in due {
            let notified = match queue.get(&job_id) {
                Some(job) => self.expiry_handler.on_expired(job, tick),
                None => return Err(SimError::NotFound(job_id)),
            };
            let job = queue.remove(&job_id)?;
            notified.map_err(|reason| SimError::Expiry {
                job_id: job.job_id.clone(),
                reason,
            })?;
            expired.push(job);
        }
        Ok(expired)
    }
}
