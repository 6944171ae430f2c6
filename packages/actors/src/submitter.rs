//! Concurrent batch submission into the queue actor.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use ractor::ActorRef;
use sim_core::{Job, JobId, JobRequest};
use tokio::sync::Semaphore;

use crate::messages::{ActorError, QueueMessage};
use crate::queue_actor::call;

/// One request that did not make it into the queue.
#[derive(Debug)]
pub struct SubmissionFailure {
    pub job_id: JobId,
    pub error: ActorError,
}

/// Outcome of a batch, collected after every task has finished.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Jobs that were inserted, in completion order.
    pub accepted: Vec<Job>,
    /// Requests that failed, with the reason.
    pub failures: Vec<SubmissionFailure>,
    /// Requests whose reply timed out. The actor may still have applied
    /// them, so their outcome is only known from a later snapshot.
    pub unconfirmed: Vec<JobId>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.unconfirmed.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.accepted.len() + self.failures.len() + self.unconfirmed.len()
    }

    /// Number of failures caused by an already-present job ID.
    pub fn duplicates(&self) -> usize {
        self.failures.iter().filter(|f| f.error.is_duplicate()).count()
    }
}

/// Fans a batch of requests out to one task each and joins them.
///
/// Mutation is still serialized: every task only sends a message to the
/// queue actor, which applies inserts one at a time.
#[derive(Clone)]
pub struct ConcurrentSubmitter {
    queue: ActorRef<QueueMessage>,
    timeout: Duration,
    limit: Option<Arc<Semaphore>>,
    jitter: Duration,
}

impl ConcurrentSubmitter {
    pub fn new(queue: ActorRef<QueueMessage>, timeout: Duration) -> Self {
        Self {
            queue,
            timeout,
            limit: None,
            jitter: Duration::ZERO,
        }
    }

    /// Cap the number of submission tasks in flight at once.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.limit = Some(Arc::new(Semaphore::new(max_in_flight.max(1))));
        self
    }

    /// Delay each task by a deterministic fraction of `jitter` before it
    /// submits, to shake out ordering assumptions.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Submit every request concurrently and wait for all of them.
    ///
    /// Insertion order across tasks is unspecified. Individual failures do
    /// not stop the other tasks; they are reported together. A request that
    /// timed out lands in `unconfirmed`, not `failures`.
    pub async fn submit_batch(&self, requests: Vec<JobRequest>) -> BatchReport {
        let job_ids: Vec<JobId> = requests.iter().map(|r| r.job_id.clone()).collect();

        let tasks: Vec<_> = requests
            .into_iter()
            .enumerate()
            .map(|(index, request)| {
                let queue = self.queue.clone();
                let limit = self.limit.clone();
                let timeout = self.timeout;
                let delay = stagger(self.jitter, index);
                tokio::spawn(async move {
                    let _permit = match limit {
                        Some(semaphore) => Some(
                            semaphore
                                .acquire_owned()
                                .await
                                .map_err(|e| ActorError::Actor(e.to_string()))?,
                        ),
                        None => None,
                    };
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    let result = call(&queue, timeout, |reply| QueueMessage::Submit {
                        request: Box::new(request),
                        reply,
                    })
                    .await?;
                    result.map_err(ActorError::from)
                })
            })
            .collect();

        tracing::debug!(tasks = tasks.len(), "submission batch started");
        let results = join_all(tasks).await;

        let mut report = BatchReport::default();
        for (job_id, joined) in job_ids.into_iter().zip(results) {
            match joined {
                Ok(Ok(job)) => report.accepted.push(job),
                Ok(Err(ActorError::Timeout)) => report.unconfirmed.push(job_id),
                Ok(Err(error)) => report.failures.push(SubmissionFailure { job_id, error }),
                Err(e) => report.failures.push(SubmissionFailure {
                    job_id,
                    error: ActorError::Actor(format!("submission task failed: {}", e)),
                }),
            }
        }

        if !report.is_success() {
            tracing::warn!(
                accepted = report.accepted.len(),
                failed = report.failures.len(),
                unconfirmed = report.unconfirmed.len(),
                "submission batch finished with failures"
            );
        } else {
            tracing::debug!(accepted = report.accepted.len(), "submission batch finished");
        }
        report
    }
}

// Spread delays over 0..=jitter in a fixed, index-dependent pattern.
fn stagger(jitter: Duration, index: usize) -> Duration {
    if jitter.is_zero() {
        return Duration::ZERO;
    }
    let slot = (index.wrapping_mul(7919) % 17) as u32;
    jitter * slot / 16
}
