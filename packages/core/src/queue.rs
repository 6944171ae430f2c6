//! The job container shared by submitters and the clock.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Job, JobId, SimError, Ticks};

/// Ordered container of live jobs.
///
/// The queue is not scheduling-aware; it only guarantees that no two jobs
/// share a `job_id`. Ordering is whatever the last `sort_by_schedule` left.
#[derive(Debug, Clone, Default)]
pub struct JobQueue {
    jobs: Vec<Job>,
    ids: HashSet<JobId>,
}

impl JobQueue {
    /// Create a new empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn contains(&self, job_id: &JobId) -> bool {
        self.ids.contains(job_id)
    }

    pub fn get(&self, job_id: &JobId) -> Option<&Job> {
        self.jobs.iter().find(|j| &j.job_id == job_id)
    }

    /// Owned snapshot of the jobs in current order.
    ///
    /// The snapshot is detached from the queue, so callers may keep it
    /// while the queue is mutated.
    pub fn enumerate(&self) -> Vec<Job> {
        self.jobs.clone()
    }

    /// Borrowing view of the jobs in current order.
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Job> {
        self.jobs.iter_mut()
    }

    /// Append a job, rejecting a `job_id` that is already present.
    pub fn insert(&mut self, job: Job) -> Result<(), SimError> {
        if !self.ids.insert(job.job_id.clone()) {
            return Err(SimError::DuplicateJob(job.job_id));
        }
        self.jobs.push(job);
        Ok(())
    }

    /// Remove a job by ID. Removing an absent job is an error, not a no-op.
    pub fn remove(&mut self, job_id: &JobId) -> Result<Job, SimError> {
        let index = self
            .jobs
            .iter()
            .position(|j| &j.job_id == job_id)
            .ok_or_else(|| SimError::NotFound(job_id.clone()))?;
        self.ids.remove(job_id);
        Ok(self.jobs.remove(index))
    }

    /// Stable sort by `(priority, waiting_time)` ascending.
    pub fn sort_by_schedule(&mut self) {
        self.jobs.sort_by_key(Job::schedule_key);
    }
}

/// Read-only view of the queue at a point in logical time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub current_time: Ticks,
    pub jobs: Vec<Job>,
}

impl QueueSnapshot {
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn job_ids(&self) -> Vec<JobId> {
        self.jobs.iter().map(|j| j.job_id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JobRequest;

    fn job(id: &str, priority: u32, waiting_time: Ticks) -> Job {
        Job::from_request(JobRequest::new("user", id, priority), 0).with_waiting_time(waiting_time)
    }

    #[test]
    fn insert_rejects_duplicate_ids() {
        let mut queue = JobQueue::new();
        queue.insert(job("a", 1, 0)).unwrap();
        let err = queue.insert(job("a", 5, 0)).unwrap_err();
        assert_eq!(err, SimError::DuplicateJob(JobId::from("a")));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.get(&JobId::from("a")).unwrap().priority.value(), 1);
    }

    #[test]
    fn remove_missing_job_is_not_found() {
        let mut queue = JobQueue::new();
        queue.insert(job("a", 1, 0)).unwrap();
        let removed = queue.remove(&JobId::from("a")).unwrap();
        assert_eq!(removed.job_id, JobId::from("a"));
        assert!(queue.is_empty());
        assert!(!queue.contains(&JobId::from("a")));

        let err = queue.remove(&JobId::from("a")).unwrap_err();
        assert_eq!(err, SimError::NotFound(JobId::from("a")));
    }

    #[test]
    fn removed_id_can_be_reused() {
        let mut queue = JobQueue::new();
        queue.insert(job("a", 1, 0)).unwrap();
        queue.remove(&JobId::from("a")).unwrap();
        queue.insert(job("a", 2, 0)).unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn enumerate_is_detached_from_queue() {
        let mut queue = JobQueue::new();
        queue.insert(job("a", 1, 0)).unwrap();
        queue.insert(job("b", 1, 0)).unwrap();

        let snapshot = queue.enumerate();
        for j in &snapshot {
            queue.remove(&j.job_id).unwrap();
        }
        assert_eq!(snapshot.len(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn sort_orders_by_priority_then_waiting_time() {
        let mut queue = JobQueue::new();
        queue.insert(job("c", 3, 1)).unwrap();
        queue.insert(job("b", 1, 4)).unwrap();
        queue.insert(job("a", 1, 2)).unwrap();
        queue.insert(job("d", 2, 0)).unwrap();
        queue.sort_by_schedule();

        let order: Vec<_> = queue.iter().map(|j| j.job_id.as_str().to_string()).collect();
        assert_eq!(order, vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut queue = JobQueue::new();
        queue.insert(job("first", 2, 1)).unwrap();
        queue.insert(job("second", 2, 1)).unwrap();
        queue.sort_by_schedule();

        let order: Vec<_> = queue.iter().map(|j| j.job_id.as_str().to_string()).collect();
        assert_eq!(order, vec!["first", "second"]);
    }
}
