//! Handle for starting and driving a simulation.

use std::time::Duration;

use ractor::{Actor, ActorRef};
use sim_core::{
    Job, JobId, JobRequest, QueueSnapshot, SimEvent, SimulationClock, SimulationConfig, Ticks,
    TickReport,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::messages::{ActorError, ActorResult, QueueMessage};
use crate::queue_actor::{QueueActor, QueueActorState, call};
use crate::submitter::{BatchReport, ConcurrentSubmitter};

const EVENT_CAPACITY: usize = 1024;

/// A running simulation: the queue actor plus the tick loop around it.
///
/// Ticks are driven sequentially from the caller. Submissions may come
/// from any number of tasks at the same time; they interleave with ticks
/// only between whole ticks.
pub struct Simulation {
    queue: ActorRef<QueueMessage>,
    handle: JoinHandle<()>,
    event_tx: broadcast::Sender<SimEvent>,
    config: SimulationConfig,
}

impl Simulation {
    /// Spawn the queue actor around `clock`.
    pub async fn start(clock: SimulationClock) -> ActorResult<Self> {
        let config = clock.config().clone();
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let state = QueueActorState::new(clock, event_tx.clone());

        let (queue, handle) = Actor::spawn(None, QueueActor, state)
            .await
            .map_err(|e| ActorError::Spawn(e.to_string()))?;

        tracing::info!("Simulation started");
        Ok(Self {
            queue,
            handle,
            event_tx,
            config,
        })
    }

    /// Start with the stock collaborators.
    pub async fn with_defaults(config: SimulationConfig) -> ActorResult<Self> {
        Self::start(SimulationClock::with_defaults(config)?).await
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.rpc_timeout_ms)
    }

    /// Build a submitter bound to this simulation's queue.
    pub fn submitter(&self) -> ConcurrentSubmitter {
        let submitter = ConcurrentSubmitter::new(self.queue.clone(), self.timeout());
        match self.config.max_in_flight {
            Some(limit) => submitter.with_max_in_flight(limit),
            None => submitter,
        }
    }

    /// Submit a batch concurrently and wait for every request.
    pub async fn submit_batch(&self, requests: Vec<JobRequest>) -> BatchReport {
        self.submitter().submit_batch(requests).await
    }

    /// Submit a single job.
    pub async fn submit(&self, request: JobRequest) -> ActorResult<Job> {
        let result = call(&self.queue, self.timeout(), |reply| QueueMessage::Submit {
            request: Box::new(request),
            reply,
        })
        .await?;
        Ok(result?)
    }

    /// Advance the simulation by one tick.
    pub async fn tick(&self) -> ActorResult<TickReport> {
        let result = call(&self.queue, self.timeout(), |reply| QueueMessage::Tick { reply }).await?;
        Ok(result?)
    }

    /// Run exactly `ticks` ticks, one after another.
    pub async fn run_simulation(&self, ticks: Ticks) -> ActorResult<()> {
        self.run_until_cancelled(ticks, &CancellationToken::new())
            .await
            .map(|_| ())
    }

    /// Run up to `ticks` ticks, checking `cancel` between ticks.
    ///
    /// A tick in progress always completes. When `tick_interval_ms` is set
    /// the loop waits that long between ticks. Returns the number of ticks
    /// completed.
    pub async fn run_until_cancelled(
        &self,
        ticks: Ticks,
        cancel: &CancellationToken,
    ) -> ActorResult<Ticks> {
        let mut pacer = (self.config.tick_interval_ms > 0).then(|| {
            let mut interval =
                tokio::time::interval(Duration::from_millis(self.config.tick_interval_ms));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        let mut completed = 0;
        while completed < ticks {
            if let Some(interval) = pacer.as_mut() {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {}
                }
            }
            if cancel.is_cancelled() {
                break;
            }
            self.tick().await?;
            completed += 1;
        }

        if completed < ticks {
            tracing::info!(completed, requested = ticks, "Simulation cancelled");
        }
        Ok(completed)
    }

    /// Remove a job from the queue.
    pub async fn remove(&self, job_id: JobId) -> ActorResult<Job> {
        let result = call(&self.queue, self.timeout(), |reply| QueueMessage::Remove {
            job_id,
            reply,
        })
        .await?;
        Ok(result?)
    }

    /// Get a read-only view of the queue.
    pub async fn snapshot(&self) -> ActorResult<QueueSnapshot> {
        call(&self.queue, self.timeout(), |reply| QueueMessage::Snapshot { reply }).await
    }

    pub async fn current_time(&self) -> ActorResult<Ticks> {
        call(&self.queue, self.timeout(), |reply| QueueMessage::CurrentTime { reply }).await
    }

    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SimEvent> {
        self.event_tx.subscribe()
    }

    /// Forward events into an existing broadcaster.
    pub fn forward_events(&self, sender: broadcast::Sender<SimEvent>) -> ActorResult<()> {
        self.queue
            .send_message(QueueMessage::Subscribe { sender })
            .map_err(|e| ActorError::Actor(e.to_string()))
    }

    /// Stop the queue actor and wait for it to exit.
    pub async fn shutdown(self) -> ActorResult<()> {
        self.queue
            .send_message(QueueMessage::Shutdown)
            .map_err(|e| ActorError::Actor(e.to_string()))?;
        self.handle
            .await
            .map_err(|e| ActorError::Actor(e.to_string()))?;
        tracing::info!("Simulation stopped");
        Ok(())
    }
}
