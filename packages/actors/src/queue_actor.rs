//! Queue actor that owns the job queue and the clock.

use std::time::Duration;

use chrono::Utc;
use ractor::rpc::CallResult;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sim_core::{Job, JobQueue, QueueSnapshot, SimEvent, SimulationClock, TickReport};
use tokio::sync::broadcast;

use crate::messages::{ActorError, ActorResult, QueueMessage};

/// State for the queue actor.
pub struct QueueActorState {
    /// Live jobs.
    queue: JobQueue,
    /// Tick engine and its collaborators.
    clock: SimulationClock,
    /// Event broadcaster.
    event_tx: broadcast::Sender<SimEvent>,
}

impl QueueActorState {
    /// Create a new queue actor state.
    pub fn new(clock: SimulationClock, event_tx: broadcast::Sender<SimEvent>) -> Self {
        Self {
            queue: JobQueue::new(),
            clock,
            event_tx,
        }
    }

    /// Broadcast an event. Having no subscribers is not an error.
    fn broadcast(&self, event: SimEvent) {
        let _ = self.event_tx.send(event);
    }

    fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            current_time: self.clock.current_time(),
            jobs: self.queue.enumerate(),
        }
    }

    fn publish_tick(&self, report: &TickReport) {
        let timestamp = Utc::now();
        for aged in &report.aged {
            self.broadcast(SimEvent::JobAged {
                job_id: aged.job_id.clone(),
                from: aged.from,
                to: aged.to,
                tick: report.tick,
                timestamp,
            });
        }
        for job in &report.expired {
            self.broadcast(SimEvent::JobExpired {
                job_id: job.job_id.clone(),
                user_id: job.user_id.clone(),
                waiting_time: job.waiting_time,
                tick: report.tick,
                timestamp,
            });
        }
        self.broadcast(SimEvent::TickCompleted {
            tick: report.tick,
            queued: report.remaining,
            timestamp,
        });
    }
}

/// Single writer for the job queue.
pub struct QueueActor;

impl Actor for QueueActor {
    type Msg = QueueMessage;
    type State = QueueActorState;
    type Arguments = QueueActorState;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            aging_interval = args.clock.config().aging_interval,
            expiry_time = args.clock.config().expiry_time,
            "Starting queue actor"
        );
        Ok(args)
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            QueueMessage::Submit { request, reply } => {
                let job = Job::from_request(*request, state.clock.current_time());
                match state.queue.insert(job.clone()) {
                    Ok(()) => {
                        tracing::debug!(job_id = %job.job_id, user_id = %job.user_id, "job submitted");
                        state.broadcast(SimEvent::JobSubmitted {
                            job: job.clone(),
                            timestamp: Utc::now(),
                        });
                        let _ = reply.send(Ok(job));
                    }
                    Err(e) => {
                        tracing::warn!(job_id = %job.job_id, "Rejected submission: {}", e);
                        state.broadcast(SimEvent::JobRejected {
                            job_id: job.job_id,
                            reason: e.to_string(),
                            timestamp: Utc::now(),
                        });
                        let _ = reply.send(Err(e));
                    }
                }
            }

            QueueMessage::Tick { reply } => {
                let result = state.clock.tick(&mut state.queue);
                match &result {
                    Ok(report) => state.publish_tick(report),
                    Err(e) => {
                        tracing::warn!(tick = state.clock.current_time(), "Tick failed: {}", e);
                        state.broadcast(SimEvent::TickFailed {
                            tick: state.clock.current_time(),
                            error: e.to_string(),
                            timestamp: Utc::now(),
                        });
                    }
                }
                let _ = reply.send(result);
            }

            QueueMessage::Remove { job_id, reply } => {
                let _ = reply.send(state.queue.remove(&job_id));
            }

            QueueMessage::Snapshot { reply } => {
                let _ = reply.send(state.snapshot());
            }

            QueueMessage::CurrentTime { reply } => {
                let _ = reply.send(state.clock.current_time());
            }

            QueueMessage::Subscribe { sender } => {
                let rx = state.event_tx.subscribe();
                tokio::spawn(drain_events(rx, move |event| sender.send(event).is_ok()));
            }

            QueueMessage::Shutdown => {
                tracing::info!(tick = state.clock.current_time(), "Shutting down queue actor");
                state.broadcast(SimEvent::SimulationStopped {
                    tick: state.clock.current_time(),
                    timestamp: Utc::now(),
                });
                myself.stop(None);
            }
        }

        Ok(())
    }
}

/// Feed every event from `rx` to `sink` until the channel closes or the
/// sink returns `false`. A lagging receiver skips the events it missed and
/// keeps going.
pub async fn drain_events<F>(mut rx: broadcast::Receiver<SimEvent>, mut sink: F)
where
    F: FnMut(SimEvent) -> bool,
{
    loop {
        match rx.recv().await {
            Ok(event) => {
                if !sink(event) {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event subscriber lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Send a request to the queue actor and wait for its reply.
pub(crate) async fn call<T, F>(
    queue: &ActorRef<QueueMessage>,
    timeout: Duration,
    build: F,
) -> ActorResult<T>
where
    T: Send + 'static,
    F: FnOnce(RpcReplyPort<T>) -> QueueMessage,
{
    match ractor::rpc::call(queue, build, Some(timeout)).await {
        Ok(CallResult::Success(value)) => Ok(value),
        Ok(CallResult::Timeout) => Err(ActorError::Timeout),
        Ok(CallResult::SenderError) => Err(ActorError::Actor("queue actor dropped the reply".into())),
        Err(e) => Err(ActorError::Actor(e.to_string())),
    }
}
