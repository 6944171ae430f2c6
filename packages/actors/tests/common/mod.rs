#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use actors::{ActorError, Simulation};
use sim_core::{
    DeadLetterHandler, HandlerResult, Job, JobRequest, PriorityAger, SimulationClock,
    SimulationConfig, Ticks,
};

pub type Frames = Arc<Mutex<Vec<(Ticks, Vec<Job>)>>>;

pub struct Harness {
    pub sim: Simulation,
    pub frames: Frames,
    pub dead_letters: DeadLetterHandler,
}

/// Start a simulation that records every visualizer frame and expired job.
pub async fn start(config: SimulationConfig) -> Result<Harness, ActorError> {
    let frames: Frames = Arc::default();
    let sink = frames.clone();
    let visualizer = move |jobs: &[Job], tick: Ticks| -> HandlerResult {
        sink.lock()
            .map_err(|_| "frames poisoned".to_string())?
            .push((tick, jobs.to_vec()));
        Ok(())
    };
    let dead_letters = DeadLetterHandler::new();
    let clock = SimulationClock::new(
        config.clone(),
        PriorityAger::new(config.floor()),
        dead_letters.clone(),
        visualizer,
    )?;
    let sim = Simulation::start(clock).await?;
    Ok(Harness {
        sim,
        frames,
        dead_letters,
    })
}

pub fn requests(prefix: &str, count: usize) -> Vec<JobRequest> {
    (0..count)
        .map(|i| JobRequest::new(format!("user-{}", i % 5), format!("{prefix}-{i}"), (i % 4 + 1) as u32))
        .collect()
}
