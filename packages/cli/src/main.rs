//! Demo runner: submits a batch of jobs concurrently and renders the
//! queue as the clock ticks.

use actors::{CancellationToken, Simulation, drain_events};
use sim_core::{
    DeadLetterHandler, JobRequest, PriorityAger, SimulationClock, SimulationConfig,
    TableVisualizer, Ticks,
};
use tracing_subscriber::EnvFilter;

const DEFAULT_TICKS: Ticks = 10;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = SimulationConfig::from_env()?;
    let ticks = match std::env::var("JOBSIM_TICKS") {
        Ok(raw) => raw.trim().parse()?,
        Err(_) => DEFAULT_TICKS,
    };
    tracing::info!(?config, ticks, "Starting job queue simulation");

    let dead_letters = DeadLetterHandler::new();
    let clock = SimulationClock::new(
        config.clone(),
        PriorityAger::new(config.floor()),
        dead_letters.clone(),
        TableVisualizer::stdout(),
    )?;
    let sim = Simulation::start(clock).await?;

    tokio::spawn(drain_events(sim.subscribe(), |event| {
        tracing::debug!("{}", event.description());
        true
    }));

    let report = sim.submit_batch(demo_batch()).await;
    tracing::info!(accepted = report.accepted.len(), "Demo batch submitted");
    for failure in &report.failures {
        tracing::warn!("Submission of {} failed: {}", failure.job_id, failure.error);
    }
    for job_id in &report.unconfirmed {
        tracing::warn!("Submission of {} timed out and may still be queued", job_id);
    }

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let completed = sim.run_until_cancelled(ticks, &cancel).await?;
    let snapshot = sim.snapshot().await?;
    tracing::info!(
        completed,
        remaining = snapshot.len(),
        expired = dead_letters.len(),
        "Simulation finished"
    );

    sim.shutdown().await?;
    Ok(())
}

fn demo_batch() -> Vec<JobRequest> {
    vec![
        JobRequest::new("alice", "render-1", 3),
        JobRequest::new("alice", "render-2", 5),
        JobRequest::new("bob", "backup", 4),
        JobRequest::new("carol", "report", 2),
        JobRequest::new("dave", "compile", 1),
        JobRequest::new("erin", "index", 5),
        // Same id as above; exactly one of the two is accepted.
        JobRequest::new("frank", "backup", 2),
    ]
}
