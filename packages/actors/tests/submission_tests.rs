#![allow(clippy::disallowed_methods)]

mod common;

use std::collections::HashSet;
use std::error::Error;
use std::time::Duration;

use actors::{ActorError, Simulation};
use sim_core::{
    HandlerResult, Job, JobId, JobRequest, LogExpiryHandler, PriorityAger, SimError,
    SimulationClock, SimulationConfig, Ticks,
};

fn config() -> SimulationConfig {
    SimulationConfig::new(3, 100)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_distinct_submissions_are_never_lost() -> Result<(), Box<dyn Error>> {
    const JOBS: usize = 64;

    for trial in 0..10 {
        let harness = common::start(config()).await?;
        let submitter = harness
            .sim
            .submitter()
            .with_jitter(Duration::from_millis(3));

        let report = submitter
            .submit_batch(common::requests(&format!("t{trial}"), JOBS))
            .await;
        assert!(report.is_success(), "trial {trial}: {:?}", report.failures);
        assert_eq!(report.accepted.len(), JOBS);

        let snapshot = harness.sim.snapshot().await?;
        assert_eq!(snapshot.len(), JOBS);
        let unique: HashSet<JobId> = snapshot.job_ids().into_iter().collect();
        assert_eq!(unique.len(), JOBS);

        harness.sim.shutdown().await?;
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicates_yield_one_success() -> Result<(), Box<dyn Error>> {
    for trial in 0..20 {
        let harness = common::start(config()).await?;
        let requests = vec![
            JobRequest::new("alice", "shared", 2),
            JobRequest::new("bob", "shared", 1),
        ];

        let report = harness
            .sim
            .submitter()
            .with_jitter(Duration::from_millis(1))
            .submit_batch(requests)
            .await;

        assert_eq!(report.accepted.len(), 1, "trial {trial}");
        assert_eq!(report.failures.len(), 1, "trial {trial}");
        assert_eq!(report.duplicates(), 1);
        let failure = &report.failures[0];
        assert_eq!(failure.job_id, JobId::from("shared"));
        assert!(matches!(
            failure.error,
            ActorError::Sim(SimError::DuplicateJob(ref id)) if id.as_str() == "shared"
        ));

        let snapshot = harness.sim.snapshot().await?;
        assert_eq!(snapshot.job_ids(), vec![JobId::from("shared")]);

        harness.sim.shutdown().await?;
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn batch_reports_every_failure_after_the_barrier() -> Result<(), Box<dyn Error>> {
    let harness = common::start(config()).await?;
    harness.sim.submit(JobRequest::new("carol", "taken-1", 1)).await?;
    harness.sim.submit(JobRequest::new("carol", "taken-2", 1)).await?;

    let mut requests = common::requests("fresh", 10);
    requests.push(JobRequest::new("dave", "taken-1", 3));
    requests.push(JobRequest::new("dave", "taken-2", 3));

    let report = harness.sim.submit_batch(requests).await;
    assert_eq!(report.attempted(), 12);
    assert_eq!(report.accepted.len(), 10);
    assert_eq!(report.duplicates(), 2);

    let failed: HashSet<String> = report
        .failures
        .iter()
        .map(|f| f.job_id.to_string())
        .collect();
    assert_eq!(failed, HashSet::from(["taken-1".to_string(), "taken-2".to_string()]));

    assert_eq!(harness.sim.snapshot().await?.len(), 12);
    harness.sim.shutdown().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn bounded_submitter_still_inserts_everything() -> Result<(), Box<dyn Error>> {
    let config = SimulationConfig {
        max_in_flight: Some(3),
        ..config()
    };
    let harness = common::start(config).await?;

    let report = harness
        .sim
        .submitter()
        .with_jitter(Duration::from_millis(2))
        .submit_batch(common::requests("bounded", 30))
        .await;
    assert!(report.is_success());
    assert_eq!(harness.sim.snapshot().await?.len(), 30);

    harness.sim.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn empty_batch_is_a_no_op() -> Result<(), Box<dyn Error>> {
    let harness = common::start(config()).await?;
    let report = harness.sim.submit_batch(Vec::new()).await;
    assert_eq!(report.attempted(), 0);
    assert!(report.is_success());
    assert!(harness.sim.snapshot().await?.is_empty());
    harness.sim.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn batch_loads_from_json() -> Result<(), Box<dyn Error>> {
    let harness = common::start(config()).await?;
    let requests: Vec<JobRequest> = serde_json::from_str(
        r#"[
            {"user_id": "alice", "job_id": "a1", "priority": 3},
            {"user_id": "bob", "job_id": "b1", "priority": 1}
        ]"#,
    )?;

    let report = harness.sim.submit_batch(requests).await;
    assert!(report.is_success());

    harness.sim.tick().await?;
    let snapshot = harness.sim.snapshot().await?;
    assert_eq!(snapshot.job_ids(), vec![JobId::from("b1"), JobId::from("a1")]);

    harness.sim.shutdown().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn timed_out_submission_is_unconfirmed_not_failed() -> Result<(), Box<dyn Error>> {
    let visualizer = |_: &[Job], tick: Ticks| -> HandlerResult {
        if tick == 1 {
            std::thread::sleep(Duration::from_millis(300));
        }
        Ok(())
    };
    let config = SimulationConfig {
        rpc_timeout_ms: 50,
        ..config()
    };
    let clock = SimulationClock::new(
        config.clone(),
        PriorityAger::new(config.floor()),
        LogExpiryHandler,
        visualizer,
    )?;
    let sim = Simulation::start(clock).await?;

    // Hold the actor inside tick 1 while the batch is in flight.
    let (tick_result, report) = tokio::join!(sim.tick(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        sim.submit_batch(vec![JobRequest::new("u", "x", 1)]).await
    });
    assert!(matches!(tick_result, Err(ActorError::Timeout)));

    assert!(report.accepted.is_empty());
    assert!(report.failures.is_empty());
    assert_eq!(report.unconfirmed, vec![JobId::from("x")]);
    assert_eq!(report.attempted(), 1);
    assert!(!report.is_success());

    // The actor applies the submission once the tick finishes.
    tokio::time::sleep(Duration::from_millis(400)).await;
    let snapshot = sim.snapshot().await?;
    assert_eq!(snapshot.job_ids(), vec![JobId::from("x")]);
    let err = sim.submit(JobRequest::new("u", "x", 1)).await.unwrap_err();
    assert!(err.is_duplicate());

    sim.shutdown().await?;
    Ok(())
}
