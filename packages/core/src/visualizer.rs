//! Observers that receive the queue contents once per tick.

use std::fmt::Write as _;
use std::io::Write;
use std::sync::Mutex;

use crate::{HandlerResult, Job, Ticks};

/// Read-only consumer of the queue state at the end of each tick.
pub trait Visualizer: Send + Sync + 'static {
    fn display(&self, jobs: &[Job], current_time: Ticks) -> HandlerResult;
}

impl<F> Visualizer for F
where
    F: Fn(&[Job], Ticks) -> HandlerResult + Send + Sync + 'static,
{
    fn display(&self, jobs: &[Job], current_time: Ticks) -> HandlerResult {
        (self)(jobs, current_time)
    }
}

/// Emits one structured log line per tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingVisualizer;

impl Visualizer for TracingVisualizer {
    fn display(&self, jobs: &[Job], current_time: Ticks) -> HandlerResult {
        let head = jobs.first().map(|j| j.job_id.to_string());
        tracing::info!(tick = current_time, queued = jobs.len(), head = ?head, "queue state");
        Ok(())
    }
}

/// Render the queue as a plain-text table.
pub fn render_table(jobs: &[Job], current_time: Ticks) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- Tick {} ---", current_time);
    if jobs.is_empty() {
        let _ = writeln!(out, "(queue empty)");
        return out;
    }
    let _ = writeln!(
        out,
        "{:<4} {:<16} {:<12} {:>8} {:>8}",
        "#", "job", "user", "priority", "waiting"
    );
    for (position, job) in jobs.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:<4} {:<16} {:<12} {:>8} {:>8}",
            position + 1,
            job.job_id,
            job.user_id,
            job.priority,
            job.waiting_time
        );
    }
    out
}

/// Writes a table of the queue to any writer each tick.
pub struct TableVisualizer<W: Write + Send + 'static> {
    out: Mutex<W>,
}

impl<W: Write + Send + 'static> TableVisualizer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

impl TableVisualizer<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send + 'static> Visualizer for TableVisualizer<W> {
    fn display(&self, jobs: &[Job], current_time: Ticks) -> HandlerResult {
        let table = render_table(jobs, current_time);
        let mut out = self
            .out
            .lock()
            .map_err(|_| "visualizer output poisoned".to_string())?;
        out.write_all(table.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| e.to_string())
    }
}
