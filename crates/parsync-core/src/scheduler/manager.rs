//! Run every queued transfer with at most `worker_count` in flight, driving the display.

use anyhow::{Context, Result};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::ParsyncConfig;
use crate::display::DisplayRenderer;
use crate::shutdown::ShutdownSignal;
use crate::transfer::{ToolCommand, TransferStatus, TransferTask};

use super::permits::WorkerPermits;
use super::summary::Summary;
use super::workers::recommend_worker_count;

/// Bounded wait between liveness checks when joining workers.
const JOIN_POLL: Duration = Duration::from_millis(50);

const SHUTDOWN_NOTICE: &str = "Shutdown requested. Cancelling transfers...";

pub struct TransferManager {
    tasks: Vec<Arc<TransferTask>>,
    worker_count: usize,
    tool: Arc<ToolCommand>,
    signal: ShutdownSignal,
    poll_interval: Duration,
    refresh_interval: Duration,
    fail_fast: bool,
}

impl TransferManager {
    /// `worker_count == 0` picks a value from the host (see [`recommend_worker_count`]).
    pub fn new(worker_count: usize, tool: ToolCommand, signal: ShutdownSignal) -> Self {
        let defaults = ParsyncConfig::default();
        let worker_count = match worker_count {
            0 => recommend_worker_count(),
            n => n,
        };
        Self {
            tasks: Vec::new(),
            worker_count,
            tool: Arc::new(tool),
            signal,
            poll_interval: defaults.poll_interval(),
            refresh_interval: defaults.refresh_interval(),
            fail_fast: defaults.fail_fast,
        }
    }

    pub fn from_config(cfg: &ParsyncConfig, signal: ShutdownSignal) -> Self {
        Self::new(cfg.workers, ToolCommand::from_config(cfg), signal)
            .with_poll_interval(cfg.poll_interval())
            .with_refresh_interval(cfg.refresh_interval())
            .with_fail_fast(cfg.fail_fast)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Trigger shutdown as soon as any transfer fails.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn tasks(&self) -> &[Arc<TransferTask>] {
        &self.tasks
    }

    /// Queue a transfer. All transfers must be added before `run_all`.
    pub fn add_transfer(&mut self, task: TransferTask) {
        self.tasks.push(Arc::new(task));
    }

    /// Fresh fold over current task statuses.
    pub fn summary(&self) -> Summary {
        Summary::from_statuses(self.tasks.iter().map(|t| t.status()))
    }

    /// Run every transfer, rendering to stdout. Returns the settled summary.
    pub fn run_all(&self) -> Result<Summary> {
        let display = DisplayRenderer::stdout(self.tasks.len(), self.refresh_interval)
            .context("start display")?;
        self.run_with_display(display)
    }

    /// Same as [`run_all`](Self::run_all) with a caller-built display (one slot per task).
    pub fn run_with_display(&self, display: DisplayRenderer) -> Result<Summary> {
        anyhow::ensure!(
            display.line_count() == self.tasks.len(),
            "display has {} lines for {} transfers",
            display.line_count(),
            self.tasks.len()
        );
        tracing::info!(
            transfers = self.tasks.len(),
            workers = self.worker_count,
            "starting transfers"
        );

        let permits = Arc::new(WorkerPermits::new(self.worker_count));
        let handles = self.start_workers(&permits);

        if let Err(e) = self.poll(&display) {
            tracing::error!("unexpected error while polling transfers: {:#}", e);
        }

        self.join_workers(handles);
        if let Err(e) = self.refresh(&display) {
            tracing::error!("final display refresh failed: {:#}", e);
        }
        let summary = self.summary();
        tracing::info!(
            completed = summary.completed,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "all transfers settled"
        );
        display.stop(&summary).context("final display")?;
        Ok(summary)
    }

    fn start_workers(&self, permits: &Arc<WorkerPermits>) -> Vec<thread::JoinHandle<()>> {
        let mut handles = Vec::with_capacity(self.tasks.len());
        for (index, task) in self.tasks.iter().enumerate() {
            let task = Arc::clone(task);
            let permits = Arc::clone(permits);
            let tool = Arc::clone(&self.tool);
            let signal = self.signal.clone();
            let fail_fast = self.fail_fast;
            let spawned = thread::Builder::new()
                .name(format!("parsync-worker-{}", index))
                .spawn({
                    let task = Arc::clone(&task);
                    move || run_worker(&task, &permits, &tool, &signal, fail_fast)
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    tracing::error!(name = %task.name(), "could not start worker thread: {}", e);
                    task.fail_unexpected(&format!("could not start worker: {}", e), &self.signal);
                }
            }
        }
        handles
    }

    fn poll(&self, display: &DisplayRenderer) -> Result<()> {
        let mut last = Summary::default();
        loop {
            let summary = self.summary();
            if summary.all_terminal() {
                return Ok(());
            }
            if self.signal.is_set() {
                // The SIGINT handler only flips the flag, so this is the first place
                // the request becomes visible.
                tracing::warn!(running = summary.running, "shutdown requested, cancelling transfers");
                display.notice(SHUTDOWN_NOTICE).context("print shutdown notice")?;
                return Ok(());
            }
            self.refresh(display)?;
            if summary != last {
                tracing::debug!(
                    running = summary.running,
                    completed = summary.completed,
                    failed = summary.failed,
                    cancelled = summary.cancelled,
                    "progress"
                );
                last = summary;
            }
            thread::sleep(self.poll_interval);
        }
    }

    /// Push every task's line into the display, inlining per-task render failures.
    fn refresh(&self, display: &DisplayRenderer) -> Result<()> {
        for (index, task) in self.tasks.iter().enumerate() {
            let line = task
                .status_line()
                .unwrap_or_else(|e| format!("{}: ERROR fetching status: {}", task.name(), e));
            display.update_line(index, line)?;
        }
        Ok(())
    }

    fn join_workers(&self, handles: Vec<thread::JoinHandle<()>>) {
        for handle in handles {
            while !handle.is_finished() {
                thread::sleep(JOIN_POLL);
            }
            if handle.join().is_err() {
                tracing::error!("worker thread panicked outside its task");
            }
        }
    }
}

/// Worker body: take a permit, honour shutdown, run the task, contain panics.
fn run_worker(
    task: &TransferTask,
    permits: &WorkerPermits,
    tool: &ToolCommand,
    signal: &ShutdownSignal,
    fail_fast: bool,
) {
    run_guarded(task, permits, signal, fail_fast, || task.run(tool, signal));
}

/// Everything around `body`; the permit is released even if `body` unwinds.
fn run_guarded<F>(
    task: &TransferTask,
    permits: &WorkerPermits,
    signal: &ShutdownSignal,
    fail_fast: bool,
    body: F,
) where
    F: FnOnce() -> TransferStatus,
{
    let _permit = permits.acquire();
    if signal.is_set() {
        task.cancel_before_start();
        return;
    }
    let status = match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(status) => status,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(name = %task.name(), "transfer panicked: {}", message);
            task.fail_unexpected(&message, signal)
        }
    };
    if fail_fast && status == TransferStatus::Failed {
        tracing::info!(name = %task.name(), "fail-fast: cancelling remaining transfers");
        signal.trigger();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
