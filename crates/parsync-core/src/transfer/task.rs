//! Task state machine: spawn the tool, stream progress, decide the terminal status.

use std::io::{self, BufReader};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::{Mutex, MutexGuard};

use crate::error::TransferError;
use crate::progress::{ProgressLines, ProgressState};
use crate::shutdown::ShutdownSignal;

use super::process::{ProcessGuard, StderrDrain};
use super::status::StatusCell;
use super::{ToolCommand, TransferSpec, TransferStatus};

/// How the stdout pump ended.
enum Pumped {
    Exited(ExitStatus),
    Interrupted,
}

/// One managed transfer. Shared between its worker (the only writer) and the
/// controller, which reads status and display lines.
#[derive(Debug)]
pub struct TransferTask {
    spec: TransferSpec,
    progress: Mutex<ProgressState>,
    error: Mutex<String>,
    status: StatusCell,
}

impl TransferTask {
    pub fn new(spec: TransferSpec) -> Self {
        let progress = ProgressState::new(spec.name.clone());
        Self {
            spec,
            progress: Mutex::new(progress),
            error: Mutex::new(String::new()),
            status: StatusCell::new(),
        }
    }

    pub fn spec(&self) -> &TransferSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn status(&self) -> TransferStatus {
        self.status.get()
    }

    /// Failure text; empty unless the task failed or its worker hit an unexpected error.
    pub fn error(&self) -> String {
        lock(&self.error).clone()
    }

    pub fn progress(&self) -> ProgressState {
        lock(&self.progress).clone()
    }

    /// Current display line for this task.
    pub fn status_line(&self) -> Result<String, TransferError> {
        let error = self
            .error
            .lock()
            .map_err(|_| TransferError::Render("error state poisoned".into()))?
            .clone();
        let progress = self
            .progress
            .lock()
            .map_err(|_| TransferError::Render("progress state poisoned".into()))?;
        Ok(progress.render_line(&error))
    }

    /// Run the transfer to a terminal status. Never returns an error: spawn, I/O and
    /// exit failures are recorded on the task.
    pub fn run(&self, tool: &ToolCommand, signal: &ShutdownSignal) -> TransferStatus {
        let outcome = self.execute(tool, signal);
        self.resolve(outcome, signal)
    }

    /// Resolve a task that never started because shutdown was already requested.
    pub fn cancel_before_start(&self) -> TransferStatus {
        self.settle(TransferStatus::Cancelled)
    }

    /// Record a failure that escaped `run` (a panic in the worker) and resolve.
    /// The text is kept even when shutdown turns the outcome into Cancelled.
    pub(crate) fn fail_unexpected(&self, message: &str, signal: &ShutdownSignal) -> TransferStatus {
        let text = format!("Transfer error: {}", message);
        tracing::warn!(name = %self.spec.name, "unexpected transfer failure: {}", text);
        *lock(&self.error) = text;
        let target = if signal.is_set() {
            TransferStatus::Cancelled
        } else {
            TransferStatus::Failed
        };
        self.settle(target)
    }

    /// Leave the progress cell poisoned, as if a holder had panicked.
    #[cfg(test)]
    pub(crate) fn poison_progress(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _held = self.progress.lock();
            panic!("progress holder panicked");
        }));
    }

    fn execute(&self, tool: &ToolCommand, signal: &ShutdownSignal) -> Result<(), TransferError> {
        let args = tool.args(&self.spec);
        tracing::debug!(name = %self.spec.name, program = %tool.program, ?args, "spawning transfer");

        let child = Command::new(&tool.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| TransferError::Spawn {
                program: tool.program.clone(),
                source,
            })?;
        let pid = child.id();
        let mut guard = ProcessGuard::new(child, tool.terminate_timeout, &self.spec.name);
        let drain = match guard.take_stderr() {
            Some(stderr) => Some(StderrDrain::spawn(stderr)?),
            None => None,
        };
        tracing::debug!(name = %self.spec.name, pid, "transfer running");

        let pumped = self.pump(&mut guard, signal);
        // Teardown before collecting stderr: the drain only ends once the pipe closes.
        drop(guard);
        let stderr = drain.map(StderrDrain::join).unwrap_or_default();

        match pumped? {
            Pumped::Interrupted => Err(TransferError::Cancelled),
            Pumped::Exited(status) if status.success() => Ok(()),
            Pumped::Exited(status) => Err(TransferError::Runtime(failure_text(&stderr, status))),
        }
    }

    fn pump(&self, guard: &mut ProcessGuard, signal: &ShutdownSignal) -> Result<Pumped, TransferError> {
        let stdout = guard
            .take_stdout()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "stdout was not captured"))?;
        for line in ProgressLines::new(BufReader::new(stdout)) {
            let line = line?;
            lock(&self.progress).update(&line);
            if signal.is_set() {
                return Ok(Pumped::Interrupted);
            }
        }
        Ok(Pumped::Exited(guard.wait()?))
    }

    /// Shutdown wins over any exit code; otherwise an error means failure.
    fn resolve(&self, outcome: Result<(), TransferError>, signal: &ShutdownSignal) -> TransferStatus {
        let target = match outcome {
            _ if signal.is_set() => TransferStatus::Cancelled,
            Err(TransferError::Cancelled) => TransferStatus::Cancelled,
            Err(e) => {
                tracing::warn!(name = %self.spec.name, kind = ?e.kind(), "transfer failed: {}", e);
                *lock(&self.error) = e.to_string();
                TransferStatus::Failed
            }
            Ok(()) => {
                lock(&self.progress).mark_complete();
                TransferStatus::Completed
            }
        };
        self.settle(target)
    }

    fn settle(&self, target: TransferStatus) -> TransferStatus {
        if self.status.finish(target) {
            tracing::info!(name = %self.spec.name, status = %target, "transfer finished");
        } else {
            tracing::debug!(
                name = %self.spec.name,
                current = %self.status.get(),
                ignored = %target,
                "transfer already finished"
            );
        }
        self.status.get()
    }
}

/// Trimmed stderr, or a synthesized reason when the tool printed nothing.
fn failure_text(stderr: &str, status: ExitStatus) -> String {
    let trimmed = stderr.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    match status.code() {
        Some(code) => format!("exited with status {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Worker-side lock: a poisoned cell still holds usable data.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
