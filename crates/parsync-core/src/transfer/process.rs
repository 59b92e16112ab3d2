//! Owned subprocess with guaranteed teardown.

use std::io::{self, Read};
use std::process::{Child, ChildStderr, ChildStdout, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

const REAP_POLL: Duration = Duration::from_millis(20);

/// Terminates the child when dropped: closes pipes, sends SIGTERM, waits up to
/// `timeout`, then SIGKILLs. A child that already exited is only reaped.
pub(super) struct ProcessGuard {
    child: Child,
    timeout: Duration,
    name: String,
}

impl ProcessGuard {
    pub(super) fn new(child: Child, timeout: Duration, name: &str) -> Self {
        Self {
            child,
            timeout,
            name: name.to_string(),
        }
    }

    pub(super) fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    pub(super) fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    pub(super) fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait()
    }

    fn terminate(&mut self) {
        drop(self.child.stdout.take());
        drop(self.child.stderr.take());

        match self.child.try_wait() {
            Ok(Some(_)) => return,
            Ok(None) => {}
            Err(e) => tracing::warn!(name = %self.name, "try_wait before terminate: {}", e),
        }

        request_exit(&mut self.child);
        let deadline = Instant::now() + self.timeout;
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    tracing::debug!(name = %self.name, %status, "transfer process terminated");
                    return;
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(REAP_POLL),
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(name = %self.name, "try_wait during terminate: {}", e);
                    break;
                }
            }
        }

        tracing::warn!(
            name = %self.name,
            timeout_ms = self.timeout.as_millis() as u64,
            "transfer process ignored SIGTERM; killing"
        );
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(unix)]
fn request_exit(child: &mut Child) {
    // SAFETY: the child has not been reaped, so its pid still names it.
    let rc = unsafe { libc::kill(child.id() as libc::pid_t, libc::SIGTERM) };
    if rc != 0 {
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn request_exit(child: &mut Child) {
    let _ = child.kill();
}

/// Collects all of stderr on a helper thread so a full pipe cannot stall the child.
pub(super) struct StderrDrain(thread::JoinHandle<String>);

impl StderrDrain {
    pub(super) fn spawn(mut stderr: ChildStderr) -> io::Result<Self> {
        let handle = thread::Builder::new()
            .name("parsync-stderr".into())
            .spawn(move || {
                let mut bytes = Vec::new();
                let _ = stderr.read_to_end(&mut bytes);
                String::from_utf8_lossy(&bytes).into_owned()
            })?;
        Ok(Self(handle))
    }

    pub(super) fn join(self) -> String {
        self.0.join().unwrap_or_default()
    }
}
