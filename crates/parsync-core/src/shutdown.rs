//! Cooperative cancellation shared by every worker, the controller loop and the display.
//!
//! One `ShutdownSignal` is created per process and cloned into whatever needs to observe
//! it. `start()` wires SIGINT to the flag; once set the flag never clears.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    flag: Arc<AtomicBool>,
    saved: Mutex<Option<imp::SavedHandler>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the SIGINT handler. A second call while installed is a no-op and keeps
    /// the handler saved by the first. Only one signal per process may hold SIGINT;
    /// starting another one fails with `io::ErrorKind::AlreadyExists`.
    pub fn start(&self) -> io::Result<()> {
        let mut saved = self.inner.saved.lock().unwrap_or_else(|e| e.into_inner());
        if saved.is_some() {
            return Ok(());
        }
        *saved = Some(imp::install(Arc::clone(&self.inner.flag))?);
        tracing::debug!("interrupt handler installed");
        Ok(())
    }

    /// Request shutdown.
    pub fn trigger(&self) {
        if !self.inner.flag.swap(true, Ordering::SeqCst) {
            tracing::info!("shutdown requested");
        }
    }

    /// Request shutdown and restore the handler that was in place before `start()`.
    pub fn stop(&self) {
        self.trigger();
        self.inner.restore();
    }

    pub fn is_set(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    pub fn is_installed(&self) -> bool {
        self.inner
            .saved
            .lock()
            .map(|s| s.is_some())
            .unwrap_or(false)
    }
}

impl Inner {
    fn restore(&self) {
        let mut saved = self.saved.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handler) = saved.take() {
            if let Err(e) = imp::restore(handler) {
                tracing::warn!("could not restore interrupt handler: {}", e);
            } else {
                tracing::debug!("interrupt handler restored");
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.restore();
    }
}

impl std::fmt::Debug for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownSignal")
            .field("set", &self.is_set())
            .field("installed", &self.is_installed())
            .finish()
    }
}

#[cfg(unix)]
mod imp {
    use std::io;
    use std::ptr;
    use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};
    use std::sync::Arc;

    /// Flag the C handler writes to. Non-null only while exactly one `SavedHandler`
    /// exists, and that handler keeps the pointee alive.
    static ACTIVE_FLAG: AtomicPtr<AtomicBool> = AtomicPtr::new(ptr::null_mut());

    extern "C" fn on_interrupt(_signum: libc::c_int) {
        let flag = ACTIVE_FLAG.load(Ordering::SeqCst);
        if !flag.is_null() {
            // SAFETY: non-null only while the owning SavedHandler keeps the Arc alive.
            unsafe { (*flag).store(true, Ordering::SeqCst) };
        }
    }

    pub(super) struct SavedHandler {
        previous: libc::sigaction,
        flag: Arc<AtomicBool>,
    }

    // SAFETY: `previous` is plain data copied out of the kernel.
    unsafe impl Send for SavedHandler {}

    /// Claim SIGINT for `flag`. Fails with `AlreadyExists` while another signal holds it.
    pub(super) fn install(flag: Arc<AtomicBool>) -> io::Result<SavedHandler> {
        let ours = Arc::as_ptr(&flag) as *mut AtomicBool;
        if ACTIVE_FLAG
            .compare_exchange(ptr::null_mut(), ours, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "another shutdown signal already owns SIGINT",
            ));
        }
        // SAFETY: zeroed sigaction is a valid starting point; fields are set below.
        let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
        action.sa_sigaction = on_interrupt as extern "C" fn(libc::c_int) as libc::sighandler_t;
        action.sa_flags = libc::SA_RESTART;
        let mut previous: libc::sigaction = unsafe { std::mem::zeroed() };
        let rc = unsafe {
            libc::sigemptyset(&mut action.sa_mask);
            libc::sigaction(libc::SIGINT, &action, &mut previous)
        };
        if rc != 0 {
            let err = io::Error::last_os_error();
            ACTIVE_FLAG.store(ptr::null_mut(), Ordering::SeqCst);
            return Err(err);
        }
        Ok(SavedHandler { previous, flag })
    }

    /// Put the previous disposition back, then release the flag slot. The handler
    /// stays harmless in between because `saved.flag` is still alive.
    pub(super) fn restore(saved: SavedHandler) -> io::Result<()> {
        let rc = unsafe { libc::sigaction(libc::SIGINT, &saved.previous, ptr::null_mut()) };
        let err = (rc != 0).then(io::Error::last_os_error);
        let _ = ACTIVE_FLAG.compare_exchange(
            Arc::as_ptr(&saved.flag) as *mut AtomicBool,
            ptr::null_mut(),
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        match err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(not(unix))]
mod imp {
    use std::io;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    /// No OS hook on this target; only `trigger()` sets the flag.
    pub(super) struct SavedHandler;

    pub(super) fn install(_flag: Arc<AtomicBool>) -> io::Result<SavedHandler> {
        tracing::warn!("interrupt handling is not supported on this platform");
        Ok(SavedHandler)
    }

    pub(super) fn restore(_saved: SavedHandler) -> io::Result<()> {
        Ok(())
    }
}
