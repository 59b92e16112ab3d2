//! Counting semaphore capping concurrently running transfers.

use std::sync::{Condvar, Mutex};

/// Blocking permit pool. Workers hold a permit for the whole life of their subprocess.
#[derive(Debug)]
pub struct WorkerPermits {
    max: usize,
    in_use: Mutex<usize>,
    freed: Condvar,
}

impl WorkerPermits {
    /// Pool of `max` permits (at least one).
    pub fn new(max: usize) -> Self {
        Self {
            max: max.max(1),
            in_use: Mutex::new(0),
            freed: Condvar::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.max
    }

    /// Permits currently held.
    pub fn in_use(&self) -> usize {
        *self.in_use.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Block until a permit is free. The permit is returned when the guard drops.
    pub fn acquire(&self) -> PermitGuard<'_> {
        let mut in_use = self.in_use.lock().unwrap_or_else(|e| e.into_inner());
        while *in_use >= self.max {
            in_use = self.freed.wait(in_use).unwrap_or_else(|e| e.into_inner());
        }
        *in_use += 1;
        PermitGuard { permits: self }
    }

    fn release(&self) {
        let mut in_use = self.in_use.lock().unwrap_or_else(|e| e.into_inner());
        *in_use = in_use.saturating_sub(1);
        drop(in_use);
        self.freed.notify_one();
    }
}

/// Releases its permit when dropped.
#[derive(Debug)]
pub struct PermitGuard<'a> {
    permits: &'a WorkerPermits,
}

impl Drop for PermitGuard<'_> {
    fn drop(&mut self) {
        self.permits.release();
    }
}
