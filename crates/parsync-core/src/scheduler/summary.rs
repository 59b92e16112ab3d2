use std::fmt;

use crate::transfer::TransferStatus;

/// Task counts by status. Always rebuilt from current statuses, never kept incrementally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Non-terminal tasks; zero once every worker has been joined.
    pub running: usize,
}

impl Summary {
    pub fn from_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = TransferStatus>,
    {
        statuses.into_iter().fold(Summary::default(), |mut s, status| {
            match status {
                TransferStatus::Completed => s.completed += 1,
                TransferStatus::Failed => s.failed += 1,
                TransferStatus::Cancelled => s.cancelled += 1,
                TransferStatus::Running => s.running += 1,
            }
            s
        })
    }

    pub fn total(&self) -> usize {
        self.completed + self.failed + self.cancelled + self.running
    }

    pub fn all_terminal(&self) -> bool {
        self.running == 0
    }

    /// True when every task completed (vacuously true for an empty run).
    pub fn all_completed(&self) -> bool {
        self.completed == self.total()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Summary: {} completed, {} failed, {} cancelled.",
            self.completed, self.failed, self.cancelled
        )
    }
}
