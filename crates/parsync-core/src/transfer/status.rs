use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of a transfer. `Running` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TransferStatus {
    Running = 0,
    Completed = 1,
    Failed = 2,
    Cancelled = 3,
}

impl TransferStatus {
    pub fn is_terminal(self) -> bool {
        self != TransferStatus::Running
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => TransferStatus::Completed,
            2 => TransferStatus::Failed,
            3 => TransferStatus::Cancelled,
            _ => TransferStatus::Running,
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransferStatus::Running => "running",
            TransferStatus::Completed => "completed",
            TransferStatus::Failed => "failed",
            TransferStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Single-writer status field readable from any thread.
#[derive(Debug)]
pub(crate) struct StatusCell(AtomicU8);

impl StatusCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(TransferStatus::Running as u8))
    }

    pub(crate) fn get(&self) -> TransferStatus {
        TransferStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move `Running -> to`. Returns false (and changes nothing) if already terminal.
    pub(crate) fn finish(&self, to: TransferStatus) -> bool {
        debug_assert!(to.is_terminal());
        self.0
            .compare_exchange(
                TransferStatus::Running as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_happens_once() {
        let cell = StatusCell::new();
        assert_eq!(cell.get(), TransferStatus::Running);
        assert!(cell.finish(TransferStatus::Failed));
        assert!(!cell.finish(TransferStatus::Completed));
        assert!(!cell.finish(TransferStatus::Cancelled));
        assert_eq!(cell.get(), TransferStatus::Failed);
    }

    #[test]
    fn terminal_states() {
        assert!(!TransferStatus::Running.is_terminal());
        assert!(TransferStatus::Completed.is_terminal());
        assert!(TransferStatus::Failed.is_terminal());
        assert!(TransferStatus::Cancelled.is_terminal());
        assert_eq!(TransferStatus::Cancelled.to_string(), "cancelled");
    }
}
