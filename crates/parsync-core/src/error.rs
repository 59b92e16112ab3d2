//! Transfer error taxonomy.

use std::io;
use thiserror::Error;

/// Why a transfer did not complete, or why its status could not be shown.
///
/// These never cross a worker thread boundary as `Err`; a task folds them into its
/// `error` text and terminal status.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The transfer tool could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    /// Reading the tool's output or waiting on it failed.
    #[error("transfer I/O: {0}")]
    Io(#[from] io::Error),
    /// The tool exited unsuccessfully; carries its stderr (or a synthesized reason).
    #[error("{0}")]
    Runtime(String),
    /// The shutdown signal was observed.
    #[error("cancelled by user")]
    Cancelled,
    /// A task's status line could not be produced.
    #[error("status unavailable: {0}")]
    Render(String),
}

impl TransferError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::Spawn { .. } => ErrorKind::SpawnFailure,
            TransferError::Io(_) | TransferError::Runtime(_) => ErrorKind::RuntimeFailure,
            TransferError::Cancelled => ErrorKind::UserCancellation,
            TransferError::Render(_) => ErrorKind::RenderFailure,
        }
    }
}

/// Coarse classification used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SpawnFailure,
    RuntimeFailure,
    UserCancellation,
    RenderFailure,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_error_names_program() {
        let err = TransferError::Spawn {
            program: "rsync".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        };
        assert_eq!(err.kind(), ErrorKind::SpawnFailure);
        assert_eq!(
            err.to_string(),
            "failed to start rsync: No such file or directory"
        );
    }

    #[test]
    fn runtime_error_is_the_bare_diagnostic() {
        let err = TransferError::Runtime("disk full".into());
        assert_eq!(err.to_string(), "disk full");
        assert_eq!(err.kind(), ErrorKind::RuntimeFailure);
    }

    #[test]
    fn io_converts_via_from() {
        let err: TransferError = io::Error::new(io::ErrorKind::BrokenPipe, "pipe").into();
        assert_eq!(err.kind(), ErrorKind::RuntimeFailure);
        assert_eq!(TransferError::Cancelled.kind(), ErrorKind::UserCancellation);
    }
}
