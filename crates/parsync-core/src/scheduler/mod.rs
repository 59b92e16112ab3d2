//! Bounded parallel execution of transfers.
//!
//! One worker thread per task, gated by a shared counting semaphore so at most
//! `worker_count` tool processes exist at once. The caller's thread polls task
//! status into the display and folds a summary.

mod manager;
mod permits;
mod summary;
mod workers;

pub use manager::TransferManager;
pub use permits::{PermitGuard, WorkerPermits};
pub use summary::Summary;
pub use workers::{recommend_worker_count, worker_count_for, HostProfile, StorageKind, MAX_WORKERS};
