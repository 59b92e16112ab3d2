pub mod config;
pub mod logging;

pub mod display;
pub mod error;
pub mod progress;
pub mod scheduler;
pub mod shutdown;
pub mod transfer;
