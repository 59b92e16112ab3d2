//! One transfer: its immutable spec, the tool invocation, and the task state machine.

mod command;
mod process;
mod spec;
mod status;
mod task;

pub use command::ToolCommand;
pub use spec::TransferSpec;
pub use status::TransferStatus;
pub use task::TransferTask;
