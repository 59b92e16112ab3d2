use std::time::Duration;

use crate::config::ParsyncConfig;

use super::TransferSpec;

/// How to invoke the transfer tool; shared by every task of a run.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    pub program: String,
    /// Emit `-a` before everything else.
    pub archive: bool,
    pub progress_flag: String,
    /// SIGTERM-to-SIGKILL grace period during teardown.
    pub terminate_timeout: Duration,
}

impl Default for ToolCommand {
    fn default() -> Self {
        Self::from_config(&ParsyncConfig::default())
    }
}

impl ToolCommand {
    pub fn from_config(cfg: &ParsyncConfig) -> Self {
        Self {
            program: cfg.program.clone(),
            archive: cfg.archive,
            progress_flag: cfg.progress_flag.clone(),
            terminate_timeout: cfg.terminate_timeout(),
        }
    }

    /// Argument vector: mode flags, progress flag, pass-through options, source, destination.
    pub fn args(&self, spec: &TransferSpec) -> Vec<String> {
        let mut args = Vec::with_capacity(spec.options.len() + 4);
        if self.archive {
            args.push("-a".to_string());
        }
        if !self.progress_flag.is_empty() {
            args.push(self.progress_flag.clone());
        }
        args.extend(spec.options.iter().cloned());
        args.push(spec.source.clone());
        args.push(spec.destination.clone());
        args
    }
}
