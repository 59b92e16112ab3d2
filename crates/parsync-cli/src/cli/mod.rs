//! CLI for parsync: parse arguments, build transfers, run them.

mod options;

use anyhow::{Context, Result};
use clap::Parser;
use parsync_core::config::{self, ParsyncConfig};
use parsync_core::scheduler::{Summary, TransferManager};
use parsync_core::shutdown::ShutdownSignal;
use parsync_core::transfer::{TransferSpec, TransferTask};

pub use options::transfer_options;

/// Top-level CLI for parsync.
#[derive(Debug, Parser)]
#[command(name = "parsync")]
#[command(about = "Run several rsync transfers in parallel with a live progress view", long_about = None)]
pub struct Cli {
    /// One or more sources followed by the destination.
    #[arg(required = true, num_args = 2.., value_name = "PATH")]
    pub paths: Vec<String>,

    /// Number of transfers to run at once (0 = detect from CPU, disk and memory).
    #[arg(long, value_name = "N")]
    pub parallel: Option<usize>,

    /// Bandwidth limit per transfer in KB/s.
    #[arg(long, value_name = "KBPS")]
    pub bwlimit: Option<u64>,

    /// Keep partially transferred files if a transfer is interrupted.
    #[arg(long)]
    pub partial: bool,

    /// Do not pass -a (archive mode) to the transfer tool.
    #[arg(long)]
    pub no_archive: bool,

    /// Cancel remaining transfers as soon as one fails.
    #[arg(long)]
    pub fail_fast: bool,

    /// Transfer tool to run instead of the configured one (default rsync).
    #[arg(long, value_name = "PROGRAM")]
    pub program: Option<String>,
}

impl Cli {
    pub fn sources(&self) -> &[String] {
        &self.paths[..self.paths.len().saturating_sub(1)]
    }

    pub fn destination(&self) -> &str {
        self.paths.last().map(String::as_str).unwrap_or_default()
    }

    /// Overlay command-line choices onto the loaded config.
    pub fn apply_to(&self, cfg: &mut ParsyncConfig) {
        if let Some(n) = self.parallel {
            cfg.workers = n;
        }
        if self.no_archive {
            cfg.archive = false;
        }
        if self.fail_fast {
            cfg.fail_fast = true;
        }
        if let Some(program) = &self.program {
            cfg.program = program.clone();
        }
    }

    pub fn specs(&self) -> Vec<TransferSpec> {
        let options = transfer_options(self.partial, self.bwlimit);
        self.sources()
            .iter()
            .map(|source| TransferSpec::new(source.as_str(), self.destination(), options.clone()))
            .collect()
    }
}

pub fn run_from_args() -> Result<Summary> {
    let cli = Cli::parse();
    let mut cfg = config::load_or_init().context("load config")?;
    cli.apply_to(&mut cfg);
    tracing::debug!("effective config: {:?}", cfg);
    run(&cli, &cfg)
}

fn run(cli: &Cli, cfg: &ParsyncConfig) -> Result<Summary> {
    let signal = ShutdownSignal::new();
    signal.start().context("install interrupt handler")?;

    let mut manager = TransferManager::from_config(cfg, signal.clone());
    for spec in cli.specs() {
        manager.add_transfer(TransferTask::new(spec));
    }

    println!(
        "Starting {} transfers with {} workers...",
        manager.tasks().len(),
        manager.worker_count()
    );
    let result = manager.run_all();
    signal.stop();
    result
}

#[cfg(test)]
mod tests;
