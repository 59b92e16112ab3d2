use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Global configuration loaded from `~/.config/parsync/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsyncConfig {
    /// Maximum concurrent transfers. 0 = derive from host CPU, storage and memory.
    pub workers: usize,
    /// Transfer tool to invoke for each source.
    pub program: String,
    /// Pass `-a` (archive mode) to the tool.
    pub archive: bool,
    /// Flag that makes the tool emit one machine-parsable progress line.
    pub progress_flag: String,
    /// Display redraw cadence in milliseconds.
    pub refresh_interval_ms: u64,
    /// Controller poll cadence in milliseconds.
    pub poll_interval_ms: u64,
    /// Grace period between SIGTERM and SIGKILL when tearing a subprocess down.
    pub terminate_timeout_secs: u64,
    /// Cancel all remaining transfers as soon as one fails.
    pub fail_fast: bool,
}

impl Default for ParsyncConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            program: "rsync".to_string(),
            archive: true,
            progress_flag: "--info=progress2".to_string(),
            refresh_interval_ms: 100,
            poll_interval_ms: 50,
            terminate_timeout_secs: 5,
            fail_fast: false,
        }
    }
}

impl ParsyncConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(1))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn terminate_timeout(&self) -> Duration {
        Duration::from_secs(self.terminate_timeout_secs)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("parsync")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ParsyncConfig> {
    let path = config_path()?;
    load_or_init_at(&path)
}

/// Same as [`load_or_init`] against an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<ParsyncConfig> {
    if !path.exists() {
        let default_cfg = ParsyncConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)
            .with_context(|| format!("write default config {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: ParsyncConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = ParsyncConfig::default();
        assert_eq!(cfg.workers, 0);
        assert_eq!(cfg.program, "rsync");
        assert!(cfg.archive);
        assert_eq!(cfg.progress_flag, "--info=progress2");
        assert_eq!(cfg.terminate_timeout(), Duration::from_secs(5));
        assert!(!cfg.fail_fast);
    }

    #[test]
    fn config_toml_partial_uses_defaults() {
        let toml = r#"
            workers = 3
            fail_fast = true
        "#;
        let cfg: ParsyncConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.workers, 3);
        assert!(cfg.fail_fast);
        assert_eq!(cfg.program, "rsync");
        assert_eq!(cfg.refresh_interval_ms, 100);
    }

    #[test]
    fn zero_intervals_are_floored() {
        let cfg = ParsyncConfig {
            refresh_interval_ms: 0,
            poll_interval_ms: 0,
            ..ParsyncConfig::default()
        };
        assert_eq!(cfg.refresh_interval(), Duration::from_millis(1));
        assert_eq!(cfg.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn load_or_init_writes_default_then_reads_it_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let first = load_or_init_at(&path).unwrap();
        assert!(path.exists());
        let second = load_or_init_at(&path).unwrap();
        assert_eq!(first.program, second.program);
        assert_eq!(first.poll_interval_ms, second.poll_interval_ms);
    }

    #[test]
    fn load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "workers = \"many\"").unwrap();
        let err = load_or_init_at(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("parse config"));
    }
}
