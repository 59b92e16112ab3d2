//! Default worker count from host CPU, storage medium and memory.

use std::fs;
use std::path::{Path, PathBuf};

/// Absolute ceiling on the recommended worker count.
pub const MAX_WORKERS: usize = 16;

/// Assumed memory when `/proc/meminfo` is unreadable.
const FALLBACK_MEM_GIB: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    SolidState,
    Rotational,
}

/// What the recommendation is computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostProfile {
    pub cpu_cores: usize,
    pub storage: StorageKind,
    pub mem_gib: f64,
}

impl HostProfile {
    /// Probe the running host. Never fails; unknowns fall back to SSD and 8 GiB.
    pub fn detect() -> Self {
        Self {
            cpu_cores: num_cpus::get().max(1),
            storage: detect_storage().unwrap_or(StorageKind::SolidState),
            mem_gib: detect_mem_gib().unwrap_or(FALLBACK_MEM_GIB),
        }
    }
}

/// Recommended concurrency for the current host.
pub fn recommend_worker_count() -> usize {
    let profile = HostProfile::detect();
    let workers = worker_count_for(&profile);
    tracing::debug!(?profile, workers, "recommended worker count");
    workers
}

/// `max(4, 2*cores)` on SSD, `max(2, cores)` on HDD; memory caps at 2 (<2 GiB) or
/// 4 (<4 GiB); never above [`MAX_WORKERS`].
pub fn worker_count_for(profile: &HostProfile) -> usize {
    let base = match profile.storage {
        StorageKind::SolidState => (profile.cpu_cores * 2).max(4),
        StorageKind::Rotational => profile.cpu_cores.max(2),
    };
    let capped = if profile.mem_gib < 2.0 {
        base.min(2)
    } else if profile.mem_gib < 4.0 {
        base.min(4)
    } else {
        base
    };
    capped.min(MAX_WORKERS)
}

fn detect_mem_gib() -> Option<f64> {
    let text = fs::read_to_string("/proc/meminfo").ok()?;
    parse_mem_total_kib(&text).map(|kib| kib as f64 / (1024.0 * 1024.0))
}

fn detect_storage() -> Option<StorageKind> {
    let mounts = fs::read_to_string("/proc/mounts").ok()?;
    let device = root_device(&mounts)?;
    // /dev/mapper/* and /dev/disk/by-* are symlinks to the kernel name.
    let device = fs::canonicalize(&device).unwrap_or_else(|_| PathBuf::from(&device));
    let name = device.file_name()?.to_string_lossy().into_owned();
    rotational_candidates(&name)
        .iter()
        .find_map(|p| fs::read_to_string(p).ok())
        .and_then(|text| parse_rotational(&text))
}

/// `MemTotal:` in KiB.
fn parse_mem_total_kib(meminfo: &str) -> Option<u64> {
    meminfo
        .lines()
        .find(|l| l.starts_with("MemTotal"))
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|v| v.parse().ok())
}

/// Block device backing `/`; the last matching entry wins since later mounts shadow.
fn root_device(mounts: &str) -> Option<String> {
    mounts
        .lines()
        .filter_map(|l| {
            let mut fields = l.split_whitespace();
            let device = fields.next()?;
            let mount_point = fields.next()?;
            (mount_point == "/" && device.starts_with("/dev/")).then(|| device.to_string())
        })
        .last()
}

/// Where the rotational flag may live: the disk itself, or the parent of a partition.
fn rotational_candidates(name: &str) -> Vec<PathBuf> {
    let class = Path::new("/sys/class/block").join(name);
    let whole_disk = name.trim_end_matches(|c: char| c.is_ascii_digit());
    vec![
        class.join("queue/rotational"),
        class.join("../queue/rotational"),
        Path::new("/sys/block").join(whole_disk).join("queue/rotational"),
    ]
}

fn parse_rotational(text: &str) -> Option<StorageKind> {
    match text.trim() {
        "1" => Some(StorageKind::Rotational),
        "0" => Some(StorageKind::SolidState),
        _ => None,
    }
}
