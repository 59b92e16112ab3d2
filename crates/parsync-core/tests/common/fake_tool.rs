//! Fake transfer tool for integration tests.
//!
//! The tool accepts the real argument shape (`-a --info=progress2 [opts] SRC DST`) and
//! hands everything to `/bin/sh SRC "$@"`, so each transfer's source path is a small
//! behaviour script that decides what to print and how to exit.

use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use parsync_core::transfer::{ToolCommand, TransferSpec, TransferTask};
use tempfile::TempDir;

const TOOL: &str = r#"#!/bin/sh
eval "behaviour=\${$(($# - 1))}"
exec /bin/sh "$behaviour" "$@"
"#;

/// Written once, before any test in the binary spawns a child, so the executable
/// is never open for writing while another thread forks.
fn tool_path() -> &'static Path {
    static TOOL_FILE: OnceLock<(TempDir, PathBuf)> = OnceLock::new();
    let (_dir, path) = TOOL_FILE.get_or_init(|| {
        let dir = tempfile::tempdir().expect("tool tempdir");
        let path = dir.path().join("fake-rsync");
        fs::write(&path, TOOL).expect("write fake tool");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod fake tool");
        (dir, path)
    });
    path
}

/// Per-test scratch dir holding behaviour scripts and whatever they record.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        tool_path();
        Self {
            dir: tempfile::tempdir().expect("fixture tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn tool(&self) -> ToolCommand {
        ToolCommand {
            program: tool_path().to_string_lossy().into_owned(),
            archive: true,
            progress_flag: "--info=progress2".into(),
            terminate_timeout: Duration::from_secs(5),
        }
    }

    /// Write `body` as behaviour script `<name>.sh`. `$DIR` expands to the fixture dir.
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(format!("{}.sh", name));
        let text = format!("DIR='{}'\n{}\n", self.dir.path().display(), body);
        fs::write(&path, text).expect("write behaviour script");
        path
    }

    /// Task named `name` whose behaviour is `body`.
    pub fn task(&self, name: &str, body: &str) -> TransferTask {
        self.task_with_options(name, body, vec![])
    }

    pub fn task_with_options(&self, name: &str, body: &str, options: Vec<String>) -> TransferTask {
        let source = self.script(name, body);
        let dest = self.dir.path().join("dest");
        TransferTask::new(
            TransferSpec::new(
                source.to_string_lossy().into_owned(),
                dest.to_string_lossy().into_owned(),
                options,
            )
            .with_name(name),
        )
    }

    pub fn read(&self, file: &str) -> String {
        fs::read_to_string(self.dir.path().join(file)).unwrap_or_default()
    }

    pub fn exists(&self, file: &str) -> bool {
        self.dir.path().join(file).exists()
    }
}

/// Cloneable in-memory display sink.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuf {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}
