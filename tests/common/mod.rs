//! In-memory platform fakes shared by the integration tests.
//!
//! Every external call is recorded so tests can assert exactly which
//! snapshots, mounts, and unmounts a run performed.
#![allow(dead_code)]

use snapback::backup::BackupTool;
use snapback::config::types::{Result, SnapbackError, Volume, VolumeSelection};
use snapback::platform::{Mounter, VolumeStore};
use snapback::RunContext;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Default)]
pub struct MockStore {
    pub volumes: Vec<Volume>,
    pub snapshots: Mutex<Vec<String>>,
    pub created: Mutex<Vec<String>>,
    pub destroyed: Mutex<Vec<String>>,
    pub fail_snapshot_for: Option<String>,
}

impl MockStore {
    pub fn with_volumes(volumes: Vec<Volume>) -> Self {
        Self {
            volumes,
            ..Self::default()
        }
    }
}

impl VolumeStore for MockStore {
    fn list_volumes(&self, selection: &VolumeSelection) -> Result<Vec<Volume>> {
        match selection {
            VolumeSelection::All => Ok(self.volumes.clone()),
            VolumeSelection::Explicit(names) | VolumeSelection::ExplicitRecursive(names) => {
                let mut out = Vec::new();
                for name in names {
                    match self.volumes.iter().find(|v| &v.name == name) {
                        Some(v) => out.push(v.clone()),
                        None => {
                            return Err(SnapbackError::VolumeQuery(format!(
                                "dataset does not exist: {}",
                                name
                            )))
                        }
                    }
                }
                Ok(out)
            }
        }
    }

    fn create_snapshot(&self, volume: &str, tag: &str) -> Result<()> {
        if self.fail_snapshot_for.as_deref() == Some(volume) {
            return Err(SnapbackError::Snapshot(format!(
                "cannot snapshot {}",
                volume
            )));
        }
        let name = format!("{}@{}", volume, tag);
        self.created.lock().unwrap().push(name.clone());
        self.snapshots.lock().unwrap().push(name);
        Ok(())
    }

    fn list_snapshots(&self) -> Result<Vec<String>> {
        Ok(self.snapshots.lock().unwrap().clone())
    }

    fn destroy_snapshot(&self, identifier: &str) -> Result<()> {
        self.snapshots.lock().unwrap().retain(|s| s != identifier);
        self.destroyed.lock().unwrap().push(identifier.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MockMounter {
    /// (source, dest) pairs, in mount order
    pub mounted: Mutex<Vec<(PathBuf, PathBuf)>>,
    /// Each force_unmount_all invocation with its full target set
    pub unmount_calls: Mutex<Vec<Vec<PathBuf>>>,
    /// Destinations currently mounted
    pub active: Mutex<Vec<PathBuf>>,
    /// Fail mounts whose destination ends with this suffix
    pub fail_dest_suffix: Option<String>,
    /// Simulate an operator signal arriving right after the first mount
    pub interrupt_after_first_mount: bool,
}

impl Mounter for MockMounter {
    fn mount_readonly(&self, source: &Path, dest: &Path) -> Result<()> {
        if let Some(suffix) = &self.fail_dest_suffix {
            if dest.to_string_lossy().ends_with(suffix.as_str()) {
                return Err(SnapbackError::Mount(format!(
                    "mount refused for {}",
                    dest.display()
                )));
            }
        }
        let mut mounted = self.mounted.lock().unwrap();
        mounted.push((source.to_path_buf(), dest.to_path_buf()));
        self.active.lock().unwrap().push(dest.to_path_buf());
        if self.interrupt_after_first_mount && mounted.len() == 1 {
            snapback::safety::interrupt::request();
        }
        Ok(())
    }

    fn force_unmount_all(&self, dests: &[PathBuf]) -> Result<()> {
        self.unmount_calls.lock().unwrap().push(dests.to_vec());
        self.active
            .lock()
            .unwrap()
            .retain(|active| !dests.contains(active));
        Ok(())
    }
}

#[derive(Default)]
pub struct MockBackup {
    pub runs: Mutex<Vec<PathBuf>>,
    pub exit_code: i32,
}

impl BackupTool for MockBackup {
    fn run(&self, root: &Path, _options: Option<&str>) -> Result<i32> {
        self.runs.lock().unwrap().push(root.to_path_buf());
        Ok(self.exit_code)
    }
}

/// Context rooted in a scratch directory with a fixed namespace
pub fn test_context(base: &Path, namespace: &str, dry_run: bool) -> RunContext {
    RunContext {
        namespace: namespace.to_string(),
        dry_run,
        tree_root: base.join("work").join("tree"),
        ledger_path: base.join("work").join(format!("mounts.{}", namespace)),
        preserve_tree: false,
    }
}

/// A volume mounted under the scratch directory. When `with_content` is
/// set, the snapshot content path for `namespace` is materialized so the
/// assembler's existence check passes.
pub fn mounted_volume(
    base: &Path,
    name: &str,
    rel_mountpoint: &str,
    namespace: &str,
    with_content: bool,
) -> Volume {
    let mountpoint = base.join(rel_mountpoint);
    fs::create_dir_all(&mountpoint).unwrap();
    if with_content {
        let content = mountpoint.join(".zfs/snapshot").join(namespace);
        fs::create_dir_all(&content).unwrap();
        fs::write(content.join("marker"), name).unwrap();
    }
    Volume {
        name: name.to_string(),
        mountpoint: Some(mountpoint),
    }
}

/// A volume with no mountpoint
pub fn unmounted_volume(name: &str) -> Volume {
    Volume {
        name: name.to_string(),
        mountpoint: None,
    }
}
