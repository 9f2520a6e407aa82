/// Cleanup controller
///
/// Full teardown runs after the backup phase, after an explicit failure in
/// any earlier phase, and upon interruption. Every step is best-effort: a
/// failure in one step is collected as a warning and never prevents the
/// next step from running.
use crate::config::types::Result;
use crate::context::RunContext;
use crate::ledger::MountLedger;
use crate::platform::{Mounter, VolumeStore};
use crate::safety::interrupt;
use crate::snapshot;
use log::{info, warn};
use std::fs;
use std::path::Path;

/// Forced unmounting may need several passes to unwind a mount stack where
/// children are listed before parents.
pub const UNMOUNT_RETRY_LIMIT: u32 = 5;

/// Ledger-driven teardown for one run
pub struct CleanupController<'a> {
    store: &'a dyn VolumeStore,
    mounter: &'a dyn Mounter,
    ctx: &'a RunContext,
}

impl<'a> CleanupController<'a> {
    pub fn new(
        store: &'a dyn VolumeStore,
        mounter: &'a dyn Mounter,
        ctx: &'a RunContext,
    ) -> Self {
        Self { store, mounter, ctx }
    }

    /// Run the full teardown sequence. Returns operational warnings;
    /// leftover state is a warning, never a fatal condition.
    pub fn run(&self) -> Vec<String> {
        // From here on a second signal exits plainly instead of racing a
        // second teardown.
        interrupt::disarm();
        info!("cleanup: starting teardown for namespace {}", self.ctx.namespace);

        let mut warnings = Vec::new();
        self.unmount_phase(&mut warnings);
        self.destroy_phase(&mut warnings);
        self.remove_state(&mut warnings);
        warnings
    }

    /// Unmount everything the ledger recorded, with bounded forced retries.
    fn unmount_phase(&self, warnings: &mut Vec<String>) {
        let dests = match MountLedger::load(&self.ctx.ledger_path) {
            Ok(dests) => dests,
            Err(e) => {
                let msg = format!("could not read mount ledger: {}", e);
                warn!("cleanup: {}", msg);
                warnings.push(msg);
                return;
            }
        };
        if dests.is_empty() {
            info!("cleanup: nothing to unmount");
            return;
        }

        info!("cleanup: unmounting {} destination(s)", dests.len());
        let mut unmounted = false;
        for attempt in 1..=UNMOUNT_RETRY_LIMIT {
            match self.mounter.force_unmount_all(&dests) {
                Ok(()) => {
                    unmounted = true;
                    break;
                }
                Err(e) => warn!(
                    "cleanup: forced unmount attempt {}/{} failed: {}",
                    attempt, UNMOUNT_RETRY_LIMIT, e
                ),
            }
        }
        if !unmounted {
            warnings.push(format!(
                "mounts left behind after {} forced unmount attempts",
                UNMOUNT_RETRY_LIMIT
            ));
        }

        for survivor in leftover_mounts(&self.ctx.tree_root) {
            warnings.push(format!("still mounted below tree root: {}", survivor));
        }
    }

    /// Destroy this run's snapshots regardless of the unmount outcome.
    fn destroy_phase(&self, warnings: &mut Vec<String>) {
        match snapshot::destroy_namespace(self.store, self.ctx) {
            Ok(destroyed) if destroyed > 0 => {
                info!("cleanup: destroyed {} snapshot(s)", destroyed)
            }
            Ok(_) => {}
            Err(e) => {
                let msg = format!("snapshot destruction failed: {}", e);
                warn!("cleanup: {}", msg);
                warnings.push(msg);
            }
        }
    }

    /// Remove the ledger and, unless preservation is configured, the tree.
    fn remove_state(&self, warnings: &mut Vec<String>) {
        if self.ctx.dry_run {
            info!(
                "{}would remove ledger and working tree",
                self.ctx.log_prefix()
            );
            return;
        }

        if let Err(e) = MountLedger::remove(&self.ctx.ledger_path) {
            let msg = format!("could not remove ledger: {}", e);
            warn!("cleanup: {}", msg);
            warnings.push(msg);
        }

        if self.ctx.preserve_tree {
            info!(
                "cleanup: preserving working tree at {}",
                self.ctx.tree_root.display()
            );
            return;
        }
        match remove_tree_same_device(&self.ctx.tree_root) {
            Ok(()) => info!(
                "cleanup: removed working tree {}",
                self.ctx.tree_root.display()
            ),
            Err(e) => {
                let msg = format!("could not remove working tree: {}", e);
                warn!("cleanup: {}", msg);
                warnings.push(msg);
            }
        }
    }
}

/// Mount-table entries still below the tree root after unmounting.
///
/// Only Linux exposes /proc/mounts; elsewhere the check reports nothing.
pub fn leftover_mounts(tree_root: &Path) -> Vec<String> {
    #[cfg(target_os = "linux")]
    {
        let mounts = match fs::read_to_string("/proc/mounts") {
            Ok(m) => m,
            Err(_) => return Vec::new(),
        };
        mounts
            .lines()
            .filter_map(|line| line.split_whitespace().nth(1))
            .filter(|target| Path::new(target).starts_with(tree_root))
            .map(str::to_string)
            .collect()
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = tree_root;
        Vec::new()
    }
}

/// Remove a directory tree without crossing filesystem boundaries.
///
/// If a mount below the tree survived the unmount phase, descending into it
/// would delete snapshot content through the bind; the walk refuses at the
/// device-number change instead. An absent root is a no-op.
pub fn remove_tree_same_device(root: &Path) -> Result<()> {
    use crate::config::types::SnapbackError;
    use std::os::unix::fs::MetadataExt;

    fn remove_contents(dir: &Path, root_dev: u64) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let meta = fs::symlink_metadata(&path)?;
            if meta.file_type().is_dir() {
                if meta.dev() != root_dev {
                    return Err(SnapbackError::Cleanup(format!(
                        "refusing to cross filesystem boundary at {}",
                        path.display()
                    )));
                }
                remove_contents(&path, root_dev)?;
                fs::remove_dir(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    let meta = match fs::symlink_metadata(root) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    if !meta.file_type().is_dir() {
        return Err(SnapbackError::Cleanup(format!(
            "working tree root is not a directory: {}",
            root.display()
        )));
    }
    remove_contents(root, meta.dev())?;
    fs::remove_dir(root)?;
    Ok(())
}
