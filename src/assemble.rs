/// Mount assembly
///
/// Builds the working tree mirroring each mounted volume's mountpoint and
/// binds the volume's snapshot content read-only into it. Each volume runs
/// through a small state machine with four terminal states; no outcome
/// aborts the run, and only real mounts reach the ledger.
use crate::config::types::{MountOutcome, Volume};
use crate::context::RunContext;
use crate::ledger::MountLedger;
use crate::platform::Mounter;
use crate::safety::interrupt;
use log::{info, warn};
use nix::sys::stat::{umask, Mode};
use std::fs;
use std::path::{Path, PathBuf};

/// Where a volume exposes its snapshots below its own mountpoint
pub const SNAPSHOT_SUBDIR: &str = ".zfs/snapshot";

/// Read-only content path of this run's snapshot of a volume.
///
/// A `/` mountpoint collapses to the root-level subpath.
pub fn snapshot_content_path(mountpoint: &Path, namespace: &str) -> PathBuf {
    mountpoint.join(SNAPSHOT_SUBDIR).join(namespace)
}

/// Mirror destination of a mountpoint below the tree root
pub fn destination_path(tree_root: &Path, mountpoint: &Path) -> PathBuf {
    tree_root.join(mountpoint.strip_prefix("/").unwrap_or(mountpoint))
}

/// Assembles the mirrored mount tree for one run
pub struct MountAssembler<'a> {
    mounter: &'a dyn Mounter,
    ctx: &'a RunContext,
}

impl<'a> MountAssembler<'a> {
    pub fn new(mounter: &'a dyn Mounter, ctx: &'a RunContext) -> Self {
        Self { mounter, ctx }
    }

    /// Create the tree root with a tightened umask.
    ///
    /// The mask is restored immediately after, mount-time directory
    /// creation inherits the root's permissions via the parent chain.
    pub fn prepare_tree_root(&self) -> crate::config::types::Result<()> {
        if self.ctx.dry_run {
            info!(
                "{}would create tree root {}",
                self.ctx.log_prefix(),
                self.ctx.tree_root.display()
            );
            return Ok(());
        }
        let previous = umask(Mode::from_bits_truncate(0o077));
        let created = fs::create_dir_all(&self.ctx.tree_root);
        umask(previous);
        created?;
        info!("tree root ready at {}", self.ctx.tree_root.display());
        Ok(())
    }

    /// Run every volume through the mount state machine, appending each
    /// successful mount to the ledger. Stops early on interruption; volumes
    /// already mounted stay in the ledger for cleanup.
    pub fn assemble(
        &self,
        volumes: &[Volume],
        ledger: &mut MountLedger,
    ) -> Vec<(String, MountOutcome)> {
        let mut outcomes = Vec::with_capacity(volumes.len());
        for volume in volumes {
            if interrupt::interrupted() {
                warn!("interrupted, skipping remaining mounts");
                break;
            }
            let outcome = self.mount_volume(volume, ledger);
            outcomes.push((volume.name.clone(), outcome));
        }
        outcomes
    }

    fn mount_volume(&self, volume: &Volume, ledger: &mut MountLedger) -> MountOutcome {
        let mountpoint = match &volume.mountpoint {
            Some(mountpoint) => mountpoint,
            None => {
                info!("skipping {}: not mounted", volume.name);
                return MountOutcome::SkippedNoMount;
            }
        };

        let content = snapshot_content_path(mountpoint, &self.ctx.namespace);
        if !self.ctx.dry_run && !content.exists() {
            info!(
                "skipping {}: no snapshot content at {}",
                volume.name,
                content.display()
            );
            return MountOutcome::SkippedEmpty;
        }

        let dest = destination_path(&self.ctx.tree_root, mountpoint);
        if self.ctx.dry_run {
            info!(
                "{}would mount {} read-only at {}",
                self.ctx.log_prefix(),
                content.display(),
                dest.display()
            );
            return MountOutcome::Mounted { dest };
        }

        if let Err(e) = fs::create_dir_all(&dest) {
            warn!(
                "failed to create destination {} for {}: {}",
                dest.display(),
                volume.name,
                e
            );
            return MountOutcome::Failed {
                reason: e.to_string(),
            };
        }

        if let Err(e) = self.mounter.mount_readonly(&content, &dest) {
            warn!("failed to mount {} at {}: {}", volume.name, dest.display(), e);
            return MountOutcome::Failed {
                reason: e.to_string(),
            };
        }

        if let Err(e) = ledger.append(&dest) {
            // A mount the ledger does not know about would never be torn
            // down; undo it right away rather than leak it.
            warn!(
                "failed to record mount of {} in ledger: {}; unmounting",
                volume.name, e
            );
            if let Err(undo) = self.mounter.force_unmount_all(&[dest.clone()]) {
                warn!("could not undo unrecorded mount {}: {}", dest.display(), undo);
            }
            return MountOutcome::Failed {
                reason: e.to_string(),
            };
        }

        info!("mounted {} read-only at {}", volume.name, dest.display());
        MountOutcome::Mounted { dest }
    }
}
