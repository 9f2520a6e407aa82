/// Snapshot lifecycle
///
/// Creation is best-effort per volume: one volume failing to snapshot is
/// logged and recorded but never aborts the remaining creations, since the
/// mount phase detects and skips unsnapshotted volumes via their missing
/// content path. Destruction is namespace-scoped and idempotent.
use crate::config::types::{Result, Volume};
use crate::context::RunContext;
use crate::platform::VolumeStore;
use crate::safety::interrupt;
use log::{info, warn};

/// Snapshot every resolved volume under the run's namespace.
///
/// Returns the per-volume failures; an empty vec means every creation
/// succeeded. Stops early if an interruption has been observed.
pub fn create_all(
    store: &dyn VolumeStore,
    volumes: &[Volume],
    ctx: &RunContext,
) -> Vec<(String, String)> {
    let mut failures = Vec::new();
    for volume in volumes {
        if interrupt::interrupted() {
            warn!("interrupted, skipping remaining snapshot creations");
            break;
        }
        if volume.mountpoint.is_none() {
            info!("skipping {}: not mounted, nothing to capture", volume.name);
            continue;
        }
        let snapshot = ctx.snapshot_name(&volume.name);
        if ctx.dry_run {
            info!("{}would snapshot {}", ctx.log_prefix(), snapshot);
            continue;
        }
        match store.create_snapshot(&volume.name, &ctx.namespace) {
            Ok(()) => info!("created snapshot {}", snapshot),
            Err(e) => {
                warn!("failed to snapshot {}: {}", volume.name, e);
                failures.push((volume.name.clone(), e.to_string()));
            }
        }
    }
    failures
}

/// Destroy every snapshot tagged with this run's namespace.
///
/// Zero matching snapshots is a no-op success, so the call is safe on the
/// dry-run path, after partial failures, and when repeated. Individual
/// destroy failures are logged and do not stop the remainder.
pub fn destroy_namespace(store: &dyn VolumeStore, ctx: &RunContext) -> Result<usize> {
    if ctx.dry_run {
        info!(
            "{}would destroy all snapshots tagged @{}",
            ctx.log_prefix(),
            ctx.namespace
        );
        return Ok(0);
    }

    let tag = format!("@{}", ctx.namespace);
    let mut destroyed = 0;
    for snapshot in store.list_snapshots()? {
        if !snapshot.ends_with(&tag) {
            continue;
        }
        match store.destroy_snapshot(&snapshot) {
            Ok(()) => {
                info!("destroyed snapshot {}", snapshot);
                destroyed += 1;
            }
            Err(e) => warn!("failed to destroy snapshot {}: {}", snapshot, e),
        }
    }
    if destroyed == 0 {
        info!("no snapshots tagged @{} to destroy", ctx.namespace);
    }
    Ok(destroyed)
}
