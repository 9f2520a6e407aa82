//! Interruption contract: a signal observed after at least one successful
//! mount and before backup invocation still results in that mount being
//! unmounted, its snapshot destroyed, and the working tree removed.
//!
//! Kept in its own test binary because the interruption flag is
//! process-global.

mod common;

use common::{mounted_volume, test_context, MockBackup, MockMounter, MockStore};
use snapback::assemble::destination_path;
use snapback::config::types::RunConfig;
use snapback::run::{exit_codes, Orchestrator};
use snapback::safety::interrupt;
use tempfile::TempDir;

#[test]
fn interruption_after_first_mount_still_tears_everything_down() {
    interrupt::reset();

    let tmp = TempDir::new().unwrap();
    let ns = "snapback-test-interrupt";
    let ctx = test_context(tmp.path(), ns, false);

    let vol_a = mounted_volume(tmp.path(), "tank/a", "a", ns, true);
    let vol_c = mounted_volume(tmp.path(), "tank/c", "a/c", ns, true);
    let dest_a = destination_path(&ctx.tree_root, vol_a.mountpoint.as_ref().unwrap());

    let store = MockStore::with_volumes(vec![vol_a, vol_c]);
    let mounter = MockMounter {
        interrupt_after_first_mount: true,
        ..MockMounter::default()
    };
    let backup = MockBackup::default();
    let config = RunConfig {
        all_volumes: true,
        backup_cmd: "mock-backup".to_string(),
        ..RunConfig::default()
    };

    let report = Orchestrator::new(&store, &mounter, &backup, &config, &ctx)
        .execute()
        .unwrap();

    // Only the first volume was mounted before the interruption.
    assert_eq!(mounter.mounted.lock().unwrap().len(), 1);

    // The backup command never ran.
    assert!(backup.runs.lock().unwrap().is_empty());

    // The one real mount was unmounted via the ledger.
    let unmounts = mounter.unmount_calls.lock().unwrap();
    assert_eq!(unmounts.len(), 1);
    assert_eq!(unmounts[0], vec![dest_a]);
    assert!(mounter.active.lock().unwrap().is_empty());

    // Both volumes were snapshotted before the signal; both snapshots are
    // destroyed.
    assert_eq!(store.destroyed.lock().unwrap().len(), 2);
    assert!(store.snapshots.lock().unwrap().is_empty());

    // Working tree and ledger are gone.
    assert!(!ctx.tree_root.exists());
    assert!(!ctx.ledger_path.exists());

    assert!(report.interrupted);
    assert_eq!(report.exit_code(), exit_codes::DEGRADED);

    interrupt::reset();
}
