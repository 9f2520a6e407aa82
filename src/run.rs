/// Run orchestration
///
/// Sequences the phases of one backup run: snapshot, mount assembly,
/// backup invocation, and unconditional cleanup. Per-volume problems are
/// collected as tagged outcomes in the run report instead of aborting;
/// only pre-state validation failures escape before any state exists.
use crate::assemble::MountAssembler;
use crate::backup::{self, BackupTool};
use crate::config::types::{MountOutcome, Result, RunConfig, Volume, VolumeSelection};
use crate::context::RunContext;
use crate::ledger::MountLedger;
use crate::platform::{Mounter, VolumeStore};
use crate::safety::cleanup::CleanupController;
use crate::safety::interrupt;
use crate::snapshot;
use crate::volume;
use log::{info, warn};

/// Process exit statuses
pub mod exit_codes {
    /// Snapshots, mounts, and the backup command all succeeded
    pub const SUCCESS: i32 = 0;
    /// Some volumes failed, the run was interrupted, or a post-hook failed
    pub const DEGRADED: i32 = 1;
    /// Argument validation failed before any state was created
    pub const USAGE: i32 = 2;
    /// The backup command itself failed
    pub const BACKUP_FAILED: i32 = 3;
}

/// What happened to each volume and phase of a run
#[derive(Debug, Default)]
pub struct RunReport {
    /// Per-volume terminal states, in processing order
    pub outcomes: Vec<(String, MountOutcome)>,
    /// Volumes whose snapshot creation failed, with the reason
    pub snapshot_failures: Vec<(String, String)>,
    /// Exit code of the backup command, if it ran
    pub backup_status: Option<i32>,
    /// Why the backup command could not be run at all
    pub backup_error: Option<String>,
    /// An interruption signal was observed during the run
    pub interrupted: bool,
    /// The post-run hook failed
    pub post_hook_failed: bool,
    /// Operational warnings collected during teardown
    pub cleanup_warnings: Vec<String>,
}

impl RunReport {
    /// Some volumes succeeded while others failed, or the run was cut short
    pub fn degraded(&self) -> bool {
        self.interrupted
            || self.post_hook_failed
            || !self.snapshot_failures.is_empty()
            || self.outcomes.iter().any(|(_, o)| o.is_failure())
    }

    pub fn backup_failed(&self) -> bool {
        self.backup_error.is_some() || matches!(self.backup_status, Some(code) if code != 0)
    }

    pub fn mounted_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, MountOutcome::Mounted { .. }))
            .count()
    }

    /// Final process exit status; a backup failure is reported in
    /// preference to a merely degraded run.
    pub fn exit_code(&self) -> i32 {
        if self.backup_failed() {
            exit_codes::BACKUP_FAILED
        } else if self.degraded() {
            exit_codes::DEGRADED
        } else {
            exit_codes::SUCCESS
        }
    }

    pub fn log_summary(&self) {
        info!(
            "run finished: {} mounted, {} snapshot failure(s), {} cleanup warning(s)",
            self.mounted_count(),
            self.snapshot_failures.len(),
            self.cleanup_warnings.len()
        );
        if self.interrupted {
            warn!("run was interrupted; cleanup was performed");
        }
        if let Some(code) = self.backup_status {
            if code != 0 {
                warn!("backup command exited with status {}", code);
            }
        }
        if let Some(reason) = &self.backup_error {
            warn!("backup command could not be run: {}", reason);
        }
    }
}

/// Drives one run end to end
pub struct Orchestrator<'a> {
    store: &'a dyn VolumeStore,
    mounter: &'a dyn Mounter,
    backup: &'a dyn BackupTool,
    config: &'a RunConfig,
    ctx: &'a RunContext,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        store: &'a dyn VolumeStore,
        mounter: &'a dyn Mounter,
        backup: &'a dyn BackupTool,
        config: &'a RunConfig,
        ctx: &'a RunContext,
    ) -> Self {
        Self {
            store,
            mounter,
            backup,
            config,
            ctx,
        }
    }

    /// Execute the full run.
    ///
    /// Validation, the pre-run hook, and enumeration fail fast: nothing has
    /// been created yet, so no teardown is owed. From the snapshot phase on,
    /// cleanup is guaranteed to run no matter how the phases end.
    pub fn execute(&self) -> Result<RunReport> {
        let selection = VolumeSelection::from_config(self.config)?;
        if let Some(hook) = &self.config.pre_hook {
            backup::run_hook("pre-run", hook, self.ctx.dry_run)?;
        }
        let volumes = volume::enumerate(self.store, &selection)?;

        let mut report = RunReport::default();
        let phase_result = self.protected_phases(&volumes, &mut report);

        report.interrupted = interrupt::interrupted();
        if report.interrupted {
            interrupt::log_interruption();
        }
        report.cleanup_warnings = CleanupController::new(self.store, self.mounter, self.ctx).run();

        // An internal phase error surfaces only after teardown has run.
        phase_result?;

        if let Some(hook) = &self.config.post_hook {
            if let Err(e) = backup::run_hook("post-run", hook, self.ctx.dry_run) {
                warn!("{}", e);
                report.post_hook_failed = true;
            }
        }
        Ok(report)
    }

    /// Snapshot, mount, and backup phases. Interruption is observed at each
    /// phase boundary and between volumes inside a phase; once seen, the
    /// remaining phases are skipped and the caller proceeds to cleanup.
    fn protected_phases(&self, volumes: &[Volume], report: &mut RunReport) -> Result<()> {
        info!(
            "{}snapshotting {} volume(s) under namespace {}",
            self.ctx.log_prefix(),
            volumes.len(),
            self.ctx.namespace
        );
        report.snapshot_failures = snapshot::create_all(self.store, volumes, self.ctx);
        if interrupt::interrupted() {
            return Ok(());
        }

        let assembler = MountAssembler::new(self.mounter, self.ctx);
        assembler.prepare_tree_root()?;
        let mut ledger = MountLedger::new(self.ctx.ledger_path.clone());
        report.outcomes = assembler.assemble(volumes, &mut ledger);
        if interrupt::interrupted() {
            return Ok(());
        }

        if self.ctx.dry_run {
            info!(
                "{}would run backup command against {}",
                self.ctx.log_prefix(),
                self.ctx.tree_root.display()
            );
            return Ok(());
        }
        match self
            .backup
            .run(&self.ctx.tree_root, self.config.backup_opts.as_deref())
        {
            Ok(code) => report.backup_status = Some(code),
            Err(e) => {
                warn!("{}", e);
                report.backup_error = Some(e.to_string());
            }
        }
        Ok(())
    }
}
