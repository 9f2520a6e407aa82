/// Core types and structures for the snapback system
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Run configuration assembled from the command line
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    /// Explicitly named volumes to back up
    pub volumes: Vec<String>,
    /// Back up every volume known to the volume store
    pub all_volumes: bool,
    /// Expand the named volumes to their descendants
    pub recursive: bool,
    /// Log intended actions without touching snapshot or mount state
    pub dry_run: bool,
    /// Leave the working tree in place after the run
    pub keep_tree: bool,
    /// External backup program handed the assembled tree root
    pub backup_cmd: String,
    /// Extra option string passed to the backup program before the root
    pub backup_opts: Option<String>,
    /// Shell command run before any snapshot state is created
    pub pre_hook: Option<String>,
    /// Shell command run after cleanup
    pub post_hook: Option<String>,
    /// State directory holding the working tree and mount ledger
    pub work_dir: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            volumes: Vec::new(),
            all_volumes: false,
            recursive: false,
            dry_run: false,
            keep_tree: false,
            backup_cmd: String::new(),
            backup_opts: None,
            pre_hook: None,
            post_hook: None,
            work_dir: None,
        }
    }
}

impl RunConfig {
    /// Validate the argument surface before any state is created
    pub fn validate(&self) -> Result<()> {
        if self.volumes.is_empty() && !self.all_volumes {
            return Err(SnapbackError::Usage(
                "no volumes named and --all not requested".to_string(),
            ));
        }
        if self.backup_cmd.trim().is_empty() {
            return Err(SnapbackError::Usage(
                "backup command must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// A mountable filesystem unit as reported by the volume store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    /// Hierarchical volume identifier (e.g. "tank/usr/home")
    pub name: String,
    /// Current mountpoint, absent for unmounted volumes
    pub mountpoint: Option<PathBuf>,
}

/// Which volumes a run targets
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VolumeSelection {
    /// Exactly the named volumes
    Explicit(Vec<String>),
    /// The named volumes plus all their descendants
    ExplicitRecursive(Vec<String>),
    /// Every volume known to the store
    All,
}

impl VolumeSelection {
    /// Build the selection from a validated config
    pub fn from_config(config: &RunConfig) -> Result<Self> {
        config.validate()?;
        if config.all_volumes {
            Ok(VolumeSelection::All)
        } else if config.recursive {
            Ok(VolumeSelection::ExplicitRecursive(config.volumes.clone()))
        } else {
            Ok(VolumeSelection::Explicit(config.volumes.clone()))
        }
    }
}

/// Terminal state of one volume's pass through the mount assembler
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MountOutcome {
    /// Snapshot content bound read-only at the destination
    Mounted { dest: PathBuf },
    /// Volume has no mountpoint, nothing to mirror
    SkippedNoMount,
    /// Snapshot content path absent (empty dataset or failed snapshot)
    SkippedEmpty,
    /// Mount call itself failed; destination is not in the ledger
    Failed { reason: String },
}

impl MountOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, MountOutcome::Failed { .. })
    }
}

/// Custom error types for snapback
#[derive(Error, Debug)]
pub enum SnapbackError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("usage error: {0}")]
    Usage(String),

    #[error("volume query failed: {0}")]
    VolumeQuery(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("mount error: {0}")]
    Mount(String),

    #[error("ledger error: {0}")]
    Ledger(String),

    #[error("hook failed: {0}")]
    Hook(String),

    #[error("backup command error: {0}")]
    Backup(String),

    #[error("cleanup error: {0}")]
    Cleanup(String),

    #[error("signal handling error: {0}")]
    Signal(String),

    #[error("interrupted")]
    Interrupted,
}

/// Result type alias for snapback operations
pub type Result<T> = std::result::Result<T, SnapbackError>;
