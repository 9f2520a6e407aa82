/// Backup invocation and run hooks
///
/// The backup tool is an opaque external command: it gets the assembled
/// tree root as its final positional argument plus whatever option string
/// the operator configured, and the orchestrator blocks until it exits.
/// A non-zero exit is reported and surfaced in the run status but never
/// blocks cleanup.
use crate::config::types::{Result, SnapbackError};
use log::{debug, info, warn};
use std::path::Path;
use std::process::Command;

/// Boundary for the external backup command
pub trait BackupTool {
    /// Run the tool against the tree root; returns its exit code
    fn run(&self, root: &Path, options: Option<&str>) -> Result<i32>;
}

/// Backup tool invoked as a system command
pub struct CommandBackupTool {
    program: String,
}

impl CommandBackupTool {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl BackupTool for CommandBackupTool {
    fn run(&self, root: &Path, options: Option<&str>) -> Result<i32> {
        let mut command = Command::new(&self.program);
        if let Some(options) = options {
            command.args(options.split_whitespace());
        }
        command.arg(root);

        info!("running backup command: {} {}", self.program, root.display());
        let status = command
            .status()
            .map_err(|e| SnapbackError::Backup(format!("failed to execute {}: {}", self.program, e)))?;
        let code = status.code().unwrap_or(-1);
        if code == 0 {
            info!("backup command finished successfully");
        } else {
            warn!("backup command exited with status {}", code);
        }
        Ok(code)
    }
}

/// Run a pre-/post-run hook through the shell.
///
/// Hooks are operator-supplied command lines, so they get `sh -c` word
/// semantics rather than whitespace splitting.
pub fn run_hook(label: &str, command: &str, dry_run: bool) -> Result<()> {
    if dry_run {
        info!("[dry-run] would run {} hook: {}", label, command);
        return Ok(());
    }
    debug!("running {} hook: {}", label, command);
    let status = Command::new("sh")
        .arg("-c")
        .arg(command)
        .status()
        .map_err(|e| SnapbackError::Hook(format!("{} hook failed to start: {}", label, e)))?;
    if status.success() {
        Ok(())
    } else {
        Err(SnapbackError::Hook(format!(
            "{} hook exited with {}",
            label, status
        )))
    }
}
