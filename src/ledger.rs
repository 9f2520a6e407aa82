/// Mount ledger
///
/// Durable record of every destination successfully mounted during a run.
/// Append-only during the mount phase, read once during cleanup, and the
/// sole source of truth for unmount targets: cleanup may run after the
/// mount phase was cut short, so in-memory state is never trusted for
/// teardown. One JSON object per line, so paths containing whitespace
/// survive the round-trip.
use crate::config::types::{Result, SnapbackError};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One successfully mounted destination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountRecord {
    pub dest: PathBuf,
}

/// Append-only ledger with a durable on-disk mirror
pub struct MountLedger {
    path: PathBuf,
    entries: Vec<PathBuf>,
}

impl MountLedger {
    /// Open a ledger for appending. The file itself is created lazily on
    /// the first append, so a run that mounts nothing (or a dry run) never
    /// creates it.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            entries: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Destinations appended so far, in mount order
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Record a mounted destination, durably.
    ///
    /// The record is flushed and synced before this returns so cleanup can
    /// reconstruct the mount set even if the process dies right after the
    /// mount call.
    pub fn append(&mut self, dest: &Path) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let record = MountRecord {
            dest: dest.to_path_buf(),
        };
        let line = serde_json::to_string(&record)
            .map_err(|e| SnapbackError::Ledger(format!("failed to encode record: {}", e)))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        file.sync_all()?;
        debug!("ledger: recorded {}", dest.display());
        self.entries.push(record.dest);
        Ok(())
    }

    /// Read the full ledger back from disk as an ordered sequence.
    ///
    /// A missing file means nothing was ever mounted and is not an error.
    pub fn load(path: &Path) -> Result<Vec<PathBuf>> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut dests = Vec::new();
        for line in raw.lines().filter(|l| !l.trim().is_empty()) {
            let record: MountRecord = serde_json::from_str(line).map_err(|e| {
                SnapbackError::Ledger(format!("corrupt ledger line {:?}: {}", line, e))
            })?;
            dests.push(record.dest);
        }
        Ok(dests)
    }

    /// Remove the on-disk ledger; absent is fine.
    pub fn remove(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
