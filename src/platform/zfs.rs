/// ZFS-backed volume store
///
/// Shells out to the system `zfs` tool. Every call is blocking and
/// synchronous; stderr is folded into the returned error so per-volume
/// failures carry the tool's own diagnostic.
use crate::config::types::{Result, SnapbackError, Volume, VolumeSelection};
use crate::platform::VolumeStore;
use log::debug;
use std::path::PathBuf;
use std::process::Command;

/// Volume store speaking to `zfs list`/`snapshot`/`destroy`
pub struct ZfsVolumeStore {
    zfs_path: String,
}

impl ZfsVolumeStore {
    pub fn new() -> Self {
        Self {
            zfs_path: "zfs".to_string(),
        }
    }

    /// Use a specific `zfs` binary instead of resolving via PATH
    pub fn with_binary(zfs_path: impl Into<String>) -> Self {
        Self {
            zfs_path: zfs_path.into(),
        }
    }

    fn run_zfs(&self, args: &[&str]) -> std::result::Result<String, String> {
        debug!("exec: {} {}", self.zfs_path, args.join(" "));
        let output = Command::new(&self.zfs_path)
            .args(args)
            .output()
            .map_err(|e| format!("failed to execute {}: {}", self.zfs_path, e))?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(format!(
                "{} {} exited with {}: {}",
                self.zfs_path,
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ))
        }
    }
}

impl Default for ZfsVolumeStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one `zfs list -H -o name,mountpoint` output line.
///
/// The mountpoint values `none`, `legacy`, and `-` all mean the volume has
/// no usable mountpoint and map to `None`.
pub fn parse_volume_line(line: &str) -> Option<Volume> {
    let mut fields = line.splitn(2, '\t');
    let name = fields.next()?.trim();
    if name.is_empty() {
        return None;
    }
    let mountpoint = match fields.next().map(str::trim) {
        None | Some("") | Some("none") | Some("legacy") | Some("-") => None,
        Some(path) => Some(PathBuf::from(path)),
    };
    Some(Volume {
        name: name.to_string(),
        mountpoint,
    })
}

impl VolumeStore for ZfsVolumeStore {
    fn list_volumes(&self, selection: &VolumeSelection) -> Result<Vec<Volume>> {
        let mut args = vec!["list", "-H", "-o", "name,mountpoint"];
        let names: &[String] = match selection {
            VolumeSelection::All => &[],
            VolumeSelection::Explicit(names) => names,
            VolumeSelection::ExplicitRecursive(names) => {
                args.push("-r");
                names
            }
        };
        for name in names {
            args.push(name.as_str());
        }

        let stdout = self
            .run_zfs(&args)
            .map_err(SnapbackError::VolumeQuery)?;
        Ok(stdout.lines().filter_map(parse_volume_line).collect())
    }

    fn create_snapshot(&self, volume: &str, tag: &str) -> Result<()> {
        let snapshot = format!("{}@{}", volume, tag);
        self.run_zfs(&["snapshot", &snapshot])
            .map(|_| ())
            .map_err(SnapbackError::Snapshot)
    }

    fn list_snapshots(&self) -> Result<Vec<String>> {
        let stdout = self
            .run_zfs(&["list", "-H", "-t", "snapshot", "-o", "name"])
            .map_err(SnapbackError::Snapshot)?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn destroy_snapshot(&self, identifier: &str) -> Result<()> {
        self.run_zfs(&["destroy", identifier])
            .map(|_| ())
            .map_err(SnapbackError::Snapshot)
    }
}
