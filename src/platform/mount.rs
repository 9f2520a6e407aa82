/// System mounter
///
/// Read-only bind mounts (nullfs on FreeBSD) and forced unmounts via the
/// system `mount`/`umount` tools.
use crate::config::types::{Result, SnapbackError};
use crate::platform::Mounter;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Mounter speaking to the system `mount` and `umount` binaries
pub struct SystemMounter;

impl SystemMounter {
    pub fn new() -> Self {
        Self
    }

    fn run(program: &str, args: &[&str]) -> std::result::Result<(), String> {
        debug!("exec: {} {}", program, args.join(" "));
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| format!("failed to execute {}: {}", program, e))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ))
        }
    }

    /// Whether the path is currently a mountpoint.
    ///
    /// On Linux this consults /proc/mounts; elsewhere the answer is assumed
    /// yes and the unmount attempt itself decides.
    fn is_mounted(path: &Path) -> bool {
        #[cfg(target_os = "linux")]
        {
            let mounts = match std::fs::read_to_string("/proc/mounts") {
                Ok(m) => m,
                Err(_) => return true,
            };
            let needle = path.to_string_lossy();
            mounts.lines().any(|line| {
                let mut fields = line.split_whitespace();
                let _device = fields.next();
                matches!(fields.next(), Some(target) if target == needle)
            })
        }
        #[cfg(not(target_os = "linux"))]
        {
            let _ = path;
            true
        }
    }
}

impl Default for SystemMounter {
    fn default() -> Self {
        Self::new()
    }
}

impl Mounter for SystemMounter {
    fn mount_readonly(&self, source: &Path, dest: &Path) -> Result<()> {
        let source = source.to_string_lossy();
        let dest = dest.to_string_lossy();

        #[cfg(target_os = "freebsd")]
        let args = ["-t", "nullfs", "-o", "ro", source.as_ref(), dest.as_ref()];
        #[cfg(not(target_os = "freebsd"))]
        let args = ["-o", "ro,bind", source.as_ref(), dest.as_ref()];

        Self::run("mount", &args).map_err(SnapbackError::Mount)
    }

    fn force_unmount_all(&self, dests: &[PathBuf]) -> Result<()> {
        let mut failures = Vec::new();
        // Children were ledgered after parents, so walk in reverse to give
        // nested mountpoints a chance to unwind first.
        for dest in dests.iter().rev() {
            if !Self::is_mounted(dest) {
                debug!("not mounted, skipping: {}", dest.display());
                continue;
            }
            if let Err(e) = Self::run("umount", &["-f", dest.to_string_lossy().as_ref()]) {
                warn!("forced unmount of {} failed: {}", dest.display(), e);
                failures.push(dest.display().to_string());
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(SnapbackError::Mount(format!(
                "still mounted after forced unmount: {}",
                failures.join(", ")
            )))
        }
    }
}
