//! External collaborator boundary
//!
//! The orchestrator never talks to the volume manager or the mount table
//! directly; it goes through these contracts. Production implementations
//! shell out to the system tools ([`zfs`], [`mount`]), tests substitute
//! in-memory fakes.

use crate::config::types::{Result, Volume, VolumeSelection};
use std::path::{Path, PathBuf};

pub mod mount;
pub mod zfs;

pub use mount::SystemMounter;
pub use zfs::ZfsVolumeStore;

/// Volume enumeration and snapshot lifecycle operations
pub trait VolumeStore {
    /// Enumerate candidate volumes; fails the whole run if the selection
    /// names a volume the store does not know.
    fn list_volumes(&self, selection: &VolumeSelection) -> Result<Vec<Volume>>;

    /// Create a point-in-time, read-only capture named `<volume>@<tag>`
    fn create_snapshot(&self, volume: &str, tag: &str) -> Result<()>;

    /// Every snapshot identifier known to the store, system-wide
    fn list_snapshots(&self) -> Result<Vec<String>>;

    /// Destroy one snapshot by identifier
    fn destroy_snapshot(&self, identifier: &str) -> Result<()>;
}

/// Read-only bind mounting and forced unmounting
pub trait Mounter {
    /// Bind the source directory read-only onto the destination
    fn mount_readonly(&self, source: &Path, dest: &Path) -> Result<()>;

    /// Forcibly unmount every given destination. Idempotent and safely
    /// retriable: destinations that are no longer mounted are not errors.
    fn force_unmount_all(&self, dests: &[PathBuf]) -> Result<()>;
}
