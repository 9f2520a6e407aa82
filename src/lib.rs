//! snapback: crash-consistent multi-volume snapshot backup orchestration
//!
//! Snapshots a set of filesystem volumes at nearly the same instant,
//! assembles their read-only snapshot contents into a single mirrored
//! directory tree, hands that tree to an external backup tool, and
//! guarantees teardown under both normal completion and interruption.
//!
//! # Architecture
//!
//! ## Run identity ([`context`])
//! - [`context::RunContext`]: per-invocation namespace, tree root, ledger
//!   path; built once, threaded everywhere, never global
//!
//! ## Platform boundary ([`platform`])
//! - [`platform::VolumeStore`]: volume enumeration and snapshot lifecycle
//! - [`platform::Mounter`]: read-only bind mounts and forced unmounts
//! - [`platform::zfs`] / [`platform::mount`]: production implementations
//!   shelling out to the system tools
//!
//! ## Phases ([`volume`], [`snapshot`], [`assemble`], [`backup`])
//! - [`volume`]: target-set resolution, fail-fast validation
//! - [`snapshot`]: best-effort namespaced creation, idempotent
//!   namespace-scoped destruction
//! - [`assemble`]: mirrored mount tree with a per-volume outcome state
//!   machine
//! - [`backup`]: external backup command and run hooks
//!
//! ## Safety & Cleanup ([`safety`], [`ledger`])
//! - [`ledger`]: durable append-only record of mounted destinations, the
//!   sole source of truth for unmounting
//! - [`safety::cleanup`]: ledger-driven teardown with bounded forced
//!   unmount retries; unconditional and best-effort
//! - [`safety::interrupt`]: async-safe one-shot interruption flag observed
//!   at phase boundaries
//!
//! ## Orchestration ([`run`], [`cli`])
//! - [`run::Orchestrator`]: phase sequencing and the per-run report
//! - [`cli`]: argument surface and entry wiring
//!
//! # Design Principles
//!
//! 1. **The ledger is truth** - cleanup trusts only what was durably
//!    recorded, never in-memory state
//! 2. **Teardown is unconditional** - every cleanup step runs regardless of
//!    what failed before it
//! 3. **Per-volume independence** - one volume's failure never aborts the
//!    others; outcomes are tagged, not thrown
//! 4. **Namespaced state** - every snapshot carries the run's unique tag,
//!    so destruction can never touch another run

// Run identity
pub mod context;

// Platform boundary
pub mod platform;

// Phases
pub mod assemble;
pub mod backup;
pub mod snapshot;
pub mod volume;

// Safety & Cleanup
pub mod ledger;
pub mod safety;

// Orchestration
pub mod run;

// Configuration
pub mod config;

// CLI entrypoint wiring
pub mod cli;

// Re-export commonly used types for convenience
pub use config::types::{
    MountOutcome, Result, RunConfig, SnapbackError, Volume, VolumeSelection,
};
pub use context::RunContext;
pub use run::{Orchestrator, RunReport};
