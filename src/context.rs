/// Per-invocation run identity
///
/// The context is built once at startup and passed by reference to every
/// component; nothing about a run is ambient or global.
use crate::config::types::RunConfig;
use std::path::PathBuf;

/// Identity and paths for one orchestrator execution
#[derive(Clone, Debug)]
pub struct RunContext {
    /// Unique per-run tag embedded in every snapshot name
    pub namespace: String,
    /// Log intended actions only, touch nothing
    pub dry_run: bool,
    /// Root of the mirrored working tree handed to the backup tool
    pub tree_root: PathBuf,
    /// Durable record of successfully mounted destinations
    pub ledger_path: PathBuf,
    /// Leave the working tree in place during cleanup
    pub preserve_tree: bool,
}

impl RunContext {
    /// Derive the context from a validated config.
    ///
    /// The namespace combines program identity, process id, and a wall-clock
    /// timestamp, so two runs on the same host can never collide and
    /// namespace-scoped snapshot destruction can never target another run.
    pub fn from_config(config: &RunConfig) -> Self {
        let namespace = format!(
            "snapback-{}-{}",
            std::process::id(),
            chrono::Local::now().format("%Y%m%d%H%M%S")
        );
        let work_dir = config
            .work_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("snapback"));
        Self {
            tree_root: work_dir.join("tree"),
            ledger_path: work_dir.join(format!("mounts.{}", namespace)),
            namespace,
            dry_run: config.dry_run,
            preserve_tree: config.keep_tree,
        }
    }

    /// Prefix for every action line in the log narrative
    pub fn log_prefix(&self) -> &'static str {
        if self.dry_run {
            "[dry-run] "
        } else {
            ""
        }
    }

    /// Snapshot identifier for a volume under this run's namespace
    pub fn snapshot_name(&self, volume: &str) -> String {
        format!("{}@{}", volume, self.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_carries_pid() {
        let ctx = RunContext::from_config(&RunConfig::default());
        assert!(ctx
            .namespace
            .starts_with(&format!("snapback-{}-", std::process::id())));
    }

    #[test]
    fn test_ledger_path_is_namespaced() {
        let ctx = RunContext::from_config(&RunConfig::default());
        let file = ctx.ledger_path.file_name().unwrap().to_string_lossy();
        assert!(file.contains(&ctx.namespace));
    }

    #[test]
    fn test_snapshot_name_joins_with_at() {
        let ctx = RunContext::from_config(&RunConfig::default());
        let name = ctx.snapshot_name("tank/home");
        assert_eq!(name, format!("tank/home@{}", ctx.namespace));
    }

    #[test]
    fn test_dry_run_prefix() {
        let mut config = RunConfig::default();
        config.dry_run = true;
        let ctx = RunContext::from_config(&config);
        assert_eq!(ctx.log_prefix(), "[dry-run] ");
    }
}
