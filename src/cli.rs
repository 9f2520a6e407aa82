use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;

use crate::backup::CommandBackupTool;
use crate::config::types::{RunConfig, SnapbackError};
use crate::context::RunContext;
use crate::platform::{SystemMounter, ZfsVolumeStore};
use crate::run::{exit_codes, Orchestrator};
use crate::safety::interrupt;

#[derive(Parser)]
#[command(author, version, about = "Crash-consistent multi-volume snapshot backup")]
struct Cli {
    /// Volumes to back up
    #[arg(value_name = "VOLUME")]
    volumes: Vec<String>,

    /// Back up every volume known to the volume store
    #[arg(short = 'a', long)]
    all: bool,

    /// Expand the named volumes to their descendants
    #[arg(short = 'r', long)]
    recursive: bool,

    /// Log intended actions without touching snapshot or mount state
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Leave the working tree in place after the run
    #[arg(short = 'k', long)]
    keep_tree: bool,

    /// External backup command given the assembled tree root
    #[arg(short = 'b', long, value_name = "CMD")]
    backup_cmd: String,

    /// Option string passed to the backup command before the root
    #[arg(short = 'o', long, value_name = "OPTS")]
    backup_opts: Option<String>,

    /// Shell command run before any snapshot state is created
    #[arg(long, value_name = "CMD")]
    pre_hook: Option<String>,

    /// Shell command run after cleanup
    #[arg(long, value_name = "CMD")]
    post_hook: Option<String>,

    /// State directory holding the working tree and mount ledger
    #[arg(short = 'w', long, value_name = "DIR")]
    work_dir: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        RunConfig {
            volumes: self.volumes,
            all_volumes: self.all,
            recursive: self.recursive,
            dry_run: self.dry_run,
            keep_tree: self.keep_tree,
            backup_cmd: self.backup_cmd,
            backup_opts: self.backup_opts,
            pre_hook: self.pre_hook,
            post_hook: self.post_hook,
            work_dir: self.work_dir,
        }
    }
}

pub fn run() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Cli::parse().into_config();
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(exit_codes::USAGE);
    }

    let ctx = RunContext::from_config(&config);
    info!("run namespace: {}", ctx.namespace);
    if ctx.dry_run {
        info!("dry-run: no snapshot, mount, or backup state will be touched");
    }

    interrupt::arm()?;

    let store = ZfsVolumeStore::new();
    let mounter = SystemMounter::new();
    let backup = CommandBackupTool::new(config.backup_cmd.clone());
    let orchestrator = Orchestrator::new(&store, &mounter, &backup, &config, &ctx);

    match orchestrator.execute() {
        Ok(report) => {
            report.log_summary();
            let code = report.exit_code();
            if code != exit_codes::SUCCESS {
                std::process::exit(code);
            }
            Ok(())
        }
        // Argument-shaped failures: nothing was created, distinguishable
        // exit status.
        Err(e @ (SnapbackError::Usage(_) | SnapbackError::VolumeQuery(_))) => {
            eprintln!("Error: {}", e);
            std::process::exit(exit_codes::USAGE);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(exit_codes::DEGRADED);
        }
    }
}
