// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod orchestrator;
pub mod reload;
pub mod tasks;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::{ConfigFile, RunnerSpec};
use crate::engine::{RuntimeEvent, RuntimeOptions};
use crate::fs::RealFileSystem;
use crate::orchestrator::Orchestrator;
use crate::reload::{LogReload, ReloadNotifier};
use crate::tasks::build_registry;
use crate::watch::NotifyWatchService;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - task registry (commands and built-in runners)
/// - orchestrator (router, coordinator runtime, notifier)
/// - file watcher (disabled in --once mode)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let root_dir = config_root_dir(&config_path);
    let registry = Arc::new(build_registry(&cfg, &root_dir, Arc::new(RealFileSystem))?);

    info!(server = %cfg.server_mode, "serving");

    let notifier = ReloadNotifier::new(Arc::new(LogReload), cfg.reload_policy.clone());
    let options = RuntimeOptions {
        exit_when_idle: args.once,
    };

    let orchestrator = Orchestrator::new(
        registry,
        &cfg.view_patterns,
        NotifyWatchService::new(&root_dir),
        notifier,
    )?
    .with_options(options);
    let handle = orchestrator.start()?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = handle.shutdown_sender();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let summary = handle.wait().await?;

    if args.once && !summary.initial_failures.is_empty() {
        let failed: Vec<String> = summary
            .initial_failures
            .iter()
            .map(ToString::to_string)
            .collect();
        bail!("initial build failed for: {}", failed.join(", "));
    }

    Ok(())
}

/// Figure out a sensible project root for watching.
///
/// - If the config path has a non-empty parent (e.g. "site/Assetwatch.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Assetwatch.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Simple dry-run output: print server mode, tasks and their patterns.
fn print_dry_run(cfg: &ConfigFile) {
    println!("assetwatch dry-run");
    println!("  server = {}", cfg.server_mode);
    println!();

    println!("tasks ({}):", cfg.tasks.len());
    for task in &cfg.tasks {
        println!("  - {}", task.id);
        match &task.runner {
            RunnerSpec::Command(cmd) => println!("      cmd: {cmd}"),
            RunnerSpec::Concat(entries) => {
                for entry in entries {
                    println!("      concat: {:?} -> {}", entry.includes, entry.outfile);
                }
            }
            RunnerSpec::Sprite { src_dir, outfile } => {
                println!("      sprite: {} -> {}", src_dir.display(), outfile.display());
            }
        }
        println!("      watch: {:?}", task.watch);
        println!("      reload: {:?}", cfg.reload_policy.kind_for(task.id));
    }

    if !cfg.view_patterns.is_empty() {
        println!();
        println!("views: {:?}", cfg.view_patterns);
    }

    debug!("dry-run complete (no execution)");
}
