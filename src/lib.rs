// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod monitor;
pub mod pipeline;
pub mod types;
pub mod watcher;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::{config_root_dir, load_and_validate};
use crate::config::model::ConfigFile;
use crate::pipeline::{Pipeline, PipelineOptions};

pub use crate::pipeline::{Dispatcher, DispatchEnd, DispatchReport};
pub use crate::types::{DetectionMode, FileEvent, FileEventKind, PipelineState};
pub use crate::watcher::{Propagation, WatchFailure, WatchResult, Watcher};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the command watchers built from `[[watcher]]`
/// - the pipeline (monitor + dispatcher)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_and_validate(&config_path)?;

    if let Some(base_dir) = &args.base_dir {
        cfg.override_base_dir(base_dir);
    }
    if let Some(interval_ms) = args.interval_ms {
        cfg.override_interval_ms(interval_ms);
    }

    let options = cfg.pipeline_options(&config_root_dir(&config_path));

    if args.dry_run {
        print_dry_run(&cfg, &options);
        return Ok(());
    }

    let watchers = cfg.build_watchers(&options)?;
    if watchers.is_empty() {
        warn!(config = %config_path.display(), "no [[watcher]] entries; changes will only be logged");
    }

    let pipeline = Arc::new(Pipeline::with_watchers(options, watchers));
    pipeline.watch()?;

    // Ctrl-C → graceful shutdown.
    tokio::signal::ctrl_c().await?;
    info!("received Ctrl-C, shutting down");

    // Stopping joins the worker thread, which may be inside a watcher command.
    let handle = Arc::clone(&pipeline);
    tokio::task::spawn_blocking(move || handle.shutdown()).await?;

    Ok(())
}

/// Simple dry-run output: print the effective pipeline and the watcher chain.
fn print_dry_run(cfg: &ConfigFile, options: &PipelineOptions) {
    println!("watchpipe dry-run");
    println!("  pipeline.base_dir = {}", options.base_dir.display());
    println!("  pipeline.watched_root = {}", options.watched_root().display());
    println!(
        "  pipeline.interval_ms = {}",
        options.monitor.interval.as_millis()
    );
    println!("  pipeline.detection = {}", options.monitor.detection);
    println!();

    println!("watchers ({}), in dispatch order:", cfg.watchers().len());
    for (position, watcher) in cfg.watchers().iter().enumerate() {
        println!("  {}. {}", position + 1, watcher.name);
        println!("      cmd: {}", watcher.cmd);
        if !watcher.watch.is_empty() {
            println!("      watch: {:?}", watcher.watch);
        }
        if !watcher.exclude.is_empty() {
            println!("      exclude: {:?}", watcher.exclude);
        }
        let events: Vec<&str> = watcher.events.iter().map(|k| k.as_str()).collect();
        println!("      events: {}", events.join(", "));
        if !watcher.propagate {
            println!("      propagate: false");
        }
    }

    debug!("dry-run complete (nothing watched)");
}
