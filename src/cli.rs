// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `watchpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchpipe",
    version,
    about = "Poll a source tree and run a chain of watchers on every file change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Watchpipe.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Watchpipe.toml")]
    pub config: String,

    /// Project directory; overrides `[pipeline].base_dir`.
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Poll interval in milliseconds; overrides `[pipeline].interval_ms`.
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the watcher chain, but don't start watching.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
