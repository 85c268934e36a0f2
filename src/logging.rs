// src/logging.rs

//! Process-wide `tracing` subscriber for the `watchpipe` binary.
//!
//! The level is the `--log-level` flag when given, otherwise whatever
//! `WATCHPIPE_LOG` names, otherwise `info`. Output goes to stderr so that
//! watcher commands own stdout. Thread names are shown so monitor lines
//! carry the worker name.

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Environment variable consulted when no `--log-level` is given.
pub const LOG_ENV: &str = "WATCHPIPE_LOG";

/// Install the subscriber; fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = resolve_level(cli_level, std::env::var(LOG_ENV).ok().as_deref());

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(())
}

fn resolve_level(cli_level: Option<LogLevel>, env_value: Option<&str>) -> tracing::Level {
    cli_level
        .map(tracing::Level::from)
        .or_else(|| env_value.and_then(parse_level_str))
        .unwrap_or(tracing::Level::INFO)
}

impl From<LogLevel> for tracing::Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

// `tracing::Level` parses names case-insensitively; "warning" is accepted too.
fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim() {
        w if w.eq_ignore_ascii_case("warning") => Some(tracing::Level::WARN),
        other => other.parse().ok(),
    }
}
