// src/watcher/mod.rs

//! Watcher contract and the ordered registry that dispatch walks.
//!
//! This module is responsible for:
//! - The [`Watcher`] capability trait and its tagged [`WatchResult`].
//! - The copy-on-write [`WatcherRegistry`].
//! - Built-in watchers: glob gating ([`PatternWatcher`]) and shell commands
//!   ([`CommandWatcher`]).
//!
//! It does **not** know about polling or the pipeline lifecycle.

pub mod command;
pub mod contract;
pub mod patterns;
pub mod registry;

pub use command::CommandWatcher;
pub use contract::{Propagation, WatchFailure, WatchResult, Watcher};
pub use patterns::{relative_str, resolve_root, PathFilter, PatternWatcher};
pub use registry::{RegistrySnapshot, WatcherEntry, WatcherRegistry};
