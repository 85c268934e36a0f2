// src/monitor/mod.rs

//! Polling file-system monitor.
//!
//! A monitor owns one background worker that snapshots a directory subtree
//! every poll interval and turns the difference between two snapshots into
//! [`FileEvent`](crate::types::FileEvent)s:
//! - path only in the new snapshot: `Create`
//! - path in both with a changed signature: `Update`
//! - path only in the old snapshot: `Delete`
//!
//! The monitor knows nothing about watchers; it hands every event to a
//! callback supplied at start.

pub mod hash;
pub mod poller;
pub mod snapshot;

pub use hash::compute_file_hash;
pub use poller::{FileSystemMonitor, MonitorOptions, DEFAULT_POLL_INTERVAL, WORKER_NAME};
pub use snapshot::{FileSignature, Snapshot};
