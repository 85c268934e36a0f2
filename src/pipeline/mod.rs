// src/pipeline/mod.rs

//! Watch-and-dispatch pipeline.
//!
//! Ties the monitor's worker to the pipeline lifetime
//! (Idle → Watching → Stopped) and routes each detected change through the
//! registered watcher chain via the [`Dispatcher`].

pub mod dispatcher;
pub mod lifecycle;

pub use dispatcher::{DispatchEnd, DispatchReport, Dispatcher};
pub use lifecycle::{Pipeline, PipelineOptions, DEFAULT_WATCH_DIR};
