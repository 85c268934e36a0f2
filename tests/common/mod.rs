#![allow(dead_code)]

use std::path::PathBuf;

pub use watchpipe_test_utils::builders;
pub use watchpipe_test_utils::recording;
pub use watchpipe_test_utils::{init_tracing, wait_until};

/// Directory holding the sample configs shipped with the crate.
pub fn demos_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos")
}
