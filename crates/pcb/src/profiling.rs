//! `--profile` support: the updater's tracing spans (`update_netlist`,
//! `build_connectivity`, the repair and sweep phases) go to a Chrome trace.

use std::path::PathBuf;
use tracing_chrome::{ChromeLayerBuilder, FlushGuard};
use tracing_subscriber::prelude::*;

/// Flushes the trace when the update is done.
pub struct ProfileGuard {
    path: PathBuf,
    _flush: FlushGuard,
}

impl Drop for ProfileGuard {
    fn drop(&mut self) {
        log::info!("Writing update profile to {}", self.path.display());
    }
}

pub fn init(path: Option<PathBuf>) -> Option<ProfileGuard> {
    let path = path?;
    let (layer, flush) = ChromeLayerBuilder::new()
        .file(&path)
        .include_args(true)
        .build();

    if tracing_subscriber::registry().with(layer).try_init().is_err() {
        log::warn!("Tracing already initialized, {} stays empty", path.display());
    }
    Some(ProfileGuard {
        path,
        _flush: flush,
    })
}
