//! File logging. The terminal belongs to the UI, so diagnostics go to a log
//! file filtered by `CNAV_LOG` (same syntax as `RUST_LOG`).

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

const FILTER_ENV: &str = "CNAV_LOG";
const DEFAULT_FILTER: &str = "warn";

pub fn default_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("cnav").join("cnav.log"))
}

/// Install the global subscriber. Returns the log path, or `None` when no log
/// file could be opened (logging stays off).
pub fn init(log_file: Option<&Path>) -> Option<PathBuf> {
    let path = log_file.map(Path::to_path_buf).or_else(default_log_path)?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).ok()?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;

    let filter = EnvFilter::try_from_env(FILTER_ENV)
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Some(path)
}
