//! Change observation: the snapshot file on disk, and the element scopes the
//! engine subscribes to inside the loaded document.

mod container;
mod hub;

pub use container::{ContainerWatcher, RootChange};
pub use hub::{MutationHub, ScopeKind};

use anyhow::{Context, Result};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebouncedEvent, DebouncedEventKind};
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

/// Events emitted by the snapshot watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// The snapshot file was written or replaced.
    SnapshotChanged,
    /// The OS watcher reported an error; live updates may have stopped.
    Failed(String),
}

/// Debounced watcher for one snapshot file.
///
/// Watches the parent directory rather than the file itself, since capture
/// tools usually replace the file with a rename and the old inode goes
/// away.
pub struct FileWatcher {
    _watcher: notify_debouncer_mini::Debouncer<RecommendedWatcher>,
}

impl FileWatcher {
    pub fn new(snapshot: &Path, debounce_ms: u64, tx: mpsc::Sender<WatchEvent>) -> Result<Self> {
        let target = snapshot
            .canonicalize()
            .with_context(|| format!("cannot resolve {}", snapshot.display()))?;
        let dir = target
            .parent()
            .map(Path::to_path_buf)
            .context("snapshot has no parent directory")?;

        let file = target.clone();
        let mut debouncer = new_debouncer(
            Duration::from_millis(debounce_ms),
            move |result: std::result::Result<Vec<DebouncedEvent>, notify::Error>| {
                let event = match result {
                    Ok(events) if touches(&events, &file) => WatchEvent::SnapshotChanged,
                    Ok(_) => return,
                    Err(err) => WatchEvent::Failed(err.to_string()),
                };
                if tx.send(event).is_err() {
                    tracing::debug!("watch receiver dropped");
                }
            },
        )?;

        debouncer.watcher().watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %target.display(), "watching snapshot");

        Ok(FileWatcher {
            _watcher: debouncer,
        })
    }
}

fn touches(events: &[DebouncedEvent], file: &Path) -> bool {
    events
        .iter()
        .filter(|e| e.kind == DebouncedEventKind::Any || e.kind == DebouncedEventKind::AnyContinuous)
        .any(|e| e.path == file || e.path.canonicalize().is_ok_and(|p| p == file))
}
