use crate::config::CnavConfig;
use crate::dom::Viewport;
use crate::engine::Engine;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;

// ── Enums ──

/// Whether keys drive navigation or edit the search term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

/// Which way a page scroll goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDirection {
    Up,
    Down,
}

// ── App ──

pub struct App {
    pub engine: Engine,

    /// Whether we're navigating or typing in the search line
    pub input_mode: InputMode,

    /// Should the app quit?
    pub should_quit: bool,

    /// Whether the snapshot is being watched for changes
    pub watching: bool,

    /// Last notification message
    pub watch_message: Option<String>,

    /// Ticks since last notification (for auto-clearing)
    pub watch_message_ticks: u8,

    /// Application configuration (loaded from .cnav.toml)
    pub config: CnavConfig,

    /// The snapshot file being displayed
    pub snapshot: PathBuf,
}

pub fn read_snapshot(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read snapshot {}", path.display()))
}

impl App {
    pub fn new(engine: Engine, config: CnavConfig, snapshot: PathBuf) -> Self {
        Self {
            engine,
            input_mode: InputMode::Normal,
            should_quit: false,
            watching: false,
            watch_message: None,
            watch_message_ticks: 0,
            config,
            snapshot,
        }
    }

    /// Re-read the snapshot after a change on disk. A failed read keeps the
    /// current document.
    pub fn reload_snapshot(&mut self, now: Instant) {
        match read_snapshot(&self.snapshot) {
            Ok(source) => self.engine.reload(&source, now),
            Err(err) => {
                tracing::warn!("{err:#}");
                self.notify("Snapshot unreadable; showing last version");
            }
        }
    }

    // ── Search ──

    pub fn start_search(&mut self) {
        self.input_mode = InputMode::Search;
        self.engine.toggle(Some(true));
    }

    pub fn search_push(&mut self, c: char, now: Instant) {
        let mut term = self.engine.search().to_string();
        term.push(c);
        self.engine.set_search(&term, now);
    }

    pub fn search_pop(&mut self, now: Instant) {
        let mut term = self.engine.search().to_string();
        term.pop();
        self.engine.set_search(&term, now);
    }

    /// Esc in the search line: drop the term and go back to navigation.
    pub fn search_clear(&mut self, now: Instant) {
        self.engine.set_search("", now);
        self.input_mode = InputMode::Normal;
    }

    /// Enter in the search line: keep the term, go back to navigation.
    pub fn search_commit(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    // ── Reader ──

    /// User scroll by whole lines (negative = up).
    pub fn scroll_lines(&mut self, lines: i32, now: Instant) {
        let line_height = self.engine.document().viewport().line_height;
        self.engine.scroll_by(f64::from(lines) * line_height, now);
    }

    pub fn scroll_step(&mut self, down: bool, now: Instant) {
        let step = i32::from(self.config.layout.scroll_step);
        self.scroll_lines(if down { step } else { -step }, now);
    }

    pub fn page(&mut self, direction: PageDirection, now: Instant) {
        let rows = i32::from(self.engine.document().viewport().rows.saturating_sub(1).max(1));
        match direction {
            PageDirection::Up => self.scroll_lines(-rows, now),
            PageDirection::Down => self.scroll_lines(rows, now),
        }
    }

    /// Keep the document laid out for the reader pane's current size.
    pub fn resize_reader(&mut self, columns: u16, rows: u16, now: Instant) {
        let viewport = Viewport {
            columns: columns.max(1),
            rows: rows.max(1),
            line_height: self.config.layout.line_height,
        };
        self.engine.set_viewport(viewport, now);
    }

    // ── Clipboard ──

    pub fn copy_focused(&mut self, now: Instant) {
        let Some((id, text)) = self.engine.focused_text() else {
            return;
        };
        let copied = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text));
        match copied {
            Ok(()) => self.engine.mark_copied(&id, now),
            Err(err) => tracing::debug!(%err, "clipboard unavailable"),
        }
    }

    // ── Notifications ──

    pub fn notify(&mut self, msg: &str) {
        self.watch_message = Some(msg.to_string());
        self.watch_message_ticks = 0;
    }

    /// Called on every event loop iteration to auto-clear notifications
    pub fn tick(&mut self) {
        if self.watch_message.is_some() {
            self.watch_message_ticks += 1;
            if self.watch_message_ticks > 20 {
                self.watch_message = None;
                self.watch_message_ticks = 0;
            }
        }
    }
}
