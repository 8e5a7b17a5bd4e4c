mod app;
mod config;
mod dom;
mod engine;
mod logging;
mod nav;
mod provider;
mod sched;
mod scroll;
mod turn;
mod ui;
mod watch;

use anyhow::Result;
use app::{App, InputMode, PageDirection};
use clap::{Parser, ValueEnum};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dom::{Document, Viewport};
use engine::Engine;
use nav::{Direction, ViewLevel};
use provider::{Environment, Provider};
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use watch::{FileWatcher, WatchEvent};

/// Poll timeout while a timer is about to fire.
const FRAME: Duration = Duration::from_millis(16);
/// Poll timeout when nothing is scheduled.
const IDLE: Duration = Duration::from_millis(100);
/// Coalescing window for file system events.
const WATCH_DEBOUNCE_MS: u64 = 100;

/// Outline navigator for saved chat conversation pages
#[derive(Parser)]
#[command(name = "cnav", version, about)]
struct Cli {
    /// HTML snapshot of the conversation page
    snapshot: PathBuf,

    /// URL the page was captured from (overrides the snapshot's "saved from" marker)
    #[arg(long)]
    url: Option<String>,

    /// Initial view level
    #[arg(long, value_enum)]
    view: Option<ViewArg>,

    /// Do not reload when the snapshot changes on disk
    #[arg(long)]
    no_watch: bool,

    /// Log file (default: <cache dir>/cnav/cnav.log); filter with CNAV_LOG
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the navigation index as JSON and exit
    #[arg(long)]
    dump: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ViewArg {
    Prompts,
    All,
    Stars,
}

impl From<ViewArg> for ViewLevel {
    fn from(arg: ViewArg) -> Self {
        match arg {
            ViewArg::Prompts => ViewLevel::PromptsOnly,
            ViewArg::All => ViewLevel::All,
            ViewArg::Stars => ViewLevel::StarredOnly,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_file.as_deref());

    let config = config::load_config(&cli.snapshot);
    let source = app::read_snapshot(&cli.snapshot)?;
    let viewport = Viewport {
        line_height: config.layout.line_height,
        ..Viewport::default()
    };
    let doc = Document::parse(&source, viewport);

    let env = resolve_environment(cli.url.as_deref(), &doc)?;
    let Some(provider) = Provider::select(&env) else {
        // Unknown site: nothing to navigate.
        eprintln!("cnav: no provider for {}//{}", env.protocol, env.hostname);
        return Ok(());
    };
    tracing::info!(provider = provider.name(), host = %env.hostname, "provider selected");

    let view = cli.view.map(ViewLevel::from).unwrap_or(config.panel.view);
    let mut engine = Engine::new(provider, doc, config.timing.timing(), view);
    engine.start(Instant::now());

    if cli.dump {
        let dump = serde_json::json!({
            "provider": engine.provider().name(),
            "index": engine.index(),
        });
        println!("{}", serde_json::to_string_pretty(&dump)?);
        return Ok(());
    }

    if config.panel.open_on_start {
        engine.toggle(Some(true));
    }
    let mut app = App::new(engine, config, cli.snapshot.clone());

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let result = run_app(&mut terminal, &mut app, !cli.no_watch);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

/// `--url`, else the snapshot's "saved from" marker, else a local file.
fn resolve_environment(url: Option<&str>, doc: &Document) -> Result<Environment> {
    if let Some(url) = url {
        return Environment::from_url(url);
    }
    if let Some(saved) = doc.saved_from_url() {
        match Environment::from_url(&saved) {
            Ok(env) => return Ok(env),
            Err(err) => tracing::warn!("{err:#}"),
        }
    }
    Ok(Environment::local_file())
}

fn poll_timeout(deadline: Option<Instant>, now: Instant) -> Duration {
    match deadline {
        Some(deadline) => deadline.saturating_duration_since(now).clamp(FRAME, IDLE),
        None => IDLE,
    }
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, watch: bool) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    // Channel for file watch events
    let (watch_tx, watch_rx) = mpsc::channel::<WatchEvent>();

    let _watcher: Option<FileWatcher> = if watch {
        match FileWatcher::new(&app.snapshot, WATCH_DEBOUNCE_MS, watch_tx) {
            Ok(w) => {
                app.watching = true;
                Some(w)
            }
            Err(err) => {
                tracing::warn!("{err:#}");
                app.notify("Watch unavailable");
                None
            }
        }
    } else {
        None
    };

    loop {
        let now = Instant::now();
        let size = terminal.size()?;
        let (columns, rows) = ui::reader_size(Rect::new(0, 0, size.width, size.height), app);
        app.resize_reader(columns, rows, now);
        app.engine.tick(now);

        // Draw
        terminal.draw(|f| ui::draw(f, app))?;

        let timeout = poll_timeout(app.engine.next_deadline(), Instant::now());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match app.input_mode {
                        InputMode::Search => handle_search_input(app, key),
                        InputMode::Normal => handle_normal_input(app, key),
                    }
                }
            }
        }

        // Drain file watch events (non-blocking)
        while let Ok(event) = watch_rx.try_recv() {
            match event {
                WatchEvent::SnapshotChanged => app.reload_snapshot(Instant::now()),
                WatchEvent::Failed(err) => {
                    tracing::warn!(%err, "watcher error");
                    app.notify("Watch error: live updates may stop");
                }
            }
        }

        // Auto-clear notifications
        app.tick();

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_normal_input(app: &mut App, key: KeyEvent) {
    let now = Instant::now();
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let open = app.engine.is_open();

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Panel toggle
        KeyCode::Char('.') | KeyCode::Char(';') if ctrl => app.engine.toggle(None),
        KeyCode::Tab => app.engine.toggle(None),
        KeyCode::Esc if open => app.engine.toggle(Some(false)),

        // Reader scrolling
        KeyCode::Char('d') if ctrl => app.page(PageDirection::Down, now),
        KeyCode::Char('u') if ctrl => app.page(PageDirection::Up, now),
        KeyCode::PageDown => app.page(PageDirection::Down, now),
        KeyCode::PageUp => app.page(PageDirection::Up, now),
        KeyCode::Char('g') | KeyCode::Home => app.engine.jump_top(now),
        KeyCode::Char('G') | KeyCode::End => app.engine.jump_bottom(now),

        // Outline navigation (panel open); plain scrolling otherwise
        KeyCode::Down | KeyCode::Char('j') if open => app.engine.move_focus(Direction::Forward),
        KeyCode::Up | KeyCode::Char('k') if open => app.engine.move_focus(Direction::Backward),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_step(true, now),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_step(false, now),
        KeyCode::Enter if open => app.engine.activate_focused(now),
        KeyCode::Left if open => {
            let view = app.engine.view().previous();
            app.engine.set_view_level(view, now);
        }
        KeyCode::Right if open => {
            let view = app.engine.view().next();
            app.engine.set_view_level(view, now);
        }

        // Search, stars, copy
        KeyCode::Char('/') => app.start_search(),
        KeyCode::Char('s') if open => {
            if let Some(starred) = app.engine.toggle_star_focused(now) {
                app.notify(if starred { "Starred" } else { "Unstarred" });
            }
        }
        KeyCode::Char('y') if open => app.copy_focused(now),

        _ => {}
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    let now = Instant::now();
    match key.code {
        KeyCode::Char('q') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }
        KeyCode::Esc => app.search_clear(now),
        KeyCode::Enter => app.search_commit(),
        KeyCode::Backspace => app.search_pop(now),
        KeyCode::Down => app.engine.move_focus(Direction::Forward),
        KeyCode::Up => app.engine.move_focus(Direction::Backward),
        KeyCode::Char(c) => app.search_push(c, now),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_timeout_tracks_next_timer() {
        let now = Instant::now();
        assert_eq!(poll_timeout(None, now), IDLE);
        assert_eq!(poll_timeout(Some(now), now), FRAME);
        assert_eq!(poll_timeout(Some(now + Duration::from_millis(50)), now), Duration::from_millis(50));
        assert_eq!(poll_timeout(Some(now + Duration::from_secs(5)), now), IDLE);
    }

    #[test]
    fn environment_prefers_explicit_url() {
        let doc = Document::parse(
            "<!-- saved from url=(0026)https://chatgpt.com/c/abc --><html><body></body></html>",
            Viewport::default(),
        );
        let env = resolve_environment(Some("https://claude.ai/chat/1"), &doc).unwrap();
        assert_eq!(env.hostname, "claude.ai");
        let env = resolve_environment(None, &doc).unwrap();
        assert_eq!(env.hostname, "chatgpt.com");
        let bare = Document::parse("<p>x</p>", Viewport::default());
        assert_eq!(resolve_environment(None, &bare).unwrap().protocol, "file:");
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::parse_from(["cnav", "page.html", "--view", "stars", "--no-watch", "--dump"]);
        assert_eq!(cli.snapshot, PathBuf::from("page.html"));
        assert!(matches!(cli.view, Some(ViewArg::Stars)));
        assert!(cli.no_watch && cli.dump);
        assert!(cli.url.is_none());
    }
}
