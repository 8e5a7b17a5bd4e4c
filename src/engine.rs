//! The navigation engine: one object owning the document, the active provider
//! and every piece of navigation state. All mutation goes through its methods;
//! time only advances through [`Engine::tick`].

use std::time::{Duration, Instant};

use crate::dom::{Document, ElementHandle, LayoutLine, Viewport};
use crate::nav::{Direction, Filter, FocusNavigator, NavIndex, StarStore, ViewLevel};
use crate::provider::Provider;
use crate::sched::{Scheduler, TimerKey};
use crate::scroll::ScrollSync;
use crate::watch::{ContainerWatcher, MutationHub, RootChange, ScopeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub debounce: Duration,
    pub suppress: Duration,
    pub copy_feedback: Duration,
    pub progress_refresh: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            suppress: Duration::from_millis(800),
            copy_feedback: Duration::from_millis(1200),
            progress_refresh: Duration::from_millis(100),
        }
    }
}

pub struct Engine {
    provider: Provider,
    doc: Document,
    timing: Timing,
    scheduler: Scheduler,
    hub: MutationHub,
    container: ContainerWatcher,
    scroll: ScrollSync,
    index: NavIndex,
    view: ViewLevel,
    search: String,
    stars: StarStore,
    focus: FocusNavigator,
    active: Option<String>,
    copied: Option<String>,
    open: bool,
    started: bool,
}

impl Engine {
    pub fn new(provider: Provider, doc: Document, timing: Timing, view: ViewLevel) -> Self {
        Self {
            provider,
            doc,
            timing,
            scheduler: Scheduler::new(),
            hub: MutationHub::default(),
            container: ContainerWatcher::default(),
            scroll: ScrollSync::default(),
            index: NavIndex::default(),
            view,
            search: String::new(),
            stars: StarStore::default(),
            focus: FocusNavigator::default(),
            active: None,
            copied: None,
            open: false,
            started: false,
        }
    }

    /// Attach to the page. Retried every frame until the page has a body.
    pub fn start(&mut self, now: Instant) {
        if self.started {
            return;
        }
        let body = match self.doc.body() {
            Some(body) if self.doc.has_body() => body,
            _ => {
                self.scheduler.schedule_frame(TimerKey::InitRetry, now);
                return;
            }
        };
        self.hub.observe(&self.doc, ScopeKind::Page, body);
        self.started = true;
        tracing::info!(provider = self.provider.name(), "engine started");
        self.check_root(now);
    }

    // ── Change handling ──

    /// Swap in a new snapshot of the page.
    pub fn reload(&mut self, source: &str, now: Instant) {
        self.doc.replace(source);
        if !self.started {
            self.start(now);
            return;
        }
        self.scroll.rebase(&self.doc);
        let changed = self.hub.changed_after_reload(&self.doc);
        tracing::debug!(?changed, generation = self.doc.generation(), "document reloaded");

        if self.check_root(now) {
            return;
        }
        if changed.contains(&ScopeKind::Conversation) {
            self.scheduler
                .schedule(TimerKey::StructuralDebounce, now, self.timing.debounce);
        } else {
            // Same conversation: only the handles are stale.
            self.rebuild(now);
        }
        self.scheduler.schedule_frame(TimerKey::ScrollFrame, now);
    }

    /// Re-run the root locator. Returns true when the root moved and the
    /// index was rebuilt.
    fn check_root(&mut self, now: Instant) -> bool {
        match self.container.check(&self.doc, &self.provider) {
            RootChange::Replaced(root) => {
                self.hub.observe(&self.doc, ScopeKind::Conversation, root);
                self.scheduler.cancel(TimerKey::StructuralDebounce);
                self.attach_scroll(root, now);
                self.rebuild(now);
                true
            }
            RootChange::Rebased(_) | RootChange::Unchanged | RootChange::Missing => false,
        }
    }

    fn attach_scroll(&mut self, el: ElementHandle, now: Instant) {
        if !self.scroll.set_source(&self.doc, el) {
            return;
        }
        self.hub.observe(&self.doc, ScopeKind::Scroll, el);
        self.scheduler.schedule_frame(TimerKey::ScrollFrame, now);
    }

    /// Extract and index again, replacing the previous index wholesale.
    fn rebuild(&mut self, now: Instant) {
        let Some(root) = self.container.root() else {
            return;
        };
        let turns = self.provider.extract_turns(&self.doc, root);
        if let Some(source) = ScrollSync::source_for_turns(&self.doc, &turns) {
            self.attach_scroll(source, now);
        }

        let filter = Filter {
            view: self.view,
            search: &self.search,
            stars: &self.stars,
        };
        // Ids are positional; carry the active target over by identity.
        let active = self.active.as_deref().and_then(|id| self.index.key_of(id));
        self.index = NavIndex::build(&self.doc, turns, filter);
        self.focus.clamp(self.index.len());
        self.active = active
            .and_then(|key| self.index.find(&key))
            .map(str::to_string);
        self.scheduler.schedule_frame(TimerKey::ScrollFrame, now);
        if self.search.trim().is_empty() {
            self.scheduler
                .schedule(TimerKey::ProgressRefresh, now, self.timing.progress_refresh);
        }
        tracing::debug!(
            turns = self.index.turn_count(),
            targets = self.index.len(),
            starred = self.stars.len(),
            view = self.view.label(),
            "index rebuilt"
        );
    }

    /// A scroll event on `el`. Handled once per frame.
    pub fn on_scroll(&mut self, el: ElementHandle, now: Instant) {
        if self.hub.observes(&self.doc, ScopeKind::Scroll, el) {
            self.scheduler.schedule_frame(TimerKey::ScrollFrame, now);
        }
    }

    fn source_scrolled(&mut self, now: Instant) {
        let source = self.scroll.source(&self.doc);
        self.on_scroll(source, now);
    }

    fn sync_scroll(&mut self) {
        self.scroll.update_progress(&self.doc);
        let Some(root) = self.container.root() else {
            return;
        };
        if let Some(id) = self.scroll.resolve_active(&self.doc, root, self.index.targets()) {
            if self.active.as_deref() != Some(id) {
                tracing::trace!(id, "active target");
                self.active = Some(id.to_string());
            }
        }
    }

    /// Run every timer that is due.
    pub fn tick(&mut self, now: Instant) {
        for key in self.scheduler.take_due(now) {
            match key {
                TimerKey::StructuralDebounce => self.rebuild(now),
                TimerKey::ScrollFrame | TimerKey::ProgressRefresh => self.sync_scroll(),
                TimerKey::NavSuppression => self.scroll.release(),
                TimerKey::CopyFeedback => self.copied = None,
                TimerKey::InitRetry => self.start(now),
            }
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    // ── Panel and focus ──

    pub fn toggle(&mut self, force: Option<bool>) {
        let open = force.unwrap_or(!self.open);
        if open == self.open {
            return;
        }
        self.open = open;
        if open {
            let active = self.active_position();
            self.focus.open(self.index.len(), active);
        } else {
            self.focus.close();
        }
    }

    pub fn move_focus(&mut self, direction: Direction) {
        if !self.open {
            return;
        }
        let active = self.active_position();
        self.focus.step(direction, self.index.len(), active);
    }

    pub fn activate_focused(&mut self, now: Instant) {
        if let Some(id) = self.focused_id().map(str::to_string) {
            self.scroll_to_target(&id, now);
        }
    }

    /// Bring the target to the reading line, mark it active and hold the
    /// active target steady while the jump settles.
    pub fn scroll_to_target(&mut self, id: &str, now: Instant) {
        let Some(element) = self.index.target(id) else {
            return;
        };
        if !self.doc.is_connected(element) {
            tracing::debug!(id, "target detached; ignoring");
            return;
        }
        self.scroll.suppress();
        self.scheduler
            .schedule(TimerKey::NavSuppression, now, self.timing.suppress);
        self.active = Some(id.to_string());
        if let Some(position) = self.index.position(id) {
            self.focus.set(position, self.index.len());
        }
        if self.scroll.scroll_to(&mut self.doc, element) {
            self.source_scrolled(now);
        }
    }

    // ── Filters and stars ──

    pub fn set_view_level(&mut self, view: ViewLevel, now: Instant) {
        if view == self.view {
            return;
        }
        self.view = view;
        self.rebuild(now);
    }

    pub fn set_search(&mut self, term: &str, now: Instant) {
        if term == self.search {
            return;
        }
        self.search = term.to_string();
        self.rebuild(now);
    }

    /// Star or unstar the turn owning `id`; returns the new state.
    pub fn toggle_star(&mut self, id: &str, now: Instant) -> Option<bool> {
        let signature = self.index.entry_for(id)?.signature.clone();
        let starred = self.stars.toggle(&signature);
        tracing::debug!(id, starred, "star toggled");
        self.rebuild(now);
        Some(starred)
    }

    pub fn toggle_star_focused(&mut self, now: Instant) -> Option<bool> {
        let id = self.focused_id()?.to_string();
        self.toggle_star(&id, now)
    }

    // ── Copy feedback ──

    /// Id and full text of the turn owning the focused item.
    pub fn focused_text(&self) -> Option<(String, String)> {
        let entry = self.index.entry_for(self.focused_id()?)?;
        Some((entry.id.clone(), entry.text.clone()))
    }

    /// Show the "copied" label on `id` for a while.
    pub fn mark_copied(&mut self, id: &str, now: Instant) {
        self.copied = Some(id.to_string());
        self.scheduler
            .schedule(TimerKey::CopyFeedback, now, self.timing.copy_feedback);
    }

    // ── Reader scrolling ──

    /// User scroll of the reader by `delta` px.
    pub fn scroll_by(&mut self, delta: f64, now: Instant) {
        if self.scroll.scroll_by(&mut self.doc, delta) {
            self.source_scrolled(now);
        }
    }

    pub fn jump_top(&mut self, now: Instant) {
        if self.scroll.jump_top(&mut self.doc) {
            self.source_scrolled(now);
        }
    }

    pub fn jump_bottom(&mut self, now: Instant) {
        if self.scroll.jump_bottom(&mut self.doc) {
            self.source_scrolled(now);
        }
    }

    /// Relayout for a resized reader pane.
    pub fn set_viewport(&mut self, viewport: Viewport, now: Instant) {
        if !self.doc.set_viewport(viewport) {
            return;
        }
        // Whether an element scrolls depends on the viewport height.
        self.rebuild(now);
        self.source_scrolled(now);
    }

    // ── Read access ──

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn index(&self) -> &NavIndex {
        &self.index
    }

    pub fn view(&self) -> ViewLevel {
        self.view
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    fn active_position(&self) -> Option<usize> {
        self.active.as_deref().and_then(|id| self.index.position(id))
    }

    pub fn focused_index(&self) -> Option<usize> {
        self.focus.index()
    }

    pub fn focused_id(&self) -> Option<&str> {
        self.focus.index().and_then(|i| self.index.id_at(i))
    }

    pub fn copied(&self) -> Option<&str> {
        self.copied.as_deref()
    }

    pub fn progress(&self) -> u8 {
        self.scroll.progress()
    }

    pub fn scroll_source(&self) -> ElementHandle {
        self.scroll.source(&self.doc)
    }

    /// A structural change is waiting out its debounce.
    pub fn is_settling(&self) -> bool {
        self.scheduler.is_pending(TimerKey::StructuralDebounce)
    }

    pub fn reader_lines(&self) -> &[LayoutLine] {
        self.doc.visible_lines(self.scroll_source())
    }
}
