//! Snapshot document model.
//!
//! The page is parsed into an arena tree. Handles into the tree carry the
//! generation they were taken from; every reload bumps the generation, so a
//! handle held across a reload reports itself as disconnected instead of
//! pointing at an unrelated node.

mod layout;
mod query;
mod text;

use std::collections::HashMap;

use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Html, Node};
use sha2::{Digest, Sha256};

pub use layout::{LayoutLine, LineKind};
pub use query::Query;

use layout::Layout;

/// Weak reference to an element of one document generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    generation: u64,
    node: NodeId,
}

/// Child-index path from the document root. Identifies "the same place" in
/// the tree across generations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NodePath(Vec<u32>);

/// Computed vertical overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    Visible,
    Hidden,
    Auto,
    Scroll,
    Overlay,
}

impl Overflow {
    pub fn scrolls(self) -> bool {
        matches!(self, Overflow::Auto | Overflow::Scroll | Overflow::Overlay)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "visible" => Some(Overflow::Visible),
            "hidden" | "clip" => Some(Overflow::Hidden),
            "auto" => Some(Overflow::Auto),
            "scroll" => Some(Overflow::Scroll),
            "overlay" => Some(Overflow::Overlay),
            _ => None,
        }
    }
}

/// The reader pane the document is laid out into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in terminal columns (wrap width).
    pub columns: u16,
    /// Visible rows.
    pub rows: u16,
    /// Pixels per text line.
    pub line_height: f64,
}

impl Viewport {
    pub fn height(&self) -> f64 {
        f64::from(self.rows) * self.line_height
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            columns: 80,
            rows: 24,
            line_height: 20.0,
        }
    }
}

pub struct Document {
    html: Html,
    generation: u64,
    order: HashMap<NodeId, usize>,
    layout: Layout,
    scroll_offsets: HashMap<NodeId, f64>,
    viewport: Viewport,
    blank: bool,
}

impl Document {
    pub fn parse(source: &str, viewport: Viewport) -> Self {
        Self::build(source, 1, viewport)
    }

    fn build(source: &str, generation: u64, viewport: Viewport) -> Self {
        let html = Html::parse_document(source);
        let order = html
            .tree
            .root()
            .descendants()
            .enumerate()
            .map(|(position, node)| (node.id(), position))
            .collect();
        let layout = Layout::compute(&html, usize::from(viewport.columns), viewport.line_height);
        Self {
            html,
            generation,
            order,
            layout,
            scroll_offsets: HashMap::new(),
            viewport,
            blank: source.trim().is_empty(),
        }
    }

    /// Swap in a new snapshot of the page. All existing handles become
    /// disconnected; scroll offsets carry over to elements at the same path.
    pub fn replace(&mut self, source: &str) {
        let carried: Vec<(NodePath, f64)> = self
            .scroll_offsets
            .iter()
            .filter_map(|(id, offset)| {
                let handle = ElementHandle { generation: self.generation, node: *id };
                self.path(handle).map(|path| (path, *offset))
            })
            .collect();

        *self = Self::build(source, self.generation + 1, self.viewport);

        for (path, offset) in carried {
            if let Some(handle) = self.resolve_path(&path) {
                self.set_scroll_top(handle, offset);
            }
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Relayout for a new pane size. Returns true when anything changed.
    pub fn set_viewport(&mut self, viewport: Viewport) -> bool {
        if viewport == self.viewport {
            return false;
        }
        self.viewport = viewport;
        self.layout = Layout::compute(&self.html, usize::from(viewport.columns), viewport.line_height);
        let scrolled: Vec<(NodeId, f64)> = self.scroll_offsets.drain().collect();
        for (node, offset) in scrolled {
            let handle = ElementHandle { generation: self.generation, node };
            self.set_scroll_top(handle, offset);
        }
        true
    }

    // ── Tree access ──

    fn handle_of(&self, node: NodeId) -> ElementHandle {
        ElementHandle { generation: self.generation, node }
    }

    fn element(&self, handle: ElementHandle) -> Option<ElementRef<'_>> {
        if handle.generation != self.generation {
            return None;
        }
        self.html.tree.get(handle.node).and_then(ElementRef::wrap)
    }

    pub fn is_connected(&self, handle: ElementHandle) -> bool {
        self.element(handle).is_some()
    }

    pub fn root_element(&self) -> ElementHandle {
        self.handle_of(self.html.root_element().id())
    }

    pub fn body(&self) -> Option<ElementHandle> {
        self.html
            .root_element()
            .children()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "body")
            .map(|el| self.handle_of(el.id()))
    }

    /// Whether the page has content to work with. The parser always
    /// synthesizes a `<body>`, so an empty snapshot counts as having none.
    pub fn has_body(&self) -> bool {
        !self.blank && self.body().is_some()
    }

    /// The element whose scroll offset scrolls the whole page.
    pub fn scrolling_element(&self) -> ElementHandle {
        self.root_element()
    }

    pub fn is_document_scroller(&self, handle: ElementHandle) -> bool {
        handle == self.root_element() || Some(handle) == self.body()
    }

    /// First element in document order matching `query`.
    pub fn query(&self, query: &Query) -> Option<ElementHandle> {
        let selector = query.selector()?;
        self.html.select(selector).next().map(|el| self.handle_of(el.id()))
    }

    /// Descendants of `scope` matching `query`, in document order.
    pub fn select(&self, scope: ElementHandle, query: &Query) -> Vec<ElementHandle> {
        let (Some(el), Some(selector)) = (self.element(scope), query.selector()) else {
            return Vec::new();
        };
        el.select(selector).map(|found| self.handle_of(found.id())).collect()
    }

    pub fn select_first(&self, scope: ElementHandle, query: &Query) -> Option<ElementHandle> {
        let el = self.element(scope)?;
        let selector = query.selector()?;
        el.select(selector).next().map(|found| self.handle_of(found.id()))
    }

    pub fn contains_match(&self, scope: ElementHandle, query: &Query) -> bool {
        self.select_first(scope, query).is_some()
    }

    /// Nearest inclusive ancestor matching `query`.
    pub fn closest(&self, handle: ElementHandle, query: &Query) -> Option<ElementHandle> {
        let el = self.element(handle)?;
        std::iter::once(el)
            .chain(el.ancestors().filter_map(ElementRef::wrap))
            .find(|candidate| query.matches(candidate))
            .map(|found| self.handle_of(found.id()))
    }

    pub fn parent(&self, handle: ElementHandle) -> Option<ElementHandle> {
        let el = self.element(handle)?;
        el.parent()
            .and_then(ElementRef::wrap)
            .map(|parent| self.handle_of(parent.id()))
    }

    pub fn tag_name(&self, handle: ElementHandle) -> Option<&str> {
        self.element(handle).map(|el| el.value().name())
    }

    pub fn attr(&self, handle: ElementHandle, name: &str) -> Option<&str> {
        self.element(handle).and_then(|el| el.value().attr(name))
    }

    pub fn has_class(&self, handle: ElementHandle, class: &str) -> bool {
        self.element(handle)
            .is_some_and(|el| el.value().classes().any(|c| c == class))
    }

    /// Rendered text (`innerText`); empty for disconnected handles.
    pub fn inner_text(&self, handle: ElementHandle) -> String {
        self.element(handle)
            .map(|el| text::inner_text(*el))
            .unwrap_or_default()
    }

    /// Position in document (pre-)order.
    pub fn position(&self, handle: ElementHandle) -> Option<usize> {
        if handle.generation != self.generation {
            return None;
        }
        self.order.get(&handle.node).copied()
    }

    pub fn path(&self, handle: ElementHandle) -> Option<NodePath> {
        let el = self.element(handle)?;
        let mut steps = Vec::new();
        let mut current: NodeRef<'_, Node> = *el;
        while let Some(parent) = current.parent() {
            let index = parent
                .children()
                .position(|child| child.id() == current.id())?;
            steps.push(index as u32);
            current = parent;
        }
        steps.reverse();
        Some(NodePath(steps))
    }

    pub fn resolve_path(&self, path: &NodePath) -> Option<ElementHandle> {
        let mut current = self.html.tree.root();
        for step in &path.0 {
            current = current.children().nth(*step as usize)?;
        }
        ElementRef::wrap(current).map(|el| self.handle_of(el.id()))
    }

    /// SHA-256 of the element's serialized subtree.
    pub fn subtree_digest(&self, handle: ElementHandle) -> Option<String> {
        let el = self.element(handle)?;
        let mut hasher = Sha256::new();
        hasher.update(el.html().as_bytes());
        Some(format!("{:x}", hasher.finalize()))
    }

    // ── Geometry ──

    pub fn overflow_y(&self, handle: ElementHandle) -> Overflow {
        let Some(el) = self.element(handle) else {
            return Overflow::Visible;
        };
        if let Some(style) = el.value().attr("style") {
            if let Some(overflow) = style_overflow(style) {
                return overflow;
            }
        }
        el.value()
            .classes()
            .filter_map(class_overflow)
            .last()
            .unwrap_or(Overflow::Visible)
    }

    pub fn scroll_height(&self, handle: ElementHandle) -> f64 {
        if handle == self.scrolling_element() && self.is_connected(handle) {
            return self.layout.content_height();
        }
        self.element(handle)
            .and_then(|el| self.layout.get(el.id()))
            .map_or(0.0, |b| b.height)
    }

    pub fn client_height(&self, handle: ElementHandle) -> f64 {
        if !self.is_connected(handle) {
            return 0.0;
        }
        let viewport = self.viewport.height();
        if handle == self.scrolling_element() {
            return viewport;
        }
        let content = self.scroll_height(handle);
        if self.overflow_y(handle).scrolls() {
            content.min(viewport)
        } else {
            content
        }
    }

    pub fn max_scroll(&self, handle: ElementHandle) -> f64 {
        (self.scroll_height(handle) - self.client_height(handle)).max(0.0)
    }

    pub fn scroll_top(&self, handle: ElementHandle) -> f64 {
        if handle.generation != self.generation {
            return 0.0;
        }
        self.scroll_offsets.get(&handle.node).copied().unwrap_or(0.0)
    }

    /// Clamp and store a scroll offset. Returns true when the offset moved.
    pub fn set_scroll_top(&mut self, handle: ElementHandle, top: f64) -> bool {
        if !self.is_connected(handle) {
            return false;
        }
        let clamped = top.clamp(0.0, self.max_scroll(handle));
        let previous = self.scroll_top(handle);
        if clamped == 0.0 {
            self.scroll_offsets.remove(&handle.node);
        } else {
            self.scroll_offsets.insert(handle.node, clamped);
        }
        (previous - clamped).abs() > f64::EPSILON
    }

    /// Unscrolled offset of the element's top edge from the top of the document.
    pub fn content_top(&self, handle: ElementHandle) -> Option<f64> {
        let el = self.element(handle)?;
        self.layout.get(el.id()).map(|b| b.top)
    }

    /// Top edge relative to the viewport: the content offset minus the scroll
    /// offset of every ancestor.
    pub fn bounding_top(&self, handle: ElementHandle) -> Option<f64> {
        let el = self.element(handle)?;
        let top = self.layout.get(el.id())?.top;
        let scrolled: f64 = el
            .ancestors()
            .filter_map(|ancestor| self.scroll_offsets.get(&ancestor.id()))
            .sum();
        Some(top - scrolled)
    }

    /// Rendered lines currently visible through `source`.
    pub fn visible_lines(&self, source: ElementHandle) -> &[LayoutLine] {
        let lines = self.layout.lines();
        let line_height = self.layout.line_height();
        if line_height <= 0.0 {
            return &[];
        }
        let origin = if source == self.scrolling_element() {
            0.0
        } else {
            self.content_top(source).unwrap_or(0.0)
        };
        let start = ((origin + self.scroll_top(source)) / line_height).floor() as usize;
        let rows = (self.client_height(source) / line_height).ceil() as usize;
        let start = start.min(lines.len());
        let end = (start + rows).min(lines.len());
        &lines[start..end]
    }

    /// Environment URL recorded by the browser when the page was saved.
    pub fn saved_from_url(&self) -> Option<String> {
        self.html.tree.root().descendants().find_map(|node| {
            let comment = node.value().as_comment()?;
            let rest = comment.trim().strip_prefix("saved from url=")?;
            let url = match rest.split_once(')') {
                Some((_, url)) => url,
                None => rest,
            };
            let url = url.trim();
            (!url.is_empty()).then(|| url.to_string())
        })
    }
}

fn style_overflow(style: &str) -> Option<Overflow> {
    let mut overflow = None;
    let mut overflow_y = None;
    for declaration in style.split(';') {
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        let mut values = value.split_whitespace();
        match property.trim().to_ascii_lowercase().as_str() {
            "overflow-y" => overflow_y = values.next().and_then(Overflow::parse),
            // `overflow: <x> <y>`; a single value applies to both axes.
            "overflow" => {
                let first = values.next();
                overflow = values.next().or(first).and_then(Overflow::parse);
            }
            _ => {}
        }
    }
    overflow_y.or(overflow)
}

fn class_overflow(class: &str) -> Option<Overflow> {
    let value = class
        .strip_prefix("overflow-y-")
        .or_else(|| class.strip_prefix("overflow-"))?;
    Overflow::parse(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <header><p>Header line</p></header>
        <div id="scroller" style="overflow-y: auto">
          <div id="first"><p>one</p><p>two</p></div>
          <div id="second"><p>three</p><p>four</p></div>
          <div id="third"><p>five</p><p>six</p></div>
        </div>
    </body></html>"#;

    fn doc(rows: u16) -> Document {
        Document::parse(
            PAGE,
            Viewport { columns: 40, rows, line_height: 10.0 },
        )
    }

    fn by_id(doc: &Document, css: &'static str) -> ElementHandle {
        doc.query(&Query::new(css)).unwrap()
    }

    #[test]
    fn overflow_from_style_and_classes() {
        let d = Document::parse(
            r#"<div id="a" style="overflow: hidden scroll"></div><div id="b" class="flex overflow-y-auto"></div><div id="c"></div>"#,
            Viewport::default(),
        );
        let a = d.query(&Query::new("#a")).unwrap();
        let b = d.query(&Query::new("#b")).unwrap();
        let c = d.query(&Query::new("#c")).unwrap();
        assert_eq!(d.overflow_y(a), Overflow::Scroll);
        assert_eq!(d.overflow_y(b), Overflow::Auto);
        assert_eq!(d.overflow_y(c), Overflow::Visible);
    }

    #[test]
    fn scroll_container_metrics() {
        let d = doc(4);
        let scroller = by_id(&d, "#scroller");
        assert_eq!(d.scroll_height(scroller), 60.0);
        assert_eq!(d.client_height(scroller), 40.0);
        assert_eq!(d.max_scroll(scroller), 20.0);
    }

    #[test]
    fn scrolling_moves_bounding_top_and_clamps() {
        let mut d = doc(4);
        let scroller = by_id(&d, "#scroller");
        let second = by_id(&d, "#second");
        assert_eq!(d.bounding_top(second), Some(30.0));
        assert!(d.set_scroll_top(scroller, 500.0));
        assert_eq!(d.scroll_top(scroller), 20.0);
        assert_eq!(d.bounding_top(second), Some(10.0));
        assert!(!d.set_scroll_top(scroller, 20.0));
    }

    #[test]
    fn replace_disconnects_handles_and_keeps_scroll() {
        let mut d = doc(4);
        let scroller = by_id(&d, "#scroller");
        let first = by_id(&d, "#first");
        d.set_scroll_top(scroller, 10.0);
        d.replace(PAGE);
        assert!(!d.is_connected(first));
        assert_eq!(d.generation(), 2);
        let scroller = by_id(&d, "#scroller");
        assert_eq!(d.scroll_top(scroller), 10.0);
    }

    #[test]
    fn paths_resolve_across_generations() {
        let mut d = doc(4);
        let path = d.path(by_id(&d, "#third")).unwrap();
        d.replace(PAGE);
        let resolved = d.resolve_path(&path).unwrap();
        assert_eq!(resolved, by_id(&d, "#third"));
    }

    #[test]
    fn closest_is_inclusive() {
        let d = doc(4);
        let first = by_id(&d, "#first");
        assert_eq!(d.closest(first, &Query::new("#first")), Some(first));
        assert_eq!(
            d.closest(first, &Query::new("div[style]")),
            Some(by_id(&d, "#scroller"))
        );
    }

    #[test]
    fn positions_follow_document_order() {
        let d = doc(4);
        let first = d.position(by_id(&d, "#first")).unwrap();
        let third = d.position(by_id(&d, "#third")).unwrap();
        assert!(first < third);
    }

    #[test]
    fn digest_changes_with_content() {
        let a = doc(4);
        let b = Document::parse(&PAGE.replace("six", "seven"), Viewport::default());
        let a_digest = a.subtree_digest(by_id(&a, "#third")).unwrap();
        let b_digest = b.subtree_digest(by_id(&b, "#third")).unwrap();
        assert_ne!(a_digest, b_digest);
    }

    #[test]
    fn visible_lines_follow_the_source() {
        let mut d = doc(2);
        let scroller = by_id(&d, "#scroller");
        d.set_scroll_top(scroller, 20.0);
        let texts: Vec<&str> = d.visible_lines(scroller).iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["three", "four"]);
    }

    #[test]
    fn blank_snapshot_has_no_body() {
        assert!(!Document::parse("  \n", Viewport::default()).has_body());
        assert!(doc(4).has_body());
    }

    #[test]
    fn saved_from_url_comment() {
        let d = Document::parse(
            "<!-- saved from url=(0031)https://claude.ai/chat/abc-123 --><html><body></body></html>",
            Viewport::default(),
        );
        assert_eq!(d.saved_from_url().as_deref(), Some("https://claude.ai/chat/abc-123"));
    }
}
