//! Scroll source discovery, progress and active-target tracking.
//!
//! The scroll source is the element whose offset is read and animated. It is
//! usually an ancestor of the turns rather than the conversation root itself.

use crate::dom::{Document, ElementHandle, NodePath};
use crate::nav::NavTarget;
use crate::turn::Turn;

/// Extra scrollable extent required before an element counts as a scroller.
const SCROLL_SLACK: f64 = 4.0;
const OFFSET_RATIO: f64 = 0.15;
const OFFSET_FALLBACK: f64 = 110.0;
const OFFSET_MIN: f64 = 80.0;
const OFFSET_MAX: f64 = 170.0;

pub fn can_scroll(doc: &Document, el: ElementHandle) -> bool {
    doc.overflow_y(el).scrolls() && doc.scroll_height(el) - doc.client_height(el) > SCROLL_SLACK
}

/// Nearest inclusive ancestor that scrolls, stopping at `<body>`/`<html>`.
/// Falls back to the page's scrolling element.
pub fn find_scrollable_ancestor(doc: &Document, start: ElementHandle) -> ElementHandle {
    let mut current = Some(start);
    while let Some(el) = current {
        if can_scroll(doc, el) {
            return el;
        }
        if doc.is_document_scroller(el) {
            break;
        }
        current = doc.parent(el);
    }
    doc.scrolling_element()
}

/// Percentage scrolled, 0 when there is nothing to scroll.
pub fn progress(scroll_top: f64, scroll_height: f64, client_height: f64) -> u8 {
    let max = (scroll_height - client_height).max(0.0);
    if max <= 0.0 {
        return 0;
    }
    (scroll_top / max * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Distance of the reading line below the top of the conversation root.
pub fn reading_offset(viewport_height: f64) -> f64 {
    let base = if viewport_height > 0.0 {
        viewport_height * OFFSET_RATIO
    } else {
        OFFSET_FALLBACK
    };
    base.clamp(OFFSET_MIN, OFFSET_MAX)
}

/// Attached target whose top edge is nearest to `line`; the first one wins ties.
pub fn closest_target<'a>(doc: &Document, targets: &'a [NavTarget], line: f64) -> Option<&'a str> {
    let mut best: Option<(&'a str, f64)> = None;
    for target in targets {
        let Some(top) = doc.bounding_top(target.element) else {
            continue;
        };
        let distance = (top - line).abs();
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((target.id.as_str(), distance));
        }
    }
    best.map(|(id, _)| id)
}

#[derive(Debug, Default)]
pub struct ScrollSync {
    source: Option<(ElementHandle, NodePath)>,
    suppressed: bool,
    progress: u8,
}

impl ScrollSync {
    /// The tracked scroll source, or the page scroller when none is attached.
    pub fn source(&self, doc: &Document) -> ElementHandle {
        self.source
            .as_ref()
            .map(|(handle, _)| *handle)
            .filter(|handle| doc.is_connected(*handle))
            .unwrap_or_else(|| doc.scrolling_element())
    }

    /// Track `el`. Returns false when it already is the source.
    pub fn set_source(&mut self, doc: &Document, el: ElementHandle) -> bool {
        if self.source.as_ref().is_some_and(|(handle, _)| *handle == el) {
            return false;
        }
        let Some(path) = doc.path(el) else {
            return false;
        };
        tracing::debug!(?path, "scroll source changed");
        self.source = Some((el, path));
        true
    }

    /// Scroll source for a fresh turn list: the scrollable ancestor of the
    /// first turn still in the document. `None` when no turn is attached.
    pub fn source_for_turns(doc: &Document, turns: &[Turn]) -> Option<ElementHandle> {
        turns
            .iter()
            .find(|turn| doc.is_connected(turn.element))
            .map(|turn| find_scrollable_ancestor(doc, turn.element))
    }

    /// Re-point the source at the same place in a reloaded document.
    pub fn rebase(&mut self, doc: &Document) {
        if let Some((handle, path)) = self.source.as_mut() {
            match doc.resolve_path(path) {
                Some(resolved) => *handle = resolved,
                None => self.source = None,
            }
        }
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn update_progress(&mut self, doc: &Document) -> u8 {
        let source = self.source(doc);
        self.progress = progress(
            doc.scroll_top(source),
            doc.scroll_height(source),
            doc.client_height(source),
        );
        self.progress
    }

    pub fn suppress(&mut self) {
        self.suppressed = true;
    }

    pub fn release(&mut self) {
        self.suppressed = false;
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// Target nearest the reading line, unless a programmatic jump is settling.
    pub fn resolve_active<'a>(
        &self,
        doc: &Document,
        root: ElementHandle,
        targets: &'a [NavTarget],
    ) -> Option<&'a str> {
        if self.is_suppressed() {
            return None;
        }
        let line = doc.bounding_top(root).unwrap_or(0.0) + reading_offset(doc.viewport().height());
        closest_target(doc, targets, line)
    }

    /// Bring `el` to the reading line of the source. Returns true when the
    /// source actually moved.
    pub fn scroll_to(&self, doc: &mut Document, el: ElementHandle) -> bool {
        let source = self.source(doc);
        let (Some(el_top), Some(source_top)) = (doc.bounding_top(el), doc.bounding_top(source)) else {
            return false;
        };
        let offset = reading_offset(doc.viewport().height());
        let target = doc.scroll_top(source) + (el_top - source_top) - offset;
        doc.set_scroll_top(source, target)
    }

    pub fn scroll_by(&self, doc: &mut Document, delta: f64) -> bool {
        let source = self.source(doc);
        let top = doc.scroll_top(source);
        doc.set_scroll_top(source, top + delta)
    }

    pub fn jump_top(&self, doc: &mut Document) -> bool {
        let source = self.source(doc);
        doc.set_scroll_top(source, 0.0)
    }

    pub fn jump_bottom(&self, doc: &mut Document) -> bool {
        let source = self.source(doc);
        let bottom = doc.scroll_height(source);
        doc.set_scroll_top(source, bottom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Query, Viewport};

    fn page_source(paragraphs: usize) -> String {
        let mut html = String::from(
            r#"<html><body><nav><p>menu</p></nav><div id="scroller" class="overflow-y-auto"><div id="list">"#,
        );
        for i in 0..paragraphs {
            html.push_str(&format!(r#"<p id="p{i}">paragraph {i}</p>"#));
        }
        html.push_str("</div></div></body></html>");
        html
    }

    fn page(rows: u16) -> Document {
        Document::parse(&page_source(40), Viewport { columns: 80, rows, line_height: 20.0 })
    }

    fn el(doc: &Document, css: &'static str) -> ElementHandle {
        doc.query(&Query::new(css)).unwrap()
    }

    #[test]
    fn progress_examples() {
        assert_eq!(progress(500.0, 2000.0, 1000.0), 50);
        assert_eq!(progress(0.0, 2000.0, 1000.0), 0);
        assert_eq!(progress(1000.0, 2000.0, 1000.0), 100);
        assert_eq!(progress(10.0, 800.0, 1000.0), 0);
        assert_eq!(progress(10.0, 1000.0, 1000.0), 0);
    }

    #[test]
    fn progress_is_bounded() {
        for height in [1000.0, 1500.0, 4000.0] {
            for top in [0.0, 1.0, 250.0, 999.0, 3000.0, 9000.0] {
                let p = progress(top, height, 1000.0);
                assert!(p <= 100);
            }
        }
    }

    #[test]
    fn reading_offset_is_clamped() {
        assert_eq!(reading_offset(0.0), 110.0);
        assert_eq!(reading_offset(200.0), 80.0);
        assert_eq!(reading_offset(800.0), 120.0);
        assert_eq!(reading_offset(5000.0), 170.0);
    }

    #[test]
    fn finds_nested_scroller() {
        let doc = page(10);
        let found = find_scrollable_ancestor(&doc, el(&doc, "#p3"));
        assert_eq!(found, el(&doc, "#scroller"));
    }

    #[test]
    fn falls_back_to_page_scroller() {
        // Everything fits: nothing scrolls.
        let doc = page(200);
        let found = find_scrollable_ancestor(&doc, el(&doc, "#p3"));
        assert_eq!(found, doc.scrolling_element());
    }

    #[test]
    fn source_resolution_is_idempotent() {
        let doc = page(10);
        let mut sync = ScrollSync::default();
        let scroller = el(&doc, "#scroller");
        assert!(sync.set_source(&doc, scroller));
        assert!(!sync.set_source(&doc, scroller));
        assert_eq!(sync.source(&doc), scroller);
    }

    #[test]
    fn active_target_tracks_scroll() {
        let mut doc = page(10);
        let mut sync = ScrollSync::default();
        sync.set_source(&doc, el(&doc, "#scroller"));
        let list = el(&doc, "#list");
        let targets: Vec<NavTarget> = doc
            .select(list, &Query::new("p"))
            .into_iter()
            .enumerate()
            .map(|(i, element)| NavTarget { id: format!("nav-target-{i}"), element })
            .collect();
        let root = doc.body().unwrap();
        // Viewport 200px: reading line at 80px = line 4, which is p3.
        assert_eq!(sync.resolve_active(&doc, root, &targets), Some("nav-target-3"));

        assert!(sync.scroll_by(&mut doc, 200.0));
        assert_eq!(sync.resolve_active(&doc, root, &targets), Some("nav-target-13"));
        assert_eq!(sync.update_progress(&doc), 33);

        sync.suppress();
        assert_eq!(sync.resolve_active(&doc, root, &targets), None);
        sync.release();
        assert!(sync.resolve_active(&doc, root, &targets).is_some());
    }

    #[test]
    fn ties_go_to_first_target() {
        let doc = page(10);
        let p5 = el(&doc, "#p5");
        let targets = vec![
            NavTarget { id: "a".into(), element: p5 },
            NavTarget { id: "b".into(), element: p5 },
        ];
        assert_eq!(closest_target(&doc, &targets, 0.0), Some("a"));
    }

    #[test]
    fn disconnected_targets_are_skipped() {
        let mut doc = page(10);
        let stale = el(&doc, "#p1");
        doc.replace("<html><body><div><p>a</p><p id=\"p9\">b</p></div></body></html>");
        let fresh = el(&doc, "#p9");
        let targets = vec![
            NavTarget { id: "stale".into(), element: stale },
            NavTarget { id: "fresh".into(), element: fresh },
        ];
        assert_eq!(closest_target(&doc, &targets, 0.0), Some("fresh"));
    }

    #[test]
    fn scroll_to_puts_element_on_reading_line() {
        let mut doc = page(10);
        let mut sync = ScrollSync::default();
        let scroller = el(&doc, "#scroller");
        sync.set_source(&doc, scroller);
        let p20 = el(&doc, "#p20");
        assert!(sync.scroll_to(&mut doc, p20));
        let line = doc.bounding_top(scroller).unwrap() + reading_offset(doc.viewport().height());
        assert_eq!(doc.bounding_top(p20), Some(line));
    }

    #[test]
    fn jumps_clamp_to_extent() {
        let mut doc = page(10);
        let mut sync = ScrollSync::default();
        let scroller = el(&doc, "#scroller");
        sync.set_source(&doc, scroller);
        assert!(sync.jump_bottom(&mut doc));
        assert_eq!(doc.scroll_top(scroller), doc.max_scroll(scroller));
        assert_eq!(sync.update_progress(&doc), 100);
        assert!(sync.jump_top(&mut doc));
        assert_eq!(sync.update_progress(&doc), 0);
    }

    #[test]
    fn rebase_follows_path() {
        let mut doc = page(10);
        let mut sync = ScrollSync::default();
        sync.set_source(&doc, el(&doc, "#scroller"));
        doc.replace(&page_source(41));
        sync.rebase(&doc);
        assert_eq!(sync.source(&doc), el(&doc, "#scroller"));
    }
}
