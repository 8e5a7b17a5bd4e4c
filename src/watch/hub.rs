use std::collections::HashMap;

use crate::dom::{Document, ElementHandle, NodePath};

/// What a subscription is for. Each kind has at most one live subscription;
/// observing again disposes the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Whole page body: used to notice the conversation root being swapped.
    Page,
    /// Conversation root subtree: content changes trigger a debounced rebuild.
    Conversation,
    /// Scroll events of the current scroll source.
    Scroll,
}

#[derive(Debug, Clone)]
struct Subscription {
    scope: NodePath,
    digest: Option<String>,
}

/// Subscriptions to element scopes of the current document.
///
/// Scopes are stored by path so they survive a reload; a reload is reported as
/// a mutation of every structural scope whose subtree digest changed.
#[derive(Debug, Default)]
pub struct MutationHub {
    subscriptions: HashMap<ScopeKind, Subscription>,
}

impl MutationHub {
    /// Subscribe `kind` to `scope`. Returns false for a disconnected scope,
    /// in which case any previous subscription of that kind stays disposed.
    pub fn observe(&mut self, doc: &Document, kind: ScopeKind, scope: ElementHandle) -> bool {
        self.dispose(kind);
        let Some(path) = doc.path(scope) else {
            return false;
        };
        let digest = match kind {
            ScopeKind::Scroll => None,
            ScopeKind::Page | ScopeKind::Conversation => doc.subtree_digest(scope),
        };
        tracing::debug!(?kind, ?path, "observe");
        self.subscriptions.insert(kind, Subscription { scope: path, digest });
        true
    }

    pub fn dispose(&mut self, kind: ScopeKind) -> bool {
        self.subscriptions.remove(&kind).is_some()
    }

    /// Whether `el` is the scope currently observed for `kind`.
    pub fn observes(&self, doc: &Document, kind: ScopeKind, el: ElementHandle) -> bool {
        match (self.subscriptions.get(&kind), doc.path(el)) {
            (Some(sub), Some(path)) => sub.scope == path,
            _ => false,
        }
    }

    /// Compare structural scopes against the freshly loaded document and
    /// return the kinds that saw a mutation, page first.
    pub fn changed_after_reload(&mut self, doc: &Document) -> Vec<ScopeKind> {
        let mut changed = Vec::new();
        for kind in [ScopeKind::Page, ScopeKind::Conversation] {
            let Some(sub) = self.subscriptions.get_mut(&kind) else {
                continue;
            };
            let digest = doc
                .resolve_path(&sub.scope)
                .and_then(|scope| doc.subtree_digest(scope));
            if digest != sub.digest {
                sub.digest = digest;
                changed.push(kind);
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Query, Viewport};

    const PAGE: &str = r#"<html><body><main id="root"><p>one</p></main><aside>side</aside></body></html>"#;

    fn setup() -> (Document, MutationHub) {
        let doc = Document::parse(PAGE, Viewport::default());
        let mut hub = MutationHub::default();
        let body = doc.body().unwrap();
        let root = doc.query(&Query::new("#root")).unwrap();
        assert!(hub.observe(&doc, ScopeKind::Page, body));
        assert!(hub.observe(&doc, ScopeKind::Conversation, root));
        (doc, hub)
    }

    #[test]
    fn identical_reload_reports_nothing() {
        let (mut doc, mut hub) = setup();
        doc.replace(PAGE);
        assert!(hub.changed_after_reload(&doc).is_empty());
    }

    #[test]
    fn content_change_reports_both_scopes() {
        let (mut doc, mut hub) = setup();
        doc.replace(&PAGE.replace("one", "two"));
        assert_eq!(
            hub.changed_after_reload(&doc),
            vec![ScopeKind::Page, ScopeKind::Conversation]
        );
        // Digests are refreshed; the same document again is quiet.
        assert!(hub.changed_after_reload(&doc).is_empty());
    }

    #[test]
    fn change_outside_root_is_page_only() {
        let (mut doc, mut hub) = setup();
        doc.replace(&PAGE.replace("side", "other"));
        assert_eq!(hub.changed_after_reload(&doc), vec![ScopeKind::Page]);
    }

    #[test]
    fn observing_again_replaces_the_subscription() {
        let (doc, mut hub) = setup();
        let aside = doc.query(&Query::new("aside")).unwrap();
        let root = doc.query(&Query::new("#root")).unwrap();
        assert!(hub.observes(&doc, ScopeKind::Conversation, root));
        hub.observe(&doc, ScopeKind::Conversation, aside);
        assert!(!hub.observes(&doc, ScopeKind::Conversation, root));
        assert!(hub.observes(&doc, ScopeKind::Conversation, aside));
    }

    #[test]
    fn scroll_scope_matches_across_reloads() {
        let (mut doc, mut hub) = setup();
        let root = doc.query(&Query::new("#root")).unwrap();
        hub.observe(&doc, ScopeKind::Scroll, root);
        doc.replace(PAGE);
        let root = doc.query(&Query::new("#root")).unwrap();
        assert!(hub.observes(&doc, ScopeKind::Scroll, root));
        assert!(hub.dispose(ScopeKind::Scroll));
        assert!(!hub.observes(&doc, ScopeKind::Scroll, root));
    }
}
