use crate::dom::{Document, ElementHandle, NodePath};
use crate::provider::Provider;

/// Outcome of re-locating the conversation root after a page mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootChange {
    /// No root could be located; the previous one is kept.
    Missing,
    /// Same element as before.
    Unchanged,
    /// Same place in the tree, fresh handle after a reload.
    Rebased(ElementHandle),
    /// A different element now holds the conversation.
    Replaced(ElementHandle),
}

/// Tracks which element is the conversation root.
#[derive(Debug, Default)]
pub struct ContainerWatcher {
    tracked: Option<(ElementHandle, NodePath)>,
}

impl ContainerWatcher {
    pub fn root(&self) -> Option<ElementHandle> {
        self.tracked.as_ref().map(|(handle, _)| *handle)
    }

    /// Run the provider's root lookup and compare with the tracked root.
    pub fn check(&mut self, doc: &Document, provider: &Provider) -> RootChange {
        let Some(candidate) = provider.locate_root(doc) else {
            return RootChange::Missing;
        };
        let Some(path) = doc.path(candidate) else {
            return RootChange::Missing;
        };
        match self.tracked.as_mut() {
            Some((handle, tracked_path)) if *tracked_path == path => {
                if *handle == candidate {
                    RootChange::Unchanged
                } else {
                    *handle = candidate;
                    RootChange::Rebased(candidate)
                }
            }
            _ => {
                tracing::info!(?path, provider = provider.name(), "conversation root changed");
                self.tracked = Some((candidate, path));
                RootChange::Replaced(candidate)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Query, Viewport};
    use crate::provider::DevAdapter;

    fn dev() -> Provider {
        Provider::Dev(DevAdapter::new())
    }

    #[test]
    fn first_check_replaces_then_settles() {
        let doc = Document::parse("<body><main><p>x</p></main></body>", Viewport::default());
        let mut watcher = ContainerWatcher::default();
        let main = doc.query(&Query::new("main")).unwrap();
        assert_eq!(watcher.check(&doc, &dev()), RootChange::Replaced(main));
        assert_eq!(watcher.check(&doc, &dev()), RootChange::Unchanged);
        assert_eq!(watcher.root(), Some(main));
    }

    #[test]
    fn reload_with_same_shape_rebases() {
        let source = "<body><main><p>x</p></main></body>";
        let mut doc = Document::parse(source, Viewport::default());
        let mut watcher = ContainerWatcher::default();
        watcher.check(&doc, &dev());
        doc.replace(&source.replace('x', "y"));
        let main = doc.query(&Query::new("main")).unwrap();
        assert_eq!(watcher.check(&doc, &dev()), RootChange::Rebased(main));
    }

    #[test]
    fn moved_root_is_replaced() {
        let mut doc = Document::parse("<body><main><p>x</p></main></body>", Viewport::default());
        let mut watcher = ContainerWatcher::default();
        watcher.check(&doc, &dev());
        doc.replace("<body><nav>menu</nav><main><p>x</p></main></body>");
        let main = doc.query(&Query::new("main")).unwrap();
        assert_eq!(watcher.check(&doc, &dev()), RootChange::Replaced(main));
    }
}
