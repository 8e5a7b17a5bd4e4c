use super::{collect_headings, heading_query, Adapter, Environment};
use crate::dom::{Document, ElementHandle, Query};
use crate::turn::{Role, Turn};

/// Local test pages: `.message` blocks, `.user` marks the prompt side.
pub struct DevAdapter {
    root: Query,
    messages: Query,
    headings: Query,
}

impl DevAdapter {
    pub fn new() -> Self {
        Self {
            root: Query::new("main"),
            messages: Query::new(".message"),
            headings: heading_query(),
        }
    }
}

impl Adapter for DevAdapter {
    fn name(&self) -> &'static str {
        "dev"
    }

    fn matches(&self, env: &Environment) -> bool {
        env.hostname == "localhost" || env.hostname == "127.0.0.1" || env.protocol == "file:"
    }

    fn root_query(&self) -> &Query {
        &self.root
    }

    fn extract(&self, doc: &Document, root: ElementHandle) -> Vec<Turn> {
        doc.select(root, &self.messages)
            .into_iter()
            .map(|item| {
                let role = if doc.has_class(item, "user") { Role::User } else { Role::Assistant };
                let headings = match role {
                    Role::User => Vec::new(),
                    Role::Assistant => collect_headings(doc, item, &self.headings),
                };
                Turn { role, element: item, text: doc.inner_text(item), headings }
            })
            .collect()
    }
}
