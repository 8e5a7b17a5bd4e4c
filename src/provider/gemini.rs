use super::{collect_headings, heading_query, Adapter, Environment};
use crate::dom::{Document, ElementHandle, Query};
use crate::turn::{Role, Turn};

/// gemini.google.com: custom `user-query` / `model-response` elements.
pub struct GeminiAdapter {
    root: Query,
    items: Query,
    query_text: Query,
    markdown: Query,
    headings: Query,
}

impl GeminiAdapter {
    pub fn new() -> Self {
        Self {
            root: Query::new(".mat-sidenav-content"),
            items: Query::new("user-query, model-response"),
            query_text: Query::new(".query-text"),
            markdown: Query::new(".markdown"),
            headings: heading_query(),
        }
    }
}

impl Adapter for GeminiAdapter {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn matches(&self, env: &Environment) -> bool {
        env.hostname.contains("gemini") || env.hostname.contains("google")
    }

    fn root_query(&self) -> &Query {
        &self.root
    }

    fn extract(&self, doc: &Document, root: ElementHandle) -> Vec<Turn> {
        doc.select(root, &self.items)
            .into_iter()
            .map(|item| {
                if doc.tag_name(item) == Some("user-query") {
                    let text = doc
                        .select_first(item, &self.query_text)
                        .map(|el| doc.inner_text(el))
                        .unwrap_or_default();
                    Turn { role: Role::User, element: item, text, headings: Vec::new() }
                } else {
                    let (text, headings) = match doc.select_first(item, &self.markdown) {
                        Some(markdown) => (
                            doc.inner_text(markdown),
                            collect_headings(doc, markdown, &self.headings),
                        ),
                        None => (String::new(), Vec::new()),
                    };
                    Turn { role: Role::Assistant, element: item, text, headings }
                }
            })
            .collect()
    }
}
