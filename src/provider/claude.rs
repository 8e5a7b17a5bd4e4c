use std::collections::HashSet;

use super::{collect_headings, heading_query, Adapter, Environment};
use crate::dom::{Document, ElementHandle, Query};
use crate::turn::{Role, Turn};

/// claude.ai: user messages carry `data-testid="user-message"`, responses are
/// rendered under a `font-claude-response` block or an assistant test id.
pub struct ClaudeAdapter {
    root: Query,
    messages: Query,
    turn_boundary: Query,
    group_boundary: Query,
    headings: Query,
}

impl ClaudeAdapter {
    pub fn new() -> Self {
        Self {
            root: Query::new("html"),
            messages: Query::new(
                r#"[data-testid="user-message"], .font-claude-response, [data-testid="assistant-response"], [data-testid="assistant-message"]"#,
            ),
            turn_boundary: Query::new(r#"[data-testid="conversation-turn"]"#),
            group_boundary: Query::new(".group"),
            headings: heading_query(),
        }
    }

    fn boundary(&self, doc: &Document, message: ElementHandle) -> Option<ElementHandle> {
        doc.closest(message, &self.turn_boundary)
            .or_else(|| doc.closest(message, &self.group_boundary))
    }
}

impl Adapter for ClaudeAdapter {
    fn name(&self) -> &'static str {
        "claude"
    }

    fn matches(&self, env: &Environment) -> bool {
        env.hostname.contains("claude")
    }

    fn root_query(&self) -> &Query {
        &self.root
    }

    fn extract(&self, doc: &Document, root: ElementHandle) -> Vec<Turn> {
        let mut claimed = HashSet::new();
        let mut turns = Vec::new();
        for message in doc.select(root, &self.messages) {
            // Messages outside a turn boundary are previews or drafts.
            let Some(boundary) = self.boundary(doc, message) else {
                continue;
            };
            let text = doc.inner_text(message);
            if text.is_empty() || !claimed.insert(boundary) {
                continue;
            }
            let role = if doc.attr(message, "data-testid") == Some("user-message") {
                Role::User
            } else {
                Role::Assistant
            };
            let headings = match role {
                Role::User => Vec::new(),
                Role::Assistant => collect_headings(doc, message, &self.headings),
            };
            turns.push(Turn { role, element: boundary, text, headings });
        }
        turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::fixtures::doc;

    const PAGE: &str = r#"<html><body><main>
      <div data-testid="conversation-turn"><div data-testid="user-message">How do lifetimes work?</div></div>
      <div class="group"><div class="font-claude-response">
        <h2>Short answer</h2><p>They are scopes.</p><h3>Details</h3><p>More.</p>
      </div></div>
      <div data-testid="user-message">Floating draft</div>
      <div class="group"><div data-testid="user-message">   </div></div>
    </main></body></html>"#;

    #[test]
    fn extracts_user_and_assistant_turns() {
        let d = doc(PAGE);
        let adapter = ClaudeAdapter::new();
        let turns = adapter.extract(&d, d.root_element());
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].text, "How do lifetimes work?");
        assert_eq!(turns[1].role, Role::Assistant);
        let headings: Vec<&str> = turns[1].headings.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(headings, vec!["Short answer", "Details"]);
        assert_eq!(turns[1].headings[1].level, 3);
    }

    #[test]
    fn owner_is_the_turn_boundary() {
        let d = doc(PAGE);
        let turns = ClaudeAdapter::new().extract(&d, d.root_element());
        assert_eq!(d.attr(turns[0].element, "data-testid"), Some("conversation-turn"));
        assert!(d.has_class(turns[1].element, "group"));
    }

    #[test]
    fn one_turn_per_boundary() {
        let d = doc(
            r#"<div class="group"><div class="font-claude-response"><div data-testid="assistant-message">Nested reply</div></div></div>"#,
        );
        let turns = ClaudeAdapter::new().extract(&d, d.root_element());
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::Assistant);
    }
}
