use super::{collect_headings, heading_query, Adapter, Environment};
use crate::dom::{Document, ElementHandle, Query};
use crate::turn::{Role, Turn};

const MIN_USER_TEXT_CHARS: usize = 2;
const CONTROL_TEXT_CHARS: usize = 20;

/// chatgpt.com: the markup has changed several times, so three strategies are
/// tried newest first.
pub struct ChatGptAdapter {
    root: Query,
    turn_wrappers: Query,
    role_messages: Query,
    article: Query,
    group_div: Query,
    group_wrappers: Query,
    markdown: Query,
    prose: Query,
    button: Query,
    headings: Query,
}

impl ChatGptAdapter {
    pub fn new() -> Self {
        Self {
            root: Query::new("html"),
            turn_wrappers: Query::new(r#"[data-testid*="conversation-turn"]"#),
            role_messages: Query::new("[data-message-author-role]"),
            article: Query::new("article"),
            group_div: Query::new(r#"div[class*="group"]"#),
            group_wrappers: Query::new("div.group"),
            markdown: Query::new(".markdown"),
            prose: Query::new(".prose"),
            button: Query::new("button"),
            headings: heading_query(),
        }
    }

    /// Messages tagged with `data-message-author-role`, one turn per enclosing
    /// article or group.
    fn from_role_attributes(&self, doc: &Document, root: ElementHandle) -> Vec<Turn> {
        let mut turns: Vec<Turn> = Vec::new();
        for message in doc.select(root, &self.role_messages) {
            let role = match doc.attr(message, "data-message-author-role") {
                Some("user") => Role::User,
                Some("assistant") => Role::Assistant,
                _ => continue,
            };
            let owner = doc
                .closest(message, &self.article)
                .or_else(|| doc.closest(message, &self.group_div))
                .or_else(|| doc.parent(message))
                .unwrap_or(message);
            if turns.iter().any(|turn| turn.element == owner) {
                continue;
            }
            let headings = match role {
                Role::User => Vec::new(),
                Role::Assistant => collect_headings(doc, message, &self.headings),
            };
            turns.push(Turn { role, element: owner, text: doc.inner_text(message), headings });
        }
        turns
    }

    /// Role from structure: rendered markdown means assistant, plain text user.
    fn from_wrappers(&self, doc: &Document, wrappers: Vec<ElementHandle>) -> Vec<Turn> {
        wrappers
            .into_iter()
            .filter_map(|wrapper| {
                let rendered = doc
                    .select_first(wrapper, &self.markdown)
                    .or_else(|| doc.select_first(wrapper, &self.prose));
                if let Some(content) = rendered {
                    return Some(Turn {
                        role: Role::Assistant,
                        element: wrapper,
                        text: doc.inner_text(content),
                        headings: collect_headings(doc, content, &self.headings),
                    });
                }
                let text = doc.inner_text(wrapper);
                let chars = text.chars().count();
                if chars < MIN_USER_TEXT_CHARS {
                    return None;
                }
                // Bare controls ("Regenerate", "Copy") are not prompts.
                if chars < CONTROL_TEXT_CHARS && doc.contains_match(wrapper, &self.button) {
                    return None;
                }
                Some(Turn { role: Role::User, element: wrapper, text, headings: Vec::new() })
            })
            .filter(|turn| !turn.text.trim().is_empty())
            .collect()
    }
}

impl Adapter for ChatGptAdapter {
    fn name(&self) -> &'static str {
        "chatgpt"
    }

    fn matches(&self, env: &Environment) -> bool {
        env.hostname.contains("chatgpt") || env.hostname.contains("openai")
    }

    fn root_query(&self) -> &Query {
        &self.root
    }

    fn extract(&self, doc: &Document, root: ElementHandle) -> Vec<Turn> {
        let marked = self.from_wrappers(doc, doc.select(root, &self.turn_wrappers));
        if !marked.is_empty() {
            return marked;
        }
        let attributed = self.from_role_attributes(doc, root);
        if !attributed.is_empty() {
            return attributed;
        }
        self.from_wrappers(doc, doc.select(root, &self.group_wrappers))
    }
}
