//! Provider registry: one adapter per chat site, picked once from the
//! environment the page was captured in.

mod chatgpt;
mod claude;
mod dev;
mod gemini;

use anyhow::{Context, Result};
use url::Url;

use crate::dom::{Document, ElementHandle, Query};
use crate::turn::{Heading, Turn};

pub use chatgpt::ChatGptAdapter;
pub use claude::ClaudeAdapter;
pub use dev::DevAdapter;
pub use gemini::GeminiAdapter;

/// Where the page lives: the hostname and protocol of its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub hostname: String,
    /// Scheme with its trailing colon, e.g. `https:` or `file:`.
    pub protocol: String,
}

impl Environment {
    pub fn from_url(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).with_context(|| format!("Invalid page URL: {raw}"))?;
        Ok(Self {
            hostname: url.host_str().unwrap_or_default().to_ascii_lowercase(),
            protocol: format!("{}:", url.scheme()),
        })
    }

    /// Environment of a snapshot opened straight from disk.
    pub fn local_file() -> Self {
        Self {
            hostname: String::new(),
            protocol: "file:".to_string(),
        }
    }
}

/// Per-site extraction heuristics.
pub trait Adapter {
    fn name(&self) -> &'static str;

    fn matches(&self, env: &Environment) -> bool;

    /// Selector of the site's conversation root, tried before the generic fallbacks.
    fn root_query(&self) -> &Query;

    /// Raw turns under `root`, in extraction order.
    fn extract(&self, doc: &Document, root: ElementHandle) -> Vec<Turn>;
}

pub enum Provider {
    Claude(ClaudeAdapter),
    ChatGpt(ChatGptAdapter),
    Gemini(GeminiAdapter),
    Dev(DevAdapter),
}

impl Provider {
    /// All providers in match priority order.
    pub fn registry() -> Vec<Provider> {
        vec![
            Provider::Claude(ClaudeAdapter::new()),
            Provider::ChatGpt(ChatGptAdapter::new()),
            Provider::Gemini(GeminiAdapter::new()),
            Provider::Dev(DevAdapter::new()),
        ]
    }

    /// The first provider whose predicate accepts `env`.
    pub fn select(env: &Environment) -> Option<Provider> {
        Self::registry().into_iter().find(|p| p.matches(env))
    }

    fn adapter(&self) -> &dyn Adapter {
        match self {
            Provider::Claude(a) => a,
            Provider::ChatGpt(a) => a,
            Provider::Gemini(a) => a,
            Provider::Dev(a) => a,
        }
    }

    pub fn name(&self) -> &'static str {
        self.adapter().name()
    }

    pub fn matches(&self, env: &Environment) -> bool {
        self.adapter().matches(env)
    }

    /// The conversation root: the site's own root selector, else `main`, else `body`.
    pub fn locate_root(&self, doc: &Document) -> Option<ElementHandle> {
        doc.query(self.adapter().root_query())
            .or_else(|| doc.query(&Query::new("main")))
            .or_else(|| doc.body())
    }

    /// Turns under `root`. Turns whose text is blank are dropped.
    pub fn extract_turns(&self, doc: &Document, root: ElementHandle) -> Vec<Turn> {
        let mut turns = self.adapter().extract(doc, root);
        turns.retain(|turn| !turn.text.trim().is_empty());
        tracing::debug!(provider = self.name(), count = turns.len(), "extracted turns");
        turns
    }
}

/// `h1`–`h4` under `scope`, in document order.
pub(crate) fn collect_headings(doc: &Document, scope: ElementHandle, query: &Query) -> Vec<Heading> {
    doc.select(scope, query)
        .into_iter()
        .filter_map(|element| {
            let text = doc.inner_text(element);
            if text.is_empty() {
                return None;
            }
            let level = doc
                .tag_name(element)
                .and_then(|tag| tag.strip_prefix('h'))
                .and_then(|n| n.parse().ok())
                .unwrap_or(1);
            Some(Heading { text, level, element })
        })
        .collect()
}

pub(crate) fn heading_query() -> Query {
    Query::new("h1, h2, h3, h4")
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::dom::{Document, Viewport};

    pub fn doc(html: &str) -> Document {
        Document::parse(html, Viewport::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(url: &str) -> Environment {
        Environment::from_url(url).unwrap()
    }

    #[test]
    fn environment_from_url() {
        let e = env("https://Claude.AI/chat/123");
        assert_eq!(e.hostname, "claude.ai");
        assert_eq!(e.protocol, "https:");
    }

    #[test]
    fn invalid_url_is_an_error() {
        assert!(Environment::from_url("not a url").is_err());
    }

    #[test]
    fn selects_first_matching_provider() {
        assert_eq!(Provider::select(&env("https://claude.ai/chat/1")).unwrap().name(), "claude");
        assert_eq!(Provider::select(&env("https://chatgpt.com/c/1")).unwrap().name(), "chatgpt");
        assert_eq!(Provider::select(&env("https://chat.openai.com/")).unwrap().name(), "chatgpt");
        assert_eq!(Provider::select(&env("https://gemini.google.com/app")).unwrap().name(), "gemini");
        assert_eq!(Provider::select(&env("http://localhost:3000/")).unwrap().name(), "dev");
        assert_eq!(Provider::select(&env("http://127.0.0.1/")).unwrap().name(), "dev");
        let file = Environment::local_file();
        assert_eq!(Provider::select(&file).unwrap().name(), "dev");
    }

    #[test]
    fn unknown_environment_selects_nothing() {
        assert!(Provider::select(&env("https://example.com/")).is_none());
    }

    #[test]
    fn registry_order_decides_overlaps() {
        // "claude" wins over "google" because Claude is registered first.
        let e = env("https://claude.google.com/");
        assert_eq!(Provider::select(&e).unwrap().name(), "claude");
    }

    #[test]
    fn root_falls_back_to_main_then_body() {
        let provider = Provider::Gemini(GeminiAdapter::new());
        let with_main = fixtures::doc("<body><main id=m></main></body>");
        let root = provider.locate_root(&with_main).unwrap();
        assert_eq!(with_main.tag_name(root), Some("main"));

        let bare = fixtures::doc("<body><div></div></body>");
        let root = provider.locate_root(&bare).unwrap();
        assert_eq!(bare.tag_name(root), Some("body"));
    }

    #[test]
    fn blank_turns_are_dropped() {
        let d = fixtures::doc(
            r#"<main><div class="message user">  </div><div class="message user">hi</div></main>"#,
        );
        let provider = Provider::Dev(DevAdapter::new());
        let root = provider.locate_root(&d).unwrap();
        let turns = provider.extract_turns(&d, root);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].text, "hi");
    }
}
