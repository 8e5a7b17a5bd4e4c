use serde::Serialize;

use crate::dom::ElementHandle;

const SIGNATURE_PREFIX_CHARS: usize = 100;
const LABEL_MAX_CHARS: usize = 50;
const LABEL_KEEP_CHARS: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A heading inside an assistant turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub text: String,
    pub level: u8,
    pub element: ElementHandle,
}

/// One message block of the conversation, as extracted from the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub element: ElementHandle,
    pub text: String,
    pub headings: Vec<Heading>,
}

impl Turn {
    /// Identity used for starring: role plus the leading cleaned text.
    ///
    /// Two turns with the same role and the same first 100 cleaned chars share
    /// a signature.
    pub fn signature(&self) -> String {
        signature(self.role, &self.text)
    }
}

pub fn signature(role: Role, text: &str) -> String {
    let prefix: String = clean_text(text).chars().take(SIGNATURE_PREFIX_CHARS).collect();
    format!("{}:{}", role.as_str(), prefix)
}

/// Trimmed text with markdown markers (`#`, `*`, backticks) removed and
/// whitespace collapsed.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.replace(['#', '*', '`'], ""))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Panel label for a turn: cleaned text, shortened to 48 chars plus an
/// ellipsis when longer than 50.
pub fn label(text: &str) -> String {
    let clean = clean_text(text);
    if clean.is_empty() {
        return "...".to_string();
    }
    if clean.chars().count() > LABEL_MAX_CHARS {
        let mut short: String = clean.chars().take(LABEL_KEEP_CHARS).collect();
        short.push_str("...");
        short
    } else {
        clean
    }
}
