//! Navigation index: sorted, filtered, searchable outline of the turns.
//!
//! The index is rebuilt from scratch on every refresh. Target ids are
//! positional (`nav-target-<n>`, `<turn id>-h-<m>`) and are not stable across
//! rebuilds.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::stars::StarStore;
use crate::dom::{Document, ElementHandle};
use crate::turn::{self, Role, Turn};

const SNIPPET_BEFORE: usize = 10;
const SNIPPET_AFTER: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewLevel {
    #[serde(rename = "prompts")]
    PromptsOnly,
    #[default]
    All,
    #[serde(rename = "stars")]
    StarredOnly,
}

impl ViewLevel {
    pub const ALL: [ViewLevel; 3] = [ViewLevel::PromptsOnly, ViewLevel::All, ViewLevel::StarredOnly];

    pub fn label(self) -> &'static str {
        match self {
            ViewLevel::PromptsOnly => "Prompts",
            ViewLevel::All => "All",
            ViewLevel::StarredOnly => "Stars",
        }
    }

    pub fn admits(self, role: Role, starred: bool) -> bool {
        match self {
            ViewLevel::PromptsOnly => role == Role::User || starred,
            ViewLevel::All => true,
            ViewLevel::StarredOnly => starred,
        }
    }

    /// One step toward Prompts; stays put at the end.
    pub fn previous(self) -> Self {
        match self {
            ViewLevel::PromptsOnly | ViewLevel::All => ViewLevel::PromptsOnly,
            ViewLevel::StarredOnly => ViewLevel::All,
        }
    }

    /// One step toward Stars; stays put at the end.
    pub fn next(self) -> Self {
        match self {
            ViewLevel::PromptsOnly => ViewLevel::All,
            ViewLevel::All | ViewLevel::StarredOnly => ViewLevel::StarredOnly,
        }
    }
}

/// An addressable scroll destination.
#[derive(Debug, Clone, PartialEq)]
pub struct NavTarget {
    pub id: String,
    pub element: ElementHandle,
}

/// What a target points at, independent of its positional id. Survives a
/// rebuild as long as the turn (and heading) do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetKey {
    signature: String,
    heading: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavHeading {
    pub id: String,
    pub text: String,
    pub level: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavEntry {
    pub id: String,
    pub role: Role,
    pub signature: String,
    pub starred: bool,
    /// Cleaned, shortened text, or a search snippet when `snippet` is set.
    pub label: String,
    pub snippet: bool,
    #[serde(skip)]
    pub text: String,
    pub headings: Vec<NavHeading>,
}

/// Inputs that decide which turns survive a build.
#[derive(Debug, Clone, Copy)]
pub struct Filter<'a> {
    pub view: ViewLevel,
    pub search: &'a str,
    pub stars: &'a StarStore,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct NavIndex {
    entries: Vec<NavEntry>,
    #[serde(skip)]
    targets: Vec<NavTarget>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
    turn_count: usize,
}

impl NavIndex {
    pub fn build(doc: &Document, mut turns: Vec<Turn>, filter: Filter<'_>) -> Self {
        // Extraction order is not document order.
        turns.sort_by(|a, b| compare_position(doc, a.element, b.element));

        let term = filter.search.trim().to_lowercase();
        let searching = !term.is_empty();
        let show_headings = filter.view == ViewLevel::All || searching;

        let mut index = NavIndex {
            turn_count: turns.len(),
            ..Default::default()
        };

        for (position, turn) in turns.into_iter().enumerate() {
            let signature = turn.signature();
            let starred = filter.stars.contains(&signature);
            if !filter.view.admits(turn.role, starred) {
                continue;
            }

            let lower = turn.text.to_lowercase();
            let body_match = searching && lower.contains(&term);
            let shown_headings: Vec<_> = turn
                .headings
                .iter()
                .filter(|h| !searching || h.text.to_lowercase().contains(&term))
                .collect();
            if searching && !body_match && shown_headings.is_empty() {
                continue;
            }

            let id = format!("nav-target-{position}");
            index.push_target(&id, turn.element);

            let mut headings = Vec::new();
            if show_headings {
                for (h_index, heading) in shown_headings.into_iter().enumerate() {
                    let h_id = format!("{id}-h-{h_index}");
                    index.push_target(&h_id, heading.element);
                    headings.push(NavHeading {
                        id: h_id,
                        text: heading.text.clone(),
                        level: heading.level,
                    });
                }
            }

            let (label, snippet) = if body_match {
                (snippet_around(&turn.text, &lower, &term), true)
            } else {
                (turn::label(&turn.text), false)
            };

            index.entries.push(NavEntry {
                id,
                role: turn.role,
                signature,
                starred,
                label,
                snippet,
                text: turn.text,
                headings,
            });
        }
        index
    }

    fn push_target(&mut self, id: &str, element: ElementHandle) {
        self.positions.insert(id.to_string(), self.targets.len());
        self.targets.push(NavTarget { id: id.to_string(), element });
    }

    pub fn entries(&self) -> &[NavEntry] {
        &self.entries
    }

    /// Focus sequence: every rendered target in display order.
    pub fn targets(&self) -> &[NavTarget] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Turns seen before filtering.
    pub fn turn_count(&self) -> usize {
        self.turn_count
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn id_at(&self, position: usize) -> Option<&str> {
        self.targets.get(position).map(|t| t.id.as_str())
    }

    pub fn target(&self, id: &str) -> Option<ElementHandle> {
        self.position(id).map(|p| self.targets[p].element)
    }

    /// The turn entry that owns `id` (the turn itself or one of its headings).
    pub fn entry_for(&self, id: &str) -> Option<&NavEntry> {
        self.entries
            .iter()
            .find(|e| e.id == id || e.headings.iter().any(|h| h.id == id))
    }

    pub fn key_of(&self, id: &str) -> Option<TargetKey> {
        let entry = self.entry_for(id)?;
        let heading = entry
            .headings
            .iter()
            .find(|h| h.id == id)
            .map(|h| h.text.clone());
        Some(TargetKey { signature: entry.signature.clone(), heading })
    }

    /// Current id of the target `key` named in an earlier build.
    pub fn find(&self, key: &TargetKey) -> Option<&str> {
        let entry = self.entries.iter().find(|e| e.signature == key.signature)?;
        match &key.heading {
            None => Some(&entry.id),
            Some(text) => entry
                .headings
                .iter()
                .find(|h| &h.text == text)
                .map(|h| h.id.as_str()),
        }
    }
}

fn compare_position(doc: &Document, a: ElementHandle, b: ElementHandle) -> Ordering {
    let a = doc.position(a).unwrap_or(usize::MAX);
    let b = doc.position(b).unwrap_or(usize::MAX);
    a.cmp(&b)
}

/// `...` + 10 chars before the first match through 30 chars after its start + `...`.
fn snippet_around(text: &str, lower: &str, term: &str) -> String {
    let Some(byte_offset) = lower.find(term) else {
        return turn::label(text);
    };
    let at = lower[..byte_offset].chars().count();
    // Lowercasing can change the char count; fall back to the lowered text then.
    let source: Vec<char> = if text.chars().count() == lower.chars().count() {
        text.chars().collect()
    } else {
        lower.chars().collect()
    };
    let start = at.saturating_sub(SNIPPET_BEFORE);
    let end = (at + SNIPPET_AFTER).min(source.len());
    let window: String = source[start..end]
        .iter()
        .map(|c| if c.is_whitespace() { ' ' } else { *c })
        .collect();
    format!("...{window}...")
}
