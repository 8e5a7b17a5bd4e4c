//! Line-based block layout.
//!
//! Every wrapped text line is one `line_height` tall. Blocks stack, inline
//! content flows into the enclosing block's paragraph. Positions are in pixels
//! measured from the top of the document content, before any scrolling.

use std::collections::HashMap;

use ego_tree::{NodeId, NodeRef};
use scraper::{Html, Node};

use super::text::{is_hidden, is_inline_node, run_lines};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutBox {
    pub top: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Text,
    Heading(u8),
    Code,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLine {
    pub text: String,
    pub kind: LineKind,
}

#[derive(Debug, Clone, Default)]
pub struct Layout {
    boxes: HashMap<NodeId, LayoutBox>,
    lines: Vec<LayoutLine>,
    line_height: f64,
}

impl Layout {
    pub fn compute(html: &Html, width: usize, line_height: f64) -> Self {
        let mut builder = Builder {
            boxes: HashMap::new(),
            lines: Vec::new(),
            width: width.max(1),
            line_height,
        };
        builder.block(html.tree.root(), LineKind::Text);
        Self {
            boxes: builder.boxes,
            lines: builder.lines,
            line_height,
        }
    }

    pub fn get(&self, id: NodeId) -> Option<LayoutBox> {
        self.boxes.get(&id).copied()
    }

    pub fn lines(&self) -> &[LayoutLine] {
        &self.lines
    }

    pub fn line_height(&self) -> f64 {
        self.line_height
    }

    pub fn content_height(&self) -> f64 {
        self.lines.len() as f64 * self.line_height
    }
}

struct Builder {
    boxes: HashMap<NodeId, LayoutBox>,
    lines: Vec<LayoutLine>,
    width: usize,
    line_height: f64,
}

impl Builder {
    fn block(&mut self, node: NodeRef<'_, Node>, kind: LineKind) {
        let start = self.lines.len();
        let mut run: Vec<NodeRef<'_, Node>> = Vec::new();
        for child in node.children() {
            if is_inline_node(child) {
                run.push(child);
                continue;
            }
            self.flush_run(&mut run, kind);
            if let Node::Element(el) = child.value() {
                if !is_hidden(el) {
                    self.block(child, kind_for(el.name(), kind));
                }
            }
        }
        self.flush_run(&mut run, kind);
        self.place(node.id(), start, self.lines.len());
    }

    fn flush_run(&mut self, run: &mut Vec<NodeRef<'_, Node>>, kind: LineKind) {
        if run.is_empty() {
            return;
        }
        let start = self.lines.len();
        for line in run_lines(run) {
            for wrapped in wrap(&line, self.width) {
                self.lines.push(LayoutLine { text: wrapped, kind });
            }
        }
        let end = self.lines.len();
        for node in run.drain(..) {
            for descendant in node.descendants() {
                if descendant.value().is_element() {
                    self.place(descendant.id(), start, end);
                }
            }
        }
    }

    fn place(&mut self, id: NodeId, start: usize, end: usize) {
        self.boxes.insert(
            id,
            LayoutBox {
                top: start as f64 * self.line_height,
                height: (end - start) as f64 * self.line_height,
            },
        );
    }
}

fn kind_for(tag: &str, inherited: LineKind) -> LineKind {
    match tag.as_bytes() {
        [b'h', level @ b'1'..=b'6'] => LineKind::Heading(level - b'0'),
        b"pre" => LineKind::Code,
        _ => inherited,
    }
}

/// Word wrap measured in chars; words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if current_len > 0 {
                out.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(width);
            out.push(word.into_iter().collect());
            word = rest;
        }
        if word.is_empty() {
            continue;
        }
        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > width {
            out.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }
    if current_len > 0 {
        out.push(current);
    }
    out
}
