use ego_tree::NodeRef;
use scraper::node::Element;
use scraper::Node;

/// Elements that never render.
const HIDDEN_TAGS: &[&str] = &[
    "head", "script", "style", "template", "noscript", "title", "meta", "link",
];

/// Elements that flow into their parent's paragraph instead of starting a block.
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "button", "cite", "code", "data", "dfn", "em", "i",
    "img", "input", "kbd", "label", "mark", "q", "s", "samp", "select", "small", "span",
    "strong", "sub", "sup", "svg", "textarea", "time", "u", "var", "wbr",
];

pub(crate) fn is_hidden(el: &Element) -> bool {
    HIDDEN_TAGS.contains(&el.name()) || el.attr("hidden").is_some()
}

pub(crate) fn is_inline_node(node: NodeRef<'_, Node>) -> bool {
    match node.value() {
        Node::Text(_) => true,
        Node::Element(el) => !is_hidden(el) && INLINE_TAGS.contains(&el.name()),
        _ => false,
    }
}

/// Rendered text of a subtree, approximating the browser's `innerText`:
/// hidden subtrees are skipped, blocks and `<br>` break lines, whitespace
/// collapses, blank lines are dropped.
pub(crate) fn inner_text(node: NodeRef<'_, Node>) -> String {
    run_lines(&[node]).join("\n")
}

/// Text of a run of sibling nodes, split into rendered lines.
pub(crate) fn run_lines(nodes: &[NodeRef<'_, Node>]) -> Vec<String> {
    let mut raw = String::new();
    for node in nodes {
        collect(*node, &mut raw);
    }
    raw.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn collect(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => push_collapsed(text, out),
        Node::Element(el) => {
            if is_hidden(el) {
                return;
            }
            if el.name() == "br" {
                out.push('\n');
                return;
            }
            let block = !INLINE_TAGS.contains(&el.name());
            if el.name() == "pre" {
                out.push('\n');
                for child in node.descendants() {
                    if let Node::Text(text) = child.value() {
                        out.push_str(text);
                    }
                }
                out.push('\n');
                return;
            }
            if block {
                out.push('\n');
            }
            for child in node.children() {
                collect(child, out);
            }
            if block {
                out.push('\n');
            }
        }
        Node::Document | Node::Fragment => {
            for child in node.children() {
                collect(child, out);
            }
        }
        _ => {}
    }
}

fn push_collapsed(text: &str, out: &mut String) {
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !matches!(out.chars().last(), None | Some(' ') | Some('\n')) {
                out.push(' ');
            }
        } else {
            out.push(ch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn text_of(html: &str, css: &str) -> String {
        let doc = Html::parse_document(html);
        let el = doc.select(&Selector::parse(css).unwrap()).next().unwrap();
        inner_text(*el)
    }

    #[test]
    fn blocks_break_lines_and_inline_flows() {
        let text = text_of(
            "<div id=m><p>Hello <b>big</b>   world</p><p>second</p></div>",
            "#m",
        );
        assert_eq!(text, "Hello big world\nsecond");
    }

    #[test]
    fn hidden_subtrees_are_skipped() {
        let text = text_of(
            "<div id=m>shown<script>var x = 1;</script><span hidden>gone</span></div>",
            "#m",
        );
        assert_eq!(text, "shown");
    }

    #[test]
    fn br_breaks_line() {
        assert_eq!(text_of("<p id=m>one<br>two</p>", "#m"), "one\ntwo");
    }

    #[test]
    fn pre_keeps_its_lines() {
        let text = text_of("<div id=m><pre>fn a() {}\nfn b() {}</pre></div>", "#m");
        assert_eq!(text, "fn a() {}\nfn b() {}");
    }

    #[test]
    fn run_lines_splits_inline_run() {
        let doc = Html::parse_document("<p id=m>alpha <i>beta</i><br>gamma</p>");
        let p = doc.select(&Selector::parse("#m").unwrap()).next().unwrap();
        let children: Vec<_> = p.children().collect();
        assert_eq!(run_lines(&children), vec!["alpha beta", "gamma"]);
    }
}
