// ABOUTME: DOM cleaners that strip boilerplate from a selected content subtree.
// ABOUTME: Removes unsafe/structural tags, boilerplate blocks, event handlers, comments and empty nodes.

use std::collections::HashSet;

use ego_tree::iter::Edge;
use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Html, Node};

use super::scoring::is_boilerplate;
use super::{escape_attr, escape_text, is_void_element, matches, select_within};

/// Tags removed outright from extracted content.
const STRIP_TAGS: &str = "script, style, noscript, form, iframe, nav, object, embed, link, meta";

/// Containers removed when they end up with no text and no media.
const EMPTY_CANDIDATES: &[&str] = &["p", "div", "span"];

/// Media that keeps an otherwise empty container alive.
const MEDIA_TAGS: &[&str] = &["img", "picture", "video", "audio", "svg", "source"];

/// Clean a content subtree and return its serialized HTML.
///
/// The root element itself is always kept; its descendants are filtered.
pub fn clean_subtree(root: ElementRef) -> String {
    let mut skip = HashSet::new();
    mark_stripped(&root, &mut skip);
    let first_pass = serialize_filtered(root, &skip);

    // Emptiness must be judged after removals, so re-parse the reduced tree.
    let fragment = Html::parse_fragment(&first_pass);
    let mut empty = HashSet::new();
    mark_empty(&fragment, &mut empty);

    serialize_filtered(fragment.root_element(), &empty)
}

/// Mark unwanted tags and boilerplate blocks below `root`.
fn mark_stripped(root: &ElementRef, skip: &mut HashSet<NodeId>) {
    for el in select_within(root, "*") {
        if el.id() == root.id() {
            continue;
        }
        if matches(&el, STRIP_TAGS) || is_boilerplate(&el) {
            skip.insert(el.id());
        }
    }
}

/// Mark containers with no remaining text and no media.
///
/// One post-order pass: a node has content when it is non-blank text, a media
/// element, or has a child with content.
fn mark_empty(fragment: &Html, skip: &mut HashSet<NodeId>) {
    let mut has_content: HashSet<NodeId> = HashSet::new();
    for edge in fragment.tree.root().traverse() {
        let Edge::Close(node) = edge else {
            continue;
        };
        let content = match node.value() {
            Node::Text(t) => !t.trim().is_empty(),
            Node::Element(el) => {
                MEDIA_TAGS.contains(&el.name())
                    || node.children().any(|c| has_content.contains(&c.id()))
            }
            _ => false,
        };
        if content {
            has_content.insert(node.id());
            continue;
        }
        let is_candidate = ElementRef::wrap(node)
            .is_some_and(|el| EMPTY_CANDIDATES.contains(&el.value().name()));
        if is_candidate {
            skip.insert(node.id());
        }
    }
}

/// Serialize `root` (inclusive) skipping marked nodes.
fn serialize_filtered(root: ElementRef, skip: &HashSet<NodeId>) -> String {
    let mut out = String::new();
    serialize_node(*root, skip, &mut out);
    out
}

/// Walks open/close edges instead of recursing, so nesting depth is unbounded.
fn serialize_node(node: NodeRef<Node>, skip: &HashSet<NodeId>, out: &mut String) {
    let mut skipping: Option<NodeId> = None;
    for edge in node.traverse() {
        match edge {
            Edge::Open(n) => {
                if skipping.is_some() {
                    continue;
                }
                if skip.contains(&n.id()) {
                    skipping = Some(n.id());
                    continue;
                }
                open_tag(n.value(), out);
            }
            Edge::Close(n) => match skipping {
                Some(id) if id == n.id() => skipping = None,
                Some(_) => {}
                None => close_tag(n.value(), out),
            },
        }
    }
}

fn open_tag(node: &Node, out: &mut String) {
    match node {
        Node::Text(t) => out.push_str(&escape_text(t)),
        // The fragment parser wraps content in a synthetic <html> root.
        Node::Element(el) if el.name() != "html" => {
            out.push('<');
            out.push_str(el.name());
            for (k, v) in el.attrs() {
                if is_event_handler(k) {
                    continue;
                }
                out.push(' ');
                out.push_str(k);
                out.push_str("=\"");
                out.push_str(&escape_attr(v));
                out.push('"');
            }
            if is_void_element(el.name()) {
                out.push_str(" />");
            } else {
                out.push('>');
            }
        }
        // Comments, doctypes and processing instructions are dropped.
        _ => {}
    }
}

fn close_tag(node: &Node, out: &mut String) {
    if let Node::Element(el) = node {
        if el.name() != "html" && !is_void_element(el.name()) {
            out.push_str("</");
            out.push_str(el.name());
            out.push('>');
        }
    }
}

/// Inline handlers such as `onclick`/`onload`.
fn is_event_handler(attr: &str) -> bool {
    attr.len() > 2
        && attr
            .get(..2)
            .map_or(false, |prefix| prefix.eq_ignore_ascii_case("on"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ParsedDocument;

    fn clean(html: &str) -> String {
        let doc = ParsedDocument::parse(html).unwrap();
        let root = doc.select_first("#root").unwrap();
        clean_subtree(root)
    }

    #[test]
    fn test_strips_unsafe_tags() {
        let out = clean(
            r#"<div id="root"><p>Keep me</p><script>alert(1)</script><style>p{}</style>
               <form><input></form><iframe src="x"></iframe><nav>links</nav></div>"#,
        );
        assert!(out.contains("Keep me"));
        assert!(!out.contains("alert"));
        assert!(!out.contains("<style"));
        assert!(!out.contains("<form"));
        assert!(!out.contains("<iframe"));
        assert!(!out.contains("links"));
    }

    #[test]
    fn test_strips_boilerplate_classes() {
        let out = clean(
            r#"<div id="root"><p>Body</p><div class="share-buttons">Share</div><div class="related">More</div></div>"#,
        );
        assert!(out.contains("Body"));
        assert!(!out.contains("Share"));
        assert!(!out.contains("More"));
    }

    #[test]
    fn test_strips_event_handlers_and_comments() {
        let out = clean(r#"<div id="root"><p onclick="evil()" class="lead">Text<!-- hidden --></p></div>"#);
        assert!(!out.contains("onclick"));
        assert!(!out.contains("hidden"));
        assert!(out.contains(r#"class="lead""#));
    }

    #[test]
    fn test_removes_empty_containers_but_keeps_media() {
        let out = clean(
            r#"<div id="root"><p>   </p><span></span><div><script>x()</script></div><p><img src="a.jpg"></p><p>Text</p></div>"#,
        );
        assert_eq!(out.matches("<p").count(), 2);
        assert!(!out.contains("<span"));
        assert!(out.contains("a.jpg"));
    }

    #[test]
    fn test_deep_nesting_is_serialized_without_recursion() {
        let depth = 10_000;
        let html = format!(
            r#"<div id="root">{}<p>Deep text</p><span></span>{}</div>"#,
            "<div>".repeat(depth),
            "</div>".repeat(depth)
        );
        let out = clean(&html);
        assert!(out.contains("<p>Deep text</p>"));
        assert!(!out.contains("<span"));
        assert_eq!(out.matches("<div").count(), depth + 1);
        assert_eq!(out.matches("</div>").count(), depth + 1);
    }

    #[test]
    fn test_text_is_escaped() {
        let out = clean(r#"<div id="root"><p>1 &lt; 2 &amp; 3</p></div>"#);
        assert!(out.contains("1 &lt; 2 &amp; 3"));
    }
}
