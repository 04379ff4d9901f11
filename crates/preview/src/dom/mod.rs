// ABOUTME: Document parsing and traversal helpers built on scraper's HTML tree.
// ABOUTME: Provides ParsedDocument with cached selector queries, text helpers and serialization.

//! DOM utilities for HTML document traversal.
//!
//! Every extraction stage works against [`ParsedDocument`], which wraps a
//! best-effort html5ever tree. Malformed markup never aborts parsing: the
//! parser's recoverable errors are counted and logged, and the repaired tree
//! is returned.

pub mod cleaners;
pub mod scoring;
pub mod selectors;

use scraper::{ElementRef, Html};
use tracing::debug;

use crate::error::PreviewError;
use selectors::get_or_compile;

/// A parsed HTML page owned by a single extraction run.
#[derive(Debug)]
pub struct ParsedDocument {
    html: Html,
    warnings: usize,
}

impl ParsedDocument {
    /// Parse raw HTML into a traversable tree.
    ///
    /// Fails only when the input has no content at all. Parser warnings are
    /// logged and the repaired tree is returned.
    pub fn parse(input: &str) -> Result<Self, PreviewError> {
        if input.trim().is_empty() {
            return Err(PreviewError::parse(
                "",
                "Parse",
                Some(anyhow::anyhow!("empty HTML input")),
            ));
        }

        let html = Html::parse_document(input);
        let warnings = html.errors.len();
        if warnings > 0 {
            debug!(warnings, "html parser recovered from malformed markup");
        }

        Ok(Self { html, warnings })
    }

    /// Number of recoverable parse errors html5ever reported.
    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    /// The underlying scraper document.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// The `<html>` element.
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// The `<body>` element, if the tree has one.
    pub fn body(&self) -> Option<ElementRef<'_>> {
        self.select_first("body")
    }

    /// All elements matching `css`. Invalid selectors match nothing.
    pub fn select(&self, css: &str) -> Vec<ElementRef<'_>> {
        match get_or_compile(css) {
            Some(sel) => self.html.select(&sel).collect(),
            None => Vec::new(),
        }
    }

    /// The first element matching `css`.
    pub fn select_first(&self, css: &str) -> Option<ElementRef<'_>> {
        let sel = get_or_compile(css)?;
        self.html.select(&sel).next()
    }

    /// Whether any element matches `css`.
    pub fn exists(&self, css: &str) -> bool {
        self.select_first(css).is_some()
    }

    /// Attribute of the first element matching `css` whose value is non-empty.
    pub fn attr_of(&self, css: &str, attr: &str) -> Option<String> {
        self.select(css).into_iter().find_map(|el| attr_value(&el, attr))
    }

    /// Normalized text of the first element matching `css` that has any text.
    pub fn text_of(&self, css: &str) -> Option<String> {
        self.select(css).into_iter().find_map(|el| {
            let text = element_text(&el);
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        })
    }
}

/// Elements inside `scope` matching `css`.
pub fn select_within<'a>(scope: &ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match get_or_compile(css) {
        Some(sel) => scope.select(&sel).collect(),
        None => Vec::new(),
    }
}

/// Whether `el` itself matches `css`.
pub fn matches(el: &ElementRef, css: &str) -> bool {
    get_or_compile(css).map(|sel| sel.matches(el)).unwrap_or(false)
}

/// Trimmed, non-empty attribute value.
pub fn attr_value(el: &ElementRef, attr: &str) -> Option<String> {
    let value = el.value().attr(attr)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Text content of an element with whitespace collapsed.
pub fn element_text(el: &ElementRef) -> String {
    normalize_spaces(&el.text().collect::<String>())
}

/// Character count of an element's normalized text.
pub fn text_len(el: &ElementRef) -> usize {
    element_text(el).chars().count()
}

/// Normalize whitespace in text.
pub fn normalize_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased `class` and `id` joined with a space.
pub fn class_and_id(el: &ElementRef) -> String {
    let class = el.value().attr("class").unwrap_or("");
    let id = el.value().attr("id").unwrap_or("");
    format!("{} {}", class, id).to_lowercase()
}

/// Element ancestors, nearest first.
pub fn ancestors<'a>(el: &ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.ancestors().filter_map(ElementRef::wrap)
}

/// Whether any ancestor satisfies `pred`.
pub fn has_ancestor<F>(el: &ElementRef, pred: F) -> bool
where
    F: Fn(&ElementRef) -> bool,
{
    ancestors(el).any(|a| pred(&a))
}

/// The next sibling that is an element.
pub fn next_element_sibling<'a>(el: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

/// Parse an integer-ish dimension attribute such as `width="640"` or `"640px"`.
pub fn dimension_attr(el: &ElementRef, attr: &str) -> Option<u32> {
    let raw = el.value().attr(attr)?.trim();
    let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

pub(crate) fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub(crate) fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub(crate) fn is_void_element(tag: &str) -> bool {
    matches!(
        tag.to_lowercase().as_str(),
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}
