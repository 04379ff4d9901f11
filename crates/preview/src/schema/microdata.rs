// ABOUTME: Microdata (itemscope/itemprop) and RDFa (typeof/property) readers.
// ABOUTME: Both attribute dialects are walked by one item parser into JSON objects.

use ego_tree::NodeRef;
use scraper::{ElementRef, Node};
use serde_json::{Map, Value};

use super::normalize_type;
use crate::dom::{attr_value, element_text, has_ancestor, ParsedDocument};

/// Attribute names of an item-annotation dialect.
struct Dialect {
    /// Attribute that opens a new item.
    scope: &'static str,
    /// Attribute naming a property of the enclosing item.
    prop: &'static str,
    /// Attribute carrying the item type.
    type_attr: &'static str,
}

const MICRODATA: Dialect = Dialect {
    scope: "itemscope",
    prop: "itemprop",
    type_attr: "itemtype",
};

/// Items nested deeper than this are read as plain property values.
const MAX_ITEM_DEPTH: usize = 16;

const RDFA: Dialect = Dialect {
    scope: "typeof",
    prop: "property",
    type_attr: "typeof",
};

/// Top-level microdata items (those not nested in another `itemscope`).
pub fn extract_microdata(doc: &ParsedDocument) -> Vec<Map<String, Value>> {
    extract_items(doc, &MICRODATA)
}

/// Top-level RDFa resources (those not nested in another `typeof`).
pub fn extract_rdfa(doc: &ParsedDocument) -> Vec<Map<String, Value>> {
    extract_items(doc, &RDFA)
}

fn extract_items(doc: &ParsedDocument, dialect: &Dialect) -> Vec<Map<String, Value>> {
    let selector = format!("[{}]", dialect.scope);
    doc.select(&selector)
        .into_iter()
        .filter(|el| !has_ancestor(el, |a| a.value().attr(dialect.scope).is_some()))
        .map(|el| parse_item(&el, dialect, 0))
        .filter(|item| !item.is_empty())
        .collect()
}

fn parse_item(element: &ElementRef, dialect: &Dialect, depth: usize) -> Map<String, Value> {
    let mut item = Map::new();
    if let Some(types) = attr_value(element, dialect.type_attr) {
        let normalized: Vec<Value> = types
            .split_whitespace()
            .map(|t| Value::String(normalize_type(t)))
            .collect();
        match normalized.len() {
            0 => {}
            1 => {
                item.insert("@type".into(), normalized[0].clone());
            }
            _ => {
                item.insert("@type".into(), Value::Array(normalized));
            }
        }
    }
    collect_properties(**element, dialect, depth, &mut item);
    item
}

/// Walk descendants in document order, stopping at nested item boundaries.
fn collect_properties(
    node: NodeRef<Node>,
    dialect: &Dialect,
    depth: usize,
    item: &mut Map<String, Value>,
) {
    let mut pending: Vec<NodeRef<Node>> = node.children().rev().collect();
    while let Some(child) = pending.pop() {
        let Some(el) = ElementRef::wrap(child) else {
            continue;
        };
        let opens_item = el.value().attr(dialect.scope).is_some();

        if let Some(names) = attr_value(&el, dialect.prop) {
            let value = if opens_item && depth < MAX_ITEM_DEPTH {
                Value::Object(parse_item(&el, dialect, depth + 1))
            } else {
                property_value(&el)
            };
            for name in names.split_whitespace() {
                insert_repeated(item, &property_name(name), value.clone());
            }
        }

        if !opens_item {
            pending.extend(child.children().rev());
        }
    }
}

/// `og:title` / `schema:name` / full IRIs -> bare property name.
fn property_name(raw: &str) -> String {
    normalize_type(raw)
}

/// Repeated properties become arrays in document order.
fn insert_repeated(item: &mut Map<String, Value>, key: &str, value: Value) {
    match item.get_mut(key) {
        None => {
            item.insert(key.to_string(), value);
        }
        Some(Value::Array(existing)) => existing.push(value),
        Some(existing) => {
            let previous = existing.take();
            *existing = Value::Array(vec![previous, value]);
        }
    }
}

/// Value of a non-item property element, by tag.
fn property_value(el: &ElementRef) -> Value {
    if let Some(content) = attr_value(el, "content") {
        return Value::String(content);
    }
    let tag = el.value().name().to_ascii_lowercase();
    let attr = match tag.as_str() {
        "img" | "audio" | "video" | "source" | "embed" | "iframe" | "track" => Some("src"),
        "a" | "link" | "area" => Some("href"),
        "object" => Some("data"),
        "time" => Some("datetime"),
        "data" | "meter" => Some("value"),
        _ => None,
    };
    let from_attr = attr
        .and_then(|a| attr_value(el, a))
        .or_else(|| attr_value(el, "resource"));
    match from_attr {
        Some(v) => Value::String(v),
        None => Value::String(element_text(el)),
    }
}
