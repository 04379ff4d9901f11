// ABOUTME: JSON-LD script block scanning with sanitization of real-world malformed JSON.
// ABOUTME: Flattens bare objects, arrays and @graph wrappers into typed JSON objects.

use serde_json::{Map, Value};
use tracing::debug;

use crate::dom::ParsedDocument;
use crate::error::PreviewError;

const JSON_LD_SELECTOR: &str = "script[type='application/ld+json'], script[type='application/ld+json; charset=utf-8']";

/// Remove control characters that real pages leak into JSON-LD.
///
/// Strips U+0000..U+001F except tab, newline and carriage return, and
/// U+007F..U+009F.
pub fn strip_control_chars(raw: &str) -> String {
    raw.chars()
        .filter(|&c| {
            let code = c as u32;
            let c0 = code <= 0x1F && !matches!(c, '\t' | '\n' | '\r');
            let c1 = (0x7F..=0x9F).contains(&code);
            !(c0 || c1)
        })
        .collect()
}

/// Collapse doubled escape characters (`\\"` emitted by double-encoding CMSs).
pub fn collapse_double_escapes(raw: &str) -> String {
    raw.replace("\\\\", "\\")
}

/// Parse one JSON-LD block, retrying with progressively looser repairs.
pub fn parse_block(raw: &str) -> Result<Value, PreviewError> {
    let cleaned = strip_control_chars(raw.trim());
    let first_err = match serde_json::from_str::<Value>(&cleaned) {
        Ok(v) => return Ok(v),
        Err(e) => e,
    };

    let collapsed = collapse_double_escapes(&cleaned);
    if let Ok(v) = serde_json::from_str::<Value>(&collapsed) {
        return Ok(v);
    }

    // Raw line breaks and tabs inside string literals are invalid JSON.
    let flattened: String = cleaned
        .chars()
        .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
        .collect();
    serde_json::from_str::<Value>(&flattened).map_err(|_| {
        PreviewError::schema_parse("", "JsonLd", Some(anyhow::Error::new(first_err)))
    })
}

/// Push every typed object from one parsed block.
pub fn collect_objects(value: Value, out: &mut Vec<Map<String, Value>>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_objects(item, out);
            }
        }
        Value::Object(mut map) => {
            let graph = map.remove("@graph");
            if !super::types_of(&map).is_empty() {
                out.push(map);
            }
            if let Some(graph) = graph {
                collect_objects(graph, out);
            }
        }
        _ => {}
    }
}

/// All typed JSON-LD objects on the page, in document order.
///
/// A block that cannot be parsed is skipped; the scan continues.
pub fn extract_json_ld(doc: &ParsedDocument) -> Vec<Map<String, Value>> {
    let mut out = Vec::new();
    for (index, script) in doc.select(JSON_LD_SELECTOR).into_iter().enumerate() {
        let text = script.text().collect::<String>();
        if text.trim().is_empty() {
            continue;
        }
        match parse_block(&text) {
            Ok(value) => collect_objects(value, &mut out),
            Err(e) => debug!(block = index, error = %e, "skipping invalid JSON-LD block"),
        }
    }
    out
}
