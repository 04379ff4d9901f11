// ABOUTME: Generic field helpers shared by the type-specific extractors.
// ABOUTME: Meta/attribute/text lookups with fallback selectors, date and count parsing, URL resolution.

//! Generic field extraction utilities.
//!
//! Key behaviors:
//! - Selectors are tried in order; first non-empty match wins.
//! - Whitespace is normalized (collapsed to single spaces, trimmed).
//! - Empty strings are treated as no match.

use chrono::{DateTime, Utc};
use url::Url;

use crate::dom::ParsedDocument;

/// Extracts an attribute value from the first selector that yields a non-empty result.
pub fn extract_first_attr(doc: &ParsedDocument, selectors: &[&str], attr: &str) -> Option<String> {
    selectors.iter().find_map(|sel| doc.attr_of(sel, attr))
}

/// Extracts the `content` attribute from the first matching meta tag.
pub fn extract_meta_content(doc: &ParsedDocument, selector: &str) -> Option<String> {
    doc.attr_of(selector, "content")
}

/// Extracts text from the first selector that yields a non-empty match.
///
/// Meta tags (selectors starting with `meta[`) yield their `content` attribute;
/// other elements yield their normalized inner text.
pub fn extract_field_text_single(doc: &ParsedDocument, selectors: &[&str]) -> Option<String> {
    for &sel in selectors {
        let value = if sel.starts_with("meta[") {
            extract_meta_content(doc, sel)
        } else {
            doc.text_of(sel)
        };
        if value.is_some() {
            return value;
        }
    }
    None
}

/// Page description from meta tags.
pub fn extract_description(doc: &ParsedDocument) -> Option<String> {
    extract_first_attr(
        doc,
        &[
            "meta[name='description']",
            "meta[property='og:description']",
            "meta[name='twitter:description']",
            "meta[property='twitter:description']",
        ],
        "content",
    )
}

/// Site name from Open Graph or application metadata.
pub fn extract_site_name(doc: &ParsedDocument) -> Option<String> {
    extract_first_attr(
        doc,
        &[
            "meta[property='og:site_name']",
            "meta[name='application-name']",
        ],
        "content",
    )
}

/// Favicon URL resolved against `base_url`.
pub fn extract_favicon(doc: &ParsedDocument, base_url: &str) -> Option<String> {
    let raw = extract_first_attr(
        doc,
        &[
            "link[rel='icon']",
            "link[rel='shortcut icon']",
            "link[rel='apple-touch-icon']",
        ],
        "href",
    )?;
    resolve_url(&raw, base_url)
}

/// Resolves a possibly relative URL against a base URL.
/// Returns None if resolution fails or the input is empty.
pub fn resolve_url(raw: &str, base_url: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with("data:") {
        return Some(raw.to_string());
    }
    if let Ok(abs) = Url::parse(raw) {
        return matches!(abs.scheme(), "http" | "https").then(|| abs.to_string());
    }
    let base = Url::parse(base_url).ok()?;
    let resolved = base.join(raw).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// Lowercased host of a URL without a leading `www.`.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}

/// Parse a date string, trying RFC3339 first then falling back to dateparser.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // Loose date-only formats are read as UTC midnight to avoid local timezone shifts.
    const LOOSE_PATTERNS: &[&str] = &[
        "%Y-%m-%d", // 2024-01-05
        "%b %e, %Y", // Jan 5, 2024
        "%e %b %Y",  // 5 Jan 2024
        "%B %e, %Y", // January 5, 2024
        "%e %B %Y",  // 5 January 2024
    ];
    for pat in LOOSE_PATTERNS {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(s, pat) {
            let naive_dt = date.and_hms_opt(0, 0, 0)?;
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(naive_dt, Utc));
        }
    }

    dateparser::parse(s).ok().map(|dt| dt.with_timezone(&Utc))
}

/// Parse a human-formatted counter such as `"1,234"`, `"1.2K"` or `"3M likes"`.
pub fn parse_count(text: &str) -> Option<u64> {
    let text = text.trim();
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == ',' || c == '.'))
        .unwrap_or(rest.len());
    let number: f64 = rest[..end].replace(',', "").parse().ok()?;
    // A suffix only counts when it stands alone: "3M likes", not "5 bookmarks".
    let mut tail = rest[end..].trim_start().chars();
    let suffix = tail.next();
    let standalone = !tail.next().is_some_and(char::is_alphabetic);
    let multiplier = match suffix {
        Some('k' | 'K') if standalone => 1_000.0,
        Some('m' | 'M') if standalone => 1_000_000.0,
        Some('b' | 'B') if standalone => 1_000_000_000.0,
        _ => 1.0,
    };
    Some((number * multiplier).round() as u64)
}
