// ABOUTME: Schema.org structured data extraction (JSON-LD, microdata, RDFa).
// ABOUTME: Normalizes every source into SchemaRecord values and picks the primary one by type priority.

//! Structured data extraction.
//!
//! Sources are consulted in order: JSON-LD, then microdata, then RDFa. Within
//! a source, the primary record is chosen by type family (article types, then
//! product/review, then video, then generic page types). If no object in the
//! source has a priority type, the first object carrying any `@type` wins.

pub mod jsonld;
pub mod microdata;

use serde_json::{Map, Value};

use crate::dom::ParsedDocument;

/// Where a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaSource {
    JsonLd,
    Microdata,
    Rdfa,
}

/// Priority groups used when several objects are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SchemaFamily {
    Article,
    Product,
    Video,
    Generic,
}

pub(crate) const ARTICLE_TYPES: &[&str] = &[
    "Article",
    "NewsArticle",
    "BlogPosting",
    "TechArticle",
    "ScholarlyArticle",
    "Report",
    "AnalysisNewsArticle",
    "OpinionNewsArticle",
    "ReportageNewsArticle",
    "ReviewNewsArticle",
    "LiveBlogPosting",
    "SocialMediaPosting",
    "DiscussionForumPosting",
];

pub(crate) const PRODUCT_TYPES: &[&str] =
    &["Product", "ProductGroup", "IndividualProduct", "ProductModel"];

const REVIEW_TYPES: &[&str] = &["Review", "AggregateRating"];

pub(crate) const VIDEO_TYPES: &[&str] = &[
    "VideoObject",
    "Movie",
    "TVEpisode",
    "Episode",
    "Clip",
    "MusicVideoObject",
];

const GENERIC_TYPES: &[&str] = &[
    "Person",
    "Organization",
    "Event",
    "WebPage",
    "WebSite",
    "Recipe",
    "Place",
    "LocalBusiness",
    "ImageGallery",
    "CollectionPage",
    "CreativeWork",
];

/// Family of a single (normalized) type name.
pub fn family_of(type_name: &str) -> Option<SchemaFamily> {
    let eq = |list: &[&str]| list.iter().any(|t| t.eq_ignore_ascii_case(type_name));
    if eq(ARTICLE_TYPES) {
        Some(SchemaFamily::Article)
    } else if eq(PRODUCT_TYPES) || eq(REVIEW_TYPES) {
        Some(SchemaFamily::Product)
    } else if eq(VIDEO_TYPES) {
        Some(SchemaFamily::Video)
    } else if eq(GENERIC_TYPES) {
        Some(SchemaFamily::Generic)
    } else {
        None
    }
}

/// Strip vocabulary prefixes: `http://schema.org/Product`, `schema:Product` -> `Product`.
pub fn normalize_type(raw: &str) -> String {
    let raw = raw.trim().trim_end_matches('/');
    let tail = raw.rsplit(['/', '#']).next().unwrap_or(raw);
    tail.rsplit(':').next().unwrap_or(tail).to_string()
}

/// Normalized `@type` values of a JSON object.
pub(crate) fn types_of(map: &Map<String, Value>) -> Vec<String> {
    match map.get("@type") {
        Some(Value::String(s)) => s.split_whitespace().map(normalize_type).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(normalize_type)
            .collect(),
        _ => Vec::new(),
    }
}

/// One normalized structured-data object.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaRecord {
    properties: Map<String, Value>,
    source: SchemaSource,
}

impl SchemaRecord {
    pub fn new(properties: Map<String, Value>, source: SchemaSource) -> Self {
        Self { properties, source }
    }

    pub fn source(&self) -> SchemaSource {
        self.source
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// All normalized types.
    pub fn types(&self) -> Vec<String> {
        types_of(&self.properties)
    }

    /// The first normalized type.
    pub fn schema_type(&self) -> Option<String> {
        self.types().into_iter().next()
    }

    /// Whether any of the record's types equals one of `names`.
    pub fn is_any_type(&self, names: &[&str]) -> bool {
        self.types()
            .iter()
            .any(|t| names.iter().any(|n| n.eq_ignore_ascii_case(t)))
    }

    /// Best (lowest) family across the record's types.
    pub fn family(&self) -> Option<SchemaFamily> {
        self.types().iter().filter_map(|t| family_of(t)).min()
    }

    pub fn is_article(&self) -> bool {
        self.is_any_type(ARTICLE_TYPES)
    }

    pub fn is_product(&self) -> bool {
        self.is_any_type(PRODUCT_TYPES)
    }

    pub fn is_video(&self) -> bool {
        self.is_any_type(VIDEO_TYPES)
    }

    /// Raw property value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Walk a property path. Arrays are entered through their first element.
    pub fn value_at(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = first_of(self.properties.get(*first)?);
        for key in rest {
            current = first_of(current.as_object()?.get(*key)?);
        }
        Some(current)
    }

    /// Scalar text at a property path (strings trimmed, numbers stringified).
    pub fn text_at(&self, path: &[&str]) -> Option<String> {
        value_text(self.value_at(path)?)
    }

    /// First non-empty text among several paths.
    pub fn first_text(&self, paths: &[&[&str]]) -> Option<String> {
        paths.iter().find_map(|p| self.text_at(p))
    }
}

fn first_of(value: &Value) -> &Value {
    match value {
        Value::Array(items) => items.first().unwrap_or(value),
        _ => value,
    }
}

/// Text form of a scalar-ish JSON value.
///
/// Objects yield their `@value`, `name`, `url` or `@id`, in that order.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => items.iter().find_map(value_text),
        Value::Object(map) => ["@value", "name", "url", "@id"]
            .iter()
            .find_map(|k| map.get(*k).and_then(value_text)),
        Value::Null => None,
    }
}

/// Every structured-data object on a page, in source order.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    records: Vec<SchemaRecord>,
}

impl SchemaSet {
    /// Collect records from all three sources.
    pub fn collect(doc: &ParsedDocument) -> Self {
        let mut records = Vec::new();
        records.extend(
            jsonld::extract_json_ld(doc)
                .into_iter()
                .map(|m| SchemaRecord::new(m, SchemaSource::JsonLd)),
        );
        records.extend(
            microdata::extract_microdata(doc)
                .into_iter()
                .map(|m| SchemaRecord::new(m, SchemaSource::Microdata)),
        );
        records.extend(
            microdata::extract_rdfa(doc)
                .into_iter()
                .map(|m| SchemaRecord::new(m, SchemaSource::Rdfa)),
        );
        Self { records }
    }

    pub fn records(&self) -> &[SchemaRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The primary record: first source with any typed object, then type priority.
    pub fn primary(&self) -> Option<&SchemaRecord> {
        [SchemaSource::JsonLd, SchemaSource::Microdata, SchemaSource::Rdfa]
            .into_iter()
            .find_map(|source| {
                select_by_priority(self.records.iter().filter(|r| r.source == source))
            })
    }

    /// First record, or nested object, whose type is one of `names`.
    pub fn find(&self, names: &[&str]) -> Option<SchemaRecord> {
        for record in &self.records {
            if record.is_any_type(names) {
                return Some(record.clone());
            }
        }
        self.records.iter().find_map(|record| {
            find_nested(&record.properties, names, 0)
                .map(|map| SchemaRecord::new(map.clone(), record.source))
        })
    }
}

const MAX_NESTED_DEPTH: usize = 4;

fn find_nested<'a>(
    map: &'a Map<String, Value>,
    names: &[&str],
    depth: usize,
) -> Option<&'a Map<String, Value>> {
    if depth >= MAX_NESTED_DEPTH {
        return None;
    }
    for value in map.values() {
        let candidates: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for candidate in candidates {
            let Some(obj) = candidate.as_object() else {
                continue;
            };
            let types = types_of(obj);
            if types
                .iter()
                .any(|t| names.iter().any(|n| n.eq_ignore_ascii_case(t)))
            {
                return Some(obj);
            }
            if let Some(found) = find_nested(obj, names, depth + 1) {
                return Some(found);
            }
        }
    }
    None
}

/// Pick the record of the best family; ties keep document order.
/// Falls back to the first record that has any `@type`.
pub fn select_by_priority<'a, I>(records: I) -> Option<&'a SchemaRecord>
where
    I: IntoIterator<Item = &'a SchemaRecord>,
{
    let mut best: Option<(&SchemaRecord, SchemaFamily)> = None;
    let mut first_typed: Option<&SchemaRecord> = None;

    for record in records {
        if record.types().is_empty() {
            continue;
        }
        first_typed.get_or_insert(record);
        if let Some(family) = record.family() {
            match best {
                Some((_, top)) if family >= top => {}
                _ => best = Some((record, family)),
            }
        }
    }

    best.map(|(r, _)| r).or(first_typed)
}

/// The single normalized structured-data record for a page, if any.
pub fn extract_schema(doc: &ParsedDocument) -> Option<SchemaRecord> {
    SchemaSet::collect(doc).primary().cloned()
}
