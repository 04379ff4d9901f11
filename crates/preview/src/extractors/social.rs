// ABOUTME: Social post extraction: author, handle, publish date and interaction counts.
// ABOUTME: Reads schema interactionStatistic first, then platform meta tags and DOM counters.

use serde_json::Value;
use url::Url;

use super::fields::{extract_field_text_single, extract_first_attr, parse_count, parse_date};
use crate::classify::social_platform;
use crate::dom::ParsedDocument;
use crate::preview::{Interactions, SocialDetails};
use crate::schema::{normalize_type, value_text, SchemaRecord, SchemaSet};

const POST_TYPES: &[&str] = &[
    "SocialMediaPosting",
    "DiscussionForumPosting",
    "BlogPosting",
    "Comment",
    "VideoObject",
    "ImageObject",
];

const AUTHOR_SELECTORS: &[&str] = &[
    "[itemprop='author'] [itemprop='name']",
    "[data-testid='User-Name']",
    ".author-name",
    ".author",
    "meta[name='author']",
    "meta[property='article:author']",
];

const DATE_SELECTORS: &[&str] = &[
    "meta[property='article:published_time']",
    "meta[itemprop='datePublished']",
    "meta[property='og:updated_time']",
];

const LIKE_SELECTORS: &[&str] = &["[data-testid='like']", ".like-count", ".likes", ".reactions-count"];
const SHARE_SELECTORS: &[&str] = &["[data-testid='retweet']", ".share-count", ".shares", ".retweet-count"];
const COMMENT_SELECTORS: &[&str] = &["[data-testid='reply']", ".comment-count", ".comments-count", ".reply-count"];

/// Path segments that are never user handles.
const RESERVED_SEGMENTS: &[&str] = &[
    "home", "search", "explore", "i", "intent", "hashtag", "share", "p", "reel", "watch", "status",
];

/// `@handle` (or `r/sub`, `u/name`) derived from the post URL.
pub fn handle_from_url(url: &str, platform: Option<&str>) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segments: Vec<&str> = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .collect();
    let first = *segments.first()?;

    if let Some(handle) = first.strip_prefix('@') {
        return (!handle.is_empty()).then(|| format!("@{handle}"));
    }

    match platform? {
        "Reddit" => match (first, segments.get(1)) {
            ("r", Some(sub)) => Some(format!("r/{sub}")),
            ("u" | "user", Some(name)) => Some(format!("u/{name}")),
            _ => None,
        },
        "Bluesky" => match (first, segments.get(1)) {
            ("profile", Some(name)) => Some(format!("@{name}")),
            _ => None,
        },
        "Twitter" | "X" | "Instagram" | "Threads" | "Pinterest" | "Tumblr" => {
            (!RESERVED_SEGMENTS.contains(&first)).then(|| format!("@{first}"))
        }
        _ => None,
    }
}

/// Which interaction bucket a schema `interactionType` belongs to.
fn interaction_kind(value: &Value) -> Option<&'static str> {
    let raw = value_text(value).or_else(|| {
        value
            .as_object()
            .and_then(|m| m.get("@type"))
            .and_then(value_text)
    })?;
    match normalize_type(&raw).as_str() {
        "LikeAction" | "ReactAction" | "AgreeAction" => Some("likes"),
        "ShareAction" => Some("shares"),
        "CommentAction" | "ReplyAction" => Some("comments"),
        _ => None,
    }
}

fn schema_interactions(record: &SchemaRecord) -> Interactions {
    let mut out = Interactions::default();
    let stats: Vec<&Value> = match record.get("interactionStatistic") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(other) => vec![other],
        None => Vec::new(),
    };
    for stat in stats {
        let Some(map) = stat.as_object() else {
            continue;
        };
        let kind = map.get("interactionType").and_then(interaction_kind);
        let count = map
            .get("userInteractionCount")
            .and_then(value_text)
            .and_then(|t| parse_count(&t));
        match (kind, count) {
            (Some("likes"), Some(n)) => out.likes = out.likes.or(Some(n)),
            (Some("shares"), Some(n)) => out.shares = out.shares.or(Some(n)),
            (Some("comments"), Some(n)) => out.comments = out.comments.or(Some(n)),
            _ => {}
        }
    }
    if out.comments.is_none() {
        out.comments = record.text_at(&["commentCount"]).and_then(|t| parse_count(&t));
    }
    out
}

/// Counter from the first selector whose text or `aria-label` holds a number.
fn dom_count(doc: &ParsedDocument, selectors: &[&str]) -> Option<u64> {
    selectors.iter().find_map(|sel| {
        doc.text_of(sel)
            .and_then(|t| parse_count(&t))
            .or_else(|| doc.attr_of(sel, "aria-label").and_then(|t| parse_count(&t)))
    })
}

/// Social post details from schema, platform meta tags and the DOM.
pub fn extract_social(doc: &ParsedDocument, url: &str, schemas: &SchemaSet) -> SocialDetails {
    let record = schemas.find(POST_TYPES);
    let record = record.as_ref();
    let platform = social_platform(url);

    let author = record
        .and_then(|r| r.first_text(&[&["author", "name"], &["author"], &["creator", "name"]]))
        .or_else(|| extract_field_text_single(doc, AUTHOR_SELECTORS));

    let handle = handle_from_url(url, platform)
        .or_else(|| {
            record.and_then(|r| {
                r.first_text(&[&["author", "alternateName"], &["author", "identifier"]])
            })
        })
        .or_else(|| extract_first_attr(doc, &["meta[name='twitter:creator']"], "content"))
        .map(|h| {
            if h.starts_with('@') || h.contains('/') {
                h
            } else {
                format!("@{h}")
            }
        });

    let published = record
        .and_then(|r| r.first_text(&[&["datePublished"], &["dateCreated"], &["uploadDate"]]))
        .or_else(|| extract_first_attr(doc, DATE_SELECTORS, "content"))
        .or_else(|| extract_first_attr(doc, &["time[datetime]"], "datetime"))
        .and_then(|d| parse_date(&d));

    let mut interactions = record.map(schema_interactions).unwrap_or_default();
    if interactions.likes.is_none() {
        interactions.likes = dom_count(doc, LIKE_SELECTORS);
    }
    if interactions.shares.is_none() {
        interactions.shares = dom_count(doc, SHARE_SELECTORS);
    }
    if interactions.comments.is_none() {
        interactions.comments = dom_count(doc, COMMENT_SELECTORS);
    }

    SocialDetails {
        platform: platform.map(str::to_string),
        author,
        handle,
        published,
        interactions,
    }
}
