// ABOUTME: Preview data model: ContentType, ImageCandidate, PreviewRecord and per-type detail payloads.
// ABOUTME: Serializes to camelCase JSON with the detail payload flattened and tagged by contentType.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FailureCategory;

/// The kind of page a preview describes. Exactly one per extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Article,
    Product,
    Video,
    Social,
    Gallery,
    Default,
    Error,
}

impl ContentType {
    pub const ALL: [ContentType; 7] = [
        ContentType::Article,
        ContentType::Product,
        ContentType::Video,
        ContentType::Social,
        ContentType::Gallery,
        ContentType::Default,
        ContentType::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::Product => "product",
            ContentType::Video => "video",
            ContentType::Social => "social",
            ContentType::Gallery => "gallery",
            ContentType::Default => "default",
            ContentType::Error => "error",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ranked image. `src` is always an absolute http(s) URL or a raster data URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageCandidate {
    pub src: String,
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub priority: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    pub word_count: usize,
    /// Present only when reading time is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_time_minutes: Option<usize>,
    pub excerpt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// `H:MM:SS` or `M:SS`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interactions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
}

impl Interactions {
    pub fn is_empty(&self) -> bool {
        self.likes.is_none() && self.shares.is_none() && self.comments.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Interactions::is_empty")]
    pub interactions: Interactions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryDetails {
    /// Significant gallery images found before the image quota was applied.
    pub image_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    pub category: FailureCategory,
    pub message: String,
}

/// Type-specific payload, discriminated by `contentType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "contentType", rename_all = "lowercase")]
pub enum PreviewDetails {
    Article(ArticleDetails),
    Product(ProductDetails),
    Video(VideoDetails),
    Social(SocialDetails),
    Gallery(GalleryDetails),
    Default,
    Error(ErrorDetails),
}

impl PreviewDetails {
    pub fn content_type(&self) -> ContentType {
        match self {
            PreviewDetails::Article(_) => ContentType::Article,
            PreviewDetails::Product(_) => ContentType::Product,
            PreviewDetails::Video(_) => ContentType::Video,
            PreviewDetails::Social(_) => ContentType::Social,
            PreviewDetails::Gallery(_) => ContentType::Gallery,
            PreviewDetails::Default => ContentType::Default,
            PreviewDetails::Error(_) => ContentType::Error,
        }
    }
}

/// The assembled output of one extraction. Replaced wholesale, never mutated after assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRecord {
    pub url: String,
    pub title: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_image: Option<ImageCandidate>,
    #[serde(default)]
    pub images: Vec<ImageCandidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(default)]
    pub domain: String,
    #[serde(flatten)]
    pub details: PreviewDetails,
}

impl PreviewRecord {
    /// An error-typed record carrying a categorized user-facing message.
    pub fn error(url: impl Into<String>, category: FailureCategory) -> Self {
        let url = url.into();
        Self {
            domain: crate::extractors::fields::host_of(&url).unwrap_or_default(),
            url,
            title: "Preview unavailable".to_string(),
            description: category.user_message().to_string(),
            timestamp: Utc::now(),
            main_image: None,
            images: Vec::new(),
            site_name: None,
            favicon: None,
            details: PreviewDetails::Error(ErrorDetails {
                category,
                message: category.user_message().to_string(),
            }),
        }
    }

    pub fn content_type(&self) -> ContentType {
        self.details.content_type()
    }

    pub fn is_error(&self) -> bool {
        matches!(self.details, PreviewDetails::Error(_))
    }

    /// Equality ignoring the assembly timestamp.
    pub fn same_content(&self, other: &PreviewRecord) -> bool {
        let mut other = other.clone();
        other.timestamp = self.timestamp;
        *self == other
    }
}

/// Count words in a text string using whitespace splitting.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Minutes to read at 200 words per minute, rounded up.
pub fn reading_time_minutes(words: usize) -> usize {
    words.div_ceil(200)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn base(details: PreviewDetails) -> PreviewRecord {
        PreviewRecord {
            url: "https://example.com/p".to_string(),
            title: "Title".to_string(),
            description: "Desc".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap(),
            main_image: None,
            images: Vec::new(),
            site_name: None,
            favicon: None,
            domain: "example.com".to_string(),
            details,
        }
    }

    #[test]
    fn test_serializes_flattened_camel_case() {
        let record = base(PreviewDetails::Product(ProductDetails {
            price: Some("19.99".to_string()),
            review_count: Some(12),
            ..Default::default()
        }));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["contentType"], "product");
        assert_eq!(value["price"], "19.99");
        assert_eq!(value["reviewCount"], 12);
        assert_eq!(value["timestamp"], "2024-06-15T12:00:00Z");
        assert!(value.get("details").is_none());
        assert!(value.get("rating").is_none());
    }

    #[test]
    fn test_default_and_error_serialization() {
        let value = serde_json::to_value(base(PreviewDetails::Default)).unwrap();
        assert_eq!(value["contentType"], "default");

        let record = PreviewRecord::error("https://example.com/x", FailureCategory::NotFound);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["contentType"], "error");
        assert_eq!(value["category"], "notFound");
        assert_eq!(record.content_type(), ContentType::Error);
        assert!(record.is_error());
    }

    #[test]
    fn test_round_trip() {
        let record = base(PreviewDetails::Video(VideoDetails {
            embed_url: Some("https://www.youtube.com/embed/abc123XYZ90".to_string()),
            duration: Some("4:13".to_string()),
            ..Default::default()
        }));
        let text = serde_json::to_string(&record).unwrap();
        let back: PreviewRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_content_type_strings() {
        let names: Vec<String> = ContentType::ALL
            .iter()
            .map(|t| serde_json::to_value(t).unwrap().as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["article", "product", "video", "social", "gallery", "default", "error"]
        );
        assert_eq!(ContentType::Gallery.to_string(), "gallery");
    }

    #[test]
    fn test_same_content_ignores_timestamp() {
        let a = base(PreviewDetails::Default);
        let mut b = a.clone();
        b.timestamp = Utc::now();
        assert!(a.same_content(&b));
        b.title = "Other".to_string();
        assert!(!a.same_content(&b));
    }

    #[test]
    fn test_reading_time() {
        assert_eq!(word_count("one two  three\nfour"), 4);
        assert_eq!(reading_time_minutes(0), 0);
        assert_eq!(reading_time_minutes(1), 1);
        assert_eq!(reading_time_minutes(200), 1);
        assert_eq!(reading_time_minutes(201), 2);
    }
}
