// ABOUTME: Extraction orchestrator: parse, schema, classify, type-specific processing, assembly.
// ABOUTME: Always yields a PreviewRecord; failures and panics become error-typed records.

use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::Utc;
use tracing::{debug, warn};

use crate::cache::PreviewCache;
use crate::classify::classify;
use crate::dom::{normalize_spaces, ParsedDocument};
use crate::error::{FailureCategory, PreviewError};
use crate::extractors::fields::{
    extract_description, extract_favicon, extract_field_text_single, extract_first_attr,
    extract_site_name, host_of, parse_date,
};
use crate::extractors::product::extract_product;
use crate::extractors::social::extract_social;
use crate::extractors::video::extract_video;
use crate::images::{extract_gallery_images, extract_important_images, resolve_image_url};
use crate::options::{Options, PipelineBuilder};
use crate::preview::{
    ArticleDetails, ContentType, GalleryDetails, ImageCandidate, PreviewDetails, PreviewRecord,
};
use crate::readability::{extract_title, parse_article};
use crate::resource::{Fetcher, HttpFetcher};
use crate::schema::{SchemaSet, ARTICLE_TYPES};
use crate::summarize::summarize;

const AUTHOR_SELECTORS: &[&str] = &[
    "meta[name='author']",
    "meta[property='article:author']",
    "[itemprop='author'] [itemprop='name']",
    "[rel='author']",
    ".byline",
    ".author",
];

const PUBLISHED_SELECTORS: &[&str] = &[
    "meta[property='article:published_time']",
    "meta[name='date']",
    "meta[itemprop='datePublished']",
];

/// Where an extraction is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetched,
    Parsed,
    Classified,
    TypeProcessed,
    Assembled,
    Errored,
}

/// Output of the type-specific branch, before common fields are merged in.
struct Processed {
    description: Option<String>,
    images: Vec<ImageCandidate>,
    details: PreviewDetails,
}

/// The extraction pipeline plus its preview cache.
#[derive(Debug)]
pub struct Pipeline {
    opts: Options,
    cache: PreviewCache,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl Pipeline {
    pub fn new(opts: Options) -> Self {
        let cache = PreviewCache::new(opts.clamped_cache_ttl(), opts.cache_capacity);
        Self { opts, cache }
    }

    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    pub fn cache(&self) -> &PreviewCache {
        &self.cache
    }

    /// An HTTP fetcher configured from this pipeline's options.
    pub fn http_fetcher(&self) -> Result<HttpFetcher, PreviewError> {
        HttpFetcher::new(&self.opts)
    }

    /// Build a preview from raw HTML. Never fails: problems yield an error-typed record.
    pub fn extract(&self, html: &str, url: &str) -> PreviewRecord {
        let doc = match ParsedDocument::parse(html) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(url, stage = ?Stage::Errored, error = %e, "document parse failed");
                return PreviewRecord::error(url, e.category());
            }
        };
        debug!(url, stage = ?Stage::Parsed, warnings = doc.warning_count());

        contain_panics(url, || self.extract_parsed(&doc, url))
    }

    fn extract_parsed(&self, doc: &ParsedDocument, url: &str) -> PreviewRecord {
        let schemas = SchemaSet::collect(doc);
        let content_type = classify(doc, url, schemas.primary());
        debug!(url, stage = ?Stage::Classified, content_type = %content_type);

        let processed = self.process(doc, url, &schemas, content_type);
        debug!(url, stage = ?Stage::TypeProcessed, images = processed.images.len());

        let record = self.assemble(doc, url, &schemas, processed);
        debug!(url, stage = ?Stage::Assembled, content_type = %record.content_type());
        record
    }

    /// Cached, fetched preview for `url`. Fetch failures become error records; those are not cached.
    pub async fn preview<F>(&self, fetcher: &F, url: &str) -> PreviewRecord
    where
        F: Fetcher + ?Sized,
    {
        if let Some(hit) = self.cache.get(url) {
            debug!(url, "preview cache hit");
            return hit;
        }
        debug!(url, "preview cache miss");

        let html = match fetcher.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url, stage = ?Stage::Errored, error = %e, "fetch failed");
                return PreviewRecord::error(url, e.category());
            }
        };
        debug!(url, stage = ?Stage::Fetched, bytes = html.len());

        let record = self.extract(&html, url);
        if !record.is_error() {
            self.cache.set(url, record.clone());
        }
        record
    }

    fn process(
        &self,
        doc: &ParsedDocument,
        url: &str,
        schemas: &SchemaSet,
        content_type: ContentType,
    ) -> Processed {
        let max_images = self.opts.max_images;
        match content_type {
            ContentType::Article => self.process_article(doc, url, schemas),
            ContentType::Product => Processed {
                description: None,
                images: extract_important_images(doc, max_images, url),
                details: PreviewDetails::Product(extract_product(doc, schemas)),
            },
            ContentType::Video => {
                let video = extract_video(doc, url, schemas);
                let mut images = extract_important_images(doc, max_images, url);
                if images.is_empty() && max_images > 0 {
                    if let Some(src) = video.thumbnail.as_deref().and_then(|t| resolve_image_url(t, url)) {
                        images.push(ImageCandidate {
                            src,
                            alt: String::new(),
                            width: None,
                            height: None,
                            priority: true,
                            caption: None,
                        });
                    }
                }
                Processed {
                    description: None,
                    images,
                    details: PreviewDetails::Video(video),
                }
            }
            ContentType::Social => Processed {
                description: None,
                images: extract_important_images(doc, max_images, url),
                details: PreviewDetails::Social(extract_social(doc, url, schemas)),
            },
            ContentType::Gallery => {
                let (images, image_count) = extract_gallery_images(doc, max_images, url);
                Processed {
                    description: None,
                    images,
                    details: PreviewDetails::Gallery(GalleryDetails { image_count }),
                }
            }
            ContentType::Default | ContentType::Error => Processed {
                description: None,
                images: extract_important_images(doc, max_images, url),
                details: PreviewDetails::Default,
            },
        }
    }

    fn process_article(&self, doc: &ParsedDocument, url: &str, schemas: &SchemaSet) -> Processed {
        let article = parse_article(doc);
        let summary = summarize(
            &article.cleaned_text,
            self.opts.max_sentences,
            self.opts.max_chars,
        );
        let record = schemas.find(ARTICLE_TYPES);
        let record = record.as_ref();

        let author = record
            .and_then(|r| r.first_text(&[&["author", "name"], &["author"], &["creator", "name"]]))
            .or_else(|| extract_field_text_single(doc, AUTHOR_SELECTORS))
            .map(|a| strip_byline(&a));

        let published = record
            .and_then(|r| r.first_text(&[&["datePublished"], &["dateCreated"]]))
            .or_else(|| extract_first_attr(doc, PUBLISHED_SELECTORS, "content"))
            .or_else(|| extract_first_attr(doc, &["time[datetime]"], "datetime"))
            .and_then(|d| parse_date(&d));

        let reading_time_minutes = self
            .opts
            .include_reading_time
            .then_some(article.reading_time_minutes);

        Processed {
            description: (!summary.is_empty()).then_some(summary),
            images: extract_important_images(doc, self.opts.max_images, url),
            details: PreviewDetails::Article(ArticleDetails {
                author,
                published,
                word_count: article.word_count,
                reading_time_minutes,
                excerpt: article.excerpt,
            }),
        }
    }

    fn assemble(
        &self,
        doc: &ParsedDocument,
        url: &str,
        schemas: &SchemaSet,
        processed: Processed,
    ) -> PreviewRecord {
        let schema = schemas.primary();
        let title = extract_meta_title(doc)
            .or_else(|| schema.and_then(|s| s.first_text(&[&["headline"], &["name"]])))
            .map(|t| normalize_spaces(&t))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| extract_title(doc));

        let description = processed
            .description
            .or_else(|| extract_description(doc))
            .or_else(|| schema.and_then(|s| s.text_at(&["description"])))
            .map(|d| normalize_spaces(&d))
            .unwrap_or_default();

        PreviewRecord {
            url: url.to_string(),
            title,
            description,
            timestamp: Utc::now(),
            main_image: processed.images.first().cloned(),
            images: processed.images,
            site_name: extract_site_name(doc),
            favicon: extract_favicon(doc, url),
            domain: host_of(url).unwrap_or_default(),
            details: processed.details,
        }
    }
}

fn extract_meta_title(doc: &ParsedDocument) -> Option<String> {
    extract_first_attr(
        doc,
        &[
            "meta[property='og:title']",
            "meta[name='twitter:title']",
            "meta[property='twitter:title']",
        ],
        "content",
    )
}

/// `"By Jane Doe"` -> `"Jane Doe"`.
fn strip_byline(author: &str) -> String {
    let trimmed = author.trim();
    match trimmed.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("by ") => trimmed[3..].trim().to_string(),
        _ => trimmed.to_string(),
    }
}

/// Run a post-parse extraction, turning any panic into an error-typed record.
fn contain_panics<F>(url: &str, extract: F) -> PreviewRecord
where
    F: FnOnce() -> PreviewRecord,
{
    match catch_unwind(AssertUnwindSafe(extract)) {
        Ok(record) => record,
        Err(_) => {
            warn!(url, stage = ?Stage::Errored, "extraction panicked");
            PreviewRecord::error(url, FailureCategory::Generic)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PreviewError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct StaticFetcher {
        body: Result<String, u16>,
        calls: AtomicUsize,
    }

    impl StaticFetcher {
        fn ok(body: &str) -> Self {
            Self {
                body: Ok(body.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn status(status: u16) -> Self {
            Self {
                body: Err(status),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<String, PreviewError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.body {
                Ok(body) => Ok(body.clone()),
                Err(status) => Err(PreviewError::fetch(url, "Fetch", Some(*status), None)),
            }
        }
    }

    const ARTICLE_HTML: &str = r#"<html><head>
        <title>Ownership Explained | Rust Blog</title>
        <meta name="author" content="By Ferris Crab">
        <meta property="article:published_time" content="2024-03-01T09:00:00Z">
        <meta property="og:site_name" content="Rust Blog">
        <link rel="icon" href="/favicon.png">
        </head><body><article>
        <p>Ownership is the central feature of the language and it shapes every program you write in it.</p>
        <p>Each value has a single owner, and the value is dropped when that owner goes out of scope.</p>
        <p>Borrowing lets code use a value without taking ownership of it, under rules the compiler checks.</p>
        <p>Therefore the compiler can rule out whole classes of memory bugs before the program ever runs.</p>
        </article></body></html>"#;

    #[test]
    fn test_article_assembly() {
        let pipeline = Pipeline::default();
        let record = pipeline.extract(ARTICLE_HTML, "https://blog.example.com/ownership");
        assert_eq!(record.content_type(), ContentType::Article);
        assert_eq!(record.title, "Ownership Explained");
        assert_eq!(record.site_name.as_deref(), Some("Rust Blog"));
        assert_eq!(
            record.favicon.as_deref(),
            Some("https://blog.example.com/favicon.png")
        );
        assert_eq!(record.domain, "blog.example.com");
        assert!(!record.description.is_empty());
        assert!(record.description.chars().count() <= 280);
        let PreviewDetails::Article(details) = &record.details else {
            panic!("expected article details");
        };
        assert_eq!(details.author.as_deref(), Some("Ferris Crab"));
        assert!(details.published.is_some());
        assert!(details.word_count > 50);
        assert_eq!(details.reading_time_minutes, Some(1));
    }

    #[test]
    fn test_reading_time_toggle() {
        let pipeline = Pipeline::builder().include_reading_time(false).build();
        let record = pipeline.extract(ARTICLE_HTML, "https://blog.example.com/ownership");
        let PreviewDetails::Article(details) = &record.details else {
            panic!("expected article details");
        };
        assert_eq!(details.reading_time_minutes, None);
    }

    #[test]
    fn test_empty_html_is_error_record() {
        let record = Pipeline::default().extract("   ", "https://example.com/");
        assert!(record.is_error());
        assert_eq!(record.content_type(), ContentType::Error);
        assert_eq!(
            record.description,
            FailureCategory::EmptyDocument.user_message()
        );
    }

    #[test]
    fn test_main_image_is_first_image() {
        let record = Pipeline::default().extract(
            r#"<html><head><meta property="og:image" content="/cover.jpg"></head><body><p>x</p></body></html>"#,
            "https://example.com/page",
        );
        assert_eq!(record.images.len(), 1);
        assert_eq!(record.main_image.as_ref(), record.images.first());
        assert_eq!(record.images[0].src, "https://example.com/cover.jpg");
    }

    #[test]
    fn test_strip_byline() {
        assert_eq!(strip_byline("By Jane"), "Jane");
        assert_eq!(strip_byline("by  Jane "), "Jane");
        assert_eq!(strip_byline("Byron"), "Byron");
    }

    #[test]
    fn test_panic_after_parse_becomes_error_record() {
        let record = contain_panics("https://example.com/p", || panic!("classifier bug"));
        assert_eq!(record.content_type(), ContentType::Error);
        let PreviewDetails::Error(details) = &record.details else {
            panic!("expected error details");
        };
        assert_eq!(details.category, FailureCategory::Generic);

        let ok = contain_panics("https://example.com/p", || {
            Pipeline::default().extract_parsed(
                &ParsedDocument::parse("<p>fine</p>").unwrap(),
                "https://example.com/p",
            )
        });
        assert_eq!(ok.content_type(), ContentType::Default);
    }

    #[tokio::test]
    async fn test_preview_caches_successful_records() {
        let pipeline = Pipeline::default();
        let fetcher = StaticFetcher::ok(ARTICLE_HTML);
        let first = pipeline.preview(&fetcher, "https://blog.example.com/a").await;
        let second = pipeline.preview(&fetcher, "https://blog.example.com/a").await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_preview_fetch_failure_is_not_cached() {
        let pipeline = Pipeline::builder().cache_ttl(Duration::from_secs(600)).build();
        let fetcher = StaticFetcher::status(404);
        let record = pipeline.preview(&fetcher, "https://example.com/gone").await;
        assert!(record.is_error());
        let PreviewDetails::Error(details) = &record.details else {
            panic!("expected error details");
        };
        assert_eq!(details.category, FailureCategory::NotFound);
        pipeline.preview(&fetcher, "https://example.com/gone").await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert!(pipeline.cache().is_empty());
    }
}
