// ABOUTME: Content-type classifier combining URL host/path heuristics with DOM and schema signals.
// ABOUTME: Total and deterministic: every input resolves to one ContentType, defaulting to Default.

//! Content-Type Classifier.
//!
//! Decision order (first match wins):
//! 1. video host, 2. social host, 3. e-commerce host or product path,
//! 4. article schema or article DOM, 5. product schema or product DOM markers,
//! 6. gallery structure, 7. video DOM, 8. substantial text, 9. default.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::dom::{text_len, ParsedDocument};
use crate::extractors::fields::host_of;
use crate::images::is_significant_image;
use crate::preview::ContentType;
use crate::schema::SchemaRecord;

/// Video hosting domains and their display names.
const VIDEO_HOSTS: &[(&str, &str)] = &[
    ("youtube.com", "YouTube"),
    ("youtu.be", "YouTube"),
    ("youtube-nocookie.com", "YouTube"),
    ("vimeo.com", "Vimeo"),
    ("dailymotion.com", "Dailymotion"),
    ("dai.ly", "Dailymotion"),
    ("twitch.tv", "Twitch"),
    ("wistia.com", "Wistia"),
    ("loom.com", "Loom"),
    ("streamable.com", "Streamable"),
    ("rumble.com", "Rumble"),
    ("bilibili.com", "Bilibili"),
];

/// Social platforms and their display names.
const SOCIAL_HOSTS: &[(&str, &str)] = &[
    ("twitter.com", "Twitter"),
    ("x.com", "X"),
    ("facebook.com", "Facebook"),
    ("fb.com", "Facebook"),
    ("instagram.com", "Instagram"),
    ("linkedin.com", "LinkedIn"),
    ("reddit.com", "Reddit"),
    ("threads.net", "Threads"),
    ("mastodon.social", "Mastodon"),
    ("bsky.app", "Bluesky"),
    ("tiktok.com", "TikTok"),
    ("pinterest.com", "Pinterest"),
    ("tumblr.com", "Tumblr"),
];

/// E-commerce hosts. Entries ending in `.` match any TLD.
const ECOMMERCE_HOSTS: &[&str] = &[
    "amazon.",
    "ebay.",
    "etsy.com",
    "walmart.com",
    "target.com",
    "bestbuy.com",
    "aliexpress.com",
    "myshopify.com",
    "newegg.com",
    "flipkart.com",
];

static PRODUCT_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/products?/|/shop/|/item/").unwrap());

const ARTICLE_CONTENT_SELECTORS: &str = ".post-content, .article-content, .entry-content, .article-body, .post-body, .story-body, [itemprop='articleBody']";

const AUTHOR_MARKERS: &str =
    "[rel='author'], .author, .byline, [itemprop='author'], meta[name='author']";

const DATE_MARKERS: &str = "time[datetime], .published, .post-date, .entry-date, [itemprop='datePublished'], meta[property='article:published_time']";

/// Each entry counts once toward the product marker threshold.
const PRODUCT_MARKERS: &[&str] = &[
    ".price, .product-price, [itemprop='price'], meta[property='product:price:amount']",
    ".add-to-cart, #add-to-cart, button[name='add-to-cart'], [data-action='add-to-cart'], .buy-now",
    ".product-title, .product-name, [itemprop='name'].product",
    ".sku, [itemprop='sku']",
    ".product-gallery, .product-images",
    "[data-product-id], [data-product]",
    ".rating, .stars, [itemprop='ratingValue']",
    ".availability, .in-stock, [itemprop='availability']",
    "meta[property='og:type'][content='product']",
];

const PRODUCT_MARKER_THRESHOLD: usize = 3;

const GALLERY_SELECTORS: &str = ".gallery, .image-gallery, .photo-gallery, .carousel, .slideshow, .lightbox, [data-gallery], .swiper-container";

const VIDEO_DOM_SELECTORS: &str = "video, iframe[src*='youtube.com/embed'], iframe[src*='youtube-nocookie.com/embed'], iframe[src*='player.vimeo.com'], iframe[src*='dailymotion.com/embed'], iframe[src*='player.twitch.tv'], iframe[src*='fast.wistia'], iframe[src*='loom.com/embed'], meta[property='og:video'], meta[property='og:video:url'], [itemtype*='VideoObject'], .video-player, [data-video-id]";

const TEXT_BLOCK_SELECTOR: &str = "p, blockquote, pre";
const MAX_TEXT_BLOCKS: usize = 50;
const SUBSTANTIAL_TEXT_CHARS: usize = 1000;

/// Whether `host` is `domain` or one of its subdomains. A trailing `.` matches any TLD.
fn host_matches(host: &str, domain: &str) -> bool {
    if domain.ends_with('.') {
        return host.starts_with(domain) || host.contains(&format!(".{domain}"));
    }
    host == domain || host.ends_with(&format!(".{domain}"))
}

fn lookup<'a>(host: &str, table: &'a [(&'a str, &'a str)]) -> Option<&'a str> {
    table
        .iter()
        .find(|(domain, _)| host_matches(host, domain))
        .map(|(_, name)| *name)
}

/// Display name of the video platform hosting `url`.
pub fn video_platform(url: &str) -> Option<&'static str> {
    lookup(&host_of(url)?, VIDEO_HOSTS)
}

/// Display name of the social platform hosting `url`.
pub fn social_platform(url: &str) -> Option<&'static str> {
    lookup(&host_of(url)?, SOCIAL_HOSTS)
}

fn is_ecommerce_url(url: &str) -> bool {
    let host_hit = host_of(url)
        .map(|h| ECOMMERCE_HOSTS.iter().any(|d| host_matches(&h, d)))
        .unwrap_or(false);
    host_hit
        || Url::parse(url)
            .map(|u| PRODUCT_PATH_RE.is_match(u.path()))
            .unwrap_or(false)
}

fn has_article_structure(doc: &ParsedDocument) -> bool {
    doc.exists("article")
        || doc.exists(ARTICLE_CONTENT_SELECTORS)
        || (doc.exists(AUTHOR_MARKERS) && doc.exists(DATE_MARKERS))
}

/// Number of distinct product markers present.
pub fn product_marker_count(doc: &ParsedDocument) -> usize {
    PRODUCT_MARKERS.iter().filter(|sel| doc.exists(sel)).count()
}

fn has_gallery_structure(doc: &ParsedDocument, url: &str) -> bool {
    if doc.exists(GALLERY_SELECTORS) {
        return true;
    }
    let images = doc.select("img");
    if images.len() <= 5 {
        return false;
    }
    images
        .iter()
        .filter(|img| is_significant_image(img, url))
        .count()
        > 4
}

fn has_video_structure(doc: &ParsedDocument) -> bool {
    doc.exists(VIDEO_DOM_SELECTORS)
        || doc
            .attr_of("meta[property='og:type']", "content")
            .is_some_and(|t| t.starts_with("video"))
}

/// Aggregate text across content blocks exceeds the threshold (early exit, capped scan).
pub fn has_substantial_text(doc: &ParsedDocument) -> bool {
    let mut total = 0;
    for block in doc.select(TEXT_BLOCK_SELECTOR).iter().take(MAX_TEXT_BLOCKS) {
        total += text_len(block);
        if total > SUBSTANTIAL_TEXT_CHARS {
            return true;
        }
    }
    false
}

/// Classify a page. Never fails; unrecognized pages are `Default`.
pub fn classify(doc: &ParsedDocument, url: &str, schema: Option<&SchemaRecord>) -> ContentType {
    if video_platform(url).is_some() {
        return ContentType::Video;
    }
    if social_platform(url).is_some() {
        return ContentType::Social;
    }
    if is_ecommerce_url(url) {
        return ContentType::Product;
    }
    if schema.is_some_and(SchemaRecord::is_article) || has_article_structure(doc) {
        return ContentType::Article;
    }
    if schema.is_some_and(SchemaRecord::is_product)
        || product_marker_count(doc) >= PRODUCT_MARKER_THRESHOLD
    {
        return ContentType::Product;
    }
    if has_gallery_structure(doc, url) {
        return ContentType::Gallery;
    }
    if schema.is_some_and(SchemaRecord::is_video) || has_video_structure(doc) {
        return ContentType::Video;
    }
    if has_substantial_text(doc) {
        return ContentType::Article;
    }
    ContentType::Default
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::extract_schema;

    fn run(html: &str, url: &str) -> ContentType {
        let doc = ParsedDocument::parse(html).unwrap();
        let schema = extract_schema(&doc);
        classify(&doc, url, schema.as_ref())
    }

    const EMPTYISH: &str = "<html><head><title>x</title></head><body><p>hi</p></body></html>";

    #[test]
    fn test_host_matches() {
        assert!(host_matches("youtube.com", "youtube.com"));
        assert!(host_matches("m.youtube.com", "youtube.com"));
        assert!(!host_matches("notyoutube.com", "youtube.com"));
        assert!(host_matches("amazon.co.uk", "amazon."));
        assert!(host_matches("smile.amazon.com", "amazon."));
        assert!(!host_matches("amazonia.org", "amazon."));
    }

    #[test]
    fn test_url_rules() {
        assert_eq!(run(EMPTYISH, "https://www.youtube.com/watch?v=abc123XYZ90"), ContentType::Video);
        assert_eq!(run(EMPTYISH, "https://vimeo.com/123456"), ContentType::Video);
        assert_eq!(run(EMPTYISH, "https://x.com/someone/status/1"), ContentType::Social);
        assert_eq!(run(EMPTYISH, "https://www.reddit.com/r/rust/"), ContentType::Social);
        assert_eq!(run(EMPTYISH, "https://www.amazon.de/dp/B000"), ContentType::Product);
        assert_eq!(run(EMPTYISH, "https://store.example.com/products/widget"), ContentType::Product);
        assert_eq!(run(EMPTYISH, "https://example.com/item/42"), ContentType::Product);
    }

    #[test]
    fn test_url_rules_precede_dom_signals() {
        // A blog post under a /shop/ path is still classified by URL first.
        let html = "<html><body><article><p>Shop diary entry.</p></article></body></html>";
        assert_eq!(run(html, "https://blog.example.com/shop/diary"), ContentType::Product);
    }

    #[test]
    fn test_article_signals() {
        assert_eq!(
            run("<body><article><p>x</p></article></body>", "https://example.com/a"),
            ContentType::Article
        );
        assert_eq!(
            run(
                r#"<body><span class="byline">Ann</span><time datetime="2024-01-01">Jan</time></body>"#,
                "https://example.com/a"
            ),
            ContentType::Article
        );
        assert_eq!(
            run(
                r#"<head><script type="application/ld+json">{"@type":"BlogPosting"}</script></head><body></body>"#,
                "https://example.com/a"
            ),
            ContentType::Article
        );
    }

    #[test]
    fn test_product_signals() {
        assert_eq!(
            run(
                r#"<head><script type="application/ld+json">{"@type":"Product","offers":{"price":"19.99"}}</script></head><body></body>"#,
                "https://example.com/widget"
            ),
            ContentType::Product
        );
        assert_eq!(
            run(
                r#"<body><span class="price">$5</span><button class="add-to-cart">Add</button><span class="sku">A1</span></body>"#,
                "https://example.com/widget"
            ),
            ContentType::Product
        );
        assert_eq!(
            run(r#"<body><span class="price">$5</span><span class="sku">A1</span></body>"#, "https://example.com/w"),
            ContentType::Default
        );
    }

    #[test]
    fn test_gallery_signals() {
        let imgs: String = (1..=8)
            .map(|i| format!(r#"<img src="/photos/{i}.jpg" width="800" height="600">"#))
            .collect();
        let html = format!("<body><h2>Trip</h2>{imgs}</body>");
        assert_eq!(run(&html, "https://example.com/trip"), ContentType::Gallery);

        assert_eq!(
            run(r#"<body><div class="gallery"><img src="/a.jpg"></div></body>"#, "https://example.com/g"),
            ContentType::Gallery
        );

        let icons: String = (1..=8)
            .map(|i| format!(r#"<img src="/icons/{i}.png" width="16" height="16">"#))
            .collect();
        assert_eq!(
            run(&format!("<body>{icons}</body>"), "https://example.com/icons"),
            ContentType::Default
        );
    }

    #[test]
    fn test_video_dom_signals() {
        assert_eq!(
            run(r#"<body><video src="/clip.mp4"></video></body>"#, "https://example.com/v"),
            ContentType::Video
        );
        assert_eq!(
            run(
                r#"<body><iframe src="https://player.vimeo.com/video/76979871"></iframe></body>"#,
                "https://example.com/v"
            ),
            ContentType::Video
        );
    }

    #[test]
    fn test_substantial_text_and_default() {
        let para = "Plain prose without any semantic wrapper keeps going for a while. ".repeat(5);
        let html = format!("<body><div><p>{para}</p><p>{para}</p><p>{para}</p><p>{para}</p></div></body>");
        assert_eq!(run(&html, "https://example.com/page"), ContentType::Article);
        assert_eq!(run(EMPTYISH, "https://example.com/page"), ContentType::Default);
        assert_eq!(run(EMPTYISH, "not a url"), ContentType::Default);
    }

    #[test]
    fn test_platform_names() {
        assert_eq!(video_platform("https://youtu.be/abc"), Some("YouTube"));
        assert_eq!(social_platform("https://bsky.app/profile/x"), Some("Bluesky"));
        assert_eq!(social_platform("https://example.com"), None);
    }
}
