// ABOUTME: Readability extractor: locates the main content block, cleans it and derives article metadata.
// ABOUTME: Never fails; a page with no usable body yields a degraded "Untitled Article" record.

use scraper::{ElementRef, Html};
use tracing::{debug, warn};

use crate::dom::cleaners::clean_subtree;
use crate::dom::scoring::find_top_candidate;
use crate::dom::{ancestors, element_text, normalize_spaces, select_within, text_len, ParsedDocument};
use crate::error::PreviewError;
use crate::preview::{reading_time_minutes, word_count};
use crate::summarize::truncate;

pub const UNTITLED: &str = "Untitled Article";

/// Semantic and conventional content containers, tried in order.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "[role='main']",
    "main",
    ".post-content",
    ".article-content",
    ".entry-content",
    ".article-body",
    ".post-body",
    ".story-body",
    "#content",
    ".content",
];

/// A container is accepted only above this much text.
const MIN_CONTENT_TEXT: usize = 100;

const BLOCK_SELECTOR: &str = "p, h1, h2, h3, h4, h5, h6, li, td, th, blockquote, pre";

const EXCERPT_CHARS: usize = 150;

/// Separators that split a site name off a `<title>`. Dashes only count when spaced.
const TITLE_SEPARATORS: &[&str] = &["|", "»", " - ", " – ", " — "];

/// Readable article content derived from a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleExtract {
    pub title: String,
    pub cleaned_text: String,
    /// Cleaned main-content subtree, sanitized for display.
    pub content_html: String,
    pub excerpt: String,
    pub word_count: usize,
    pub reading_time_minutes: usize,
}

impl ArticleExtract {
    /// The record returned when extraction fails.
    pub fn degraded() -> Self {
        Self {
            title: UNTITLED.to_string(),
            cleaned_text: String::new(),
            content_html: String::new(),
            excerpt: String::new(),
            word_count: 0,
            reading_time_minutes: 0,
        }
    }
}

/// Sanitize HTML with an article policy: structural and inline text tags, links and images.
pub fn sanitize_html(html: &str) -> String {
    let allowed_tags = [
        "p", "br", "strong", "b", "em", "i", "u", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol",
        "li", "blockquote", "pre", "code", "img", "a", "span", "div", "figure", "figcaption",
        "table", "thead", "tbody", "tr", "td", "th",
    ];

    let mut builder = ammonia::Builder::new();
    builder.tags(allowed_tags.iter().copied().collect());
    builder.add_tag_attributes("a", &["href"]);
    builder.add_tag_attributes("img", &["src", "alt", "width", "height"]);
    builder
        .url_schemes(["http", "https", "mailto", "data"].iter().copied().collect())
        .clean(html)
        .to_string()
}

/// Find the main content element: conventional containers, then scoring, then `<body>`.
pub fn locate_main_content(doc: &ParsedDocument) -> Option<ElementRef<'_>> {
    for selector in CONTENT_SELECTORS {
        if let Some(el) = doc
            .select(selector)
            .into_iter()
            .find(|el| text_len(el) > MIN_CONTENT_TEXT)
        {
            debug!(selector, "main content located by selector");
            return Some(el);
        }
    }
    if let Some(el) = find_top_candidate(doc) {
        debug!("main content located by candidate scoring");
        return Some(el);
    }
    doc.body()
}

/// Concatenate text of block-level tags, skipping blocks nested in other blocks.
pub fn block_text(fragment: &Html) -> String {
    let root = fragment.root_element();
    let blocks: Vec<String> = select_within(&root, BLOCK_SELECTOR)
        .into_iter()
        .filter(|el| !ancestors(el).any(|a| crate::dom::matches(&a, BLOCK_SELECTOR)))
        .map(|el| element_text(&el))
        .filter(|t| !t.is_empty())
        .collect();

    if blocks.is_empty() {
        element_text(&root)
    } else {
        blocks.join("\n\n")
    }
}

fn strip_title_suffix(title: &str) -> String {
    let cut = TITLE_SEPARATORS
        .iter()
        .filter_map(|sep| title.find(sep))
        .min();
    match cut {
        Some(pos) => {
            let head = title[..pos].trim();
            if head.is_empty() {
                title.trim().to_string()
            } else {
                head.to_string()
            }
        }
        None => title.trim().to_string(),
    }
}

/// Article title: Open Graph, Twitter, `<title>` (site suffix removed), first `<h1>`.
pub fn extract_title(doc: &ParsedDocument) -> String {
    doc.attr_of("meta[property='og:title']", "content")
        .or_else(|| doc.attr_of("meta[name='twitter:title']", "content"))
        .or_else(|| doc.attr_of("meta[property='twitter:title']", "content"))
        .map(|t| normalize_spaces(&t))
        .or_else(|| doc.text_of("title").map(|t| strip_title_suffix(&t)))
        .filter(|t| !t.is_empty())
        .or_else(|| doc.text_of("h1"))
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Short excerpt preferring sentence, then word boundaries.
pub fn excerpt(text: &str) -> String {
    truncate(&normalize_spaces(text), EXCERPT_CHARS)
}

fn try_parse_article(doc: &ParsedDocument) -> Result<ArticleExtract, PreviewError> {
    let main = locate_main_content(doc).ok_or_else(|| {
        PreviewError::extract("", "Readability", Some(anyhow::anyhow!("document has no body")))
    })?;

    let cleaned = clean_subtree(main);
    let fragment = Html::parse_fragment(&cleaned);
    let cleaned_text = block_text(&fragment);
    let words = word_count(&cleaned_text);

    Ok(ArticleExtract {
        title: extract_title(doc),
        excerpt: excerpt(&cleaned_text),
        content_html: sanitize_html(&cleaned),
        word_count: words,
        reading_time_minutes: reading_time_minutes(words),
        cleaned_text,
    })
}

/// Extract readable article content. Never fails.
pub fn parse_article(doc: &ParsedDocument) -> ArticleExtract {
    match try_parse_article(doc) {
        Ok(article) => article,
        Err(e) => {
            warn!(error = %e, "readability extraction degraded");
            ArticleExtract::degraded()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PARA: &str = "Rust gives you control over memory without a garbage collector, and the compiler checks your work.";

    fn doc(html: &str) -> ParsedDocument {
        ParsedDocument::parse(html).unwrap()
    }

    #[test]
    fn test_title_priority() {
        let d = doc(r#"<head><meta property="og:title" content="OG Title"><title>Page | Site</title></head><body><h1>H1</h1></body>"#);
        assert_eq!(extract_title(&d), "OG Title");

        let d = doc(r#"<head><meta name="twitter:title" content="TW Title"><title>Page</title></head>"#);
        assert_eq!(extract_title(&d), "TW Title");

        let d = doc("<head><title>Great Story | Example News</title></head>");
        assert_eq!(extract_title(&d), "Great Story");

        let d = doc("<head><title>Spider-Man Returns - Movie Blog</title></head>");
        assert_eq!(extract_title(&d), "Spider-Man Returns");

        let d = doc("<head><title>Home » Section</title></head>");
        assert_eq!(extract_title(&d), "Home");

        let d = doc("<head><title>| Leading Pipe</title></head>");
        assert_eq!(extract_title(&d), "| Leading Pipe");

        let d = doc("<body><h1>Only Heading</h1></body>");
        assert_eq!(extract_title(&d), "Only Heading");

        let d = doc("<body><p>nothing</p></body>");
        assert_eq!(extract_title(&d), UNTITLED);
    }

    #[test]
    fn test_locates_article_and_strips_boilerplate() {
        let html = format!(
            r#"<html><head><title>Story | Site</title></head><body>
                <nav><a href="/">Home</a><a href="/about">About</a></nav>
                <article>
                    <h2>Intro</h2>
                    <p>{PARA}</p>
                    <div class="share-buttons">Share this on social</div>
                    <script>track()</script>
                    <p>{PARA}</p>
                    <ul><li>First point</li><li><p>Nested paragraph point</p></li></ul>
                </article>
                <footer>Copyright</footer>
            </body></html>"#
        );
        let d = doc(&html);
        let article = parse_article(&d);
        assert_eq!(article.title, "Story");
        assert!(article.cleaned_text.starts_with("Intro\n\nRust gives you control"));
        assert!(article.cleaned_text.contains("Nested paragraph point"));
        assert_eq!(article.cleaned_text.matches("Nested paragraph point").count(), 1);
        assert!(!article.cleaned_text.contains("Share this"));
        assert!(!article.cleaned_text.contains("Copyright"));
        assert!(!article.content_html.contains("script"));
        assert_eq!(article.word_count, word_count(&article.cleaned_text));
        assert_eq!(article.reading_time_minutes, 1);
    }

    #[test]
    fn test_scoring_fallback_without_semantic_tags() {
        let html = format!(
            r#"<body>
                <div class="links"><a href="/a">{PARA}</a></div>
                <div id="story"><p>{PARA}</p><p>{PARA}</p></div>
            </body>"#
        );
        let d = doc(&html);
        let main = locate_main_content(&d).unwrap();
        assert_eq!(main.value().attr("id"), Some("story"));
    }

    #[test]
    fn test_short_containers_are_skipped() {
        let html = format!(r#"<body><article><p>Too short.</p></article><main><p>{PARA}</p><p>{PARA}</p></main></body>"#);
        let d = doc(&html);
        let main = locate_main_content(&d).unwrap();
        assert_eq!(main.value().name(), "main");
    }

    #[test]
    fn test_excerpt_prefers_sentence_boundary() {
        let text = format!("{PARA} {PARA}");
        let out = excerpt(&text);
        assert_eq!(out, PARA);
        assert!(out.chars().count() <= EXCERPT_CHARS);
    }

    #[test]
    fn test_sanitize_html_policy() {
        let out = sanitize_html(r#"<p onclick="x()">Hi <a href="javascript:alert(1)">bad</a> <a href="https://ok.example">ok</a></p><style>p{}</style>"#);
        assert!(!out.contains("onclick"));
        assert!(!out.contains("javascript"));
        assert!(out.contains(r#"href="https://ok.example""#));
        assert!(!out.contains("<style"));
    }

    #[test]
    fn test_empty_body_degrades_to_zero_counts() {
        let d = doc("<html><head><title>T</title></head></html>");
        let article = parse_article(&d);
        assert_eq!(article.title, "T");
        assert_eq!(article.word_count, 0);
        assert_eq!(article.reading_time_minutes, 0);
        assert_eq!(article.excerpt, "");
    }

    #[test]
    fn test_degraded_record() {
        let degraded = ArticleExtract::degraded();
        assert_eq!(degraded.title, UNTITLED);
        assert!(degraded.cleaned_text.is_empty());
        assert_eq!(degraded.word_count, 0);
    }
}
