// ABOUTME: Image selection: priority selectors first, then heuristic scoring of remaining <img> elements.
// ABOUTME: Validates and resolves every candidate URL and filters tracking pixels and tiny data URIs.

//! Image Selector.
//!
//! Phase 1 walks high-confidence sources (Open Graph, Twitter card,
//! `link[rel=image_src]`, images in content containers) and accepts every
//! valid match as a priority image. Phase 2 scores the remaining `<img>`
//! elements and fills the leftover slots by descending score. The result
//! never holds duplicate `src` values and never exceeds the quota.

use std::collections::HashSet;

use ego_tree::NodeId;
use scraper::ElementRef;
use url::Url;

use crate::dom::{
    attr_value, class_and_id, dimension_attr, element_text, has_ancestor, next_element_sibling,
    select_within, ParsedDocument,
};
use crate::extractors::fields::resolve_url;
use crate::preview::ImageCandidate;

/// Words naming tracking pixels and spacers. They match a host label, or a path
/// segment or file stem made up only of these words.
const INVALID_WORDS: &[&str] = &[
    "pixel",
    "tracking",
    "tracker",
    "analytics",
    "beacon",
    "spacer",
    "1x1",
    "doubleclick",
];

/// Placeholder file names matched whole.
const INVALID_FILE_NAMES: &[&str] = &["clear.gif", "blank.gif"];

/// Path words (singular or plural) that mark chrome graphics rather than content images.
const DECORATIVE_WORDS: &[&str] = &["icon", "favicon", "logo", "avatar", "button", "badge", "sprite"];

/// File extensions that are never images.
const NON_IMAGE_EXTENSIONS: &[&str] = &[".js", ".css", ".html", ".htm", ".json", ".xml"];

/// Data URIs at or below this payload size are placeholders.
const MIN_DATA_URI_PAYLOAD: usize = 200;

/// Explicit dimensions below this are layout spacers.
const SPACER_DIMENSION: u32 = 10;

/// Lazy-loading attributes consulted when `src` is missing or a placeholder.
const LAZY_SRC_ATTRS: &[&str] = &["data-src", "data-lazy-src", "data-original", "data-srcset"];

const CONTENT_IMG_SELECTOR: &str = "article img, main img, [role='main'] img, .post-content img, .article-content img, .entry-content img, .article-body img, .content img";

const GALLERY_IMG_SELECTOR: &str = ".gallery img, .carousel img, .slider img, .slideshow img, .swiper img, .swiper-slide img, .lightbox img, .image-gallery img, [data-gallery] img";

/// One high-confidence image source.
enum Source {
    /// `(selector, attribute)` on meta/link tags.
    Meta(&'static str, &'static str),
    /// `<img>` elements matched by a selector.
    Img(&'static str),
}

const PRIORITY_SOURCES: &[Source] = &[
    Source::Meta("meta[property='og:image']", "content"),
    Source::Meta("meta[property='og:image:secure_url']", "content"),
    Source::Meta("meta[property='og:image:url']", "content"),
    Source::Meta("meta[name='twitter:image']", "content"),
    Source::Meta("meta[name='twitter:image:src']", "content"),
    Source::Meta("meta[property='twitter:image']", "content"),
    Source::Meta("link[rel='image_src']", "href"),
    Source::Img(CONTENT_IMG_SELECTOR),
];

const GALLERY_SOURCES: &[Source] = &[Source::Img(GALLERY_IMG_SELECTOR)];

/// Checks if an image URL is valid (not a tracking pixel or similar).
///
/// Accepts absolute http(s) URLs and raster `data:image/` URIs with a real payload.
pub fn is_valid_image_url(url: &str) -> bool {
    let url_lower = url.to_lowercase();

    if url_lower.starts_with("data:") {
        return is_valid_data_uri(&url_lower);
    }

    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return false;
    }

    let path = parsed.path().to_lowercase();
    if is_tracking_url(parsed.host_str().unwrap_or_default(), &path) {
        return false;
    }

    if NON_IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return false;
    }

    !has_tiny_dimensions(&parsed)
}

fn is_valid_data_uri(lower: &str) -> bool {
    if !lower.starts_with("data:image/") || lower.starts_with("data:image/svg") {
        return false;
    }
    match lower.split_once(',') {
        Some((_, payload)) => payload.len() > MIN_DATA_URI_PAYLOAD,
        None => false,
    }
}

/// Alphanumeric runs of `text`, e.g. `brand-logo_2x.png` -> `brand`, `logo`, `2x`, `png`.
fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
}

fn is_tracking_url(host: &str, lower_path: &str) -> bool {
    let only_invalid_words = |part: &str| {
        let mut any = false;
        for word in words(part) {
            if !INVALID_WORDS.contains(&word) {
                return false;
            }
            any = true;
        }
        any
    };

    if host
        .to_ascii_lowercase()
        .split('.')
        .any(|label| INVALID_WORDS.contains(&label))
    {
        return true;
    }

    let mut segments: Vec<&str> = lower_path.split('/').filter(|s| !s.is_empty()).collect();
    let Some(file_name) = segments.pop() else {
        return false;
    };
    if INVALID_FILE_NAMES.contains(&file_name) {
        return true;
    }
    let stem = file_name
        .rsplit_once('.')
        .map_or(file_name, |(stem, _)| stem);
    only_invalid_words(stem) || segments.into_iter().any(only_invalid_words)
}

/// Query parameters such as `w=1&h=1` that mark 1x1 pixel images.
fn has_tiny_dimensions(url: &Url) -> bool {
    url.query_pairs().any(|(k, v)| {
        matches!(k.as_ref(), "w" | "h" | "width" | "height") && (v == "1" || v == "0")
    })
}

/// Resolves a possibly relative image URL and applies validity checks.
pub fn resolve_image_url(src: &str, base_url: &str) -> Option<String> {
    let resolved = resolve_url(src, base_url)?;
    is_valid_image_url(&resolved).then_some(resolved)
}

/// Raw source of an `<img>`, falling back to lazy-loading attributes.
pub fn img_src(el: &ElementRef) -> Option<String> {
    // Placeholder data URIs defer to the lazy-loading attributes.
    let src = attr_value(el, "src").filter(|s| !s.starts_with("data:") || is_valid_image_url(s));
    src.or_else(|| {
        LAZY_SRC_ATTRS.iter().find_map(|attr| {
            attr_value(el, attr).and_then(|v| {
                // srcset-style values: take the first URL.
                v.split([',', ' ']).find(|p| !p.is_empty()).map(str::to_string)
            })
        })
    })
}

fn is_decorative_src(src: &str) -> bool {
    let lower = src.to_lowercase();
    let location = lower.split(['?', '#']).next().unwrap_or_default();
    let decorative = words(location).any(|word| {
        let singular = word.strip_suffix('s').unwrap_or(word);
        DECORATIVE_WORDS.contains(&word) || DECORATIVE_WORDS.contains(&singular)
    });
    decorative
}

fn is_spacer(el: &ElementRef) -> bool {
    [dimension_attr(el, "width"), dimension_attr(el, "height")]
        .into_iter()
        .flatten()
        .any(|d| d < SPACER_DIMENSION)
}

fn is_lazy(el: &ElementRef) -> bool {
    el.value().attr("loading") == Some("lazy")
        || LAZY_SRC_ATTRS.iter().any(|a| el.value().attr(a).is_some())
        || class_and_id(el).contains("lazy")
}

fn in_content_container(el: &ElementRef) -> bool {
    has_ancestor(el, |a| {
        matches!(a.value().name(), "main" | "article") || class_and_id(a).contains("content")
    })
}

/// Whether an `<img>` is a real content image rather than a pixel or icon.
///
/// Explicit dimensions must both be at least 100; missing dimensions are accepted.
pub fn is_significant_image(el: &ElementRef, base_url: &str) -> bool {
    let Some(src) = img_src(el).and_then(|s| resolve_image_url(&s, base_url)) else {
        return false;
    };
    if is_decorative_src(&src) {
        return false;
    }
    [dimension_attr(el, "width"), dimension_attr(el, "height")]
        .into_iter()
        .flatten()
        .all(|d| d >= 100)
}

/// Heuristic score for a non-priority `<img>`.
pub fn score_image(el: &ElementRef, src: &str) -> i32 {
    let mut score = 0;

    if attr_value(el, "alt").is_some() {
        score += 10;
    }

    let width = dimension_attr(el, "width");
    let height = dimension_attr(el, "height");
    if let (Some(w), Some(h)) = (width, height) {
        if w >= 300 && h >= 200 {
            score += 20;
        } else if w >= 100 && h >= 100 {
            score += 10;
        }
        if h > 0 {
            let ratio = w as f64 / h as f64;
            if (0.5..=2.0).contains(&ratio) {
                score += 10;
            }
        }
    }
    if [width, height].into_iter().flatten().any(|d| d < 50) {
        score -= 30;
    }

    if has_ancestor(el, |a| a.value().name() == "figure") {
        score += 15;
    }
    if next_element_sibling(el).is_some_and(|s| is_caption_like(&s)) {
        score += 15;
    }
    if in_content_container(el) {
        score += 15;
    }
    if is_decorative_src(src) {
        score -= 20;
    }
    if is_lazy(el) && has_ancestor(el, |a| matches!(a.value().name(), "header" | "footer" | "nav"))
    {
        score -= 10;
    }

    score
}

fn is_caption_like(el: &ElementRef) -> bool {
    el.value().name() == "figcaption" || class_and_id(el).contains("caption")
}

/// Caption for a gallery image: figcaption, caption-class sibling, or descriptive alt text.
pub fn extract_caption(el: &ElementRef) -> Option<String> {
    let figure = crate::dom::ancestors(el).find(|a| a.value().name() == "figure");
    if let Some(figure) = figure {
        if let Some(caption) = select_within(&figure, "figcaption")
            .first()
            .map(element_text)
            .filter(|t| !t.is_empty())
        {
            return Some(caption);
        }
    }

    if let Some(sibling) = next_element_sibling(el).filter(is_caption_like) {
        let text = element_text(&sibling);
        if !text.is_empty() {
            return Some(text);
        }
    }

    attr_value(el, "alt").filter(|alt| is_descriptive_alt(alt))
}

/// Alt text that reads like a description rather than a filename or single label.
fn is_descriptive_alt(alt: &str) -> bool {
    let lower = alt.to_lowercase();
    alt.split_whitespace().count() >= 3
        && !lower.ends_with(".jpg")
        && !lower.ends_with(".png")
        && !lower.starts_with("image")
}

/// Accumulates candidates with src de-duplication.
struct Collector {
    seen: HashSet<String>,
    used_nodes: HashSet<NodeId>,
    out: Vec<ImageCandidate>,
}

impl Collector {
    fn new() -> Self {
        Self {
            seen: HashSet::new(),
            used_nodes: HashSet::new(),
            out: Vec::new(),
        }
    }

    fn push(&mut self, candidate: ImageCandidate) -> bool {
        if !self.seen.insert(candidate.src.clone()) {
            return false;
        }
        self.out.push(candidate);
        true
    }
}

fn candidate_from_img(
    el: &ElementRef,
    base_url: &str,
    priority: bool,
    with_caption: bool,
) -> Option<ImageCandidate> {
    if is_spacer(el) {
        return None;
    }
    let src = resolve_image_url(&img_src(el)?, base_url)?;
    Some(ImageCandidate {
        src,
        alt: attr_value(el, "alt").unwrap_or_default(),
        width: dimension_attr(el, "width"),
        height: dimension_attr(el, "height"),
        priority,
        caption: if with_caption { extract_caption(el) } else { None },
    })
}

fn meta_dimension(doc: &ParsedDocument, property: &str) -> Option<u32> {
    doc.attr_of(&format!("meta[property='{property}']"), "content")?
        .parse()
        .ok()
}

fn collect_priority(
    doc: &ParsedDocument,
    sources: &[Source],
    base_url: &str,
    with_caption: bool,
    limit: Option<usize>,
    collector: &mut Collector,
) {
    let full = |c: &Collector| limit.is_some_and(|max| c.out.len() >= max);

    for source in sources {
        if full(collector) {
            return;
        }
        match source {
            Source::Meta(selector, attr) => {
                for el in doc.select(selector) {
                    let Some(src) = attr_value(&el, attr).and_then(|s| resolve_image_url(&s, base_url))
                    else {
                        continue;
                    };
                    let is_og = selector.contains("og:image");
                    collector.push(ImageCandidate {
                        src,
                        alt: if is_og {
                            doc.attr_of("meta[property='og:image:alt']", "content")
                                .unwrap_or_default()
                        } else {
                            String::new()
                        },
                        width: is_og.then(|| meta_dimension(doc, "og:image:width")).flatten(),
                        height: is_og.then(|| meta_dimension(doc, "og:image:height")).flatten(),
                        priority: true,
                        caption: None,
                    });
                    if full(collector) {
                        return;
                    }
                }
            }
            Source::Img(selector) => {
                for el in doc.select(selector) {
                    if collector.used_nodes.contains(&el.id()) {
                        continue;
                    }
                    collector.used_nodes.insert(el.id());
                    if let Some(candidate) = candidate_from_img(&el, base_url, true, with_caption) {
                        collector.push(candidate);
                    }
                    if full(collector) {
                        return;
                    }
                }
            }
        }
    }
}

fn collect_scored(
    doc: &ParsedDocument,
    base_url: &str,
    with_caption: bool,
    significant_only: bool,
) -> Vec<(i32, ImageCandidate, NodeId)> {
    let mut scored = Vec::new();
    for el in doc.select("img") {
        if significant_only && !is_significant_image(&el, base_url) {
            continue;
        }
        let Some(candidate) = candidate_from_img(&el, base_url, false, with_caption) else {
            continue;
        };
        let score = score_image(&el, &candidate.src);
        scored.push((score, candidate, el.id()));
    }
    // Stable sort keeps document order among equal scores.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
}

/// Ranked images for a page: at most `max_images`, unique by `src`.
pub fn extract_important_images(
    doc: &ParsedDocument,
    max_images: usize,
    base_url: &str,
) -> Vec<ImageCandidate> {
    if max_images == 0 {
        return Vec::new();
    }
    let mut collector = Collector::new();
    collect_priority(doc, PRIORITY_SOURCES, base_url, false, Some(max_images), &mut collector);

    if collector.out.len() < max_images {
        for (_, candidate, node) in collect_scored(doc, base_url, false, false) {
            if collector.out.len() >= max_images {
                break;
            }
            if collector.used_nodes.contains(&node) {
                continue;
            }
            collector.push(candidate);
        }
    }

    collector.out
}

/// Gallery images with captions, plus the total number of gallery images found
/// before the quota was applied.
pub fn extract_gallery_images(
    doc: &ParsedDocument,
    max_images: usize,
    base_url: &str,
) -> (Vec<ImageCandidate>, usize) {
    let mut collector = Collector::new();
    collect_priority(doc, GALLERY_SOURCES, base_url, true, None, &mut collector);

    for (_, candidate, node) in collect_scored(doc, base_url, true, true) {
        if collector.used_nodes.contains(&node) {
            continue;
        }
        collector.push(candidate);
    }

    let total = collector.out.len();
    let mut images = collector.out;
    images.truncate(max_images);
    (images, total)
}
