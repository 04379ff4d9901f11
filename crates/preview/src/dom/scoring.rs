// ABOUTME: Readability-style candidate scoring for locating the main content block.
// ABOUTME: Scores div/section/main/article nodes by text mass, paragraphs, images and link density.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

use super::{class_and_id, element_text, select_within, ParsedDocument};

/// Class/id tokens that mark navigation, chrome and promotional blocks.
pub static BOILERPLATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:^|[\s_-])(comments?|sidebar|menu|nav|navbar|navigation|footer|header|ads?|advert\w*|widgets?|share|sharing|social|related|promo\w*|banner|popup|modal)(?:[\s_-]|$)",
    )
    .unwrap()
});

/// Tags scored as main content candidates.
const CANDIDATE_SELECTOR: &str = "div, section, main, article";

/// Descendants whose presence marks a candidate as partly page chrome.
const CHROME_SELECTOR: &str = "nav, header, footer, aside, .sidebar, .menu, #sidebar, #menu";

/// Minimum text length for a block to be considered at all.
pub const MIN_CANDIDATE_TEXT: usize = 100;

/// Whether the element's class or id names it as boilerplate.
pub fn is_boilerplate(element: &ElementRef) -> bool {
    let class_id = class_and_id(element);
    !class_id.trim().is_empty() && BOILERPLATE_RE.is_match(&class_id)
}

/// Calculate link density (ratio of link text to total text).
pub fn link_density(element: &ElementRef) -> f64 {
    let total_len = element_text(element).chars().count();
    if total_len == 0 {
        return 0.0;
    }

    let link_text_len: usize = select_within(element, "a")
        .iter()
        .map(|a| element_text(a).chars().count())
        .sum();

    link_text_len as f64 / total_len as f64
}

/// Score one candidate block. `None` when the block is too short or named as boilerplate.
pub fn score_candidate(element: &ElementRef) -> Option<f64> {
    let text_length = element_text(element).chars().count();
    if text_length < MIN_CANDIDATE_TEXT || is_boilerplate(element) {
        return None;
    }

    let paragraphs = select_within(element, "p").len();
    let images = select_within(element, "img").len();

    let mut score = (text_length as f64 * 0.1).min(1000.0);
    score += 25.0 * paragraphs as f64;
    score += ((images * 10) as f64).min(50.0);

    if link_density(element) > 0.5 {
        score -= 100.0;
    }
    if !select_within(element, CHROME_SELECTOR).is_empty() {
        score -= 50.0;
    }
    if element.value().name().eq_ignore_ascii_case("article") {
        score += 50.0;
    }

    Some(score)
}

/// Find the highest scoring content block. Ties keep the earlier element in document order.
pub fn find_top_candidate(doc: &ParsedDocument) -> Option<ElementRef<'_>> {
    let mut best: Option<(ElementRef, f64)> = None;

    for element in doc.select(CANDIDATE_SELECTOR) {
        let Some(score) = score_candidate(&element) else {
            continue;
        };
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((element, score)),
        }
    }

    best.map(|(el, _)| el)
}
