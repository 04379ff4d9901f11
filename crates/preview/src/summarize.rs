// ABOUTME: Extractive summarizer: frequency-weighted sentence scoring with positional and phrase boosts.
// ABOUTME: Also provides abbreviation-safe sentence splitting and boundary-aware truncation.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

/// Stand-in for periods that must not end a sentence.
const PLACEHOLDER: char = '\u{E000}';

static ABBREVIATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(Mr|Mrs|Ms|Dr|Prof|Sr|Jr|St|Mt|Inc|Ltd|Co|Corp|vs|etc|Fig|No|Vol|approx|Gen|Gov|Sen|Rep|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec)\.")
        .unwrap()
});

static DOTTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:e\.g|i\.e|U\.S|U\.K|a\.m|p\.m|Ph\.D)\.").unwrap());

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her",
        "was", "one", "our", "out", "has", "him", "his", "how", "its", "may", "new", "now",
        "old", "see", "two", "who", "did", "get", "let", "say", "she", "too", "use", "that",
        "with", "have", "this", "will", "your", "from", "they", "been", "more", "when",
        "were", "what", "which", "their", "there", "would", "about", "could", "other",
        "into", "than", "then", "them", "these", "some", "also", "just", "only", "over",
        "such", "very", "most", "many", "much", "where", "while", "after", "before", "being",
        "each", "those", "should", "because", "through", "does", "here", "said", "says",
        "like", "well", "even", "both", "between", "under", "again", "same", "own",
    ]
    .into_iter()
    .collect()
});

const KEY_PHRASES: &[&str] = &[
    "in conclusion",
    "in summary",
    "to summarize",
    "importantly",
    "therefore",
    "as a result",
    "notably",
    "significantly",
    "crucially",
    "overall",
    "key finding",
    "the main",
];

const MIN_SENTENCE_CHARS: usize = 10;
const MIN_SENTENCE_WORDS: usize = 3;
const LONG_SENTENCE_WORDS: usize = 40;

fn protect_abbreviations(text: &str) -> String {
    let text = DOTTED_RE.replace_all(text, |caps: &regex::Captures| {
        caps[0].replace('.', &PLACEHOLDER.to_string())
    });
    ABBREVIATION_RE
        .replace_all(&text, format!("${{1}}{PLACEHOLDER}").as_str())
        .into_owned()
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | '\u{201D}' | '\u{2019}')
}

/// Split text into sentences, dropping fragments too short to be real sentences.
pub fn split_sentences(text: &str) -> Vec<String> {
    let protected = protect_abbreviations(text);
    let chars: Vec<char> = protected.chars().collect();
    let mut raw = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '\n' {
            raw.push(std::mem::take(&mut current));
            continue;
        }
        current.push(c);
        let ends = is_terminal(c) || (is_closer(c) && i > 0 && is_terminal(chars[i - 1]));
        if ends && chars.get(i + 1).map_or(true, |n| n.is_whitespace()) {
            raw.push(std::mem::take(&mut current));
        }
    }
    raw.push(current);

    raw.into_iter()
        .map(|s| crate::dom::normalize_spaces(&s.replace(PLACEHOLDER, ".")))
        .filter(|s| {
            s.chars().count() > MIN_SENTENCE_CHARS && s.split_whitespace().count() > MIN_SENTENCE_WORDS
        })
        .collect()
}

fn content_words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| w.chars().count() >= 3 && !STOP_WORDS.contains(w.as_str()))
}

/// Word weights normalized by the most frequent content word.
fn word_weights(text: &str) -> HashMap<String, f64> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in content_words(text) {
        *counts.entry(word).or_insert(0) += 1;
    }
    let max = counts.values().copied().max().unwrap_or(0);
    if max == 0 {
        return HashMap::new();
    }
    counts
        .into_iter()
        .map(|(w, c)| (w, c as f64 / max as f64))
        .collect()
}

fn score_sentence(
    sentence: &str,
    index: usize,
    total: usize,
    weights: &HashMap<String, f64>,
) -> Option<f64> {
    let scores: Vec<f64> = content_words(sentence)
        .filter_map(|w| weights.get(&w).copied())
        .collect();
    if scores.is_empty() {
        return None;
    }
    let mut score = scores.iter().sum::<f64>() / scores.len() as f64;

    if index == 0 {
        score *= 1.5;
    } else if (index as f64) < total as f64 * 0.2 {
        score *= 1.3;
    }
    if index + 1 == total {
        score *= 1.2;
    }

    let lower = sentence.to_lowercase();
    if KEY_PHRASES.iter().any(|p| lower.contains(p)) {
        score *= 1.3;
    }
    if sentence.trim_end().ends_with('?') {
        score *= 0.8;
    }
    if sentence.split_whitespace().count() > LONG_SENTENCE_WORDS {
        score *= 0.9;
    }

    Some(score)
}

/// Summarize `text` into at most `max_sentences` sentences and `max_chars` characters.
///
/// Returns an empty string only for empty (or whitespace-only) input, or when
/// `max_chars` is zero.
pub fn summarize(text: &str, max_sentences: usize, max_chars: usize) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    let sentences = split_sentences(text);
    if sentences.len() <= 2 {
        let lead = sentences
            .into_iter()
            .next()
            .unwrap_or_else(|| crate::dom::normalize_spaces(text));
        return truncate(&lead, max_chars);
    }

    let weights = word_weights(text);
    let total = sentences.len();
    let mut scored: Vec<(usize, f64)> = sentences
        .iter()
        .enumerate()
        .filter_map(|(i, s)| score_sentence(s, i, total, &weights).map(|score| (i, score)))
        .collect();

    if scored.is_empty() {
        return truncate(&sentences[0], max_chars);
    }

    // Stable sort keeps earlier sentences ahead on ties.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(max_sentences.max(1));
    scored.sort_by_key(|(i, _)| *i);

    let joined = scored
        .iter()
        .map(|(i, _)| sentences[*i].as_str())
        .collect::<Vec<_>>()
        .join(" ");
    truncate(&joined, max_chars)
}

/// Cut `text` to at most `max_chars` characters.
///
/// Prefers the last sentence end past the halfway mark, then the last word
/// boundary past halfway (with an ellipsis), then a hard cut with an ellipsis.
pub fn truncate(text: &str, max_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return text.to_string();
    }
    if max_chars < 3 {
        return chars[..max_chars].iter().collect();
    }

    let half = max_chars / 2;
    let window = &chars[..max_chars];

    let sentence_end = (half..max_chars).rev().find(|&i| {
        is_terminal(window[i]) && chars.get(i + 1).map_or(true, |c| c.is_whitespace())
    });
    if let Some(end) = sentence_end {
        return window[..=end].iter().collect();
    }

    let budget = max_chars - 3;
    let word_end = (half..=budget)
        .rev()
        .find(|&i| chars.get(i).is_some_and(|c| c.is_whitespace()));
    let cut = word_end.unwrap_or(budget);
    let head: String = chars[..cut].iter().collect();
    format!("{}...", head.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ARTICLE: &str = "Rust ownership rules prevent data races at compile time. \
        The borrow checker enforces these ownership rules for every reference. \
        Some developers find the learning curve steep at first. \
        Lunch was served at noon in the cafeteria downstairs. \
        Importantly, ownership and borrowing make memory safety possible without garbage collection. \
        The weather stayed cloudy for most of the afternoon. \
        In conclusion, ownership rules are the heart of Rust memory safety.";

    #[test]
    fn test_empty_input() {
        assert_eq!(summarize("", 3, 280), "");
        assert_eq!(summarize("   \n ", 3, 280), "");
    }

    #[test]
    fn test_short_text_returns_first_sentence() {
        let text = "This is the only real sentence here. Tiny.";
        assert_eq!(summarize(text, 3, 280), "This is the only real sentence here.");
    }

    #[test]
    fn test_unsplittable_text_is_truncated() {
        let text = "word ".repeat(100);
        let out = summarize(&text, 3, 50);
        assert!(!out.is_empty());
        assert!(out.chars().count() <= 50);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_fragments_only_fall_back_to_text() {
        assert_eq!(summarize("Hi there.", 3, 280), "Hi there.");
    }

    #[test]
    fn test_abbreviations_do_not_split() {
        let sentences = split_sentences(
            "Dr. Smith met Mr. Jones at the U.S. embassy today. They discussed trade, e.g. tariffs and quotas.",
        );
        assert_eq!(
            sentences,
            vec![
                "Dr. Smith met Mr. Jones at the U.S. embassy today.",
                "They discussed trade, e.g. tariffs and quotas.",
            ]
        );
    }

    #[test]
    fn test_split_on_newlines_and_quotes() {
        let sentences = split_sentences(
            "A heading without punctuation here\nShe said \"it works fine now.\" Then everyone left the room.",
        );
        assert_eq!(
            sentences,
            vec![
                "A heading without punctuation here",
                "She said \"it works fine now.\"",
                "Then everyone left the room.",
            ]
        );
    }

    #[test]
    fn test_summary_keeps_narrative_order_and_topic() {
        let summary = summarize(ARTICLE, 3, 1000);
        assert!(summary.starts_with("Rust ownership rules prevent data races"));
        assert!(summary.contains("In conclusion"));
        assert!(!summary.contains("Lunch"));
        assert!(!summary.contains("weather"));
        let first = summary.find("Rust ownership").unwrap();
        let last = summary.find("In conclusion").unwrap();
        assert!(first < last);
    }

    #[test]
    fn test_summary_respects_limits() {
        for max in [0usize, 1, 2, 3, 10, 50, 120, 280] {
            let out = summarize(ARTICLE, 3, max);
            assert!(out.chars().count() <= max, "max {max}: {out}");
        }
        let one = summarize(ARTICLE, 1, 1000);
        assert_eq!(split_sentences(&one).len(), 1);
    }

    #[test]
    fn test_truncate_prefers_sentence_boundary() {
        let text = "First sentence is here. Second sentence runs on and on and on.";
        assert_eq!(truncate(text, 40), "First sentence is here.");
    }

    #[test]
    fn test_truncate_word_boundary() {
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        let out = truncate(text, 20);
        assert_eq!(out, "alpha beta gamma...");
        assert!(out.chars().count() <= 20);
    }

    #[test]
    fn test_truncate_hard_cut() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        assert_eq!(truncate(text, 10), "abcdefg...");
        assert_eq!(truncate(text, 2), "ab");
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let text = "é".repeat(30);
        let out = truncate(&text, 10);
        assert_eq!(out.chars().count(), 10);
    }
}
