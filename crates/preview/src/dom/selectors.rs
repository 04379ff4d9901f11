// ABOUTME: Pre-compiled CSS selector cache shared by every pipeline stage.
// ABOUTME: Eliminates repeated parsing of the fixed selector lists in hot paths.

//! Selector caching for efficient repeated DOM queries.
//!
//! The classifier, image selector and readability extractor all walk long,
//! fixed selector lists on every extraction. Parsing a selector costs more
//! than matching it against a small document, so compiled selectors are
//! kept for the lifetime of the process.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use scraper::Selector;

/// Thread-safe cache of compiled CSS selectors. Invalid selectors are cached as `None`.
static SELECTOR_CACHE: Lazy<RwLock<HashMap<String, Option<Selector>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Gets or compiles a CSS selector, caching the result.
///
/// Returns `Some(Selector)` if the selector is valid, `None` if invalid.
pub fn get_or_compile(css: &str) -> Option<Selector> {
    {
        let cache = SELECTOR_CACHE.read().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = cache.get(css) {
            return cached.clone();
        }
    }

    let compiled = Selector::parse(css).ok();
    let mut cache = SELECTOR_CACHE.write().unwrap_or_else(|e| e.into_inner());
    // Another thread may have inserted while we compiled.
    if let Some(cached) = cache.get(css) {
        return cached.clone();
    }
    cache.insert(css.to_string(), compiled.clone());
    compiled
}
