// ABOUTME: Short-TTL preview cache keyed by URL with oldest-first eviction.
// ABOUTME: Expired entries read as misses; a Mutex keeps concurrent get/set consistent.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::options::{MAX_CACHE_TTL, MIN_CACHE_TTL};
use crate::preview::PreviewRecord;

#[derive(Debug, Clone)]
struct CacheEntry {
    record: PreviewRecord,
    stored_at: Instant,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    /// Keys in insertion order, oldest first.
    order: VecDeque<String>,
}

impl Inner {
    fn remove(&mut self, url: &str) {
        if self.entries.remove(url).is_some() {
            self.order.retain(|k| k != url);
        }
    }
}

/// TTL + insertion-order LRU cache of preview records.
#[derive(Debug)]
pub struct PreviewCache {
    ttl: Duration,
    capacity: usize,
    inner: Mutex<Inner>,
}

impl PreviewCache {
    /// A cache whose TTL is clamped to 5..=60 minutes.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl: ttl.clamp(MIN_CACHE_TTL, MAX_CACHE_TTL),
            capacity: capacity.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // Records are immutable once stored, so a poisoned lock still guards valid data.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, url: &str) -> Option<PreviewRecord> {
        self.get_at(url, Instant::now())
    }

    /// Lookup as of `now`. Entries at or past the TTL are dropped and reported as misses.
    pub fn get_at(&self, url: &str, now: Instant) -> Option<PreviewRecord> {
        let mut inner = self.lock();
        let entry = inner.entries.get(url)?;
        if now.saturating_duration_since(entry.stored_at) < self.ttl {
            trace!(url, "preview cache hit");
            return Some(entry.record.clone());
        }
        trace!(url, "preview cache entry expired");
        inner.remove(url);
        None
    }

    pub fn set(&self, url: &str, record: PreviewRecord) {
        self.set_at(url, record, Instant::now());
    }

    /// Store `record` as of `now`, replacing any existing entry and evicting the oldest when full.
    pub fn set_at(&self, url: &str, record: PreviewRecord, now: Instant) {
        let mut inner = self.lock();
        inner.remove(url);
        while inner.entries.len() >= self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            trace!(url = %oldest, "preview cache eviction");
            inner.entries.remove(&oldest);
        }
        inner.order.push_back(url.to_string());
        inner.entries.insert(
            url.to_string(),
            CacheEntry {
                record,
                stored_at: now,
            },
        );
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut inner = self.lock();
        let ttl = self.ttl;
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, e)| now.saturating_duration_since(e.stored_at) >= ttl)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            inner.remove(key);
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}
