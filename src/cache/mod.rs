//! Shared LRU response cache.
//!
//! # Responsibilities
//! - Map raw request bytes to buffered origin responses
//! - Enforce per-entry and total byte capacity via LRU eviction
//! - Provide safe concurrent access for all workers
//!
//! # Design Decisions
//! - One `std::sync::Mutex` guards all cache state; it is only held for map
//!   operations, never across await points, and eviction plus insert happen
//!   inside a single lock acquisition so footprint accounting stays exact
//! - Recency is an explicit index: a key map plus a `BTreeMap` ordered by a
//!   strictly monotonic access stamp, making lookup and eviction logarithmic
//!   instead of full scans; unique stamps keep eviction order deterministic
//! - Bodies are handed out as `Arc<[u8]>` so hits stream without the lock

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use crate::observability::metrics;

/// Fixed accounting charge per entry, on top of key and body bytes.
pub const ENTRY_OVERHEAD: usize = 64;

struct CacheEntry {
    body: Arc<[u8]>,
    footprint: usize,
    stamp: u64,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<Arc<[u8]>, CacheEntry>,
    /// Access stamp → key, oldest first. Kept in sync with `entries`.
    recency: BTreeMap<u64, Arc<[u8]>>,
    total_bytes: usize,
    clock: u64,
}

impl CacheInner {
    fn next_stamp(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Drop the least-recently-used entry. Returns false when empty.
    fn evict_oldest(&mut self) -> bool {
        let Some((_, key)) = self.recency.pop_first() else {
            return false;
        };
        let entry = self
            .entries
            .remove(&key)
            .expect("recency index out of sync with entries");
        self.total_bytes -= entry.footprint;
        metrics::record_cache_eviction();
        tracing::debug!(
            freed_bytes = entry.footprint,
            total_bytes = self.total_bytes,
            "Evicted least-recently-used cache entry"
        );
        true
    }

    fn remove_key(&mut self, key: &[u8]) {
        if let Some(entry) = self.entries.remove(key) {
            self.recency.remove(&entry.stamp);
            self.total_bytes -= entry.footprint;
        }
    }
}

/// Process-wide response cache shared by every worker.
pub struct ResponseCache {
    capacity_bytes: usize,
    max_entry_bytes: usize,
    inner: Mutex<CacheInner>,
}

impl ResponseCache {
    /// Create a cache. An entry can never be allowed to exceed the whole
    /// cache, so `max_entry_bytes` is clamped to `capacity_bytes`.
    pub fn new(capacity_bytes: usize, max_entry_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            max_entry_bytes: max_entry_bytes.min(capacity_bytes),
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Look up a response body by exact raw-request key.
    ///
    /// A hit refreshes the entry's recency before returning.
    pub fn lookup(&self, key: &[u8]) -> Option<Arc<[u8]>> {
        let mut guard = self.inner.lock().expect("cache lock poisoned");
        let inner = &mut *guard;
        let stamp = inner.next_stamp();
        let entry = inner.entries.get_mut(key)?;
        let shared_key = inner
            .recency
            .remove(&entry.stamp)
            .expect("recency index out of sync with entries");
        entry.stamp = stamp;
        inner.recency.insert(stamp, shared_key);
        Some(Arc::clone(&entry.body))
    }

    /// Insert a response body keyed by the raw request bytes.
    ///
    /// Best effort: an entry whose footprint exceeds the per-entry maximum
    /// is silently not cached. Otherwise least-recently-used entries are
    /// evicted until the new entry fits, all under one lock acquisition.
    pub fn insert(&self, key: &[u8], body: &[u8]) {
        let footprint = body.len() + key.len() + ENTRY_OVERHEAD;
        if footprint > self.max_entry_bytes {
            tracing::debug!(
                footprint,
                max_entry_bytes = self.max_entry_bytes,
                "Response too large to cache"
            );
            return;
        }

        let mut guard = self.inner.lock().expect("cache lock poisoned");
        let inner = &mut *guard;

        // A fresh insert for an already-cached key replaces the old entry.
        inner.remove_key(key);
        while inner.total_bytes + footprint > self.capacity_bytes {
            if !inner.evict_oldest() {
                break;
            }
        }

        let stamp = inner.next_stamp();
        let shared_key: Arc<[u8]> = Arc::from(key);
        inner.recency.insert(stamp, Arc::clone(&shared_key));
        inner.entries.insert(
            shared_key,
            CacheEntry {
                body: Arc::from(body),
                footprint,
                stamp,
            },
        );
        inner.total_bytes += footprint;
        metrics::record_cache_footprint(inner.total_bytes);
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache lock poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current total footprint in bytes.
    pub fn total_bytes(&self) -> usize {
        self.inner.lock().expect("cache lock poisoned").total_bytes
    }

    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn footprint(key: &[u8], body: &[u8]) -> usize {
        key.len() + body.len() + ENTRY_OVERHEAD
    }

    #[test]
    fn insert_then_lookup_returns_body() {
        let cache = ResponseCache::new(1 << 20, 1 << 16);
        cache.insert(b"GET a", b"alpha");
        assert_eq!(cache.lookup(b"GET a").as_deref(), Some(&b"alpha"[..]));
    }

    #[test]
    fn absent_key_is_a_miss() {
        let cache = ResponseCache::new(1 << 20, 1 << 16);
        cache.insert(b"GET a", b"alpha");
        assert!(cache.lookup(b"GET b").is_none());
    }

    #[test]
    fn oversized_entry_is_silently_skipped() {
        let cache = ResponseCache::new(1 << 20, 100);
        let body = vec![0u8; 101];
        cache.insert(b"GET big", &body);
        assert!(cache.lookup(b"GET big").is_none());
        assert_eq!(cache.total_bytes(), 0);
    }

    #[test]
    fn footprint_accounting_tracks_inserts() {
        let cache = ResponseCache::new(1 << 20, 1 << 16);
        cache.insert(b"GET a", b"alpha");
        cache.insert(b"GET b", b"beta");
        assert_eq!(
            cache.total_bytes(),
            footprint(b"GET a", b"alpha") + footprint(b"GET b", b"beta")
        );
    }

    #[test]
    fn reinserting_a_key_replaces_the_old_entry() {
        let cache = ResponseCache::new(1 << 20, 1 << 16);
        cache.insert(b"GET a", b"old");
        cache.insert(b"GET a", b"new body");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.total_bytes(), footprint(b"GET a", b"new body"));
        assert_eq!(cache.lookup(b"GET a").as_deref(), Some(&b"new body"[..]));
    }

    #[test]
    fn eviction_removes_oldest_until_new_entry_fits() {
        // Room for exactly two entries of this shape.
        let entry = footprint(b"k1", b"0123456789");
        let cache = ResponseCache::new(entry * 2, entry);
        cache.insert(b"k1", b"0123456789");
        cache.insert(b"k2", b"0123456789");
        cache.insert(b"k3", b"0123456789");

        assert!(cache.lookup(b"k1").is_none(), "oldest entry evicted");
        assert!(cache.lookup(b"k2").is_some());
        assert!(cache.lookup(b"k3").is_some());
        assert!(cache.total_bytes() <= cache.capacity_bytes());
    }

    #[test]
    fn lookup_refreshes_recency() {
        let entry = footprint(b"k1", b"0123456789");
        let cache = ResponseCache::new(entry * 2, entry);
        cache.insert(b"k1", b"0123456789");
        cache.insert(b"k2", b"0123456789");

        // k1 becomes most recent, so k2 is the eviction victim.
        assert!(cache.lookup(b"k1").is_some());
        cache.insert(b"k3", b"0123456789");

        assert!(cache.lookup(b"k1").is_some());
        assert!(cache.lookup(b"k2").is_none());
        assert!(cache.lookup(b"k3").is_some());
    }

    #[test]
    fn entry_limit_is_clamped_to_capacity() {
        // Misconfigured per-entry limit above total capacity must not let
        // a single entry blow past the capacity invariant.
        let cache = ResponseCache::new(100, 1000);
        let body = vec![0u8; 200];
        cache.insert(b"GET big", &body);
        assert!(cache.lookup(b"GET big").is_none());
        assert_eq!(cache.total_bytes(), 0);
    }

    #[test]
    fn capacity_invariant_holds_across_churn() {
        let cache = ResponseCache::new(500, 400);
        for i in 0..50u32 {
            let key = format!("GET http://host/{i}");
            let body = vec![i as u8; (i % 40) as usize];
            cache.insert(key.as_bytes(), &body);
            assert!(cache.total_bytes() <= cache.capacity_bytes());
        }
    }
}
