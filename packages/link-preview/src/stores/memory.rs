//! In-memory record cache with LRU eviction and a fixed TTL.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::traits::cache::RecordCache;
use crate::types::record::MetadataRecord;

struct CacheEntry {
    record: MetadataRecord,
    expires_at: Instant,
}

struct Entries {
    lru: LruCache<String, CacheEntry>,
    /// Lower bound on the earliest `expires_at` held. No entry can have
    /// expired before this instant, so a full cache skips the purge scan.
    next_expiry: Option<Instant>,
}

impl Entries {
    /// Drop every expired entry and tighten `next_expiry`.
    fn purge_expired(&mut self, now: Instant) -> usize {
        if self.next_expiry.map_or(true, |at| at > now) {
            return 0;
        }
        let expired: Vec<String> = self
            .lru
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.lru.pop(key);
        }
        self.next_expiry = self.lru.iter().map(|(_, entry)| entry.expires_at).min();
        expired.len()
    }
}

/// Bounded in-memory cache of resolved records.
///
/// Holds at most `capacity` entries. When full, expired entries are purged
/// first and then the least recently used entry is evicted. A `get` on an
/// expired entry removes it and reports a miss. Data is lost on restart.
pub struct MemoryCache {
    entries: Mutex<Entries>,
    ttl: Duration,
}

impl MemoryCache {
    /// Create a cache. A zero capacity is raised to one.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(Entries {
                lru: LruCache::new(capacity),
                next_expiry: None,
            }),
            ttl,
        }
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().lru.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.lru.clear();
        entries.next_expiry = None;
    }

    // A panic while holding the lock leaves the map itself intact.
    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecordCache for MemoryCache {
    fn get(&self, url: &str) -> Option<MetadataRecord> {
        let mut entries = self.lock();
        let now = Instant::now();
        let expired = match entries.lru.get(url) {
            Some(entry) if entry.expires_at > now => return Some(entry.record.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.lru.pop(url);
        }
        None
    }

    fn set(&self, url: &str, record: MetadataRecord) {
        let mut entries = self.lock();
        let now = Instant::now();
        if !entries.lru.contains(url) && entries.lru.len() >= entries.lru.cap().get() {
            let purged = entries.purge_expired(now);
            if purged > 0 {
                tracing::debug!(purged, "purged expired cache entries");
            }
        }
        let expires_at = now + self.ttl;
        entries.next_expiry = Some(entries.next_expiry.map_or(expires_at, |at| at.min(expires_at)));
        // `put` evicts the least recently used entry if still full.
        entries.lru.put(url.to_string(), CacheEntry { record, expires_at });
    }
}
