// Search result cache
// Holds finished search responses keyed by the validated search parameters.
// Entries expire after their TTL; when full, the least recently used entry is evicted.
// Any price edit must invalidate the whole cache.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::aggregator::{SearchResponse, ValidatedSearch};

#[derive(Debug, Default)]
pub struct CacheStats {
    pub items_count: AtomicUsize,
    pub hit_count: AtomicUsize,
    pub miss_count: AtomicUsize,
    pub eviction_count: AtomicUsize,
    pub expired_count: AtomicUsize,
    pub invalidation_count: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CacheStatsReport {
    pub items_count: usize,
    pub hit_count: usize,
    pub miss_count: usize,
    pub eviction_count: usize,
    pub expired_count: usize,
    pub invalidation_count: usize,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub default_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1024,
            default_ttl_seconds: 300,
        }
    }
}

// Child order is part of the key: room splits depend on it
pub fn create_cache_key(search: &ValidatedSearch) -> String {
    let ages: Vec<String> = search.child_ages.iter().map(|age| age.to_string()).collect();
    format!(
        "{}:{}:{}:{}",
        search.check_in,
        search.check_out,
        search.adults,
        ages.join(",")
    )
}

struct CacheEntry {
    response: Arc<SearchResponse>,
    created_at: Instant,
    ttl: Duration,
    // Logical clock value of the last access
    last_accessed: u64,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}

pub struct SearchCache {
    entries: DashMap<String, CacheEntry>,
    config: CacheConfig,
    clock: AtomicU64,
    stats: CacheStats,
}

impl SearchCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
            clock: AtomicU64::new(0),
            stats: CacheStats::default(),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::SeqCst)
    }

    pub fn get(&self, search: &ValidatedSearch) -> Option<Arc<SearchResponse>> {
        let key = create_cache_key(search);

        let expired = match self.entries.get_mut(&key) {
            Some(mut entry) if !entry.is_expired() => {
                entry.last_accessed = self.tick();
                self.stats.hit_count.fetch_add(1, Ordering::SeqCst);
                return Some(Arc::clone(&entry.response));
            }
            Some(_) => true,
            None => false,
        };

        // The map guard is released before removing
        if expired && self.entries.remove(&key).is_some() {
            self.stats.items_count.fetch_sub(1, Ordering::SeqCst);
            self.stats.expired_count.fetch_add(1, Ordering::SeqCst);
        }
        self.stats.miss_count.fetch_add(1, Ordering::SeqCst);
        None
    }

    /// Store a response. Returns false when the cache is configured with no room.
    pub fn store(
        &self,
        search: &ValidatedSearch,
        response: Arc<SearchResponse>,
        ttl: Option<Duration>,
    ) -> bool {
        if self.config.max_entries == 0 {
            return false;
        }

        let key = create_cache_key(search);
        while !self.entries.contains_key(&key) && self.entries.len() >= self.config.max_entries {
            if !self.evict_least_recently_used() {
                break;
            }
        }

        let entry = CacheEntry {
            response,
            created_at: Instant::now(),
            ttl: ttl.unwrap_or_else(|| Duration::from_secs(self.config.default_ttl_seconds)),
            last_accessed: self.tick(),
        };
        if self.entries.insert(key, entry).is_none() {
            self.stats.items_count.fetch_add(1, Ordering::SeqCst);
        }
        true
    }

    fn evict_least_recently_used(&self) -> bool {
        let oldest_key = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().last_accessed)
            .map(|entry| entry.key().clone());

        match oldest_key.and_then(|key| self.entries.remove(&key)) {
            Some((key, _)) => {
                tracing::debug!(%key, "evicted cached search");
                self.stats.items_count.fetch_sub(1, Ordering::SeqCst);
                self.stats.eviction_count.fetch_add(1, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    // Drop every entry; returns how many were removed
    pub fn invalidate_all(&self) -> usize {
        let keys: Vec<String> = self.entries.iter().map(|entry| entry.key().clone()).collect();

        let mut removed = 0;
        for key in keys {
            if self.entries.remove(&key).is_some() {
                removed += 1;
            }
        }

        self.stats.items_count.fetch_sub(removed, Ordering::SeqCst);
        self.stats.invalidation_count.fetch_add(1, Ordering::SeqCst);
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStatsReport {
        CacheStatsReport {
            items_count: self.stats.items_count.load(Ordering::SeqCst),
            hit_count: self.stats.hit_count.load(Ordering::SeqCst),
            miss_count: self.stats.miss_count.load(Ordering::SeqCst),
            eviction_count: self.stats.eviction_count.load(Ordering::SeqCst),
            expired_count: self.stats.expired_count.load(Ordering::SeqCst),
            invalidation_count: self.stats.invalidation_count.load(Ordering::SeqCst),
        }
    }
}
