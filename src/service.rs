// Hotel price search service
// Async front for the aggregator: validates requests, serves repeated searches from the
// result cache and applies price edits to a shared reference-data snapshot.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use crate::admin::{PriceEditError, RateUpdate};
use crate::aggregator::{
    HotelPriceAggregator, SearchConfig, SearchError, SearchRequest, SearchResponse,
};
use crate::reference::{RatePeriod, ReferenceData};
use crate::result_cache::{CacheConfig, CacheStatsReport, SearchCache};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    PriceEdit(#[from] PriceEditError),

    #[error("Search task failed: {0}")]
    TaskFailed(String),
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub search: SearchConfig,
    pub cache: CacheConfig,
    pub cache_enabled: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            cache: CacheConfig::default(),
            cache_enabled: true,
        }
    }
}

#[derive(Debug, Default)]
struct ServiceCounters {
    searches: AtomicUsize,
    cache_hits: AtomicUsize,
    rejected_requests: AtomicUsize,
    price_edits: AtomicUsize,
    computed_searches: AtomicUsize,
    total_search_time_us: AtomicU64,
}

#[derive(Debug, Default, Clone)]
pub struct ServiceStats {
    pub searches: usize,
    pub cache_hits: usize,
    pub rejected_requests: usize,
    pub price_edits: usize,
    // Over searches that were computed, not served from cache
    pub average_search_time_ms: f64,
    pub cache: CacheStatsReport,
}

#[async_trait]
pub trait PriceSearchService: Send + Sync + 'static {
    // Validate and run a search against the current rates
    async fn search(&self, request: SearchRequest) -> Result<Arc<SearchResponse>, ServiceError>;

    // Replace the whole rate table, returning the number of rates stored
    async fn replace_rates(&self, rates: Vec<RatePeriod>) -> Result<usize, ServiceError>;

    // Edit a single rate period
    async fn update_rate(&self, update: RateUpdate) -> Result<RatePeriod, ServiceError>;

    fn rates(&self) -> Vec<RatePeriod>;

    fn stats(&self) -> ServiceStats;
}

pub struct HotelPriceService {
    data: RwLock<Arc<ReferenceData>>,
    // Bumped on every price edit so results computed from older data are not cached
    data_version: AtomicU64,
    aggregator: HotelPriceAggregator,
    cache: SearchCache,
    cache_enabled: bool,
    counters: ServiceCounters,
}

impl HotelPriceService {
    pub fn new(data: ReferenceData, config: ServiceConfig) -> Self {
        Self {
            data: RwLock::new(Arc::new(data)),
            data_version: AtomicU64::new(0),
            aggregator: HotelPriceAggregator::new(config.search),
            cache: SearchCache::new(config.cache),
            cache_enabled: config.cache_enabled,
            counters: ServiceCounters::default(),
        }
    }

    pub fn snapshot(&self) -> Arc<ReferenceData> {
        self.data.read().clone()
    }

    fn edit_data<T>(
        &self,
        edit: impl FnOnce(&mut ReferenceData) -> Result<T, PriceEditError>,
    ) -> Result<T, ServiceError> {
        // Cleared under the write lock; searches only store under the read lock
        let (result, dropped) = {
            let mut data = self.data.write();
            let result = edit(Arc::make_mut(&mut *data))?;
            self.data_version.fetch_add(1, Ordering::SeqCst);
            (result, self.cache.invalidate_all())
        };

        self.counters.price_edits.fetch_add(1, Ordering::SeqCst);
        tracing::info!(dropped, "prices changed, search cache cleared");
        Ok(result)
    }

    fn record_search_time(&self, started: Instant) {
        let elapsed_us = started.elapsed().as_micros() as u64;
        self.counters.computed_searches.fetch_add(1, Ordering::SeqCst);
        self.counters
            .total_search_time_us
            .fetch_add(elapsed_us, Ordering::SeqCst);
    }
}

#[async_trait]
impl PriceSearchService for HotelPriceService {
    async fn search(&self, request: SearchRequest) -> Result<Arc<SearchResponse>, ServiceError> {
        self.counters.searches.fetch_add(1, Ordering::SeqCst);

        let today = chrono::Local::now().date_naive();
        let search = match request.validate(self.aggregator.config(), today) {
            Ok(search) => search,
            Err(error) => {
                self.counters.rejected_requests.fetch_add(1, Ordering::SeqCst);
                tracing::warn!(%error, "search rejected");
                return Err(error.into());
            }
        };

        if self.cache_enabled {
            if let Some(cached) = self.cache.get(&search) {
                self.counters.cache_hits.fetch_add(1, Ordering::SeqCst);
                return Ok(cached);
            }
        }

        let started = Instant::now();
        let (data, version) = {
            let data = self.data.read();
            (data.clone(), self.data_version.load(Ordering::SeqCst))
        };

        let aggregator = self.aggregator.clone();
        let task_search = search.clone();
        let response = tokio::task::spawn_blocking(move || {
            aggregator.search_validated(&data, &task_search)
        })
        .await
        .map_err(|error| ServiceError::TaskFailed(error.to_string()))?;

        let response = Arc::new(response);
        self.record_search_time(started);

        if self.cache_enabled {
            // Held across the version check and the store
            let _data = self.data.read();
            if self.data_version.load(Ordering::SeqCst) == version {
                self.cache.store(&search, Arc::clone(&response), None);
            }
        }
        Ok(response)
    }

    async fn replace_rates(&self, rates: Vec<RatePeriod>) -> Result<usize, ServiceError> {
        self.edit_data(|data| data.replace_rates(rates))
    }

    async fn update_rate(&self, update: RateUpdate) -> Result<RatePeriod, ServiceError> {
        self.edit_data(|data| data.update_rate(update))
    }

    fn rates(&self) -> Vec<RatePeriod> {
        self.data.read().rates.clone()
    }

    fn stats(&self) -> ServiceStats {
        let computed = self.counters.computed_searches.load(Ordering::SeqCst);
        let total_us = self.counters.total_search_time_us.load(Ordering::SeqCst);
        let average_search_time_ms = if computed > 0 {
            total_us as f64 / computed as f64 / 1000.0
        } else {
            0.0
        };

        ServiceStats {
            searches: self.counters.searches.load(Ordering::SeqCst),
            cache_hits: self.counters.cache_hits.load(Ordering::SeqCst),
            rejected_requests: self.counters.rejected_requests.load(Ordering::SeqCst),
            price_edits: self.counters.price_edits.load(Ordering::SeqCst),
            average_search_time_ms,
            cache: self.cache.stats(),
        }
    }
}
