// Hotel price search engine library

pub mod admin;
pub mod aggregator;
pub mod children;
pub mod dates;
pub mod distribution;
pub mod flat_response;
pub mod pricing;
pub mod reference;
pub mod result_cache;
pub mod service;

// Re-export key types for convenience
pub use admin::{find_overlapping_rates, validate_rate, PriceEditError, RateOverlap, RateUpdate};
pub use aggregator::{
    HotelOffers, HotelPriceAggregator, ParameterError, PriceCalculationResult, SearchConfig,
    SearchError, SearchParams, SearchRequest, SearchResponse, SkipReason, SkippedHotel,
    ValidatedSearch,
};
pub use children::{categorize_children, ChildCategories};
pub use distribution::{
    find_room_distribution, DistributionResult, RoomArrangement, RoomArrangementOption,
    RoomSearchLimits,
};
pub use flat_response::flatten_response;
pub use pricing::{resolve_stay_price, PricedSegment, PricingError, ResolvedPrice};
pub use reference::{DataError, Hotel, HotelId, OccupancyRule, RatePeriod, ReferenceData};
pub use result_cache::{CacheConfig, CacheStatsReport, SearchCache};
pub use service::{HotelPriceService, PriceSearchService, ServiceConfig, ServiceError, ServiceStats};
