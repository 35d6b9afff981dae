// Hotel price aggregator
// Runs the room distribution search and the price period resolver for every hotel,
// keeps the cheapest offer per (room type, concept) and returns priced offers.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dates::{nights_between, overlaps, parse_date};
use crate::distribution::{
    find_room_distribution, RoomArrangement, RoomArrangementOption, RoomSearchLimits,
};
use crate::pricing::{resolve_stay_price, ResolvedPrice};
use crate::reference::{Hotel, HotelId, RatePeriod, ReferenceData};

// One problem with the search parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Invalid {field} date: '{value}'")]
    InvalidDate { field: &'static str, value: String },

    #[error("Check-out {check_out} must be after check-in {check_in}")]
    CheckOutNotAfterCheckIn {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    #[error("Check-in {check_in} must be after {today}")]
    CheckInNotInFuture { check_in: NaiveDate, today: NaiveDate },

    #[error("At least one adult is required, got {0}")]
    InvalidAdultCount(i64),

    #[error("At most {max} adults per search, got {adults}")]
    TooManyAdults { adults: i64, max: u32 },

    #[error("At most {max} children per search, got {count}")]
    TooManyChildren { count: usize, max: usize },

    #[error("Child {position} age {age} must be between 0 and {max}")]
    InvalidChildAge { position: usize, age: i64, max: u8 },
}

// Request-level failures: nothing is computed when one of these is returned
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("Invalid search parameters: {}", join_errors(.0))]
    InvalidParameters(Vec<ParameterError>),
}

fn join_errors(errors: &[ParameterError]) -> String {
    errors
        .iter()
        .map(|error| error.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub limits: RoomSearchLimits,
    pub max_child_age: u8,
    // Party size bounds; the room split search grows quadratically with adults
    pub max_adults: u32,
    pub max_children: usize,
    // Reject stays starting today or earlier
    pub reject_past_check_in: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limits: RoomSearchLimits::default(),
            max_child_age: 17,
            max_adults: 9,
            max_children: 6,
            reject_past_check_in: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchRequest {
    pub check_in: String,
    pub check_out: String,
    pub adults: i64,
    pub child_ages: Vec<i64>,
}

impl SearchRequest {
    pub fn new(check_in: &str, check_out: &str, adults: i64, child_ages: Vec<i64>) -> Self {
        Self {
            check_in: check_in.to_string(),
            check_out: check_out.to_string(),
            adults,
            child_ages,
        }
    }

    /// Check every parameter and report all problems at once.
    pub fn validate(
        &self,
        config: &SearchConfig,
        today: NaiveDate,
    ) -> Result<ValidatedSearch, SearchError> {
        let mut errors = Vec::new();

        let check_in = parse_field("check-in", &self.check_in, &mut errors);
        let check_out = parse_field("check-out", &self.check_out, &mut errors);

        if let (Some(check_in), Some(check_out)) = (check_in, check_out) {
            if check_out <= check_in {
                errors.push(ParameterError::CheckOutNotAfterCheckIn {
                    check_in,
                    check_out,
                });
            }
        }
        if let Some(check_in) = check_in {
            if config.reject_past_check_in && check_in <= today {
                errors.push(ParameterError::CheckInNotInFuture { check_in, today });
            }
        }

        if self.adults < 1 {
            errors.push(ParameterError::InvalidAdultCount(self.adults));
        } else if self.adults > i64::from(config.max_adults) {
            errors.push(ParameterError::TooManyAdults {
                adults: self.adults,
                max: config.max_adults,
            });
        }

        if self.child_ages.len() > config.max_children {
            errors.push(ParameterError::TooManyChildren {
                count: self.child_ages.len(),
                max: config.max_children,
            });
        }

        for (index, age) in self.child_ages.iter().enumerate() {
            if *age < 0 || *age > i64::from(config.max_child_age) {
                errors.push(ParameterError::InvalidChildAge {
                    position: index + 1,
                    age: *age,
                    max: config.max_child_age,
                });
            }
        }

        match (check_in, check_out) {
            (Some(check_in), Some(check_out)) if errors.is_empty() => Ok(ValidatedSearch {
                check_in,
                check_out,
                nights: nights_between(check_in, check_out),
                adults: self.adults as u32,
                child_ages: self.child_ages.iter().map(|age| *age as u8).collect(),
            }),
            _ => Err(SearchError::InvalidParameters(errors)),
        }
    }
}

fn parse_field(
    field: &'static str,
    value: &str,
    errors: &mut Vec<ParameterError>,
) -> Option<NaiveDate> {
    match parse_date(value) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(ParameterError::InvalidDate {
                field,
                value: value.to_string(),
            });
            None
        }
    }
}

// Search parameters after validation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedSearch {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: u32,
    pub adults: u32,
    pub child_ages: Vec<u8>,
}

// One priced offer for a hotel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceCalculationResult {
    pub concept: String,
    pub room_type: String,
    pub room_count: usize,
    pub total_price: i64,
    pub price_per_night: i64,
    pub nights: u32,
    pub currency: String,
    pub room_arrangement: Vec<RoomArrangement>,
    pub is_available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelOffers {
    pub hotel: Hotel,
    // Sorted by total price, cheapest first
    pub offers: Vec<PriceCalculationResult>,
}

impl HotelOffers {
    pub fn min_price(&self) -> Option<i64> {
        self.offers.iter().map(|offer| offer.total_price).min()
    }

    pub fn cheapest_offer(&self) -> Option<&PriceCalculationResult> {
        self.offers.iter().min_by_key(|offer| offer.total_price)
    }
}

// Why a hotel produced no offers. None of these abort the search.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    #[error("hotel has no occupancy rules or no rates")]
    NoDataForHotel,

    #[error("no room arrangement fits the party")]
    NoRoomFit,

    #[error("no room type and concept could be priced for the stay")]
    NoPricedOffers,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedHotel {
    pub hotel_id: HotelId,
    pub reason: SkipReason,
}

// Echo of the original request, before any child is promoted to an adult
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub total_nights: u32,
    pub total_adults: u32,
    pub total_children: usize,
    pub children_ages: String,
}

impl From<&ValidatedSearch> for SearchParams {
    fn from(search: &ValidatedSearch) -> Self {
        Self {
            check_in: search.check_in,
            check_out: search.check_out,
            total_nights: search.nights,
            total_adults: search.adults,
            total_children: search.child_ages.len(),
            children_ages: search
                .child_ages
                .iter()
                .map(|age| age.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub search_params: SearchParams,
    // Reference-data order unless ranked
    pub hotels: Vec<HotelOffers>,
    pub skipped: Vec<SkippedHotel>,
}

impl SearchResponse {
    // Cheapest hotel first; hotels with equal minimum keep their order
    pub fn rank_by_min_price(&mut self) {
        self.hotels
            .sort_by_key(|hotel| hotel.min_price().unwrap_or(i64::MAX));
    }

    pub fn total_offers(&self) -> usize {
        self.hotels.iter().map(|hotel| hotel.offers.len()).sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct HotelPriceAggregator {
    config: SearchConfig,
}

impl HotelPriceAggregator {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    // Validate against today's date and search
    pub fn search(
        &self,
        data: &ReferenceData,
        request: &SearchRequest,
    ) -> Result<SearchResponse, SearchError> {
        let today = chrono::Local::now().date_naive();
        let search = request.validate(&self.config, today)?;
        Ok(self.search_validated(data, &search))
    }

    pub fn search_validated(&self, data: &ReferenceData, search: &ValidatedSearch) -> SearchResponse {
        let mut hotels = Vec::new();
        let mut skipped = Vec::new();

        for hotel in &data.hotels {
            match self.price_hotel(data, hotel, search) {
                Ok(offers) => hotels.push(HotelOffers {
                    hotel: hotel.clone(),
                    offers,
                }),
                Err(reason) => {
                    tracing::debug!(hotel_id = hotel.id, hotel = %hotel.name, %reason, "hotel skipped");
                    skipped.push(SkippedHotel {
                        hotel_id: hotel.id,
                        reason,
                    });
                }
            }
        }

        tracing::info!(
            check_in = %search.check_in,
            check_out = %search.check_out,
            adults = search.adults,
            children = search.child_ages.len(),
            hotels = hotels.len(),
            skipped = skipped.len(),
            "search completed"
        );

        SearchResponse {
            search_params: SearchParams::from(search),
            hotels,
            skipped,
        }
    }

    /// Priced offers for one hotel, cheapest first.
    pub fn price_hotel(
        &self,
        data: &ReferenceData,
        hotel: &Hotel,
        search: &ValidatedSearch,
    ) -> Result<Vec<PriceCalculationResult>, SkipReason> {
        let rules = data.rules_for(hotel.id);
        let rates = data.rates_for(hotel.id);
        if rules.is_empty() || rates.is_empty() {
            return Err(SkipReason::NoDataForHotel);
        }

        let distribution =
            find_room_distribution(search.adults, &search.child_ages, &rules, &self.config.limits);
        if !distribution.is_valid() {
            return Err(SkipReason::NoRoomFit);
        }

        let mut offers = Vec::new();
        for (room_type, concept) in room_concept_pairs(&rates) {
            // period_end is the last priced night, the stay's check-out is exclusive
            let has_overlap = rates.iter().any(|rate| {
                let period_after = rate
                    .period_end
                    .checked_add_days(Days::new(1))
                    .unwrap_or(rate.period_end);
                rate.matches(room_type, concept)
                    && overlaps(
                        search.check_in,
                        search.check_out,
                        rate.period_start,
                        period_after,
                    )
            });
            if !has_overlap {
                continue;
            }

            let compatible: Vec<&RoomArrangementOption> = distribution
                .arrangements
                .iter()
                .filter(|option| option.uses_only(room_type))
                .collect();
            if compatible.is_empty() {
                continue;
            }

            let resolved = match resolve_stay_price(
                rates.iter().copied(),
                room_type,
                concept,
                search.check_in,
                search.check_out,
            ) {
                Ok(resolved) => resolved,
                Err(error) => {
                    tracing::debug!(hotel_id = hotel.id, %error, "combination not priced");
                    continue;
                }
            };

            let mut best: Option<PriceCalculationResult> = None;
            for option in compatible {
                let offer = price_arrangement(option, concept, room_type, &resolved, search.nights);
                if best
                    .as_ref()
                    .map_or(true, |current| offer.total_price < current.total_price)
                {
                    best = Some(offer);
                }
            }
            offers.extend(best);
        }

        if offers.is_empty() {
            return Err(SkipReason::NoPricedOffers);
        }

        offers.sort_by_key(|offer| offer.total_price);
        Ok(offers)
    }
}

// Distinct (room type, concept) pairs in first-appearance order
fn room_concept_pairs<'a>(rates: &[&'a RatePeriod]) -> Vec<(&'a str, &'a str)> {
    let mut room_types: Vec<&str> = Vec::new();
    let mut concepts: Vec<&str> = Vec::new();
    for rate in rates {
        if !room_types.contains(&rate.room_type.as_str()) {
            room_types.push(rate.room_type.as_str());
        }
        if !concepts.contains(&rate.concept.as_str()) {
            concepts.push(rate.concept.as_str());
        }
    }

    room_types
        .iter()
        .flat_map(|room_type| concepts.iter().map(move |concept| (*room_type, *concept)))
        .collect()
}

// Each room pays the resolved stay price times its share of the option's multiplier.
// The total is rounded once, after summing.
fn price_arrangement(
    option: &RoomArrangementOption,
    concept: &str,
    room_type: &str,
    resolved: &ResolvedPrice,
    nights: u32,
) -> PriceCalculationResult {
    let room_share = option.multiplier_per_room();
    let raw_total: f64 = option
        .rooms
        .iter()
        .map(|_| resolved.base_total * room_share)
        .sum();

    let price_per_night = if nights > 0 {
        (raw_total / f64::from(nights)).round() as i64
    } else {
        0
    };

    PriceCalculationResult {
        concept: concept.to_string(),
        room_type: room_type.to_string(),
        room_count: option.room_count,
        total_price: raw_total.round() as i64,
        price_per_night,
        nights,
        currency: resolved.currency().unwrap_or_default().to_string(),
        room_arrangement: option.rooms.clone(),
        is_available: true,
    }
}
