// Reference data: hotels, occupancy rules and rate periods
// Loaded once per query by the caller and passed explicitly into the engine.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type HotelId = u32;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("JSON parse error: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid occupancy rule for hotel {hotel_id} / {room_type}: {reason}")]
    InvalidOccupancyRule {
        hotel_id: HotelId,
        room_type: String,
        reason: String,
    },

    #[error("Invalid rate period for hotel {hotel_id} / {room_type} / {concept}: {reason}")]
    InvalidRatePeriod {
        hotel_id: HotelId,
        room_type: String,
        concept: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Hotel {
    pub id: HotelId,
    pub name: String,
    pub location: String,
    pub website: String,
    pub phone: String,
    pub whatsapp_link: String,
    pub info_tag: String,
}

// One occupancy tier of a room type. Child age limits of 0 mark unused slots.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyRule {
    pub hotel_id: HotelId,
    pub room_type: String,
    pub max_adults: u32,
    pub max_children: u32,
    #[serde(default)]
    pub child_age_limit1: u8,
    #[serde(default)]
    pub child_age_limit2: u8,
    #[serde(default)]
    pub child_age_limit3: u8,
    pub multiplier: f64,
}

impl OccupancyRule {
    /// Positive child age limits of this rule, in slot order.
    pub fn age_limits(&self) -> Vec<u8> {
        [
            self.child_age_limit1,
            self.child_age_limit2,
            self.child_age_limit3,
        ]
        .into_iter()
        .filter(|limit| *limit > 0)
        .collect()
    }

    pub fn validate(&self) -> Result<(), DataError> {
        let invalid = |reason: &str| DataError::InvalidOccupancyRule {
            hotel_id: self.hotel_id,
            room_type: self.room_type.clone(),
            reason: reason.to_string(),
        };

        if self.room_type.trim().is_empty() {
            return Err(invalid("room type is empty"));
        }
        if self.max_adults < 1 {
            return Err(invalid("adult capacity must be at least 1"));
        }
        if !self.multiplier.is_finite() || self.multiplier <= 0.0 {
            return Err(invalid("multiplier must be positive"));
        }
        Ok(())
    }
}

// Nightly price for one room type and meal concept over [period_start, period_end].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatePeriod {
    pub hotel_id: HotelId,
    pub room_type: String,
    pub concept: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub nightly_price: f64,
    #[serde(default)]
    pub currency: String,
}

impl RatePeriod {
    pub fn matches(&self, room_type: &str, concept: &str) -> bool {
        self.room_type == room_type && self.concept == concept
    }

    pub fn validate(&self) -> Result<(), DataError> {
        let invalid = |reason: &str| DataError::InvalidRatePeriod {
            hotel_id: self.hotel_id,
            room_type: self.room_type.clone(),
            concept: self.concept.clone(),
            reason: reason.to_string(),
        };

        if self.room_type.trim().is_empty() {
            return Err(invalid("room type is empty"));
        }
        if self.concept.trim().is_empty() {
            return Err(invalid("concept is empty"));
        }
        if self.period_start > self.period_end {
            return Err(invalid("period starts after it ends"));
        }
        if !self.nightly_price.is_finite() || self.nightly_price < 0.0 {
            return Err(invalid("nightly price must be non-negative"));
        }
        Ok(())
    }
}

// Everything the engine reads for one search.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReferenceData {
    pub hotels: Vec<Hotel>,
    pub occupancy_rules: Vec<OccupancyRule>,
    pub rates: Vec<RatePeriod>,
}

impl ReferenceData {
    pub fn new(
        hotels: Vec<Hotel>,
        occupancy_rules: Vec<OccupancyRule>,
        rates: Vec<RatePeriod>,
    ) -> Self {
        Self {
            hotels,
            occupancy_rules,
            rates,
        }
    }

    // Parse a single document of the form {"hotels": [...], "occupancyRules": [...], "rates": [...]}
    pub fn from_json_str(json: &str) -> Result<Self, DataError> {
        let data: ReferenceData = serde_json::from_str(json)?;
        data.validate()?;
        Ok(data)
    }

    // Load the three flat tables, one JSON array per file
    pub fn from_files(
        hotels_path: impl AsRef<Path>,
        rules_path: impl AsRef<Path>,
        rates_path: impl AsRef<Path>,
    ) -> Result<Self, DataError> {
        let hotels: Vec<Hotel> = serde_json::from_str(&std::fs::read_to_string(hotels_path)?)?;
        let occupancy_rules: Vec<OccupancyRule> =
            serde_json::from_str(&std::fs::read_to_string(rules_path)?)?;
        let rates: Vec<RatePeriod> = serde_json::from_str(&std::fs::read_to_string(rates_path)?)?;

        let data = Self::new(hotels, occupancy_rules, rates);
        data.validate()?;

        tracing::info!(
            hotels = data.hotels.len(),
            rules = data.occupancy_rules.len(),
            rates = data.rates.len(),
            "loaded reference data"
        );
        Ok(data)
    }

    pub fn validate(&self) -> Result<(), DataError> {
        for rule in &self.occupancy_rules {
            rule.validate()?;
        }
        for rate in &self.rates {
            rate.validate()?;
        }
        Ok(())
    }

    pub fn hotel(&self, hotel_id: HotelId) -> Option<&Hotel> {
        self.hotels.iter().find(|hotel| hotel.id == hotel_id)
    }

    pub fn rules_for(&self, hotel_id: HotelId) -> Vec<&OccupancyRule> {
        self.occupancy_rules
            .iter()
            .filter(|rule| rule.hotel_id == hotel_id)
            .collect()
    }

    pub fn rates_for(&self, hotel_id: HotelId) -> Vec<&RatePeriod> {
        self.rates
            .iter()
            .filter(|rate| rate.hotel_id == hotel_id)
            .collect()
    }
}

// Sample file paths (the fixtures live in the samples directory)
pub const SAMPLE_HOTELS_PATH: &str = "samples/hotels.json";
pub const SAMPLE_RULES_PATH: &str = "samples/occupancy_rules.json";
pub const SAMPLE_RATES_PATH: &str = "samples/rates.json";
