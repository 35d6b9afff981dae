// Price administration
// Replaces or edits the rate table of a ReferenceData. Edits are checked before anything
// is written, so a rejected batch leaves the table untouched.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dates::in_range;
use crate::reference::{DataError, HotelId, RatePeriod, ReferenceData};

#[derive(Error, Debug)]
pub enum PriceEditError {
    #[error("Unknown hotel {0}")]
    UnknownHotel(HotelId),

    #[error("Rate for hotel {hotel_id} / {room_type} / {concept} has no currency")]
    MissingCurrency {
        hotel_id: HotelId,
        room_type: String,
        concept: String,
    },

    #[error(transparent)]
    InvalidRecord(#[from] DataError),

    #[error("Invalid rate at position {position}: {source}")]
    InvalidRate {
        position: usize,
        #[source]
        source: Box<PriceEditError>,
    },

    #[error("No rate for hotel {hotel_id} / {room_type} / {concept} starting {period_start}")]
    NotFound {
        hotel_id: HotelId,
        room_type: String,
        concept: String,
        period_start: NaiveDate,
    },
}

// Targets the rate period with the same hotel, room type, concept and start date
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateUpdate {
    pub hotel_id: HotelId,
    pub room_type: String,
    pub concept: String,
    pub period_start: NaiveDate,
    pub nightly_price: f64,
    #[serde(default)]
    pub period_end: Option<NaiveDate>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl RateUpdate {
    fn targets(&self, rate: &RatePeriod) -> bool {
        rate.hotel_id == self.hotel_id
            && rate.period_start == self.period_start
            && rate.matches(&self.room_type, &self.concept)
    }
}

// Two periods of the same hotel, room type and concept sharing at least one night
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateOverlap {
    pub first: usize,
    pub second: usize,
    pub hotel_id: HotelId,
    pub room_type: String,
    pub concept: String,
}

pub fn validate_rate(rate: &RatePeriod, data: &ReferenceData) -> Result<(), PriceEditError> {
    if data.hotel(rate.hotel_id).is_none() {
        return Err(PriceEditError::UnknownHotel(rate.hotel_id));
    }
    if rate.currency.trim().is_empty() {
        return Err(PriceEditError::MissingCurrency {
            hotel_id: rate.hotel_id,
            room_type: rate.room_type.clone(),
            concept: rate.concept.clone(),
        });
    }
    rate.validate()?;
    Ok(())
}

/// Pairs of rate periods whose inclusive date ranges share a night.
/// Searches resolve such nights with the earlier period, so these are reported, not rejected.
pub fn find_overlapping_rates(rates: &[RatePeriod]) -> Vec<RateOverlap> {
    let mut overlaps = Vec::new();

    for (first, a) in rates.iter().enumerate() {
        for (offset, b) in rates[first + 1..].iter().enumerate() {
            let same_series = a.hotel_id == b.hotel_id && b.matches(&a.room_type, &a.concept);
            let shares_night = in_range(b.period_start, a.period_start, a.period_end)
                || in_range(a.period_start, b.period_start, b.period_end);

            if same_series && shares_night {
                overlaps.push(RateOverlap {
                    first,
                    second: first + 1 + offset,
                    hotel_id: a.hotel_id,
                    room_type: a.room_type.clone(),
                    concept: a.concept.clone(),
                });
            }
        }
    }

    overlaps
}

impl ReferenceData {
    /// Replace the whole rate table. Nothing changes unless every rate is valid.
    pub fn replace_rates(&mut self, rates: Vec<RatePeriod>) -> Result<usize, PriceEditError> {
        for (index, rate) in rates.iter().enumerate() {
            validate_rate(rate, self).map_err(|error| PriceEditError::InvalidRate {
                position: index + 1,
                source: Box::new(error),
            })?;
        }

        for overlap in find_overlapping_rates(&rates) {
            tracing::warn!(
                hotel_id = overlap.hotel_id,
                room_type = %overlap.room_type,
                concept = %overlap.concept,
                first = overlap.first + 1,
                second = overlap.second + 1,
                "overlapping rate periods, the earlier one wins"
            );
        }

        let count = rates.len();
        self.rates = rates;
        tracing::info!(count, "rate table replaced");
        Ok(count)
    }

    /// Edit one rate period in place and return the updated record.
    pub fn update_rate(&mut self, update: RateUpdate) -> Result<RatePeriod, PriceEditError> {
        if self.hotel(update.hotel_id).is_none() {
            return Err(PriceEditError::UnknownHotel(update.hotel_id));
        }

        let position = self
            .rates
            .iter()
            .position(|rate| update.targets(rate))
            .ok_or_else(|| PriceEditError::NotFound {
                hotel_id: update.hotel_id,
                room_type: update.room_type.clone(),
                concept: update.concept.clone(),
                period_start: update.period_start,
            })?;

        let mut edited = self.rates[position].clone();
        edited.nightly_price = update.nightly_price;
        if let Some(period_end) = update.period_end {
            edited.period_end = period_end;
        }
        if let Some(currency) = update.currency {
            edited.currency = currency;
        }

        validate_rate(&edited, self).map_err(|error| PriceEditError::InvalidRate {
            position: position + 1,
            source: Box::new(error),
        })?;

        tracing::info!(
            hotel_id = edited.hotel_id,
            room_type = %edited.room_type,
            concept = %edited.concept,
            period_start = %edited.period_start,
            nightly_price = edited.nightly_price,
            "rate updated"
        );
        self.rates[position] = edited.clone();
        Ok(edited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date;
    use crate::reference::Hotel;
    use test_case::test_case;

    fn date(value: &str) -> NaiveDate {
        parse_date(value).unwrap()
    }

    fn rate(hotel_id: HotelId, concept: &str, start: &str, end: &str, price: f64) -> RatePeriod {
        RatePeriod {
            hotel_id,
            room_type: "Standard".to_string(),
            concept: concept.to_string(),
            period_start: date(start),
            period_end: date(end),
            nightly_price: price,
            currency: "TRY".to_string(),
        }
    }

    fn data() -> ReferenceData {
        ReferenceData::new(
            vec![Hotel {
                id: 1,
                name: "Seaside".to_string(),
                ..Hotel::default()
            }],
            Vec::new(),
            vec![
                rate(1, "All Inclusive", "2030-06-01", "2030-06-30", 1000.0),
                rate(1, "All Inclusive", "2030-07-01", "2030-07-31", 1500.0),
            ],
        )
    }

    fn update(start: &str, price: f64) -> RateUpdate {
        RateUpdate {
            hotel_id: 1,
            room_type: "Standard".to_string(),
            concept: "All Inclusive".to_string(),
            period_start: date(start),
            nightly_price: price,
            period_end: None,
            currency: None,
        }
    }

    #[test_case(rate(1, "Half Board", "2030-06-01", "2030-06-30", 800.0), true; "#1 Valid rate")]
    #[test_case(rate(9, "Half Board", "2030-06-01", "2030-06-30", 800.0), false; "#2 Unknown hotel")]
    #[test_case(rate(1, " ", "2030-06-01", "2030-06-30", 800.0), false; "#3 Empty concept")]
    #[test_case(rate(1, "Half Board", "2030-06-01", "2030-06-30", -1.0), false; "#4 Negative price")]
    #[test_case(rate(1, "Half Board", "2030-06-01", "2030-06-30", f64::NAN), false; "#5 NaN price")]
    #[test_case(rate(1, "Half Board", "2030-06-30", "2030-06-01", 800.0), false; "#6 Inverted period")]
    #[test_case(rate(1, "Half Board", "2030-06-01", "2030-06-01", 0.0), true; "#7 One night free")]
    fn test_validate_rate(rate: RatePeriod, expected_ok: bool) {
        let result = validate_rate(&rate, &data());
        assert_eq!(result.is_ok(), expected_ok, "Unexpected result: {:?}", result);
    }

    #[test]
    fn test_validate_rate_reports_typed_errors() {
        let data = data();

        let result = validate_rate(&rate(9, "Half Board", "2030-06-01", "2030-06-30", 800.0), &data);
        assert!(matches!(result, Err(PriceEditError::UnknownHotel(9))));

        let mut no_currency = rate(1, "Half Board", "2030-06-01", "2030-06-30", 800.0);
        no_currency.currency = "  ".to_string();
        assert!(matches!(
            validate_rate(&no_currency, &data),
            Err(PriceEditError::MissingCurrency { hotel_id: 1, .. })
        ));

        let inverted = rate(1, "Half Board", "2030-06-30", "2030-06-01", 800.0);
        assert!(matches!(
            validate_rate(&inverted, &data),
            Err(PriceEditError::InvalidRecord(DataError::InvalidRatePeriod { hotel_id: 1, .. }))
        ));
    }

    #[test]
    fn test_replace_rates_keeps_error_cause() {
        let mut data = data();
        let result = data.replace_rates(vec![
            rate(1, "Half Board", "2030-06-01", "2030-06-30", 700.0),
            rate(1, "Half Board", "2030-07-01", "2030-07-31", -5.0),
        ]);

        match result {
            Err(PriceEditError::InvalidRate { position, source }) => {
                assert_eq!(position, 2);
                assert!(matches!(
                    *source,
                    PriceEditError::InvalidRecord(DataError::InvalidRatePeriod { .. })
                ));
            }
            other => panic!("Expected an invalid rate error, got {:?}", other),
        }
    }

    #[test]
    fn test_replace_rates() {
        let mut data = data();
        let result = data.replace_rates(vec![
            rate(1, "Half Board", "2030-06-01", "2030-06-30", 700.0),
            rate(1, "Half Board", "2030-07-01", "2030-07-31", 900.0),
            rate(1, "Room Only", "2030-06-01", "2030-07-31", 400.0),
        ]);

        assert!(matches!(result, Ok(3)), "Failed to replace rates: {:?}", result.err());
        assert_eq!(data.rates.len(), 3);
        assert!(data.rates.iter().all(|rate| rate.concept != "All Inclusive"));
    }

    #[test]
    fn test_replace_rates_is_all_or_nothing() {
        let mut data = data();
        let before = data.rates.clone();

        let result = data.replace_rates(vec![
            rate(1, "Half Board", "2030-06-01", "2030-06-30", 700.0),
            rate(1, "Half Board", "2030-07-01", "2030-06-15", 900.0),
        ]);

        assert!(matches!(
            result,
            Err(PriceEditError::InvalidRate { position: 2, .. })
        ));
        assert_eq!(data.rates, before);
    }

    #[test]
    fn test_replace_rates_accepts_overlaps() {
        let mut data = data();
        let result = data.replace_rates(vec![
            rate(1, "Half Board", "2030-06-01", "2030-06-30", 700.0),
            rate(1, "Half Board", "2030-06-20", "2030-07-10", 750.0),
        ]);
        assert!(matches!(result, Ok(2)), "Failed to replace rates: {:?}", result.err());
    }

    #[test]
    fn test_update_rate_price_only() {
        let mut data = data();
        let edited = data.update_rate(update("2030-07-01", 1650.0)).unwrap();

        assert_eq!(edited.nightly_price, 1650.0);
        assert_eq!(edited.period_end, date("2030-07-31"));
        assert_eq!(data.rates[1], edited);
        assert_eq!(data.rates[0].nightly_price, 1000.0);
    }

    #[test]
    fn test_update_rate_end_and_currency() {
        let mut data = data();
        let mut change = update("2030-06-01", 55.0);
        change.period_end = Some(date("2030-06-20"));
        change.currency = Some("EUR".to_string());

        let edited = data.update_rate(change).unwrap();
        assert_eq!(edited.period_end, date("2030-06-20"));
        assert_eq!(edited.currency, "EUR");
    }

    #[test]
    fn test_update_rate_errors() {
        let mut data = data();
        let before = data.rates.clone();

        let result = data.update_rate(update("2030-06-02", 900.0));
        assert!(matches!(result, Err(PriceEditError::NotFound { .. })));

        let mut unknown = update("2030-06-01", 900.0);
        unknown.hotel_id = 4;
        assert!(matches!(
            data.update_rate(unknown),
            Err(PriceEditError::UnknownHotel(4))
        ));

        let mut inverted = update("2030-06-01", 900.0);
        inverted.period_end = Some(date("2030-05-01"));
        assert!(matches!(
            data.update_rate(inverted),
            Err(PriceEditError::InvalidRate { position: 1, .. })
        ));

        assert_eq!(data.rates, before);
    }

    #[test]
    fn test_find_overlapping_rates() {
        let rates = vec![
            rate(1, "All Inclusive", "2030-06-01", "2030-06-30", 1000.0),
            rate(1, "All Inclusive", "2030-06-30", "2030-07-15", 1200.0),
            rate(1, "Half Board", "2030-06-10", "2030-06-20", 800.0),
            rate(2, "All Inclusive", "2030-06-10", "2030-06-20", 900.0),
            rate(1, "All Inclusive", "2030-07-16", "2030-07-31", 1300.0),
        ];

        let overlaps = find_overlapping_rates(&rates);
        assert_eq!(overlaps.len(), 1);
        assert_eq!((overlaps[0].first, overlaps[0].second), (0, 1));
        assert_eq!(overlaps[0].concept, "All Inclusive");
    }
}
