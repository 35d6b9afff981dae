// Price period resolver
// Covers a stay with date-ranged nightly rates, night by night, and fails when any
// night has no rate. A rate period's end date is the last night it prices.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use thiserror::Error;

use crate::dates::{in_range, nights_between};
use crate::reference::RatePeriod;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    #[error("No rate periods for {room_type} / {concept}")]
    NoRates { room_type: String, concept: String },

    #[error("No rate for {room_type} / {concept} between {start} and {end}")]
    UnpricedPeriod {
        room_type: String,
        concept: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

// Nights of the stay priced by one rate period
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedSegment {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub nights: u32,
    pub nightly_price: f64,
    pub currency: String,
}

impl PricedSegment {
    pub fn amount(&self) -> f64 {
        self.nightly_price * f64::from(self.nights)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPrice {
    pub segments: Vec<PricedSegment>,
    // Unrounded sum over segments, one room at multiplier 1.0
    pub base_total: f64,
}

impl ResolvedPrice {
    pub fn nights(&self) -> u32 {
        self.segments.iter().map(|segment| segment.nights).sum()
    }

    pub fn currency(&self) -> Option<&str> {
        self.segments.first().map(|segment| segment.currency.as_str())
    }
}

/// Resolve the price of `[check_in, check_out)` for one room type and concept.
///
/// Rates are searched in the given order, so the first period containing a night wins
/// when periods overlap. Rates for other room types or concepts are ignored.
pub fn resolve_stay_price<'a, I>(
    rates: I,
    room_type: &str,
    concept: &str,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> Result<ResolvedPrice, PricingError>
where
    I: IntoIterator<Item = &'a RatePeriod>,
{
    let relevant: Vec<&RatePeriod> = rates
        .into_iter()
        .filter(|rate| rate.matches(room_type, concept))
        .collect();

    if relevant.is_empty() {
        return Err(PricingError::NoRates {
            room_type: room_type.to_string(),
            concept: concept.to_string(),
        });
    }

    let mut segments = Vec::new();
    let mut base_total = 0.0;
    let mut current = check_in;

    while current < check_out {
        let covering = relevant
            .iter()
            .find(|rate| in_range(current, rate.period_start, rate.period_end));

        match covering {
            Some(rate) => {
                let segment_end = rate
                    .period_end
                    .checked_add_days(Days::new(1))
                    .map_or(check_out, |after_last_night| after_last_night.min(check_out));

                let segment = PricedSegment {
                    start: current,
                    end: segment_end,
                    nights: nights_between(current, segment_end),
                    nightly_price: rate.nightly_price,
                    currency: rate.currency.clone(),
                };
                base_total += segment.amount();
                segments.push(segment);
                current = segment_end;
            }
            None => {
                let next_start = relevant
                    .iter()
                    .map(|rate| rate.period_start)
                    .filter(|start| *start > current)
                    .min();
                let gap_end = next_start.map_or(check_out, |start| start.min(check_out));

                return Err(PricingError::UnpricedPeriod {
                    room_type: room_type.to_string(),
                    concept: concept.to_string(),
                    start: current,
                    end: gap_end,
                });
            }
        }
    }

    Ok(ResolvedPrice {
        segments,
        base_total,
    })
}
