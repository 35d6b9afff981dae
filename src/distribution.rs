// Room distribution search
// Finds every way to house a party in 1, 2 or 3 rooms of a single room type,
// using a hotel's occupancy rules. Results are ranked by total price multiplier.

use serde::{Deserialize, Serialize};

use crate::children::categorize_children;
use crate::reference::OccupancyRule;

// Party-size thresholds for trying more rooms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomSearchLimits {
    // Above this party size multi-room splits are tried even when one room fits
    pub multi_room_party_size: usize,
    // Above this party size three-room splits are tried
    pub three_room_party_size: usize,
    pub max_rooms: usize,
}

impl Default for RoomSearchLimits {
    fn default() -> Self {
        Self {
            multi_room_party_size: 4,
            three_room_party_size: 8,
            max_rooms: 3,
        }
    }
}

/// One room's share of the party. `adults` includes children promoted to adult slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomArrangement {
    pub room_type: String,
    pub adults: u32,
    pub child_ages: Vec<u8>,
    pub promoted_ages: Vec<u8>,
}

impl RoomArrangement {
    pub fn children(&self) -> usize {
        self.child_ages.len()
    }

    // Adults from the original request placed in this room
    pub fn requested_adults(&self) -> u32 {
        self.adults - self.promoted_ages.len() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomArrangementOption {
    pub rooms: Vec<RoomArrangement>,
    pub total_multiplier: f64,
    pub room_count: usize,
}

impl RoomArrangementOption {
    pub fn uses_only(&self, room_type: &str) -> bool {
        self.rooms.iter().all(|room| room.room_type == room_type)
    }

    // Multiplier share carried by each room of the option
    pub fn multiplier_per_room(&self) -> f64 {
        self.total_multiplier / self.room_count as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistributionResult {
    pub arrangements: Vec<RoomArrangementOption>,
}

impl DistributionResult {
    pub fn is_valid(&self) -> bool {
        !self.arrangements.is_empty()
    }

    // Lowest multiplier option, first in enumeration order on ties
    pub fn best(&self) -> Option<&RoomArrangementOption> {
        self.arrangements.first()
    }

    pub fn total_rooms(&self) -> usize {
        self.best().map_or(0, |option| option.room_count)
    }
}

// A room accepted by one occupancy rule
#[derive(Debug, Clone, PartialEq)]
struct RoomFit {
    adults: u32,
    child_ages: Vec<u8>,
    promoted_ages: Vec<u8>,
    multiplier: f64,
}

pub fn find_room_distribution(
    adults: u32,
    child_ages: &[u8],
    rules: &[&OccupancyRule],
    limits: &RoomSearchLimits,
) -> DistributionResult {
    let mut room_types: Vec<&str> = Vec::new();
    for rule in rules {
        if !room_types.contains(&rule.room_type.as_str()) {
            room_types.push(rule.room_type.as_str());
        }
    }

    let mut arrangements = Vec::new();
    for room_type in room_types {
        let rules_for_type: Vec<&OccupancyRule> = rules
            .iter()
            .copied()
            .filter(|rule| rule.room_type == room_type)
            .collect();

        let found = distribute_across_rooms(adults, child_ages, &rules_for_type, room_type, limits);
        if found.is_empty() {
            tracing::debug!(room_type, adults, children = child_ages.len(), "no room fit");
        }
        arrangements.extend(found);
    }

    // Stable: equal multipliers keep enumeration order
    arrangements.sort_by(|a, b| a.total_multiplier.total_cmp(&b.total_multiplier));

    DistributionResult { arrangements }
}

fn distribute_across_rooms(
    adults: u32,
    child_ages: &[u8],
    rules: &[&OccupancyRule],
    room_type: &str,
    limits: &RoomSearchLimits,
) -> Vec<RoomArrangementOption> {
    let mut arrangements = try_single_room(adults, child_ages, rules, room_type);

    let party_size = adults as usize + child_ages.len();
    if arrangements.is_empty() || party_size > limits.multi_room_party_size {
        if limits.max_rooms >= 2 {
            arrangements.extend(try_two_rooms(adults, child_ages, rules, room_type));
        }
        if limits.max_rooms >= 3 && party_size > limits.three_room_party_size {
            arrangements.extend(try_three_rooms(adults, child_ages, rules, room_type));
        }
    }

    arrangements
}

// Every rule that takes the whole party yields its own option
fn try_single_room(
    adults: u32,
    child_ages: &[u8],
    rules: &[&OccupancyRule],
    room_type: &str,
) -> Vec<RoomArrangementOption> {
    rules
        .iter()
        .filter_map(|rule| fit_rule(rule, adults, child_ages))
        .map(|fit| build_option(room_type, vec![fit]))
        .collect()
}

fn try_two_rooms(
    adults: u32,
    child_ages: &[u8],
    rules: &[&OccupancyRule],
    room_type: &str,
) -> Vec<RoomArrangementOption> {
    let mut arrangements = Vec::new();

    // Each room needs at least one adult
    if adults < 2 {
        return arrangements;
    }

    for adults_room1 in 1..adults {
        let adults_room2 = adults - adults_room1;

        for prefix in 0..=child_ages.len() {
            let (children_room1, children_room2) = child_ages.split_at(prefix);

            if let (Some(room1), Some(room2)) = (
                find_room_fit(adults_room1, children_room1, rules),
                find_room_fit(adults_room2, children_room2, rules),
            ) {
                arrangements.push(build_option(room_type, vec![room1, room2]));
            }
        }
    }

    arrangements
}

fn try_three_rooms(
    adults: u32,
    child_ages: &[u8],
    rules: &[&OccupancyRule],
    room_type: &str,
) -> Vec<RoomArrangementOption> {
    let mut arrangements = Vec::new();

    if adults < 3 {
        return arrangements;
    }

    let child_groups = split_evenly(child_ages, 3);

    for adults_room1 in 1..=adults - 2 {
        for adults_room2 in 1..=adults - adults_room1 - 1 {
            let adults_room3 = adults - adults_room1 - adults_room2;

            let fits: Option<Vec<RoomFit>> = [adults_room1, adults_room2, adults_room3]
                .into_iter()
                .zip(&child_groups)
                .map(|(room_adults, room_children)| find_room_fit(room_adults, room_children, rules))
                .collect();

            if let Some(fits) = fits {
                arrangements.push(build_option(room_type, fits));
            }
        }
    }

    arrangements
}

// Contiguous split; the first `len % parts` groups take one extra element
fn split_evenly(ages: &[u8], parts: usize) -> Vec<&[u8]> {
    let base = ages.len() / parts;
    let extra = ages.len() % parts;

    let mut groups = Vec::with_capacity(parts);
    let mut start = 0;
    for index in 0..parts {
        let len = base + usize::from(index < extra);
        groups.push(&ages[start..start + len]);
        start += len;
    }
    groups
}

// First rule in table order that accepts the room
fn find_room_fit(adults: u32, child_ages: &[u8], rules: &[&OccupancyRule]) -> Option<RoomFit> {
    rules
        .iter()
        .find_map(|rule| fit_rule(rule, adults, child_ages))
}

fn fit_rule(rule: &OccupancyRule, adults: u32, child_ages: &[u8]) -> Option<RoomFit> {
    if rule.max_adults < adults {
        return None;
    }

    let age_limits = rule.age_limits();
    let categories = categorize_children(child_ages, &age_limits);
    let total_adults = adults + categories.promoted_adults();

    if rule.max_adults < total_adults {
        return None;
    }
    // Each configured age limit is one child slot
    let child_slots = age_limits.len().min(rule.max_children as usize);
    if child_slots < categories.valid_children.len() {
        return None;
    }

    Some(RoomFit {
        adults: total_adults,
        child_ages: categories.valid_children,
        promoted_ages: categories.promoted,
        multiplier: rule.multiplier,
    })
}

fn build_option(room_type: &str, fits: Vec<RoomFit>) -> RoomArrangementOption {
    let total_multiplier: f64 = fits.iter().map(|fit| fit.multiplier).sum();
    let rooms: Vec<RoomArrangement> = fits
        .into_iter()
        .map(|fit| RoomArrangement {
            room_type: room_type.to_string(),
            adults: fit.adults,
            child_ages: fit.child_ages,
            promoted_ages: fit.promoted_ages,
        })
        .collect();

    RoomArrangementOption {
        room_count: rooms.len(),
        rooms,
        total_multiplier,
    }
}
