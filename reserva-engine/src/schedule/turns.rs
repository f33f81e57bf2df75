//! Turn Catalog
//!
//! Holds each restaurant's canonical service windows ("turns") and answers
//! nearest-turn queries when a requested time has no exact slot. Slot sets
//! are replaceable at runtime; changes apply prospectively only.

use chrono::NaiveTime;
use dashmap::DashMap;
use serde::Serialize;

use shared::models::{MealType, TimeSlot};

use crate::utils::time::minutes_since_midnight;

/// Result of aligning a requested time against the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct TurnSuggestion {
    /// Slot whose start equals the requested time, if any.
    pub exact: Option<TimeSlot>,
    /// Up to two closest slots, ascending minute-distance, ties broken by
    /// earlier start. Empty when an exact match exists.
    pub alternatives: Vec<TimeSlot>,
    /// Human-readable line combining the alternatives (chronological order
    /// inside the text, which is how staff read them back to a caller).
    pub suggestion: Option<String>,
}

impl TurnSuggestion {
    /// Alternative start times formatted `HH:MM`.
    pub fn alternative_times(&self) -> Vec<String> {
        self.alternatives
            .iter()
            .map(|s| s.start.format("%H:%M").to_string())
            .collect()
    }
}

/// Per-restaurant catalog of active time slots.
pub struct TurnCatalog {
    /// Keyed by restaurant id; each entry kept sorted by start time.
    slots: DashMap<String, Vec<TimeSlot>>,
    /// Times strictly before the cutoff classify as lunch.
    meal_cutoff: NaiveTime,
    lunch_minutes: i64,
    dinner_minutes: i64,
}

impl TurnCatalog {
    pub fn new(meal_cutoff: NaiveTime, lunch_minutes: i64, dinner_minutes: i64) -> Self {
        Self {
            slots: DashMap::new(),
            meal_cutoff,
            lunch_minutes,
            dinner_minutes,
        }
    }

    /// Replace a restaurant's slot set. Inactive slots are kept out of the
    /// catalog entirely.
    pub fn set_slots(&self, restaurant_id: impl Into<String>, slots: Vec<TimeSlot>) {
        let mut active: Vec<TimeSlot> = slots.into_iter().filter(|s| s.is_active).collect();
        active.sort_by_key(|s| s.start);
        self.slots.insert(restaurant_id.into(), active);
    }

    /// Active slots for a restaurant, sorted by start time.
    pub fn slots_for(&self, restaurant_id: &str) -> Vec<TimeSlot> {
        self.slots
            .get(restaurant_id)
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Align a requested time: exact slot, or the two nearest alternatives.
    pub fn find_nearest_turn(&self, restaurant_id: &str, requested: NaiveTime) -> TurnSuggestion {
        let slots = self.slots_for(restaurant_id);

        if let Some(exact) = slots.iter().find(|s| s.start == requested) {
            return TurnSuggestion {
                exact: Some(exact.clone()),
                alternatives: Vec::new(),
                suggestion: None,
            };
        }

        let alternatives = self.nearest_excluding(&slots, requested);
        let suggestion = build_suggestion(requested, &alternatives);
        TurnSuggestion {
            exact: None,
            alternatives,
            suggestion,
        }
    }

    /// The two nearest slots whose start differs from `requested`. Used
    /// both for no-exact-match alignment and for fallback suggestions when
    /// a matched turn has no free tables.
    pub fn alternatives_for(&self, restaurant_id: &str, requested: NaiveTime) -> TurnSuggestion {
        let slots = self.slots_for(restaurant_id);
        let alternatives = self.nearest_excluding(&slots, requested);
        let suggestion = build_suggestion(requested, &alternatives);
        TurnSuggestion {
            exact: None,
            alternatives,
            suggestion,
        }
    }

    fn nearest_excluding(&self, slots: &[TimeSlot], requested: NaiveTime) -> Vec<TimeSlot> {
        let requested_min = minutes_since_midnight(requested);
        let mut candidates: Vec<(i64, &TimeSlot)> = slots
            .iter()
            .filter(|s| s.start != requested)
            .map(|s| {
                let distance = (minutes_since_midnight(s.start) - requested_min).abs();
                (distance, s)
            })
            .collect();
        // Ascending distance; equidistant slots prefer the earlier start.
        candidates.sort_by_key(|(distance, slot)| (*distance, slot.start));
        candidates
            .into_iter()
            .take(2)
            .map(|(_, s)| s.clone())
            .collect()
    }

    /// Meal classification by wall-clock time against the configured cutoff.
    pub fn meal_type_at(&self, time: NaiveTime) -> MealType {
        if time < self.meal_cutoff {
            MealType::Lunch
        } else {
            MealType::Dinner
        }
    }

    /// Default service duration for a meal type.
    pub fn default_minutes(&self, meal_type: MealType) -> i64 {
        match meal_type {
            MealType::Lunch => self.lunch_minutes,
            MealType::Dinner => self.dinner_minutes,
        }
    }

    /// Estimated service duration for a request at `time`.
    ///
    /// A slot starting exactly at `time` with its own `max_duration_minutes`
    /// is authoritative; otherwise the meal-type default applies.
    pub fn estimated_minutes(&self, restaurant_id: &str, time: NaiveTime) -> i64 {
        let slots = self.slots_for(restaurant_id);
        if let Some(slot) = slots.iter().find(|s| s.start == time)
            && let Some(max) = slot.max_duration_minutes
        {
            return max;
        }
        self.default_minutes(self.meal_type_at(time))
    }

    /// Sorted, deduplicated start times for one meal type.
    pub fn available_times_for_type(&self, restaurant_id: &str, meal_type: MealType) -> Vec<NaiveTime> {
        let mut times: Vec<NaiveTime> = self
            .slots_for(restaurant_id)
            .into_iter()
            .filter(|s| s.meal_type == meal_type)
            .map(|s| s.start)
            .collect();
        times.sort();
        times.dedup();
        times
    }

    /// Sorted, deduplicated start times across the whole catalog.
    pub fn all_available_times(&self, restaurant_id: &str) -> Vec<NaiveTime> {
        let mut times: Vec<NaiveTime> = self
            .slots_for(restaurant_id)
            .into_iter()
            .map(|s| s.start)
            .collect();
        times.sort();
        times.dedup();
        times
    }
}

fn build_suggestion(requested: NaiveTime, alternatives: &[TimeSlot]) -> Option<String> {
    if alternatives.is_empty() {
        return None;
    }
    let mut starts: Vec<NaiveTime> = alternatives.iter().map(|s| s.start).collect();
    starts.sort();
    let formatted: Vec<String> = starts.iter().map(|t| t.format("%H:%M").to_string()).collect();
    Some(format!(
        "No turn at {}. Closest turns: {}.",
        requested.format("%H:%M"),
        formatted.join(" or ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot(id: &str, start: NaiveTime, meal: MealType) -> TimeSlot {
        TimeSlot::new(id, id, start, start + chrono::Duration::hours(2), meal)
    }

    fn catalog_with(slots: Vec<TimeSlot>) -> TurnCatalog {
        let catalog = TurnCatalog::new(t(17, 0), 120, 150);
        catalog.set_slots("r1", slots);
        catalog
    }

    #[test]
    fn exact_match_returns_alone() {
        let catalog = catalog_with(vec![
            slot("a", t(13, 0), MealType::Lunch),
            slot("b", t(20, 0), MealType::Dinner),
        ]);
        let result = catalog.find_nearest_turn("r1", t(20, 0));
        assert_eq!(result.exact.unwrap().id, "b");
        assert!(result.alternatives.is_empty());
        assert!(result.suggestion.is_none());
    }

    #[test]
    fn equidistant_slots_prefer_earlier_start() {
        let catalog = catalog_with(vec![
            slot("a", t(13, 0), MealType::Lunch),
            slot("b", t(15, 0), MealType::Lunch),
        ]);
        let result = catalog.find_nearest_turn("r1", t(14, 0));
        assert!(result.exact.is_none());
        let times = result.alternative_times();
        assert_eq!(times, vec!["13:00", "15:00"]);
    }

    #[test]
    fn alternatives_sorted_by_distance() {
        let catalog = catalog_with(vec![
            slot("a", t(13, 0), MealType::Lunch),
            slot("b", t(14, 30), MealType::Lunch),
        ]);
        let result = catalog.find_nearest_turn("r1", t(14, 0));
        // 14:30 is 30 minutes away, 13:00 is 60.
        assert_eq!(result.alternative_times(), vec!["14:30", "13:00"]);
        // The spoken suggestion reads chronologically.
        assert_eq!(
            result.suggestion.unwrap(),
            "No turn at 14:00. Closest turns: 13:00 or 14:30."
        );
    }

    #[test]
    fn meal_classification_uses_cutoff() {
        let catalog = catalog_with(vec![]);
        assert_eq!(catalog.meal_type_at(t(13, 0)), MealType::Lunch);
        assert_eq!(catalog.meal_type_at(t(16, 59)), MealType::Lunch);
        assert_eq!(catalog.meal_type_at(t(17, 0)), MealType::Dinner);
        assert_eq!(catalog.meal_type_at(t(21, 0)), MealType::Dinner);
    }

    #[test]
    fn slot_duration_takes_precedence_over_meal_default() {
        let custom = slot("a", t(20, 0), MealType::Dinner).with_max_duration(90);
        let catalog = catalog_with(vec![custom]);
        assert_eq!(catalog.estimated_minutes("r1", t(20, 0)), 90);
        // No slot at 21:00: dinner default applies.
        assert_eq!(catalog.estimated_minutes("r1", t(21, 0)), 150);
        // No slot at 13:00: lunch default applies.
        assert_eq!(catalog.estimated_minutes("r1", t(13, 0)), 120);
    }

    #[test]
    fn available_times_sorted_and_deduplicated() {
        let catalog = catalog_with(vec![
            slot("b", t(21, 0), MealType::Dinner),
            slot("a", t(20, 0), MealType::Dinner),
            slot("a2", t(20, 0), MealType::Dinner),
            slot("l", t(13, 0), MealType::Lunch),
        ]);
        assert_eq!(
            catalog.available_times_for_type("r1", MealType::Dinner),
            vec![t(20, 0), t(21, 0)]
        );
        assert_eq!(
            catalog.all_available_times("r1"),
            vec![t(13, 0), t(20, 0), t(21, 0)]
        );
    }

    #[test]
    fn inactive_slots_are_ignored() {
        let mut inactive = slot("x", t(19, 0), MealType::Dinner);
        inactive.is_active = false;
        let catalog = catalog_with(vec![inactive, slot("a", t(20, 0), MealType::Dinner)]);
        assert_eq!(catalog.all_available_times("r1"), vec![t(20, 0)]);
    }
}
