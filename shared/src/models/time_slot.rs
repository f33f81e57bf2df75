//! Time Slot Model (service turns)

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Meal service classification, used to pick a default service duration
/// when a slot does not configure its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Lunch,
    Dinner,
}

impl std::fmt::Display for MealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MealType::Lunch => write!(f, "lunch"),
            MealType::Dinner => write!(f, "dinner"),
        }
    }
}

/// A restaurant-defined canonical service window ("turn").
///
/// Immutable once referenced by a reservation; catalog changes apply
/// prospectively only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: String,
    /// Display name, e.g. "First dinner turn"
    pub name: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
    /// Maximum service duration in minutes; takes precedence over the
    /// meal-type default when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration_minutes: Option<i64>,
    pub meal_type: MealType,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl TimeSlot {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        start: NaiveTime,
        end: NaiveTime,
        meal_type: MealType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            start,
            end,
            max_duration_minutes: None,
            meal_type,
            is_active: true,
        }
    }

    pub fn with_max_duration(mut self, minutes: i64) -> Self {
        self.max_duration_minutes = Some(minutes);
        self
    }
}
