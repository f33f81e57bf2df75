//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Live status of a physical table.
///
/// `Maintenance` is a side-state: reachable from `Free` only, and must be
/// cleared back to `Free` explicitly before the table can host anyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    Free,
    Reserved,
    Occupied,
    Maintenance,
}

impl Default for TableStatus {
    fn default() -> Self {
        Self::Free
    }
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableStatus::Free => write!(f, "free"),
            TableStatus::Reserved => write!(f, "reserved"),
            TableStatus::Occupied => write!(f, "occupied"),
            TableStatus::Maintenance => write!(f, "maintenance"),
        }
    }
}

/// Dining table entity
///
/// Owned by the restaurant for its operational lifetime; never deleted while
/// referenced by historical reservations. `status` is mutated only by the
/// occupancy state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    /// Free-text zone tag ("Terrace", "Main hall", ...)
    pub zone: String,
    pub capacity: i32,
    #[serde(default)]
    pub status: TableStatus,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl DiningTable {
    pub fn new(
        id: impl Into<String>,
        restaurant_id: impl Into<String>,
        name: impl Into<String>,
        zone: impl Into<String>,
        capacity: i32,
    ) -> Self {
        Self {
            id: id.into(),
            restaurant_id: restaurant_id.into(),
            name: name.into(),
            zone: zone.into(),
            capacity,
            status: TableStatus::Free,
            is_active: true,
        }
    }
}
