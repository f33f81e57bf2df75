//! Domain Models
//!
//! Canonical serde models shared by the engine and its integrators.

pub mod dining_table;
pub mod occupancy;
pub mod reservation;
pub mod time_slot;

// Re-exports
pub use dining_table::{DiningTable, TableStatus};
pub use occupancy::OccupancyRecord;
pub use reservation::{Reservation, ReservationStatus};
pub use time_slot::{MealType, TimeSlot};
