//! Scheduling Core
//!
//! Normalization of fuzzy date/time expressions, the canonical turn
//! catalog, and the availability/conflict checker.

pub mod availability;
pub mod normalize;
pub mod turns;

pub use availability::{
    AvailabilityChecker, AvailabilityReport, AvailabilityRequest, ZoneAvailability,
};
pub use normalize::DateTimeNormalizer;
pub use turns::{TurnCatalog, TurnSuggestion};
