//! Booking Facade
//!
//! The inbound operation surface consumed by external request layers
//! (HTTP API, voice-agent function dispatcher, staff UI actions).

pub mod service;

pub use service::{AvailabilityQuery, BookingRequest, BookingService};
