//! Shared types for the Reserva engine
//!
//! Domain models, domain events and small utilities used across the
//! workspace crates. This crate is pure data: no runtime, no I/O.

pub mod event;
pub mod models;
pub mod util;

// Re-exports
pub use event::{DomainEvent, DomainEventType, EventPayload, ReleaseReason};
pub use serde::{Deserialize, Serialize};
