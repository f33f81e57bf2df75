//! Reserva Engine
//!
//! Reservation scheduling and table-occupancy engine for restaurants that
//! accept bookings from loosely structured sources (voice agents, staff
//! dashboards, call-transcript webhooks).
//!
//! The engine answers "is a table free for N people at time T on date D",
//! persists the resulting reservation through an abstract repository, and
//! reclaims tables automatically once their occupancy window has elapsed.
//!
//! # Architecture
//!
//! ```text
//! BookingService (inbound facade)
//!     ├─ DateTimeNormalizer   fuzzy date/time → canonical values
//!     ├─ TurnCatalog          canonical slots + nearest-turn suggestion
//!     ├─ AvailabilityChecker  interval-overlap conflict math
//!     └─ OccupancyService     table state machine (per-table locks)
//!            └─ AutoReleaseSweeper   periodic forced release
//!
//! EventBus (broadcast) ── EventRouter ──► audit / notify lanes
//! ```
//!
//! HTTP routing, persistence technology, authentication and UI are external
//! collaborators: the engine consumes repository traits and emits typed
//! domain events, nothing more.

pub mod booking;
pub mod core;
pub mod db;
pub mod events;
pub mod occupancy;
pub mod schedule;
pub mod utils;

// Re-exports
pub use booking::{AvailabilityQuery, BookingRequest, BookingService};
pub use crate::core::{BackgroundTasks, EngineConfig, EngineState, TaskKind};
pub use db::repository::{
    MemoryReservationRepository, MemoryTableRepository, RepoError, RepoResult,
    ReservationRepository, TableRepository,
};
pub use events::{EventBus, EventChannels, EventRouter};
pub use occupancy::{AutoReleaseSweeper, OccupancyService, ReleasePolicy};
pub use schedule::{
    AvailabilityChecker, AvailabilityReport, AvailabilityRequest, DateTimeNormalizer,
    TurnCatalog, TurnSuggestion,
};
pub use utils::{EngineError, EngineResult};
