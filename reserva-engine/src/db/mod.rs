//! Persistence Abstraction
//!
//! The engine never talks to a concrete store: it consumes the repository
//! traits defined here. Integrators back them with whatever persistence
//! they choose; `repository::memory` ships a DashMap implementation used by
//! tests and single-process deployments.

pub mod repository;

pub use repository::{
    MemoryReservationRepository, MemoryTableRepository, RepoError, RepoResult,
    ReservationRepository, TableRepository,
};
