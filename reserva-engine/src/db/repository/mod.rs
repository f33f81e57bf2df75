//! Repository Module
//!
//! Abstract reservation/table stores consumed by the engine, plus the
//! in-memory implementation.

pub mod memory;

pub use memory::{MemoryReservationRepository, MemoryTableRepository};

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use shared::models::{DiningTable, Reservation, ReservationStatus, TableStatus};

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Transient failure (store offline, connection dropped). Interactive
    /// callers surface it; the sweeper retries on its next tick.
    #[error("Repository unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Reservation store.
///
/// `list_reservations` powers the availability math: it returns only the
/// requested statuses for one restaurant and date.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn list_reservations(
        &self,
        restaurant_id: &str,
        date: NaiveDate,
        statuses: &[ReservationStatus],
    ) -> RepoResult<Vec<Reservation>>;

    async fn find_reservation(&self, id: &str) -> RepoResult<Option<Reservation>>;

    async fn save_reservation(&self, reservation: Reservation) -> RepoResult<Reservation>;

    async fn update_reservation_status(
        &self,
        id: &str,
        status: ReservationStatus,
    ) -> RepoResult<Reservation>;
}

/// Physical table store.
#[async_trait]
pub trait TableRepository: Send + Sync {
    /// All active tables of a restaurant.
    async fn list_tables(&self, restaurant_id: &str) -> RepoResult<Vec<DiningTable>>;

    async fn find_table(&self, table_id: &str) -> RepoResult<Option<DiningTable>>;

    async fn update_table_status(
        &self,
        table_id: &str,
        status: TableStatus,
    ) -> RepoResult<DiningTable>;
}
