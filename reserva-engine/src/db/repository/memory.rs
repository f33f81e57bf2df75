//! In-memory repositories
//!
//! DashMap-backed stores used by tests and single-process deployments.
//! Never authoritative across processes: durable persistence belongs to the
//! integrator behind the same traits.
//!
//! Both repositories carry a fault-injection switch (`fail_next`) so
//! transient-failure paths (sweeper retry, interactive propagation) stay
//! testable without a real store.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;

use shared::models::{DiningTable, Reservation, ReservationStatus, TableStatus};

use super::{RepoError, RepoResult, ReservationRepository, TableRepository};

/// In-memory reservation store.
#[derive(Debug, Default)]
pub struct MemoryReservationRepository {
    reservations: DashMap<String, Reservation>,
    fail_next: AtomicBool,
    fail_next_save: AtomicBool,
}

impl MemoryReservationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next operation fail with `RepoError::Unavailable`.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Make the next `save_reservation` fail, leaving reads untouched.
    pub fn fail_next_save(&self) {
        self.fail_next_save.store(true, Ordering::SeqCst);
    }

    fn check_fault(&self) -> RepoResult<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(RepoError::Unavailable("injected fault".to_string()));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }
}

#[async_trait]
impl ReservationRepository for MemoryReservationRepository {
    async fn list_reservations(
        &self,
        restaurant_id: &str,
        date: NaiveDate,
        statuses: &[ReservationStatus],
    ) -> RepoResult<Vec<Reservation>> {
        self.check_fault()?;
        let mut out: Vec<Reservation> = self
            .reservations
            .iter()
            .filter(|r| {
                r.restaurant_id == restaurant_id
                    && r.date == date
                    && statuses.contains(&r.status)
            })
            .map(|r| r.clone())
            .collect();
        out.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn find_reservation(&self, id: &str) -> RepoResult<Option<Reservation>> {
        self.check_fault()?;
        Ok(self.reservations.get(id).map(|r| r.clone()))
    }

    async fn save_reservation(&self, reservation: Reservation) -> RepoResult<Reservation> {
        self.check_fault()?;
        if self.fail_next_save.swap(false, Ordering::SeqCst) {
            return Err(RepoError::Unavailable("injected save fault".to_string()));
        }
        if reservation.id.is_empty() {
            return Err(RepoError::Validation("Reservation id is empty".to_string()));
        }
        self.reservations
            .insert(reservation.id.clone(), reservation.clone());
        Ok(reservation)
    }

    async fn update_reservation_status(
        &self,
        id: &str,
        status: ReservationStatus,
    ) -> RepoResult<Reservation> {
        self.check_fault()?;
        let mut entry = self
            .reservations
            .get_mut(id)
            .ok_or_else(|| RepoError::NotFound(format!("Reservation {} not found", id)))?;
        entry.status = status;
        Ok(entry.clone())
    }
}

/// In-memory table store.
#[derive(Debug, Default)]
pub struct MemoryTableRepository {
    tables: DashMap<String, DiningTable>,
    fail_next: AtomicBool,
}

impl MemoryTableRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with the restaurant's floor plan.
    pub fn seed(&self, tables: impl IntoIterator<Item = DiningTable>) {
        for table in tables {
            self.tables.insert(table.id.clone(), table);
        }
    }

    /// Make the next operation fail with `RepoError::Unavailable`.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn check_fault(&self) -> RepoResult<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(RepoError::Unavailable("injected fault".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TableRepository for MemoryTableRepository {
    async fn list_tables(&self, restaurant_id: &str) -> RepoResult<Vec<DiningTable>> {
        self.check_fault()?;
        let mut out: Vec<DiningTable> = self
            .tables
            .iter()
            .filter(|t| t.restaurant_id == restaurant_id && t.is_active)
            .map(|t| t.clone())
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn find_table(&self, table_id: &str) -> RepoResult<Option<DiningTable>> {
        self.check_fault()?;
        Ok(self.tables.get(table_id).map(|t| t.clone()))
    }

    async fn update_table_status(
        &self,
        table_id: &str,
        status: TableStatus,
    ) -> RepoResult<DiningTable> {
        self.check_fault()?;
        let mut entry = self
            .tables
            .get_mut(table_id)
            .ok_or_else(|| RepoError::NotFound(format!("Table {} not found", table_id)))?;
        entry.status = status;
        Ok(entry.clone())
    }
}
