//! Occupancy State Machine
//!
//! Lifecycle of a physical table: `free → reserved → occupied → free`, with
//! walk-ins going `free → occupied` directly and `maintenance` as a
//! side-state reachable from `free` only.
//!
//! All transitions on one table are serialized through a per-table async
//! lock. The booking facade holds the same lock across its availability
//! re-check, and the sweeper goes through the public transitions, so a
//! check-in and an auto-release tick can never interleave on one table.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use chrono_tz::Tz;
use shared::event::{EventPayload, ReleaseReason};
use shared::models::{OccupancyRecord, Reservation, ReservationStatus, TableStatus};
use shared::util::now_millis;

use crate::db::repository::{RepoError, ReservationRepository, TableRepository};
use crate::events::EventBus;
use crate::occupancy::ReleasePolicy;
use crate::utils::time::millis_to_hhmm;
use crate::utils::{EngineError, EngineResult};

/// Outcome counters for one sweep pass.
#[derive(Debug, Default, Clone, Copy, serde::Serialize)]
pub struct SweepStats {
    pub checked: usize,
    pub warned: usize,
    pub released: usize,
    pub failed: usize,
}

/// Table-occupancy service: state transitions, runtime records, sweep.
pub struct OccupancyService {
    tables: Arc<dyn TableRepository>,
    reservations: Arc<dyn ReservationRepository>,
    policy: ReleasePolicy,
    events: EventBus,
    tz: Tz,
    /// Active occupancy records, keyed by table id.
    records: DashMap<String, OccupancyRecord>,
    /// Reservation currently holding each `reserved` table.
    holds: DashMap<String, String>,
    /// Per-table transition locks.
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl OccupancyService {
    pub fn new(
        tables: Arc<dyn TableRepository>,
        reservations: Arc<dyn ReservationRepository>,
        policy: ReleasePolicy,
        events: EventBus,
        tz: Tz,
    ) -> Self {
        Self {
            tables,
            reservations,
            policy,
            events,
            tz,
            records: DashMap::new(),
            holds: DashMap::new(),
            locks: DashMap::new(),
        }
    }

    /// Transition lock for one table. The booking facade acquires this
    /// across its check-and-reserve sequence.
    pub fn table_lock(&self, table_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(table_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Active occupancy record for a table, if any.
    pub fn record_for(&self, table_id: &str) -> Option<OccupancyRecord> {
        self.records.get(table_id).map(|r| r.clone())
    }

    pub fn occupied_count(&self) -> usize {
        self.records.len()
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Hold a free table for a reservation (`free → reserved`).
    pub async fn reserve(&self, table_id: &str, reservation: &Reservation) -> EngineResult<()> {
        let lock = self.table_lock(table_id);
        let _guard = lock.lock().await;
        self.reserve_locked(table_id, reservation).await
    }

    /// `reserve` body for callers that already hold the table lock.
    pub(crate) async fn reserve_locked(
        &self,
        table_id: &str,
        reservation: &Reservation,
    ) -> EngineResult<()> {
        let table = self.require_table(table_id).await?;
        match table.status {
            TableStatus::Free => {
                self.tables
                    .update_table_status(table_id, TableStatus::Reserved)
                    .await?;
                self.holds
                    .insert(table_id.to_string(), reservation.id.clone());
                tracing::info!(table_id = %table_id, reservation_id = %reservation.id, "Table reserved");
                self.events.publish(EventPayload::TableReserved {
                    table_id: table_id.to_string(),
                    reservation_id: reservation.id.clone(),
                });
                Ok(())
            }
            TableStatus::Reserved => {
                // Idempotent only for the same reservation.
                match self.holds.get(table_id).map(|h| h.clone()) {
                    Some(holder) if holder == reservation.id => Ok(()),
                    _ => Err(EngineError::table_unavailable(
                        table_id,
                        "already held for another reservation",
                    )),
                }
            }
            TableStatus::Occupied => Err(self.occupied_error(table_id)),
            TableStatus::Maintenance => {
                Err(EngineError::table_unavailable(table_id, "under maintenance"))
            }
        }
    }

    /// Seat a party (`free|reserved → occupied`). Walk-ins pass no
    /// reservation. Returns the created occupancy record.
    pub async fn occupy(
        &self,
        table_id: &str,
        reservation: Option<&Reservation>,
        client_label: Option<String>,
        estimated_minutes: i64,
    ) -> EngineResult<OccupancyRecord> {
        let lock = self.table_lock(table_id);
        let _guard = lock.lock().await;
        self.occupy_locked(table_id, reservation, client_label, estimated_minutes)
            .await
    }

    pub(crate) async fn occupy_locked(
        &self,
        table_id: &str,
        reservation: Option<&Reservation>,
        client_label: Option<String>,
        estimated_minutes: i64,
    ) -> EngineResult<OccupancyRecord> {
        let table = self.require_table(table_id).await?;
        match table.status {
            TableStatus::Free | TableStatus::Reserved => {
                let label = client_label.or_else(|| reservation.map(|r| r.client_label()));
                let record = self.policy.build_record(
                    table_id,
                    reservation.map(|r| r.id.clone()),
                    label.clone(),
                    now_millis(),
                    estimated_minutes,
                );
                self.tables
                    .update_table_status(table_id, TableStatus::Occupied)
                    .await?;
                self.holds.remove(table_id);
                self.records.insert(table_id.to_string(), record.clone());
                tracing::info!(
                    table_id = %table_id,
                    client = %label.as_deref().unwrap_or("walk-in"),
                    estimated_minutes,
                    "Table occupied"
                );
                self.events.publish(EventPayload::TableOccupied {
                    table_id: table_id.to_string(),
                    reservation_id: record.reservation_id.clone(),
                    client_label: record.client_label.clone(),
                    estimated_minutes,
                });
                Ok(record)
            }
            // Re-seating an already occupied table is a no-op.
            TableStatus::Occupied => self
                .record_for(table_id)
                .ok_or_else(|| self.occupied_error(table_id)),
            TableStatus::Maintenance => {
                Err(EngineError::table_unavailable(table_id, "under maintenance"))
            }
        }
    }

    /// Release a table back to `free`. Idempotent: releasing a free table
    /// is a no-op and emits nothing. Returns whether a transition happened.
    pub async fn release(&self, table_id: &str, reason: ReleaseReason) -> EngineResult<bool> {
        let lock = self.table_lock(table_id);
        let _guard = lock.lock().await;
        self.release_locked(table_id, reason).await
    }

    pub(crate) async fn release_locked(
        &self,
        table_id: &str,
        reason: ReleaseReason,
    ) -> EngineResult<bool> {
        let table = self.require_table(table_id).await?;
        match table.status {
            TableStatus::Free => {
                self.records.remove(table_id);
                Ok(false)
            }
            // Maintenance ends via clear_maintenance, not release.
            TableStatus::Maintenance => Ok(false),
            TableStatus::Reserved => {
                self.tables
                    .update_table_status(table_id, TableStatus::Free)
                    .await?;
                self.holds.remove(table_id);
                tracing::info!(table_id = %table_id, reason = %reason, "Reserved table released");
                self.events.publish(EventPayload::TableReleased {
                    table_id: table_id.to_string(),
                    client_label: None,
                    occupied_minutes: 0,
                    reason,
                });
                Ok(true)
            }
            TableStatus::Occupied => {
                let record = self.record_for(table_id);

                // Complete the attached reservation first: if the store is
                // down we keep the record and the sweeper retries.
                if let Some(reservation_id) =
                    record.as_ref().and_then(|r| r.reservation_id.as_deref())
                {
                    match self
                        .reservations
                        .update_reservation_status(reservation_id, ReservationStatus::Completed)
                        .await
                    {
                        Ok(_) | Err(RepoError::NotFound(_)) => {}
                        Err(e) => return Err(e.into()),
                    }
                }

                self.tables
                    .update_table_status(table_id, TableStatus::Free)
                    .await?;
                self.records.remove(table_id);

                let now = now_millis();
                let occupied_minutes = record
                    .as_ref()
                    .map(|r| r.occupied_minutes(now))
                    .unwrap_or(0);
                let client_label = record.and_then(|r| r.client_label);
                tracing::info!(
                    table_id = %table_id,
                    occupied_minutes,
                    reason = %reason,
                    "Table released"
                );
                self.events.publish(EventPayload::TableReleased {
                    table_id: table_id.to_string(),
                    client_label,
                    occupied_minutes,
                    reason,
                });
                Ok(true)
            }
        }
    }

    /// Drop a reservation's hold on a table, if it still owns it. Used by
    /// the cancellation flow; another reservation's hold is left alone.
    pub async fn release_hold_if(
        &self,
        table_id: &str,
        reservation_id: &str,
    ) -> EngineResult<bool> {
        let holder = self.holds.get(table_id).map(|h| h.clone());
        if holder.as_deref() != Some(reservation_id) {
            return Ok(false);
        }
        self.release(table_id, ReleaseReason::Manual).await
    }

    /// Take a free table out of service.
    pub async fn set_maintenance(&self, table_id: &str) -> EngineResult<()> {
        let lock = self.table_lock(table_id);
        let _guard = lock.lock().await;
        let table = self.require_table(table_id).await?;
        match table.status {
            TableStatus::Maintenance => Ok(()),
            TableStatus::Free => {
                self.tables
                    .update_table_status(table_id, TableStatus::Maintenance)
                    .await?;
                tracing::info!(table_id = %table_id, "Table under maintenance");
                Ok(())
            }
            status => Err(EngineError::table_unavailable(
                table_id,
                format!("cannot enter maintenance while {}", status),
            )),
        }
    }

    /// Return a maintenance table to service.
    pub async fn clear_maintenance(&self, table_id: &str) -> EngineResult<()> {
        let lock = self.table_lock(table_id);
        let _guard = lock.lock().await;
        let table = self.require_table(table_id).await?;
        match table.status {
            TableStatus::Free => Ok(()),
            TableStatus::Maintenance => {
                self.tables
                    .update_table_status(table_id, TableStatus::Free)
                    .await?;
                tracing::info!(table_id = %table_id, "Table back in service");
                Ok(())
            }
            status => Err(EngineError::table_unavailable(
                table_id,
                format!("not in maintenance (currently {})", status),
            )),
        }
    }

    // ========================================================================
    // Sweep
    // ========================================================================

    /// One sweep pass over all occupancy records as of `now` (Unix millis).
    ///
    /// Emits the nearing-cleanup warning once per record, force-releases
    /// overdue tables, and isolates failures per table: one table's broken
    /// release never aborts the rest of the pass.
    pub async fn sweep_once(&self, now: i64) -> SweepStats {
        let mut stats = SweepStats::default();
        let snapshot: Vec<OccupancyRecord> =
            self.records.iter().map(|r| r.clone()).collect();
        stats.checked = snapshot.len();

        for record in snapshot {
            if now >= record.release_at {
                match self.release(&record.table_id, ReleaseReason::Auto).await {
                    Ok(true) => {
                        stats.released += 1;
                        tracing::warn!(
                            table_id = %record.table_id,
                            occupied_minutes = record.occupied_minutes(now),
                            "Occupancy deadline exceeded, table auto-released"
                        );
                    }
                    Ok(false) => {
                        // Table already free elsewhere; drop the stale record.
                        self.records.remove(&record.table_id);
                    }
                    Err(e) => {
                        stats.failed += 1;
                        tracing::error!(
                            table_id = %record.table_id,
                            error = %e,
                            "Auto-release failed, will retry next sweep"
                        );
                    }
                }
            } else if now >= record.warn_at && !record.warned {
                if let Some(mut entry) = self.records.get_mut(&record.table_id) {
                    entry.warned = true;
                }
                stats.warned += 1;
                tracing::info!(
                    table_id = %record.table_id,
                    minutes_until_release = record.minutes_until_release(now),
                    "Table nearing cleanup"
                );
                self.events.publish(EventPayload::TableNearingCleanup {
                    table_id: record.table_id.clone(),
                    client_label: record.client_label.clone(),
                    minutes_until_release: record.minutes_until_release(now),
                });
            }
        }

        stats
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn require_table(&self, table_id: &str) -> EngineResult<shared::models::DiningTable> {
        self.tables
            .find_table(table_id)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("Table {} not found", table_id)))
    }

    /// `TableUnavailable` carrying the current occupant's window when the
    /// record is still around.
    fn occupied_error(&self, table_id: &str) -> EngineError {
        let detail = match self.record_for(table_id) {
            Some(record) => format!(
                "occupied until approximately {}",
                millis_to_hhmm(record.release_at, self.tz)
            ),
            None => "currently occupied".to_string(),
        };
        EngineError::table_unavailable(table_id, detail)
    }
}
