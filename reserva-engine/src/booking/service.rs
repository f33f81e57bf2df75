//! Booking Service - inbound operations
//!
//! Accepts loosely structured requests (fuzzy dates, `H:MM` strings),
//! normalizes them, runs the availability math and places reservations
//! atomically.
//!
//! # Placement flow
//!
//! ```text
//! create_reservation(req)
//!     ├─ 1. Validate payload (party size, field lengths)
//!     ├─ 2. Normalize date/time in the restaurant timezone
//!     ├─ 3. Availability check (capacity, zone, interval overlap)
//!     ├─ 4. Per candidate table: take its transition lock,
//!     │      re-check conflicts under the lock
//!     ├─ 5. Same-day: hold the physical table (free → reserved)
//!     ├─ 6. Persist within the request timeout; roll the hold back
//!     │      on failure or timeout
//!     └─ 7. Broadcast ReservationCreated
//! ```
//!
//! Holding the table lock across steps 4-6 closes the check-then-act race:
//! two concurrent requests can both see a table as free, but only the first
//! one keeps it.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use validator::Validate;

use chrono::NaiveDate;
use shared::event::{EventPayload, ReleaseReason};
use shared::models::{DiningTable, Reservation, ReservationStatus};
use shared::util::{now_millis, short_id};

use crate::db::repository::ReservationRepository;
use crate::events::EventBus;
use crate::occupancy::OccupancyService;
use crate::schedule::availability::overlaps;
use crate::schedule::{AvailabilityChecker, AvailabilityReport, AvailabilityRequest, DateTimeNormalizer, TurnCatalog};
use crate::utils::time::{minutes_since_midnight, today_in_tz};
use crate::utils::{EngineError, EngineResult};

/// Booking payload as it arrives from untrusted sources.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BookingRequest {
    pub restaurant_id: String,
    /// Fuzzy date expression: "today", "mañana", a weekday name or ISO date
    pub date: String,
    /// Wall-clock time, `H:MM` / `HH:MM`
    pub time: String,
    #[validate(range(min = 1, message = "party size must be at least 1"))]
    pub party_size: i32,
    #[serde(default)]
    pub zone: Option<String>,
    #[validate(length(max = 120))]
    #[serde(default)]
    pub customer_name: Option<String>,
    #[validate(length(max = 32))]
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub notes: Option<String>,
}

/// Availability query with the same loose date/time encoding.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AvailabilityQuery {
    pub restaurant_id: String,
    pub date: String,
    pub time: String,
    #[validate(range(min = 1, message = "party size must be at least 1"))]
    pub party_size: i32,
    #[serde(default)]
    pub zone: Option<String>,
}

/// Inbound facade over the scheduling and occupancy cores.
pub struct BookingService {
    normalizer: DateTimeNormalizer,
    catalog: Arc<TurnCatalog>,
    checker: Arc<AvailabilityChecker>,
    occupancy: Arc<OccupancyService>,
    reservations: Arc<dyn ReservationRepository>,
    events: EventBus,
    request_timeout: Duration,
}

impl BookingService {
    pub fn new(
        normalizer: DateTimeNormalizer,
        catalog: Arc<TurnCatalog>,
        checker: Arc<AvailabilityChecker>,
        occupancy: Arc<OccupancyService>,
        reservations: Arc<dyn ReservationRepository>,
        events: EventBus,
        request_timeout: Duration,
    ) -> Self {
        Self {
            normalizer,
            catalog,
            checker,
            occupancy,
            reservations,
            events,
            request_timeout,
        }
    }

    /// Normalize and answer an availability query.
    pub async fn check_availability(
        &self,
        query: &AvailabilityQuery,
    ) -> EngineResult<AvailabilityReport> {
        if query.party_size <= 0 {
            return Err(EngineError::InvalidPartySize(query.party_size));
        }
        let date = self.normalizer.normalize_date(&query.date)?;
        let time = self.normalizer.validate_time(&query.time)?;
        self.checker
            .check(&AvailabilityRequest {
                restaurant_id: query.restaurant_id.clone(),
                date,
                time,
                party_size: query.party_size,
                zone: query.zone.clone(),
            })
            .await
    }

    /// Place a reservation atomically. See the module docs for the flow.
    pub async fn create_reservation(&self, request: BookingRequest) -> EngineResult<Reservation> {
        validate_payload(&request, request.party_size)?;
        let date = self.normalizer.normalize_date(&request.date)?;
        let time = self.normalizer.validate_time(&request.time)?;

        let report = self
            .checker
            .check(&AvailabilityRequest {
                restaurant_id: request.restaurant_id.clone(),
                date,
                time,
                party_size: request.party_size,
                zone: request.zone.clone(),
            })
            .await?;

        if report.available_count() == 0 {
            return Err(self.no_availability(&request.restaurant_id, time));
        }

        // Best fit first: smallest table that seats the party.
        let mut candidates: Vec<DiningTable> = report.available_tables().cloned().collect();
        candidates.sort_by(|a, b| a.capacity.cmp(&b.capacity).then_with(|| a.name.cmp(&b.name)));

        let start = minutes_since_midnight(time);
        let end = start + report.estimated_minutes;
        let same_day = date == today_in_tz(self.normalizer.timezone());

        for table in candidates {
            let lock = self.occupancy.table_lock(&table.id);
            let _guard = lock.lock().await;

            // Another request may have taken the table between the check
            // and this lock: verify again before committing.
            if self
                .conflicts_on_table(&request.restaurant_id, date, &table.id, start, end)
                .await?
            {
                continue;
            }

            let reservation = Reservation {
                id: short_id(),
                restaurant_id: request.restaurant_id.clone(),
                date,
                time,
                party_size: request.party_size,
                table_id: Some(table.id.clone()),
                status: ReservationStatus::Confirmed,
                zone: Some(table.zone.clone()),
                customer_name: request.customer_name.clone(),
                customer_phone: request.customer_phone.clone(),
                notes: request.notes.clone(),
                created_at: now_millis(),
            };

            // Same-day bookings also hold the physical table. Best-effort:
            // the calendar math already fits, live state may lag behind.
            let mut held = false;
            if same_day {
                match self.occupancy.reserve_locked(&table.id, &reservation).await {
                    Ok(()) => held = true,
                    Err(EngineError::TableUnavailable { detail, .. }) => {
                        tracing::debug!(table_id = %table.id, detail = %detail, "Skipping physical hold");
                    }
                    Err(e) => return Err(e),
                }
            }

            let saved = tokio::time::timeout(
                self.request_timeout,
                self.reservations.save_reservation(reservation.clone()),
            )
            .await;

            match saved {
                Ok(Ok(saved)) => {
                    tracing::info!(
                        reservation_id = %saved.id,
                        table_id = %table.id,
                        date = %date,
                        time = %time,
                        party_size = saved.party_size,
                        "Reservation created"
                    );
                    self.events.publish(EventPayload::ReservationCreated {
                        reservation_id: saved.id.clone(),
                        restaurant_id: saved.restaurant_id.clone(),
                        date,
                        time,
                        party_size: saved.party_size,
                        table_id: saved.table_id.clone(),
                    });
                    return Ok(saved);
                }
                Ok(Err(e)) => {
                    self.rollback_hold(held, &table.id).await;
                    return Err(e.into());
                }
                Err(_) => {
                    self.rollback_hold(held, &table.id).await;
                    return Err(EngineError::Timeout(format!(
                        "reservation save exceeded {} ms",
                        self.request_timeout.as_millis()
                    )));
                }
            }
        }

        // Every candidate was taken while we were locking.
        Err(self.no_availability(&request.restaurant_id, time))
    }

    /// Cancel a reservation. Idempotent on already-cancelled.
    pub async fn cancel_reservation(&self, reservation_id: &str) -> EngineResult<Reservation> {
        let reservation = self
            .reservations
            .find_reservation(reservation_id)
            .await?
            .ok_or_else(|| {
                EngineError::not_found(format!("Reservation {} not found", reservation_id))
            })?;

        match reservation.status {
            ReservationStatus::Cancelled => Ok(reservation),
            ReservationStatus::Completed => Err(EngineError::validation(
                "Completed reservations cannot be cancelled",
            )),
            ReservationStatus::Pending | ReservationStatus::Confirmed => {
                let updated = self
                    .reservations
                    .update_reservation_status(reservation_id, ReservationStatus::Cancelled)
                    .await?;

                if let Some(table_id) = updated.table_id.as_deref() {
                    self.occupancy
                        .release_hold_if(table_id, reservation_id)
                        .await?;
                }

                tracing::info!(reservation_id = %reservation_id, "Reservation cancelled");
                self.events.publish(EventPayload::ReservationCancelled {
                    reservation_id: reservation_id.to_string(),
                    restaurant_id: updated.restaurant_id.clone(),
                });
                Ok(updated)
            }
        }
    }

    /// Seat a party at a table, with or without a reservation.
    pub async fn occupy_table(
        &self,
        table_id: &str,
        reservation_id: Option<&str>,
        client_label: Option<String>,
    ) -> EngineResult<shared::models::OccupancyRecord> {
        match reservation_id {
            Some(id) => {
                let reservation = self
                    .reservations
                    .find_reservation(id)
                    .await?
                    .ok_or_else(|| {
                        EngineError::not_found(format!("Reservation {} not found", id))
                    })?;
                if reservation.status.is_terminal() {
                    return Err(EngineError::validation(format!(
                        "Reservation {} is {}",
                        id, reservation.status
                    )));
                }
                let estimated = self
                    .catalog
                    .estimated_minutes(&reservation.restaurant_id, reservation.time);
                self.occupancy
                    .occupy(table_id, Some(&reservation), client_label, estimated)
                    .await
            }
            None => {
                // Walk-in: duration from the meal type of the current
                // wall-clock time.
                let now_time =
                    crate::utils::time::now_in_tz(self.normalizer.timezone()).time();
                let estimated = self
                    .catalog
                    .default_minutes(self.catalog.meal_type_at(now_time));
                self.occupancy
                    .occupy(table_id, None, client_label, estimated)
                    .await
            }
        }
    }

    /// Manual release (staff action). Returns whether a transition happened.
    pub async fn release_table(&self, table_id: &str) -> EngineResult<bool> {
        self.occupancy.release(table_id, ReleaseReason::Manual).await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn conflicts_on_table(
        &self,
        restaurant_id: &str,
        date: NaiveDate,
        table_id: &str,
        start: i64,
        end: i64,
    ) -> EngineResult<bool> {
        let existing = self
            .reservations
            .list_reservations(restaurant_id, date, &ReservationStatus::ACTIVE)
            .await?;
        Ok(existing
            .iter()
            .filter(|r| r.table_id.as_deref() == Some(table_id))
            .any(|r| {
                let r_start = minutes_since_midnight(r.time);
                let r_end = r_start + self.catalog.estimated_minutes(restaurant_id, r.time);
                overlaps(start, end, r_start, r_end)
            }))
    }

    async fn rollback_hold(&self, held: bool, table_id: &str) {
        if !held {
            return;
        }
        if let Err(e) = self
            .occupancy
            .release_locked(table_id, ReleaseReason::Manual)
            .await
        {
            tracing::error!(table_id = %table_id, error = %e, "Failed to roll back table hold");
        }
    }

    fn no_availability(&self, restaurant_id: &str, time: chrono::NaiveTime) -> EngineError {
        let fallback = self.catalog.alternatives_for(restaurant_id, time);
        EngineError::NoAvailability {
            alternatives: fallback.alternative_times(),
            suggestion: fallback.suggestion,
        }
    }
}

/// Run the derive-based payload validation, keeping the typed party-size
/// error distinct from generic field validation.
fn validate_payload<T: Validate>(payload: &T, party_size: i32) -> EngineResult<()> {
    match payload.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            if errors.field_errors().contains_key("party_size") {
                return Err(EngineError::InvalidPartySize(party_size));
            }
            Err(EngineError::validation(errors.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn party_size_validation_maps_to_typed_error() {
        let request = BookingRequest {
            restaurant_id: "r1".into(),
            date: "today".into(),
            time: "20:00".into(),
            party_size: 0,
            zone: None,
            customer_name: None,
            customer_phone: None,
            notes: None,
        };
        let err = validate_payload(&request, request.party_size).unwrap_err();
        assert!(matches!(err, EngineError::InvalidPartySize(0)));
    }

    #[test]
    fn oversized_fields_are_rejected() {
        let request = BookingRequest {
            restaurant_id: "r1".into(),
            date: "today".into(),
            time: "20:00".into(),
            party_size: 2,
            zone: None,
            customer_name: Some("x".repeat(200)),
            customer_phone: None,
            notes: None,
        };
        let err = validate_payload(&request, request.party_size).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
