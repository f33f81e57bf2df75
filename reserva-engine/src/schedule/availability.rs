//! Availability Checker
//!
//! Computes free tables for a date/time/party-size request from the set of
//! active reservations, using half-open interval overlap and the turn
//! catalog's estimated service durations.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use shared::event::EventPayload;
use shared::models::{DiningTable, Reservation, ReservationStatus, TableStatus, TimeSlot};

use crate::db::repository::{ReservationRepository, TableRepository};
use crate::events::EventBus;
use crate::schedule::TurnCatalog;
use crate::utils::time::minutes_since_midnight;
use crate::utils::{EngineError, EngineResult};

/// A fully normalized availability request.
#[derive(Debug, Clone)]
pub struct AvailabilityRequest {
    pub restaurant_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub party_size: i32,
    /// Optional zone preference, matched case-insensitively.
    pub zone: Option<String>,
}

/// Free tables of one zone.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneAvailability {
    pub zone: String,
    pub tables: Vec<DiningTable>,
}

/// Availability answer for one request.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityReport {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub estimated_minutes: i64,
    /// Free tables satisfying capacity and zone, grouped by zone.
    pub available: Vec<ZoneAvailability>,
    pub total_tables: usize,
    /// Tables either live-occupied right now or holding a conflicting
    /// reservation for the requested window.
    pub occupied_or_conflicting: usize,
    pub occupancy_rate: f64,
    /// Closest canonical turns, populated when no table is free.
    pub alternatives: Vec<TimeSlot>,
    pub suggestion: Option<String>,
}

impl AvailabilityReport {
    pub fn available_tables(&self) -> impl Iterator<Item = &DiningTable> {
        self.available.iter().flat_map(|z| z.tables.iter())
    }

    pub fn available_count(&self) -> usize {
        self.available.iter().map(|z| z.tables.len()).sum()
    }
}

/// Half-open interval overlap: `[a_start, a_end)` vs `[b_start, b_end)`.
/// Back-to-back intervals (equal end/start) never conflict.
pub(crate) fn overlaps(a_start: i64, a_end: i64, b_start: i64, b_end: i64) -> bool {
    a_start < b_end && b_start < a_end
}

/// Availability/conflict checker.
pub struct AvailabilityChecker {
    tables: Arc<dyn TableRepository>,
    reservations: Arc<dyn ReservationRepository>,
    catalog: Arc<TurnCatalog>,
    events: EventBus,
}

impl AvailabilityChecker {
    pub fn new(
        tables: Arc<dyn TableRepository>,
        reservations: Arc<dyn ReservationRepository>,
        catalog: Arc<TurnCatalog>,
        events: EventBus,
    ) -> Self {
        Self {
            tables,
            reservations,
            catalog,
            events,
        }
    }

    /// Compute free tables for the request.
    ///
    /// Times outside every operating window still run the overlap math:
    /// the operating-hours policy belongs to an external collaborator.
    pub async fn check(&self, request: &AvailabilityRequest) -> EngineResult<AvailabilityReport> {
        if request.party_size <= 0 {
            return Err(EngineError::InvalidPartySize(request.party_size));
        }

        let estimated_minutes = self
            .catalog
            .estimated_minutes(&request.restaurant_id, request.time);
        let requested_start = minutes_since_midnight(request.time);
        let requested_end = requested_start + estimated_minutes;

        let tables = self.tables.list_tables(&request.restaurant_id).await?;
        let reservations = self
            .reservations
            .list_reservations(
                &request.restaurant_id,
                request.date,
                &ReservationStatus::ACTIVE,
            )
            .await?;

        // Reservations per assigned table.
        let mut by_table: BTreeMap<&str, Vec<&Reservation>> = BTreeMap::new();
        for reservation in &reservations {
            if let Some(table_id) = reservation.table_id.as_deref() {
                by_table.entry(table_id).or_default().push(reservation);
            }
        }

        let mut occupied_or_conflicting = 0usize;
        let mut free: Vec<&DiningTable> = Vec::new();

        for table in &tables {
            let conflicting = by_table.get(table.id.as_str()).is_some_and(|existing| {
                existing.iter().any(|r| {
                    let start = minutes_since_midnight(r.time);
                    let end = start
                        + self
                            .catalog
                            .estimated_minutes(&request.restaurant_id, r.time);
                    overlaps(requested_start, requested_end, start, end)
                })
            });

            if conflicting || table.status == TableStatus::Occupied {
                occupied_or_conflicting += 1;
            }
            if !conflicting && table.status != TableStatus::Maintenance {
                free.push(table);
            }
        }

        let matches_zone = |table: &DiningTable| match request.zone.as_deref() {
            Some(zone) => table.zone.eq_ignore_ascii_case(zone),
            None => true,
        };

        let mut by_zone: BTreeMap<String, Vec<DiningTable>> = BTreeMap::new();
        for table in free
            .into_iter()
            .filter(|t| t.capacity >= request.party_size && matches_zone(t))
        {
            by_zone
                .entry(table.zone.clone())
                .or_default()
                .push(table.clone());
        }
        let available: Vec<ZoneAvailability> = by_zone
            .into_iter()
            .map(|(zone, tables)| ZoneAvailability { zone, tables })
            .collect();

        let total_tables = tables.len();
        let occupancy_rate = if total_tables == 0 {
            0.0
        } else {
            occupied_or_conflicting as f64 / total_tables as f64
        };

        let (alternatives, suggestion) = if available.is_empty() {
            let fallback = self
                .catalog
                .alternatives_for(&request.restaurant_id, request.time);
            (fallback.alternatives, fallback.suggestion)
        } else {
            (Vec::new(), None)
        };

        let report = AvailabilityReport {
            date: request.date,
            time: request.time,
            estimated_minutes,
            available,
            total_tables,
            occupied_or_conflicting,
            occupancy_rate,
            alternatives,
            suggestion,
        };

        tracing::debug!(
            restaurant_id = %request.restaurant_id,
            date = %request.date,
            time = %request.time,
            party_size = request.party_size,
            available = report.available_count(),
            occupancy_rate = report.occupancy_rate,
            "Availability checked"
        );
        self.events.publish(EventPayload::AvailabilityChecked {
            restaurant_id: request.restaurant_id.clone(),
            date: request.date,
            time: request.time,
            party_size: request.party_size,
            available_count: report.available_count(),
        });

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{MemoryReservationRepository, MemoryTableRepository};
    use shared::models::MealType;
    use shared::util::now_millis;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 26).unwrap()
    }

    fn reservation(id: &str, table_id: &str, time: NaiveTime) -> Reservation {
        Reservation {
            id: id.to_string(),
            restaurant_id: "r1".to_string(),
            date: date(),
            time,
            party_size: 4,
            table_id: Some(table_id.to_string()),
            status: ReservationStatus::Confirmed,
            zone: None,
            customer_name: None,
            customer_phone: None,
            notes: None,
            created_at: now_millis(),
        }
    }

    fn checker(
        tables: Arc<MemoryTableRepository>,
        reservations: Arc<MemoryReservationRepository>,
    ) -> AvailabilityChecker {
        let catalog = Arc::new(TurnCatalog::new(t(17, 0), 120, 150));
        catalog.set_slots(
            "r1",
            vec![
                TimeSlot::new("t13", "Lunch", t(13, 0), t(15, 0), MealType::Lunch),
                TimeSlot::new("t20", "Dinner 1", t(20, 0), t(22, 0), MealType::Dinner),
                TimeSlot::new("t22", "Dinner 2", t(22, 0), t(23, 30), MealType::Dinner),
            ],
        );
        AvailabilityChecker::new(tables, reservations, catalog, EventBus::new(16))
    }

    fn request(time: NaiveTime, party: i32, zone: Option<&str>) -> AvailabilityRequest {
        AvailabilityRequest {
            restaurant_id: "r1".to_string(),
            date: date(),
            time,
            party_size: party,
            zone: zone.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn terrace_scenario_one_of_two_tables_conflicts() {
        // Two capacity-4 terrace tables, one already booked 19:30 dinner
        // (150 min -> 19:30-22:00). A 20:00 request overlaps it.
        let tables = Arc::new(MemoryTableRepository::new());
        tables.seed([
            DiningTable::new("t1", "r1", "Terrace 1", "Terrace", 4),
            DiningTable::new("t2", "r1", "Terrace 2", "Terrace", 4),
        ]);
        let reservations = Arc::new(MemoryReservationRepository::new());
        reservations
            .save_reservation(reservation("a", "t1", t(19, 30)))
            .await
            .unwrap();

        let report = checker(tables, reservations)
            .check(&request(t(20, 0), 4, Some("Terrace")))
            .await
            .unwrap();

        assert_eq!(report.available_count(), 1);
        assert_eq!(report.available[0].tables[0].id, "t2");
        assert_eq!(report.occupied_or_conflicting, 1);
        assert!((report.occupancy_rate - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn back_to_back_reservations_do_not_conflict() {
        // Existing 20:00 dinner occupies [20:00, 22:30). A 22:30 request is
        // exactly back-to-back and must not conflict.
        let tables = Arc::new(MemoryTableRepository::new());
        tables.seed([DiningTable::new("t1", "r1", "T1", "Main hall", 4)]);
        let reservations = Arc::new(MemoryReservationRepository::new());
        reservations
            .save_reservation(reservation("a", "t1", t(20, 0)))
            .await
            .unwrap();

        let report = checker(tables, reservations)
            .check(&request(t(22, 30), 2, None))
            .await
            .unwrap();
        assert_eq!(report.available_count(), 1);
    }

    #[tokio::test]
    async fn slot_specific_duration_narrows_the_window() {
        // The 22:00 slot caps service at 90 minutes, so a reservation at
        // 22:00 occupies [22:00, 23:30) and a 21:00 request (150 min ->
        // [21:00, 23:30)) conflicts with it.
        let tables = Arc::new(MemoryTableRepository::new());
        tables.seed([DiningTable::new("t1", "r1", "T1", "Main hall", 4)]);
        let reservations = Arc::new(MemoryReservationRepository::new());
        reservations
            .save_reservation(reservation("a", "t1", t(22, 0)))
            .await
            .unwrap();

        let catalog = Arc::new(TurnCatalog::new(t(17, 0), 120, 150));
        catalog.set_slots(
            "r1",
            vec![
                TimeSlot::new("t22", "Late", t(22, 0), t(23, 30), MealType::Dinner)
                    .with_max_duration(90),
            ],
        );
        let checker = AvailabilityChecker::new(tables, reservations, catalog, EventBus::new(16));

        let report = checker.check(&request(t(21, 0), 2, None)).await.unwrap();
        assert_eq!(report.available_count(), 0);
        assert!(!report.alternatives.is_empty());
    }

    #[tokio::test]
    async fn party_size_must_be_positive() {
        let tables = Arc::new(MemoryTableRepository::new());
        let reservations = Arc::new(MemoryReservationRepository::new());
        let err = checker(tables, reservations)
            .check(&request(t(20, 0), 0, None))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidPartySize(0)));
    }

    #[tokio::test]
    async fn capacity_filter_excludes_small_tables() {
        let tables = Arc::new(MemoryTableRepository::new());
        tables.seed([
            DiningTable::new("t1", "r1", "T1", "Main hall", 2),
            DiningTable::new("t2", "r1", "T2", "Main hall", 6),
        ]);
        let reservations = Arc::new(MemoryReservationRepository::new());

        let report = checker(tables, reservations)
            .check(&request(t(20, 0), 4, None))
            .await
            .unwrap();
        let ids: Vec<&str> = report.available_tables().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t2"]);
    }

    #[tokio::test]
    async fn no_tables_surfaces_turn_alternatives() {
        let tables = Arc::new(MemoryTableRepository::new());
        tables.seed([DiningTable::new("t1", "r1", "T1", "Main hall", 2)]);
        let reservations = Arc::new(MemoryReservationRepository::new());

        // Party of 8 never fits: zero candidates, alternatives populated.
        let report = checker(tables, reservations)
            .check(&request(t(20, 0), 8, None))
            .await
            .unwrap();
        assert_eq!(report.available_count(), 0);
        assert_eq!(report.alternatives.len(), 2);
        assert!(report.suggestion.is_some());
    }

    #[tokio::test]
    async fn maintenance_tables_are_never_offered() {
        let tables = Arc::new(MemoryTableRepository::new());
        let mut broken = DiningTable::new("t1", "r1", "T1", "Main hall", 4);
        broken.status = TableStatus::Maintenance;
        tables.seed([broken, DiningTable::new("t2", "r1", "T2", "Main hall", 4)]);
        let reservations = Arc::new(MemoryReservationRepository::new());

        let report = checker(tables, reservations)
            .check(&request(t(20, 0), 4, None))
            .await
            .unwrap();
        let ids: Vec<&str> = report.available_tables().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t2"]);
    }
}
