//! End-to-end booking flow against in-memory repositories
//!
//! Exercises the inbound facade the way an HTTP layer or voice-agent
//! dispatcher would: fuzzy payloads in, typed results and events out.

use std::sync::Arc;

use chrono::NaiveTime;

use reserva_engine::{
    AvailabilityQuery, BookingRequest, EngineConfig, EngineError, EngineState,
    MemoryReservationRepository, MemoryTableRepository, ReservationRepository, TableRepository,
};
use shared::event::DomainEventType;
use shared::models::{DiningTable, MealType, ReservationStatus, TableStatus, TimeSlot};

const RESTAURANT: &str = "casa-pepe";

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn setup() -> (
    EngineState,
    Arc<MemoryTableRepository>,
    Arc<MemoryReservationRepository>,
) {
    let (state, tables, reservations) = EngineState::in_memory(EngineConfig::from_env());
    tables.seed([
        DiningTable::new("terrace-1", RESTAURANT, "Terrace 1", "Terrace", 4),
        DiningTable::new("terrace-2", RESTAURANT, "Terrace 2", "Terrace", 4),
        DiningTable::new("hall-1", RESTAURANT, "Hall 1", "Main hall", 6),
    ]);
    state.set_turns(
        RESTAURANT,
        vec![
            TimeSlot::new("lunch-1", "Lunch", t(13, 0), t(15, 0), MealType::Lunch),
            TimeSlot::new("dinner-1", "First dinner", t(20, 0), t(22, 0), MealType::Dinner),
            TimeSlot::new("dinner-2", "Second dinner", t(22, 0), t(23, 45), MealType::Dinner),
        ],
    );
    (state, tables, reservations)
}

fn booking(date: &str, time: &str, party: i32, zone: Option<&str>) -> BookingRequest {
    BookingRequest {
        restaurant_id: RESTAURANT.to_string(),
        date: date.to_string(),
        time: time.to_string(),
        party_size: party,
        zone: zone.map(str::to_string),
        customer_name: Some("Garcia".to_string()),
        customer_phone: Some("+34 600 000 000".to_string()),
        notes: None,
    }
}

#[tokio::test]
async fn reservation_is_placed_on_a_fitting_table() {
    let (state, _tables, reservations) = setup();
    let mut rx = state.events.subscribe();

    let created = state
        .booking
        .create_reservation(booking("2030-05-20", "20:00", 4, Some("Terrace")))
        .await
        .unwrap();

    assert_eq!(created.status, ReservationStatus::Confirmed);
    assert_eq!(created.zone.as_deref(), Some("Terrace"));
    assert!(created.table_id.is_some());
    assert_eq!(reservations.len(), 1);

    // AvailabilityChecked then ReservationCreated.
    let first = rx.recv().await.unwrap();
    assert_eq!(first.event_type, DomainEventType::AvailabilityChecked);
    let second = rx.recv().await.unwrap();
    assert_eq!(second.event_type, DomainEventType::ReservationCreated);
}

#[tokio::test]
async fn overlapping_bookings_spread_across_tables_until_full() {
    let (state, _tables, _reservations) = setup();

    // Terrace has two capacity-4 tables; a third overlapping request for
    // the same zone must fail with alternatives.
    let a = state
        .booking
        .create_reservation(booking("2030-05-20", "20:00", 4, Some("Terrace")))
        .await
        .unwrap();
    let b = state
        .booking
        .create_reservation(booking("2030-05-20", "21:00", 4, Some("Terrace")))
        .await
        .unwrap();
    assert_ne!(a.table_id, b.table_id);

    let err = state
        .booking
        .create_reservation(booking("2030-05-20", "20:30", 4, Some("Terrace")))
        .await
        .unwrap_err();
    match err {
        EngineError::NoAvailability { alternatives, .. } => {
            assert!(!alternatives.is_empty());
        }
        other => panic!("expected NoAvailability, got {other}"),
    }
}

#[tokio::test]
async fn back_to_back_bookings_share_a_table() {
    let (state, _tables, _reservations) = setup();

    // Dinner estimate is 150 min: 19:00 occupies [19:00, 21:30).
    let a = state
        .booking
        .create_reservation(booking("2030-05-20", "19:00", 6, Some("Main hall")))
        .await
        .unwrap();
    let b = state
        .booking
        .create_reservation(booking("2030-05-20", "21:30", 6, Some("Main hall")))
        .await
        .unwrap();
    assert_eq!(a.table_id, b.table_id);
}

#[tokio::test]
async fn availability_scenario_reports_rate_and_grouping() {
    let (state, _tables, _reservations) = setup();

    state
        .booking
        .create_reservation(booking("2030-05-20", "19:30", 4, Some("Terrace")))
        .await
        .unwrap();

    // 19:30 dinner occupies [19:30, 22:00): a 20:00 request conflicts on
    // that table, leaving one terrace table.
    let report = state
        .booking
        .check_availability(&AvailabilityQuery {
            restaurant_id: RESTAURANT.to_string(),
            date: "2030-05-20".to_string(),
            time: "20:00".to_string(),
            party_size: 4,
            zone: Some("Terrace".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(report.available_count(), 1);
    assert_eq!(report.occupied_or_conflicting, 1);
    assert_eq!(report.total_tables, 3);
    assert!((report.occupancy_rate - 1.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn malformed_input_is_rejected_with_typed_errors() {
    let (state, _tables, _reservations) = setup();

    let err = state
        .booking
        .create_reservation(booking("2030-05-20", "8pm", 4, None))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTimeFormat(_)));

    let err = state
        .booking
        .create_reservation(booking("sometime soon", "20:00", 4, None))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidDateExpression(_)));

    let err = state
        .booking
        .create_reservation(booking("2030-05-20", "20:00", -2, None))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidPartySize(-2)));
}

#[tokio::test]
async fn cancellation_is_idempotent_and_frees_the_hold() {
    let (state, tables, _reservations) = setup();

    // A same-day booking also holds the physical table.
    let created = state
        .booking
        .create_reservation(booking("today", "23:00", 2, None))
        .await
        .unwrap();
    let table_id = created.table_id.clone().unwrap();
    assert_eq!(
        tables.find_table(&table_id).await.unwrap().unwrap().status,
        TableStatus::Reserved
    );

    let cancelled = state.booking.cancel_reservation(&created.id).await.unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    assert_eq!(
        tables.find_table(&table_id).await.unwrap().unwrap().status,
        TableStatus::Free
    );

    // Second cancel: same observable state, no error.
    let again = state.booking.cancel_reservation(&created.id).await.unwrap();
    assert_eq!(again.status, ReservationStatus::Cancelled);
}

#[tokio::test]
async fn seating_and_releasing_completes_the_reservation() {
    let (state, tables, reservations) = setup();

    let created = state
        .booking
        .create_reservation(booking("2030-05-20", "20:00", 4, Some("Terrace")))
        .await
        .unwrap();
    let table_id = created.table_id.clone().unwrap();

    state
        .booking
        .occupy_table(&table_id, Some(&created.id), None)
        .await
        .unwrap();
    assert_eq!(
        tables.find_table(&table_id).await.unwrap().unwrap().status,
        TableStatus::Occupied
    );

    assert!(state.booking.release_table(&table_id).await.unwrap());
    assert_eq!(
        tables.find_table(&table_id).await.unwrap().unwrap().status,
        TableStatus::Free
    );
    assert_eq!(
        reservations
            .find_reservation(&created.id)
            .await
            .unwrap()
            .unwrap()
            .status,
        ReservationStatus::Completed
    );

    // Releasing again is a no-op.
    assert!(!state.booking.release_table(&table_id).await.unwrap());
}

#[tokio::test]
async fn repository_outage_rolls_back_the_same_day_hold() {
    let (state, tables, reservations) = setup();

    reservations.fail_next_save();
    let err = state
        .booking
        .create_reservation(booking("today", "23:30", 2, None))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::RepositoryUnavailable(_)));

    // No reservation persisted and no table left behind in reserved.
    assert!(reservations.is_empty());
    for table in tables.list_tables(RESTAURANT).await.unwrap() {
        assert_eq!(table.status, TableStatus::Free);
    }
}
