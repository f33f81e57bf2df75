//! Auto-release sweeper under the full engine wiring
//!
//! Runs the real background tasks (event router + sweeper) against
//! in-memory repositories with a zero-minute ceiling so overdue tables are
//! reclaimed on the first tick.

use std::time::Duration;

use reserva_engine::{BackgroundTasks, EngineConfig, EngineState, TableRepository};
use shared::event::{DomainEventType, EventPayload, ReleaseReason};
use shared::models::{DiningTable, TableStatus};

const RESTAURANT: &str = "casa-pepe";

fn tight_config() -> EngineConfig {
    let mut config = EngineConfig::from_env();
    // Everything is overdue the moment it sits.
    config.max_occupation_minutes = 0;
    config.grace_minutes = 0;
    config.sweep_interval_secs = 1;
    config
}

#[tokio::test(start_paused = true)]
async fn overdue_table_is_reclaimed_and_audited() {
    let (state, tables, _reservations) = EngineState::in_memory(tight_config());
    tables.seed([DiningTable::new("hall-1", RESTAURANT, "Hall 1", "Main hall", 4)]);

    let mut background = BackgroundTasks::new();
    let mut channels = state.start_background_tasks(&mut background);

    state
        .booking
        .occupy_table("hall-1", None, Some("walk-in".to_string()))
        .await
        .unwrap();

    // Let the sweeper tick under paused time.
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(
        tables.find_table("hall-1").await.unwrap().unwrap().status,
        TableStatus::Free
    );
    assert!(state.occupancy.record_for("hall-1").is_none());

    // The forced release lands on the audit lane with reason "auto".
    let released = loop {
        let event = channels.audit_rx.recv().await.unwrap();
        if event.event_type == DomainEventType::TableReleased {
            break event;
        }
    };
    match &released.payload {
        EventPayload::TableReleased {
            table_id, reason, ..
        } => {
            assert_eq!(table_id, "hall-1");
            assert_eq!(*reason, ReleaseReason::Auto);
        }
        other => panic!("unexpected payload: {other:?}"),
    }

    background.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn sweeper_survives_a_repository_outage() {
    let (state, tables, _reservations) = EngineState::in_memory(tight_config());
    tables.seed([DiningTable::new("hall-1", RESTAURANT, "Hall 1", "Main hall", 4)]);

    let mut background = BackgroundTasks::new();
    let _channels = state.start_background_tasks(&mut background);

    state
        .booking
        .occupy_table("hall-1", None, None)
        .await
        .unwrap();

    // First sweep hits an unavailable store; the record must survive for
    // the retry, and the following tick must reclaim the table.
    tables.fail_next();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(
        tables.find_table("hall-1").await.unwrap().unwrap().status,
        TableStatus::Free
    );
    assert!(state.occupancy.record_for("hall-1").is_none());
    assert_eq!(background.check_health(), 0);

    background.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn nearing_cleanup_warning_precedes_the_release() {
    let mut config = EngineConfig::from_env();
    // One-minute grace window so the warn view fires before the release.
    config.max_occupation_minutes = 1;
    config.grace_minutes = 1;
    config.sweep_interval_secs = 1;

    let (state, tables, _reservations) = EngineState::in_memory(config);
    tables.seed([DiningTable::new("hall-1", RESTAURANT, "Hall 1", "Main hall", 4)]);

    let mut rx = state.events.subscribe();
    state
        .occupancy
        .occupy("hall-1", None, Some("Lopez".to_string()), 0)
        .await
        .unwrap();

    // Estimated end is "now": the warn threshold has passed, the one-minute
    // ceiling has not.
    let stats = state.occupancy.sweep_once(shared::util::now_millis()).await;
    assert_eq!(stats.warned, 1);
    assert_eq!(stats.released, 0);

    // Skip the TableOccupied event, then expect the warning.
    let mut saw_warning = false;
    while let Ok(event) = rx.try_recv() {
        if event.event_type == DomainEventType::TableNearingCleanup {
            saw_warning = true;
        }
    }
    assert!(saw_warning);
    assert!(state.occupancy.record_for("hall-1").is_some());
}
