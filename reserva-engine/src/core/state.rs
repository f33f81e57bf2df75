//! Engine State - service wiring
//!
//! Builds the service graph from injected configuration and repositories.
//! There is no process-wide mutable state: every service is an explicit
//! object owned (via `Arc`) by this struct.

use std::sync::Arc;
use std::time::Duration;

use shared::models::TimeSlot;

use crate::booking::BookingService;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::EngineConfig;
use crate::db::repository::{
    MemoryReservationRepository, MemoryTableRepository, ReservationRepository, TableRepository,
};
use crate::events::{EventBus, EventChannels, EventRouter};
use crate::occupancy::{AutoReleaseSweeper, OccupancyService, ReleasePolicy};
use crate::schedule::{AvailabilityChecker, DateTimeNormalizer, TurnCatalog};

/// Shared handle to every engine service.
///
/// Cloning is shallow: all services live behind `Arc`.
#[derive(Clone)]
pub struct EngineState {
    pub config: EngineConfig,
    pub events: EventBus,
    pub catalog: Arc<TurnCatalog>,
    pub checker: Arc<AvailabilityChecker>,
    pub occupancy: Arc<OccupancyService>,
    pub booking: Arc<BookingService>,
    pub tables: Arc<dyn TableRepository>,
    pub reservations: Arc<dyn ReservationRepository>,
}

impl EngineState {
    /// Wire the engine against injected repositories.
    pub fn initialize(
        config: EngineConfig,
        tables: Arc<dyn TableRepository>,
        reservations: Arc<dyn ReservationRepository>,
    ) -> Self {
        let events = EventBus::new(config.event_capacity);

        let catalog = Arc::new(TurnCatalog::new(
            config.meal_cutoff,
            config.lunch_duration_minutes,
            config.dinner_duration_minutes,
        ));

        let checker = Arc::new(AvailabilityChecker::new(
            tables.clone(),
            reservations.clone(),
            catalog.clone(),
            events.clone(),
        ));

        let occupancy = Arc::new(OccupancyService::new(
            tables.clone(),
            reservations.clone(),
            ReleasePolicy::new(config.max_occupation_minutes, config.grace_minutes),
            events.clone(),
            config.timezone,
        ));

        let normalizer =
            DateTimeNormalizer::new(config.timezone, config.permissive_date_fallback);

        let booking = Arc::new(BookingService::new(
            normalizer,
            catalog.clone(),
            checker.clone(),
            occupancy.clone(),
            reservations.clone(),
            events.clone(),
            Duration::from_millis(config.request_timeout_ms),
        ));

        Self {
            config,
            events,
            catalog,
            checker,
            occupancy,
            booking,
            tables,
            reservations,
        }
    }

    /// Wire the engine against fresh in-memory repositories. Returns the
    /// concrete repositories so callers can seed the floor plan.
    pub fn in_memory(
        config: EngineConfig,
    ) -> (
        Self,
        Arc<MemoryTableRepository>,
        Arc<MemoryReservationRepository>,
    ) {
        let tables = Arc::new(MemoryTableRepository::new());
        let reservations = Arc::new(MemoryReservationRepository::new());
        let state = Self::initialize(config, tables.clone(), reservations.clone());
        (state, tables, reservations)
    }

    /// Install a restaurant's turn catalog.
    pub fn set_turns(&self, restaurant_id: impl Into<String>, slots: Vec<TimeSlot>) {
        self.catalog.set_slots(restaurant_id, slots);
    }

    /// Register and start the engine's background tasks: the event router
    /// and the auto-release sweeper. Returns the router's consumer lanes.
    pub fn start_background_tasks(&self, tasks: &mut BackgroundTasks) -> EventChannels {
        let (router, channels) =
            EventRouter::new(self.config.audit_buffer, self.config.notify_buffer);
        let source = self.events.subscribe();
        tasks.spawn("event_router", TaskKind::Listener, async move {
            router.run(source).await;
        });

        let sweeper = AutoReleaseSweeper::new(
            self.occupancy.clone(),
            Duration::from_secs(self.config.sweep_interval_secs),
            tasks.shutdown_token(),
        );
        tasks.spawn("auto_release_sweeper", TaskKind::Periodic, async move {
            sweeper.run().await;
        });

        tracing::info!(tasks = tasks.len(), "Engine background tasks started");
        channels
    }
}
