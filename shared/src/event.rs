//! Domain events - immutable facts emitted after engine operations
//!
//! Typed replacement for the cross-component notifications of the source
//! system. Integrators (notification layer, UI, message queue bridge)
//! subscribe to these; the engine does not know how they are transported.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::util::{now_millis, short_id};

/// Why a table was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseReason {
    /// Staff action
    Manual,
    /// Auto-release sweep crossed the occupancy deadline
    Auto,
}

impl std::fmt::Display for ReleaseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReleaseReason::Manual => write!(f, "manual"),
            ReleaseReason::Auto => write!(f, "auto"),
        }
    }
}

/// Event type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainEventType {
    // Reservation lifecycle
    ReservationCreated,
    ReservationCancelled,

    // Availability
    AvailabilityChecked,

    // Table lifecycle
    TableReserved,
    TableOccupied,
    TableReleased,
    TableNearingCleanup,
}

/// Event payload, one variant per event type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPayload {
    ReservationCreated {
        reservation_id: String,
        restaurant_id: String,
        date: NaiveDate,
        time: NaiveTime,
        party_size: i32,
        table_id: Option<String>,
    },
    ReservationCancelled {
        reservation_id: String,
        restaurant_id: String,
    },
    AvailabilityChecked {
        restaurant_id: String,
        date: NaiveDate,
        time: NaiveTime,
        party_size: i32,
        available_count: usize,
    },
    TableReserved {
        table_id: String,
        reservation_id: String,
    },
    TableOccupied {
        table_id: String,
        reservation_id: Option<String>,
        client_label: Option<String>,
        estimated_minutes: i64,
    },
    TableReleased {
        table_id: String,
        client_label: Option<String>,
        occupied_minutes: i64,
        reason: ReleaseReason,
    },
    TableNearingCleanup {
        table_id: String,
        client_label: Option<String>,
        minutes_until_release: i64,
    },
}

impl EventPayload {
    fn event_type(&self) -> DomainEventType {
        match self {
            EventPayload::ReservationCreated { .. } => DomainEventType::ReservationCreated,
            EventPayload::ReservationCancelled { .. } => DomainEventType::ReservationCancelled,
            EventPayload::AvailabilityChecked { .. } => DomainEventType::AvailabilityChecked,
            EventPayload::TableReserved { .. } => DomainEventType::TableReserved,
            EventPayload::TableOccupied { .. } => DomainEventType::TableOccupied,
            EventPayload::TableReleased { .. } => DomainEventType::TableReleased,
            EventPayload::TableNearingCleanup { .. } => DomainEventType::TableNearingCleanup,
        }
    }
}

/// Domain event - immutable record with server-assigned id and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Event unique ID
    pub event_id: String,
    /// Server timestamp (Unix milliseconds)
    pub timestamp: i64,
    /// Event type (redundant with the payload variant, kept for cheap
    /// filtering without matching the payload)
    pub event_type: DomainEventType,
    /// Event payload
    pub payload: EventPayload,
}

impl DomainEvent {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            event_id: short_id(),
            timestamp: now_millis(),
            event_type: payload.event_type(),
            payload,
        }
    }

    /// Terminal facts an audit/persistence consumer must not miss.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.event_type,
            DomainEventType::ReservationCreated
                | DomainEventType::ReservationCancelled
                | DomainEventType::TableReleased
        )
    }
}
