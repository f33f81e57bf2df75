//! Reservation Model

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Reservation lifecycle status.
///
/// `Cancelled` and `Completed` are terminal; only `Pending` and `Confirmed`
/// reservations participate in availability math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    /// Statuses that still hold a claim on a table.
    pub const ACTIVE: [ReservationStatus; 2] =
        [ReservationStatus::Pending, ReservationStatus::Confirmed];

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReservationStatus::Cancelled | ReservationStatus::Completed)
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReservationStatus::Pending => write!(f, "pending"),
            ReservationStatus::Confirmed => write!(f, "confirmed"),
            ReservationStatus::Cancelled => write!(f, "cancelled"),
            ReservationStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Reservation entity - a booking attached to zero or one table.
///
/// Invariant: a `confirmed` reservation with a table assigned never overlaps
/// in time with another `confirmed` reservation on the same table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub restaurant_id: String,
    /// Calendar date of the booking
    pub date: NaiveDate,
    /// Wall-clock arrival time, 24h
    pub time: NaiveTime,
    pub party_size: i32,
    /// Assigned table, None until confirmed against a concrete table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    pub status: ReservationStatus,
    /// Zone preference ("Terrace", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Creation timestamp (Unix millis)
    pub created_at: i64,
}

impl Reservation {
    /// Display label for staff-facing surfaces: customer name when known,
    /// otherwise the reservation id.
    pub fn client_label(&self) -> String {
        self.customer_name
            .clone()
            .unwrap_or_else(|| format!("reservation {}", self.id))
    }
}
