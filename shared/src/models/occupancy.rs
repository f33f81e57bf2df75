//! Occupancy Record
//!
//! Ephemeral runtime state linking a physical table to the party sitting at
//! it. Working state for the auto-release sweeper, never durable history.

use serde::{Deserialize, Serialize};

/// Runtime record for an occupied table.
///
/// All timestamps are Unix millis. `warn_at` and `release_at` are computed
/// once at seating time from a single release policy, so the "nearing
/// cleanup" view and the forced release always derive from the same clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccupancyRecord {
    pub table_id: String,
    /// Attached reservation, None for walk-ins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<String>,
    /// Staff-facing label for the party (customer name, "walk-in", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_label: Option<String>,
    pub occupied_at: i64,
    /// occupied_at + estimated service duration
    pub estimated_end: i64,
    /// When the party becomes "nearing cleanup" (equals estimated_end)
    pub warn_at: i64,
    /// Authoritative forced-release deadline
    pub release_at: i64,
    /// Set once the nearing-cleanup event has been emitted
    #[serde(default)]
    pub warned: bool,
}

impl OccupancyRecord {
    /// Minutes the table has been held as of `now`.
    pub fn occupied_minutes(&self, now: i64) -> i64 {
        (now - self.occupied_at).max(0) / 60_000
    }

    /// Minutes left before forced release as of `now` (0 when overdue).
    pub fn minutes_until_release(&self, now: i64) -> i64 {
        (self.release_at - now).max(0) / 60_000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_and_remaining_round_down_to_minutes() {
        let rec = OccupancyRecord {
            table_id: "t1".into(),
            reservation_id: None,
            client_label: None,
            occupied_at: 0,
            estimated_end: 7_200_000,
            warn_at: 7_200_000,
            release_at: 9_000_000,
            warned: false,
        };
        assert_eq!(rec.occupied_minutes(119_999), 1);
        assert_eq!(rec.minutes_until_release(8_999_000), 0);
        assert_eq!(rec.minutes_until_release(0), 150);
    }
}
