//! Release Policy
//!
//! One authoritative occupancy deadline per table, computed once at seating
//! time. The "nearing cleanup" warning and the forced release are two views
//! of the same clock, never two independently drifting trackers.

use shared::models::OccupancyRecord;

const MINUTE_MS: i64 = 60_000;

/// Occupancy-ceiling policy.
///
/// `release_at = occupied_at + min(max_occupation, estimated + grace)`:
/// the hard ceiling caps every stay, and shorter estimated services are
/// reclaimed as soon as their grace buffer runs out.
#[derive(Debug, Clone, Copy)]
pub struct ReleasePolicy {
    pub max_occupation_minutes: i64,
    pub grace_minutes: i64,
}

impl ReleasePolicy {
    pub fn new(max_occupation_minutes: i64, grace_minutes: i64) -> Self {
        Self {
            max_occupation_minutes,
            grace_minutes,
        }
    }

    /// Build the runtime record for a party seated at `occupied_at` with an
    /// estimated service of `estimated_minutes`.
    pub fn build_record(
        &self,
        table_id: impl Into<String>,
        reservation_id: Option<String>,
        client_label: Option<String>,
        occupied_at: i64,
        estimated_minutes: i64,
    ) -> OccupancyRecord {
        let estimated_end = occupied_at + estimated_minutes * MINUTE_MS;
        let window_minutes =
            (estimated_minutes + self.grace_minutes).min(self.max_occupation_minutes);
        OccupancyRecord {
            table_id: table_id.into(),
            reservation_id,
            client_label,
            occupied_at,
            estimated_end,
            warn_at: estimated_end,
            release_at: occupied_at + window_minutes * MINUTE_MS,
            warned: false,
        }
    }
}

impl Default for ReleasePolicy {
    fn default() -> Self {
        // 2.5 h hard ceiling, 15 min grace
        Self::new(150, 15)
    }
}
