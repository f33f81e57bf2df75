//! Engine Configuration
//!
//! All knobs the engine consumes but does not own: the restaurant timezone,
//! meal classification, service durations, the occupancy ceiling and the
//! sweep cadence.
//!
//! # Environment variables
//!
//! Every field can be overridden through the environment:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | RESTAURANT_TIMEZONE | Europe/Madrid | Business timezone for all date math |
//! | MEAL_CUTOFF | 17:00 | Times before this classify as lunch |
//! | LUNCH_DURATION_MIN | 120 | Default lunch service duration (minutes) |
//! | DINNER_DURATION_MIN | 150 | Default dinner service duration (minutes) |
//! | MAX_OCCUPATION_MIN | 150 | Hard occupancy ceiling (minutes) |
//! | RELEASE_GRACE_MIN | 15 | Grace buffer after estimated end (minutes) |
//! | SWEEP_INTERVAL_SECS | 30 | Auto-release sweep cadence |
//! | REQUEST_TIMEOUT_MS | 30000 | Repository write deadline for bookings |
//! | EVENT_CAPACITY | 1024 | Broadcast bus capacity |
//! | AUDIT_BUFFER | 256 | Audit lane buffer (blocking) |
//! | NOTIFY_BUFFER | 64 | Notify lane buffer (best-effort) |
//! | PERMISSIVE_DATE_FALLBACK | false | Legacy "unknown date means tomorrow" leniency |

use chrono::NaiveTime;
use chrono_tz::Tz;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Business timezone; every fuzzy date resolves against it
    pub timezone: Tz,
    /// Times strictly before the cutoff classify as lunch
    pub meal_cutoff: NaiveTime,
    /// Default lunch service duration (minutes)
    pub lunch_duration_minutes: i64,
    /// Default dinner service duration (minutes)
    pub dinner_duration_minutes: i64,
    /// Hard occupancy ceiling (minutes)
    pub max_occupation_minutes: i64,
    /// Grace buffer past the estimated end (minutes)
    pub grace_minutes: i64,
    /// Auto-release sweep cadence (seconds)
    pub sweep_interval_secs: u64,
    /// Repository write deadline for interactive bookings (milliseconds)
    pub request_timeout_ms: u64,
    /// Broadcast bus capacity
    pub event_capacity: usize,
    /// Audit lane buffer
    pub audit_buffer: usize,
    /// Notify lane buffer
    pub notify_buffer: usize,
    /// Legacy leniency: unrecognized date expressions become "tomorrow"
    pub permissive_date_fallback: bool,
}

impl EngineConfig {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            timezone: std::env::var("RESTAURANT_TIMEZONE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(chrono_tz::Europe::Madrid),
            meal_cutoff: std::env::var("MEAL_CUTOFF")
                .ok()
                .and_then(|v| NaiveTime::parse_from_str(&v, "%H:%M").ok())
                .unwrap_or_else(|| NaiveTime::from_hms_opt(17, 0, 0).unwrap()),
            lunch_duration_minutes: env_parse("LUNCH_DURATION_MIN", 120),
            dinner_duration_minutes: env_parse("DINNER_DURATION_MIN", 150),
            max_occupation_minutes: env_parse("MAX_OCCUPATION_MIN", 150),
            grace_minutes: env_parse("RELEASE_GRACE_MIN", 15),
            sweep_interval_secs: env_parse("SWEEP_INTERVAL_SECS", 30),
            request_timeout_ms: env_parse("REQUEST_TIMEOUT_MS", 30_000),
            event_capacity: env_parse("EVENT_CAPACITY", 1024),
            audit_buffer: env_parse("AUDIT_BUFFER", 256),
            notify_buffer: env_parse("NOTIFY_BUFFER", 64),
            permissive_date_fallback: env_parse("PERMISSIVE_DATE_FALLBACK", false),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
