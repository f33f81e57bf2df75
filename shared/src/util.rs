/// Current UTC timestamp in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a short unique ID for resources and events.
///
/// UUID v4 without hyphens, used by both reservations and domain events so
/// log lines stay grep-friendly.
pub fn short_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
