//! Date/time normalization
//!
//! Turns the loosely structured expressions produced by voice agents and
//! webhook transcripts ("tomorrow", "pasado mañana", "viernes", "2025-10-26")
//! into canonical calendar dates, always resolved against the current
//! instant in the restaurant's timezone rather than server-local time.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Weekday};
use chrono_tz::Tz;

use crate::utils::{self, EngineError, EngineResult};

/// Fuzzy date/time normalizer with a fixed business timezone.
#[derive(Debug, Clone)]
pub struct DateTimeNormalizer {
    tz: Tz,
    /// Legacy leniency: unrecognized expressions fall back to "tomorrow"
    /// instead of being rejected. Off by default.
    permissive_fallback: bool,
}

impl DateTimeNormalizer {
    pub fn new(tz: Tz, permissive_fallback: bool) -> Self {
        Self {
            tz,
            permissive_fallback,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Resolve a date expression against the current instant in the
    /// restaurant's timezone.
    pub fn normalize_date(&self, expression: &str) -> EngineResult<NaiveDate> {
        self.normalize_date_at(expression, utils::time::now_in_tz(self.tz))
    }

    /// Resolve against an explicit instant. The separation keeps midnight
    /// and timezone edge cases testable.
    pub fn normalize_date_at(&self, expression: &str, now: DateTime<Tz>) -> EngineResult<NaiveDate> {
        let today = now.date_naive();
        let token = fold(expression);

        match token.as_str() {
            "today" | "hoy" => return Ok(today),
            "tomorrow" | "manana" => return Ok(today + chrono::Duration::days(1)),
            "day after tomorrow" | "day-after-tomorrow" | "pasado manana" | "pasado-manana" => {
                return Ok(today + chrono::Duration::days(2));
            }
            _ => {}
        }

        if let Some(weekday) = parse_weekday(&token) {
            return Ok(next_occurrence(today, weekday));
        }

        if utils::time::is_iso_date_shaped(expression.trim()) {
            return utils::time::parse_iso_date(expression.trim());
        }

        if self.permissive_fallback {
            tracing::warn!(
                expression = %expression,
                "Unrecognized date expression, falling back to tomorrow"
            );
            return Ok(today + chrono::Duration::days(1));
        }

        Err(EngineError::InvalidDateExpression(expression.to_string()))
    }

    /// Validate a wall-clock time string (`H:MM` / `HH:MM`, 24h range).
    pub fn validate_time(&self, time: &str) -> EngineResult<NaiveTime> {
        utils::time::parse_time_hm(time)
    }
}

/// Lowercase, trim and strip Spanish accents so "Mañana" and "miércoles"
/// match their plain-ASCII tokens.
fn fold(expression: &str) -> String {
    expression
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

fn parse_weekday(token: &str) -> Option<Weekday> {
    let weekday = match token {
        "monday" | "lunes" => Weekday::Mon,
        "tuesday" | "martes" => Weekday::Tue,
        "wednesday" | "miercoles" => Weekday::Wed,
        "thursday" | "jueves" => Weekday::Thu,
        "friday" | "viernes" => Weekday::Fri,
        "saturday" | "sabado" => Weekday::Sat,
        "sunday" | "domingo" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}

/// Next occurrence of `weekday` strictly after `today`: naming today's
/// weekday means next week, never same-day.
fn next_occurrence(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let ahead = (weekday.num_days_from_monday() as i64
        - today.weekday().num_days_from_monday() as i64)
        .rem_euclid(7);
    let ahead = if ahead == 0 { 7 } else { ahead };
    today + chrono::Duration::days(ahead)
}
