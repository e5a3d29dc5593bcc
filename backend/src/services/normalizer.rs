//! Request normalization.
//!
//! Turns a loosely-typed [`RawTravelRequest`] into a [`TravelIntent`] or a
//! [`ValidationError`] naming the first offending field. Pure: no I/O, no
//! clock.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};
use serde_json::Value;

use super::error::ValidationError;
use crate::models::{BudgetTier, Pace, Preferences, RawPreferences, RawTravelRequest, TravelIntent};

pub const MIN_TRIP_DAYS: i64 = 1;
pub const MAX_TRIP_DAYS: i64 = 30;
pub const DEFAULT_LANGUAGE: &str = "en";

const MAX_PLACE_LEN: usize = 120;
const MAX_NOTES_LEN: usize = 1000;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
];

/// Validate and canonicalize a raw travel request.
pub fn normalize(raw: &RawTravelRequest) -> Result<TravelIntent, ValidationError> {
    let origin = required_place("origin", raw.origin.as_deref())?;
    let destination = required_place("destination", raw.destination.as_deref())?;

    let departure_date = match raw.departure_date.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => parse_departure_date(s)?,
        _ => return Err(ValidationError::new("departure_date", "is required")),
    };

    let trip_length_days = trip_length(raw.trip_length_days.as_ref())?;

    if departure_date
        .checked_add_days(Days::new(trip_length_days as u64))
        .is_none()
    {
        return Err(ValidationError::new(
            "departure_date",
            "trip extends past the supported calendar range",
        ));
    }

    let preferences = match raw.preferences.as_ref() {
        Some(p) => preferences(p)?,
        None => Preferences::default(),
    };

    let language = language(raw.language.as_deref())?;

    Ok(TravelIntent {
        origin,
        destination,
        departure_date,
        trip_length_days: trip_length_days as u32,
        preferences,
        language,
    })
}

fn required_place(field: &str, value: Option<&str>) -> Result<String, ValidationError> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    if value.chars().count() > MAX_PLACE_LEN {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", MAX_PLACE_LEN),
        ));
    }
    Ok(value.to_string())
}

/// Parse a departure date from a timestamp or a loosely formatted date.
///
/// Timestamps keep the calendar date as written; offsets are not converted.
/// Numeric forms that lead with day or month (`10/12/2025`) are rejected
/// because they read differently across locales.
pub fn parse_departure_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }

    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        let (y, rest) = s.split_at(4);
        let (m, d) = rest.split_at(2);
        if let (Ok(y), Ok(m), Ok(d)) = (y.parse(), m.parse(), d.parse()) {
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                return Ok(date);
            }
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    if looks_day_or_month_first(s) {
        return Err(ValidationError::new(
            "departure_date",
            format!("'{}' is ambiguous; use YYYY-MM-DD", s),
        ));
    }

    Err(ValidationError::new(
        "departure_date",
        format!("'{}' is not a recognizable date", s),
    ))
}

/// `NN/NN/NNNN` style with the year last.
fn looks_day_or_month_first(s: &str) -> bool {
    let parts: Vec<&str> = s.split(['/', '-', '.']).collect();
    parts.len() == 3
        && parts.iter().all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
        && parts[0].len() <= 2
        && parts[1].len() <= 2
}

fn trip_length(value: Option<&Value>) -> Result<i64, ValidationError> {
    const FIELD: &str = "trip_length_days";
    let days = match value {
        None | Some(Value::Null) => return Err(ValidationError::new(FIELD, "is required")),
        Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i,
            (None, Some(f)) if f.fract() == 0.0 && f.abs() <= i64::MAX as f64 => f as i64,
            _ => return Err(ValidationError::new(FIELD, "must be a whole number")),
        },
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::new(FIELD, "must be a whole number"))?,
        Some(_) => return Err(ValidationError::new(FIELD, "must be a whole number")),
    };

    if !(MIN_TRIP_DAYS..=MAX_TRIP_DAYS).contains(&days) {
        return Err(ValidationError::new(
            FIELD,
            format!(
                "must be between {} and {} (got {})",
                MIN_TRIP_DAYS, MAX_TRIP_DAYS, days
            ),
        ));
    }
    Ok(days)
}

fn preferences(raw: &RawPreferences) -> Result<Preferences, ValidationError> {
    let budget_tier = non_blank(raw.budget_tier.as_deref())
        .map(|s| s.parse::<BudgetTier>())
        .transpose()
        .map_err(|e| ValidationError::new("preferences.budget_tier", e))?;

    let pace = non_blank(raw.pace.as_deref())
        .map(|s| s.parse::<Pace>())
        .transpose()
        .map_err(|e| ValidationError::new("preferences.pace", e))?;

    let notes = non_blank(raw.notes.as_deref()).map(str::to_string);
    if notes
        .as_ref()
        .is_some_and(|n| n.chars().count() > MAX_NOTES_LEN)
    {
        return Err(ValidationError::new(
            "preferences.notes",
            format!("must be at most {} characters", MAX_NOTES_LEN),
        ));
    }

    Ok(Preferences {
        travel_style: non_blank(raw.travel_style.as_deref()).map(str::to_string),
        budget_tier,
        pace,
        notes,
    })
}

/// Accepts `en`, `zh-CN`, `pt_BR`; canonical form is `xx` or `xx-YY`.
fn language(raw: Option<&str>) -> Result<String, ValidationError> {
    let Some(tag) = non_blank(raw) else {
        return Ok(DEFAULT_LANGUAGE.to_string());
    };

    let mut parts = tag.splitn(2, ['-', '_']);
    let primary = parts.next().unwrap_or_default();
    let region = parts.next();

    let primary_ok =
        (2..=3).contains(&primary.len()) && primary.bytes().all(|b| b.is_ascii_alphabetic());
    let region_ok = region.map_or(true, |r| {
        (2..=8).contains(&r.len()) && r.bytes().all(|b| b.is_ascii_alphanumeric())
    });
    if !primary_ok || !region_ok {
        return Err(ValidationError::new(
            "language",
            format!("'{}' is not an ISO language code", tag),
        ));
    }

    Ok(match region {
        Some(r) if r.len() == 2 => {
            format!("{}-{}", primary.to_ascii_lowercase(), r.to_ascii_uppercase())
        }
        Some(r) => format!("{}-{}", primary.to_ascii_lowercase(), r),
        None => primary.to_ascii_lowercase(),
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "normalizer_tests.rs"]
mod tests;
