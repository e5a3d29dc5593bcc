//! Provider output repair and validation.
//!
//! Three stages, each with its own failure reason:
//!
//! 1. **Extract** the outermost balanced `{ ... }` from the raw text.
//! 2. **Parse** it, running at most one repair pass if that fails.
//! 3. **Check** shape and field-level consistency against the intent.
//!
//! Nothing here truncates or pads `daily`: a wrong day count is a rejection.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::error::SchemaError;
use crate::models::{
    DayPlan, Itinerary, Meal, MealType, PointOfInterest, Reservation, TravelIntent,
};

/// Upper bound on top-level `{ ... }` spans tried during extraction.
const MAX_CANDIDATES: usize = 16;

/// Upper bound on opening braces probed, matched or not.
const MAX_OPENINGS: usize = 64;

/// Turn raw provider text into an [`Itinerary`] consistent with `intent`.
pub fn validate(raw: &str, intent: &TravelIntent) -> Result<Itinerary, SchemaError> {
    let value = parse_payload(raw)?;
    let payload: ItineraryPayload = serde_path_to_error::deserialize(value).map_err(|e| {
        SchemaError::InvalidShape {
            path: e.path().to_string(),
            detail: e.inner().to_string(),
        }
    })?;
    check(payload, intent)
}

// ===== Extraction and repair =====

/// Locate and parse the JSON object in `raw`.
fn parse_payload(raw: &str) -> Result<Value, SchemaError> {
    if !raw.contains('{') {
        return Err(SchemaError::NoStructuredPayload);
    }

    if let Some(value) = top_level_spans(raw).into_iter().find_map(parse_object) {
        return Ok(value);
    }

    let repaired = repair(raw).ok_or_else(|| SchemaError::Unparsable {
        detail: "no closing brace after the first opening brace".to_string(),
    })?;
    match serde_json::from_str::<Value>(&repaired) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(SchemaError::InvalidShape {
            path: ".".to_string(),
            detail: "expected a JSON object".to_string(),
        }),
        Err(e) => Err(SchemaError::Unparsable {
            detail: e.to_string(),
        }),
    }
}

fn parse_object(candidate: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Balanced `{ ... }` spans of `s` that are not nested in another span.
///
/// An opening brace with no match (`:-{` in prose) is stepped over so a
/// well-formed block after it is still found. A matched span is skipped
/// whole so an inner object is never mistaken for the payload.
fn top_level_spans(s: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut offset = 0;
    for _ in 0..MAX_OPENINGS {
        if spans.len() == MAX_CANDIDATES {
            break;
        }
        let Some(rel) = s[offset..].find('{') else {
            break;
        };
        let start = offset + rel;
        match balanced_object(&s[start..]) {
            Some(span) => {
                spans.push(span);
                offset = start + span.len();
            }
            None => offset = start + 1,
        }
    }
    spans
}

/// Prefix of `s` (which starts with `{`) up to its matching `}`.
fn balanced_object(s: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// The single corrective pass.
///
/// Fences are dropped and trailing commas removed from each balanced span,
/// so commentary after the payload's closing brace is cut even when it
/// contains braces of its own. Only when no span closes does the cut run
/// from the first `{` to the last `}`.
fn repair(raw: &str) -> Option<String> {
    let unfenced = raw
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n");

    let spans = top_level_spans(&unfenced);
    if spans.is_empty() {
        let start = unfenced.find('{')?;
        let end = unfenced.rfind('}')?;
        if end < start {
            return None;
        }
        return Some(strip_trailing_commas(&unfenced[start..=end]));
    }

    let repaired: Vec<String> = spans.iter().map(|span| strip_trailing_commas(span)).collect();
    if let Some(fixed) = repaired.iter().find(|fixed| parse_object(fixed).is_some()) {
        return Some(fixed.clone());
    }
    // Report on the largest span; it is the one most likely meant as the payload.
    repaired.into_iter().max_by_key(String::len)
}

fn strip_trailing_commas(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            out.push(c);
            continue;
        }
        if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

// ===== Lenient payload shape =====

#[derive(Debug, Deserialize)]
struct ItineraryPayload {
    #[serde(default, deserialize_with = "lenient_text")]
    destination: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    end_date: Option<String>,
    #[serde(default)]
    total_days: Option<Value>,
    #[serde(default, deserialize_with = "lenient_text")]
    overview: Option<String>,
    #[serde(default)]
    daily: Option<Vec<DayPayload>>,
    #[serde(default)]
    packing_list: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_text")]
    budget_summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    disclaimers: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DayPayload {
    #[serde(default, deserialize_with = "lenient_text")]
    date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    summary: Option<String>,
    #[serde(default)]
    schedule: Option<Vec<String>>,
    #[serde(default, alias = "points_of_interest")]
    pois: Option<Vec<PoiPayload>>,
    #[serde(default)]
    meals: Option<Vec<MealPayload>>,
    #[serde(default, deserialize_with = "lenient_text")]
    logistics: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    tips: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PoiPayload {
    #[serde(default, deserialize_with = "lenient_text")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    category: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    address: Option<String>,
    #[serde(default, alias = "estimated_hours")]
    time_suggested_hours: Option<Value>,
    #[serde(default, deserialize_with = "lenient_text")]
    notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    cost_estimate: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    transport: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MealPayload {
    #[serde(default, deserialize_with = "lenient_text")]
    name: Option<String>,
    #[serde(default, rename = "type", alias = "meal_type", deserialize_with = "lenient_text")]
    meal_type: Option<String>,
    #[serde(default)]
    reservation_needed: Option<Value>,
    #[serde(default, deserialize_with = "lenient_text")]
    notes: Option<String>,
}

/// Strings, plus numbers and booleans rendered as text. Models often emit
/// `"cost_estimate": 25` where a string was asked for.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(Value::Array(_)) => Err(D::Error::custom("expected a string, found an array")),
        Some(Value::Object(_)) => Err(D::Error::custom("expected a string, found an object")),
    }
}

// ===== Field checks =====

fn check(payload: ItineraryPayload, intent: &TravelIntent) -> Result<Itinerary, SchemaError> {
    let expected_days = intent.trip_length_days;

    let destination = required("destination", payload.destination)?;
    let overview = required("overview", payload.overview)?;

    let total_days = match payload.total_days {
        None | Some(Value::Null) => return Err(SchemaError::missing("total_days")),
        Some(v) => whole_number(&v).ok_or_else(|| {
            SchemaError::invalid("total_days", format!("{} is not a whole number", v))
        })?,
    };
    if total_days != i64::from(expected_days) {
        return Err(SchemaError::TotalDaysMismatch {
            expected: expected_days,
            actual: total_days,
        });
    }

    let days = payload.daily.ok_or_else(|| SchemaError::missing("daily"))?;
    if days.len() != expected_days as usize {
        return Err(SchemaError::DayCountMismatch {
            expected: expected_days,
            actual: days.len(),
        });
    }

    let start_date = required_date("start_date", payload.start_date)?;
    expect_date("start_date", intent.departure_date, start_date)?;

    let end_date = required_date("end_date", payload.end_date)?;
    expect_date("end_date", intent.end_date(), end_date)?;

    let daily = days
        .into_iter()
        .enumerate()
        .map(|(i, day)| check_day(i, day, intent))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Itinerary {
        destination,
        start_date,
        end_date,
        total_days: expected_days,
        overview,
        daily,
        packing_list: clean_list(payload.packing_list),
        budget_summary: optional(payload.budget_summary),
        disclaimers: optional(payload.disclaimers),
    })
}

fn check_day(
    index: usize,
    day: DayPayload,
    intent: &TravelIntent,
) -> Result<DayPlan, SchemaError> {
    let prefix = format!("daily[{}]", index);

    let date = required_date(format!("{}.date", prefix), day.date)?;
    let expected = u32::try_from(index)
        .ok()
        .and_then(|offset| intent.day_date(offset))
        .ok_or_else(|| SchemaError::invalid(format!("{}.date", prefix), "outside the trip"))?;
    expect_date(format!("{}.date", prefix), expected, date)?;

    let summary = required(format!("{}.summary", prefix), day.summary)?;

    let points_of_interest = day
        .pois
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(j, poi)| check_poi(&format!("{}.pois[{}]", prefix, j), poi))
        .collect::<Result<Vec<_>, _>>()?;

    let meals = day
        .meals
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(j, meal)| check_meal(&format!("{}.meals[{}]", prefix, j), meal))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DayPlan {
        date,
        summary,
        schedule: clean_list(day.schedule),
        points_of_interest,
        meals,
        logistics: optional(day.logistics),
        tips: optional(day.tips),
    })
}

fn check_poi(path: &str, poi: PoiPayload) -> Result<PointOfInterest, SchemaError> {
    let field = format!("{}.time_suggested_hours", path);
    let estimated_hours = match poi.time_suggested_hours {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => Some(
            n.as_f64()
                .ok_or_else(|| SchemaError::invalid(&field, "not a number"))?,
        ),
        Some(Value::String(s)) => Some(
            s.trim()
                .parse::<f64>()
                .map_err(|_| SchemaError::invalid(&field, format!("'{}' is not a number", s)))?,
        ),
        Some(other) => {
            return Err(SchemaError::invalid(
                &field,
                format!("{} is not a number", other),
            ))
        }
    };
    if let Some(hours) = estimated_hours {
        if !hours.is_finite() || hours < 0.0 {
            return Err(SchemaError::invalid(
                &field,
                format!("{} is negative or not finite", hours),
            ));
        }
    }

    Ok(PointOfInterest {
        name: required(format!("{}.name", path), poi.name)?,
        category: required(format!("{}.category", path), poi.category)?,
        address: optional(poi.address),
        estimated_hours,
        notes: optional(poi.notes),
        cost_estimate: optional(poi.cost_estimate),
        transport: optional(poi.transport),
    })
}

fn check_meal(path: &str, meal: MealPayload) -> Result<Meal, SchemaError> {
    let name = required(format!("{}.name", path), meal.name)?;
    let type_field = format!("{}.type", path);
    let meal_type = required(&type_field, meal.meal_type)?
        .parse::<MealType>()
        .map_err(|e| SchemaError::invalid(&type_field, e))?;

    Ok(Meal {
        name,
        meal_type,
        reservation_needed: reservation(meal.reservation_needed),
        notes: optional(meal.notes),
    })
}

fn reservation(value: Option<Value>) -> Reservation {
    match value {
        Some(Value::Bool(b)) => Reservation::from(Some(b)),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "required" => Reservation::Required,
            "false" | "no" | "not required" => Reservation::NotRequired,
            _ => Reservation::Unknown,
        },
        _ => Reservation::Unknown,
    }
}

fn required(field: impl Into<String>, value: Option<String>) -> Result<String, SchemaError> {
    optional(value).ok_or_else(|| SchemaError::missing(field))
}

fn required_date(
    field: impl Into<String>,
    value: Option<String>,
) -> Result<NaiveDate, SchemaError> {
    let field = field.into();
    let text = required(field.clone(), value)?;
    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .map_err(|_| SchemaError::invalid(field, format!("'{}' is not a YYYY-MM-DD date", text)))
}

fn expect_date(
    field: impl Into<String>,
    expected: NaiveDate,
    actual: NaiveDate,
) -> Result<(), SchemaError> {
    if expected == actual {
        Ok(())
    } else {
        Err(SchemaError::DateMismatch {
            field: field.into(),
            expected,
            actual,
        })
    }
}

/// Blank strings count as absent.
fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn clean_list(items: Option<Vec<String>>) -> Vec<String> {
    items
        .unwrap_or_default()
        .into_iter()
        .filter_map(|s| optional(Some(s)))
        .collect()
}

fn whole_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[path = "repair_tests.rs"]
mod tests;
