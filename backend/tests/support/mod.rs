#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::NaiveDate;
use trip_planner::models::{
    DayPlan, Itinerary, Meal, MealType, PointOfInterest, Preferences, Reservation, TravelIntent,
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// ==================== Fixtures ====================

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// New York -> `destination` starting 2025-10-12.
pub fn intent_to(destination: &str, days: u32) -> TravelIntent {
    TravelIntent {
        origin: "New York".into(),
        destination: destination.into(),
        departure_date: date(2025, 10, 12),
        trip_length_days: days,
        preferences: Preferences::default(),
        language: "en".into(),
    }
}

/// An itinerary consistent with `intent`.
pub fn itinerary_for(intent: &TravelIntent) -> Itinerary {
    let daily = (0..intent.trip_length_days)
        .map(|i| DayPlan {
            date: intent.day_date(i).unwrap(),
            summary: format!("Day {} in {}", i + 1, intent.destination),
            schedule: vec!["Morning: old town".into(), "Evening: river walk".into()],
            points_of_interest: vec![PointOfInterest {
                name: "Marienplatz".into(),
                category: "landmark".into(),
                address: Some("Marienplatz 1".into()),
                estimated_hours: Some(1.5),
                notes: None,
                cost_estimate: Some("free".into()),
                transport: Some("U-Bahn".into()),
            }],
            meals: vec![Meal {
                name: "Augustiner Keller".into(),
                meal_type: MealType::Dinner,
                reservation_needed: Reservation::Required,
                notes: None,
            }],
            logistics: None,
            tips: None,
        })
        .collect();

    Itinerary {
        destination: intent.destination.clone(),
        start_date: intent.departure_date,
        end_date: intent.end_date(),
        total_days: intent.trip_length_days,
        overview: format!("A {}-day trip to {}", intent.trip_length_days, intent.destination),
        daily,
        packing_list: vec!["Umbrella".into()],
        budget_summary: Some("Moderate".into()),
        disclaimers: None,
    }
}

/// Provider text carrying a valid itinerary inside a markdown fence.
pub fn valid_reply(intent: &TravelIntent) -> String {
    format!(
        "Sure! Here is your trip:\n```json\n{}\n```",
        serde_json::to_string_pretty(&itinerary_for(intent)).unwrap()
    )
}

/// Provider text with no structured payload at all.
pub fn malformed_reply() -> String {
    "I'm sorry, I cannot help with planning that trip right now.".to_string()
}
