//! Shared test data for the pipeline and HTTP unit tests.

use chrono::NaiveDate;

use crate::models::{
    DayPlan, Itinerary, Meal, MealType, PointOfInterest, Preferences, Reservation, TravelIntent,
};

/// New York -> Munich starting 2025-10-12.
pub fn intent(days: u32) -> TravelIntent {
    TravelIntent {
        origin: "New York".into(),
        destination: "Munich".into(),
        departure_date: NaiveDate::from_ymd_opt(2025, 10, 12).unwrap(),
        trip_length_days: days,
        preferences: Preferences::default(),
        language: "en".into(),
    }
}

/// An itinerary that satisfies every check for `intent`.
pub fn itinerary_for(intent: &TravelIntent) -> Itinerary {
    let daily = (0..intent.trip_length_days)
        .map(|i| DayPlan {
            date: intent.day_date(i).unwrap(),
            summary: format!("Day {} in {}", i + 1, intent.destination),
            schedule: vec!["Morning walk".into(), "Museum visit".into()],
            points_of_interest: vec![PointOfInterest {
                name: "Old Town".into(),
                category: "landmark".into(),
                address: None,
                estimated_hours: Some(2.0),
                notes: None,
                cost_estimate: Some("free".into()),
                transport: Some("walk".into()),
            }],
            meals: vec![Meal {
                name: "Local tavern".into(),
                meal_type: MealType::Dinner,
                reservation_needed: Reservation::Unknown,
                notes: None,
            }],
            logistics: None,
            tips: Some("Carry cash".into()),
        })
        .collect();

    Itinerary {
        destination: intent.destination.clone(),
        start_date: intent.departure_date,
        end_date: intent.end_date(),
        total_days: intent.trip_length_days,
        overview: format!("{} days in {}", intent.trip_length_days, intent.destination),
        daily,
        packing_list: vec!["Walking shoes".into()],
        budget_summary: None,
        disclaimers: None,
    }
}

/// Provider text for a valid itinerary, wrapped in chatter.
pub fn response_for(intent: &TravelIntent) -> String {
    let body = serde_json::to_string_pretty(&itinerary_for(intent)).unwrap();
    format!("Here is the plan you asked for:\n{}\nEnjoy!", body)
}
