//! Validated itinerary types.
//!
//! Wire names follow the JSON contract the planner front-end already speaks
//! (`pois`, `time_suggested_hours`, `type`), so a few fields are renamed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A multi-day plan that passed every consistency check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: u32,
    pub overview: String,
    pub daily: Vec<DayPlan>,
    #[serde(default)]
    pub packing_list: Vec<String>,
    #[serde(default)]
    pub budget_summary: Option<String>,
    #[serde(default)]
    pub disclaimers: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub summary: String,
    #[serde(default)]
    pub schedule: Vec<String>,
    #[serde(default, rename = "pois")]
    pub points_of_interest: Vec<PointOfInterest>,
    #[serde(default)]
    pub meals: Vec<Meal>,
    #[serde(default)]
    pub logistics: Option<String>,
    #[serde(default)]
    pub tips: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, rename = "time_suggested_hours")]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub cost_estimate: Option<String>,
    #[serde(default)]
    pub transport: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub name: String,
    #[serde(rename = "type")]
    pub meal_type: MealType,
    #[serde(default)]
    pub reservation_needed: Reservation,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown meal type '{}'", wanted))
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a meal needs booking. Serialized as `true`, `false` or `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum Reservation {
    Required,
    NotRequired,
    #[default]
    Unknown,
}

impl From<Option<bool>> for Reservation {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Reservation::Required,
            Some(false) => Reservation::NotRequired,
            None => Reservation::Unknown,
        }
    }
}

impl From<Reservation> for Option<bool> {
    fn from(value: Reservation) -> Self {
        match value {
            Reservation::Required => Some(true),
            Reservation::NotRequired => Some(false),
            Reservation::Unknown => None,
        }
    }
}
