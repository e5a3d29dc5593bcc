//! Travel request types: the raw wire shape and the normalized intent.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Budget tier requested by the traveller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetTier {
    Budget,
    Mid,
    Luxury,
}

impl BudgetTier {
    pub fn label(&self) -> &'static str {
        match self {
            BudgetTier::Budget => "budget",
            BudgetTier::Mid => "mid-range",
            BudgetTier::Luxury => "luxury",
        }
    }
}

impl FromStr for BudgetTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "budget" | "low" | "cheap" => Ok(Self::Budget),
            "mid" | "medium" | "mid-range" | "midrange" | "moderate" => Ok(Self::Mid),
            "luxury" | "high" | "premium" => Ok(Self::Luxury),
            other => Err(format!("unknown budget tier '{}'", other)),
        }
    }
}

/// Daily pacing requested by the traveller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pace {
    Relaxed,
    Normal,
    Tight,
}

impl Pace {
    pub fn label(&self) -> &'static str {
        match self {
            Pace::Relaxed => "relaxed",
            Pace::Normal => "normal",
            Pace::Tight => "tight",
        }
    }
}

impl FromStr for Pace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relaxed" | "slow" => Ok(Self::Relaxed),
            "normal" | "moderate" | "balanced" => Ok(Self::Normal),
            "tight" | "packed" | "fast" => Ok(Self::Tight),
            other => Err(format!("unknown pace '{}'", other)),
        }
    }
}

impl fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Pace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Traveller preferences. `None` means no preference was expressed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub travel_style: Option<String>,
    pub budget_tier: Option<BudgetTier>,
    pub pace: Option<Pace>,
    pub notes: Option<String>,
}

/// Normalized, validated travel request.
///
/// Only [`crate::services::normalize`] builds these from client input, so
/// `departure_date + trip_length_days` is known to be representable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelIntent {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub trip_length_days: u32,
    #[serde(default)]
    pub preferences: Preferences,
    pub language: String,
}

impl TravelIntent {
    /// Date of the day at `offset` (0-based) into the trip.
    pub fn day_date(&self, offset: u32) -> Option<NaiveDate> {
        self.departure_date.checked_add_days(Days::new(u64::from(offset)))
    }

    /// Last calendar day of the trip.
    pub fn end_date(&self) -> NaiveDate {
        self.day_date(self.trip_length_days.saturating_sub(1))
            .unwrap_or(NaiveDate::MAX)
    }
}

/// Client-supplied preferences before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPreferences {
    #[serde(default, alias = "travelStyle")]
    pub travel_style: Option<String>,
    #[serde(default, alias = "budgetTier", alias = "budget")]
    pub budget_tier: Option<String>,
    #[serde(default)]
    pub pace: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Inbound `/plan` body as sent by clients.
///
/// Everything is optional here; the normalizer decides what is missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTravelRequest {
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(
        default,
        alias = "depart_time",
        alias = "departureDate",
        alias = "departTime"
    )]
    pub departure_date: Option<String>,
    /// Kept untyped so "3" and 3 both reach the normalizer.
    #[serde(default, alias = "tripLengthDays")]
    pub trip_length_days: Option<serde_json::Value>,
    #[serde(default)]
    pub preferences: Option<RawPreferences>,
    #[serde(default)]
    pub language: Option<String>,
}
