//! Prompt rendering.
//!
//! `build` is a pure function of the intent: the same intent always yields a
//! byte-identical prompt, which is what lets the synthesizer resend it
//! unchanged on retry.

use std::fmt::Write as _;

use crate::models::{MealType, TravelIntent};

const NO_PREFERENCE: &str = "no preference expressed";

/// Rendered provider prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render the provider prompt for `intent`.
pub fn build(intent: &TravelIntent) -> Prompt {
    let start = intent.departure_date.format("%Y-%m-%d").to_string();
    let end = intent.end_date().format("%Y-%m-%d").to_string();
    let days = intent.trip_length_days;
    let prefs = &intent.preferences;

    let mut out = String::with_capacity(4096);

    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        "You are a professional travel planner. Produce a detailed travel itinerary \
         written in the language with ISO code \"{}\".",
        intent.language
    );
    out.push('\n');
    out.push_str("Trip details:\n");
    let _ = writeln!(out, "- Origin: {}", intent.origin);
    let _ = writeln!(out, "- Destination: {}", intent.destination);
    let _ = writeln!(out, "- First day: {}", start);
    let _ = writeln!(out, "- Last day: {}", end);
    let _ = writeln!(out, "- Length: {} day(s)", days);
    let _ = writeln!(
        out,
        "- Travel style: {}",
        prefs.travel_style.as_deref().unwrap_or(NO_PREFERENCE)
    );
    let _ = writeln!(
        out,
        "- Budget: {}",
        prefs.budget_tier.map(|b| b.label()).unwrap_or(NO_PREFERENCE)
    );
    let _ = writeln!(
        out,
        "- Pace: {}",
        prefs.pace.map(|p| p.label()).unwrap_or(NO_PREFERENCE)
    );
    let _ = writeln!(
        out,
        "- Notes: {}",
        prefs.notes.as_deref().unwrap_or(NO_PREFERENCE)
    );
    out.push('\n');

    out.push_str("Respond with a single JSON object of exactly this shape:\n");
    out.push_str(&schema_description(intent, &start, &end));
    out.push('\n');

    out.push_str("Rules:\n");
    let _ = writeln!(
        out,
        "- \"daily\" must contain exactly {} entries, one per calendar day from {} to {} \
         inclusive, in order, with no gaps.",
        days, start, end
    );
    let _ = writeln!(
        out,
        "- \"total_days\" must be {}, \"start_date\" must be {} and \"end_date\" must be {}.",
        days, start, end
    );
    out.push_str("- Dates use the YYYY-MM-DD format.\n");
    let _ = writeln!(
        out,
        "- Meal \"type\" is one of: {}.",
        MealType::ALL.map(|t| t.as_str()).join(", ")
    );
    out.push_str("- \"time_suggested_hours\" is a non-negative number.\n");
    out.push_str("- \"reservation_needed\" is true, false, or null when unknown.\n");
    out.push_str(
        "- Output ONLY the JSON document: no markdown, no code fences, no comments, \
         no text before or after it.\n",
    );
    out.push_str("- Every string must be properly closed and escaped.\n");

    Prompt(out)
}

fn schema_description(intent: &TravelIntent, start: &str, end: &str) -> String {
    format!(
        r#"{{
  "destination": "{destination}",
  "start_date": "{start}",
  "end_date": "{end}",
  "total_days": {days},
  "overview": "string, non-empty",
  "daily": [
    {{
      "date": "YYYY-MM-DD",
      "summary": "string, non-empty",
      "schedule": ["string"],
      "pois": [
        {{
          "name": "string, non-empty",
          "category": "string, non-empty",
          "address": "string",
          "time_suggested_hours": 1.5,
          "notes": "string",
          "cost_estimate": "string",
          "transport": "string"
        }}
      ],
      "meals": [
        {{
          "name": "string, non-empty",
          "type": "breakfast | lunch | dinner | snack",
          "reservation_needed": true,
          "notes": "string"
        }}
      ],
      "logistics": "string",
      "tips": "string"
    }}
  ],
  "packing_list": ["string"],
  "budget_summary": "string",
  "disclaimers": "string"
}}
"#,
        destination = intent.destination.replace('"', "'"),
        start = start,
        end = end,
        days = intent.trip_length_days,
    )
}
