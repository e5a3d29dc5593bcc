use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde_json::Value;

use super::schema::travel_records;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = travel_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)] // Denormalized columns exist for indexing and ad-hoc queries
pub struct TravelRecordRow {
    pub id: i64,
    pub session_id: String,
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub trip_length_days: i32,
    pub language: String,
    pub request_json: Value,
    pub itinerary_json: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = travel_records)]
pub struct NewTravelRecordRow {
    pub session_id: String,
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub trip_length_days: i32,
    pub language: String,
    pub request_json: Value,
    pub itinerary_json: Value,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = travel_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TravelRecordSummaryRow {
    pub id: i64,
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub trip_length_days: i32,
    pub created_at: DateTime<Utc>,
}
