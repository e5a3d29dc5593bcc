use super::*;
use crate::models::Preferences;
use proptest::prelude::*;
use serde_json::json;

fn intent(days: u32) -> TravelIntent {
    TravelIntent {
        origin: "New York".into(),
        destination: "Munich".into(),
        departure_date: NaiveDate::from_ymd_opt(2025, 10, 12).unwrap(),
        trip_length_days: days,
        preferences: Preferences::default(),
        language: "en".into(),
    }
}

fn payload(intent: &TravelIntent) -> Value {
    let daily: Vec<Value> = (0..intent.trip_length_days)
        .map(|i| {
            json!({
                "date": intent.day_date(i).unwrap().to_string(),
                "summary": format!("Day {} in Munich", i + 1),
                "schedule": ["09:00 Marienplatz", "  "],
                "pois": [{
                    "name": "Marienplatz",
                    "category": "landmark",
                    "address": "Marienplatz 1",
                    "time_suggested_hours": 1.5,
                    "notes": "",
                    "cost_estimate": 0,
                    "transport": "U-Bahn"
                }],
                "meals": [{
                    "name": "Augustiner Keller",
                    "type": "Dinner",
                    "reservation_needed": true,
                    "notes": null
                }],
                "logistics": "Walk between sights",
                "tips": ""
            })
        })
        .collect();

    json!({
        "destination": "Munich",
        "start_date": intent.departure_date.to_string(),
        "end_date": intent.end_date().to_string(),
        "total_days": intent.trip_length_days,
        "overview": "Beer gardens and museums",
        "daily": daily,
        "packing_list": ["Umbrella", ""],
        "budget_summary": "Around 150 EUR per day",
        "disclaimers": ""
    })
}

fn raw(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap()
}

#[test]
fn accepts_clean_payload_and_normalizes_optionals() {
    let intent = intent(3);
    let itinerary = validate(&raw(&payload(&intent)), &intent).unwrap();

    assert_eq!(itinerary.total_days, 3);
    assert_eq!(itinerary.daily.len(), 3);
    assert_eq!(itinerary.start_date.to_string(), "2025-10-12");
    assert_eq!(itinerary.end_date.to_string(), "2025-10-14");
    assert_eq!(itinerary.daily[2].date.to_string(), "2025-10-14");
    assert_eq!(itinerary.packing_list, vec!["Umbrella"]);
    assert_eq!(itinerary.disclaimers, None);

    let day = &itinerary.daily[0];
    assert_eq!(day.schedule, vec!["09:00 Marienplatz"]);
    assert_eq!(day.tips, None);
    assert_eq!(day.points_of_interest[0].estimated_hours, Some(1.5));
    assert_eq!(day.points_of_interest[0].cost_estimate.as_deref(), Some("0"));
    assert_eq!(day.points_of_interest[0].notes, None);
    assert_eq!(day.meals[0].meal_type, MealType::Dinner);
    assert_eq!(day.meals[0].reservation_needed, Reservation::Required);
}

#[test]
fn recovers_payload_wrapped_in_prose() {
    let intent = intent(2);
    let text = format!(
        "Sure! Here is your itinerary:\n{}\nLet me know if you want {{changes}}.",
        raw(&payload(&intent))
    );
    assert!(validate(&text, &intent).is_ok());
}

#[test]
fn skips_brace_pairs_that_are_not_json() {
    let intent = intent(1);
    let text = format!("Plan for {{you}}: {}", raw(&payload(&intent)));
    assert!(validate(&text, &intent).is_ok());
}

#[test]
fn braces_inside_strings_do_not_confuse_extraction() {
    let intent = intent(1);
    let mut value = payload(&intent);
    value["overview"] = json!("Expect {curly} moments and a stray \" } quote");
    let text = format!("prefix {} suffix }}", raw(&value));
    let itinerary = validate(&text, &intent).unwrap();
    assert!(itinerary.overview.contains("{curly}"));
}

#[test]
fn repair_pass_strips_fences_and_trailing_commas() {
    let intent = intent(1);
    let body = raw(&payload(&intent));
    // Inject trailing commas before the closing brackets.
    let broken = body.replacen("\"Umbrella\",\n    \"\"\n  ]", "\"Umbrella\",\n  ]", 1);
    let broken = format!("{},\n}}", broken.trim_end().trim_end_matches('}'));
    let text = format!("```json\n{}\n```\nHope this helps!", broken);
    assert!(serde_json::from_str::<Value>(&broken).is_err());
    assert!(validate(&text, &intent).is_ok());
}

#[test]
fn unmatched_brace_in_leading_prose_is_stepped_over() {
    let intent = intent(2);
    let text = format!("Sure :-{{ here is your plan:\n{}", raw(&payload(&intent)));
    let itinerary = validate(&text, &intent).unwrap();
    assert_eq!(itinerary.daily.len(), 2);

    let text = format!(
        "Fill in {{placeholders as needed.\n{}\nEnjoy!",
        raw(&payload(&intent))
    );
    assert!(validate(&text, &intent).is_ok());
}

#[test]
fn repair_pass_stops_at_the_balanced_close() {
    let intent = intent(2);
    let body = raw(&payload(&intent));
    let broken = format!("{},\n}}", body.trim_end().trim_end_matches('}'));
    let text = format!(
        "{}\nLet me know if you want changes (e.g. {{more museums}}).",
        broken
    );
    assert!(serde_json::from_str::<Value>(&broken).is_err());
    let itinerary = validate(&text, &intent).unwrap();
    assert_eq!(itinerary.total_days, 2);
}

#[test]
fn no_brace_is_no_structured_payload() {
    let err = validate("I cannot help with that.", &intent(1)).unwrap_err();
    assert_eq!(err.reason(), "no_structured_payload");
}

#[test]
fn unrepairable_payload_is_unparsable() {
    let err = validate("{\"destination\": \"Munich\", \"daily\": [", &intent(1)).unwrap_err();
    assert_eq!(err.reason(), "unparsable");

    let err = validate("{ this is not json }", &intent(1)).unwrap_err();
    assert_eq!(err.reason(), "unparsable");
}

#[test]
fn wrong_shape_reports_path() {
    let intent = intent(1);
    let mut value = payload(&intent);
    value["daily"][0]["pois"][0]["name"] = json!({"en": "Marienplatz"});
    match validate(&raw(&value), &intent).unwrap_err() {
        SchemaError::InvalidShape { path, .. } => assert_eq!(path, "daily[0].pois[0].name"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn rejects_day_count_mismatch_even_when_well_formed() {
    let intent = intent(3);
    let mut value = payload(&intent);
    value["daily"].as_array_mut().unwrap().pop();
    let err = validate(&raw(&value), &intent).unwrap_err();
    assert_eq!(
        err,
        SchemaError::DayCountMismatch {
            expected: 3,
            actual: 2
        }
    );

    let mut value = payload(&intent);
    let extra = value["daily"][2].clone();
    value["daily"].as_array_mut().unwrap().push(extra);
    assert_eq!(validate(&raw(&value), &intent).unwrap_err().reason(), "day_count_mismatch");
}

#[test]
fn rejects_total_days_mismatch() {
    let intent = intent(3);
    let mut value = payload(&intent);
    value["total_days"] = json!(4);
    assert_eq!(
        validate(&raw(&value), &intent).unwrap_err(),
        SchemaError::TotalDaysMismatch {
            expected: 3,
            actual: 4
        }
    );
}

#[test]
fn rejects_gaps_and_wrong_start_or_end() {
    let intent = intent(3);

    let mut value = payload(&intent);
    value["daily"][1]["date"] = json!("2025-10-15");
    match validate(&raw(&value), &intent).unwrap_err() {
        SchemaError::DateMismatch { field, .. } => assert_eq!(field, "daily[1].date"),
        other => panic!("unexpected error: {other:?}"),
    }

    let mut value = payload(&intent);
    value["start_date"] = json!("2025-10-13");
    assert_eq!(validate(&raw(&value), &intent).unwrap_err().reason(), "date_mismatch");

    let mut value = payload(&intent);
    value["end_date"] = json!("2025-10-15");
    assert_eq!(validate(&raw(&value), &intent).unwrap_err().reason(), "date_mismatch");

    let mut value = payload(&intent);
    value["daily"][0]["date"] = json!("12/10/2025");
    assert_eq!(validate(&raw(&value), &intent).unwrap_err().reason(), "invalid_value");
}

#[test]
fn rejects_missing_required_fields() {
    let intent = intent(1);
    for (pointer, field) in [
        ("/overview", "overview"),
        ("/daily/0/summary", "daily[0].summary"),
        ("/daily/0/pois/0/category", "daily[0].pois[0].category"),
        ("/daily/0/meals/0/name", "daily[0].meals[0].name"),
    ] {
        let mut value = payload(&intent);
        *value.pointer_mut(pointer).unwrap() = json!("   ");
        assert_eq!(
            validate(&raw(&value), &intent).unwrap_err(),
            SchemaError::MissingField {
                field: field.to_string()
            }
        );
    }

    let mut value = payload(&intent);
    value.as_object_mut().unwrap().remove("daily");
    assert_eq!(validate(&raw(&value), &intent).unwrap_err().reason(), "missing_field");
}

#[test]
fn rejects_bad_meal_type_and_negative_hours() {
    let intent = intent(1);

    let mut value = payload(&intent);
    value["daily"][0]["meals"][0]["type"] = json!("brunch");
    assert_eq!(validate(&raw(&value), &intent).unwrap_err().reason(), "invalid_value");

    let mut value = payload(&intent);
    value["daily"][0]["pois"][0]["time_suggested_hours"] = json!(-2);
    match validate(&raw(&value), &intent).unwrap_err() {
        SchemaError::InvalidValue { field, .. } => {
            assert_eq!(field, "daily[0].pois[0].time_suggested_hours")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn lenient_scalars_are_accepted() {
    let intent = intent(1);
    let mut value = payload(&intent);
    value["total_days"] = json!("1");
    value["daily"][0]["pois"][0]["time_suggested_hours"] = json!("2");
    value["daily"][0]["meals"][0]["reservation_needed"] = json!("no");
    let itinerary = validate(&raw(&value), &intent).unwrap();
    assert_eq!(itinerary.daily[0].points_of_interest[0].estimated_hours, Some(2.0));
    assert_eq!(
        itinerary.daily[0].meals[0].reservation_needed,
        Reservation::NotRequired
    );
}

proptest! {
    #[test]
    fn valid_payloads_yield_contiguous_days(days in 1u32..=30) {
        let intent = intent(days);
        let itinerary = validate(&raw(&payload(&intent)), &intent).unwrap();
        prop_assert_eq!(itinerary.daily.len(), days as usize);
        prop_assert_eq!(itinerary.daily[0].date, intent.departure_date);
        for pair in itinerary.daily.windows(2) {
            prop_assert_eq!(pair[0].date.succ_opt(), Some(pair[1].date));
        }
    }

    #[test]
    fn any_shifted_day_is_rejected(days in 2u32..=30, index in 0usize..30) {
        let intent = intent(days);
        let index = index % days as usize;
        let mut value = payload(&intent);
        let shifted = intent.day_date(index as u32 + 1).unwrap().succ_opt().unwrap();
        value["daily"][index]["date"] = json!(shifted.to_string());
        prop_assert_eq!(validate(&raw(&value), &intent).unwrap_err().reason(), "date_mismatch");
    }
}
