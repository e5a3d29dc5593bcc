//! End-to-end planning flows through the HTTP router with a scripted provider.

#![cfg(feature = "http-server")]

mod support;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use trip_planner::config::SessionConfig;
use trip_planner::db::{HistoryRepository, LocalRepository};
use trip_planner::http::{create_router, AppState};
use trip_planner::provider::{ProviderError, ScriptedProvider, ScriptedReply};
use trip_planner::services::{RetryPolicy, Synthesizer};

struct Harness {
    router: Router,
    provider: Arc<ScriptedProvider>,
    repo: Arc<LocalRepository>,
}

fn harness(provider: ScriptedProvider) -> Harness {
    let provider = Arc::new(provider);
    let repo = Arc::new(LocalRepository::new());
    let policy = RetryPolicy {
        max_retries: 2,
        attempt_timeout: Duration::from_secs(5),
        backoff: Duration::from_millis(1),
    };
    let synthesizer = Synthesizer::new(provider.clone(), policy);
    let state = AppState::new(
        repo.clone() as Arc<dyn HistoryRepository>,
        synthesizer,
        SessionConfig::default(),
    );
    Harness {
        router: create_router(state, "http://localhost:5173"),
        provider,
        repo,
    }
}

fn munich_request() -> Value {
    json!({
        "origin": "New York",
        "destination": "Munich",
        "departure_date": "2025-10-12",
        "trip_length_days": 3,
        "preferences": { "budget_tier": "mid", "pace": "relaxed" }
    })
}

fn post_plan(body: &Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/plan")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn delete(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

/// Status, `name=value` of any issued session cookie, and the JSON body.
async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, cookie, body)
}

#[tokio::test]
async fn munich_three_days_produces_contiguous_plan() {
    let intent = support::intent_to("Munich", 3);
    let h = harness(ScriptedProvider::always(support::valid_reply(&intent)));

    let (status, cookie, body) = send(&h.router, post_plan(&munich_request(), None)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(cookie.is_some(), "first request should be issued a session");
    assert_eq!(body["total_days"], 3);
    assert_eq!(body["start_date"], "2025-10-12");
    assert_eq!(body["end_date"], "2025-10-14");
    assert_eq!(body["daily"].as_array().unwrap().len(), 3);
    assert_eq!(body["daily"][0]["date"], "2025-10-12");
    assert_eq!(body["daily"][2]["date"], "2025-10-14");
    assert_eq!(h.provider.call_count(), 1);
    assert_eq!(h.repo.record_count(), 1);
}

#[tokio::test]
async fn two_malformed_replies_then_success_takes_three_calls() {
    let intent = support::intent_to("Munich", 3);
    let h = harness(ScriptedProvider::new([
        ScriptedReply::text(support::malformed_reply()),
        ScriptedReply::text("{ \"destination\": \"Munich\", \"daily\": [ "),
        ScriptedReply::text(support::valid_reply(&intent)),
    ]));

    let (status, _, body) = send(&h.router, post_plan(&munich_request(), None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["destination"], "Munich");
    assert_eq!(h.provider.call_count(), 3);
    assert_eq!(h.repo.record_count(), 1);
}

#[tokio::test]
async fn persistent_garbage_is_a_synthesis_error_and_stores_nothing() {
    let h = harness(ScriptedProvider::always(support::malformed_reply()));

    let (status, cookie, body) = send(&h.router, post_plan(&munich_request(), None)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "SYNTHESIS_ERROR");
    assert_eq!(h.provider.call_count(), 3);
    assert_eq!(h.repo.record_count(), 0);

    let cookie = cookie.unwrap();
    let (status, _, body) = send(&h.router, get("/history", &cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn non_retryable_provider_error_stops_after_one_call() {
    let h = harness(ScriptedProvider::new([ScriptedReply::Fail(
        ProviderError::api(401, "bad key"),
    )]));

    let (status, _, body) = send(&h.router, post_plan(&munich_request(), None)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["details"], "provider:api_error");
    assert_eq!(h.provider.call_count(), 1);
}

#[tokio::test]
async fn invalid_request_is_rejected_before_the_provider() {
    let h = harness(ScriptedProvider::always(support::malformed_reply()));

    let mut request = munich_request();
    request["trip_length_days"] = json!(31);
    let (status, _, body) = send(&h.router, post_plan(&request, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["field"], "trip_length_days");

    let mut request = munich_request();
    request["departure_date"] = json!("10/12/2025");
    let (status, _, body) = send(&h.router, post_plan(&request, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "departure_date");

    let raw = Request::builder()
        .method("POST")
        .uri("/plan")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, body) = send(&h.router, raw).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "body");

    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn history_is_scoped_to_the_session_cookie() {
    let intent = support::intent_to("Munich", 3);
    let h = harness(ScriptedProvider::always(support::valid_reply(&intent)));

    let (_, owner, _) = send(&h.router, post_plan(&munich_request(), None)).await;
    let owner = owner.unwrap();

    let (status, reused, body) = send(&h.router, get("/history", &owner)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(reused.is_none(), "a valid cookie must not be reissued");
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["destination"], "Munich");
    assert_eq!(list[0]["departure_date"], "2025-10-12");
    let id = list[0]["id"].as_i64().unwrap();

    let (status, _, body) = send(&h.router, get(&format!("/history/{}", id), &owner)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["request"]["destination"], "Munich");
    assert_eq!(body["itinerary"]["total_days"], 3);
    assert!(body.get("session_id").is_none());

    let stranger = "planner_session=ffffffffffffffffffffffffffffffff";
    let (status, _, body) = send(&h.router, get(&format!("/history/{}", id), stranger)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    let (status, _, _) = send(&h.router, delete(&format!("/history/{}", id), stranger)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, body) = send(&h.router, delete(&format!("/history/{}", id), &owner)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Record deleted successfully");
    assert_eq!(body["id"], id);

    let (status, _, _) = send(&h.router, get(&format!("/history/{}", id), &owner)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_cookie_is_replaced() {
    let h = harness(ScriptedProvider::default());
    let request = get("/history", "planner_session=not-a-session");
    let (status, issued, _) = send(&h.router, request).await;
    assert_eq!(status, StatusCode::OK);
    let issued = issued.unwrap();
    assert!(issued.starts_with("planner_session="));
    assert_ne!(issued, "planner_session=not-a-session");
}

#[tokio::test]
async fn health_reports_store_status() {
    let h = harness(ScriptedProvider::default());
    let (status, _, body) = send(&h.router, get("/health", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");

    h.repo.set_healthy(false);
    let (_, _, body) = send(&h.router, get("/health", "")).await;
    assert_eq!(body["database"], "disconnected");
}
