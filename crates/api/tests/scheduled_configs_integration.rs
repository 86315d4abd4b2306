//! Integration tests for the scheduled configuration endpoints.
//!
//! Run with: cargo test --test scheduled_configs_integration

mod common;

use axum::http::{Method, StatusCode};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use common::{create_entry, create_test_app, get_request, json_request, parse_response_body};
use fake::faker::name::en::Name;
use fake::Fake;
use serde_json::json;
use tower::ServiceExt;

fn ts(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ============================================================================
// Current value
// ============================================================================

#[tokio::test]
async fn test_get_unknown_key_returns_null_value() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(get_request("/api/v1/configs/missing"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["key"], "missing");
    assert!(body["value"].is_null());
    assert!(body["referenceTime"].is_string());
}

#[tokio::test]
async fn test_create_then_get_is_case_insensitive() {
    let (app, store) = create_test_app();
    let author: String = Name().fake();

    let created = create_entry(
        &app,
        json!({
            "key": "FOO",
            "value": "BAR",
            "validFrom": ts(Utc::now() - Duration::minutes(1)),
            "author": author,
            "comment": "initial rollout"
        }),
    )
    .await;
    assert_eq!(created["key"], "foo");
    assert_eq!(created["author"], author.as_str());
    assert!(created["id"].as_i64().unwrap() > 0);
    assert_eq!(store.len().await, 1);

    let response = app
        .oneshot(get_request("/api/v1/configs/Foo"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["key"], "foo");
    assert_eq!(body["value"], "BAR");
}

#[tokio::test]
async fn test_future_entry_is_not_yet_in_effect() {
    let (app, _) = create_test_app();
    let now = Utc::now();

    create_entry(
        &app,
        json!({"key": "limit", "value": "10", "validFrom": ts(now - Duration::hours(1))}),
    )
    .await;
    create_entry(
        &app,
        json!({"key": "limit", "value": "20", "validFrom": ts(now + Duration::days(1))}),
    )
    .await;

    let response = app
        .oneshot(get_request("/api/v1/configs/limit"))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["value"], "10");
}

// ============================================================================
// Creation
// ============================================================================

#[tokio::test]
async fn test_create_with_identifier_is_rejected() {
    let (app, store) = create_test_app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/configs",
            json!({"id": 7, "key": "k", "value": "v", "validFrom": ts(Utc::now())}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "id");
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_create_with_empty_key_is_rejected() {
    let (app, store) = create_test_app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/configs",
            json!({"key": "", "value": "v", "validFrom": ts(Utc::now())}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    let details = body["details"].as_array().unwrap();
    assert!(!details.is_empty());
    assert!(details.iter().all(|d| d["field"] == "key"));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_create_with_missing_fields_is_rejected() {
    let (app, store) = create_test_app();

    for body in [
        json!({"value": "v", "validFrom": ts(Utc::now())}),
        json!({"key": "k", "value": "v"}),
        json!({"key": "k", "validFrom": "not a timestamp"}),
    ] {
        let response = app
            .clone()
            .oneshot(json_request(Method::POST, "/api/v1/configs", body.clone()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", body);
        let body = parse_response_body(response).await;
        assert_eq!(body["error"], "validation_error");
        assert!(body["message"].is_string());
    }
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_create_accepts_past_valid_from_and_null_value() {
    let (app, _) = create_test_app();

    let created = create_entry(
        &app,
        json!({"key": "legacy", "value": null, "validFrom": "2001-01-01T00:00:00Z"}),
    )
    .await;
    assert!(created["value"].is_null());
    assert_eq!(created["validFrom"], "2001-01-01T00:00:00Z");

    let response = app
        .oneshot(get_request("/api/v1/configs/legacy"))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    assert!(body["value"].is_null());
}

// ============================================================================
// Latest per key
// ============================================================================

#[tokio::test]
async fn test_list_latest_pages_through_keys() {
    let (app, _) = create_test_app();
    let valid_from = ts(Utc::now());
    for (key, value) in [("b", "1"), ("a", "2"), ("c", "3"), ("a", "4")] {
        create_entry(
            &app,
            json!({"key": key, "value": value, "validFrom": valid_from}),
        )
        .await;
    }

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/configs?pageIndex=0&pageSize=2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    let keys: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["key"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(keys, vec!["a", "b"]);
    assert_eq!(body["data"][0]["value"], "4");
    assert_eq!(body["pagination"]["totalElements"], 3);
    assert_eq!(body["pagination"]["totalPages"], 2);

    let response = app
        .oneshot(get_request("/api/v1/configs?pageIndex=1&pageSize=2"))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["key"], "c");
}

#[tokio::test]
async fn test_list_latest_custom_sort() {
    let (app, _) = create_test_app();
    let valid_from = ts(Utc::now());
    for key in ["a", "b", "c"] {
        create_entry(&app, json!({"key": key, "value": key, "validFrom": valid_from})).await;
    }

    let response = app
        .oneshot(get_request("/api/v1/configs?sort=key:desc"))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    let keys: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["key"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(keys, vec!["c", "b", "a"]);
    assert_eq!(body["pagination"]["pageSize"], 20);
}

#[tokio::test]
async fn test_list_latest_rejects_bad_parameters() {
    let (app, _) = create_test_app();

    for uri in [
        "/api/v1/configs?pageSize=0",
        "/api/v1/configs?pageSize=51",
        "/api/v1/configs?sort=value",
    ] {
        let response = app.clone().oneshot(get_request(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let body = parse_response_body(response).await;
        assert_eq!(body["error"], "validation_error");
    }
}

// ============================================================================
// History
// ============================================================================

#[tokio::test]
async fn test_history_newest_first() {
    let (app, _) = create_test_app();
    let start = Utc::now() - Duration::seconds(1);
    for value in ["1", "2", "3"] {
        create_entry(
            &app,
            json!({"key": "Rate", "value": value, "validFrom": ts(Utc::now())}),
        )
        .await;
    }

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/configs/RATE/history"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["key"], "rate");
    let values: Vec<_> = body["history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["value"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(values, vec!["3", "2", "1"]);

    let uri = format!("/api/v1/configs/rate/history?before={}", ts(start));
    let response = app.oneshot(get_request(&uri)).await.unwrap();
    let body = parse_response_body(response).await;
    assert!(body["history"].as_array().unwrap().is_empty());
}

// ============================================================================
// Obsolescence
// ============================================================================

#[tokio::test]
async fn test_outdated_reports_superseded_entries() {
    let (app, store) = create_test_app();
    let now = Utc::now();
    for (value, valid_from) in [
        ("a", now - Duration::days(1)),
        ("b", now - Duration::hours(10)),
        ("c", now + Duration::days(1)),
    ] {
        create_entry(
            &app,
            json!({"key": "x", "value": value, "validFrom": ts(valid_from)}),
        )
        .await;
    }

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/outdated"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["entries"][0]["value"], "a");

    let uri = format!("/api/v1/outdated?at={}", ts(now + Duration::days(2)));
    let response = app.oneshot(get_request(&uri)).await.unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["count"], 2);
    assert_eq!(store.len().await, 3);
}

// ============================================================================
// Health and middleware
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let (app, _) = create_test_app();

    for uri in ["/api/health", "/api/health/live", "/api/health/ready"] {
        let response = app.clone().oneshot(get_request(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    }

    let response = app.oneshot(get_request("/api/health")).await.unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"]["connected"], true);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(get_request("/api/v1/configs/anything"))
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}
