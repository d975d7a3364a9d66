//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each sidecar endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use request_cache::{api::create_router, AppState, CacheConfig, ManualClock, RequestCache};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> (Router, AppState, ManualClock) {
    let clock = ManualClock::new(10_000);
    let cache = RequestCache::with_clock(
        CacheConfig::new(3, Duration::from_millis(500)),
        Arc::new(clock.clone()),
    )
    .unwrap();
    let state = AppState::new(cache);
    (create_router(state.clone()), state, clock)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn put_entry(body: &str) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri("/entries")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_entry(key: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("/entries/{}", key))
        .body(Body::empty())
        .unwrap()
}

fn delete_entry(key: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(format!("/entries/{}", key))
        .body(Body::empty())
        .unwrap()
}

// == PUT /entries ==

#[tokio::test]
async fn test_put_then_get_entry() {
    let (app, _, _) = create_test_app();

    let response = app
        .clone()
        .oneshot(put_entry(r#"{"key":"g1:rust","value":[{"id":"c1","name":"Rust"}]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], "g1:rust");

    let response = app.oneshot(get_entry("g1:rust")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["value"], json!([{"id": "c1", "name": "Rust"}]));
    assert_eq!(json["ttl_remaining_ms"], 500);
}

#[tokio::test]
async fn test_put_entry_with_ttl_override() {
    let (app, _, clock) = create_test_app();

    let response = app
        .clone()
        .oneshot(put_entry(r#"{"key":"long","value":1,"ttl_ms":5000}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    clock.advance(1000);

    let response = app.oneshot(get_entry("long")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["ttl_remaining_ms"], 4000);
}

#[tokio::test]
async fn test_put_empty_key() {
    let (app, _, _) = create_test_app();

    let response = app.oneshot(put_entry(r#"{"key":"","value":1}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("Invalid key"));
}

#[tokio::test]
async fn test_put_invalid_json() {
    let (app, _, _) = create_test_app();

    let response = app.oneshot(put_entry("{not json")).await.unwrap();

    assert!(response.status().is_client_error());
}

// == GET /entries/:key ==

#[tokio::test]
async fn test_get_expired_entry() {
    let (app, _, clock) = create_test_app();

    app.clone()
        .oneshot(put_entry(r#"{"key":"short","value":"x"}"#))
        .await
        .unwrap();
    clock.advance(500);

    let response = app.oneshot(get_entry("short")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("short"));
}

#[tokio::test]
async fn test_lru_eviction_via_api() {
    let (app, _, _) = create_test_app();

    for key in ["a", "b", "c"] {
        let body = format!(r#"{{"key":"{}","value":null}}"#, key);
        app.clone().oneshot(put_entry(&body)).await.unwrap();
    }
    app.clone().oneshot(get_entry("a")).await.unwrap();
    app.clone()
        .oneshot(put_entry(r#"{"key":"d","value":null}"#))
        .await
        .unwrap();

    let evicted = app.clone().oneshot(get_entry("b")).await.unwrap();
    assert_eq!(evicted.status(), StatusCode::NOT_FOUND);
    let kept = app.oneshot(get_entry("a")).await.unwrap();
    assert_eq!(kept.status(), StatusCode::OK);
}

// == DELETE /entries/:key ==

#[tokio::test]
async fn test_delete_entry() {
    let (app, state, _) = create_test_app();
    state.cache.set("g2:q", json!("cached")).unwrap();

    let response = app.clone().oneshot(delete_entry("g2:q")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert!(json["message"].as_str().unwrap().contains("invalidated"));

    let response = app.oneshot(get_entry("g2:q")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_missing_entry() {
    let (app, _, _) = create_test_app();

    let response = app.oneshot(delete_entry("missing")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == GET /stats ==

#[tokio::test]
async fn test_stats_endpoint() {
    let (app, state, _) = create_test_app();
    state.cache.set("k", json!(1)).unwrap();
    state
        .cache
        .get_or_create("resolved", || async { Ok::<_, anyhow::Error>(json!(2)) })
        .await
        .unwrap();

    app.clone().oneshot(get_entry("k")).await.unwrap();
    app.clone().oneshot(get_entry("missing")).await.unwrap();

    let response = app
        .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 2);
    assert_eq!(json["factory_calls"], 1);
    assert_eq!(json["total_entries"], 2);
    assert_eq!(json["in_flight"], 0);
    assert_eq!(json["max_entries"], 3);
    assert_eq!(json["default_ttl_ms"], 500);
}

// == GET /health ==

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _, _) = create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
}
