//! HTTP-level tests against the router with an in-memory world.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use burnrate_api::{AppState, build_router};
use burnrate_core::clock::WorldClock;
use burnrate_core::state::WorldState;
use burnrate_world::generate_world;
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tower::ServiceExt;

fn test_router() -> Router {
    let graph = generate_world(42).unwrap();
    let clock = WorldClock::new(4_032, 86_400).unwrap();
    let world = WorldState::new(graph, clock);
    let state = Arc::new(AppState::new(
        Arc::new(RwLock::new(world)),
        None,
        Some("test-admin".to_owned()),
    ));
    build_router(state, &[])
}

async fn send(
    router: &Router,
    method: &str,
    path: &str,
    api_key: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn health_is_public() {
    let router = test_router();
    let (status, body) = send(&router, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn join_then_me_round_trips() {
    let router = test_router();
    let (status, body) = send(
        &router,
        "POST",
        "/join",
        None,
        Some(json!({ "name": "Hauler" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "join failed: {body}");
    let key = body["api_key"].as_str().unwrap().to_owned();
    assert!(key.starts_with("brk_"));

    let (status, me) = send(&router, "GET", "/me", Some(&key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "Hauler");
    assert_eq!(me["inventory"]["credits"], 500);
    assert_eq!(me["tutorial_step"], 0);
}

#[tokio::test]
async fn join_rejects_bad_names() {
    let router = test_router();
    let (status, _) = send(&router, "POST", "/join", None, Some(json!({ "name": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let long = "y".repeat(30);
    let (status, _) = send(&router, "POST", "/join", None, Some(json!({ "name": long }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_name_conflicts() {
    let router = test_router();
    let (status, _) = send(&router, "POST", "/join", None, Some(json!({ "name": "Twin" }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&router, "POST", "/join", None, Some(json!({ "name": "Twin" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");
    assert!(body["correlation_id"].is_string());
}

#[tokio::test]
async fn protected_routes_require_a_key() {
    let router = test_router();
    for path in ["/me", "/world/zones", "/shipments", "/intel"] {
        let (status, body) = send(&router, "GET", path, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{path}");
        assert_eq!(body["code"], "unauthorized");
    }

    let (status, _) = send(&router, "GET", "/me", Some("brk_bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn travel_moves_the_player_along_a_route() {
    let router = test_router();
    let (_, joined) = send(
        &router,
        "POST",
        "/join",
        None,
        Some(json!({ "name": "Mover" })),
    )
    .await;
    let key = joined["api_key"].as_str().unwrap().to_owned();
    let start = joined["zone"].as_str().unwrap().to_owned();

    // A neighbor of the spawn hub, straight from the routes endpoint.
    let (status, routes) = send(
        &router,
        "GET",
        &format!("/routes?from={start}"),
        Some(&key),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let next = routes["routes"][0]["to_zone"].as_str().unwrap().to_owned();

    let (status, body) = send(
        &router,
        "POST",
        "/travel",
        Some(&key),
        Some(json!({ "to": next })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "travel failed: {body}");
    assert_eq!(body["zone"], Value::String(next.clone()));

    let (_, me) = send(&router, "GET", "/me", Some(&key), None).await;
    assert_eq!(me["zone"], Value::String(next));
}

#[tokio::test]
async fn admin_routes_are_gated() {
    let router = test_router();
    let (status, _) = send(&router, "GET", "/admin/dashboard", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("GET")
        .uri("/admin/dashboard")
        .header("x-admin-key", "test-admin")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_tick_advances_the_world() {
    let router = test_router();
    let (_, before) = send(&router, "GET", "/world/status", None, None).await;
    assert_eq!(before["tick"], 0);

    let request = Request::builder()
        .method("POST")
        .uri("/admin/tick")
        .header("x-admin-key", "test-admin")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (_, after) = send(&router, "GET", "/world/status", None, None).await;
    assert_eq!(after["tick"], 1);
}

#[tokio::test]
async fn season_endpoint_is_public() {
    let router = test_router();
    let (status, body) = send(&router, "GET", "/season", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["season"], 1);
    assert_eq!(body["length_ticks"], 4032);
}

#[tokio::test]
async fn batch_rejects_oversized_requests() {
    let router = test_router();
    let (_, joined) = send(
        &router,
        "POST",
        "/join",
        None,
        Some(json!({ "name": "Batcher" })),
    )
    .await;
    let key = joined["api_key"].as_str().unwrap().to_owned();

    let actions: Vec<Value> = (0..11)
        .map(|_| json!({ "type": "advance_tutorial" }))
        .collect();
    let (status, _) = send(
        &router,
        "POST",
        "/batch",
        Some(&key),
        Some(json!({ "actions": actions })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
