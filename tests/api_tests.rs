use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use steproute::config::SelectionConfig;
use tower::ServiceExt;

mod common;

use common::FakeOracle;

fn setup_test_app(oracle: FakeOracle) -> axum::Router {
    let state = common::test_state(Arc::new(oracle), SelectionConfig::default());
    steproute::routes::create_router(state)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn plan_body(trip_type: &str) -> Value {
    json!({
        "origin": {"lat": 48.8566, "lng": 2.3522},
        "step_goal": 10000,
        "height_m": 1.70,
        "weight_kg": 70.0,
        "trip_type": trip_type
    })
}

#[tokio::test]
async fn test_health_check_endpoint() {
    let app = setup_test_app(FakeOracle::new(1.0));

    let request = Request::builder()
        .uri("/debug/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = read_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["checks"]["routing_backend"], "fake");
}

#[tokio::test]
async fn test_plan_endpoint_returns_route_and_session() {
    let app = setup_test_app(FakeOracle::new(1.0));

    let response = app
        .oneshot(post_json("/plans", plan_body("one_way")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = read_json(response).await;
    assert!(json["session_id"].is_string());
    let total = json["route"]["total_distance_m"].as_f64().unwrap();
    assert!((6_702.25..=7_407.75).contains(&total));
    assert_eq!(json["route"]["match_kind"], "direct");
    assert_eq!(json["route"]["trip_type"], "one_way");
    assert_eq!(json["selection"]["valid_attempt_count"], 0);
    assert_eq!(json["selection"]["locked"], false);
    assert!(json["route"]["trace"]["phases"].is_array());
}

#[tokio::test]
async fn test_plan_endpoint_validation() {
    let app = setup_test_app(FakeOracle::new(1.0));

    let mut body = plan_body("one_way");
    body["height_m"] = json!(0.0);

    let response = app.oneshot(post_json("/plans", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = read_json(response).await;
    assert!(json["message"].as_str().unwrap().contains("height_m"));
}

#[tokio::test]
async fn test_plan_endpoint_match_failure() {
    let app = setup_test_app(FakeOracle::unroutable());

    let response = app
        .oneshot(post_json("/plans", plan_body("round_trip")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = read_json(response).await;
    assert!(json["details"]["window"]["target_m"].as_f64().is_some());
    assert!(json["details"]["closest_distance_m"].is_null());
}

#[tokio::test]
async fn test_selection_flow() {
    let app = setup_test_app(FakeOracle::new(1.0));

    let response = app
        .clone()
        .oneshot(post_json("/plans", plan_body("one_way")))
        .await
        .unwrap();
    let plan = read_json(response).await;
    let session_id = plan["session_id"].as_str().unwrap().to_string();

    // Too close: rejected, still a 200 answer
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/plans/{}/destination", session_id),
            json!({"destination": {"lat": 48.8600, "lng": 2.3522}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["accepted"], false);
    assert_eq!(json["rejection"]["reason"], "too_close");

    // ~7.05 km due north: accepted
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/plans/{}/destination", session_id),
            json!({"destination": {"lat": 48.9200, "lng": 2.3522}}),
        ))
        .await
        .unwrap();
    let json = read_json(response).await;
    assert_eq!(json["accepted"], true);
    assert_eq!(json["route"]["match_kind"], "manual");
    assert_eq!(json["selection"]["valid_attempt_count"], 1);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/plans/{}", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["active_route"]["match_kind"], "manual");
    assert_eq!(json["default_route"]["match_kind"], "direct");

    let response = app
        .oneshot(post_json(&format!("/plans/{}/reset", session_id), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["route"]["match_kind"], "direct");
    assert_eq!(json["selection"]["valid_attempt_count"], 0);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let app = setup_test_app(FakeOracle::new(1.0));

    let request = Request::builder()
        .uri("/plans/00000000-0000-0000-0000-000000000000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
