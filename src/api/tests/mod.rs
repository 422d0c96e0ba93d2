use super::*;
use crate::dispatcher::test_helpers::{TestHarness, create_test_dispatcher};
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Response;
use std::time::Duration;
use tower::ServiceExt;

mod reports;
mod system;

/// Router over a fresh test harness, with the config adjusted by `tweak`
async fn create_test_app(tweak: impl FnOnce(&mut Config)) -> (Router, TestHarness) {
    let harness = create_test_dispatcher().await;
    let mut config = (*harness.dispatcher.get_config()).clone();
    tweak(&mut config);

    let router = create_router(Arc::new(harness.dispatcher.clone()), Arc::new(config));
    (router, harness)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn api_server_spawns() {
    let harness = create_test_dispatcher().await;
    let mut config = (*harness.dispatcher.get_config()).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();

    let handle = tokio::spawn(start_api_server(
        Arc::new(harness.dispatcher.clone()),
        Arc::new(config),
    ));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(!handle.is_finished(), "server exited early");
    handle.abort();
}

#[tokio::test]
async fn cors_headers_when_enabled() {
    let (app, _harness) = create_test_app(|c| {
        c.server.api.cors_enabled = true;
        c.server.api.cors_origins = vec!["https://staff.school.test".into()];
    })
    .await;

    let request = Request::builder()
        .uri("/health")
        .header("origin", "https://staff.school.test")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "https://staff.school.test"
    );
}

#[tokio::test]
async fn no_cors_headers_when_disabled() {
    let (app, _harness) = create_test_app(|c| c.server.api.cors_enabled = false).await;

    let request = Request::builder()
        .uri("/health")
        .header("origin", "https://elsewhere.test")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn api_key_guards_every_route() {
    let (app, _harness) =
        create_test_app(|c| c.server.api.api_key = Some("office-key".into())).await;

    let response = app.clone().oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/health")
        .header("X-Api-Key", "office-key")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn swagger_ui_can_be_disabled() {
    let (app, _harness) = create_test_app(|c| c.server.api.swagger_ui = false).await;

    let response = app.oneshot(get_request("/swagger-ui/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
