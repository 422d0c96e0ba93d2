use super::*;
use crate::api::routes::event_name;
use crate::types::Event;

#[tokio::test]
async fn health_reports_version_and_mailer() {
    let (app, _harness) = create_test_app(|_| {}).await;

    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["mailer"], "recording");
}

#[tokio::test]
async fn openapi_json_is_served() {
    let (app, _harness) = create_test_app(|_| {}).await;

    let response = app.oneshot(get_request("/openapi.json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["paths"]["/emails/bulk"].is_object());
}

#[tokio::test]
async fn event_stream_uses_sse_content_type() {
    let (app, _harness) = create_test_app(|_| {}).await;

    let response = app.oneshot(get_request("/events")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/event-stream"
    );
}

#[test]
fn sse_event_names_match_json_tags() {
    let events = [
        Event::GenerationStarted {
            term: "Fall 2025".into(),
            count: 1,
        },
        Event::ArtifactDeleted { path: "p".into() },
        Event::BookkeepingFailed {
            student_id: "s1".into(),
            error: "x".into(),
        },
        Event::BulkEmailCompleted {
            total: 1,
            sent: 1,
            failed: 0,
            skipped: 0,
            duration_ms: 3,
        },
    ];

    for event in events {
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event_name(&event));
    }
}
