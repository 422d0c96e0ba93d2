use super::*;
use serde_json::json;

#[tokio::test]
async fn generate_with_explicit_ids() {
    let (app, harness) = create_test_app(|_| {}).await;
    harness.generator.fail_for(&["s2"]);

    let response = app
        .oneshot(json_request(
            "POST",
            "/reports/generate",
            json!({
                "term": "Fall 2025",
                "school_id": "school-1",
                "student_ids": ["s1", "s2", "s3"]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Generated 2 report card(s). 1 failed.");
    assert_eq!(body["summary"]["total"], 3);
    assert_eq!(body["results"][1]["status"], "failed");
    assert_eq!(body["registry_refreshed"], true);
    assert_eq!(body["artifacts"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn generate_with_grade_selection() {
    let (app, harness) = create_test_app(|_| {}).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/reports/generate",
            json!({
                "term": "Fall 2025",
                "school_id": "school-1",
                "report_kind": "progress_report",
                "selection": { "mode": { "mode": "grade_filter", "value": "6" } }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["summary"]["total"], 2);
    assert_eq!(body["message"], "Generated 2 progress report(s). ");
    assert_eq!(harness.generator.call_count(), 1);
}

#[tokio::test]
async fn empty_selection_is_bad_request() {
    let (app, harness) = create_test_app(|_| {}).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/reports/generate",
            json!({ "term": "Fall 2025", "school_id": "school-1", "student_ids": [] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "no_entities_selected");
    assert_eq!(harness.generator.call_count(), 0);
}

#[tokio::test]
async fn generator_outage_is_bad_gateway() {
    let (app, harness) = create_test_app(|_| {}).await;
    harness
        .generator
        .unavailable
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let response = app
        .oneshot(json_request(
            "POST",
            "/reports/generate",
            json!({ "term": "Fall 2025", "school_id": "school-1", "student_ids": ["s1"] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["error"]["code"], "transport_error");
}
