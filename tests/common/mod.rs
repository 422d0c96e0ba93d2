//! Common utilities for report-dispatch integration tests
//!
//! The school backend is a wiremock server speaking the same JSON contract as
//! the production one; mail goes to an in-memory recorder.

#![allow(dead_code)]

use async_trait::async_trait;
use report_dispatch::{
    Config, Database, DeliveryReport, Mailer, OutgoingEmail, ReportDispatcher, Result, Services,
    backend::RestBackend,
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SCHOOL: &str = "school-1";
pub const TERM: &str = "Fall 2025";

/// Mailer that keeps every accepted email in memory
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<DeliveryReport> {
        self.sent.lock().unwrap().push(email);
        Ok(DeliveryReport::sent())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Dispatcher wired to a mock backend, a real SQLite history and `mailer`
pub async fn create_dispatcher(
    server: &MockServer,
    mailer: Arc<dyn Mailer>,
) -> (ReportDispatcher, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();

    let mut config = Config::default();
    config.backend.base_url = format!("{}/api", server.uri());
    config.persistence.database_path = temp_dir.path().join("history.db");

    let backend = Arc::new(RestBackend::new(&config.backend).unwrap());
    let db = Database::new(&config.persistence.database_path)
        .await
        .unwrap();

    let services = Services {
        generator: backend.clone(),
        registry: backend.clone(),
        directory: backend,
        mailer,
        history: Arc::new(db),
    };

    (ReportDispatcher::with_services(config, services), temp_dir)
}

pub fn artifact(student: &str) -> Value {
    json!({
        "student_id": student,
        "term": TERM,
        "report_kind": "report_card",
        "storage_path": format!("reports/fall-2025/{student}.pdf"),
        "school_id": SCHOOL,
        "generated_at": "2025-12-01T10:00:00Z",
        "email_sent": false
    })
}

/// Mount the directory: s1 and s2 have guardians, s3 has none
pub async fn mount_directory(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/students"))
        .and(query_param("school_id", SCHOOL))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "s1", "name": "Ada Lovelace", "grade": "5" },
            { "id": "s2", "name": "Ben Franklin", "grade": "5" },
            { "id": "s3", "name": "Cara Williams", "grade": "6" }
        ])))
        .mount(server)
        .await;

    for (id, name, guardians) in [
        ("s1", "Ada Lovelace", json!([{ "email": "ada.parent@example.com" }])),
        (
            "s2",
            "Ben Franklin",
            json!([{ "email": "ben.mom@example.com" }, { "email": "  " }]),
        ),
        ("s3", "Cara Williams", json!([{ "email": null }])),
    ] {
        Mock::given(method("GET"))
            .and(path(format!("/api/students/{id}")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": id, "name": name })),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/api/students/{id}/guardians")))
            .respond_with(ResponseTemplate::new(200).set_body_json(guardians))
            .mount(server)
            .await;
    }
}

/// Mount signed-URL resolution and the sent-flag endpoint
pub async fn mount_registry_writes(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/artifacts/signed-url"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "url": "https://files.school.test/signed?token=abc" })),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/artifacts/email-sent"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}

/// Requests the backend received for a method and path
pub async fn requests_to(server: &MockServer, verb: &str, route: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == verb && r.url.path() == route)
        .map(|r| serde_json::from_slice(&r.body).unwrap_or(Value::Null))
        .collect()
}
