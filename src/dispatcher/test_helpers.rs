//! Shared test helpers: in-memory collaborators and a dispatcher wired to them.

use crate::backend::{ArtifactRegistry, DocumentGenerator, EntityDirectory};
use crate::config::Config;
use crate::db::Database;
use crate::dispatcher::{ReportDispatcher, Services};
use crate::error::{Error, Result};
use crate::mailer::{DeliveryReport, Mailer, OutgoingEmail};
use crate::types::{ArtifactRecord, EntityRef, GenerationBatch, ReportKind, StudentId};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

pub(crate) const SCHOOL: &str = "school-1";
pub(crate) const TERM: &str = "Fall 2025";

/// Registry holding artifacts in memory
#[derive(Default)]
pub(crate) struct FakeRegistry {
    pub(crate) artifacts: Mutex<Vec<ArtifactRecord>>,
    pub(crate) list_fails: AtomicBool,
    pub(crate) mark_fails: AtomicBool,
    pub(crate) url_requests: AtomicUsize,
}

impl FakeRegistry {
    pub(crate) fn add(&self, student: &str, term: &str, kind: ReportKind) -> String {
        let path = format!("reports/{}/{}/{}.pdf", term.replace(' ', "-"), kind, student);
        self.artifacts.lock().unwrap().push(ArtifactRecord {
            student_id: student.into(),
            term: term.to_string(),
            report_kind: kind,
            storage_path: path.clone(),
            school_id: Some(SCHOOL.to_string()),
            generated_at: generated_at(),
            email_sent: false,
            email_sent_at: None,
            email_sent_by: None,
        });
        path
    }

    pub(crate) fn get(&self, student: &str) -> Option<ArtifactRecord> {
        self.artifacts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.student_id.as_str() == student)
            .cloned()
    }
}

fn generated_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 12, 1, 10, 0, 0).unwrap()
}

#[async_trait]
impl ArtifactRegistry for FakeRegistry {
    async fn list(&self, term: &str, school_id: &str) -> Result<Vec<ArtifactRecord>> {
        if self.list_fails.load(Ordering::SeqCst) {
            return Err(Error::Transport("registry unavailable".into()));
        }
        Ok(self
            .artifacts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.term == term && a.school_id.as_deref() == Some(school_id))
            .cloned()
            .collect())
    }

    async fn resolve_access_url(&self, storage_path: &str) -> Result<String> {
        let n = self.url_requests.fetch_add(1, Ordering::SeqCst);
        let known = self
            .artifacts
            .lock()
            .unwrap()
            .iter()
            .any(|a| a.storage_path == storage_path);
        if !known {
            return Err(Error::NotFound(format!("artifact '{storage_path}'")));
        }
        Ok(format!("https://files.test/{storage_path}?sig={n}"))
    }

    async fn delete(&self, storage_path: &str) -> Result<()> {
        let mut artifacts = self.artifacts.lock().unwrap();
        let before = artifacts.len();
        artifacts.retain(|a| a.storage_path != storage_path);
        if artifacts.len() == before {
            return Err(Error::NotFound(format!("artifact '{storage_path}'")));
        }
        Ok(())
    }

    async fn mark_email_sent(
        &self,
        student_id: &StudentId,
        term: &str,
        kind: ReportKind,
        sent_at: DateTime<Utc>,
        sent_by: &str,
    ) -> Result<()> {
        if self.mark_fails.load(Ordering::SeqCst) {
            return Err(Error::Transport("registry write failed".into()));
        }
        for artifact in self.artifacts.lock().unwrap().iter_mut().filter(|a| {
            &a.student_id == student_id && a.term == term && a.report_kind == kind
        }) {
            artifact.email_sent = true;
            artifact.email_sent_at = Some(sent_at);
            artifact.email_sent_by = Some(sent_by.to_string());
        }
        Ok(())
    }
}

/// Generator that succeeds unless an id is listed as failing
///
/// Successful ids get an artifact in the shared [`FakeRegistry`].
pub(crate) struct FakeGenerator {
    pub(crate) registry: Arc<FakeRegistry>,
    pub(crate) failing: Mutex<HashSet<StudentId>>,
    pub(crate) omitted: Mutex<HashSet<StudentId>>,
    pub(crate) unavailable: AtomicBool,
    pub(crate) calls: Mutex<Vec<Vec<StudentId>>>,
}

impl FakeGenerator {
    fn new(registry: Arc<FakeRegistry>) -> Self {
        Self {
            registry,
            failing: Mutex::new(HashSet::new()),
            omitted: Mutex::new(HashSet::new()),
            unavailable: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn fail_for(&self, ids: &[&str]) {
        let mut failing = self.failing.lock().unwrap();
        failing.clear();
        failing.extend(ids.iter().map(|id| StudentId::from(*id)));
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentGenerator for FakeGenerator {
    async fn submit(
        &self,
        term: &str,
        kind: ReportKind,
        student_ids: &[StudentId],
    ) -> Result<GenerationBatch> {
        self.calls.lock().unwrap().push(student_ids.to_vec());
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::Transport("generator unreachable".into()));
        }

        let failing = self.failing.lock().unwrap().clone();
        let omitted = self.omitted.lock().unwrap().clone();
        let mut batch = GenerationBatch::default();
        for id in student_ids.iter().filter(|id| !omitted.contains(id)) {
            if failing.contains(id) {
                batch.failed.push(id.clone());
            } else {
                if self.registry.get(id.as_str()).is_none() {
                    self.registry.add(id.as_str(), term, kind);
                }
                batch.succeeded.push(id.clone());
            }
        }
        Ok(batch)
    }
}

/// Directory backed by a fixed roster
#[derive(Default)]
pub(crate) struct FakeDirectory {
    pub(crate) students: Mutex<Vec<EntityRef>>,
    pub(crate) guardians: Mutex<HashMap<StudentId, Vec<String>>>,
    pub(crate) broken_lookups: Mutex<HashSet<StudentId>>,
}

#[async_trait]
impl EntityDirectory for FakeDirectory {
    async fn resolve_recipients(&self, student_id: &StudentId) -> Result<Vec<String>> {
        if self.broken_lookups.lock().unwrap().contains(student_id) {
            return Err(Error::Transport("directory timeout".into()));
        }
        Ok(self
            .guardians
            .lock()
            .unwrap()
            .get(student_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn entity(&self, student_id: &StudentId) -> Result<Option<EntityRef>> {
        Ok(self
            .students
            .lock()
            .unwrap()
            .iter()
            .find(|s| &s.id == student_id)
            .cloned())
    }

    async fn list_entities(&self, _school_id: &str) -> Result<Vec<EntityRef>> {
        Ok(self.students.lock().unwrap().clone())
    }
}

/// Mailer that records every email and rejects listed students
#[derive(Default)]
pub(crate) struct RecordingMailer {
    pub(crate) sent: Mutex<Vec<OutgoingEmail>>,
    pub(crate) reject: Mutex<HashSet<StudentId>>,
}

impl RecordingMailer {
    pub(crate) fn sent_to(&self) -> Vec<StudentId> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.student_id.clone())
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<DeliveryReport> {
        // Yield so bulk sends actually interleave
        tokio::task::yield_now().await;
        if self.reject.lock().unwrap().contains(&email.student_id) {
            return Ok(DeliveryReport::failed("550 mailbox unavailable"));
        }
        self.sent.lock().unwrap().push(email);
        Ok(DeliveryReport::sent())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Dispatcher plus handles to every fake behind it
pub(crate) struct TestHarness {
    pub(crate) dispatcher: ReportDispatcher,
    pub(crate) generator: Arc<FakeGenerator>,
    pub(crate) registry: Arc<FakeRegistry>,
    pub(crate) directory: Arc<FakeDirectory>,
    pub(crate) mailer: Arc<RecordingMailer>,
    pub(crate) db: Arc<Database>,
    _temp_dir: tempfile::TempDir,
}

/// Roster used by most tests
///
/// | id | name | grade | guardians |
/// |----|------|-------|-----------|
/// | s1 | Ada  | 5     | one valid address |
/// | s2 | Ben  | 5     | two valid addresses |
/// | s3 | Cara | 6     | one valid address |
/// | s4 | Dev  | 6     | none |
/// | s5 | Eli  | -     | one malformed address |
pub(crate) async fn create_test_dispatcher() -> TestHarness {
    let temp_dir = tempdir().unwrap();

    let mut config = Config::default();
    config.persistence.database_path = temp_dir.path().join("test.db");
    config.email.max_concurrent_sends = 3;

    let db = Arc::new(
        Database::new(&config.persistence.database_path)
            .await
            .unwrap(),
    );

    let registry = Arc::new(FakeRegistry::default());
    let generator = Arc::new(FakeGenerator::new(registry.clone()));
    let directory = Arc::new(FakeDirectory::default());
    let mailer = Arc::new(RecordingMailer::default());

    *directory.students.lock().unwrap() = vec![
        EntityRef::new("s1", "Ada Lovelace", Some("5")),
        EntityRef::new("s2", "Ben Franklin", Some("5")),
        EntityRef::new("s3", "Cara Williams", Some("6")),
        EntityRef::new("s4", "Dev Patel", Some("6")),
        EntityRef::new("s5", "Eli Moss", None),
    ];
    let guardians: HashMap<StudentId, Vec<String>> = [
        ("s1", vec!["ada.parent@example.com"]),
        ("s2", vec!["ben.mom@example.com", "ben.dad@example.com"]),
        ("s3", vec!["cara.parent@example.com"]),
        ("s5", vec!["eli.parent-at-example.com"]),
    ]
    .into_iter()
    .map(|(id, addrs)| (id.into(), addrs.into_iter().map(String::from).collect()))
    .collect();
    *directory.guardians.lock().unwrap() = guardians;

    let services = Services {
        generator: generator.clone(),
        registry: registry.clone(),
        directory: directory.clone(),
        mailer: mailer.clone(),
        history: db.clone(),
    };

    TestHarness {
        dispatcher: ReportDispatcher::with_services(config, services),
        generator,
        registry,
        directory,
        mailer,
        db,
        _temp_dir: temp_dir,
    }
}

/// Generate report cards for every roster student so sends have attachments
pub(crate) fn seed_artifacts(harness: &TestHarness) {
    for id in ["s1", "s2", "s3", "s4", "s5"] {
        harness.registry.add(id, TERM, ReportKind::ReportCard);
    }
}

/// Drain every event currently buffered in a receiver
pub(crate) fn drain_events(
    rx: &mut tokio::sync::broadcast::Receiver<crate::types::Event>,
) -> Vec<crate::types::Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
