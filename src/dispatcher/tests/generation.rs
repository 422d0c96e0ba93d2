use crate::cohort::{CohortSelection, SelectionCommand, SelectionMode};
use crate::dispatcher::test_helpers::{SCHOOL, TERM, create_test_dispatcher, drain_events};
use crate::error::{Error, ValidationError};
use crate::types::{Event, GenerationRequest, GenerationStatus, ReportKind, StudentId};
use std::sync::atomic::Ordering;

fn request(ids: &[&str]) -> GenerationRequest {
    GenerationRequest {
        term: TERM.to_string(),
        school_id: SCHOOL.to_string(),
        report_kind: ReportKind::ReportCard,
        student_ids: ids.iter().map(|id| StudentId::from(*id)).collect(),
    }
}

#[tokio::test]
async fn partial_failure_is_reported_per_student() {
    let harness = create_test_dispatcher().await;
    harness.generator.fail_for(&["s2"]);

    let report = harness
        .dispatcher
        .generate_reports(request(&["s1", "s2", "s3"]))
        .await
        .unwrap();

    let statuses: Vec<_> = report
        .results
        .iter()
        .map(|r| (r.student_id.as_str(), r.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("s1", GenerationStatus::Succeeded),
            ("s2", GenerationStatus::Failed),
            ("s3", GenerationStatus::Succeeded),
        ]
    );
    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.succeeded, 2);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.message, "Generated 2 report card(s). 1 failed.");

    assert!(report.registry_refreshed);
    let mut listed: Vec<_> = report
        .artifacts
        .iter()
        .map(|a| a.student_id.as_str())
        .collect();
    listed.sort();
    assert_eq!(listed, vec!["s1", "s3"]);
}

#[tokio::test]
async fn exactly_one_generator_call_per_job() {
    let harness = create_test_dispatcher().await;

    harness
        .dispatcher
        .generate_reports(request(&["s1", "s2", "s1", "s3", "s2"]))
        .await
        .unwrap();

    assert_eq!(harness.generator.call_count(), 1);
    let calls = harness.generator.calls.lock().unwrap();
    assert_eq!(
        calls[0],
        vec![
            StudentId::from("s1"),
            StudentId::from("s2"),
            StudentId::from("s3")
        ]
    );
}

#[tokio::test]
async fn empty_selection_never_reaches_generator() {
    let harness = create_test_dispatcher().await;

    let err = harness
        .dispatcher
        .generate_reports(request(&[]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Validation(ValidationError::NoEntitiesSelected)
    ));
    assert_eq!(harness.generator.call_count(), 0);
}

#[tokio::test]
async fn blank_term_is_rejected() {
    let harness = create_test_dispatcher().await;
    let mut req = request(&["s1"]);
    req.term = "  ".into();

    let err = harness.dispatcher.generate_reports(req).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::MissingField { ref field }) if field == "term"
    ));
    assert_eq!(harness.generator.call_count(), 0);
}

#[tokio::test]
async fn generator_outage_fails_the_whole_job() {
    let harness = create_test_dispatcher().await;
    harness.generator.unavailable.store(true, Ordering::SeqCst);
    let mut events = harness.dispatcher.subscribe();

    let err = harness
        .dispatcher
        .generate_reports(request(&["s1", "s2"]))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    let events = drain_events(&mut events);
    assert!(matches!(events[0], Event::GenerationStarted { count: 2, .. }));
    assert!(matches!(events[1], Event::GenerationFailed { .. }));
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn registry_refresh_failure_keeps_job_results() {
    let harness = create_test_dispatcher().await;
    harness.registry.list_fails.store(true, Ordering::SeqCst);

    let report = harness
        .dispatcher
        .generate_reports(request(&["s1", "s2"]))
        .await
        .unwrap();

    assert!(!report.registry_refreshed);
    assert!(report.artifacts.is_empty());
    assert_eq!(report.summary.succeeded, 2);
    assert_eq!(report.message, "Generated 2 report card(s). ");
}

#[tokio::test]
async fn omitted_students_are_failed() {
    let harness = create_test_dispatcher().await;
    harness
        .generator
        .omitted
        .lock()
        .unwrap()
        .insert(StudentId::from("s3"));

    let report = harness
        .dispatcher
        .generate_reports(request(&["s1", "s3"]))
        .await
        .unwrap();

    assert_eq!(report.summary.succeeded + report.summary.failed, 2);
    assert_eq!(report.results[1].status, GenerationStatus::Failed);
    assert!(report.results[1].reason.is_some());
}

#[tokio::test]
async fn resubmitting_existing_artifacts_is_allowed() {
    let harness = create_test_dispatcher().await;

    let first = harness
        .dispatcher
        .generate_reports(request(&["s1"]))
        .await
        .unwrap();
    let second = harness
        .dispatcher
        .generate_reports(request(&["s1"]))
        .await
        .unwrap();

    assert_eq!(first.summary.succeeded, 1);
    assert_eq!(second.summary.succeeded, 1);
    assert_eq!(harness.generator.call_count(), 2);
}

#[tokio::test]
async fn grade_filter_follows_directory() {
    let harness = create_test_dispatcher().await;
    let selection =
        CohortSelection::with_mode(SelectionMode::GradeFilter("5".into()));

    let report = harness
        .dispatcher
        .generate_for_selection(TERM, SCHOOL, ReportKind::ReportCard, &selection)
        .await
        .unwrap();

    let ids: Vec<_> = report
        .results
        .iter()
        .map(|r| r.student_id.as_str())
        .collect();
    assert_eq!(ids, vec!["s1", "s2"]);
}

#[tokio::test]
async fn empty_explicit_selection_is_rejected() {
    let harness = create_test_dispatcher().await;
    let selection = CohortSelection::default()
        .apply(SelectionCommand::Select("s1".into()))
        .apply(SelectionCommand::Deselect("s1".into()));

    let err = harness
        .dispatcher
        .generate_for_selection(TERM, SCHOOL, ReportKind::ReportCard, &selection)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Validation(ValidationError::NoEntitiesSelected)
    ));
    assert_eq!(harness.generator.call_count(), 0);
}
