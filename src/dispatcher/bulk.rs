//! Bulk distribution with per-student isolation.
//!
//! Each student is resolved, validated and sent independently. One student's
//! directory error, malformed guardian address or mailer rejection becomes a
//! `Failed` result for that student only; siblings are unaffected. Students
//! without any guardian address are `Skipped`, which is not a failure.

use crate::cohort::dedup;
use crate::email::{invalid_addresses, normalize_addresses};
use crate::error::{Result, ValidationError};
use crate::types::{
    ArtifactRecord, BulkEmailReport, BulkEmailRequest, BulkEmailSummary, EmailResult, EmailStatus,
    Event, ReportKind, StudentId,
};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;

use super::ReportDispatcher;
use super::delivery::Delivery;

/// Reason recorded for students with no guardian address on file
pub(crate) const NO_RECIPIENTS: &str = "no recipient addresses on file";

/// Request fields shared by every student in a bulk send
struct SharedContent {
    term: String,
    report_kind: ReportKind,
    subject: Option<String>,
    message: Option<String>,
    cc: Vec<String>,
    sent_by: String,
}

impl ReportDispatcher {
    /// Email many students' artifacts to their guardians
    ///
    /// Duplicate ids are sent once. Up to `email.max_concurrent_sends`
    /// students are processed at a time; the result list is in completion
    /// order. The summary always satisfies `sent + failed + skipped == total`.
    ///
    /// # Errors
    ///
    /// Only whole-request problems are errors:
    /// - an empty student list or blank required fields
    /// - a malformed shared CC address (it would fail every student alike)
    /// - the registry listing used to locate artifacts is unreachable
    pub async fn send_bulk_emails(&self, request: BulkEmailRequest) -> Result<BulkEmailReport> {
        let started = Instant::now();

        for (field, value) in [
            ("term", &request.term),
            ("school_id", &request.school_id),
            ("sent_by", &request.sent_by),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::missing(field).into());
            }
        }

        let student_ids = dedup(request.student_ids);
        if student_ids.is_empty() {
            return Err(ValidationError::NoEntitiesSelected.into());
        }

        let bad_cc = invalid_addresses(request.cc.iter());
        if !bad_cc.is_empty() {
            return Err(ValidationError::InvalidAddresses { addresses: bad_cc }.into());
        }
        let cc = normalize_addresses(&request.cc);

        let artifacts = self
            .artifacts_by_student(&request.school_id, &request.term, request.report_kind)
            .await?;

        tracing::info!(
            term = %request.term,
            count = student_ids.len(),
            concurrency = self.config.email.max_concurrent_sends,
            "Starting bulk email send"
        );

        let shared = Arc::new(SharedContent {
            term: request.term,
            report_kind: request.report_kind,
            subject: request.subject,
            message: request.message,
            cc,
            sent_by: request.sent_by,
        });
        let concurrency = self.config.email.max_concurrent_sends.max(1);

        let results: Vec<EmailResult> = stream::iter(student_ids)
            .map(|student_id| {
                let dispatcher = self.clone();
                let shared = Arc::clone(&shared);
                let artifact = artifacts.get(&student_id).cloned();

                async move { dispatcher.send_one(student_id, artifact, &shared).await }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let summary = summarize_bulk(&results, started.elapsed().as_millis() as u64);

        tracing::info!(
            total = summary.total,
            sent = summary.sent,
            failed = summary.failed,
            skipped = summary.skipped,
            duration_ms = summary.duration_ms,
            "Bulk email send complete"
        );
        self.emit_event(Event::BulkEmailCompleted {
            total: summary.total,
            sent: summary.sent,
            failed: summary.failed,
            skipped: summary.skipped,
            duration_ms: summary.duration_ms,
        });

        Ok(BulkEmailReport { summary, results })
    }

    /// Process one student of a bulk send; never fails the batch
    async fn send_one(
        &self,
        student_id: StudentId,
        artifact: Option<ArtifactRecord>,
        shared: &SharedContent,
    ) -> EmailResult {
        self.emit_status(&student_id, EmailStatus::Sending, None);

        let recipients = match self.directory.resolve_recipients(&student_id).await {
            Ok(addresses) => normalize_addresses(&addresses),
            Err(e) => {
                return self.finish(EmailResult::failed(
                    student_id,
                    format!("recipient lookup failed: {}", e),
                ));
            }
        };

        if recipients.is_empty() {
            return self.finish(EmailResult::skipped(student_id, NO_RECIPIENTS));
        }

        let bad = invalid_addresses(recipients.iter());
        if !bad.is_empty() {
            let reason = ValidationError::InvalidAddresses { addresses: bad }.to_string();
            return self.finish(EmailResult::failed(student_id, reason));
        }

        let Some(artifact) = artifact else {
            let reason = format!(
                "no {} generated for {}",
                shared.report_kind.label(),
                shared.term
            );
            return self.finish(EmailResult::failed(student_id, reason));
        };

        let student = match self.directory.entity(&student_id).await {
            Ok(Some(student)) => student,
            Ok(None) => {
                return self.finish(EmailResult::failed(
                    student_id,
                    "student not found in directory",
                ));
            }
            Err(e) => {
                return self.finish(EmailResult::failed(
                    student_id,
                    format!("student lookup failed: {}", e),
                ));
            }
        };

        self.deliver(Delivery {
            student: &student,
            artifact: &artifact,
            term: &shared.term,
            report_kind: shared.report_kind,
            to: recipients,
            cc: shared.cc.clone(),
            subject: shared.subject.as_deref(),
            message: shared.message.as_deref(),
            sent_by: &shared.sent_by,
        })
        .await
    }
}

/// Tally terminal statuses; anything not sent or skipped counts as failed
pub(crate) fn summarize_bulk(results: &[EmailResult], duration_ms: u64) -> BulkEmailSummary {
    let mut summary = BulkEmailSummary {
        total: results.len(),
        duration_ms,
        ..Default::default()
    };
    for result in results {
        match result.status {
            EmailStatus::Sent => summary.sent += 1,
            EmailStatus::Skipped => summary.skipped += 1,
            _ => summary.failed += 1,
        }
    }
    summary
}
