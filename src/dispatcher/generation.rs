//! Batch generation and result partitioning.

use crate::cohort::{CohortSelection, dedup};
use crate::error::{Error, Result, ValidationError};
use crate::summary::summary_message;
use crate::types::{
    Event, GenerationBatch, GenerationReport, GenerationRequest, GenerationResult, JobSummary,
    ReportKind, StudentId,
};
use std::collections::HashSet;

use super::ReportDispatcher;

/// Reason recorded for submitted ids the generator did not mention
pub(crate) const MISSING_FROM_RESPONSE: &str = "missing from generator response";

impl ReportDispatcher {
    /// Generate artifacts for a batch of students
    ///
    /// Issues exactly one call to the document generator and turns its
    /// partition into one result per submitted student. Afterwards the artifact
    /// registry is listed so the report carries the refreshed artifact list.
    ///
    /// No retry happens here: failed students stay failed until resubmitted.
    /// Resubmitting students that already have an artifact is allowed.
    ///
    /// # Errors
    ///
    /// - [`ValidationError`] for a blank term or school, or an empty id list.
    ///   Nothing is sent to the generator.
    /// - [`Error::Transport`] when the generator call itself fails.
    pub async fn generate_reports(&self, request: GenerationRequest) -> Result<GenerationReport> {
        let GenerationRequest {
            term,
            school_id,
            report_kind,
            student_ids,
        } = request;

        if term.trim().is_empty() {
            return Err(ValidationError::missing("term").into());
        }
        if school_id.trim().is_empty() {
            return Err(ValidationError::missing("school_id").into());
        }

        let student_ids = dedup(student_ids);
        if student_ids.is_empty() {
            return Err(ValidationError::NoEntitiesSelected.into());
        }

        tracing::info!(
            term = %term,
            report_kind = %report_kind,
            count = student_ids.len(),
            "Submitting generation batch"
        );
        self.emit_event(Event::GenerationStarted {
            term: term.clone(),
            count: student_ids.len(),
        });

        let batch = match self
            .generator
            .submit(&term, report_kind, &student_ids)
            .await
        {
            Ok(batch) => batch,
            Err(e) => {
                tracing::error!(term = %term, error = %e, "Generation batch failed");
                self.emit_event(Event::GenerationFailed {
                    term: term.clone(),
                    error: e.to_string(),
                });
                return Err(match e {
                    Error::Transport(_) => e,
                    other => Error::Transport(format!("document generator failed: {}", other)),
                });
            }
        };

        let results = partition_results(&student_ids, &batch);
        let summary = JobSummary::from_results(&results);
        let message = summary_message(report_kind, &summary);

        for result in results.iter().filter(|r| r.reason.is_some()) {
            tracing::warn!(
                student_id = %result.student_id,
                reason = result.reason.as_deref().unwrap_or_default(),
                "Generation failed for student"
            );
        }
        tracing::info!(
            term = %term,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Generation batch complete"
        );
        self.emit_event(Event::GenerationCompleted {
            term: term.clone(),
            total: summary.total,
            succeeded: summary.succeeded,
            failed: summary.failed,
        });

        let (artifacts, registry_refreshed) = match self.registry.list(&term, &school_id).await {
            Ok(artifacts) => (artifacts, true),
            Err(e) => {
                tracing::error!(
                    term = %term,
                    school_id = %school_id,
                    error = %e,
                    "Artifact registry refresh failed after generation"
                );
                (Vec::new(), false)
            }
        };

        Ok(GenerationReport {
            term,
            report_kind,
            results,
            summary,
            message,
            artifacts,
            registry_refreshed,
        })
    }

    /// Resolve a cohort selection against the school's students and generate
    ///
    /// # Errors
    ///
    /// Fails with `ValidationError::NoEntitiesSelected` before calling the
    /// generator when the selection resolves to nobody.
    pub async fn generate_for_selection(
        &self,
        term: &str,
        school_id: &str,
        report_kind: ReportKind,
        selection: &CohortSelection,
    ) -> Result<GenerationReport> {
        let available = self.directory.list_entities(school_id).await?;
        let student_ids = selection.resolve_for_submission(&available)?;

        self.generate_reports(GenerationRequest {
            term: term.to_string(),
            school_id: school_id.to_string(),
            report_kind,
            student_ids,
        })
        .await
    }
}

/// One result per submitted id, in submission order
///
/// - An id in `failed` is failed, even if it also appears in `succeeded`
/// - An id in neither partition is failed with [`MISSING_FROM_RESPONSE`]
/// - Ids that were never submitted are ignored
pub(crate) fn partition_results(
    submitted: &[StudentId],
    batch: &GenerationBatch,
) -> Vec<GenerationResult> {
    let succeeded: HashSet<&StudentId> = batch.succeeded.iter().collect();
    let failed: HashSet<&StudentId> = batch.failed.iter().collect();

    let submitted_set: HashSet<&StudentId> = submitted.iter().collect();
    let unsolicited = batch
        .succeeded
        .iter()
        .chain(batch.failed.iter())
        .filter(|id| !submitted_set.contains(id))
        .count();
    if unsolicited > 0 {
        tracing::warn!(unsolicited, "Generator reported ids that were not submitted");
    }

    submitted
        .iter()
        .map(|id| {
            if failed.contains(id) {
                GenerationResult::failed(id.clone(), None)
            } else if succeeded.contains(id) {
                GenerationResult::succeeded(id.clone())
            } else {
                GenerationResult::failed(id.clone(), Some(MISSING_FROM_RESPONSE.to_string()))
            }
        })
        .collect()
}
