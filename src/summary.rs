//! Generation result aggregation
//!
//! Pure functions turning per-student generation results into counts and a
//! user-facing summary line. Nothing here touches the network.

use crate::types::{GenerationResult, GenerationStatus, JobSummary, ReportKind};

impl JobSummary {
    /// Count succeeded and failed results
    pub fn from_results(results: &[GenerationResult]) -> Self {
        let succeeded = results
            .iter()
            .filter(|r| r.status == GenerationStatus::Succeeded)
            .count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
        }
    }
}

/// Summary line for a job, e.g. "Generated 8 report card(s). 2 failed."
///
/// The failure clause is omitted entirely when nothing failed.
pub fn summary_message(kind: ReportKind, summary: &JobSummary) -> String {
    let mut message = format!("Generated {} {}(s). ", summary.succeeded, kind.label());
    if summary.failed > 0 {
        message.push_str(&format!("{} failed.", summary.failed));
    }
    message
}

/// Summarize report card generation results
pub fn summarize(results: &[GenerationResult]) -> String {
    summarize_kind(ReportKind::ReportCard, results)
}

/// Summarize generation results for the given report kind
pub fn summarize_kind(kind: ReportKind, results: &[GenerationResult]) -> String {
    summary_message(kind, &JobSummary::from_results(results))
}
