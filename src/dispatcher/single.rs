//! Single-student distribution.

use crate::email::{normalize_addresses, validate_recipients};
use crate::error::{Error, Result, ValidationError};
use crate::types::{EmailResult, EmailStatus, SingleEmailRequest};

use super::ReportDispatcher;
use super::delivery::Delivery;

impl ReportDispatcher {
    /// Email one student's artifact to an explicit recipient list
    ///
    /// Validation is whole-request and happens before any network call: a
    /// single malformed To or CC address rejects the request, listing every
    /// offending address.
    ///
    /// On success exactly one history record is appended and the artifact is
    /// flagged as sent. Sending the same report again appends another record.
    ///
    /// # Errors
    ///
    /// - [`ValidationError`] for blank required fields, an empty To list or
    ///   malformed addresses
    /// - [`Error::NotFound`] when the student or the artifact does not exist
    ///
    /// A mailer rejection is not an error; it comes back as an
    /// [`EmailResult`] with status `Failed`.
    pub async fn send_report_email(&self, request: SingleEmailRequest) -> Result<EmailResult> {
        for (field, value) in [
            ("term", &request.term),
            ("school_id", &request.school_id),
            ("sent_by", &request.sent_by),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::missing(field).into());
            }
        }

        validate_recipients(&request.to, &request.cc)?;
        let to = normalize_addresses(&request.to);
        let cc = normalize_addresses(&request.cc);

        let student = self
            .directory
            .entity(&request.student_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("student {}", request.student_id)))?;

        let artifact = self
            .find_artifact(
                &request.school_id,
                &request.student_id,
                &request.term,
                request.report_kind,
            )
            .await?;

        tracing::info!(
            student_id = %request.student_id,
            term = %request.term,
            recipients = to.len(),
            cc = cc.len(),
            "Sending report email"
        );
        self.emit_status(&request.student_id, EmailStatus::Sending, None);

        let result = self
            .deliver(Delivery {
                student: &student,
                artifact: &artifact,
                term: &request.term,
                report_kind: request.report_kind,
                to,
                cc,
                subject: request.subject.as_deref(),
                message: request.message.as_deref(),
                sent_by: &request.sent_by,
            })
            .await;

        Ok(result)
    }
}
