//! One email for one student, shared by single and bulk sends.
//!
//! The caller has already validated addresses and looked up the student and
//! artifact. From here on nothing returns an `Err`: every outcome is an
//! [`EmailResult`].

use crate::email::{TemplateContext, compose_body, compose_subject};
use crate::mailer::{AttachmentRef, OutgoingEmail};
use crate::types::{
    ArtifactRecord, EmailResult, EmailStatus, EntityRef, Event, NewEmailHistory, ReportKind,
    StudentId,
};
use chrono::Utc;

use super::ReportDispatcher;

/// Everything needed to send one report email
pub(crate) struct Delivery<'a> {
    pub(crate) student: &'a EntityRef,
    pub(crate) artifact: &'a ArtifactRecord,
    pub(crate) term: &'a str,
    pub(crate) report_kind: ReportKind,
    pub(crate) to: Vec<String>,
    pub(crate) cc: Vec<String>,
    pub(crate) subject: Option<&'a str>,
    pub(crate) message: Option<&'a str>,
    pub(crate) sent_by: &'a str,
}

impl ReportDispatcher {
    /// Resolve the attachment URL, send, then record history and the sent flag
    ///
    /// Once the mailer accepted the email the result is `Sent`, even if the
    /// bookkeeping afterwards fails.
    pub(crate) async fn deliver(&self, delivery: Delivery<'_>) -> EmailResult {
        let Delivery {
            student,
            artifact,
            term,
            report_kind,
            to,
            cc,
            subject,
            message,
            sent_by,
        } = delivery;
        let student_id = &student.id;

        let ctx = TemplateContext {
            student_name: &student.name,
            term,
            report_kind,
        };
        let subject = compose_subject(&self.config.email.subject_template, subject, &ctx);
        let body = compose_body(&self.config.email.body_template, &ctx, message);

        let url = match self
            .registry
            .resolve_access_url(&artifact.storage_path)
            .await
        {
            Ok(url) => url,
            Err(e) => {
                return self.finish(EmailResult::failed(
                    student_id.clone(),
                    format!("could not resolve attachment: {}", e),
                ));
            }
        };

        let email = OutgoingEmail {
            student_id: student_id.clone(),
            to: to.clone(),
            cc: cc.clone(),
            subject: subject.clone(),
            body: body.clone(),
            attachment: AttachmentRef {
                file_name: attachment_file_name(report_kind, term, student_id.as_str()),
                url,
            },
        };

        let report = match self.mailer.send(email).await {
            Ok(report) => report,
            Err(e) => return self.finish(EmailResult::failed(student_id.clone(), e.to_string())),
        };
        if !report.is_sent() {
            let reason = report
                .reason
                .unwrap_or_else(|| "rejected by mailer".to_string());
            return self.finish(EmailResult::failed(student_id.clone(), reason));
        }

        let sent_at = Utc::now();

        let history_id = match self
            .history
            .append(NewEmailHistory {
                student_id: student_id.clone(),
                term: term.to_string(),
                report_kind,
                recipients: to.clone(),
                cc: cc.clone(),
                subject,
                message: body,
                sent_at,
                sent_by: sent_by.to_string(),
            })
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                self.bookkeeping_failed(student_id, format!("history append failed: {}", e));
                None
            }
        };

        if let Err(e) = self
            .registry
            .mark_email_sent(student_id, term, report_kind, sent_at, sent_by)
            .await
        {
            self.bookkeeping_failed(student_id, format!("sent flag update failed: {}", e));
        }

        self.finish(EmailResult::sent(student_id.clone(), to, cc, history_id))
    }

    /// Log and announce a terminal outcome
    pub(crate) fn finish(&self, result: EmailResult) -> EmailResult {
        match result.status {
            EmailStatus::Sent => {
                tracing::debug!(
                    student_id = %result.student_id,
                    recipients = result.recipients.len(),
                    "Report email sent"
                );
            }
            EmailStatus::Skipped => {
                tracing::warn!(
                    student_id = %result.student_id,
                    reason = result.reason.as_deref().unwrap_or_default(),
                    "Report email skipped"
                );
            }
            _ => {
                tracing::warn!(
                    student_id = %result.student_id,
                    reason = result.reason.as_deref().unwrap_or_default(),
                    "Report email failed"
                );
            }
        }
        self.emit_status(&result.student_id, result.status, result.reason.clone());
        result
    }

    fn bookkeeping_failed(&self, student_id: &StudentId, error: String) {
        tracing::error!(student_id = %student_id, error = %error, "Email sent but bookkeeping failed");
        self.emit_event(Event::BookkeepingFailed {
            student_id: student_id.clone(),
            error,
        });
    }
}

/// File name shown to recipients, e.g. "report_card_Fall_2025_s1.pdf"
pub(crate) fn attachment_file_name(kind: ReportKind, term: &str, student_id: &str) -> String {
    let term: String = term
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_{}_{}.pdf", kind.as_str(), term, student_id)
}
