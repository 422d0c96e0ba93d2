//! No-op mailer used when SMTP is not configured

use super::traits::{DeliveryReport, Mailer, OutgoingEmail};
use async_trait::async_trait;

/// Mailer that refuses every send
///
/// Used when the configuration has no `smtp` section, so the rest of the
/// dispatcher (generation, history queries, artifact management) keeps
/// working. Every send comes back as a failed delivery.
///
/// # Examples
///
/// ```
/// use report_dispatch::mailer::{AttachmentRef, Mailer, NoOpMailer, OutgoingEmail};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let report = NoOpMailer
///     .send(OutgoingEmail {
///         student_id: "s1".into(),
///         to: vec!["parent@example.com".into()],
///         cc: vec![],
///         subject: "Report Card".into(),
///         body: "Attached.".into(),
///         attachment: AttachmentRef {
///             file_name: "report_card_s1.pdf".into(),
///             url: "https://files.example/s1.pdf".into(),
///         },
///     })
///     .await?;
/// assert!(!report.is_sent());
/// # Ok(())
/// # }
/// ```
pub struct NoOpMailer;

#[async_trait]
impl Mailer for NoOpMailer {
    async fn send(&self, email: OutgoingEmail) -> crate::Result<DeliveryReport> {
        tracing::debug!(student_id = %email.student_id, "dropping email, no mail server configured");
        Ok(DeliveryReport::failed(
            "email delivery is not configured. Add an smtp section to the config.",
        ))
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
