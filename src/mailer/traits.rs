//! Traits and types for outgoing mail

use crate::error::Result;
use crate::types::StudentId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Reference to the artifact attached to an email
///
/// The URL is a freshly resolved, time-limited access URL; the mailer fetches
/// the bytes itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    /// File name shown to the recipient
    pub file_name: String,
    /// Access URL for the artifact
    pub url: String,
}

/// One outgoing email about one student
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    /// Student the email is about
    pub student_id: StudentId,
    /// Primary recipients
    pub to: Vec<String>,
    /// CC recipients
    pub cc: Vec<String>,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
    /// Artifact to attach
    pub attachment: AttachmentRef,
}

/// Delivery outcome reported by a mailer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Accepted by the mail transport
    Sent,
    /// Rejected or not attempted
    Failed,
}

/// Result of one send
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    /// Delivery outcome
    pub status: DeliveryStatus,
    /// Reason for a failure
    pub reason: Option<String>,
}

impl DeliveryReport {
    /// Successful delivery
    pub fn sent() -> Self {
        Self {
            status: DeliveryStatus::Sent,
            reason: None,
        }
    }

    /// Failed delivery with a reason
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: DeliveryStatus::Failed,
            reason: Some(reason.into()),
        }
    }

    /// Whether the email was accepted
    pub fn is_sent(&self) -> bool {
        self.status == DeliveryStatus::Sent
    }
}

/// Trait for sending report emails
///
/// Implementations report rejections as [`DeliveryReport::failed`]. An `Err`
/// means the message could not even be built; callers treat it as a failed
/// delivery for that one student.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one email with its attachment
    async fn send(&self, email: OutgoingEmail) -> Result<DeliveryReport>;

    /// Name of this implementation (for logging)
    fn name(&self) -> &'static str;
}
