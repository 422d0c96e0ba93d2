//! Core types for report-dispatch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique identifier for a student (the entity every artifact belongs to)
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct StudentId(pub String);

impl StudentId {
    /// Create a new StudentId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the inner identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StudentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for StudentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for StudentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// Implement sqlx Type, Encode, and Decode for database operations
impl sqlx::Type<sqlx::Sqlite> for StudentId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <String as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for StudentId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for StudentId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <String as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(id))
    }
}

/// A student as known to the entity directory
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EntityRef {
    /// Student identifier
    pub id: StudentId,
    /// Display name used in email content
    pub name: String,
    /// Cohort tag (grade level), if assigned
    #[serde(default)]
    pub grade: Option<String>,
}

impl EntityRef {
    /// Create an entity reference
    pub fn new(id: impl Into<StudentId>, name: impl Into<String>, grade: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            grade: grade.map(String::from),
        }
    }
}

/// Kind of generated document
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// End-of-term report card
    #[default]
    ReportCard,
    /// Mid-term progress report
    ProgressReport,
}

impl ReportKind {
    /// Wire tag used by external services and the history store
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::ReportCard => "report_card",
            ReportKind::ProgressReport => "progress_report",
        }
    }

    /// Parse a wire tag, returning None for unknown tags
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "report_card" => Some(ReportKind::ReportCard),
            "progress_report" => Some(ReportKind::ProgressReport),
            _ => None,
        }
    }

    /// Lowercase human label ("report card")
    pub fn label(&self) -> &'static str {
        match self {
            ReportKind::ReportCard => "report card",
            ReportKind::ProgressReport => "progress report",
        }
    }

    /// Title-case label ("Report Card")
    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::ReportCard => "Report Card",
            ReportKind::ProgressReport => "Progress Report",
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of generating one student's artifact
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    /// Artifact was created by the generator
    Succeeded,
    /// Generator could not create the artifact
    Failed,
}

/// Per-student generation result (display-only, never persisted)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GenerationResult {
    /// Student the result belongs to
    pub student_id: StudentId,
    /// Whether generation succeeded
    pub status: GenerationStatus,
    /// Failure reason, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl GenerationResult {
    /// Successful result
    pub fn succeeded(student_id: StudentId) -> Self {
        Self {
            student_id,
            status: GenerationStatus::Succeeded,
            reason: None,
        }
    }

    /// Failed result with an optional reason
    pub fn failed(student_id: StudentId, reason: Option<String>) -> Self {
        Self {
            student_id,
            status: GenerationStatus::Failed,
            reason,
        }
    }
}

/// Partition returned by the external document generator
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GenerationBatch {
    /// Students whose artifacts were created
    #[serde(default)]
    pub succeeded: Vec<StudentId>,
    /// Students whose artifacts could not be created
    #[serde(default)]
    pub failed: Vec<StudentId>,
}

/// Aggregate counts for one generation job
///
/// `succeeded + failed == total` always holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct JobSummary {
    /// Number of students submitted
    pub total: usize,
    /// Number of artifacts created
    pub succeeded: usize,
    /// Number of students that failed
    pub failed: usize,
}

/// Parameters for one generation job
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerationRequest {
    /// Academic term (e.g., "Fall 2025")
    pub term: String,
    /// School the cohort belongs to (used for the registry refresh)
    pub school_id: String,
    /// Kind of document to generate
    #[serde(default)]
    pub report_kind: ReportKind,
    /// Students to generate for (must be non-empty)
    pub student_ids: Vec<StudentId>,
}

/// Result of a completed generation job
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerationReport {
    /// Term the job ran for
    pub term: String,
    /// Kind of document generated
    pub report_kind: ReportKind,
    /// One result per submitted student
    pub results: Vec<GenerationResult>,
    /// Aggregate counts
    pub summary: JobSummary,
    /// Human-readable summary ("Generated 2 report card(s). 1 failed.")
    pub message: String,
    /// Artifacts listed from the registry after the job
    pub artifacts: Vec<ArtifactRecord>,
    /// Whether the post-job registry refresh succeeded
    pub registry_refreshed: bool,
}

/// A previously generated artifact, owned by the external registry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ArtifactRecord {
    /// Student the artifact belongs to
    pub student_id: StudentId,
    /// Academic term
    pub term: String,
    /// Kind of document
    #[serde(default)]
    pub report_kind: ReportKind,
    /// Storage reference used to resolve access URLs and delete the artifact
    pub storage_path: String,
    /// School the artifact belongs to
    #[serde(default)]
    pub school_id: Option<String>,
    /// When the artifact was generated
    pub generated_at: DateTime<Utc>,
    /// Whether the artifact has been emailed at least once
    #[serde(default)]
    pub email_sent: bool,
    /// Time of the most recent send
    #[serde(default)]
    pub email_sent_at: Option<DateTime<Utc>>,
    /// Actor of the most recent send
    #[serde(default)]
    pub email_sent_by: Option<String>,
}

/// Per-entity email state
///
/// Transitions: `NotSent → Sending → {Sent | Failed | Skipped}`. The three
/// outcomes are terminal for one attempt; a new attempt starts from `NotSent`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    /// No attempt made yet
    NotSent,
    /// Attempt in flight
    Sending,
    /// Delivered to the mailer
    Sent,
    /// Attempt failed (validation, transport or mailer rejection)
    Failed,
    /// Not attempted because no recipients could be resolved
    Skipped,
}

impl EmailStatus {
    /// Whether this status ends an attempt
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EmailStatus::Sent | EmailStatus::Failed | EmailStatus::Skipped
        )
    }

    /// Whether `next` is a legal successor of this status within one attempt
    pub fn can_transition_to(&self, next: EmailStatus) -> bool {
        match (self, next) {
            (EmailStatus::NotSent, EmailStatus::Sending) => true,
            (EmailStatus::Sending, next) => next.is_terminal(),
            _ => false,
        }
    }
}

/// Per-entity email outcome
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EmailResult {
    /// Student the email was about
    pub student_id: StudentId,
    /// Terminal status of this attempt
    pub status: EmailStatus,
    /// Recipients actually used (empty unless sent)
    #[serde(default)]
    pub recipients: Vec<String>,
    /// CC addresses actually used (empty unless sent)
    #[serde(default)]
    pub cc: Vec<String>,
    /// Reason for a failure or skip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// History record written for a successful send
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_id: Option<i64>,
}

impl EmailResult {
    /// Successful send
    pub fn sent(
        student_id: StudentId,
        recipients: Vec<String>,
        cc: Vec<String>,
        history_id: Option<i64>,
    ) -> Self {
        Self {
            student_id,
            status: EmailStatus::Sent,
            recipients,
            cc,
            reason: None,
            history_id,
        }
    }

    /// Failed attempt
    pub fn failed(student_id: StudentId, reason: impl Into<String>) -> Self {
        Self {
            student_id,
            status: EmailStatus::Failed,
            recipients: Vec::new(),
            cc: Vec::new(),
            reason: Some(reason.into()),
            history_id: None,
        }
    }

    /// Skipped attempt
    pub fn skipped(student_id: StudentId, reason: impl Into<String>) -> Self {
        Self {
            student_id,
            status: EmailStatus::Skipped,
            recipients: Vec::new(),
            cc: Vec::new(),
            reason: Some(reason.into()),
            history_id: None,
        }
    }
}

/// Request to email one student's artifact
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SingleEmailRequest {
    /// Student whose artifact is sent
    pub student_id: StudentId,
    /// School the artifact belongs to
    pub school_id: String,
    /// Academic term
    pub term: String,
    /// Kind of document
    #[serde(default)]
    pub report_kind: ReportKind,
    /// Primary recipients (at least one)
    pub to: Vec<String>,
    /// CC recipients
    #[serde(default)]
    pub cc: Vec<String>,
    /// Subject override (defaults to the configured template)
    #[serde(default)]
    pub subject: Option<String>,
    /// Free-text addendum appended to the templated body
    #[serde(default)]
    pub message: Option<String>,
    /// Acting user recorded in history and on the artifact
    pub sent_by: String,
}

/// Request to email many students' artifacts
///
/// The student list may be edited with [`BulkEmailRequest::remove_student`]
/// before submission; removed students appear in neither the outgoing
/// requests nor the result list.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkEmailRequest {
    /// Students to send to
    pub student_ids: Vec<StudentId>,
    /// School the artifacts belong to
    pub school_id: String,
    /// Academic term
    pub term: String,
    /// Kind of document
    #[serde(default)]
    pub report_kind: ReportKind,
    /// Shared subject (defaults to the configured template, rendered per student)
    #[serde(default)]
    pub subject: Option<String>,
    /// Shared free-text addendum
    #[serde(default)]
    pub message: Option<String>,
    /// Shared CC recipients
    #[serde(default)]
    pub cc: Vec<String>,
    /// Acting user recorded in history and on each artifact
    pub sent_by: String,
}

impl BulkEmailRequest {
    /// Remove one student from the pending list. Returns true if it was present.
    pub fn remove_student(&mut self, id: &StudentId) -> bool {
        let before = self.student_ids.len();
        self.student_ids.retain(|s| s != id);
        self.student_ids.len() != before
    }

    /// Builder-style variant of [`remove_student`](Self::remove_student)
    pub fn without(mut self, id: &StudentId) -> Self {
        self.remove_student(id);
        self
    }
}

/// Aggregate counts for one bulk send
///
/// `sent + failed + skipped == total` always holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BulkEmailSummary {
    /// Students attempted
    pub total: usize,
    /// Students whose email was sent
    pub sent: usize,
    /// Students whose email failed
    pub failed: usize,
    /// Students skipped for lack of recipients
    pub skipped: usize,
    /// Wall-clock duration of the whole batch in milliseconds
    pub duration_ms: u64,
}

/// Result of a bulk send
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkEmailReport {
    /// Aggregate counts
    pub summary: BulkEmailSummary,
    /// One result per attempted student, in no particular order
    pub results: Vec<EmailResult>,
}

/// Immutable audit record for one successful send
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EmailHistoryRecord {
    /// Store-assigned identifier
    pub id: i64,
    /// Student the email was about
    pub student_id: StudentId,
    /// Academic term
    pub term: String,
    /// Kind of document attached
    pub report_kind: ReportKind,
    /// Primary recipients
    pub recipients: Vec<String>,
    /// CC recipients
    pub cc: Vec<String>,
    /// Subject as sent
    pub subject: String,
    /// Body as sent
    pub message: String,
    /// When the email was sent
    pub sent_at: DateTime<Utc>,
    /// Acting user
    pub sent_by: String,
}

/// History record to be appended
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewEmailHistory {
    /// Student the email was about
    pub student_id: StudentId,
    /// Academic term
    pub term: String,
    /// Kind of document attached
    pub report_kind: ReportKind,
    /// Primary recipients
    pub recipients: Vec<String>,
    /// CC recipients
    pub cc: Vec<String>,
    /// Subject as sent
    pub subject: String,
    /// Body as sent
    pub message: String,
    /// When the email was sent
    pub sent_at: DateTime<Utc>,
    /// Acting user
    pub sent_by: String,
}

/// Event emitted by the orchestrator
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Generation batch submitted
    GenerationStarted {
        /// Academic term
        term: String,
        /// Number of students submitted
        count: usize,
    },

    /// Generation batch returned a partition
    GenerationCompleted {
        /// Academic term
        term: String,
        /// Number of students submitted
        total: usize,
        /// Artifacts created
        succeeded: usize,
        /// Students that failed
        failed: usize,
    },

    /// Generation batch call failed as a whole
    GenerationFailed {
        /// Academic term
        term: String,
        /// Error message
        error: String,
    },

    /// An artifact was deleted from the registry
    ArtifactDeleted {
        /// Storage reference of the deleted artifact
        path: String,
    },

    /// Per-student email state transition
    EmailStatusChanged {
        /// Student identifier
        student_id: StudentId,
        /// New status
        status: EmailStatus,
        /// Reason for a failure or skip
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Email was delivered but the history append or sent-flag update failed
    BookkeepingFailed {
        /// Student identifier
        student_id: StudentId,
        /// Error message
        error: String,
    },

    /// Bulk send finished
    BulkEmailCompleted {
        /// Students attempted
        total: usize,
        /// Emails sent
        sent: usize,
        /// Emails failed
        failed: usize,
        /// Students skipped
        skipped: usize,
        /// Wall-clock duration in milliseconds
        duration_ms: u64,
    },
}
