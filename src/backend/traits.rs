//! Traits for the external collaborators the dispatcher talks to
//!
//! Every collaborator is an async trait object so production adapters
//! ([`RestBackend`](super::RestBackend), [`Database`](crate::db::Database)) and
//! in-memory test doubles are interchangeable.

use crate::error::Result;
use crate::types::{
    ArtifactRecord, EmailHistoryRecord, EntityRef, GenerationBatch, NewEmailHistory, ReportKind,
    StudentId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// External document generator
///
/// The generator is authoritative for artifact creation. One call covers a
/// whole batch; the returned partition is the only outcome the caller sees.
#[async_trait]
pub trait DocumentGenerator: Send + Sync {
    /// Generate artifacts for every id in one batch
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`](crate::Error::Transport) when the batch
    /// call itself fails. Per-student failures are reported in the partition.
    async fn submit(
        &self,
        term: &str,
        kind: ReportKind,
        student_ids: &[StudentId],
    ) -> Result<GenerationBatch>;
}

/// External registry of generated artifacts
#[async_trait]
pub trait ArtifactRegistry: Send + Sync {
    /// List artifacts for a term and school
    async fn list(&self, term: &str, school_id: &str) -> Result<Vec<ArtifactRecord>>;

    /// Resolve a fresh, time-limited access URL for a storage path
    ///
    /// URLs expire; callers resolve again for every use instead of caching.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) when the path is stale.
    async fn resolve_access_url(&self, storage_path: &str) -> Result<String>;

    /// Delete the artifact stored at `storage_path`
    async fn delete(&self, storage_path: &str) -> Result<()>;

    /// Record that an artifact was emailed (last write wins)
    async fn mark_email_sent(
        &self,
        student_id: &StudentId,
        term: &str,
        kind: ReportKind,
        sent_at: DateTime<Utc>,
        sent_by: &str,
    ) -> Result<()>;
}

/// External directory of students and their guardians
#[async_trait]
pub trait EntityDirectory: Send + Sync {
    /// Guardian email addresses for a student (may be empty)
    async fn resolve_recipients(&self, student_id: &StudentId) -> Result<Vec<String>>;

    /// Look up one student, returning None if unknown
    async fn entity(&self, student_id: &StudentId) -> Result<Option<EntityRef>>;

    /// Every student of a school, in directory order
    async fn list_entities(&self, school_id: &str) -> Result<Vec<EntityRef>>;
}

/// Append-only email audit log
///
/// No update or delete is exposed; a resend adds a new record.
#[async_trait]
pub trait EmailHistoryStore: Send + Sync {
    /// Append one record and return its identifier
    async fn append(&self, record: NewEmailHistory) -> Result<i64>;

    /// Records for one student, newest first
    async fn query_by_entity(&self, student_id: &StudentId) -> Result<Vec<EmailHistoryRecord>>;

    /// Records for one term, newest first
    async fn query_by_term(&self, term: &str) -> Result<Vec<EmailHistoryRecord>>;
}
