//! Email history operations.

use crate::backend::EmailHistoryStore;
use crate::types::{EmailHistoryRecord, NewEmailHistory, StudentId};
use crate::{Error, Result};
use async_trait::async_trait;

use super::{Database, EmailHistoryRow};

impl Database {
    /// Append one email history record
    ///
    /// Called once per successful send. Records are never updated; sending
    /// the same report again appends another row.
    pub async fn insert_email_history(&self, entry: &NewEmailHistory) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO email_history (
                student_id, term, report_kind, recipients, cc,
                subject, message, sent_at, sent_by
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.student_id)
        .bind(&entry.term)
        .bind(entry.report_kind.as_str())
        .bind(serde_json::to_string(&entry.recipients)?)
        .bind(serde_json::to_string(&entry.cc)?)
        .bind(&entry.subject)
        .bind(&entry.message)
        .bind(entry.sent_at.timestamp())
        .bind(&entry.sent_by)
        .execute(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        Ok(result.last_insert_rowid())
    }

    /// Get a single history record by ID
    pub async fn get_email_history(&self, id: i64) -> Result<Option<EmailHistoryRecord>> {
        let row = sqlx::query_as::<_, EmailHistoryRow>(
            r#"
            SELECT id, student_id, term, report_kind, recipients, cc,
                   subject, message, sent_at, sent_by
            FROM email_history
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        row.map(EmailHistoryRecord::try_from).transpose()
    }

    /// History for one student, most recent first
    pub async fn query_email_history_by_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<EmailHistoryRecord>> {
        let rows = sqlx::query_as::<_, EmailHistoryRow>(
            r#"
            SELECT id, student_id, term, report_kind, recipients, cc,
                   subject, message, sent_at, sent_by
            FROM email_history
            WHERE student_id = ?
            ORDER BY sent_at DESC, id DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        rows.into_iter().map(EmailHistoryRecord::try_from).collect()
    }

    /// History for one term, most recent first
    pub async fn query_email_history_by_term(
        &self,
        term: &str,
    ) -> Result<Vec<EmailHistoryRecord>> {
        let rows = sqlx::query_as::<_, EmailHistoryRow>(
            r#"
            SELECT id, student_id, term, report_kind, recipients, cc,
                   subject, message, sent_at, sent_by
            FROM email_history
            WHERE term = ?
            ORDER BY sent_at DESC, id DESC
            "#,
        )
        .bind(term)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        rows.into_iter().map(EmailHistoryRecord::try_from).collect()
    }

    /// Count all history records
    pub async fn count_email_history(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM email_history")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Sqlx)?;

        Ok(count)
    }
}

#[async_trait]
impl EmailHistoryStore for Database {
    async fn append(&self, record: NewEmailHistory) -> Result<i64> {
        self.insert_email_history(&record).await
    }

    async fn query_by_entity(&self, student_id: &StudentId) -> Result<Vec<EmailHistoryRecord>> {
        self.query_email_history_by_student(student_id).await
    }

    async fn query_by_term(&self, term: &str) -> Result<Vec<EmailHistoryRecord>> {
        self.query_email_history_by_term(term).await
    }
}
