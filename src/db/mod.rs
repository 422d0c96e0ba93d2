//! Database layer for report-dispatch
//!
//! Handles SQLite persistence for the email audit log.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`]: database lifecycle, schema migrations
//! - [`email_history`]: append-only email history

use crate::error::{DatabaseError, Error, Result};
use crate::types::{EmailHistoryRecord, ReportKind, StudentId};
use sqlx::{FromRow, sqlite::SqlitePool};

mod email_history;
mod migrations;

/// Email history record from database (raw from SQLite)
///
/// Address lists are stored as JSON arrays, timestamps as unix seconds.
#[derive(Debug, Clone, FromRow)]
pub struct EmailHistoryRow {
    /// Unique database ID
    pub id: i64,
    /// Student the email was about
    pub student_id: StudentId,
    /// Academic term
    pub term: String,
    /// Report kind tag ("report_card", "progress_report")
    pub report_kind: String,
    /// JSON array of primary recipients
    pub recipients: String,
    /// JSON array of CC recipients
    pub cc: String,
    /// Subject as sent
    pub subject: String,
    /// Body as sent
    pub message: String,
    /// Unix timestamp of the send
    pub sent_at: i64,
    /// Acting user
    pub sent_by: String,
}

impl TryFrom<EmailHistoryRow> for EmailHistoryRecord {
    type Error = Error;

    fn try_from(row: EmailHistoryRow) -> Result<Self> {
        use chrono::{TimeZone, Utc};

        let report_kind = ReportKind::from_tag(&row.report_kind).ok_or_else(|| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "unknown report kind '{}' in email_history row {}",
                row.report_kind, row.id
            )))
        })?;

        Ok(EmailHistoryRecord {
            id: row.id,
            student_id: row.student_id,
            term: row.term,
            report_kind,
            recipients: serde_json::from_str(&row.recipients)?,
            cc: serde_json::from_str(&row.cc)?,
            subject: row.subject,
            message: row.message,
            sent_at: Utc
                .timestamp_opt(row.sent_at, 0)
                .single()
                .unwrap_or_else(Utc::now),
            sent_by: row.sent_by,
        })
    }
}

/// Database handle for report-dispatch
pub struct Database {
    pool: SqlitePool,
}
