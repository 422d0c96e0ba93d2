//! Email history and student directory queries.

use crate::error::Result;
use crate::types::{EmailHistoryRecord, EntityRef, StudentId};

use super::ReportDispatcher;

impl ReportDispatcher {
    /// Every email sent about one student, newest first
    ///
    /// Records survive deletion of the artifact they referred to.
    pub async fn email_history_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<EmailHistoryRecord>> {
        self.history.query_by_entity(student_id).await
    }

    /// Every email sent for one term, newest first
    pub async fn email_history_for_term(&self, term: &str) -> Result<Vec<EmailHistoryRecord>> {
        self.history.query_by_term(term).await
    }

    /// Students of a school, as offered for cohort selection
    pub async fn list_students(&self, school_id: &str) -> Result<Vec<EntityRef>> {
        self.directory.list_entities(school_id).await
    }

    /// Guardian addresses currently on file for a student
    pub async fn recipients_for(&self, student_id: &StudentId) -> Result<Vec<String>> {
        self.directory.resolve_recipients(student_id).await
    }
}
