//! Artifact listing, access URLs and deletion.

use crate::error::{Error, Result, ValidationError};
use crate::types::{ArtifactRecord, Event, ReportKind, StudentId};
use std::collections::HashMap;

use super::ReportDispatcher;

impl ReportDispatcher {
    /// List generated artifacts for a term and school
    pub async fn list_artifacts(&self, term: &str, school_id: &str) -> Result<Vec<ArtifactRecord>> {
        if term.trim().is_empty() {
            return Err(ValidationError::missing("term").into());
        }
        self.registry.list(term, school_id).await
    }

    /// Resolve a fresh access URL for viewing or downloading an artifact
    ///
    /// URLs are time-limited and never cached; every call asks the registry.
    pub async fn artifact_url(&self, storage_path: &str) -> Result<String> {
        if storage_path.trim().is_empty() {
            return Err(ValidationError::missing("path").into());
        }
        self.registry.resolve_access_url(storage_path).await
    }

    /// Delete an artifact from the registry
    ///
    /// Email history that references the artifact's student and term is
    /// kept untouched.
    pub async fn delete_artifact(&self, storage_path: &str) -> Result<()> {
        if storage_path.trim().is_empty() {
            return Err(ValidationError::missing("path").into());
        }

        self.registry.delete(storage_path).await?;

        tracing::info!(path = %storage_path, "Artifact deleted");
        self.emit_event(Event::ArtifactDeleted {
            path: storage_path.to_string(),
        });
        Ok(())
    }

    /// Find the artifact a distribution would attach for one student
    ///
    /// When the registry holds several matching artifacts, the most recently
    /// generated one wins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no artifact was generated for the
    /// student, term and kind.
    pub async fn find_artifact(
        &self,
        school_id: &str,
        student_id: &StudentId,
        term: &str,
        kind: ReportKind,
    ) -> Result<ArtifactRecord> {
        let artifacts = self.registry.list(term, school_id).await?;
        latest_artifacts(artifacts, kind)
            .remove(student_id)
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "{} for student {} in {}",
                    kind.label(),
                    student_id,
                    term
                ))
            })
    }

    /// Latest artifact of `kind` per student for one term, listed once
    pub(crate) async fn artifacts_by_student(
        &self,
        school_id: &str,
        term: &str,
        kind: ReportKind,
    ) -> Result<HashMap<StudentId, ArtifactRecord>> {
        let artifacts = self.registry.list(term, school_id).await?;
        Ok(latest_artifacts(artifacts, kind))
    }
}

fn latest_artifacts(
    artifacts: Vec<ArtifactRecord>,
    kind: ReportKind,
) -> HashMap<StudentId, ArtifactRecord> {
    let mut latest: HashMap<StudentId, ArtifactRecord> = HashMap::new();
    for artifact in artifacts.into_iter().filter(|a| a.report_kind == kind) {
        match latest.get(&artifact.student_id) {
            Some(existing) if existing.generated_at >= artifact.generated_at => {}
            _ => {
                latest.insert(artifact.student_id.clone(), artifact);
            }
        }
    }
    latest
}
