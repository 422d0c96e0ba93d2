//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`reports`]: batch generation
//! - [`artifacts`]: listing, access URLs, deletion
//! - [`emails`]: single and bulk distribution, email history
//! - [`students`]: directory lookups for cohort selection and recipients
//! - [`system`]: health, events, OpenAPI

use crate::cohort::CohortSelection;
use crate::types::{ReportKind, StudentId};
use serde::{Deserialize, Serialize};

mod artifacts;
mod emails;
mod reports;
mod students;
mod system;

pub use artifacts::*;
pub use emails::*;
pub use reports::*;
pub use students::*;
pub use system::*;

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Request body for POST /reports/generate
///
/// Either `student_ids` or `selection` names the cohort. When both are given
/// the selection wins.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct GenerateReportsBody {
    /// Academic term (e.g., "Fall 2025")
    pub term: String,
    /// School the cohort belongs to
    pub school_id: String,
    /// Kind of document to generate (default: report_card)
    #[serde(default)]
    pub report_kind: ReportKind,
    /// Explicit student ids
    #[serde(default)]
    pub student_ids: Vec<StudentId>,
    /// Cohort selection resolved against the school's current students
    #[serde(default)]
    pub selection: Option<CohortSelection>,
}

/// Query parameters for GET /artifacts
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ArtifactListQuery {
    /// Academic term
    pub term: String,
    /// School the artifacts belong to
    pub school_id: String,
}

/// Query parameters naming one artifact by storage path
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ArtifactPathQuery {
    /// Storage reference as returned in `ArtifactRecord::storage_path`
    pub path: String,
}

/// Response for GET /artifacts/url
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ArtifactUrlResponse {
    /// Time-limited access URL
    pub url: String,
}

/// Query parameters for GET /emails/history
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TermHistoryQuery {
    /// Academic term
    pub term: String,
}

/// Query parameters for GET /students
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentListQuery {
    /// School whose students are listed
    pub school_id: String,
}

/// Response for GET /students/:student_id/recipients
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RecipientsResponse {
    /// Student the addresses belong to
    pub student_id: StudentId,
    /// Guardian addresses on file
    pub recipients: Vec<String>,
}
