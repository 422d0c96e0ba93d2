//! Student directory handlers.

use super::{RecipientsResponse, StudentListQuery};
use crate::api::AppState;
use crate::error::Result;
use crate::types::{EntityRef, StudentId};
use axum::{
    Json,
    extract::{Path, Query, State},
};

/// GET /students - Students of a school, as candidates for cohort selection
#[utoipa::path(
    get,
    path = "/students",
    tag = "students",
    params(StudentListQuery),
    responses(
        (status = 200, description = "Students with their grade", body = Vec<EntityRef>),
        (status = 502, description = "Student directory unreachable")
    )
)]
pub async fn list_students(
    State(state): State<AppState>,
    Query(query): Query<StudentListQuery>,
) -> Result<Json<Vec<EntityRef>>> {
    Ok(Json(state.dispatcher.list_students(&query.school_id).await?))
}

/// GET /students/:student_id/recipients - Guardian addresses on file
#[utoipa::path(
    get,
    path = "/students/{student_id}/recipients",
    tag = "students",
    params(
        ("student_id" = String, Path, description = "Student identifier")
    ),
    responses(
        (status = 200, description = "Guardian addresses", body = RecipientsResponse),
        (status = 502, description = "Student directory unreachable")
    )
)]
pub async fn student_recipients(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<RecipientsResponse>> {
    let student_id = StudentId::from(student_id);
    let recipients = state.dispatcher.recipients_for(&student_id).await?;
    Ok(Json(RecipientsResponse {
        student_id,
        recipients,
    }))
}
