//! Distribution and email history handlers.

use super::TermHistoryQuery;
use crate::api::AppState;
use crate::error::Result;
use crate::types::{
    BulkEmailReport, BulkEmailRequest, EmailHistoryRecord, EmailResult, SingleEmailRequest,
    StudentId,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};

/// POST /emails/send - Email one student's artifact
#[utoipa::path(
    post,
    path = "/emails/send",
    tag = "emails",
    request_body = SingleEmailRequest,
    responses(
        (status = 200, description = "Outcome of the attempt (sent or failed)", body = EmailResult),
        (status = 400, description = "Missing fields or malformed addresses"),
        (status = 404, description = "Student or artifact not found")
    )
)]
pub async fn send_email(
    State(state): State<AppState>,
    Json(request): Json<SingleEmailRequest>,
) -> Result<Json<EmailResult>> {
    Ok(Json(state.dispatcher.send_report_email(request).await?))
}

/// POST /emails/bulk - Email many students' artifacts to their guardians
#[utoipa::path(
    post,
    path = "/emails/bulk",
    tag = "emails",
    request_body = BulkEmailRequest,
    responses(
        (status = 200, description = "Per-student outcomes and summary", body = BulkEmailReport),
        (status = 400, description = "Empty list, missing fields or malformed shared CC"),
        (status = 502, description = "Artifact registry unreachable")
    )
)]
pub async fn send_bulk_emails(
    State(state): State<AppState>,
    Json(request): Json<BulkEmailRequest>,
) -> Result<Json<BulkEmailReport>> {
    Ok(Json(state.dispatcher.send_bulk_emails(request).await?))
}

/// GET /emails/history/:student_id - Email history for one student
#[utoipa::path(
    get,
    path = "/emails/history/{student_id}",
    tag = "emails",
    params(
        ("student_id" = String, Path, description = "Student identifier")
    ),
    responses(
        (status = 200, description = "History records, newest first", body = Vec<EmailHistoryRecord>)
    )
)]
pub async fn student_email_history(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<Vec<EmailHistoryRecord>>> {
    let records = state
        .dispatcher
        .email_history_for_student(&StudentId::from(student_id))
        .await?;
    Ok(Json(records))
}

/// GET /emails/history - Email history for one term
#[utoipa::path(
    get,
    path = "/emails/history",
    tag = "emails",
    params(TermHistoryQuery),
    responses(
        (status = 200, description = "History records, newest first", body = Vec<EmailHistoryRecord>)
    )
)]
pub async fn term_email_history(
    State(state): State<AppState>,
    Query(query): Query<TermHistoryQuery>,
) -> Result<Json<Vec<EmailHistoryRecord>>> {
    Ok(Json(
        state.dispatcher.email_history_for_term(&query.term).await?,
    ))
}
