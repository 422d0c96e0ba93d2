//! Batch generation handler.

use super::GenerateReportsBody;
use crate::api::AppState;
use crate::error::Result;
use crate::types::{GenerationReport, GenerationRequest};
use axum::{Json, extract::State};

/// POST /reports/generate - Generate artifacts for a cohort
#[utoipa::path(
    post,
    path = "/reports/generate",
    tag = "reports",
    request_body = GenerateReportsBody,
    responses(
        (status = 200, description = "Per-student results, summary and refreshed artifact list", body = GenerationReport),
        (status = 400, description = "Empty selection or missing term/school"),
        (status = 502, description = "Document generator unreachable")
    )
)]
pub async fn generate_reports(
    State(state): State<AppState>,
    Json(body): Json<GenerateReportsBody>,
) -> Result<Json<GenerationReport>> {
    let report = match body.selection {
        Some(selection) => {
            state
                .dispatcher
                .generate_for_selection(&body.term, &body.school_id, body.report_kind, &selection)
                .await?
        }
        None => {
            state
                .dispatcher
                .generate_reports(GenerationRequest {
                    term: body.term,
                    school_id: body.school_id,
                    report_kind: body.report_kind,
                    student_ids: body.student_ids,
                })
                .await?
        }
    };

    Ok(Json(report))
}
