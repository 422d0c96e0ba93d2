//! Artifact handlers.

use super::{ArtifactListQuery, ArtifactPathQuery, ArtifactUrlResponse};
use crate::api::AppState;
use crate::error::Result;
use crate::types::ArtifactRecord;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};

/// GET /artifacts - List generated artifacts for a term
#[utoipa::path(
    get,
    path = "/artifacts",
    tag = "artifacts",
    params(ArtifactListQuery),
    responses(
        (status = 200, description = "Artifacts for the term and school", body = Vec<ArtifactRecord>),
        (status = 502, description = "Artifact registry unreachable")
    )
)]
pub async fn list_artifacts(
    State(state): State<AppState>,
    Query(query): Query<ArtifactListQuery>,
) -> Result<Json<Vec<ArtifactRecord>>> {
    let artifacts = state
        .dispatcher
        .list_artifacts(&query.term, &query.school_id)
        .await?;
    Ok(Json(artifacts))
}

/// GET /artifacts/url - Resolve a fresh time-limited access URL
#[utoipa::path(
    get,
    path = "/artifacts/url",
    tag = "artifacts",
    params(ArtifactPathQuery),
    responses(
        (status = 200, description = "Access URL", body = ArtifactUrlResponse),
        (status = 404, description = "Artifact not found")
    )
)]
pub async fn artifact_url(
    State(state): State<AppState>,
    Query(query): Query<ArtifactPathQuery>,
) -> Result<Json<ArtifactUrlResponse>> {
    let url = state.dispatcher.artifact_url(&query.path).await?;
    Ok(Json(ArtifactUrlResponse { url }))
}

/// DELETE /artifacts - Delete an artifact (email history is kept)
#[utoipa::path(
    delete,
    path = "/artifacts",
    tag = "artifacts",
    params(ArtifactPathQuery),
    responses(
        (status = 204, description = "Artifact deleted"),
        (status = 404, description = "Artifact not found")
    )
)]
pub async fn delete_artifact(
    State(state): State<AppState>,
    Query(query): Query<ArtifactPathQuery>,
) -> Result<StatusCode> {
    state.dispatcher.delete_artifact(&query.path).await?;
    Ok(StatusCode::NO_CONTENT)
}
