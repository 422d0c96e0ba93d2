//! REST API server module
//!
//! Exposes generation, artifact management and email distribution over HTTP
//! with an OpenAPI description and a server-sent event stream.

use crate::{Config, ReportDispatcher, Result};
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Generation
/// - `POST /reports/generate` - Generate documents for ids or a cohort selection
///
/// ## Artifacts
/// - `GET /artifacts?term=&school_id=` - List generated documents
/// - `GET /artifacts/url?path=` - Fresh time-limited access URL
/// - `DELETE /artifacts?path=` - Delete a document (history is kept)
///
/// ## Distribution
/// - `POST /emails/send` - Email one student's document
/// - `POST /emails/bulk` - Email many students' documents to their guardians
/// - `GET /emails/history/:student_id` - History for one student
/// - `GET /emails/history?term=` - History for one term
///
/// ## Directory
/// - `GET /students?school_id=` - Students available for selection
/// - `GET /students/:student_id/recipients` - Guardian addresses on file
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /events` - Server-sent events stream
/// - `GET /swagger-ui` - Interactive documentation (if enabled)
pub fn create_router(dispatcher: Arc<ReportDispatcher>, config: Arc<Config>) -> Router {
    let state = AppState::new(dispatcher, config.clone());

    let router = Router::new()
        // Generation
        .route("/reports/generate", post(routes::generate_reports))
        // Artifacts
        .route(
            "/artifacts",
            get(routes::list_artifacts).delete(routes::delete_artifact),
        )
        .route("/artifacts/url", get(routes::artifact_url))
        // Distribution
        .route("/emails/send", post(routes::send_email))
        .route("/emails/bulk", post(routes::send_bulk_emails))
        .route("/emails/history", get(routes::term_email_history))
        .route(
            "/emails/history/:student_id",
            get(routes::student_email_history),
        )
        // Directory
        .route("/students", get(routes::list_students))
        .route(
            "/students/:student_id/recipients",
            get(routes::student_recipients),
        )
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .route("/events", get(routes::event_stream));

    // Swagger UI reuses the spec served above
    let router = if config.server.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state);

    let router = if config.server.api.api_key.is_some() {
        router.layer(middleware::from_fn_with_state(
            config.server.api.api_key.clone(),
            auth::require_api_key,
        ))
    } else {
        router
    };

    let router = router.layer(TraceLayer::new_for_http());

    if config.server.api.cors_enabled {
        router.layer(build_cors_layer(&config.server.api.cors_origins))
    } else {
        router
    }
}

/// Build a CORS layer from configured origins ("*" or an empty list allows any)
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Serve the API on the configured bind address until the server stops
///
/// # Example
///
/// ```no_run
/// use report_dispatch::{Config, ReportDispatcher};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let dispatcher = Arc::new(ReportDispatcher::new((*config).clone()).await?);
///
/// report_dispatch::api::start_api_server(dispatcher, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(
    dispatcher: Arc<ReportDispatcher>,
    config: Arc<Config>,
) -> Result<()> {
    let bind_address = config.server.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(dispatcher, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
