//! OpenAPI documentation and schema generation

use utoipa::OpenApi;

/// OpenAPI documentation for the report-dispatch REST API
///
/// Served as JSON at `/openapi.json` and rendered at `/swagger-ui` when
/// enabled.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "report-dispatch REST API",
        version = "0.1.0",
        description = "Generate student report documents in batches and distribute them to guardians by email",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:6790", description = "Local development server")
    ),
    paths(
        // Generation
        crate::api::routes::generate_reports,

        // Artifacts
        crate::api::routes::list_artifacts,
        crate::api::routes::artifact_url,
        crate::api::routes::delete_artifact,

        // Distribution and history
        crate::api::routes::send_email,
        crate::api::routes::send_bulk_emails,
        crate::api::routes::student_email_history,
        crate::api::routes::term_email_history,

        // Directory
        crate::api::routes::list_students,
        crate::api::routes::student_recipients,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        crate::types::StudentId,
        crate::types::EntityRef,
        crate::types::ReportKind,
        crate::types::GenerationStatus,
        crate::types::GenerationResult,
        crate::types::JobSummary,
        crate::types::GenerationReport,
        crate::types::ArtifactRecord,
        crate::types::EmailStatus,
        crate::types::EmailResult,
        crate::types::SingleEmailRequest,
        crate::types::BulkEmailRequest,
        crate::types::BulkEmailSummary,
        crate::types::BulkEmailReport,
        crate::types::EmailHistoryRecord,
        crate::types::Event,

        crate::cohort::CohortSelection,
        crate::cohort::SelectionMode,

        crate::api::routes::GenerateReportsBody,
        crate::api::routes::ArtifactUrlResponse,
        crate::api::routes::RecipientsResponse,

        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "reports", description = "Batch generation of report documents"),
        (name = "artifacts", description = "Generated documents: listing, access URLs, deletion"),
        (name = "emails", description = "Single and bulk distribution, email history"),
        (name = "students", description = "Student directory and guardian addresses"),
        (name = "system", description = "Health check, OpenAPI spec, event stream"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Registers the `X-Api-Key` header scheme
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "api_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new("X-Api-Key"),
                    ),
                ),
            );
        }
    }
}
