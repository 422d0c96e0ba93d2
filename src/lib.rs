//! # report-dispatch
//!
//! Batch generation and email distribution of per-student school documents
//! (report cards, progress reports).
//!
//! The crate orchestrates three external collaborators behind traits (a
//! document generator, an artifact registry and a student directory) plus a
//! mail transport, and keeps its own append-only email history in SQLite.
//!
//! - **Partial failure is normal** - every batch reports per-student outcomes
//! - **Isolation** - one student's bad address never affects a sibling
//! - **Event-driven** - consumers subscribe to progress events
//!
//! ## Quick Start
//!
//! ```no_run
//! use report_dispatch::{Config, GenerationRequest, ReportDispatcher, ReportKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = ReportDispatcher::new(Config::default()).await?;
//!
//!     let report = dispatcher
//!         .generate_reports(GenerationRequest {
//!             term: "Fall 2025".to_string(),
//!             school_id: "school-1".to_string(),
//!             report_kind: ReportKind::ReportCard,
//!             student_ids: vec!["s1".into(), "s2".into()],
//!         })
//!         .await?;
//!
//!     println!("{}", report.message);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Backend adapters: generator, registry, directory
pub mod backend;
/// Cohort selection
pub mod cohort;
/// Configuration types
pub mod config;
/// Email history persistence
pub mod db;
/// Core orchestrator (decomposed into focused submodules)
pub mod dispatcher;
/// Address validation and email content composition
pub mod email;
/// Error types
pub mod error;
/// Mail transports
pub mod mailer;
/// Generation job summaries
pub mod summary;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use backend::{ArtifactRegistry, DocumentGenerator, EmailHistoryStore, EntityDirectory};
pub use cohort::{CohortSelection, SelectionCommand, SelectionMode};
pub use config::Config;
pub use db::Database;
pub use dispatcher::{ReportDispatcher, Services};
pub use error::{ApiError, DatabaseError, Error, ErrorDetail, Result, ToHttpStatus, ValidationError};
pub use mailer::{DeliveryReport, Mailer, NoOpMailer, OutgoingEmail, SmtpMailer};
pub use types::{
    ArtifactRecord, BulkEmailReport, BulkEmailRequest, BulkEmailSummary, EmailHistoryRecord,
    EmailResult, EmailStatus, EntityRef, Event, GenerationReport, GenerationRequest,
    GenerationResult, GenerationStatus, JobSummary, ReportKind, SingleEmailRequest, StudentId,
};

/// Serve the REST API until a termination signal arrives.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// Returns early with the server's error if it stops on its own.
///
/// # Example
///
/// ```no_run
/// use report_dispatch::{Config, ReportDispatcher, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let dispatcher = ReportDispatcher::new(Config::default()).await?;
///     run_with_shutdown(dispatcher).await?;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(dispatcher: ReportDispatcher) -> Result<()> {
    let mut server = dispatcher.spawn_api_server();

    tokio::select! {
        _ = wait_for_signal() => {
            tracing::info!("Shutting down API server");
            server.abort();
            Ok(())
        }
        joined = &mut server => match joined {
            Ok(result) => result,
            Err(e) => Err(Error::ApiServerError(e.to_string())),
        },
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM signal"),
                _ = sigint.recv() => tracing::info!("Received SIGINT signal (Ctrl+C)"),
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C signal"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C signal"),
    }
}
