//! Core orchestrator split into focused submodules.
//!
//! The `ReportDispatcher` struct and its methods are organized by domain:
//! - [`generation`]: batch generation and result partitioning
//! - [`artifacts`]: artifact listing, access URLs and deletion
//! - [`delivery`]: one email for one student (shared by single and bulk sends)
//! - [`single`]: single-student distribution
//! - [`bulk`]: bulk distribution with per-student isolation
//! - [`history`]: email history and student directory queries

mod artifacts;
mod bulk;
mod delivery;
mod generation;
mod history;
mod single;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::backend::{
    ArtifactRegistry, DocumentGenerator, EmailHistoryStore, EntityDirectory, RestBackend,
};
use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::mailer::{Mailer, NoOpMailer, SmtpMailer};
use crate::types::{EmailStatus, Event, StudentId};
use std::sync::Arc;

/// External collaborators used by a [`ReportDispatcher`]
///
/// [`ReportDispatcher::new`] wires the production adapters; hosts and tests
/// can assemble their own set and call [`ReportDispatcher::with_services`].
#[derive(Clone)]
pub struct Services {
    /// Document generator
    pub generator: Arc<dyn DocumentGenerator>,
    /// Artifact registry
    pub registry: Arc<dyn ArtifactRegistry>,
    /// Student and guardian directory
    pub directory: Arc<dyn EntityDirectory>,
    /// Outgoing mail transport
    pub mailer: Arc<dyn Mailer>,
    /// Append-only email history
    pub history: Arc<dyn EmailHistoryStore>,
}

/// Main orchestrator instance (cloneable - all fields are Arc-wrapped)
///
/// Holds no mutable state of its own: artifacts, history and flags live in
/// the external collaborators.
#[derive(Clone)]
pub struct ReportDispatcher {
    pub(crate) generator: Arc<dyn DocumentGenerator>,
    pub(crate) registry: Arc<dyn ArtifactRegistry>,
    pub(crate) directory: Arc<dyn EntityDirectory>,
    pub(crate) mailer: Arc<dyn Mailer>,
    pub(crate) history: Arc<dyn EmailHistoryStore>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
}

impl ReportDispatcher {
    /// Create a dispatcher wired to the production adapters
    ///
    /// - Validates the configuration
    /// - Builds the REST client for generator, registry and directory
    /// - Uses SMTP when configured, otherwise a mailer that refuses every send
    /// - Opens/creates the SQLite history database and runs migrations
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let backend = Arc::new(RestBackend::new(&config.backend)?);

        let mailer: Arc<dyn Mailer> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpMailer::new(smtp, config.email.attachment_timeout)?),
            None => Arc::new(NoOpMailer),
        };
        tracing::info!(mailer = mailer.name(), "Mailer initialized");

        let db = Database::new(&config.persistence.database_path).await?;

        let services = Services {
            generator: backend.clone(),
            registry: backend.clone(),
            directory: backend,
            mailer,
            history: Arc::new(db),
        };

        Ok(Self::with_services(config, services))
    }

    /// Create a dispatcher from explicitly supplied collaborators
    pub fn with_services(config: Config, services: Services) -> Self {
        // Buffer of 1000 events; slow subscribers see RecvError::Lagged
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        Self {
            generator: services.generator,
            registry: services.registry,
            directory: services.directory,
            mailer: services.mailer,
            history: services.history,
            event_tx,
            config: Arc::new(config),
        }
    }

    /// Subscribe to orchestrator events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events independently.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use report_dispatch::{Config, ReportDispatcher};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let dispatcher = ReportDispatcher::new(Config::default()).await?;
    ///
    ///     let mut events = dispatcher.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             tracing::info!(?event, "dispatch event");
    ///         }
    ///     });
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Name of the active mail transport ("smtp", "noop", ...)
    pub fn mailer_name(&self) -> &'static str {
        self.mailer.name()
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers the event is dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    pub(crate) fn emit_status(
        &self,
        student_id: &StudentId,
        status: EmailStatus,
        reason: Option<String>,
    ) {
        self.emit_event(Event::EmailStatusChanged {
            student_id: student_id.clone(),
            status,
            reason,
        });
    }

    /// Spawn the REST API server in a background task
    pub fn spawn_api_server(&self) -> tokio::task::JoinHandle<Result<()>> {
        let dispatcher = Arc::new(self.clone());
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(dispatcher, config).await })
    }
}
