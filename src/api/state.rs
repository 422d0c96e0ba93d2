//! Application state for the API server

use crate::{Config, ReportDispatcher};
use std::sync::Arc;

/// Shared state handed to every route handler
#[derive(Clone)]
pub struct AppState {
    /// The orchestrator handling every request
    pub dispatcher: Arc<ReportDispatcher>,

    /// Configuration the router was built from
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(dispatcher: Arc<ReportDispatcher>, config: Arc<Config>) -> Self {
        Self { dispatcher, config }
    }
}
