//! School backend integration
//!
//! Trait definitions for the generator, artifact registry, student directory
//! and history store, plus [`RestBackend`], the JSON/HTTP adapter for the first
//! three.

mod http;
mod traits;

pub use http::RestBackend;
pub use traits::{ArtifactRegistry, DocumentGenerator, EmailHistoryStore, EntityDirectory};
