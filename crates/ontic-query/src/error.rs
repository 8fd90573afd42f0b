//! Error types for query lifecycle operations

use crate::query::QueryId;
use ontic_domain::{BackendError, ConstructionError};
use ontic_registry::{RegistryError, ResolveError};
use thiserror::Error;

/// Errors that can occur while building, running or explaining queries
#[derive(Error, Debug)]
pub enum QueryError {
    /// Malformed query specification
    #[error("Construction error: {0}")]
    Construction(#[from] ConstructionError),

    /// Capability binding error
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// No explanation provider accepts the specification
    #[error(transparent)]
    UnsupportedSpecification(#[from] ResolveError),

    /// Backend failure, including remote-unavailable and deletion refusal
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Operation needs a started query
    #[error("Query {0} has not been started")]
    NotStarted(QueryId),

    /// Operation needs an open query
    #[error("Query {0} is closed")]
    Closed(QueryId),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl QueryError {
    /// Whether the backend or session could not be reached
    pub fn is_remote_unavailable(&self) -> bool {
        matches!(self, QueryError::Backend(e) if e.is_unavailable())
    }
}
