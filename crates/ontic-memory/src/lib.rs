//! Ontic in-memory backend
//!
//! A knowledge base, session service, scripted inference engine and
//! explanation providers held entirely in memory. It binds every capability
//! the registry knows about, which makes it the backend of choice for tests
//! and local experiments.
//!
//! # Providers
//!
//! | Name | Capability |
//! |------|------------|
//! | `memory-kb` | knowledge objects and assertions |
//! | `memory-queries` | stored query specifications |
//! | `memory-sessions` | sessions and the inference channel |
//! | `memory-proof-view` | proof views for answers with a proof |
//! | `memory-support-set` | support sets for any answer |
//!
//! # Examples
//!
//! ```
//! use ontic_memory::MemoryBackend;
//! use ontic_registry::{CapabilityKind, CapabilityRegistry, RegistryConfig};
//!
//! let backend = MemoryBackend::new();
//! let registry =
//!     CapabilityRegistry::discover(&backend.providers(), &RegistryConfig::strict()).unwrap();
//! assert_eq!(registry.provider_count(CapabilityKind::ExplanationGenerators), 2);
//! ```

#![warn(missing_docs)]

mod backend;
mod explain;
mod fixture;
mod script;

use ontic_domain::traits::{
    ExplanationService, KbApiService, QueryApiService, SessionApiService,
};
use ontic_domain::{BackendError, ConstructionError};
use ontic_registry::ProviderCatalog;
use std::sync::Arc;
use thiserror::Error;

pub use backend::{MemoryBackend, MemorySession, BUILTIN_CONTEXTS, FORWARD_DEDUCED_REASON};
pub use explain::{MemoryProofViewService, MemorySupportSetService, BOOKKEEPING_PREDICATES};
pub use fixture::{FactFixture, MemoryFixture, QueryFixture, TermFixture};
pub use script::{InferenceScript, ScriptedAnswer};

/// Errors that can occur while seeding a backend
#[derive(Error, Debug)]
pub enum MemoryError {
    /// Fixture file could not be read
    #[error("Failed to read fixture: {0}")]
    FileRead(#[from] std::io::Error),

    /// Fixture is not valid TOML
    #[error("Failed to parse fixture: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Fixture entry is not a valid KB object
    #[error("Invalid fixture entry: {0}")]
    Construction(#[from] ConstructionError),

    /// Backend refused a fixture entry
    #[error("Backend rejected fixture entry: {0}")]
    Backend(#[from] BackendError),
}

impl MemoryBackend {
    /// Catalog binding this backend to every capability
    pub fn providers(&self) -> ProviderCatalog {
        let mut catalog = ProviderCatalog::new();
        catalog
            .register_instance::<dyn KbApiService>("memory-kb", Arc::new(self.clone()))
            .register_instance::<dyn QueryApiService>("memory-queries", Arc::new(self.clone()))
            .register_instance::<dyn SessionApiService>("memory-sessions", Arc::new(self.clone()))
            .register_instance::<dyn ExplanationService>(
                "memory-proof-view",
                Arc::new(MemoryProofViewService::new(self.clone())),
            )
            .register_instance::<dyn ExplanationService>(
                "memory-support-set",
                Arc::new(MemorySupportSetService::new(self.clone())),
            );
        catalog
    }
}
