//! Error types for capability binding and provider resolution

use crate::capability::CapabilityKind;
use crate::config::ConfigError;
use ontic_domain::ExplanationKind;
use thiserror::Error;

/// Errors raised while discovering or looking up capabilities
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Capability absent where required, or multi-bound where single-valued
    #[error("{}", binding_message(.capability, .found))]
    ServiceBinding {
        /// Capability that could not be bound
        capability: CapabilityKind,
        /// Number of providers found
        found: usize,
    },

    /// A provider factory failed during discovery
    #[error("Registration of provider `{provider}` failed: {source}")]
    Registration {
        /// Catalog entry name
        provider: String,
        /// Factory error
        #[source]
        source: anyhow::Error,
    },

    /// The global registry was already initialized
    #[error("Capability registry is already initialized")]
    AlreadyInitialized,

    /// An earlier discovery failed; the registry stays unavailable
    #[error("Capability registry initialization failed earlier: {0}")]
    InitializationFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

fn binding_message(capability: &CapabilityKind, found: &usize) -> String {
    if *found == 0 {
        format!(
            "Could not find a service provider for {}",
            capability.service_name()
        )
    } else {
        format!(
            "Expected one service provider for {} but found {}",
            capability.service_name(),
            found
        )
    }
}

impl RegistryError {
    /// Binding error for a capability with no provider
    pub fn missing(capability: CapabilityKind) -> Self {
        RegistryError::ServiceBinding {
            capability,
            found: 0,
        }
    }
}

/// No single explanation provider could be selected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No specification was supplied
    #[error("Unsupported specification: no explanation specification given")]
    MissingSpecification,

    /// The specification declares no explanation kind
    #[error("Unsupported specification: {spec} declares no explanation kind")]
    MissingKind {
        /// Rendered specification
        spec: String,
    },

    /// No provider of the kind accepts the answer
    #[error("Unsupported specification: no {kind} provider accepts {spec}")]
    NoSuitableProvider {
        /// Requested kind
        kind: ExplanationKind,
        /// Rendered specification
        spec: String,
    },

    /// More than one provider accepts; the registry is misconfigured
    #[error("Ambiguous {kind} providers: {}", .providers.join(", "))]
    Ambiguous {
        /// Requested kind
        kind: ExplanationKind,
        /// Names of every accepting provider
        providers: Vec<String>,
    },
}
