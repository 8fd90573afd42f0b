//! Ontic Capability Registry
//!
//! Binds backend providers to the abstract capabilities the query layer
//! consumes, and selects explanation providers by kind and suitability.
//!
//! Providers are listed explicitly in a [`ProviderCatalog`] at startup.
//! [`CapabilityRegistry::discover`] instantiates each enabled entry once; the
//! [`global`] module keeps one registry for the whole process.
//!
//! # Examples
//!
//! ```
//! use ontic_registry::{CapabilityRegistry, ProviderCatalog, RegistryConfig};
//!
//! let registry =
//!     CapabilityRegistry::discover(&ProviderCatalog::new(), &RegistryConfig::default()).unwrap();
//! assert!(registry.session_api_service(true).unwrap().is_none());
//! assert!(registry.session_api_service(false).is_err());
//! ```

#![warn(missing_docs)]

pub mod capability;
pub mod catalog;
pub mod config;
pub mod error;
pub mod global;
pub mod registry;
pub mod resolver;

pub use capability::{BoundService, CapabilityKind, ServiceCapability};
pub use catalog::{ProviderCatalog, ProviderEntry};
pub use config::{ConfigError, RegistryConfig};
pub use error::{RegistryError, ResolveError};
pub use registry::CapabilityRegistry;
pub use resolver::ServiceResolver;
