//! Capability registry binding discovered providers to capabilities.
//!
//! Discovery runs once per registry: every enabled catalog entry is
//! instantiated in catalog order and bound to its capability. A failing
//! factory aborts discovery, so a partially populated registry is never
//! returned. After construction the registry is immutable.

use crate::capability::{BoundService, CapabilityKind, ServiceCapability};
use crate::catalog::ProviderCatalog;
use crate::config::RegistryConfig;
use crate::error::RegistryError;
use ontic_domain::traits::{ExplanationService, KbApiService, QueryApiService, SessionApiService};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A provider bound to a capability
#[derive(Debug, Clone)]
struct Binding {
    name: String,
    service: BoundService,
}

/// Immutable map from capability to the providers bound to it
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    bindings: BTreeMap<CapabilityKind, Vec<Binding>>,
}

impl CapabilityRegistry {
    /// Registry with no providers
    pub fn empty() -> Self {
        Self::default()
    }

    /// Run discovery over a catalog
    ///
    /// # Errors
    ///
    /// * `Registration` when any enabled factory fails
    /// * `ServiceBinding` when a capability marked required in `config` ends
    ///   up unbound
    pub fn discover(
        catalog: &ProviderCatalog,
        config: &RegistryConfig,
    ) -> Result<Self, RegistryError> {
        let mut bindings: BTreeMap<CapabilityKind, Vec<Binding>> = BTreeMap::new();

        for entry in catalog.entries() {
            if config.is_disabled(entry.name()) {
                info!("Provider {} disabled by configuration", entry.name());
                continue;
            }

            let service = entry
                .instantiate()
                .map_err(|source| RegistryError::Registration {
                    provider: entry.name().to_string(),
                    source,
                })?;

            debug!("Bound provider {} to {}", entry.name(), entry.kind());
            bindings.entry(entry.kind()).or_default().push(Binding {
                name: entry.name().to_string(),
                service,
            });
        }

        let registry = Self { bindings };

        for kind in &config.required {
            if registry.provider_count(*kind) == 0 {
                return Err(RegistryError::missing(*kind));
            }
        }

        for kind in CapabilityKind::ALL {
            if registry.provider_count(kind) == 0 {
                warn!("No provider bound for {}", kind);
            }
        }

        info!(
            "Capability registry initialized: {} providers across {} capabilities",
            registry.total_providers(),
            registry.capability_count()
        );

        Ok(registry)
    }

    /// The single provider bound to `T`'s capability
    ///
    /// Returns `Ok(None)` when nothing is bound and `allow_missing` is set.
    ///
    /// # Errors
    ///
    /// `ServiceBinding` when nothing is bound and `allow_missing` is not set,
    /// or when a single-valued capability has more than one provider.
    pub fn get_service<T>(&self, allow_missing: bool) -> Result<Option<Arc<T>>, RegistryError>
    where
        T: ServiceCapability + ?Sized,
    {
        let mut services = self.get_services::<T>(allow_missing)?;
        if T::KIND.is_single_valued() && services.len() > 1 {
            return Err(RegistryError::ServiceBinding {
                capability: T::KIND,
                found: services.len(),
            });
        }
        if services.is_empty() {
            return Ok(None);
        }
        Ok(Some(services.swap_remove(0)))
    }

    /// Every provider bound to `T`'s capability, in discovery order
    ///
    /// # Errors
    ///
    /// `ServiceBinding` when nothing is bound and `allow_missing` is not set.
    pub fn get_services<T>(&self, allow_missing: bool) -> Result<Vec<Arc<T>>, RegistryError>
    where
        T: ServiceCapability + ?Sized,
    {
        let services: Vec<Arc<T>> = self
            .bindings
            .get(&T::KIND)
            .map(|bound| bound.iter().filter_map(|b| T::unbind(&b.service)).collect())
            .unwrap_or_default();

        if services.is_empty() && !allow_missing {
            return Err(RegistryError::missing(T::KIND));
        }
        Ok(services)
    }

    /// Knowledge-object capability
    pub fn kb_api_service(
        &self,
        allow_missing: bool,
    ) -> Result<Option<Arc<dyn KbApiService>>, RegistryError> {
        self.get_service::<dyn KbApiService>(allow_missing)
    }

    /// Stored-query capability
    pub fn query_api_service(
        &self,
        allow_missing: bool,
    ) -> Result<Option<Arc<dyn QueryApiService>>, RegistryError> {
        self.get_service::<dyn QueryApiService>(allow_missing)
    }

    /// Session capability
    pub fn session_api_service(
        &self,
        allow_missing: bool,
    ) -> Result<Option<Arc<dyn SessionApiService>>, RegistryError> {
        self.get_service::<dyn SessionApiService>(allow_missing)
    }

    /// Every explanation provider
    pub fn explanation_services(
        &self,
        allow_missing: bool,
    ) -> Result<Vec<Arc<dyn ExplanationService>>, RegistryError> {
        self.get_services::<dyn ExplanationService>(allow_missing)
    }

    /// Check every single-valued capability for multiple bindings.
    ///
    /// Reports all problems instead of stopping at the first one.
    pub fn validate(&self) -> Vec<RegistryError> {
        self.bindings
            .iter()
            .filter(|(kind, bound)| kind.is_single_valued() && bound.len() > 1)
            .map(|(kind, bound)| RegistryError::ServiceBinding {
                capability: *kind,
                found: bound.len(),
            })
            .collect()
    }

    /// Names of the providers bound to a capability, in discovery order
    pub fn provider_names(&self, kind: CapabilityKind) -> Vec<&str> {
        self.bindings
            .get(&kind)
            .map(|bound| bound.iter().map(|b| b.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Number of providers bound to a capability
    pub fn provider_count(&self, kind: CapabilityKind) -> usize {
        self.bindings.get(&kind).map_or(0, Vec::len)
    }

    /// Number of capabilities with at least one provider
    pub fn capability_count(&self) -> usize {
        self.bindings.values().filter(|b| !b.is_empty()).count()
    }

    fn total_providers(&self) -> usize {
        self.bindings.values().map(Vec::len).sum()
    }
}
