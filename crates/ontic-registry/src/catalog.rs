//! Provider catalog - the explicit, build-time list of service factories
//!
//! Backends contribute named factories here instead of being found by
//! runtime scanning. Factories run once, during registry discovery.

use crate::capability::{BoundService, CapabilityKind, ServiceCapability};
use std::fmt;
use std::sync::Arc;

type ErasedFactory = Box<dyn Fn() -> anyhow::Result<BoundService> + Send + Sync>;

/// One named provider factory
pub struct ProviderEntry {
    name: String,
    kind: CapabilityKind,
    factory: ErasedFactory,
}

impl ProviderEntry {
    /// Provider name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Capability the provider binds to
    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    /// Construct the provider
    pub fn instantiate(&self) -> anyhow::Result<BoundService> {
        (self.factory)()
    }
}

impl fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Ordered list of provider factories; order is discovery order
#[derive(Debug, Default)]
pub struct ProviderCatalog {
    entries: Vec<ProviderEntry>,
}

impl ProviderCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for a capability
    ///
    /// # Examples
    ///
    /// ```
    /// use ontic_registry::ProviderCatalog;
    /// use ontic_domain::traits::SessionApiService;
    ///
    /// let mut catalog = ProviderCatalog::new();
    /// catalog.register::<dyn SessionApiService, _>("broken", || {
    ///     Err(anyhow::anyhow!("no backend configured"))
    /// });
    /// assert_eq!(catalog.len(), 1);
    /// ```
    pub fn register<T, F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        T: ServiceCapability + ?Sized,
        F: Fn() -> anyhow::Result<Arc<T>> + Send + Sync + 'static,
    {
        self.entries.push(ProviderEntry {
            name: name.into(),
            kind: T::KIND,
            factory: Box::new(move || factory().map(T::bind)),
        });
        self
    }

    /// Register a provider that already exists
    pub fn register_instance<T>(&mut self, name: impl Into<String>, service: Arc<T>) -> &mut Self
    where
        T: ServiceCapability + ?Sized,
    {
        self.register::<T, _>(name, move || Ok(Arc::clone(&service)))
    }

    /// Builder form of [`register_instance`](Self::register_instance)
    pub fn with_instance<T>(mut self, name: impl Into<String>, service: Arc<T>) -> Self
    where
        T: ServiceCapability + ?Sized,
    {
        self.register_instance(name, service);
        self
    }

    /// Append every entry of another catalog
    pub fn extend(&mut self, other: ProviderCatalog) -> &mut Self {
        self.entries.extend(other.entries);
        self
    }

    /// Entries in discovery order
    pub fn entries(&self) -> &[ProviderEntry] {
        &self.entries
    }

    /// Provider names in discovery order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
