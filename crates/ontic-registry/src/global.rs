//! Process-wide capability registry.
//!
//! The registry is built lazily on first access from the catalog handed to
//! [`configure`] (or an empty catalog when none was configured). Building
//! happens under one guard, so concurrent first callers all observe the same
//! fully initialized registry. Discovery runs at most once: a failure is
//! remembered and returned by every later access. Neither a published
//! registry nor a failure can be replaced, except through the test-only
//! [`reset`].

use crate::catalog::ProviderCatalog;
use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::registry::CapabilityRegistry;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{error, info};

/// Catalog waiting for the first access
struct PendingDiscovery {
    catalog: ProviderCatalog,
    config: RegistryConfig,
}

/// Initialization state behind the guard
enum Init {
    Unconfigured,
    Pending(PendingDiscovery),
    Failed(String),
    Ready,
}

/// Published registry; read-mostly after initialization
static REGISTRY: RwLock<Option<Arc<CapabilityRegistry>>> = RwLock::new(None);

/// Initialization guard
static INIT: Mutex<Init> = Mutex::new(Init::Unconfigured);

fn published() -> Option<Arc<CapabilityRegistry>> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Set the catalog and configuration used by the first access
///
/// # Errors
///
/// `AlreadyInitialized` once discovery has run, whether it succeeded or not.
pub fn configure(catalog: ProviderCatalog, config: RegistryConfig) -> Result<(), RegistryError> {
    let mut init = INIT.lock().unwrap_or_else(PoisonError::into_inner);
    if matches!(*init, Init::Failed(_) | Init::Ready) {
        return Err(RegistryError::AlreadyInitialized);
    }
    *init = Init::Pending(PendingDiscovery { catalog, config });
    Ok(())
}

/// Configure and build the registry immediately
pub fn install(
    catalog: ProviderCatalog,
    config: RegistryConfig,
) -> Result<Arc<CapabilityRegistry>, RegistryError> {
    configure(catalog, config)?;
    global()
}

/// The process-wide registry, building it on first access
///
/// # Errors
///
/// The discovery error on the access that ran discovery, then
/// `InitializationFailed` on every later access. Nothing is published and
/// no factory runs again.
pub fn global() -> Result<Arc<CapabilityRegistry>, RegistryError> {
    if let Some(registry) = published() {
        return Ok(registry);
    }

    let mut init = INIT.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(registry) = published() {
        return Ok(registry);
    }

    let registry = match std::mem::replace(&mut *init, Init::Ready) {
        Init::Pending(p) => match CapabilityRegistry::discover(&p.catalog, &p.config) {
            Ok(registry) => registry,
            Err(err) => {
                error!("Capability registry initialization failed: {}", err);
                *init = Init::Failed(err.to_string());
                return Err(err);
            }
        },
        Init::Failed(reason) => {
            let err = RegistryError::InitializationFailed(reason.clone());
            *init = Init::Failed(reason);
            return Err(err);
        }
        Init::Unconfigured | Init::Ready => {
            info!("No provider catalog configured; using an empty registry");
            CapabilityRegistry::empty()
        }
    };
    let registry = Arc::new(registry);

    *REGISTRY.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&registry));
    drop(init);
    Ok(registry)
}

/// Whether the registry has been built
pub fn is_initialized() -> bool {
    published().is_some()
}

/// Drop the published registry, any configured catalog and any failure
#[cfg(any(test, feature = "test-util"))]
pub fn reset() {
    let mut init = INIT.lock().unwrap_or_else(PoisonError::into_inner);
    *init = Init::Unconfigured;
    *REGISTRY.write().unwrap_or_else(PoisonError::into_inner) = None;
}
