//! Capability kinds and the typed binding of services to them

use ontic_domain::traits::{ExplanationService, KbApiService, QueryApiService, SessionApiService};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// An abstract service contract a backend may provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityKind {
    /// Knowledge-object factory and assertion store
    KnowledgeObjects,

    /// Stored query specifications
    Queries,

    /// Sessions and their inference channels
    Sessions,

    /// Explanation generators, keyed by explanation kind
    ExplanationGenerators,
}

impl CapabilityKind {
    /// Every capability kind
    pub const ALL: [CapabilityKind; 4] = [
        CapabilityKind::KnowledgeObjects,
        CapabilityKind::Queries,
        CapabilityKind::Sessions,
        CapabilityKind::ExplanationGenerators,
    ];

    /// Whether at most one provider may be bound
    pub fn is_single_valued(&self) -> bool {
        !matches!(self, CapabilityKind::ExplanationGenerators)
    }

    /// Name of the service type behind this capability
    pub fn service_name(&self) -> &'static str {
        match self {
            CapabilityKind::KnowledgeObjects => "KbApiService",
            CapabilityKind::Queries => "QueryApiService",
            CapabilityKind::Sessions => "SessionApiService",
            CapabilityKind::ExplanationGenerators => "ExplanationService",
        }
    }

    /// Configuration name
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::KnowledgeObjects => "knowledge-objects",
            CapabilityKind::Queries => "queries",
            CapabilityKind::Sessions => "sessions",
            CapabilityKind::ExplanationGenerators => "explanation-generators",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service_name())
    }
}

/// A provider instance bound to exactly one capability
#[derive(Clone)]
pub enum BoundService {
    /// Knowledge-object provider
    KnowledgeObjects(Arc<dyn KbApiService>),

    /// Stored-query provider
    Queries(Arc<dyn QueryApiService>),

    /// Session provider
    Sessions(Arc<dyn SessionApiService>),

    /// Explanation provider
    ExplanationGenerators(Arc<dyn ExplanationService>),
}

impl BoundService {
    /// Capability this service is bound to
    pub fn kind(&self) -> CapabilityKind {
        match self {
            BoundService::KnowledgeObjects(_) => CapabilityKind::KnowledgeObjects,
            BoundService::Queries(_) => CapabilityKind::Queries,
            BoundService::Sessions(_) => CapabilityKind::Sessions,
            BoundService::ExplanationGenerators(_) => CapabilityKind::ExplanationGenerators,
        }
    }
}

impl fmt::Debug for BoundService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundService({})", self.kind())
    }
}

/// A service trait that can be bound in the registry.
///
/// Implemented for the trait objects of every capability surface, so lookups
/// are written as `registry.get_service::<dyn SessionApiService>(true)`.
pub trait ServiceCapability: Send + Sync + 'static {
    /// Capability the service type belongs to
    const KIND: CapabilityKind;

    /// Wrap a provider for storage
    fn bind(service: Arc<Self>) -> BoundService;

    /// Recover a provider of this type
    fn unbind(bound: &BoundService) -> Option<Arc<Self>>;
}

impl ServiceCapability for dyn KbApiService {
    const KIND: CapabilityKind = CapabilityKind::KnowledgeObjects;

    fn bind(service: Arc<Self>) -> BoundService {
        BoundService::KnowledgeObjects(service)
    }

    fn unbind(bound: &BoundService) -> Option<Arc<Self>> {
        match bound {
            BoundService::KnowledgeObjects(service) => Some(Arc::clone(service)),
            _ => None,
        }
    }
}

impl ServiceCapability for dyn QueryApiService {
    const KIND: CapabilityKind = CapabilityKind::Queries;

    fn bind(service: Arc<Self>) -> BoundService {
        BoundService::Queries(service)
    }

    fn unbind(bound: &BoundService) -> Option<Arc<Self>> {
        match bound {
            BoundService::Queries(service) => Some(Arc::clone(service)),
            _ => None,
        }
    }
}

impl ServiceCapability for dyn SessionApiService {
    const KIND: CapabilityKind = CapabilityKind::Sessions;

    fn bind(service: Arc<Self>) -> BoundService {
        BoundService::Sessions(service)
    }

    fn unbind(bound: &BoundService) -> Option<Arc<Self>> {
        match bound {
            BoundService::Sessions(service) => Some(Arc::clone(service)),
            _ => None,
        }
    }
}

impl ServiceCapability for dyn ExplanationService {
    const KIND: CapabilityKind = CapabilityKind::ExplanationGenerators;

    fn bind(service: Arc<Self>) -> BoundService {
        BoundService::ExplanationGenerators(service)
    }

    fn unbind(bound: &BoundService) -> Option<Arc<Self>> {
        match bound {
            BoundService::ExplanationGenerators(service) => Some(Arc::clone(service)),
            _ => None,
        }
    }
}
