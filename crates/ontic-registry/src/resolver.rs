//! Explanation provider resolution.
//!
//! Providers are grouped by the explanation kind they declare. Resolving a
//! request first selects the group for the specification's kind, then keeps
//! the providers whose suitability predicate accepts the answer. Exactly one
//! provider must remain.

use crate::error::{RegistryError, ResolveError};
use crate::registry::CapabilityRegistry;
use ontic_domain::traits::ExplanationService;
use ontic_domain::{ExplanationKind, ExplanationSpec, QueryAnswer};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Selects the explanation provider for an (answer, specification) pair
#[derive(Clone, Default)]
pub struct ServiceResolver {
    providers: BTreeMap<ExplanationKind, Vec<Arc<dyn ExplanationService>>>,
}

impl ServiceResolver {
    /// Build a resolver over providers, kept in the given order per kind
    pub fn new<I>(providers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn ExplanationService>>,
    {
        let mut grouped: BTreeMap<ExplanationKind, Vec<Arc<dyn ExplanationService>>> =
            BTreeMap::new();
        for provider in providers {
            grouped.entry(provider.for_kind()).or_default().push(provider);
        }
        Self { providers: grouped }
    }

    /// Build a resolver over every explanation provider in a registry
    pub fn from_registry(registry: &CapabilityRegistry) -> Result<Self, RegistryError> {
        Ok(Self::new(registry.explanation_services(true)?))
    }

    /// Select the single provider accepting `answer` under `spec`
    ///
    /// # Errors
    ///
    /// * `MissingSpecification` when `spec` is `None`
    /// * `MissingKind` when the specification declares no kind
    /// * `NoSuitableProvider` when no provider of the kind accepts
    /// * `Ambiguous` when several providers accept
    pub fn resolve(
        &self,
        answer: &QueryAnswer,
        spec: Option<&ExplanationSpec>,
    ) -> Result<Arc<dyn ExplanationService>, ResolveError> {
        let spec = spec.ok_or(ResolveError::MissingSpecification)?;
        let kind = spec.kind().ok_or_else(|| ResolveError::MissingKind {
            spec: spec.to_string(),
        })?;

        let mut accepting = self.accepting(kind, answer, spec);
        match accepting.len() {
            0 => Err(ResolveError::NoSuitableProvider {
                kind: kind.clone(),
                spec: spec.to_string(),
            }),
            1 => Ok(accepting.remove(0)),
            _ => Err(ResolveError::Ambiguous {
                kind: kind.clone(),
                providers: accepting.iter().map(|p| p.name().to_string()).collect(),
            }),
        }
    }

    fn accepting(
        &self,
        kind: &ExplanationKind,
        answer: &QueryAnswer,
        spec: &ExplanationSpec,
    ) -> Vec<Arc<dyn ExplanationService>> {
        self.providers
            .get(kind)
            .map(|group| {
                group
                    .iter()
                    .filter(|p| p.is_suitable_for(answer, spec))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Names of the providers that all accept `answer` under `spec`, when
    /// there is more than one
    ///
    /// Used to detect misconfigured registries ahead of time.
    pub fn conflicts(&self, answer: &QueryAnswer, spec: &ExplanationSpec) -> Option<Vec<String>> {
        let kind = spec.kind()?;
        let accepting = self.accepting(kind, answer, spec);
        if accepting.len() > 1 {
            Some(accepting.iter().map(|p| p.name().to_string()).collect())
        } else {
            None
        }
    }

    /// Explanation kinds with at least one provider
    pub fn kinds(&self) -> impl Iterator<Item = &ExplanationKind> {
        self.providers.keys()
    }

    /// Number of providers for a kind
    pub fn provider_count(&self, kind: &ExplanationKind) -> usize {
        self.providers.get(kind).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for ServiceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (kind, group) in &self.providers {
            let names: Vec<&str> = group.iter().map(|p| p.name()).collect();
            map.entry(kind, &names);
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontic_domain::traits::ExplanationGenerator;
    use ontic_domain::{AnswerId, BackendError, Explanation, InferenceId, ProofId};

    /// Provider accepting answers that match a fixed predicate
    struct Fixed {
        name: &'static str,
        kind: ExplanationKind,
        accepts: fn(&QueryAnswer) -> bool,
    }

    struct Canned(Explanation);

    impl ExplanationGenerator for Canned {
        fn kind(&self) -> ExplanationKind {
            self.0.kind()
        }

        fn generate(&mut self) -> Result<&Explanation, BackendError> {
            Ok(&self.0)
        }

        fn explanation(&self) -> Option<&Explanation> {
            Some(&self.0)
        }
    }

    impl ExplanationService for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn for_kind(&self) -> ExplanationKind {
            self.kind.clone()
        }

        fn is_suitable_for(&self, answer: &QueryAnswer, _spec: &ExplanationSpec) -> bool {
            (self.accepts)(answer)
        }

        fn generator(
            &self,
            _answer: &QueryAnswer,
            _spec: &ExplanationSpec,
        ) -> Result<Box<dyn ExplanationGenerator>, BackendError> {
            Ok(Box::new(Canned(Explanation::Other {
                kind: self.kind.clone(),
                payload: self.name.to_string(),
            })))
        }
    }

    fn provider(
        name: &'static str,
        kind: ExplanationKind,
        accepts: fn(&QueryAnswer) -> bool,
    ) -> Arc<dyn ExplanationService> {
        Arc::new(Fixed { name, kind, accepts })
    }

    fn answer() -> QueryAnswer {
        QueryAnswer::new(AnswerId(0), InferenceId::new(1, 1))
    }

    fn has_proof(answer: &QueryAnswer) -> bool {
        answer.proof.is_some()
    }

    fn always(_: &QueryAnswer) -> bool {
        true
    }

    #[test]
    fn test_resolves_by_kind_then_predicate() {
        let resolver = ServiceResolver::new([
            provider("support", ExplanationKind::SupportSet, always),
            provider("proof", ExplanationKind::ProofView, has_proof),
        ]);

        let with_proof = answer().with_proof(ProofId(3));
        let chosen = resolver
            .resolve(&with_proof, Some(&ExplanationSpec::proof_view()))
            .unwrap();
        assert_eq!(chosen.name(), "proof");

        let chosen = resolver
            .resolve(&answer(), Some(&ExplanationSpec::support_set()))
            .unwrap();
        assert_eq!(chosen.name(), "support");
    }

    #[test]
    fn test_absent_or_untargeted_spec() {
        let resolver =
            ServiceResolver::new([provider("proof", ExplanationKind::ProofView, always)]);

        assert_eq!(
            resolver.resolve(&answer(), None).err(),
            Some(ResolveError::MissingSpecification)
        );
        assert!(matches!(
            resolver.resolve(&answer(), Some(&ExplanationSpec::untargeted())),
            Err(ResolveError::MissingKind { .. })
        ));
    }

    #[test]
    fn test_predicate_rejects() {
        let resolver =
            ServiceResolver::new([provider("proof", ExplanationKind::ProofView, has_proof)]);
        assert!(matches!(
            resolver.resolve(&answer(), Some(&ExplanationSpec::proof_view())),
            Err(ResolveError::NoSuitableProvider { .. })
        ));
    }

    #[test]
    fn test_unknown_kind() {
        let resolver =
            ServiceResolver::new([provider("proof", ExplanationKind::ProofView, always)]);
        let spec = ExplanationSpec::new(ExplanationKind::Other("paraphrase".to_string()));
        assert!(matches!(
            resolver.resolve(&answer(), Some(&spec)),
            Err(ResolveError::NoSuitableProvider { .. })
        ));
    }

    #[test]
    fn test_two_accepting_providers_detected() {
        let resolver = ServiceResolver::new([
            provider("first", ExplanationKind::ProofView, always),
            provider("second", ExplanationKind::ProofView, always),
        ]);
        let spec = ExplanationSpec::proof_view();

        assert_eq!(
            resolver.conflicts(&answer(), &spec),
            Some(vec!["first".to_string(), "second".to_string()])
        );
        assert!(matches!(
            resolver.resolve(&answer(), Some(&spec)),
            Err(ResolveError::Ambiguous { .. })
        ));
    }

    #[test]
    fn test_same_kind_disjoint_predicates() {
        let resolver = ServiceResolver::new([
            provider("with-proof", ExplanationKind::ProofView, has_proof),
            provider("without-proof", ExplanationKind::ProofView, |a: &QueryAnswer| {
                a.proof.is_none()
            }),
        ]);
        let spec = ExplanationSpec::proof_view();

        assert_eq!(resolver.conflicts(&answer(), &spec), None);
        let chosen = resolver.resolve(&answer(), Some(&spec)).unwrap();
        assert_eq!(chosen.name(), "without-proof");
        assert_eq!(resolver.provider_count(&ExplanationKind::ProofView), 2);
        assert_eq!(resolver.kinds().count(), 1);
    }

    #[test]
    fn test_generate_through_resolved_provider() {
        let resolver =
            ServiceResolver::new([provider("only", ExplanationKind::SupportSet, always)]);
        let spec = ExplanationSpec::support_set();
        let chosen = resolver.resolve(&answer(), Some(&spec)).unwrap();
        let explanation = chosen.explanation(&answer(), &spec).unwrap();
        assert_eq!(explanation.kind(), ExplanationKind::SupportSet);
    }
}
