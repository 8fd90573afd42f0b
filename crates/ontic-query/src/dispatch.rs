//! Explanation dispatch
//!
//! Routes explanation requests for query answers to the single provider the
//! [`ServiceResolver`] selects. Proof views are the common case and get
//! dedicated entry points with a default specification.

use crate::error::QueryError;
use ontic_domain::traits::ExplanationGenerator;
use ontic_domain::{Explanation, ExplanationKind, ExplanationSpec, ProofView, QueryAnswer};
use ontic_registry::{CapabilityRegistry, RegistryError, ResolveError, ServiceResolver};
use tracing::debug;

/// Finds and runs the explanation provider for an answer
#[derive(Debug, Clone, Default)]
pub struct ExplanationDispatch {
    resolver: ServiceResolver,
}

impl ExplanationDispatch {
    /// Dispatch through an existing resolver
    pub fn new(resolver: ServiceResolver) -> Self {
        Self { resolver }
    }

    /// Dispatch over every explanation provider bound in a registry
    pub fn from_registry(registry: &CapabilityRegistry) -> Result<Self, RegistryError> {
        Ok(Self::new(ServiceResolver::from_registry(registry)?))
    }

    /// Underlying resolver
    pub fn resolver(&self) -> &ServiceResolver {
        &self.resolver
    }

    /// Generator from the one provider accepting `answer` under `spec`
    ///
    /// # Errors
    ///
    /// `UnsupportedSpecification` when the specification is missing or no
    /// single provider accepts it; backend errors from the provider.
    pub fn explanation_generator(
        &self,
        answer: &QueryAnswer,
        spec: Option<&ExplanationSpec>,
    ) -> Result<Box<dyn ExplanationGenerator>, QueryError> {
        let provider = self.resolver.resolve(answer, spec)?;
        // resolve() has already rejected a missing spec
        let spec = spec.ok_or(ResolveError::MissingSpecification)?;
        debug!(
            "Answer {} of {} explained by {}",
            answer.id.0,
            answer.inference,
            provider.name()
        );
        Ok(provider.generator(answer, spec)?)
    }

    /// Generate an explanation in one step
    pub fn explanation(
        &self,
        answer: &QueryAnswer,
        spec: Option<&ExplanationSpec>,
    ) -> Result<Explanation, QueryError> {
        let mut generator = self.explanation_generator(answer, spec)?;
        Ok(generator.generate()?.clone())
    }

    /// Default proof-view specification
    ///
    /// Details are excluded and assertion bookkeeping is suppressed.
    pub fn proof_view_specification(&self) -> ExplanationSpec {
        ExplanationSpec::proof_view()
    }

    /// Proof-view generator; `None` uses the default proof-view specification
    ///
    /// # Errors
    ///
    /// `UnsupportedSpecification` for a specification of another kind.
    pub fn proof_view_generator(
        &self,
        answer: &QueryAnswer,
        spec: Option<&ExplanationSpec>,
    ) -> Result<Box<dyn ExplanationGenerator>, QueryError> {
        let default_spec;
        let spec = match spec {
            Some(spec) => spec,
            None => {
                default_spec = self.proof_view_specification();
                &default_spec
            }
        };

        if spec.kind() != Some(&ExplanationKind::ProofView) {
            return Err(ResolveError::NoSuitableProvider {
                kind: ExplanationKind::ProofView,
                spec: spec.to_string(),
            }
            .into());
        }
        self.explanation_generator(answer, Some(spec))
    }

    /// Generate a proof view in one step
    pub fn proof_view(
        &self,
        answer: &QueryAnswer,
        spec: Option<&ExplanationSpec>,
    ) -> Result<ProofView, QueryError> {
        let mut generator = self.proof_view_generator(answer, spec)?;
        match generator.generate()? {
            Explanation::ProofView(view) => Ok(view.clone()),
            other => Err(ResolveError::NoSuitableProvider {
                kind: ExplanationKind::ProofView,
                spec: format!("provider produced {}", other.kind()),
            }
            .into()),
        }
    }
}
