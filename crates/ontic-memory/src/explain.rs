//! Explanation providers over the in-memory backend

use crate::backend::MemoryBackend;
use ontic_domain::explanation::{INCLUDE_DETAILS, SUPPRESS_BOOKKEEPING};
use ontic_domain::term::normalize_constant_name;
use ontic_domain::traits::{ExplanationGenerator, ExplanationService};
use ontic_domain::{
    AssertionId, BackendError, Explanation, ExplanationKind, ExplanationSpec, ProofStep,
    ProofView, QueryAnswer, SupportSet,
};

/// Predicates that only record who asserted what and when
pub const BOOKKEEPING_PREDICATES: [&str; 4] = [
    "myCreator",
    "myCreationTime",
    "myCreationSecond",
    "myCreationPurpose",
];

fn is_bookkeeping(cycl_operator: Option<&str>) -> bool {
    cycl_operator
        .map(normalize_constant_name)
        .is_some_and(|op| BOOKKEEPING_PREDICATES.contains(&op))
}

/// Proof views for answers that carry a proof
#[derive(Debug, Clone)]
pub struct MemoryProofViewService {
    backend: MemoryBackend,
}

impl MemoryProofViewService {
    /// Provider over a backend
    pub fn new(backend: MemoryBackend) -> Self {
        Self { backend }
    }
}

impl ExplanationService for MemoryProofViewService {
    fn name(&self) -> &str {
        "memory-proof-view"
    }

    fn for_kind(&self) -> ExplanationKind {
        ExplanationKind::ProofView
    }

    fn is_suitable_for(&self, answer: &QueryAnswer, _spec: &ExplanationSpec) -> bool {
        answer.proof.is_some()
    }

    fn generator(
        &self,
        answer: &QueryAnswer,
        spec: &ExplanationSpec,
    ) -> Result<Box<dyn ExplanationGenerator>, BackendError> {
        Ok(Box::new(MemoryGenerator::new(
            ExplanationKind::ProofView,
            self.backend.clone(),
            answer,
            spec,
        )))
    }
}

/// Support sets for any answer of a known inference
#[derive(Debug, Clone)]
pub struct MemorySupportSetService {
    backend: MemoryBackend,
}

impl MemorySupportSetService {
    /// Provider over a backend
    pub fn new(backend: MemoryBackend) -> Self {
        Self { backend }
    }
}

impl ExplanationService for MemorySupportSetService {
    fn name(&self) -> &str {
        "memory-support-set"
    }

    fn for_kind(&self) -> ExplanationKind {
        ExplanationKind::SupportSet
    }

    fn is_suitable_for(&self, _answer: &QueryAnswer, _spec: &ExplanationSpec) -> bool {
        true
    }

    fn generator(
        &self,
        answer: &QueryAnswer,
        spec: &ExplanationSpec,
    ) -> Result<Box<dyn ExplanationGenerator>, BackendError> {
        Ok(Box::new(MemoryGenerator::new(
            ExplanationKind::SupportSet,
            self.backend.clone(),
            answer,
            spec,
        )))
    }
}

struct MemoryGenerator {
    kind: ExplanationKind,
    backend: MemoryBackend,
    answer: QueryAnswer,
    spec: ExplanationSpec,
    explanation: Option<Explanation>,
}

impl MemoryGenerator {
    fn new(
        kind: ExplanationKind,
        backend: MemoryBackend,
        answer: &QueryAnswer,
        spec: &ExplanationSpec,
    ) -> Self {
        Self {
            kind,
            backend,
            answer: answer.clone(),
            spec: spec.clone(),
            explanation: None,
        }
    }

    fn build(&self) -> Result<Explanation, BackendError> {
        let state = self.backend.lock();
        let record = state.inferences.get(&self.answer.inference).ok_or_else(|| {
            BackendError::NotFound(format!("inference {}", self.answer.inference))
        })?;
        let scripted = usize::try_from(self.answer.id.0)
            .ok()
            .and_then(|index| record.answers.get(index))
            .ok_or_else(|| {
                BackendError::NotFound(format!(
                    "answer {} of {}",
                    self.answer.id.0, self.answer.inference
                ))
            })?;

        let mut supports: Vec<AssertionId> = Vec::new();
        for id in &scripted.supports {
            if !supports.contains(id) {
                supports.push(*id);
            }
        }

        if self.kind == ExplanationKind::SupportSet {
            return Ok(Explanation::SupportSet(SupportSet {
                answer: self.answer.id,
                supports,
            }));
        }

        let proof = match self.answer.proof {
            Some(proof) if record.proof_visible(scripted, state.now()) => proof,
            _ => {
                return Err(BackendError::NotFound(format!(
                    "proof for answer {} of {}",
                    self.answer.id.0, self.answer.inference
                )))
            }
        };

        let suppress = self.spec.flag(SUPPRESS_BOOKKEEPING);
        let details = self.spec.flag(INCLUDE_DETAILS);
        let mut steps = vec![ProofStep {
            depth: 0,
            cycl: record.request.sentence.as_str().to_string(),
            assertion: None,
        }];

        for id in supports {
            let Some(assertion) = state.assertion(id) else {
                continue;
            };
            if suppress && is_bookkeeping(assertion.formula().operator()) {
                continue;
            }
            steps.push(ProofStep {
                depth: 1,
                cycl: assertion.formula().as_str().to_string(),
                assertion: Some(id),
            });

            if details {
                for nested in assertion.supporting_assertion_ids() {
                    if let Some(support) = state.assertion(nested) {
                        if suppress && is_bookkeeping(support.formula().operator()) {
                            continue;
                        }
                        steps.push(ProofStep {
                            depth: 2,
                            cycl: support.formula().as_str().to_string(),
                            assertion: Some(nested),
                        });
                    }
                }
            }
        }

        Ok(Explanation::ProofView(ProofView {
            answer: self.answer.id,
            proof,
            steps,
        }))
    }
}

impl ExplanationGenerator for MemoryGenerator {
    fn kind(&self) -> ExplanationKind {
        self.kind.clone()
    }

    fn generate(&mut self) -> Result<&Explanation, BackendError> {
        if self.explanation.is_none() {
            self.explanation = Some(self.build()?);
        }
        self.explanation
            .as_ref()
            .ok_or_else(|| BackendError::NotFound("explanation".to_string()))
    }

    fn explanation(&self) -> Option<&Explanation> {
        self.explanation.as_ref()
    }
}
