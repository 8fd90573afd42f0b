//! Trait definitions for external interactions
//!
//! These traits define the capability surfaces the core consumes. Backend
//! implementations live in other crates and are bound at startup through the
//! capability registry, so every trait here is object safe and `Send + Sync`.

use crate::assertion::{Assertion, AssertionDraft, AssertionId, CommitRequest, Direction};
use crate::context::Context;
use crate::error::{BackendError, ConstructionError};
use crate::explanation::{Explanation, ExplanationKind, ExplanationSpec};
use crate::inference::{
    AnswerId, InferenceId, InferenceRequest, InferenceStatus, ProofId, QueryAnswer, SessionId,
};
use crate::params::InferenceParameters;
use crate::sentence::Sentence;
use crate::term::KbTerm;
use std::sync::Arc;

/// Materializes KB objects referenced by queries and assertions
pub trait KnowledgeObjectFactory: Send + Sync {
    /// Build a sentence from CycL text
    fn sentence(&self, text: &str) -> Result<Sentence, ConstructionError> {
        Sentence::parse(text)
    }

    /// Look up a context by name
    fn find_context(&self, name: &str) -> Result<Option<Context>, BackendError>;

    /// Look up a term by name
    fn find_term(&self, name: &str) -> Result<Option<KbTerm>, BackendError>;
}

/// Commits, reads and removes assertions
///
/// Stores only accept a [`CommitRequest`], so AUTO direction and strength are
/// always resolved before anything reaches the backend.
pub trait AssertionStore: Send + Sync {
    /// Commit a resolved assertion
    fn commit_assertion(&self, request: CommitRequest) -> Result<Assertion, BackendError>;

    /// Get an assertion by id
    fn find_assertion(&self, id: AssertionId) -> Result<Option<Assertion>, BackendError>;

    /// Delete an assertion
    ///
    /// Fails with [`BackendError::DeletionRefused`] when the store declines,
    /// e.g. because the assertion is purely forward-deduced.
    fn delete_assertion(&self, id: AssertionId) -> Result<(), BackendError>;

    /// Change the direction of a committed assertion; `Auto` is resolved by
    /// the same rule used at commit time
    fn change_direction(
        &self,
        id: AssertionId,
        direction: Direction,
    ) -> Result<Assertion, BackendError>;

    /// Resolve and commit a draft
    fn assert_draft(&self, draft: AssertionDraft) -> Result<Assertion, BackendError> {
        self.commit_assertion(draft.resolve())
    }

    /// Assertions supporting `id` through its deductions
    fn supporting_assertions(&self, id: AssertionId) -> Result<Vec<Assertion>, BackendError> {
        let assertion = self
            .find_assertion(id)?
            .ok_or_else(|| BackendError::NotFound(id.to_string()))?;

        let mut supports = Vec::new();
        for support in assertion.supporting_assertion_ids() {
            if let Some(found) = self.find_assertion(support)? {
                supports.push(found);
            }
        }
        Ok(supports)
    }
}

/// Knowledge-object capability: object factory plus assertion store
pub trait KbApiService: KnowledgeObjectFactory + AssertionStore {}

impl<T: KnowledgeObjectFactory + AssertionStore + ?Sized> KbApiService for T {}

/// A query specification stored in the KB under an individual term
#[derive(Debug, Clone, PartialEq)]
pub struct StoredQuery {
    /// Query sentence, possibly mentioning indexicals
    pub sentence: Sentence,

    /// Query context
    pub context: Context,

    /// Stored inference parameters
    pub parameters: InferenceParameters,
}

/// Query capability: access to stored query specifications
pub trait QueryApiService: Send + Sync {
    /// Load the query specification named by `term`, if one is stored
    fn load_query_specification(&self, term: &KbTerm) -> Result<Option<StoredQuery>, BackendError>;
}

/// A client session with the backend
pub trait Session: Send + Sync {
    /// Session identifier
    fn id(&self) -> SessionId;

    /// Whether the session has been closed
    fn is_closed(&self) -> bool;

    /// Inference channel owned by this session
    fn channel(&self) -> Arc<dyn InferenceChannel>;
}

/// Session capability
pub trait SessionApiService: Send + Sync {
    /// The session new queries run in
    fn current_session(&self) -> Result<Arc<dyn Session>, BackendError>;
}

/// Opaque request/response channel to remote inference.
///
/// No method blocks on inference progress.
pub trait InferenceChannel: Send + Sync {
    /// Start an inference
    fn submit(&self, request: &InferenceRequest) -> Result<InferenceId, BackendError>;

    /// Current status of an inference
    fn status(&self, id: InferenceId) -> Result<InferenceStatus, BackendError>;

    /// Answers produced so far, starting at `offset`
    fn answers(&self, id: InferenceId, offset: usize) -> Result<Vec<QueryAnswer>, BackendError>;

    /// First proof of an answer, if one has been materialized
    fn first_proof_id(
        &self,
        id: InferenceId,
        answer: AnswerId,
    ) -> Result<Option<ProofId>, BackendError>;

    /// Request a cooperative halt; `None` patience never forces termination
    fn interrupt(&self, id: InferenceId, patience: Option<u32>) -> Result<(), BackendError>;

    /// Release backend resources held by an inference
    fn release(&self, id: InferenceId) -> Result<(), BackendError>;
}

/// Produces one explanation for one answer
pub trait ExplanationGenerator: Send {
    /// Kind of explanation produced
    fn kind(&self) -> ExplanationKind;

    /// Generate the explanation; later calls return the cached artifact
    fn generate(&mut self) -> Result<&Explanation, BackendError>;

    /// The explanation, if already generated
    fn explanation(&self) -> Option<&Explanation>;
}

/// Explanation capability; many providers may be bound at once
pub trait ExplanationService: Send + Sync {
    /// Provider name, used in diagnostics
    fn name(&self) -> &str;

    /// Explanation kind this provider handles
    fn for_kind(&self) -> ExplanationKind;

    /// Whether this provider can explain `answer` under `spec`
    fn is_suitable_for(&self, answer: &QueryAnswer, spec: &ExplanationSpec) -> bool;

    /// Create a generator for `answer`
    fn generator(
        &self,
        answer: &QueryAnswer,
        spec: &ExplanationSpec,
    ) -> Result<Box<dyn ExplanationGenerator>, BackendError>;

    /// Generate an explanation in one step
    fn explanation(
        &self,
        answer: &QueryAnswer,
        spec: &ExplanationSpec,
    ) -> Result<Explanation, BackendError> {
        let mut generator = self.generator(answer, spec)?;
        generator.generate().cloned()
    }
}
