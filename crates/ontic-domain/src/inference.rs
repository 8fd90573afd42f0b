//! Inference module - identifiers and messages exchanged with the remote
//! inference channel

use crate::context::Context;
use crate::params::InferenceParameters;
use crate::sentence::Sentence;
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of one remote inference process.
///
/// Inference ids are scoped to a problem store; several inferences may run in
/// parallel under the same problem store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InferenceId {
    /// Problem store the inference belongs to
    pub problem_store_id: u32,

    /// Inference id within the problem store
    pub inference_id: u32,
}

impl InferenceId {
    /// Create an inference identifier
    pub fn new(problem_store_id: u32, inference_id: u32) -> Self {
        Self {
            problem_store_id,
            inference_id,
        }
    }
}

impl fmt::Display for InferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.problem_store_id, self.inference_id)
    }
}

/// Identifier of an answer within an inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnswerId(pub u32);

/// Identifier of a proof within a problem store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProofId(pub u32);

/// Identifier of a session, based on UUIDv7
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u128);

impl SessionId {
    /// Generate a new session id
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a session id from a raw value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Raw value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Why an inference stopped running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationReason {
    /// Search space exhausted or answer limit reached
    Exhausted,

    /// Halted gracefully after an interrupt request
    Interrupted,

    /// Killed after the patience period elapsed
    Forced,

    /// Released by the client
    Released,
}

/// Backend-reported state of an inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InferenceStatus {
    /// Still running (possibly winding down after an interrupt)
    Running,

    /// No longer running
    Terminated(TerminationReason),
}

impl InferenceStatus {
    /// Whether the inference has stopped
    pub fn is_terminated(&self) -> bool {
        matches!(self, InferenceStatus::Terminated(_))
    }
}

/// A normalized query ready to be submitted
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    /// Query sentence
    pub sentence: Sentence,

    /// Query context
    pub context: Context,

    /// Inference parameters
    pub parameters: InferenceParameters,
}

/// One answer produced by an inference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryAnswer {
    /// Answer id, unique within its inference
    pub id: AnswerId,

    /// Inference that produced the answer
    pub inference: InferenceId,

    /// Variable bindings, keyed by variable name (`?X`)
    pub bindings: BTreeMap<String, String>,

    /// First proof supporting the answer, when already materialized
    pub proof: Option<ProofId>,
}

impl QueryAnswer {
    /// Create an answer without bindings or proof
    pub fn new(id: AnswerId, inference: InferenceId) -> Self {
        Self {
            id,
            inference,
            bindings: BTreeMap::new(),
            proof: None,
        }
    }

    /// Add a variable binding
    pub fn with_binding(mut self, variable: impl Into<String>, value: impl Into<String>) -> Self {
        self.bindings.insert(variable.into(), value.into());
        self
    }

    /// Attach a proof id
    pub fn with_proof(mut self, proof: ProofId) -> Self {
        self.proof = Some(proof);
        self
    }

    /// Binding for a variable
    pub fn binding(&self, variable: &str) -> Option<&str> {
        self.bindings.get(variable).map(String::as_str)
    }
}
