//! Ontic Domain Layer
//!
//! This crate holds the knowledge-base data surface consumed and produced by
//! the service registry and the query lifecycle manager, together with the
//! capability traits that backends implement.
//!
//! ## Key Concepts
//!
//! - **Sentence / Context / KbTerm**: validated CycL objects
//! - **InferenceParameters / IndexicalMap**: query configuration and stored
//!   query substitution
//! - **Assertion**: committed facts and rules, with the AUTO direction and
//!   strength policy resolved at commit
//! - **Inference identifiers**: problem-store scoped ids, answers and proofs
//! - **Explanations**: tagged specifications and the artifacts they produce
//!
//! ## Architecture
//!
//! - No I/O and no runtime dependencies
//! - Trait definitions for every backend interaction live in [`traits`]
//! - Backend failures share one taxonomy, [`BackendError`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assertion;
pub mod context;
pub mod error;
pub mod explanation;
pub mod indexical;
pub mod inference;
pub mod params;
pub mod sentence;
pub mod term;
pub mod traits;

// Re-exports for convenience
pub use assertion::{
    Argument, Assertion, AssertionDraft, AssertionId, CommitRequest, Direction, Strength,
};
pub use context::{Context, INFERENCE_PSC};
pub use error::{BackendError, ConstructionError};
pub use explanation::{
    Explanation, ExplanationKind, ExplanationSpec, ProofStep, ProofView, SupportSet,
};
pub use indexical::IndexicalMap;
pub use inference::{
    AnswerId, InferenceId, InferenceRequest, InferenceStatus, ProofId, QueryAnswer, SessionId,
    TerminationReason,
};
pub use params::{InferenceParameters, ParamValue};
pub use sentence::{FormulaClass, Sentence};
pub use term::{KbTerm, TermKind};
