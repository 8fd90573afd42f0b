//! Error types shared by every layer that talks to a knowledge-base backend

use crate::assertion::AssertionId;
use crate::term::TermKind;
use thiserror::Error;

/// Errors reported by backend collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Backend or session unreachable; never retried at this layer
    #[error("Remote unavailable during {operation}: {detail}")]
    Unavailable {
        /// Operation that could not reach the backend
        operation: String,
        /// Backend-supplied detail
        detail: String,
    },

    /// The store refused to delete an assertion
    #[error("Deletion of {assertion} refused: {reason}")]
    DeletionRefused {
        /// Assertion that was not deleted
        assertion: AssertionId,
        /// Reason reported by the store, verbatim
        reason: String,
    },

    /// Referenced object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request rejected by the backend
    #[error("Rejected: {0}")]
    Rejected(String),
}

impl BackendError {
    /// Build an `Unavailable` error
    pub fn unavailable(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        BackendError::Unavailable {
            operation: operation.into(),
            detail: detail.into(),
        }
    }

    /// Whether this is a remote-unavailable condition
    pub fn is_unavailable(&self) -> bool {
        matches!(self, BackendError::Unavailable { .. })
    }
}

/// Local validation failures raised while building KB objects and queries
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    /// Text was empty or whitespace only
    #[error("Empty text")]
    EmptyText,

    /// Parentheses do not balance
    #[error("Unbalanced parentheses in `{0}`")]
    Unbalanced(String),

    /// Text is not a single CycL expression
    #[error("Invalid sentence `{text}`: {reason}")]
    InvalidSentence {
        /// Offending text
        text: String,
        /// What is wrong with it
        reason: String,
    },

    /// Context name is not a constant
    #[error("Invalid context name `{0}`")]
    InvalidContext(String),

    /// Parameter string could not be parsed
    #[error("Invalid inference parameters `{input}`: {reason}")]
    InvalidParameters {
        /// Offending parameter string
        input: String,
        /// What is wrong with it
        reason: String,
    },

    /// Indexical key or value is malformed
    #[error("Malformed indexical `{key}`: {reason}")]
    MalformedIndexical {
        /// Indexical key
        key: String,
        /// What is wrong with it
        reason: String,
    },

    /// Substitution result would depend on map order
    #[error("Ambiguous indexical `{key}`: {reason}")]
    AmbiguousIndexical {
        /// Indexical key
        key: String,
        /// Why the map is ambiguous
        reason: String,
    },

    /// No KB term with this name
    #[error("Unknown term `{0}`")]
    UnknownTerm(String),

    /// Term exists but is not a KB individual
    #[error("Term `{term}` is a {kind}, not an individual")]
    NotAnIndividual {
        /// Term name
        term: String,
        /// Actual kind
        kind: TermKind,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_helper() {
        let err = BackendError::unavailable("interrupt", "connection reset");
        assert!(err.is_unavailable());
        assert_eq!(
            err.to_string(),
            "Remote unavailable during interrupt: connection reset"
        );
        assert!(!BackendError::NotFound("x".into()).is_unavailable());
    }

    #[test]
    fn test_not_an_individual_message() {
        let err = ConstructionError::NotAnIndividual {
            term: "Dog".to_string(),
            kind: TermKind::Collection,
        };
        assert_eq!(err.to_string(), "Term `Dog` is a collection, not an individual");
    }
}
