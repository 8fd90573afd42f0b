//! Explanation module - specifications and artifacts explaining query answers
//!
//! Every specification carries an explicit [`ExplanationKind`] tag; providers
//! are dispatched on that tag rather than on runtime type inspection.

use crate::assertion::AssertionId;
use crate::inference::{AnswerId, ProofId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Option key: include HL support details in proof views
pub const INCLUDE_DETAILS: &str = "include-details";

/// Option key: hide bookkeeping assertions in proof views
pub const SUPPRESS_BOOKKEEPING: &str = "suppress-assertion-bookkeeping";

/// Tag identifying a type of explanation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExplanationKind {
    /// Structured proof view
    ProofView,

    /// Flat set of supporting assertions
    SupportSet,

    /// Provider-defined explanation type
    Other(String),
}

impl fmt::Display for ExplanationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExplanationKind::ProofView => f.write_str("proof-view"),
            ExplanationKind::SupportSet => f.write_str("support-set"),
            ExplanationKind::Other(name) => f.write_str(name),
        }
    }
}

/// Configuration for generating one explanation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplanationSpec {
    kind: Option<ExplanationKind>,
    options: BTreeMap<String, String>,
}

impl ExplanationSpec {
    /// Specification for an explanation of the given kind
    pub fn new(kind: ExplanationKind) -> Self {
        Self {
            kind: Some(kind),
            options: BTreeMap::new(),
        }
    }

    /// Specification that declares no explanation kind.
    ///
    /// No provider can be selected for it.
    pub fn untargeted() -> Self {
        Self::default()
    }

    /// Default proof view specification
    pub fn proof_view() -> Self {
        Self::new(ExplanationKind::ProofView)
            .with_option(INCLUDE_DETAILS, "false")
            .with_option(SUPPRESS_BOOKKEEPING, "true")
    }

    /// Default support set specification
    pub fn support_set() -> Self {
        Self::new(ExplanationKind::SupportSet)
    }

    /// Set an option
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Target explanation kind
    pub fn kind(&self) -> Option<&ExplanationKind> {
        self.kind.as_ref()
    }

    /// Option value
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Boolean option; `true`/`t` are true, anything else false
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.option(key), Some("true") | Some("t"))
    }
}

impl fmt::Display for ExplanationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "ExplanationSpec({}", kind)?,
            None => f.write_str("ExplanationSpec(<no kind>")?,
        }
        for (k, v) in &self.options {
            write!(f, " {}={}", k, v)?;
        }
        f.write_str(")")
    }
}

/// One step of a proof view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofStep {
    /// Nesting depth, 0 for the answer itself
    pub depth: u32,

    /// CycL of the supporting formula
    pub cycl: String,

    /// Assertion behind the step, if it is a KB assertion
    pub assertion: Option<AssertionId>,
}

/// Structured proof view for one answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofView {
    /// Answer being explained
    pub answer: AnswerId,

    /// Proof rendered by this view
    pub proof: ProofId,

    /// Flattened proof steps, depth-first
    pub steps: Vec<ProofStep>,
}

/// Supporting assertions for one answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportSet {
    /// Answer being explained
    pub answer: AnswerId,

    /// Supporting assertions, without duplicates
    pub supports: Vec<AssertionId>,
}

/// A generated explanation artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Explanation {
    /// Proof view
    ProofView(ProofView),

    /// Support set
    SupportSet(SupportSet),

    /// Provider-defined explanation
    Other {
        /// Explanation kind
        kind: ExplanationKind,

        /// Opaque payload
        payload: String,
    },
}

impl Explanation {
    /// Kind tag of this explanation
    pub fn kind(&self) -> ExplanationKind {
        match self {
            Explanation::ProofView(_) => ExplanationKind::ProofView,
            Explanation::SupportSet(_) => ExplanationKind::SupportSet,
            Explanation::Other { kind, .. } => kind.clone(),
        }
    }

    /// The proof view, if this is one
    pub fn as_proof_view(&self) -> Option<&ProofView> {
        match self {
            Explanation::ProofView(view) => Some(view),
            _ => None,
        }
    }
}
