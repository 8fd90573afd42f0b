//! Term module - opaque references to knowledge-base terms

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix marking a constant in CycL text
pub const CONSTANT_PREFIX: &str = "#$";

/// Strip the constant prefix from a term name, if present.
///
/// `#$Dog` and `Dog` name the same constant.
pub fn normalize_constant_name(name: &str) -> &str {
    name.strip_prefix(CONSTANT_PREFIX).unwrap_or(name)
}

/// Kind of a KB term as reported by the knowledge-object factory
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermKind {
    /// An individual (instance) term
    Individual,

    /// A collection term
    Collection,

    /// A predicate
    Predicate,

    /// A context (microtheory)
    Context,

    /// A function term
    Function,
}

impl TermKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            TermKind::Individual => "individual",
            TermKind::Collection => "collection",
            TermKind::Predicate => "predicate",
            TermKind::Context => "context",
            TermKind::Function => "function",
        }
    }

    /// Parse a term kind from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "individual" => Some(TermKind::Individual),
            "collection" => Some(TermKind::Collection),
            "predicate" => Some(TermKind::Predicate),
            "context" => Some(TermKind::Context),
            "function" => Some(TermKind::Function),
            _ => None,
        }
    }
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TermKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid term kind: {}", s))
    }
}

/// A term in the knowledge base.
///
/// Opaque to the core beyond its name and kind. Names are stored without the
/// `#$` prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KbTerm {
    name: String,
    kind: TermKind,
}

impl KbTerm {
    /// Create a term reference
    ///
    /// # Examples
    ///
    /// ```
    /// use ontic_domain::{KbTerm, TermKind};
    ///
    /// let term = KbTerm::new("#$Dog", TermKind::Collection);
    /// assert_eq!(term.name(), "Dog");
    /// assert_eq!(term.to_string(), "#$Dog");
    /// ```
    pub fn new(name: impl AsRef<str>, kind: TermKind) -> Self {
        Self {
            name: normalize_constant_name(name.as_ref().trim()).to_string(),
            kind,
        }
    }

    /// Create a reference to a KB individual
    pub fn individual(name: impl AsRef<str>) -> Self {
        Self::new(name, TermKind::Individual)
    }

    /// Constant name without prefix
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of this term
    pub fn kind(&self) -> TermKind {
        self.kind
    }

    /// Whether this term is a KB individual
    pub fn is_individual(&self) -> bool {
        self.kind == TermKind::Individual
    }
}

impl fmt::Display for KbTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CONSTANT_PREFIX, self.name)
    }
}
