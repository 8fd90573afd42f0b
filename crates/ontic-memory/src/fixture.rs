//! TOML fixtures for seeding a backend
//!
//! ```toml
//! contexts = ["PetsMt"]
//!
//! [[terms]]
//! name = "Rex"
//! kind = "individual"
//!
//! [[facts]]
//! formula = "(#$isa #$Rex #$Dog)"
//! context = "PetsMt"
//!
//! [[queries]]
//! term = "AllDogs"
//! sentence = "(#$isa ?X #$Dog)"
//! context = "PetsMt"
//! parameters = ":max-number 10"
//! ```

use crate::backend::MemoryBackend;
use crate::MemoryError;
use ontic_domain::traits::{AssertionStore, StoredQuery};
use ontic_domain::{AssertionDraft, Context, InferenceParameters, KbTerm, Sentence, TermKind};
use serde::Deserialize;
use std::path::Path;

/// Term entry
#[derive(Debug, Clone, Deserialize)]
pub struct TermFixture {
    /// Constant name
    pub name: String,

    /// Term kind
    pub kind: TermKind,
}

/// Asserted formula
#[derive(Debug, Clone, Deserialize)]
pub struct FactFixture {
    /// CycL formula
    pub formula: String,

    /// Context name
    pub context: String,
}

/// Stored query specification
#[derive(Debug, Clone, Deserialize)]
pub struct QueryFixture {
    /// Individual naming the query
    pub term: String,

    /// CycL query sentence, possibly with indexicals
    pub sentence: String,

    /// Context name
    pub context: String,

    /// Parameter string
    #[serde(default)]
    pub parameters: String,
}

/// Contents of a fixture file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemoryFixture {
    /// Extra contexts
    #[serde(default)]
    pub contexts: Vec<String>,

    /// Terms
    #[serde(default)]
    pub terms: Vec<TermFixture>,

    /// Facts committed with AUTO direction and strength
    #[serde(default)]
    pub facts: Vec<FactFixture>,

    /// Stored queries
    #[serde(default)]
    pub queries: Vec<QueryFixture>,
}

impl MemoryFixture {
    /// Load a fixture from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MemoryError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse a fixture from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, MemoryError> {
        Ok(toml::from_str(contents)?)
    }

    /// Seed a backend; contexts and terms come first so facts and queries
    /// can refer to them
    pub fn apply(&self, backend: &MemoryBackend) -> Result<(), MemoryError> {
        for context in &self.contexts {
            backend.add_context(Context::new(context)?.name());
        }
        for term in &self.terms {
            backend.add_term(KbTerm::new(&term.name, term.kind));
        }
        for fact in &self.facts {
            let draft = AssertionDraft::classified(
                Sentence::parse(&fact.formula)?,
                Context::new(&fact.context)?,
            );
            backend.assert_draft(draft)?;
        }
        for query in &self.queries {
            backend.define_query(
                &query.term,
                StoredQuery {
                    sentence: Sentence::parse(&query.sentence)?,
                    context: Context::new(&query.context)?,
                    parameters: InferenceParameters::parse(&query.parameters)?,
                },
            );
        }
        Ok(())
    }
}

impl MemoryBackend {
    /// Backend seeded from a fixture file
    pub fn from_fixture_file<P: AsRef<Path>>(path: P) -> Result<Self, MemoryError> {
        let backend = Self::new();
        MemoryFixture::from_file(path)?.apply(&backend)?;
        Ok(backend)
    }

    /// Backend seeded from fixture text
    pub fn from_fixture_str(contents: &str) -> Result<Self, MemoryError> {
        let backend = Self::new();
        MemoryFixture::from_toml_str(contents)?.apply(&backend)?;
        Ok(backend)
    }
}
