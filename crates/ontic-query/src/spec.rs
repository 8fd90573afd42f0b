//! Query specifications
//!
//! A query can be described in five equivalent ways. Every form normalizes to
//! the same [`InferenceRequest`] triple (sentence, context, parameters) before
//! anything is submitted, and every validation failure surfaces here, before
//! any remote call.

use crate::config::QueryConfig;
use crate::error::QueryError;
use ontic_domain::traits::{KbApiService, QueryApiService};
use ontic_domain::{
    BackendError, ConstructionError, Context, IndexicalMap, InferenceParameters, InferenceRequest,
    KbTerm, Sentence, TermKind,
};
use ontic_registry::{CapabilityKind, RegistryError};
use std::fmt;

/// Reference to the KB individual naming a stored query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermRef {
    /// An already materialized term
    Term(KbTerm),

    /// A term name, looked up through the knowledge-object capability
    Name(String),
}

impl fmt::Display for TermRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermRef::Term(term) => write!(f, "{}", term),
            TermRef::Name(name) => f.write_str(name),
        }
    }
}

/// One of the five ways to describe a query
#[derive(Debug, Clone, PartialEq)]
pub enum QuerySpecification {
    /// Query text with default context and parameters
    Text(String),

    /// Query text in a named context
    TextInContext {
        /// CycL query text
        text: String,
        /// Context name
        context: String,
    },

    /// Query text in a named context with a parameter string
    TextWithParameters {
        /// CycL query text
        text: String,
        /// Context name
        context: String,
        /// Parameter string, e.g. `:max-time 5`
        parameters: String,
    },

    /// Already built sentence and context
    Structured {
        /// Query sentence
        sentence: Sentence,
        /// Query context
        context: Context,
        /// Parameters; defaults when absent
        parameters: Option<InferenceParameters>,
    },

    /// Stored query specification plus indexical substitutions
    StoredTerm {
        /// Individual naming the stored query
        term: TermRef,
        /// Substitutions applied to the stored sentence
        indexicals: IndexicalMap,
    },
}

impl QuerySpecification {
    /// Free-text form
    pub fn text(text: impl Into<String>) -> Self {
        QuerySpecification::Text(text.into())
    }

    /// Free text in a context
    pub fn in_context(text: impl Into<String>, context: impl Into<String>) -> Self {
        QuerySpecification::TextInContext {
            text: text.into(),
            context: context.into(),
        }
    }

    /// Free text in a context with parameters
    pub fn with_parameters(
        text: impl Into<String>,
        context: impl Into<String>,
        parameters: impl Into<String>,
    ) -> Self {
        QuerySpecification::TextWithParameters {
            text: text.into(),
            context: context.into(),
            parameters: parameters.into(),
        }
    }

    /// Structured form
    pub fn structured(
        sentence: Sentence,
        context: Context,
        parameters: Option<InferenceParameters>,
    ) -> Self {
        QuerySpecification::Structured {
            sentence,
            context,
            parameters,
        }
    }

    /// Stored-query form, validating the substitution pairs
    ///
    /// # Errors
    ///
    /// `MalformedIndexical` or `AmbiguousIndexical` for a bad map.
    pub fn stored<I, K, V>(term: TermRef, indexicals: I) -> Result<Self, ConstructionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Ok(QuerySpecification::StoredTerm {
            term,
            indexicals: IndexicalMap::from_pairs(indexicals)?,
        })
    }

    /// Short name of the form, for logs
    pub fn form(&self) -> &'static str {
        match self {
            QuerySpecification::Text(_) => "text",
            QuerySpecification::TextInContext { .. } => "text+context",
            QuerySpecification::TextWithParameters { .. } => "text+context+parameters",
            QuerySpecification::Structured { .. } => "structured",
            QuerySpecification::StoredTerm { .. } => "stored-term",
        }
    }

    /// Normalize to the request submitted to the inference channel
    ///
    /// Explicit parameters are laid over the configured defaults. Stored
    /// queries need the query capability; without it this fails with a
    /// binding error.
    pub fn normalize(
        &self,
        kb: &dyn KbApiService,
        queries: Option<&dyn QueryApiService>,
        config: &QueryConfig,
    ) -> Result<InferenceRequest, QueryError> {
        let defaults = config.parameters()?;

        let request = match self {
            QuerySpecification::Text(text) => InferenceRequest {
                sentence: kb.sentence(text)?,
                context: resolve_context(kb, &config.default_context)?,
                parameters: defaults,
            },
            QuerySpecification::TextInContext { text, context } => InferenceRequest {
                sentence: kb.sentence(text)?,
                context: resolve_context(kb, context)?,
                parameters: defaults,
            },
            QuerySpecification::TextWithParameters {
                text,
                context,
                parameters,
            } => InferenceRequest {
                sentence: kb.sentence(text)?,
                context: resolve_context(kb, context)?,
                parameters: InferenceParameters::parse(parameters)?.merged_over(&defaults),
            },
            QuerySpecification::Structured {
                sentence,
                context,
                parameters,
            } => InferenceRequest {
                sentence: sentence.clone(),
                context: context.clone(),
                parameters: match parameters {
                    Some(p) => p.merged_over(&defaults),
                    None => defaults,
                },
            },
            QuerySpecification::StoredTerm { term, indexicals } => {
                let term = resolve_individual(kb, term)?;
                let queries = queries.ok_or(RegistryError::missing(CapabilityKind::Queries))?;
                let stored = queries.load_query_specification(&term)?.ok_or_else(|| {
                    BackendError::NotFound(format!("stored query specification for {}", term))
                })?;

                InferenceRequest {
                    sentence: stored.sentence.substitute(indexicals)?,
                    context: stored.context,
                    parameters: stored.parameters.merged_over(&defaults),
                }
            }
        };

        Ok(request)
    }
}

fn resolve_context(kb: &dyn KbApiService, name: &str) -> Result<Context, QueryError> {
    let context = Context::new(name)?;
    match kb.find_context(context.name())? {
        Some(found) => Ok(found),
        None => Err(ConstructionError::UnknownTerm(context.name().to_string()).into()),
    }
}

fn resolve_individual(kb: &dyn KbApiService, term: &TermRef) -> Result<KbTerm, QueryError> {
    let term = match term {
        TermRef::Term(term) => term.clone(),
        TermRef::Name(name) => kb
            .find_term(name)?
            .ok_or_else(|| ConstructionError::UnknownTerm(name.clone()))?,
    };

    if term.kind() != TermKind::Individual {
        return Err(ConstructionError::NotAnIndividual {
            term: term.name().to_string(),
            kind: term.kind(),
        }
        .into());
    }
    Ok(term)
}
