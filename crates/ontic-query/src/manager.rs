//! Query lifecycle manager
//!
//! Builds queries from any specification form, tracks every query until it is
//! closed and fronts explanation dispatch. Tracked queries are shared behind
//! `Arc<Mutex<_>>` so bulk teardown can reach them while callers hold them.

use crate::config::QueryConfig;
use crate::dispatch::ExplanationDispatch;
use crate::error::QueryError;
use crate::metrics::LifecycleMetrics;
use crate::query::{Query, QueryId, QueryState};
use crate::spec::{QuerySpecification, TermRef};
use ontic_domain::traits::{ExplanationGenerator, KbApiService, QueryApiService, SessionApiService};
use ontic_domain::{
    Context, Explanation, ExplanationSpec, InferenceParameters, ProofView, QueryAnswer, Sentence,
};
use ontic_registry::{CapabilityKind, CapabilityRegistry, RegistryError};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// A tracked query shared between its caller and the manager
pub type SharedQuery = Arc<Mutex<Query>>;

/// Lock a query, recovering from a poisoned lock
pub fn lock_query(query: &SharedQuery) -> MutexGuard<'_, Query> {
    query.lock().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A query whose close did not release cleanly
#[derive(Debug)]
pub struct CloseFailure {
    /// Query that failed to release
    pub query: QueryId,

    /// Why
    pub error: QueryError,
}

/// Outcome of a bulk close
#[derive(Debug, Default)]
pub struct CloseReport {
    /// Queries closed, including those whose release failed
    pub closed: usize,

    /// Release failures, in close order
    pub failures: Vec<CloseFailure>,
}

impl CloseReport {
    /// Whether every release succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of one pass over the open queries
#[derive(Debug, Default)]
pub struct PollSummary {
    /// Started queries polled
    pub polled: usize,

    /// New answers fetched
    pub answers: usize,

    /// Queries seen terminated, then closed and untracked
    pub terminated: usize,

    /// Queries found already closed and untracked
    pub untracked: usize,

    /// Polls or releases that failed
    pub failures: Vec<CloseFailure>,
}

/// Entry point for building, tracking and explaining queries
#[derive(Clone)]
pub struct QueryLifecycleManager {
    kb: Arc<dyn KbApiService>,
    queries: Option<Arc<dyn QueryApiService>>,
    sessions: Arc<dyn SessionApiService>,
    dispatch: ExplanationDispatch,
    config: QueryConfig,
    open: Arc<Mutex<BTreeMap<QueryId, SharedQuery>>>,
    metrics: Arc<Mutex<LifecycleMetrics>>,
}

impl QueryLifecycleManager {
    /// Manager over explicit capabilities
    pub fn new(
        kb: Arc<dyn KbApiService>,
        queries: Option<Arc<dyn QueryApiService>>,
        sessions: Arc<dyn SessionApiService>,
        dispatch: ExplanationDispatch,
        config: QueryConfig,
    ) -> Self {
        Self {
            kb,
            queries,
            sessions,
            dispatch,
            config,
            open: Arc::new(Mutex::new(BTreeMap::new())),
            metrics: Arc::new(Mutex::new(LifecycleMetrics::new())),
        }
    }

    /// Manager over the capabilities bound in a registry
    ///
    /// # Errors
    ///
    /// `ServiceBinding` when the knowledge-object or session capability is
    /// missing. Stored queries and explanation providers are optional.
    pub fn from_registry(
        registry: &CapabilityRegistry,
        config: QueryConfig,
    ) -> Result<Self, QueryError> {
        config.validate()?;
        let kb = registry
            .kb_api_service(false)?
            .ok_or_else(|| RegistryError::missing(CapabilityKind::KnowledgeObjects))?;
        let sessions = registry
            .session_api_service(false)?
            .ok_or_else(|| RegistryError::missing(CapabilityKind::Sessions))?;
        let queries = registry.query_api_service(true)?;
        if queries.is_none() {
            warn!("No stored-query provider bound; stored-term queries will fail");
        }
        let dispatch = ExplanationDispatch::from_registry(registry)?;

        info!(
            "Query lifecycle manager ready ({} explanation kinds)",
            dispatch.resolver().kinds().count()
        );
        Ok(Self::new(kb, queries, sessions, dispatch, config))
    }

    /// Manager over the process-wide registry
    pub fn from_global(config: QueryConfig) -> Result<Self, QueryError> {
        let registry = ontic_registry::global::global()?;
        Self::from_registry(&registry, config)
    }

    /// Build and track a query from any specification form
    ///
    /// The query is not submitted until [`Query::start`].
    ///
    /// # Errors
    ///
    /// Construction errors for malformed text, parameters or indexicals,
    /// unknown or non-individual terms; `ServiceBinding` for a stored query
    /// without a stored-query provider; backend errors from lookups.
    pub fn query(&self, spec: QuerySpecification) -> Result<SharedQuery, QueryError> {
        let request = spec.normalize(self.kb.as_ref(), self.queries.as_deref(), &self.config)?;
        let session = self.sessions.current_session()?;
        let query = Query::new(request, session, &self.config);
        let id = query.id();

        debug!(
            "Query {} built from {} form: {}",
            id,
            spec.form(),
            query.sentence()
        );
        lock(&self.metrics).record_created(spec.form());

        let shared = Arc::new(Mutex::new(query));
        lock(&self.open).insert(id, Arc::clone(&shared));
        Ok(shared)
    }

    /// Query from text, in the default context with default parameters
    pub fn query_text(&self, text: &str) -> Result<SharedQuery, QueryError> {
        self.query(QuerySpecification::text(text))
    }

    /// Query from text in a named context
    pub fn query_in_context(&self, text: &str, context: &str) -> Result<SharedQuery, QueryError> {
        self.query(QuerySpecification::in_context(text, context))
    }

    /// Query from text in a named context with a parameter string
    pub fn query_with_parameters(
        &self,
        text: &str,
        context: &str,
        parameters: &str,
    ) -> Result<SharedQuery, QueryError> {
        self.query(QuerySpecification::with_parameters(text, context, parameters))
    }

    /// Query from a built sentence and context
    pub fn query_sentence(
        &self,
        sentence: Sentence,
        context: Context,
        parameters: Option<InferenceParameters>,
    ) -> Result<SharedQuery, QueryError> {
        self.query(QuerySpecification::structured(sentence, context, parameters))
    }

    /// Query from a stored specification with indexical substitutions
    pub fn query_stored<I, K, V>(
        &self,
        term: TermRef,
        indexicals: I,
    ) -> Result<SharedQuery, QueryError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.query(QuerySpecification::stored(term, indexicals)?)
    }

    /// Close one query and stop tracking it
    ///
    /// Closing an untracked or already closed query is a no-op.
    pub fn close_query(&self, id: QueryId) -> Result<(), QueryError> {
        let query = lock(&self.open).remove(&id);
        match query {
            Some(query) => self.close_tracked(&query),
            None => Ok(()),
        }
    }

    fn close_tracked(&self, query: &SharedQuery) -> Result<(), QueryError> {
        let mut query = lock_query(query);
        let was_closed = query.is_closed();
        let result = query.close();
        if !was_closed {
            lock(&self.metrics).record_closed(result.is_ok());
        }
        result
    }

    /// Close every tracked query
    ///
    /// Individual failures are collected and never stop the batch; every
    /// tracked query ends closed and untracked.
    pub fn close_all_unclosed_queries(&self) -> CloseReport {
        let drained: Vec<(QueryId, SharedQuery)> = {
            let mut open = lock(&self.open);
            std::mem::take(&mut *open).into_iter().collect()
        };

        let mut report = CloseReport::default();
        for (id, query) in drained {
            if let Err(error) = self.close_tracked(&query) {
                warn!("Failed to release query {}: {}", id, error);
                report.failures.push(CloseFailure { query: id, error });
            }
            report.closed += 1;
        }

        if report.closed > 0 {
            info!(
                "Closed {} queries ({} release failures)",
                report.closed,
                report.failures.len()
            );
        }
        report
    }

    /// Number of tracked queries
    pub fn open_query_count(&self) -> usize {
        lock(&self.open).len()
    }

    /// Whether a query is still tracked
    pub fn is_tracked(&self, id: QueryId) -> bool {
        lock(&self.open).contains_key(&id)
    }

    /// Poll every started query once without waiting
    ///
    /// Termination is observed first, then new answers are fetched, so a
    /// query seen terminated has all of its answers read before it is closed
    /// and untracked; they stay readable through the caller's handle. When
    /// any step fails the failure is reported and the query stays tracked
    /// for the next poll. Queries the caller already closed are untracked.
    pub fn poll_open_queries(&self) -> PollSummary {
        let snapshot: Vec<(QueryId, SharedQuery)> = lock(&self.open)
            .iter()
            .map(|(id, q)| (*id, Arc::clone(q)))
            .collect();

        let mut summary = PollSummary::default();
        for (id, shared) in snapshot {
            let mut query = lock_query(&shared);
            match query.state() {
                QueryState::NotStarted => continue,
                QueryState::Closed => {
                    drop(query);
                    lock(&self.open).remove(&id);
                    summary.untracked += 1;
                    continue;
                }
                _ => {}
            }

            summary.polled += 1;
            let polled = match query.poll() {
                Ok(state) => query.poll_answers().map(|fresh| (fresh.len(), state)),
                Err(error) => Err(error),
            };

            match polled {
                Ok((fresh, state)) => {
                    summary.answers += fresh;
                    if state == QueryState::Terminated {
                        lock(&self.metrics).record_termination();
                        drop(query);
                        lock(&self.open).remove(&id);
                        summary.terminated += 1;
                        debug!("Query {} terminated; releasing", id);
                        if let Err(error) = self.close_tracked(&shared) {
                            warn!("Failed to release query {}: {}", id, error);
                            summary.failures.push(CloseFailure { query: id, error });
                        }
                    }
                }
                Err(error) => {
                    debug!("Polling query {} failed: {}", id, error);
                    summary.failures.push(CloseFailure { query: id, error });
                }
            }
        }

        lock(&self.metrics).record_poll();
        summary
    }

    /// Explanation dispatch
    pub fn dispatch(&self) -> &ExplanationDispatch {
        &self.dispatch
    }

    /// Generator for an answer under `spec`
    pub fn explanation_generator(
        &self,
        answer: &QueryAnswer,
        spec: Option<&ExplanationSpec>,
    ) -> Result<Box<dyn ExplanationGenerator>, QueryError> {
        self.dispatch.explanation_generator(answer, spec)
    }

    /// Explanation for an answer under `spec`
    pub fn explanation(
        &self,
        answer: &QueryAnswer,
        spec: Option<&ExplanationSpec>,
    ) -> Result<Explanation, QueryError> {
        self.dispatch.explanation(answer, spec)
    }

    /// Default proof-view specification
    pub fn proof_view_specification(&self) -> ExplanationSpec {
        self.dispatch.proof_view_specification()
    }

    /// Proof-view generator; `None` uses the default specification
    pub fn proof_view_generator(
        &self,
        answer: &QueryAnswer,
        spec: Option<&ExplanationSpec>,
    ) -> Result<Box<dyn ExplanationGenerator>, QueryError> {
        self.dispatch.proof_view_generator(answer, spec)
    }

    /// Proof view for an answer; `None` uses the default specification
    pub fn proof_view(
        &self,
        answer: &QueryAnswer,
        spec: Option<&ExplanationSpec>,
    ) -> Result<ProofView, QueryError> {
        self.dispatch.proof_view(answer, spec)
    }

    /// Explanation for an answer of a tracked query
    ///
    /// When the answer carries no proof, the query's handle is asked for the
    /// first proof before dispatch.
    pub fn explain_answer(
        &self,
        query: &SharedQuery,
        answer: &QueryAnswer,
        spec: Option<&ExplanationSpec>,
    ) -> Result<Explanation, QueryError> {
        let mut answer = answer.clone();
        if answer.proof.is_none() {
            let mut query = lock_query(query);
            if !query.is_closed() {
                answer.proof = query.first_proof_id(answer.id)?;
            }
        }
        self.dispatch.explanation(&answer, spec)
    }

    /// Snapshot of the lifecycle metrics
    pub fn metrics(&self) -> LifecycleMetrics {
        lock(&self.metrics).clone()
    }

    /// Reset the lifecycle metrics
    pub fn reset_metrics(&self) {
        lock(&self.metrics).reset();
    }

    /// Query configuration
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Knowledge-object capability
    pub fn kb(&self) -> &Arc<dyn KbApiService> {
        &self.kb
    }

    /// Session capability
    pub fn sessions(&self) -> &Arc<dyn SessionApiService> {
        &self.sessions
    }
}

impl fmt::Debug for QueryLifecycleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryLifecycleManager")
            .field("open", &self.open_query_count())
            .field("stored_queries", &self.queries.is_some())
            .field("dispatch", &self.dispatch)
            .field("config", &self.config)
            .finish()
    }
}
