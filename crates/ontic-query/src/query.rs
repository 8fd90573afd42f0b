//! Query - a normalized inference request and its remote evaluation

use crate::config::QueryConfig;
use crate::error::QueryError;
use crate::handle::{HandleState, InferenceHandle};
use ontic_domain::params::MAX_TIME;
use ontic_domain::traits::Session;
use ontic_domain::{
    AnswerId, BackendError, Context, InferenceId, InferenceParameters, InferenceRequest, ParamValue,
    ProofId, QueryAnswer, Sentence,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Unique identifier for a query, based on UUIDv7
///
/// Ids sort in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryId(u128);

impl QueryId {
    /// Generate a new query id
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Raw value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for QueryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Observable state of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryState {
    /// Built but not submitted
    NotStarted,

    /// Inference running
    Running,

    /// Halt requested, not yet observed
    InterruptRequested,

    /// Inference stopped; answers may still be read
    Terminated,

    /// Closed; backend resources released
    Closed,
}

/// A query built from any specification form
pub struct Query {
    id: QueryId,
    request: InferenceRequest,
    session: Arc<dyn Session>,
    timeout: Option<Duration>,
    default_patience: Option<u32>,
    handle: Option<InferenceHandle>,
    answers: Vec<QueryAnswer>,
    closed: bool,
}

impl Query {
    /// Build a query over a normalized request
    pub fn new(request: InferenceRequest, session: Arc<dyn Session>, config: &QueryConfig) -> Self {
        Self {
            id: QueryId::new(),
            request,
            session,
            timeout: config.default_timeout(),
            default_patience: config.default_patience_secs,
            handle: None,
            answers: Vec::new(),
            closed: false,
        }
    }

    /// Query id
    pub fn id(&self) -> QueryId {
        self.id
    }

    /// Normalized request
    pub fn request(&self) -> &InferenceRequest {
        &self.request
    }

    /// Query sentence
    pub fn sentence(&self) -> &Sentence {
        &self.request.sentence
    }

    /// Query context
    pub fn context(&self) -> &Context {
        &self.request.context
    }

    /// Inference parameters
    pub fn parameters(&self) -> &InferenceParameters {
        &self.request.parameters
    }

    /// Execution timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Change the execution timeout; only effective before `start`
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// Owning session
    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    /// Inference handle, once started
    pub fn handle(&self) -> Option<&InferenceHandle> {
        self.handle.as_ref()
    }

    /// Current state
    pub fn state(&self) -> QueryState {
        if self.closed {
            return QueryState::Closed;
        }
        match self.handle.as_ref().map(InferenceHandle::state) {
            None => QueryState::NotStarted,
            Some(HandleState::Running) => QueryState::Running,
            Some(HandleState::InterruptRequested) => QueryState::InterruptRequested,
            Some(HandleState::Terminated) => QueryState::Terminated,
        }
    }

    /// Whether the query is closed
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Submit the request; starting twice returns the existing inference
    ///
    /// Unless the parameters already set `:max-time`, the timeout is sent
    /// as `:max-time` in whole seconds, rounded up.
    pub fn start(&mut self) -> Result<InferenceId, QueryError> {
        if self.closed {
            return Err(QueryError::Closed(self.id));
        }
        if let Some(handle) = &self.handle {
            return Ok(handle.id());
        }
        if self.session.is_closed() {
            return Err(BackendError::unavailable("submit", "session is closed").into());
        }

        let mut request = self.request.clone();
        if let Some(timeout) = self.timeout {
            if request.parameters.get(MAX_TIME).is_none() {
                // Whole seconds, rounded up so a sub-second timeout never becomes zero
                let secs = i64::try_from(timeout.as_millis().div_ceil(1000)).unwrap_or(i64::MAX);
                request.parameters.set(MAX_TIME, ParamValue::Int(secs));
            }
        }

        let id = self.session.channel().submit(&request)?;
        debug!("Query {} started as inference {}", self.id, id);
        self.handle = Some(InferenceHandle::new(id, Arc::clone(&self.session)));
        Ok(id)
    }

    fn handle_mut(&mut self) -> Result<&mut InferenceHandle, QueryError> {
        if self.closed {
            return Err(QueryError::Closed(self.id));
        }
        let id = self.id;
        self.handle.as_mut().ok_or(QueryError::NotStarted(id))
    }

    /// Fetch answers produced since the last call, without waiting
    ///
    /// Proofs reported with answers are recorded on the handle. Nothing new
    /// arrives once the session is closed.
    pub fn poll_answers(&mut self) -> Result<&[QueryAnswer], QueryError> {
        let offset = self.answers.len();
        let handle = self.handle_mut()?;
        if handle.session().is_closed() {
            return Ok(&[]);
        }
        let fresh = handle.session().channel().answers(handle.id(), offset)?;
        for answer in &fresh {
            if let Some(proof) = answer.proof {
                handle.record_proof(answer.id, proof);
            }
        }
        self.answers.extend(fresh);
        Ok(&self.answers[offset..])
    }

    /// Every answer fetched so far
    pub fn answers(&self) -> &[QueryAnswer] {
        &self.answers
    }

    /// First proof of an answer; `Ok(None)` when none is known yet
    pub fn first_proof_id(&mut self, answer: AnswerId) -> Result<Option<ProofId>, QueryError> {
        Ok(self.handle_mut()?.first_proof_id(answer)?)
    }

    /// Observe termination without waiting
    pub fn poll(&mut self) -> Result<QueryState, QueryError> {
        if self.closed || self.handle.is_none() {
            return Ok(self.state());
        }
        self.handle_mut()?.poll()?;
        Ok(self.state())
    }

    /// Request a halt with an explicit patience; no-op unless running
    pub fn interrupt(&mut self, patience: Option<u32>) -> Result<(), QueryError> {
        if self.closed {
            return Ok(());
        }
        match self.handle.as_mut() {
            Some(handle) => Ok(handle.interrupt(patience)?),
            None => Ok(()),
        }
    }

    /// Request a halt with the configured default patience
    pub fn stop(&mut self) -> Result<(), QueryError> {
        self.interrupt(self.default_patience)
    }

    /// Close the query and release its inference; idempotent
    ///
    /// The query is closed even when the release fails; the failure is
    /// still returned.
    pub fn close(&mut self) -> Result<(), QueryError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        debug!("Closing query {}", self.id);
        match self.handle.as_mut() {
            Some(handle) => Ok(handle.close()?),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("id", &self.id)
            .field("sentence", &self.request.sentence.as_str())
            .field("context", &self.request.context.name())
            .field("state", &self.state())
            .field("answers", &self.answers.len())
            .finish()
    }
}
