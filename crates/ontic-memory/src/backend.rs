//! In-memory knowledge base, session and inference channel

use crate::script::{InferenceScript, ScriptedAnswer};
use ontic_domain::term::normalize_constant_name;
use ontic_domain::traits::{
    AssertionStore, InferenceChannel, KnowledgeObjectFactory, QueryApiService, Session,
    SessionApiService, StoredQuery,
};
use ontic_domain::{
    AnswerId, Argument, Assertion, AssertionId, BackendError, CommitRequest, Context, Direction,
    InferenceId, InferenceRequest, InferenceStatus, KbTerm, ProofId, QueryAnswer, SessionId,
    TermKind, TerminationReason, INFERENCE_PSC,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Contexts every backend starts with
pub const BUILTIN_CONTEXTS: [&str; 3] = [INFERENCE_PSC, "BaseKB", "UniversalVocabularyMt"];

/// Reason given when deleting a purely forward-deduced assertion
pub const FORWARD_DEDUCED_REASON: &str =
    "assertion is supported only by forward deductions and would be re-derived";

pub(crate) struct InferenceRecord {
    pub(crate) request: InferenceRequest,
    pub(crate) answers: Vec<ScriptedAnswer>,
    started_at: u64,
    duration_secs: Option<u64>,
    honors_interrupts: bool,
    interrupt: Option<(u64, Option<u32>)>,
    status: InferenceStatus,
}

impl InferenceRecord {
    fn refresh(&mut self, now: u64) {
        if self.status.is_terminated() {
            return;
        }
        if let Some((at, Some(patience))) = self.interrupt {
            if now >= at + u64::from(patience) {
                self.status = InferenceStatus::Terminated(TerminationReason::Forced);
                return;
            }
        }
        if let Some(duration) = self.duration_secs {
            if now >= self.started_at + duration {
                self.status = InferenceStatus::Terminated(TerminationReason::Exhausted);
            }
        }
    }

    pub(crate) fn proof_visible(&self, answer: &ScriptedAnswer, now: u64) -> bool {
        answer.proven && now >= self.started_at + answer.proof_lag_secs
    }
}

#[derive(Default)]
pub(crate) struct MemoryState {
    unreachable: bool,
    clock: u64,
    contexts: BTreeSet<String>,
    terms: BTreeMap<String, KbTerm>,
    stored: BTreeMap<String, StoredQuery>,
    assertions: BTreeMap<AssertionId, Assertion>,
    next_assertion: u64,
    scripts: BTreeMap<String, InferenceScript>,
    pub(crate) inferences: BTreeMap<InferenceId, InferenceRecord>,
    next_problem_store: u32,
    next_inference: u32,
    calls: Vec<String>,
}

impl MemoryState {
    fn check(&mut self, call: String) -> Result<(), BackendError> {
        if self.unreachable {
            return Err(BackendError::unavailable(call, "backend unreachable"));
        }
        self.calls.push(call);
        Ok(())
    }

    pub(crate) fn now(&self) -> u64 {
        self.clock
    }

    pub(crate) fn assertion(&self, id: AssertionId) -> Option<&Assertion> {
        self.assertions.get(&id)
    }

    fn inference_mut(&mut self, id: InferenceId) -> Result<&mut InferenceRecord, BackendError> {
        self.inferences
            .get_mut(&id)
            .ok_or_else(|| BackendError::NotFound(format!("inference {}", id)))
    }
}

/// Knowledge base and inference engine held entirely in memory
///
/// Implements every capability surface. Clones share state, so one backend
/// can be bound to several capabilities and still inspected by tests.
///
/// Inference is scripted: [`script`](Self::script) decides how a query
/// sentence behaves. Unscripted sentences are exhausted at once without
/// answers. Time only moves through [`advance`](Self::advance).
///
/// # Examples
///
/// ```
/// use ontic_domain::traits::{InferenceChannel, SessionApiService};
/// use ontic_domain::{InferenceRequest, InferenceParameters, Sentence, Context};
/// use ontic_memory::{InferenceScript, MemoryBackend, ScriptedAnswer};
///
/// let backend = MemoryBackend::new();
/// backend.script("(#$isa ?X #$Dog)", InferenceScript::exhausted()
///     .with_answer(ScriptedAnswer::new().bind("?X", "Rex")));
///
/// let session = backend.current_session().unwrap();
/// let request = InferenceRequest {
///     sentence: Sentence::parse("(#$isa ?X #$Dog)").unwrap(),
///     context: Context::default(),
///     parameters: InferenceParameters::new(),
/// };
/// let id = session.channel().submit(&request).unwrap();
/// let answers = session.channel().answers(id, 0).unwrap();
/// assert_eq!(answers[0].binding("?X"), Some("Rex"));
/// ```
#[derive(Clone)]
pub struct MemoryBackend {
    pub(crate) state: Arc<Mutex<MemoryState>>,
    session: Arc<Mutex<Option<Arc<MemorySession>>>>,
}

impl MemoryBackend {
    /// Empty backend with the builtin contexts
    pub fn new() -> Self {
        let state = MemoryState {
            contexts: BUILTIN_CONTEXTS.iter().map(|c| c.to_string()).collect(),
            next_assertion: 1,
            next_problem_store: 1,
            next_inference: 1,
            ..MemoryState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            session: Arc::new(Mutex::new(None)),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a context
    pub fn add_context(&self, name: &str) -> &Self {
        self.lock()
            .contexts
            .insert(normalize_constant_name(name).to_string());
        self
    }

    /// Add a term
    pub fn add_term(&self, term: KbTerm) -> &Self {
        self.lock().terms.insert(term.name().to_string(), term);
        self
    }

    /// Store a query specification under an individual of the same name
    pub fn define_query(&self, name: &str, query: StoredQuery) -> KbTerm {
        let term = KbTerm::individual(name);
        let mut state = self.lock();
        state.terms.insert(term.name().to_string(), term.clone());
        state.stored.insert(term.name().to_string(), query);
        term
    }

    /// Decide how inferences on `sentence` behave
    ///
    /// The sentence text is normalized the way [`ontic_domain::Sentence`]
    /// normalizes it; unparsable text never matches.
    pub fn script(&self, sentence: &str, script: InferenceScript) -> &Self {
        if let Ok(sentence) = ontic_domain::Sentence::parse(sentence) {
            self.lock()
                .scripts
                .insert(sentence.as_str().to_string(), script);
        }
        self
    }

    /// Store an assertion with explicit arguments
    ///
    /// Used to seed deduced assertions that cannot be committed directly.
    pub fn insert_assertion(
        &self,
        request: CommitRequest,
        arguments: Vec<Argument>,
    ) -> Assertion {
        let mut state = self.lock();
        let id = AssertionId::from_value(state.next_assertion);
        state.next_assertion += 1;
        let assertion = Assertion::from_commit(id, request, arguments);
        state.assertions.insert(id, assertion.clone());
        assertion
    }

    /// Make every call fail as unreachable, or reachable again
    pub fn set_reachable(&self, reachable: bool) {
        self.lock().unreachable = !reachable;
    }

    /// Move the backend clock forward
    ///
    /// Inferences past their duration are exhausted; interrupted inferences
    /// past their patience are forced to stop.
    pub fn advance(&self, secs: u64) {
        let mut state = self.lock();
        state.clock += secs;
        let now = state.clock;
        for record in state.inferences.values_mut() {
            record.refresh(now);
        }
    }

    /// Close the current session; the next request opens a new one
    pub fn close_session(&self) {
        let session = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(session) = session {
            session.closed.store(true, Ordering::SeqCst);
            debug!("Memory session {} closed", session.id);
        }
    }

    /// Calls received, in order
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Number of committed assertions
    pub fn assertion_count(&self) -> usize {
        self.lock().assertions.len()
    }

    /// Status of an inference without recording a call
    pub fn inference_status(&self, id: InferenceId) -> Option<InferenceStatus> {
        self.lock().inferences.get(&id).map(|r| r.status)
    }

    /// Ids of inferences not yet released
    pub fn unreleased_inferences(&self) -> Vec<InferenceId> {
        self.lock()
            .inferences
            .iter()
            .filter(|(_, r)| r.status != InferenceStatus::Terminated(TerminationReason::Released))
            .map(|(id, _)| *id)
            .collect()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("MemoryBackend")
            .field("contexts", &state.contexts.len())
            .field("terms", &state.terms.len())
            .field("assertions", &state.assertions.len())
            .field("inferences", &state.inferences.len())
            .field("clock", &state.clock)
            .finish()
    }
}

impl KnowledgeObjectFactory for MemoryBackend {
    fn find_context(&self, name: &str) -> Result<Option<Context>, BackendError> {
        let mut state = self.lock();
        state.check(format!("find_context {}", name))?;
        let name = normalize_constant_name(name);
        if !state.contexts.contains(name) {
            return Ok(None);
        }
        Ok(Context::new(name).ok())
    }

    fn find_term(&self, name: &str) -> Result<Option<KbTerm>, BackendError> {
        let mut state = self.lock();
        state.check(format!("find_term {}", name))?;
        let name = normalize_constant_name(name);
        if let Some(term) = state.terms.get(name) {
            return Ok(Some(term.clone()));
        }
        if state.contexts.contains(name) {
            return Ok(Some(KbTerm::new(name, TermKind::Context)));
        }
        Ok(None)
    }
}

impl AssertionStore for MemoryBackend {
    fn commit_assertion(&self, request: CommitRequest) -> Result<Assertion, BackendError> {
        let mut state = self.lock();
        state.check(format!("commit {}", request.formula()))?;
        if !state.contexts.contains(request.context().name()) {
            return Err(BackendError::Rejected(format!(
                "unknown context {}",
                request.context()
            )));
        }

        let id = AssertionId::from_value(state.next_assertion);
        state.next_assertion += 1;
        let assertion = Assertion::from_commit(id, request, vec![Argument::Asserted]);
        debug!(
            "Committed {} as {} {}",
            id,
            assertion.direction().as_str(),
            assertion.strength().as_str()
        );
        state.assertions.insert(id, assertion.clone());
        Ok(assertion)
    }

    fn find_assertion(&self, id: AssertionId) -> Result<Option<Assertion>, BackendError> {
        let mut state = self.lock();
        state.check(format!("find_assertion {}", id))?;
        Ok(state.assertions.get(&id).cloned())
    }

    fn delete_assertion(&self, id: AssertionId) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.check(format!("delete {}", id))?;
        let assertion = state
            .assertions
            .get(&id)
            .ok_or_else(|| BackendError::NotFound(id.to_string()))?;
        if assertion.is_purely_forward_deduced() {
            return Err(BackendError::DeletionRefused {
                assertion: id,
                reason: FORWARD_DEDUCED_REASON.to_string(),
            });
        }
        state.assertions.remove(&id);
        Ok(())
    }

    fn change_direction(
        &self,
        id: AssertionId,
        direction: Direction,
    ) -> Result<Assertion, BackendError> {
        let mut state = self.lock();
        state.check(format!("change_direction {}", id))?;
        let assertion = state
            .assertions
            .remove(&id)
            .ok_or_else(|| BackendError::NotFound(id.to_string()))?;
        let changed = assertion.redirected(direction);
        state.assertions.insert(id, changed.clone());
        Ok(changed)
    }
}

impl QueryApiService for MemoryBackend {
    fn load_query_specification(&self, term: &KbTerm) -> Result<Option<StoredQuery>, BackendError> {
        let mut state = self.lock();
        state.check(format!("load_query {}", term))?;
        Ok(state.stored.get(term.name()).cloned())
    }
}

impl SessionApiService for MemoryBackend {
    fn current_session(&self) -> Result<Arc<dyn Session>, BackendError> {
        let problem_store = {
            let mut state = self.lock();
            state.check("current_session".to_string())?;
            state.next_problem_store
        };

        let mut current = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = current.as_ref() {
            if !session.is_closed() {
                return Ok(Arc::clone(session) as Arc<dyn Session>);
            }
        }

        self.lock().next_problem_store += 1;
        let session = Arc::new(MemorySession {
            id: SessionId::new(),
            closed: Arc::new(AtomicBool::new(false)),
            problem_store,
            state: Arc::clone(&self.state),
        });
        debug!("Memory session {} opened", session.id);
        *current = Some(Arc::clone(&session));
        Ok(session as Arc<dyn Session>)
    }
}

/// Session over a [`MemoryBackend`]
///
/// All inferences of one session share a problem store.
pub struct MemorySession {
    id: SessionId,
    closed: Arc<AtomicBool>,
    problem_store: u32,
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySession {
    /// Problem store shared by this session's inferences
    pub fn problem_store(&self) -> u32 {
        self.problem_store
    }
}

impl Session for MemorySession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn channel(&self) -> Arc<dyn InferenceChannel> {
        Arc::new(MemoryChannel {
            closed: Arc::clone(&self.closed),
            problem_store: self.problem_store,
            state: Arc::clone(&self.state),
        })
    }
}

struct MemoryChannel {
    closed: Arc<AtomicBool>,
    problem_store: u32,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryChannel {
    fn open(&self, call: String) -> Result<MutexGuard<'_, MemoryState>, BackendError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BackendError::unavailable(call, "session closed"));
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.check(call)?;
        Ok(state)
    }
}

impl InferenceChannel for MemoryChannel {
    fn submit(&self, request: &InferenceRequest) -> Result<InferenceId, BackendError> {
        let mut state = self.open(format!("submit {}", request.sentence))?;
        let id = InferenceId::new(self.problem_store, state.next_inference);
        state.next_inference += 1;

        let script = state
            .scripts
            .get(request.sentence.as_str())
            .cloned()
            .unwrap_or_default();
        let duration_secs = match (script.duration_secs, request.parameters.max_time()) {
            (Some(d), Some(max)) => Some(d.min(max)),
            (d, max) => d.or(max),
        };

        let mut record = InferenceRecord {
            request: request.clone(),
            answers: script.answers,
            started_at: state.clock,
            duration_secs,
            honors_interrupts: script.honors_interrupts,
            interrupt: None,
            status: InferenceStatus::Running,
        };
        record.refresh(state.clock);
        debug!("Inference {} submitted: {}", id, request.sentence);
        state.inferences.insert(id, record);
        Ok(id)
    }

    fn status(&self, id: InferenceId) -> Result<InferenceStatus, BackendError> {
        let mut state = self.open(format!("status {}", id))?;
        let now = state.clock;
        let record = state.inference_mut(id)?;
        record.refresh(now);
        Ok(record.status)
    }

    fn answers(&self, id: InferenceId, offset: usize) -> Result<Vec<QueryAnswer>, BackendError> {
        let mut state = self.open(format!("answers {} {}", id, offset))?;
        let now = state.clock;
        let record = state.inference_mut(id)?;
        if record.status == InferenceStatus::Terminated(TerminationReason::Released) {
            return Err(BackendError::NotFound(format!("inference {} was released", id)));
        }

        let answers = record
            .answers
            .iter()
            .enumerate()
            .skip(offset)
            .map(|(index, scripted)| {
                let index = u32::try_from(index).unwrap_or(u32::MAX);
                let mut answer = QueryAnswer::new(AnswerId(index), id);
                for (variable, value) in &scripted.bindings {
                    answer = answer.with_binding(variable.clone(), value.clone());
                }
                if record.proof_visible(scripted, now) {
                    answer = answer.with_proof(ProofId(index));
                }
                answer
            })
            .collect();
        Ok(answers)
    }

    fn first_proof_id(
        &self,
        id: InferenceId,
        answer: AnswerId,
    ) -> Result<Option<ProofId>, BackendError> {
        let mut state = self.open(format!("first_proof_id {} {}", id, answer.0))?;
        let now = state.clock;
        let record = state.inference_mut(id)?;
        let proof = usize::try_from(answer.0)
            .ok()
            .and_then(|index| record.answers.get(index))
            .filter(|scripted| record.proof_visible(scripted, now))
            .map(|_| ProofId(answer.0));
        Ok(proof)
    }

    fn interrupt(&self, id: InferenceId, patience: Option<u32>) -> Result<(), BackendError> {
        let mut state = self.open(format!("interrupt {}", id))?;
        let now = state.clock;
        let record = state.inference_mut(id)?;
        record.refresh(now);
        if record.status.is_terminated() {
            return Ok(());
        }
        if record.honors_interrupts {
            record.status = InferenceStatus::Terminated(TerminationReason::Interrupted);
        } else {
            let since = record.interrupt.map_or(now, |(at, _)| at);
            record.interrupt = Some((since, patience));
            record.refresh(now);
        }
        Ok(())
    }

    fn release(&self, id: InferenceId) -> Result<(), BackendError> {
        let mut state = self.open(format!("release {}", id))?;
        let record = state.inference_mut(id)?;
        record.status = InferenceStatus::Terminated(TerminationReason::Released);
        Ok(())
    }
}
