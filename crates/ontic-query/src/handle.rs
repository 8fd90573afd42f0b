//! Inference handle - one remote inference process
//!
//! State machine:
//!
//! ```text
//! Running ──interrupt──▶ InterruptRequested ──(observed)──▶ Terminated
//!    │                                                        ▲
//!    └────────────── close / observed completion ─────────────┘
//! ```
//!
//! `interrupt` and `close` only submit requests and never wait on the
//! backend; termination after an interrupt is observed by [`poll`].
//! Both are no-ops once the handle is terminated.
//!
//! [`poll`]: InferenceHandle::poll

use ontic_domain::traits::{InferenceChannel, Session};
use ontic_domain::{
    AnswerId, BackendError, InferenceId, InferenceStatus, ProofId, TerminationReason,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Lifecycle state of an inference handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleState {
    /// Inference is running
    Running,

    /// A cooperative halt was requested
    InterruptRequested,

    /// Inference has stopped or the handle was closed
    Terminated,
}

/// Client-side handle on one remote inference
pub struct InferenceHandle {
    id: InferenceId,
    session: Arc<dyn Session>,
    channel: Arc<dyn InferenceChannel>,
    state: HandleState,
    patience: Option<u32>,
    termination: Option<TerminationReason>,
    proofs: HashMap<AnswerId, ProofId>,
    closed: bool,
}

impl InferenceHandle {
    /// Handle for a freshly submitted inference
    pub fn new(id: InferenceId, session: Arc<dyn Session>) -> Self {
        let channel = session.channel();
        Self {
            id,
            session,
            channel,
            state: HandleState::Running,
            patience: None,
            termination: None,
            proofs: HashMap::new(),
            closed: false,
        }
    }

    /// Full inference identifier
    pub fn id(&self) -> InferenceId {
        self.id
    }

    /// Inference id within the problem store
    pub fn inference_id(&self) -> u32 {
        self.id.inference_id
    }

    /// Problem store the inference runs in
    pub fn problem_store_id(&self) -> u32 {
        self.id.problem_store_id
    }

    /// Owning session
    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    /// Current state
    pub fn state(&self) -> HandleState {
        self.state
    }

    /// Whether the handle is terminated
    pub fn is_terminated(&self) -> bool {
        self.state == HandleState::Terminated
    }

    /// Whether `close` has run
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Patience sent with the last interrupt
    pub fn patience(&self) -> Option<u32> {
        self.patience
    }

    /// Why the inference stopped, when known
    pub fn termination_reason(&self) -> Option<TerminationReason> {
        self.termination
    }

    /// API string form, `(<problem-store-id> <inference-id>)`
    pub fn api_value(&self) -> String {
        format!("({} {})", self.id.problem_store_id, self.id.inference_id)
    }

    fn terminate(&mut self, reason: TerminationReason) {
        if self.state != HandleState::Terminated {
            debug!("Inference {} terminated: {:?}", self.id, reason);
        }
        self.state = HandleState::Terminated;
        self.termination.get_or_insert(reason);
    }

    /// Request a cooperative halt
    ///
    /// `patience` is the grace period in seconds before the backend forces
    /// termination; `None` never forces it. Repeated requests are harmless.
    /// After termination this does nothing. A closed session terminates the
    /// handle instead of contacting the backend.
    ///
    /// # Errors
    ///
    /// `Unavailable` when the backend cannot be reached. The state is left
    /// unchanged so the caller may retry.
    pub fn interrupt(&mut self, patience: Option<u32>) -> Result<(), BackendError> {
        if self.is_terminated() {
            return Ok(());
        }
        if self.session.is_closed() {
            self.terminate(TerminationReason::Released);
            return Ok(());
        }

        self.channel.interrupt(self.id, patience)?;
        self.patience = patience;
        self.state = HandleState::InterruptRequested;
        debug!("Interrupt requested for {} (patience: {:?})", self.id, patience);
        Ok(())
    }

    /// Release the inference
    ///
    /// Clears the answer-to-proof map and asks the backend to release its
    /// resources. The handle ends `Terminated` even if the release fails.
    /// Calling it again, or after the session closed, does nothing.
    ///
    /// # Errors
    ///
    /// `Unavailable` when the release could not be delivered.
    pub fn close(&mut self) -> Result<(), BackendError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.proofs.clear();
        self.terminate(TerminationReason::Released);

        if self.session.is_closed() {
            debug!("Session closed; nothing to release for {}", self.id);
            return Ok(());
        }
        self.channel.release(self.id)
    }

    /// First proof of an answer, if one is known
    ///
    /// Checks the local correlation map, then asks the backend without
    /// waiting. `Ok(None)` means no proof has been materialized yet.
    pub fn first_proof_id(&mut self, answer: AnswerId) -> Result<Option<ProofId>, BackendError> {
        if let Some(proof) = self.proofs.get(&answer) {
            return Ok(Some(*proof));
        }
        if self.closed || self.session.is_closed() {
            return Ok(None);
        }

        let proof = self.channel.first_proof_id(self.id, answer)?;
        if let Some(proof) = proof {
            self.proofs.insert(answer, proof);
        }
        Ok(proof)
    }

    /// Correlate an answer with a proof reported alongside it
    pub fn record_proof(&mut self, answer: AnswerId, proof: ProofId) {
        if !self.closed {
            self.proofs.entry(answer).or_insert(proof);
        }
    }

    /// Observe backend termination without waiting
    pub fn poll(&mut self) -> Result<HandleState, BackendError> {
        if self.is_terminated() {
            return Ok(self.state);
        }
        if self.session.is_closed() {
            self.terminate(TerminationReason::Released);
            return Ok(self.state);
        }

        if let InferenceStatus::Terminated(reason) = self.channel.status(self.id)? {
            self.terminate(reason);
        }
        Ok(self.state)
    }
}

impl fmt::Debug for InferenceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceHandle")
            .field("id", &self.id)
            .field("session", &self.session.id())
            .field("state", &self.state)
            .field("patience", &self.patience)
            .field("termination", &self.termination)
            .field("proofs", &self.proofs.len())
            .finish()
    }
}
