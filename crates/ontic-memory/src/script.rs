//! Scripted inference behaviour

use ontic_domain::AssertionId;
use std::collections::BTreeMap;

/// One answer a scripted inference produces
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScriptedAnswer {
    /// Variable bindings
    pub bindings: BTreeMap<String, String>,

    /// Assertions the answer rests on
    pub supports: Vec<AssertionId>,

    /// Whether the answer is proven at all
    pub proven: bool,

    /// Seconds after submission before the proof can be looked up
    pub proof_lag_secs: u64,
}

impl ScriptedAnswer {
    /// Proven answer with no bindings
    pub fn new() -> Self {
        Self {
            proven: true,
            ..Self::default()
        }
    }

    /// Add a binding
    pub fn bind(mut self, variable: impl Into<String>, value: impl Into<String>) -> Self {
        self.bindings.insert(variable.into(), value.into());
        self
    }

    /// Add a supporting assertion
    pub fn supported_by(mut self, assertion: AssertionId) -> Self {
        self.supports.push(assertion);
        self
    }

    /// Make the proof available only after `secs` on the backend clock
    pub fn proof_after(mut self, secs: u64) -> Self {
        self.proof_lag_secs = secs;
        self
    }

    /// Answer without any proof
    pub fn unproven(mut self) -> Self {
        self.proven = false;
        self
    }
}

/// How an inference for one sentence behaves
///
/// # Examples
///
/// ```
/// use ontic_memory::{InferenceScript, ScriptedAnswer};
///
/// // Runs until interrupted, then ignores the interrupt until forced
/// let script = InferenceScript::running()
///     .with_answer(ScriptedAnswer::new().bind("?X", "Rex"))
///     .ignoring_interrupts();
/// assert!(script.duration_secs.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceScript {
    /// Answers, all visible as soon as the inference starts
    pub answers: Vec<ScriptedAnswer>,

    /// Seconds until the inference exhausts itself; `None` runs until halted
    pub duration_secs: Option<u64>,

    /// Whether an interrupt halts the inference at once
    pub honors_interrupts: bool,
}

impl InferenceScript {
    /// Inference that is exhausted as soon as it starts
    pub fn exhausted() -> Self {
        Self {
            answers: Vec::new(),
            duration_secs: Some(0),
            honors_interrupts: true,
        }
    }

    /// Inference that runs until interrupted or timed out
    pub fn running() -> Self {
        Self {
            duration_secs: None,
            ..Self::exhausted()
        }
    }

    /// Inference exhausted after `secs`
    pub fn lasting(secs: u64) -> Self {
        Self {
            duration_secs: Some(secs),
            ..Self::exhausted()
        }
    }

    /// Add an answer
    pub fn with_answer(mut self, answer: ScriptedAnswer) -> Self {
        self.answers.push(answer);
        self
    }

    /// Interrupts are acknowledged but only forced termination stops it
    pub fn ignoring_interrupts(mut self) -> Self {
        self.honors_interrupts = false;
        self
    }
}

impl Default for InferenceScript {
    fn default() -> Self {
        Self::exhausted()
    }
}
