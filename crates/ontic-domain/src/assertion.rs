//! Assertion module - committed facts and rules, and the AUTO policy
//!
//! Direction decides when inference runs for an assertion: `Forward` at
//! assert time, `Backward` at ask time. Strength is part of the truth value:
//! `Monotonic` holds under all conditions, `Default` admits exceptions.
//!
//! Both may be requested as `Auto`. The request is resolved once, when the
//! draft becomes a [`CommitRequest`], so a committed [`Assertion`] never
//! reports `Auto`.

use crate::context::Context;
use crate::sentence::{FormulaClass, Sentence};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned identifier of an assertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssertionId(u64);

impl AssertionId {
    /// Wrap a raw store identifier
    pub fn from_value(value: u64) -> Self {
        Self(value)
    }

    /// Raw identifier value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AssertionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "assertion:{}", self.0)
    }
}

/// When inference is performed for an assertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Inference at assert time
    Forward,

    /// Inference deferred until ask time
    Backward,

    /// Choose based on the formula classification
    Auto,
}

impl Direction {
    /// Resolve `Auto` for a formula of the given class
    ///
    /// Facts and generic assertions go forward, rules go backward. Concrete
    /// directions are returned unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use ontic_domain::{Direction, FormulaClass};
    ///
    /// assert_eq!(Direction::Auto.resolve(FormulaClass::Rule), Direction::Backward);
    /// assert_eq!(Direction::Auto.resolve(FormulaClass::Fact), Direction::Forward);
    /// assert_eq!(Direction::Backward.resolve(FormulaClass::Fact), Direction::Backward);
    /// ```
    pub fn resolve(self, class: FormulaClass) -> Direction {
        match self {
            Direction::Auto => match class {
                FormulaClass::Fact => Direction::Forward,
                FormulaClass::Rule => Direction::Backward,
                FormulaClass::Generic => Direction::Forward,
            },
            concrete => concrete,
        }
    }

    /// Get the direction keyword
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => ":forward",
            Direction::Backward => ":backward",
            Direction::Auto => ":auto",
        }
    }
}

/// Strength component of an assertion's truth value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    /// True always and under all conditions
    Monotonic,

    /// Assumed true, but subject to exceptions
    Default,

    /// Resolves to `Default` for every kind of assertion
    Auto,
}

impl Strength {
    /// Resolve `Auto`; concrete strengths are returned unchanged
    pub fn resolve(self) -> Strength {
        match self {
            Strength::Auto => Strength::Default,
            concrete => concrete,
        }
    }

    /// Get the strength keyword
    pub fn as_str(&self) -> &'static str {
        match self {
            Strength::Monotonic => ":monotonic",
            Strength::Default => ":default",
            Strength::Auto => ":auto",
        }
    }
}

/// One independent justification for an assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    /// Asserted directly by a user
    Asserted,

    /// Deduced by inference from other assertions
    Deduction {
        /// Direction of the inference that produced the deduction
        direction: Direction,

        /// Assertions the deduction rests on
        supports: Vec<AssertionId>,
    },
}

/// An assertion that has not been committed yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionDraft {
    formula: Sentence,
    context: Context,
    class: FormulaClass,
    direction: Direction,
    strength: Strength,
}

impl AssertionDraft {
    fn with_class(formula: Sentence, context: Context, class: FormulaClass) -> Self {
        Self {
            formula,
            context,
            class,
            direction: Direction::Auto,
            strength: Strength::Auto,
        }
    }

    /// Draft a fact
    pub fn fact(formula: Sentence, context: Context) -> Self {
        Self::with_class(formula, context, FormulaClass::Fact)
    }

    /// Draft a rule
    pub fn rule(formula: Sentence, context: Context) -> Self {
        Self::with_class(formula, context, FormulaClass::Rule)
    }

    /// Draft an unclassified assertion
    pub fn generic(formula: Sentence, context: Context) -> Self {
        Self::with_class(formula, context, FormulaClass::Generic)
    }

    /// Draft an assertion classified from the shape of its formula
    pub fn classified(formula: Sentence, context: Context) -> Self {
        let class = formula.classify();
        Self::with_class(formula, context, class)
    }

    /// Request a direction (default `Auto`)
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Request a strength (default `Auto`)
    pub fn with_strength(mut self, strength: Strength) -> Self {
        self.strength = strength;
        self
    }

    /// Requested direction, possibly `Auto`
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Requested strength, possibly `Auto`
    pub fn strength(&self) -> Strength {
        self.strength
    }

    /// Resolve `Auto` values, producing the request a store commits
    pub fn resolve(self) -> CommitRequest {
        CommitRequest {
            direction: self.direction.resolve(self.class),
            strength: self.strength.resolve(),
            formula: self.formula,
            context: self.context,
            class: self.class,
        }
    }
}

/// A draft with `Auto` resolved; the only input a store accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    formula: Sentence,
    context: Context,
    class: FormulaClass,
    direction: Direction,
    strength: Strength,
}

impl CommitRequest {
    /// Formula to commit
    pub fn formula(&self) -> &Sentence {
        &self.formula
    }

    /// Context to commit into
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Classification used to resolve the direction
    pub fn class(&self) -> FormulaClass {
        self.class
    }

    /// Resolved direction
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Resolved strength
    pub fn strength(&self) -> Strength {
        self.strength
    }
}

/// A committed assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    id: AssertionId,
    formula: Sentence,
    context: Context,
    class: FormulaClass,
    direction: Direction,
    strength: Strength,
    arguments: Vec<Argument>,
}

impl Assertion {
    /// Materialize a committed assertion from its commit request
    pub fn from_commit(id: AssertionId, request: CommitRequest, arguments: Vec<Argument>) -> Self {
        Self {
            id,
            formula: request.formula,
            context: request.context,
            class: request.class,
            direction: request.direction,
            strength: request.strength,
            arguments,
        }
    }

    /// Store identifier
    pub fn id(&self) -> AssertionId {
        self.id
    }

    /// The asserted formula
    pub fn formula(&self) -> &Sentence {
        &self.formula
    }

    /// Context the assertion holds in
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Formula classification
    pub fn class(&self) -> FormulaClass {
        self.class
    }

    /// Committed direction; never `Auto`
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Committed strength; never `Auto`
    pub fn strength(&self) -> Strength {
        self.strength
    }

    /// Justifications for this assertion
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Add a justification
    pub fn add_argument(&mut self, argument: Argument) {
        self.arguments.push(argument);
    }

    /// Identifiers of assertions supporting this one through deductions,
    /// without duplicates, in first-seen order
    pub fn supporting_assertion_ids(&self) -> Vec<AssertionId> {
        let mut ids: Vec<AssertionId> = Vec::new();
        for argument in &self.arguments {
            if let Argument::Deduction { supports, .. } = argument {
                for id in supports {
                    if !ids.contains(id) {
                        ids.push(*id);
                    }
                }
            }
        }
        ids
    }

    /// Whether at least one argument is a deduction
    pub fn is_deduced(&self) -> bool {
        self.arguments
            .iter()
            .any(|a| matches!(a, Argument::Deduction { .. }))
    }

    /// Whether at least one argument is a direct assertion
    pub fn is_asserted(&self) -> bool {
        self.arguments.iter().any(|a| *a == Argument::Asserted)
    }

    /// Whether the formula is a ground atomic formula
    pub fn is_ground_atomic_formula(&self) -> bool {
        self.formula.is_ground_atomic()
    }

    /// Whether every argument is a forward deduction.
    ///
    /// Stores refuse to delete such assertions. An assertion without any
    /// argument is not purely forward-deduced.
    pub fn is_purely_forward_deduced(&self) -> bool {
        !self.arguments.is_empty()
            && self.arguments.iter().all(|a| {
                matches!(
                    a,
                    Argument::Deduction {
                        direction: Direction::Forward,
                        ..
                    }
                )
            })
    }

    /// This assertion with a new direction, resolving `Auto` by the same rule
    /// used at commit time
    pub fn redirected(mut self, direction: Direction) -> Self {
        self.direction = direction.resolve(self.class);
        self
    }
}
