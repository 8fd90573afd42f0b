//! Metrics collection for query lifecycle operations

use std::collections::BTreeMap;

/// Metrics collected by the query lifecycle manager
///
/// Tracks queries created per specification form, closes, release failures
/// and terminations seen by the poller.
#[derive(Debug, Clone, Default)]
pub struct LifecycleMetrics {
    /// Queries created per specification form
    pub created: BTreeMap<&'static str, usize>,

    /// Queries closed, including those whose release failed
    pub closed: usize,

    /// Releases the backend refused or could not receive
    pub close_failures: usize,

    /// Terminations observed by polling
    pub terminations_observed: usize,

    /// Poll cycles completed
    pub poll_cycles: usize,
}

impl LifecycleMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a query built from the given form
    pub fn record_created(&mut self, form: &'static str) {
        *self.created.entry(form).or_insert(0) += 1;
    }

    /// Record a close; `released` is false when the release failed
    pub fn record_closed(&mut self, released: bool) {
        self.closed += 1;
        if !released {
            self.close_failures += 1;
        }
    }

    /// Record an observed termination
    pub fn record_termination(&mut self) {
        self.terminations_observed += 1;
    }

    /// Record a poll cycle completion
    pub fn record_poll(&mut self) {
        self.poll_cycles += 1;
    }

    /// Total queries created across all forms
    pub fn total_created(&self) -> usize {
        self.created.values().sum()
    }

    /// Queries created and not yet closed
    pub fn open(&self) -> usize {
        self.total_created().saturating_sub(self.closed)
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        self.created.clear();
        self.closed = 0;
        self.close_failures = 0;
        self.terminations_observed = 0;
        self.poll_cycles = 0;
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Query Lifecycle Summary".to_string(),
            "=======================".to_string(),
            format!("Poll cycles: {}", self.poll_cycles),
            format!("Terminations observed: {}", self.terminations_observed),
            format!("Closed: {} ({} release failures)", self.closed, self.close_failures),
            String::new(),
        ];

        if !self.created.is_empty() {
            lines.push("Created by form:".to_string());
            for (form, count) in &self.created {
                lines.push(format!("  {}: {}", form, count));
            }
            lines.push(format!("  Total: {}", self.total_created()));
        }

        lines.join("\n")
    }
}
