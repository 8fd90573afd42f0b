//! Background worker observing query termination

use crate::manager::{PollSummary, QueryLifecycleManager};
use crate::metrics::LifecycleMetrics;
use std::future::Future;
use tokio::time::{interval, Duration};

/// Background worker that polls open queries on a schedule
///
/// Each cycle fetches new answers and closes and untracks queries whose
/// inference has terminated.
///
/// # Examples
///
/// ```no_run
/// use ontic_query::{QueryConfig, QueryLifecycleManager, TerminationPoller};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let manager = QueryLifecycleManager::from_global(QueryConfig::default())?;
///     let mut poller = TerminationPoller::new(manager);
///
///     // Run until Ctrl+C
///     poller.run(async {
///         let _ = tokio::signal::ctrl_c().await;
///     })
///     .await;
///     Ok(())
/// }
/// ```
pub struct TerminationPoller {
    manager: QueryLifecycleManager,
    interval: Duration,
}

impl TerminationPoller {
    /// Poller over a manager, at the manager's configured interval
    pub fn new(manager: QueryLifecycleManager) -> Self {
        let interval = manager.config().poll_interval();
        Self { manager, interval }
    }

    /// Override the poll interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Poll interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn cycle(&self, label: &str) -> PollSummary {
        let summary = self.manager.poll_open_queries();
        for failure in &summary.failures {
            tracing::error!("Poll {} failed for query {}: {}", label, failure.query, failure.error);
        }
        if summary.terminated > 0 || summary.answers > 0 {
            tracing::info!(
                "Poll {}: {} polled, {} new answers, {} terminated",
                label,
                summary.polled,
                summary.answers,
                summary.terminated
            );
        }
        summary
    }

    /// Run until `shutdown` completes
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.interval);
        tokio::pin!(shutdown);

        tracing::info!("Termination poller started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::debug!("Starting poll cycle");
                    self.cycle("cycle");
                }
                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received, stopping poller");
                    break;
                }
            }
        }

        tracing::info!("Termination poller stopped. Final metrics:\n{}", self.metrics().summary());
    }

    /// Run for a fixed number of cycles
    ///
    /// Returns the summaries of every cycle, in order.
    pub async fn run_cycles(&mut self, cycles: usize) -> Vec<PollSummary> {
        let mut ticker = interval(self.interval);
        let mut summaries = Vec::with_capacity(cycles);

        tracing::info!(
            "Termination poller started for {} cycles (interval: {:?})",
            cycles,
            self.interval
        );

        for cycle in 0..cycles {
            ticker.tick().await;
            tracing::debug!("Starting poll cycle {}/{}", cycle + 1, cycles);
            summaries.push(self.cycle(&format!("{}/{}", cycle + 1, cycles)));
        }

        tracing::info!(
            "Termination poller finished {} cycles. Final metrics:\n{}",
            cycles,
            self.metrics().summary()
        );
        summaries
    }

    /// Snapshot of the manager's lifecycle metrics
    pub fn metrics(&self) -> LifecycleMetrics {
        self.manager.metrics()
    }

    /// Reset the manager's lifecycle metrics
    pub fn reset_metrics(&self) {
        self.manager.reset_metrics();
    }

    /// Manager being polled
    pub fn manager(&self) -> &QueryLifecycleManager {
        &self.manager
    }
}
