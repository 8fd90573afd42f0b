//! Ontic Query
//!
//! Lifecycle management for long-running, remotely executing inference
//! queries and dispatch of answer explanations.
//!
//! # Overview
//!
//! - **Query construction**: five equivalent specification forms, normalized
//!   to one `(sentence, context, parameters)` triple before submission
//! - **Inference handles**: graceful-then-forced cancellation through
//!   interrupt patience, idempotent close, proof lookup per answer
//! - **Tracking**: every query stays tracked until closed, so a session can be
//!   torn down with one call
//! - **Explanations**: proof views and other explanation kinds routed to the
//!   single provider that accepts the answer
//!
//! # Query Lifecycle
//!
//! | State | Entered by | Leaves via |
//! |-------|------------|------------|
//! | **NotStarted** | construction | `start` |
//! | **Running** | `start` | `interrupt`, backend exhaustion, `close` |
//! | **InterruptRequested** | `interrupt` | backend halt or forced halt after patience, `close` |
//! | **Terminated** | observed by `poll` | `close` |
//! | **Closed** | `close`, bulk teardown | never |
//!
//! Termination is observed by polling, either directly through
//! [`Query::poll`] or by a [`TerminationPoller`].
//!
//! # Usage
//!
//! ```no_run
//! use ontic_query::{lock_query, QueryConfig, QueryLifecycleManager};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = QueryLifecycleManager::from_global(QueryConfig::default())?;
//!
//! let query = manager.query_in_context("(isa ?X Dog)", "BaseKB")?;
//! {
//!     let mut query = lock_query(&query);
//!     query.start()?;
//!     for answer in query.poll_answers()? {
//!         println!("{:?}", answer.binding("?X"));
//!     }
//!     query.stop()?;
//! }
//!
//! let report = manager.close_all_unclosed_queries();
//! println!("closed {} queries", report.closed);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! default_context = "InferencePSC"
//! default_parameters = ":max-number 100"
//! default_timeout_secs = 60
//! default_patience_secs = 5
//! poll_interval_ms = 250
//! ```

#![warn(missing_docs)]

mod config;
mod dispatch;
mod error;
mod handle;
mod manager;
mod metrics;
mod poller;
mod query;
mod spec;

pub use config::QueryConfig;
pub use dispatch::ExplanationDispatch;
pub use error::QueryError;
pub use handle::{HandleState, InferenceHandle};
pub use manager::{
    lock_query, CloseFailure, CloseReport, PollSummary, QueryLifecycleManager, SharedQuery,
};
pub use metrics::LifecycleMetrics;
pub use poller::TerminationPoller;
pub use query::{Query, QueryId, QueryState};
pub use spec::{QuerySpecification, TermRef};
