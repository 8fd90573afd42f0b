//! Configuration for query construction and lifecycle
//!
//! Defines the defaults applied to queries that leave context or parameters
//! unspecified, the execution timeout, interrupt patience and the poll
//! interval of the termination poller.

use crate::error::QueryError;
use ontic_domain::{ConstructionError, Context, InferenceParameters, INFERENCE_PSC};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the query lifecycle manager
///
/// # Examples
///
/// ```
/// use ontic_query::QueryConfig;
///
/// let config = QueryConfig::default();
/// assert_eq!(config.default_context, "InferencePSC");
///
/// // Short timeouts for interactive use
/// let config = QueryConfig::interactive();
/// assert_eq!(config.default_timeout_secs, Some(10));
///
/// // Long-running batch inference
/// let config = QueryConfig::batch();
/// assert_eq!(config.default_timeout_secs, Some(600));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Context used when a query names none
    /// Default: InferencePSC
    #[serde(default = "default_context")]
    pub default_context: String,

    /// Parameters every query starts from, e.g. `:max-number 100`
    /// Default: none
    #[serde(default)]
    pub default_parameters: String,

    /// Execution timeout applied as `:max-time` unless a query sets its own
    /// Default: 60 seconds
    #[serde(default = "default_timeout")]
    pub default_timeout_secs: Option<u64>,

    /// Grace period for interrupts issued without an explicit patience;
    /// `None` never forces termination
    /// Default: 5 seconds
    #[serde(default = "default_patience")]
    pub default_patience_secs: Option<u32>,

    /// How often the termination poller checks open queries
    /// Default: 250 ms
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_context() -> String {
    INFERENCE_PSC.to_string()
}

fn default_timeout() -> Option<u64> {
    Some(60)
}

fn default_patience() -> Option<u32> {
    Some(5)
}

fn default_poll_interval() -> u64 {
    250
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_context: default_context(),
            default_parameters: String::new(),
            default_timeout_secs: default_timeout(),
            default_patience_secs: default_patience(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl QueryConfig {
    /// Interactive configuration (short timeouts, quick polling)
    ///
    /// - Timeout: 10 seconds
    /// - Patience: 2 seconds
    /// - Poll interval: 50 ms
    pub fn interactive() -> Self {
        Self {
            default_timeout_secs: Some(10),
            default_patience_secs: Some(2),
            poll_interval_ms: 50,
            ..Self::default()
        }
    }

    /// Batch configuration (long timeouts, relaxed polling)
    ///
    /// - Timeout: 600 seconds
    /// - Patience: 30 seconds
    /// - Poll interval: 1000 ms
    pub fn batch() -> Self {
        Self {
            default_timeout_secs: Some(600),
            default_patience_secs: Some(30),
            poll_interval_ms: 1000,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, QueryError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| QueryError::Config(e.to_string()))?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, QueryError> {
        let config: QueryConfig =
            toml::from_str(contents).map_err(|e| QueryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the defaults parse
    pub fn validate(&self) -> Result<(), QueryError> {
        self.context()?;
        self.parameters()?;
        if self.poll_interval_ms == 0 {
            return Err(QueryError::Config(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Default context
    pub fn context(&self) -> Result<Context, ConstructionError> {
        Context::new(&self.default_context)
    }

    /// Default parameters
    pub fn parameters(&self) -> Result<InferenceParameters, ConstructionError> {
        InferenceParameters::parse(&self.default_parameters)
    }

    /// Default timeout as Duration
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout_secs.map(Duration::from_secs)
    }

    /// Poll interval as Duration, never zero
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QueryConfig::default();
        assert_eq!(config.default_context, "InferencePSC");
        assert!(config.default_parameters.is_empty());
        assert_eq!(config.default_timeout_secs, Some(60));
        assert_eq!(config.default_patience_secs, Some(5));
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let interactive = QueryConfig::interactive();
        let batch = QueryConfig::batch();
        assert!(interactive.poll_interval() < QueryConfig::default().poll_interval());
        assert!(batch.default_timeout() > QueryConfig::default().default_timeout());
        assert_eq!(batch.default_patience_secs, Some(30));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            default_context = "BaseKB"
            default_parameters = ":max-number 10"
            default_patience_secs = 3
        "#;
        let config = QueryConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.context().unwrap().name(), "BaseKB");
        assert_eq!(config.parameters().unwrap().len(), 1);
        assert_eq!(config.default_patience_secs, Some(3));
        assert_eq!(config.default_timeout_secs, Some(60));
    }

    #[test]
    fn test_invalid_defaults_rejected() {
        assert!(QueryConfig::from_toml_str(r#"default_context = "Base KB""#).is_err());
        assert!(QueryConfig::from_toml_str(r#"default_parameters = "max-time""#).is_err());
        assert!(QueryConfig::from_toml_str("poll_interval_ms = 0").is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = QueryConfig::batch();
        let serialized = serde_json::to_string(&config).unwrap();
        let deserialized: QueryConfig = serde_json::from_str(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }
}
