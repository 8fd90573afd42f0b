//! Registry configuration parsing.
//!
//! Loads provider selection settings from TOML: which catalog entries are
//! disabled and which capabilities must be bound at initialization.

use crate::capability::CapabilityKind;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Registry configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Parsed but semantically invalid configuration
    #[error("Invalid registry configuration: {0}")]
    Invalid(String),
}

/// Registry configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RegistryConfig {
    /// Catalog entries skipped during discovery
    #[serde(default)]
    pub disabled_providers: Vec<String>,

    /// Capabilities that must be bound once discovery finishes
    #[serde(default)]
    pub required: Vec<CapabilityKind>,
}

impl RegistryConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: RegistryConfig = toml::from_str(contents)?;

        if let Some(blank) = config.disabled_providers.iter().find(|n| n.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "blank provider name in disabled_providers: {:?}",
                blank
            )));
        }

        Ok(config)
    }

    /// Configuration that requires the knowledge-object and session
    /// capabilities, the minimum needed to run queries
    pub fn strict() -> Self {
        Self {
            disabled_providers: Vec::new(),
            required: vec![CapabilityKind::KnowledgeObjects, CapabilityKind::Sessions],
        }
    }

    /// Disable a provider by name
    pub fn disable(mut self, provider: impl Into<String>) -> Self {
        self.disabled_providers.push(provider.into());
        self
    }

    /// Whether a provider is disabled
    pub fn is_disabled(&self, provider: &str) -> bool {
        self.disabled_providers.iter().any(|p| p == provider)
    }

    /// Whether a capability is required
    pub fn is_required(&self, kind: CapabilityKind) -> bool {
        self.required.contains(&kind)
    }
}
