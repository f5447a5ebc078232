//! Configuration management for custody
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. CLI arguments (highest precedence, applied by the caller)
//! 2. Environment variables (CUSTODY_* prefix)
//! 3. custody.local.toml (gitignored, local overrides)
//! 4. custody.toml (git-tracked, project config)
//! 5. ~/.config/custody/config.toml (user defaults)
//! 6. Built-in defaults (lowest precedence)

use anyhow::Result;
use custody_store::{StoreConfig, Workload};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::{ConfigLoader, LOCAL_CONFIG_FILE, PROJECT_CONFIG_FILE};

/// Main custody configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustodyConfig {
    pub store: StoreSection,
    pub quorum: QuorumSection,
    pub workload: WorkloadSection,
    pub counting: CountingSection,
}

/// Owner-thread store settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Request channel capacity; 0 is a rendezvous channel
    pub request_capacity: usize,
    /// Journal ring size; 0 disables the journal
    pub journal_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuorumSection {
    pub voters: usize,
    pub threshold: usize,
}

impl Default for QuorumSection {
    fn default() -> Self {
        Self {
            voters: 10,
            threshold: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadSection {
    pub readers: usize,
    pub writers: usize,
    pub key_space: i64,
    pub max_value: i64,
    pub duration_ms: u64,
    pub pause_us: u64,
}

impl Default for WorkloadSection {
    fn default() -> Self {
        Self {
            readers: 100,
            writers: 10,
            key_space: 5,
            max_value: 100,
            duration_ms: 1000,
            pause_us: 1000,
        }
    }
}

/// Atomic counter demo settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountingSection {
    pub threads: usize,
    pub increments: u64,
}

impl Default for CountingSection {
    fn default() -> Self {
        Self {
            threads: 50,
            increments: 1000,
        }
    }
}

impl CustodyConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Parse a configuration from TOML text, without merging other sources
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quorum.voters == 0 {
            return Err(ConfigError::ValidationError(
                "quorum.voters must be positive".to_string(),
            ));
        }
        if self.quorum.threshold > self.quorum.voters {
            return Err(ConfigError::ValidationError(format!(
                "quorum.threshold ({}) exceeds quorum.voters ({})",
                self.quorum.threshold, self.quorum.voters
            )));
        }
        if self.workload.key_space <= 0 || self.workload.max_value <= 0 {
            return Err(ConfigError::ValidationError(
                "workload.key_space and workload.max_value must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Owner-thread store configuration
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::default()
            .with_request_capacity(self.store.request_capacity)
            .with_journal(self.store.journal_capacity)
    }

    /// Reader/writer workload
    pub fn workload(&self) -> Workload {
        Workload {
            readers: self.workload.readers,
            writers: self.workload.writers,
            key_space: self.workload.key_space,
            max_value: self.workload.max_value,
            duration: Duration::from_millis(self.workload.duration_ms),
            pause: Duration::from_micros(self.workload.pause_us),
        }
    }
}
