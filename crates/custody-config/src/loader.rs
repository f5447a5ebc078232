//! Configuration loader with multi-source merging

use crate::CustodyConfig;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::env;
use std::path::{Path, PathBuf};

/// Git-tracked project configuration.
pub const PROJECT_CONFIG_FILE: &str = "custody.toml";

/// Gitignored local overrides, merged over the project file.
pub const LOCAL_CONFIG_FILE: &str = "custody.local.toml";

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
    user_config: bool,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "CUSTODY".to_string(),
            user_config: true,
        }
    }

    /// Set the project directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "CUSTODY")
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Skip ~/.config/custody/config.toml
    pub fn without_user_config(mut self) -> Self {
        self.user_config = false;
        self
    }

    /// Config files that exist, lowest precedence first: the user file
    /// (~/.config/custody/config.toml), then custody.toml, then
    /// custody.local.toml.
    pub fn config_files(&self) -> Vec<PathBuf> {
        let user = self
            .user_config
            .then(user_config_file)
            .flatten();

        user.into_iter()
            .chain([
                self.project_dir.join(PROJECT_CONFIG_FILE),
                self.project_dir.join(LOCAL_CONFIG_FILE),
            ])
            .filter(|path| path.is_file())
            .collect()
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<CustodyConfig> {
        let mut builder = config::Config::builder();

        // 1. Start with built-in defaults
        let defaults = CustodyConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2-4. User, project and local files
        for file in self.config_files() {
            builder = builder.add_source(
                config::File::from(file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 5. Environment variables (CUSTODY_STORE__REQUEST_CAPACITY=8)
        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // Build and deserialize
        let config = builder.build().context("Failed to build configuration")?;

        let custody_config: CustodyConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        custody_config
            .validate()
            .context("Configuration failed validation")?;

        Ok(custody_config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default(self) -> CustodyConfig {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// ~/.config/custody/config.toml, or the platform equivalent.
fn user_config_file() -> Option<PathBuf> {
    ProjectDirs::from("rs", "Custody", "custody").map(|dirs| dirs.config_dir().join("config.toml"))
}
