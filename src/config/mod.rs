//! Configuration management for the coordination store.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support
//! - Environment variable overrides
//! - Component-wise validation
mod directory;
mod reactor;
pub use directory::*;
pub use reactor::*;


use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Main configuration container
///
/// Combines all component configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables with `DIRECTORY__` prefix (highest priority)
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct DirectoryNodeConfig {
    /// Directory handle parameters
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// Watcher reaction worker pool
    #[serde(default)]
    pub reactor: ReactorConfig,
}

impl DirectoryNodeConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Callers MUST call `validate()` once all overrides are applied.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("CONFIG_PATH", "config/directory.toml");
    /// std::env::set_var("DIRECTORY__DIRECTORY__SESSION_ID", "7");
    /// let cfg = DirectoryNodeConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(Self::environment());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(Self::environment())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates every component and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        self.directory.validate()?;
        self.reactor.validate()?;
        Ok(self)
    }

    fn environment() -> Environment {
        Environment::with_prefix("DIRECTORY")
            .separator("__")
            .ignore_empty(true)
            .try_parsing(true)
    }
}
