//! Directory handle configuration
//!
//! ```toml
//! [directory]
//! session_id = 7
//! base_path = "/midonet"
//! ```

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_SESSION_ID;
use crate::Error;
use crate::PathBuilder;
use crate::Result;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DirectoryConfig {
    /// Session token reported by handles built from this config.
    ///
    /// Ephemeral nodes created through such a handle belong to this session.
    /// Default: 0
    #[serde(default = "default_session_id")]
    pub session_id: i64,

    /// Absolute path under which entity managers keep their roots.
    ///
    /// Default: "/"
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

fn default_session_id() -> i64 {
    DEFAULT_SESSION_ID
}

fn default_base_path() -> String {
    "/".to_string()
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            session_id: default_session_id(),
            base_path: default_base_path(),
        }
    }
}

impl DirectoryConfig {
    /// Returns error if `base_path` is not a well formed absolute path.
    pub fn validate(&self) -> Result<()> {
        self.path_builder().map(|_| ()).map_err(|e| {
            Error::Config(ConfigError::Message(format!(
                "directory.base_path {:?} is invalid: {}",
                self.base_path, e
            )))
        })
    }

    pub fn path_builder(&self) -> Result<PathBuilder> {
        PathBuilder::new(self.base_path.clone())
    }
}
