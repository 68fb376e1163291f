use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Worker pool used to run watcher reactions off the mutating thread
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ReactorConfig {
    /// Thread name prefix; workers are named `{identifier}-{n}`
    #[serde(default = "default_identifier")]
    pub identifier: String,

    /// Number of worker threads
    #[serde(default = "default_threads")]
    pub threads: usize,
}

fn default_identifier() -> String {
    "directory-reactor".to_string()
}

fn default_threads() -> usize {
    2
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            identifier: default_identifier(),
            threads: default_threads(),
        }
    }
}

impl ReactorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.identifier.trim().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "reactor.identifier must not be empty".to_string(),
            )));
        }
        if self.threads == 0 {
            return Err(Error::Config(ConfigError::Message(
                "reactor.threads must be at least 1".to_string(),
            )));
        }
        Ok(())
    }
}
