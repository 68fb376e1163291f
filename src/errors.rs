//! Coordination Store Error Hierarchy
//!
//! Defines the error types surfaced by the directory, the entity managers
//! built on top of it and the supporting infrastructure (configuration,
//! serialization, reactor).

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Node tree and batch failures
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Entity payload encoding failures
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Task scheduling failures
    #[error(transparent)]
    Reactor(#[from] ReactorError),
}

impl Error {
    /// Returns the directory error kind, if this is one.
    pub fn directory_error(&self) -> Option<&DirectoryError> {
        match self {
            Error::Directory(e) => Some(e),
            _ => None,
        }
    }

    /// `true` when the target path (or one of its ancestors) is absent.
    ///
    /// Entity managers use this to tell a watch-driven race (the node went
    /// away between enumeration and fetch) apart from a real failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Directory(DirectoryError::NotFound(_)))
    }
}

/// Failure kinds of the coordination store itself.
///
/// None of these are retried internally; whether a failure is transient
/// depends on the backing transport and is for the caller to decide.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// Path, or an intermediate segment of it, does not exist
    #[error("No node at path: {0}")]
    NotFound(String),

    /// Non-sequential create of a name already present under the parent
    #[error("Node already exists: {0}")]
    AlreadyExists(String),

    /// Delete of a node that still has children
    #[error("Node is not empty: {0}")]
    NotEmpty(String),

    /// Child creation under an ephemeral node
    #[error("Ephemeral nodes cannot have children: {0}")]
    EphemeralViolation(String),

    /// Malformed path, root addressed by create/delete, or unsupported batch op
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// Payload could not be encoded or decoded
    #[error(transparent)]
    Bincode(#[from] bincode::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ReactorError {
    /// Work submitted after `shut_down_now`
    #[error("Reactor {0} has been shut down")]
    ShutDown(String),

    /// Worker pool could not be started
    #[error("Failed to build reactor runtime: {0}")]
    Build(#[from] std::io::Error),
}
