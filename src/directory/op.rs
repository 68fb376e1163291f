use serde::Deserialize;
use serde::Serialize;

/// How a node is created.
///
/// Ephemeral nodes are bound to the session of the handle that created them
/// and may never own children. Sequential nodes get a zero-padded counter
/// appended to the requested name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CreateMode {
    #[default]
    Persistent,
    PersistentSequential,
    Ephemeral,
    EphemeralSequential,
}

impl CreateMode {
    #[inline]
    pub fn is_sequential(&self) -> bool {
        matches!(self, CreateMode::PersistentSequential | CreateMode::EphemeralSequential)
    }

    #[inline]
    pub fn is_ephemeral(&self) -> bool {
        matches!(self, CreateMode::Ephemeral | CreateMode::EphemeralSequential)
    }
}

/// One primitive operation of a multi-op batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Create {
        path: String,
        data: Option<Vec<u8>>,
        mode: CreateMode,
    },
    SetData {
        path: String,
        data: Option<Vec<u8>>,
    },
    Delete {
        path: String,
    },
    /// Version check of a node. Remote coordination services accept it, the
    /// in-memory store does not and rejects any batch containing one.
    Check {
        path: String,
        version: i32,
    },
}

impl Op {
    pub fn create(
        path: impl Into<String>,
        data: Option<Vec<u8>>,
        mode: CreateMode,
    ) -> Self {
        Op::Create {
            path: path.into(),
            data,
            mode,
        }
    }

    pub fn set_data(
        path: impl Into<String>,
        data: Option<Vec<u8>>,
    ) -> Self {
        Op::SetData {
            path: path.into(),
            data,
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Op::Delete { path: path.into() }
    }

    pub fn check(
        path: impl Into<String>,
        version: i32,
    ) -> Self {
        Op::Check {
            path: path.into(),
            version,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Op::Create { path, .. } | Op::SetData { path, .. } | Op::Delete { path } | Op::Check { path, .. } => path,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Op::Create { .. } => "create",
            Op::SetData { .. } => "set_data",
            Op::Delete { .. } => "delete",
            Op::Check { .. } => "check",
        }
    }
}

/// Per-operation result of a committed batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpResult {
    /// Assigned path, relative to the directory the batch ran against
    Create { path: String },
    SetData,
    Delete,
}
