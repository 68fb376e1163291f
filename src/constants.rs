// -
// Path syntax

/// Separator between path segments; every absolute path starts with it
pub const PATH_SEPARATOR: char = '/';

/// Path of the root node as stored in the tree
pub(crate) const ROOT_PATH: &str = "";

// -
// Node semantics

/// Width of the zero-padded counter appended to sequential node names
pub(crate) const SEQUENTIAL_SUFFIX_WIDTH: usize = 10;

/// Session token reported by handles that were not given an explicit session
pub const DEFAULT_SESSION_ID: i64 = 0;

// -
// Metric labels

pub(crate) const BATCH_OUTCOME_COMMITTED: &str = "committed";
pub(crate) const BATCH_OUTCOME_ROLLED_BACK: &str = "rolled_back";
pub(crate) const BATCH_OUTCOME_REJECTED: &str = "rejected";
