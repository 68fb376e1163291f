//! Directory capability
//!
//! The public operation set every entity manager programs against:
//! create/read/update/delete of nodes in a hierarchical namespace, one-shot
//! data and children watches, sub-directory scoping and atomic multi-op
//! batches.
//!
//! Paths are absolute (`/a/b`) and always interpreted relative to the root of
//! the handle they are passed to; `"/"` addresses that root. Paths returned by
//! `add` and by batch creates are relative in the same way.

mod op;
mod path;

#[cfg(test)]
mod path_test;

pub use op::*;
pub use path::join;
pub use path::PathBuilder;
pub(crate) use path::segments;
pub(crate) use path::split_parent;

use std::collections::HashSet;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::Result;
use crate::Watcher;

#[cfg_attr(test, automock)]
pub trait Directory: Send + Sync + 'static {
    /// Creates a node and returns its assigned path.
    ///
    /// For sequential modes the assigned name carries the counter suffix.
    fn add(
        &self,
        path: &str,
        data: Option<Vec<u8>>,
        mode: CreateMode,
    ) -> Result<String>;

    /// Replaces the payload of an existing node.
    fn update(
        &self,
        path: &str,
        data: Option<Vec<u8>>,
    ) -> Result<()>;

    /// Returns a copy of the payload, registering `watcher` as a one-shot
    /// data watcher when given.
    fn get(
        &self,
        path: &str,
        watcher: Option<Watcher>,
    ) -> Result<Option<Vec<u8>>>;

    /// Returns the current child names, registering `watcher` as a one-shot
    /// children watcher when given.
    fn get_children(
        &self,
        path: &str,
        watcher: Option<Watcher>,
    ) -> Result<HashSet<String>>;

    /// Existence probe. Never registers a watcher and never fails.
    fn has(
        &self,
        path: &str,
    ) -> bool;

    fn delete(
        &self,
        path: &str,
    ) -> Result<()>;

    /// A directory rooted at `path`, sharing state with this one.
    fn get_sub_directory(
        &self,
        path: &str,
    ) -> Result<Arc<dyn Directory>>;

    /// Applies `ops` as one unit; watchers fire once, after the last op.
    fn multi(
        &self,
        ops: Vec<Op>,
    ) -> Result<Vec<OpResult>>;

    fn session_id(&self) -> i64;
}
