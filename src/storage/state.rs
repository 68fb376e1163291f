//! Shared directory state
//!
//! The node tree and the watch registry, guarded together by one lock in
//! [`MemoryDirectory`](super::MemoryDirectory). Every primitive here resolves
//! paths against a handle root and threads a [`BatchContext`] through the
//! mutation so the caller decides when the fired watchers run.

use std::collections::HashSet;

use tracing::trace;

use super::batch::BatchContext;
use super::tree::NodeId;
use super::tree::NodeTree;
use super::watch::WatchKind;
use super::watch::WatchRegistry;
use super::watch::Watcher;
use crate::directory::segments;
use crate::directory::split_parent;
use crate::CreateMode;
use crate::DirectoryError;
use crate::Op;
use crate::OpResult;
use crate::Result;

#[derive(Debug)]
pub(crate) struct DirectoryState {
    pub(crate) tree: NodeTree,
    pub(crate) watches: WatchRegistry,
}

impl DirectoryState {
    pub(crate) fn new() -> Self {
        Self {
            tree: NodeTree::new(),
            watches: WatchRegistry::new(),
        }
    }

    pub(crate) fn resolve(
        &self,
        root: NodeId,
        path: &str,
    ) -> Result<NodeId> {
        self.tree.resolve(root, &segments(path)?)
    }

    /// `absolute` with the handle root's path stripped off.
    pub(crate) fn relative(
        &self,
        root: NodeId,
        absolute: &str,
    ) -> Result<String> {
        let root_path = self.tree.node(root)?.path();
        Ok(absolute[root_path.len()..].to_string())
    }

    /// Creates a node and returns its assigned path relative to `root`.
    pub(crate) fn create(
        &mut self,
        root: NodeId,
        path: &str,
        data: Option<Vec<u8>>,
        mode: CreateMode,
        session: i64,
        ctx: &mut BatchContext,
    ) -> Result<String> {
        let (parent_segments, name) = split_parent(path)?;
        let parent = self.tree.resolve(root, &parent_segments)?;
        let (absolute, change) = self.tree.add_child(parent, name, data, mode, Some(session))?;
        let assigned = self.relative(root, &absolute)?;
        ctx.record(change, &mut self.watches);
        Ok(assigned)
    }

    pub(crate) fn set_data(
        &mut self,
        root: NodeId,
        path: &str,
        data: Option<Vec<u8>>,
        ctx: &mut BatchContext,
    ) -> Result<()> {
        let id = self.resolve(root, path)?;
        let change = self.tree.set_data(id, data)?;
        ctx.record(change, &mut self.watches);
        Ok(())
    }

    pub(crate) fn delete(
        &mut self,
        root: NodeId,
        path: &str,
        ctx: &mut BatchContext,
    ) -> Result<()> {
        let (parent_segments, name) = split_parent(path)?;
        let parent = self.tree.resolve(root, &parent_segments)?;
        let change = self.tree.delete_child(parent, name)?;
        ctx.record(change, &mut self.watches);
        Ok(())
    }

    pub(crate) fn data(
        &mut self,
        root: NodeId,
        path: &str,
        watcher: Option<Watcher>,
    ) -> Result<Option<Vec<u8>>> {
        let id = self.resolve(root, path)?;
        if let Some(watcher) = watcher {
            self.watches.register(id, WatchKind::Data, watcher);
        }
        self.tree.data(id)
    }

    pub(crate) fn children(
        &mut self,
        root: NodeId,
        path: &str,
        watcher: Option<Watcher>,
    ) -> Result<HashSet<String>> {
        let id = self.resolve(root, path)?;
        if let Some(watcher) = watcher {
            self.watches.register(id, WatchKind::Children, watcher);
        }
        self.tree.children_names(id)
    }

    /// Applies one batch operation. Unsupported kinds are expected to have
    /// been rejected before the batch started.
    pub(crate) fn apply(
        &mut self,
        root: NodeId,
        op: Op,
        session: i64,
        ctx: &mut BatchContext,
    ) -> Result<OpResult> {
        trace!(kind = op.kind(), path = op.path(), "Applying batch op");
        match op {
            Op::Create { path, data, mode } => {
                let path = self.create(root, &path, data, mode, session, ctx)?;
                Ok(OpResult::Create { path })
            }
            Op::SetData { path, data } => {
                self.set_data(root, &path, data, ctx)?;
                Ok(OpResult::SetData)
            }
            Op::Delete { path } => {
                self.delete(root, &path, ctx)?;
                Ok(OpResult::Delete)
            }
            Op::Check { path, .. } => Err(DirectoryError::InvalidArgument(format!(
                "Unsupported batch op 'check' on {}",
                path
            ))
            .into()),
        }
    }

    /// Removes every ephemeral node owned by `session`.
    pub(crate) fn expire_session(
        &mut self,
        session: i64,
        ctx: &mut BatchContext,
    ) -> Result<usize> {
        let owned = self.tree.ephemerals_owned_by(session);
        for id in &owned {
            let (parent, name) = self.tree.locate(*id)?;
            let change = self.tree.delete_child(parent, &name)?;
            ctx.record(change, &mut self.watches);
        }
        Ok(owned.len())
    }
}
