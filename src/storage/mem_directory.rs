use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::batch::BatchContext;
use super::state::DirectoryState;
use super::tree::NodeId;
use super::tree::ROOT_ID;
use super::watch::notify_all;
use super::watch::WatchKind;
use crate::constants::BATCH_OUTCOME_COMMITTED;
use crate::constants::BATCH_OUTCOME_REJECTED;
use crate::constants::BATCH_OUTCOME_ROLLED_BACK;
use crate::constants::DEFAULT_SESSION_ID;
use crate::metrics::BATCH_OUTCOMES;
use crate::metrics::EPHEMERALS_EXPIRED;
use crate::CreateMode;
use crate::Directory;
use crate::DirectoryConfig;
use crate::DirectoryError;
use crate::Op;
use crate::OpResult;
use crate::Result;
use crate::Watcher;

/// In-memory implementation of [`Directory`].
///
/// Usable as a test double for a remote coordination service and as an
/// embedded store. Clones and sub-directories are handles onto the same
/// tree; a mutation through any of them is visible through all of them.
#[derive(Clone)]
pub struct MemoryDirectory {
    state: Arc<RwLock<DirectoryState>>,
    root: NodeId,
    session_id: i64,
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryDirectory {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let state = self.state.read();
        let root_path = state.tree.node(self.root).map(|n| n.path().to_string()).ok();
        f.debug_struct("MemoryDirectory")
            .field("root_path", &root_path)
            .field("session_id", &self.session_id)
            .finish()
    }
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::with_session_id(DEFAULT_SESSION_ID)
    }

    pub fn from_config(config: &DirectoryConfig) -> Self {
        Self::with_session_id(config.session_id)
    }

    fn with_session_id(session_id: i64) -> Self {
        Self {
            state: Arc::new(RwLock::new(DirectoryState::new())),
            root: ROOT_ID,
            session_id,
        }
    }

    /// Another handle on the same tree and root, acting for `session_id`.
    ///
    /// Ephemeral nodes created through it belong to that session.
    pub fn with_session(
        &self,
        session_id: i64,
    ) -> Self {
        Self {
            state: self.state.clone(),
            root: self.root,
            session_id,
        }
    }

    /// Typed variant of [`Directory::get_sub_directory`].
    pub fn sub_directory(
        &self,
        path: &str,
    ) -> Result<Self> {
        let root = self.state.read().resolve(self.root, path)?;
        Ok(Self {
            state: self.state.clone(),
            root,
            session_id: self.session_id,
        })
    }

    /// Deletes every ephemeral node owned by `session_id`, anywhere in the
    /// tree, as one batch. Returns how many nodes were removed.
    pub fn expire_session(
        &self,
        session_id: i64,
    ) -> Result<usize> {
        let mut ctx = BatchContext::deferred();
        let removed = {
            let mut state = self.state.write();
            let state = &mut *state;
            match state.expire_session(session_id, &mut ctx) {
                Ok(removed) => removed,
                Err(e) => {
                    ctx.rollback(&mut state.tree, &mut state.watches);
                    return Err(e);
                }
            }
        };
        EPHEMERALS_EXPIRED.inc_by(removed as u64);
        debug!(session_id, removed, "Session expired");
        notify_all(ctx.into_pending());
        Ok(removed)
    }

    /// Total number of nodes in the tree, root included.
    pub fn node_count(&self) -> usize {
        self.state.read().tree.len()
    }

    /// Armed data and children watchers on `path`.
    pub fn watcher_count(
        &self,
        path: &str,
    ) -> Result<(usize, usize)> {
        let state = self.state.read();
        let id = state.resolve(self.root, path)?;
        Ok((
            state.watches.count(id, WatchKind::Data),
            state.watches.count(id, WatchKind::Children),
        ))
    }

    /// Runs one mutation with an immediate context and delivers whatever it
    /// fired once the lock is released.
    fn mutate<R>(
        &self,
        f: impl FnOnce(&mut DirectoryState, &mut BatchContext) -> Result<R>,
    ) -> Result<R> {
        let mut ctx = BatchContext::immediate();
        let result = {
            let mut state = self.state.write();
            f(&mut state, &mut ctx)
        };
        notify_all(ctx.into_pending());
        result
    }
}

impl Directory for MemoryDirectory {
    fn add(
        &self,
        path: &str,
        data: Option<Vec<u8>>,
        mode: CreateMode,
    ) -> Result<String> {
        trace!(path, ?mode, "add");
        self.mutate(|state, ctx| state.create(self.root, path, data, mode, self.session_id, ctx))
    }

    fn update(
        &self,
        path: &str,
        data: Option<Vec<u8>>,
    ) -> Result<()> {
        trace!(path, "update");
        self.mutate(|state, ctx| state.set_data(self.root, path, data, ctx))
    }

    fn get(
        &self,
        path: &str,
        watcher: Option<Watcher>,
    ) -> Result<Option<Vec<u8>>> {
        match watcher {
            Some(watcher) => self.state.write().data(self.root, path, Some(watcher)),
            None => {
                let state = self.state.read();
                let id = state.resolve(self.root, path)?;
                state.tree.data(id)
            }
        }
    }

    fn get_children(
        &self,
        path: &str,
        watcher: Option<Watcher>,
    ) -> Result<HashSet<String>> {
        match watcher {
            Some(watcher) => self.state.write().children(self.root, path, Some(watcher)),
            None => {
                let state = self.state.read();
                let id = state.resolve(self.root, path)?;
                state.tree.children_names(id)
            }
        }
    }

    fn has(
        &self,
        path: &str,
    ) -> bool {
        self.state.read().resolve(self.root, path).is_ok()
    }

    fn delete(
        &self,
        path: &str,
    ) -> Result<()> {
        trace!(path, "delete");
        self.mutate(|state, ctx| state.delete(self.root, path, ctx))
    }

    fn get_sub_directory(
        &self,
        path: &str,
    ) -> Result<Arc<dyn Directory>> {
        Ok(Arc::new(self.sub_directory(path)?))
    }

    fn multi(
        &self,
        ops: Vec<Op>,
    ) -> Result<Vec<OpResult>> {
        if let Some(op) = ops.iter().find(|op| matches!(op, Op::Check { .. })) {
            BATCH_OUTCOMES.with_label_values(&[BATCH_OUTCOME_REJECTED]).inc();
            warn!(kind = op.kind(), path = op.path(), "Rejecting batch with unsupported op");
            return Err(DirectoryError::InvalidArgument(format!(
                "Only create, set_data and delete are supported in a batch, got '{}'",
                op.kind()
            ))
            .into());
        }

        let mut ctx = BatchContext::deferred();
        let total = ops.len();
        let results = {
            let mut state = self.state.write();
            let state = &mut *state;
            let mut results = Vec::with_capacity(total);
            let mut failure = None;
            for (index, op) in ops.into_iter().enumerate() {
                match state.apply(self.root, op, self.session_id, &mut ctx) {
                    Ok(result) => results.push(result),
                    Err(e) => {
                        failure = Some((index, e));
                        break;
                    }
                }
            }
            if let Some((index, e)) = failure {
                debug!(index, total, applied = ctx.len(), "Batch op failed: {}", e);
                ctx.rollback(&mut state.tree, &mut state.watches);
                BATCH_OUTCOMES.with_label_values(&[BATCH_OUTCOME_ROLLED_BACK]).inc();
                return Err(e);
            }
            results
        };

        BATCH_OUTCOMES.with_label_values(&[BATCH_OUTCOME_COMMITTED]).inc();
        debug!(ops = total, "Batch committed");
        notify_all(ctx.into_pending());
        Ok(results)
    }

    fn session_id(&self) -> i64 {
        self.session_id
    }
}
