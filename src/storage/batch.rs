//! Batch context
//!
//! Every tree-mutating primitive takes a [`BatchContext`]. It collects the
//! watchers each change fires and, in deferred mode, journals the changes so
//! that a failed batch can be reverted. Single operations run with an
//! immediate context: the watchers it collected are delivered as soon as the
//! operation has released the store lock. A multi-op batch runs with a
//! deferred context and delivers once, after the last operation.

use std::collections::HashSet;

use tracing::debug;

use super::tree::Change;
use super::tree::NodeId;
use super::tree::NodeTree;
use super::watch::WatchKind;
use super::watch::WatchRegistry;
use super::watch::Watcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FireMode {
    /// Deliver after the single operation that fired
    Immediate,
    /// Deliver once after the whole batch committed
    Deferred,
}

/// Watchers taken off a node during the batch.
///
/// `fire` is false for sets that were dropped rather than fired, like the
/// children watchers of a deleted node; they are only kept for rollback.
#[derive(Debug)]
struct Taken {
    node: NodeId,
    kind: WatchKind,
    watchers: HashSet<Watcher>,
    fire: bool,
}

#[derive(Debug)]
pub(crate) struct BatchContext {
    mode: FireMode,
    taken: Vec<Taken>,
    journal: Vec<Change>,
}

impl BatchContext {
    pub(crate) fn immediate() -> Self {
        Self::new(FireMode::Immediate)
    }

    pub(crate) fn deferred() -> Self {
        Self::new(FireMode::Deferred)
    }

    fn new(mode: FireMode) -> Self {
        Self {
            mode,
            taken: Vec::new(),
            journal: Vec::new(),
        }
    }

    /// Fires the watchers affected by `change` into this context and keeps
    /// the change for rollback when deferred.
    pub(crate) fn record(
        &mut self,
        change: Change,
        watches: &mut WatchRegistry,
    ) {
        match &change {
            Change::Created { parent, .. } => {
                self.take(watches, *parent, WatchKind::Children, true);
            }
            Change::DataChanged { id, .. } => {
                self.take(watches, *id, WatchKind::Data, true);
            }
            Change::Deleted { parent, id, .. } => {
                self.take(watches, *id, WatchKind::Data, true);
                self.take(watches, *id, WatchKind::Children, false);
                self.take(watches, *parent, WatchKind::Children, true);
            }
        }
        if self.mode == FireMode::Deferred {
            self.journal.push(change);
        }
    }

    fn take(
        &mut self,
        watches: &mut WatchRegistry,
        node: NodeId,
        kind: WatchKind,
        fire: bool,
    ) {
        let watchers = watches.take(node, kind);
        if !watchers.is_empty() {
            self.taken.push(Taken {
                node,
                kind,
                watchers,
                fire,
            });
        }
    }

    /// Number of journaled changes
    pub(crate) fn len(&self) -> usize {
        self.journal.len()
    }

    /// Reverts every journaled change, newest first, and re-arms the watchers
    /// taken along the way. Nothing fires.
    pub(crate) fn rollback(
        self,
        tree: &mut NodeTree,
        watches: &mut WatchRegistry,
    ) {
        debug!(changes = self.journal.len(), "Rolling back batch");
        for change in self.journal.into_iter().rev() {
            tree.revert(change);
        }
        for taken in self.taken {
            if tree.node(taken.node).is_ok() {
                watches.restore(taken.node, taken.kind, taken.watchers);
            }
        }
    }

    /// The distinct watchers to deliver; a watcher armed on several touched
    /// nodes appears once.
    pub(crate) fn into_pending(self) -> HashSet<Watcher> {
        self.taken
            .into_iter()
            .filter(|taken| taken.fire)
            .flat_map(|taken| taken.watchers)
            .collect()
    }
}
