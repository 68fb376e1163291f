//! One-shot watch registry
//!
//! Every node has two watcher sets: data watchers (payload replaced or node
//! deleted) and children watchers (child added or removed). Firing swaps the
//! whole set out for an empty one, so a watcher registered while the set is
//! being delivered is kept for the next event instead of receiving the
//! current one. Delivery itself happens outside the store lock, see
//! [`notify_all`].

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::panic::catch_unwind;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use tracing::error;
use tracing::trace;

use super::tree::NodeId;
use crate::metrics::WATCHERS_NOTIFIED;
use crate::metrics::WATCHER_FAILURES;
use crate::reactor::Reactor;

/// A zero-argument notification callback.
///
/// Identity is the callback allocation: clones of one `Watcher` are the same
/// watcher, so registering a clone into a set that already holds it is a
/// no-op. Two watchers built from identical closures are distinct.
#[derive(Clone)]
pub struct Watcher {
    callback: Arc<dyn Fn() + Send + Sync>,
}

impl Watcher {
    pub fn new(callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// A watcher whose firing only enqueues `callback` on `reactor`.
    ///
    /// Keeps slow reactions (re-reads, reconciliation) off the thread that
    /// mutated the directory.
    pub fn dispatched(
        reactor: Arc<dyn Reactor>,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        let callback = Arc::new(callback);
        Self::new(move || {
            let callback = callback.clone();
            if let Err(e) = reactor.submit(Box::new(move || callback())) {
                error!("Failed to dispatch watcher: {:?}", e);
            }
        })
    }

    /// Runs the callback, containing any panic it raises.
    ///
    /// Returns `false` when the callback panicked.
    pub fn notify(&self) -> bool {
        match catch_unwind(AssertUnwindSafe(|| (self.callback)())) {
            Ok(()) => true,
            Err(_) => {
                WATCHER_FAILURES.inc();
                error!("Watcher {:#x} panicked during notification", self.id());
                false
            }
        }
    }

    #[inline]
    fn id(&self) -> usize {
        Arc::as_ptr(&self.callback) as *const () as usize
    }
}

impl PartialEq for Watcher {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Watcher {}

impl Hash for Watcher {
    fn hash<H: Hasher>(
        &self,
        state: &mut H,
    ) {
        self.id().hash(state);
    }
}

impl fmt::Debug for Watcher {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "Watcher({:#x})", self.id())
    }
}

/// Delivers every watcher once, in no particular order.
///
/// A panicking watcher is logged and skipped; the rest still run.
pub(crate) fn notify_all(watchers: impl IntoIterator<Item = Watcher>) {
    let mut delivered = 0usize;
    for watcher in watchers {
        watcher.notify();
        delivered += 1;
    }
    if delivered > 0 {
        WATCHERS_NOTIFIED.inc_by(delivered as u64);
        trace!(watchers = delivered, "Watchers notified");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum WatchKind {
    Data,
    Children,
}

/// Per-node watcher sets, keyed by node id.
///
/// Only non-empty sets are kept, so the maps never outgrow the number of
/// currently armed watches.
#[derive(Debug, Default)]
pub(crate) struct WatchRegistry {
    data: HashMap<NodeId, HashSet<Watcher>>,
    children: HashMap<NodeId, HashSet<Watcher>>,
}

impl WatchRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn sets_mut(
        &mut self,
        kind: WatchKind,
    ) -> &mut HashMap<NodeId, HashSet<Watcher>> {
        match kind {
            WatchKind::Data => &mut self.data,
            WatchKind::Children => &mut self.children,
        }
    }

    /// Arms `watcher` on `node`; returns `false` if it was already armed.
    pub(crate) fn register(
        &mut self,
        node: NodeId,
        kind: WatchKind,
        watcher: Watcher,
    ) -> bool {
        self.sets_mut(kind).entry(node).or_default().insert(watcher)
    }

    /// Swaps the node's set for an empty one and hands back what was armed.
    pub(crate) fn take(
        &mut self,
        node: NodeId,
        kind: WatchKind,
    ) -> HashSet<Watcher> {
        self.sets_mut(kind).remove(&node).unwrap_or_default()
    }

    /// Puts watchers back on a node, merging with anything armed since.
    pub(crate) fn restore(
        &mut self,
        node: NodeId,
        kind: WatchKind,
        watchers: HashSet<Watcher>,
    ) {
        if watchers.is_empty() {
            return;
        }
        self.sets_mut(kind).entry(node).or_default().extend(watchers);
    }

    pub(crate) fn count(
        &self,
        node: NodeId,
        kind: WatchKind,
    ) -> usize {
        match kind {
            WatchKind::Data => self.data.get(&node),
            WatchKind::Children => self.children.get(&node),
        }
        .map(|set| set.len())
        .unwrap_or(0)
    }
}
