//! Event streams over a [`WatchableEntityManager`]
//!
//! Both monitors re-arm their one-shot watcher every time it fires, so a
//! consumer sees a continuous stream of changes on an unbounded channel.
//! Each watched target has exactly one [`Watcher`], re-registered on every
//! refresh, so restarting a watch never stacks a second chain on top of an
//! armed one. The watcher only holds a weak reference: dropping the monitor
//! ends the stream at the next notification, and so does dropping the
//! receiver.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Weak;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::warn;

use super::manager::WatchableEntityManager;
use crate::Result;
use crate::Watcher;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityIdSetEvent<Id> {
    Created(Id),
    Deleted(Id),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityEvent<Id, T> {
    Updated(Id, T),
    Deleted(Id),
}

/// Tracks membership of an entity set.
pub struct EntityIdSetMonitor<M: WatchableEntityManager> {
    inner: Arc<IdSetInner<M>>,
}

struct IdSetInner<M: WatchableEntityManager> {
    manager: Arc<M>,
    watcher: Watcher,
    known: Mutex<HashSet<M::Id>>,
    events: mpsc::UnboundedSender<EntityIdSetEvent<M::Id>>,
    stopped: AtomicBool,
}

impl<M: WatchableEntityManager> IdSetInner<M> {
    /// Returns `false` once nobody listens any more; the monitor stops.
    fn publish(
        &self,
        event: EntityIdSetEvent<M::Id>,
    ) -> bool {
        if self.events.send(event).is_err() {
            debug!("Entity id set receiver dropped, stopping monitor");
            self.stopped.store(true, Ordering::Release);
            return false;
        }
        true
    }
}

impl<M> EntityIdSetMonitor<M>
where
    M: WatchableEntityManager + 'static,
{
    pub fn new(manager: Arc<M>) -> (Self, mpsc::UnboundedReceiver<EntityIdSetEvent<M::Id>>) {
        let (events, rx) = mpsc::unbounded_channel();
        let inner = Arc::new_cyclic(|weak: &Weak<IdSetInner<M>>| {
            let weak = weak.clone();
            IdSetInner {
                manager,
                watcher: Watcher::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        if let Err(e) = refresh_ids(&inner) {
                            warn!("Failed to refresh entity id set: {}", e);
                        }
                    }
                }),
                known: Mutex::new(HashSet::new()),
                events,
                stopped: AtomicBool::new(false),
            }
        });
        (Self { inner }, rx)
    }

    /// Arms the watch. The initial members are reported as `Created`
    /// events and also returned.
    pub fn start(&self) -> Result<Vec<M::Id>> {
        self.inner.stopped.store(false, Ordering::Release);
        refresh_ids(&self.inner)
    }

    /// No further events are emitted; the armed watcher becomes a no-op.
    pub fn stop(&self) {
        self.inner.stopped.store(true, Ordering::Release);
    }

    pub fn current(&self) -> HashSet<M::Id> {
        self.inner.known.lock().clone()
    }
}

fn refresh_ids<M>(inner: &Arc<IdSetInner<M>>) -> Result<Vec<M::Id>>
where
    M: WatchableEntityManager + 'static,
{
    if inner.events.is_closed() {
        inner.stopped.store(true, Ordering::Release);
    }
    if inner.stopped.load(Ordering::Acquire) {
        return Ok(Vec::new());
    }

    let ids = inner.manager.list_and_watch(Some(inner.watcher.clone()))?;

    let current: HashSet<M::Id> = ids.iter().cloned().collect();
    let mut known = inner.known.lock();
    let created = ids.iter().filter(|id| !known.contains(*id));
    let deleted = known.difference(&current);
    let events: Vec<EntityIdSetEvent<M::Id>> = created
        .map(|id| EntityIdSetEvent::Created(id.clone()))
        .chain(deleted.map(|id| EntityIdSetEvent::Deleted(id.clone())))
        .collect();
    for event in events {
        if !inner.publish(event) {
            break;
        }
    }
    debug!(members = current.len(), "Entity id set refreshed");
    *known = current;
    Ok(ids)
}

/// Tracks the content of individually watched entities.
pub struct EntityMonitor<M: WatchableEntityManager> {
    inner: Arc<EntityInner<M>>,
}

/// Watch state of one entity id.
///
/// The entry outlives `unwatch` while its watcher may still be armed, so a
/// later `watch` reuses the same watcher instead of arming a second one.
struct EntityWatch {
    watcher: Watcher,
    active: bool,
}

struct EntityInner<M: WatchableEntityManager> {
    manager: Arc<M>,
    watches: Mutex<HashMap<M::Id, EntityWatch>>,
    events: mpsc::UnboundedSender<EntityEvent<M::Id, M::Entity>>,
}

impl<M: WatchableEntityManager> EntityInner<M> {
    /// Returns `false` once nobody listens any more; every watch is dropped.
    fn publish(
        &self,
        event: EntityEvent<M::Id, M::Entity>,
    ) -> bool {
        if self.events.send(event).is_err() {
            debug!("Entity receiver dropped, stopping monitor");
            self.watches.lock().clear();
            return false;
        }
        true
    }
}

impl<M> EntityMonitor<M>
where
    M: WatchableEntityManager + 'static,
{
    pub fn new(manager: Arc<M>) -> (Self, mpsc::UnboundedReceiver<EntityEvent<M::Id, M::Entity>>) {
        let (events, rx) = mpsc::unbounded_channel();
        let inner = Arc::new(EntityInner {
            manager,
            watches: Mutex::new(HashMap::new()),
            events,
        });
        (Self { inner }, rx)
    }

    /// Starts emitting events for `id` and returns its current value.
    ///
    /// An absent entity is not watched. Watching an id twice arms nothing
    /// new.
    pub fn watch(
        &self,
        id: M::Id,
    ) -> Result<Option<M::Entity>> {
        let already_watched = {
            let mut watches = self.inner.watches.lock();
            match watches.get_mut(&id) {
                Some(entry) if entry.active => true,
                Some(entry) => {
                    entry.active = true;
                    false
                }
                None => {
                    let watcher = entity_watcher(&self.inner, id.clone());
                    watches.insert(id.clone(), EntityWatch { watcher, active: true });
                    false
                }
            }
        };
        if already_watched {
            return self.inner.manager.get_and_watch(&id, None);
        }
        match refresh_entity(&self.inner, &id, false) {
            Ok(entity) => Ok(entity),
            Err(e) => {
                if let Some(entry) = self.inner.watches.lock().get_mut(&id) {
                    entry.active = false;
                }
                Err(e)
            }
        }
    }

    /// Returns whether `id` was being watched.
    pub fn unwatch(
        &self,
        id: &M::Id,
    ) -> bool {
        match self.inner.watches.lock().get_mut(id) {
            Some(entry) if entry.active => {
                entry.active = false;
                true
            }
            _ => false,
        }
    }

    pub fn is_watching(
        &self,
        id: &M::Id,
    ) -> bool {
        self.inner.watches.lock().get(id).is_some_and(|entry| entry.active)
    }
}

fn entity_watcher<M>(
    inner: &Arc<EntityInner<M>>,
    id: M::Id,
) -> Watcher
where
    M: WatchableEntityManager + 'static,
{
    let weak: Weak<EntityInner<M>> = Arc::downgrade(inner);
    Watcher::new(move || {
        if let Some(inner) = weak.upgrade() {
            if let Err(e) = refresh_entity(&inner, &id, true) {
                warn!(?id, "Failed to refresh entity: {}", e);
            }
        }
    })
}

fn refresh_entity<M>(
    inner: &Arc<EntityInner<M>>,
    id: &M::Id,
    emit: bool,
) -> Result<Option<M::Entity>>
where
    M: WatchableEntityManager + 'static,
{
    let watcher = {
        let mut watches = inner.watches.lock();
        if emit && inner.events.is_closed() {
            watches.clear();
            return Ok(None);
        }
        match watches.get(id) {
            Some(entry) if entry.active => entry.watcher.clone(),
            Some(_) => {
                // Unwatched and its watcher has just been spent
                watches.remove(id);
                return Ok(None);
            }
            None => return Ok(None),
        }
    };

    match inner.manager.get_and_watch(id, Some(watcher))? {
        Some(entity) => {
            if emit {
                inner.publish(EntityEvent::Updated(id.clone(), entity.clone()));
            }
            Ok(Some(entity))
        }
        // Node still there without payload; the watcher is armed
        None if inner.manager.exists(id) => Ok(None),
        None => {
            inner.watches.lock().remove(id);
            if emit {
                inner.publish(EntityEvent::Deleted(id.clone()));
            }
            Ok(None)
        }
    }
}
