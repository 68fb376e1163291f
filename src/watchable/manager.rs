use std::fmt;
use std::fmt::Display;
use std::hash::Hash;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;
use tracing::warn;

use super::serializer::BincodeSerializer;
use super::serializer::Serializer;
use crate::directory::join;
use crate::directory::segments;
use crate::CreateMode;
use crate::Directory;
use crate::Op;
use crate::Result;
use crate::Watcher;

/// Contract an entity manager implements to expose its entity set to
/// [`EntityIdSetMonitor`](super::EntityIdSetMonitor) and
/// [`EntityMonitor`](super::EntityMonitor).
pub trait WatchableEntityManager: Send + Sync {
    type Id: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;
    type Entity: Clone + Send + 'static;

    /// Current entity ids, arming `watcher` to fire once when membership
    /// changes. Content changes of a member do not fire it.
    fn list_and_watch(
        &self,
        watcher: Option<Watcher>,
    ) -> Result<Vec<Self::Id>>;

    /// The entity, arming `watcher` to fire once when it changes or goes
    /// away.
    ///
    /// Returns `None` when the entity does not exist: deletion between
    /// enumeration and fetch is an ordinary race. No watcher is armed then.
    /// An existing node without payload also reads as `None`, with the
    /// watcher armed; [`exists`](Self::exists) tells the two apart.
    fn get_and_watch(
        &self,
        id: &Self::Id,
        watcher: Option<Watcher>,
    ) -> Result<Option<Self::Entity>>;

    /// Whether the entity's node exists, null payload or not.
    fn exists(
        &self,
        id: &Self::Id,
    ) -> bool;
}

/// Entity manager keeping one child node per entity under `root`, with the
/// serialized entity as payload.
pub struct DirectoryEntityManager<Id, T, S = BincodeSerializer> {
    directory: Arc<dyn Directory>,
    root: String,
    serializer: S,
    _marker: PhantomData<fn() -> (Id, T)>,
}

impl<Id, T, S> fmt::Debug for DirectoryEntityManager<Id, T, S> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("DirectoryEntityManager").field("root", &self.root).finish()
    }
}

impl<Id, T> DirectoryEntityManager<Id, T, BincodeSerializer>
where
    Id: FromStr + Display,
    T: Serialize + DeserializeOwned,
{
    pub fn new(
        directory: Arc<dyn Directory>,
        root: impl Into<String>,
    ) -> Result<Self> {
        Self::with_serializer(directory, root, BincodeSerializer)
    }
}

impl<Id, T, S> DirectoryEntityManager<Id, T, S>
where
    Id: FromStr + Display,
    S: Serializer<T>,
{
    pub fn with_serializer(
        directory: Arc<dyn Directory>,
        root: impl Into<String>,
        serializer: S,
    ) -> Result<Self> {
        let root = root.into();
        segments(&root)?;
        Ok(Self {
            directory,
            root,
            serializer,
            _marker: PhantomData,
        })
    }

    pub fn root_path(&self) -> &str {
        &self.root
    }

    pub fn entity_path(
        &self,
        id: &Id,
    ) -> String {
        join(&self.root, &id.to_string())
    }

    pub fn exists(
        &self,
        id: &Id,
    ) -> bool {
        self.directory.has(&self.entity_path(id))
    }

    /// Stores a new entity; the root must already exist.
    pub fn create(
        &self,
        id: &Id,
        entity: &T,
    ) -> Result<String> {
        let data = self.serializer.serialize(entity)?;
        self.directory
            .add(&self.entity_path(id), Some(data), CreateMode::Persistent)
    }

    pub fn update(
        &self,
        id: &Id,
        entity: &T,
    ) -> Result<()> {
        let data = self.serializer.serialize(entity)?;
        self.directory.update(&self.entity_path(id), Some(data))
    }

    pub fn delete(
        &self,
        id: &Id,
    ) -> Result<()> {
        self.directory.delete(&self.entity_path(id))
    }

    /// Batch ops creating the entity, preceded by creates for whichever
    /// parts of the root path do not exist yet.
    pub fn prepare_create(
        &self,
        id: &Id,
        entity: &T,
    ) -> Result<Vec<Op>> {
        let mut ops = Vec::new();
        let mut path = String::new();
        for segment in segments(&self.root)? {
            path = join(&path, segment);
            if !self.directory.has(&path) {
                ops.push(Op::create(path.clone(), None, CreateMode::Persistent));
            }
        }
        let data = self.serializer.serialize(entity)?;
        ops.push(Op::create(self.entity_path(id), Some(data), CreateMode::Persistent));
        Ok(ops)
    }

    pub fn prepare_delete(
        &self,
        id: &Id,
    ) -> Vec<Op> {
        vec![Op::delete(self.entity_path(id))]
    }

    fn parse_id(
        &self,
        name: &str,
    ) -> Option<Id> {
        match Id::from_str(name) {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(root = %self.root, name, "Skipping child that is not a valid entity id");
                None
            }
        }
    }
}

impl<Id, T, S> WatchableEntityManager for DirectoryEntityManager<Id, T, S>
where
    Id: FromStr + Display + Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
    T: Clone + Send + 'static,
    S: Serializer<T>,
{
    type Id = Id;
    type Entity = T;

    fn list_and_watch(
        &self,
        watcher: Option<Watcher>,
    ) -> Result<Vec<Id>> {
        let mut names: Vec<String> = self.directory.get_children(&self.root, watcher)?.into_iter().collect();
        names.sort();
        trace!(root = %self.root, entities = names.len(), "Listed entities");
        Ok(names.iter().filter_map(|name| self.parse_id(name)).collect())
    }

    fn get_and_watch(
        &self,
        id: &Id,
        watcher: Option<Watcher>,
    ) -> Result<Option<T>> {
        match self.directory.get(&self.entity_path(id), watcher) {
            Ok(Some(bytes)) => self.serializer.deserialize(&bytes).map(Some),
            Ok(None) => Ok(None),
            Err(e) if e.is_not_found() => {
                trace!(%id, "Entity vanished before it could be read");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn exists(
        &self,
        id: &Id,
    ) -> bool {
        self.directory.has(&self.entity_path(id))
    }
}
