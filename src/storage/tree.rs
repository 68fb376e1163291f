//! Node tree
//!
//! An arena of nodes keyed by stable [`NodeId`]s. Each node owns a map from
//! child name to child id; there are no parent back-pointers. Ids are never
//! reused, so a handle holding the id of a deleted node resolves to NotFound
//! rather than to whatever was created later.
//!
//! Every mutation returns a [`Change`] describing what happened. Callers use
//! it to decide which watchers fire and, inside a batch, to revert the
//! mutation if a later operation fails.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::HashSet;

use tracing::trace;

use crate::constants::PATH_SEPARATOR;
use crate::constants::ROOT_PATH;
use crate::constants::SEQUENTIAL_SUFFIX_WIDTH;
use crate::directory::join;
use crate::CreateMode;
use crate::DirectoryError;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(u64);

pub(crate) const ROOT_ID: NodeId = NodeId(0);

#[derive(Debug)]
pub(crate) struct Node {
    /// Absolute path from the tree root (`""` for the root itself)
    path: String,
    data: Option<Vec<u8>>,
    mode: CreateMode,
    /// Session that created this node, for ephemeral modes only
    owner: Option<i64>,
    /// Next suffix handed to a sequential child
    sequence: u64,
    children: BTreeMap<String, NodeId>,
}

impl Node {
    fn new(
        path: String,
        data: Option<Vec<u8>>,
        mode: CreateMode,
        owner: Option<i64>,
    ) -> Self {
        Self {
            path,
            data,
            mode,
            owner,
            sequence: 0,
            children: BTreeMap::new(),
        }
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// A single applied mutation, carrying what is needed to undo it.
#[derive(Debug)]
pub(crate) enum Change {
    Created {
        parent: NodeId,
        name: String,
        id: NodeId,
    },
    DataChanged {
        id: NodeId,
        previous: Option<Vec<u8>>,
    },
    Deleted {
        parent: NodeId,
        name: String,
        id: NodeId,
        node: Node,
    },
}

#[derive(Debug)]
pub(crate) struct NodeTree {
    nodes: HashMap<NodeId, Node>,
    next_id: u64,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    pub(crate) fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            ROOT_ID,
            Node::new(ROOT_PATH.to_string(), None, CreateMode::Persistent, None),
        );
        Self { nodes, next_id: 1 }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn node(
        &self,
        id: NodeId,
    ) -> Result<&Node> {
        self.nodes
            .get(&id)
            .ok_or_else(|| DirectoryError::NotFound(format!("{:?}", id)).into())
    }

    fn node_mut(
        &mut self,
        id: NodeId,
    ) -> Result<&mut Node> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| DirectoryError::NotFound(format!("{:?}", id)).into())
    }

    /// Walks `segments` down from `start`.
    pub(crate) fn resolve(
        &self,
        start: NodeId,
        segments: &[&str],
    ) -> Result<NodeId> {
        let mut current = self.node(start)?;
        let mut current_id = start;
        for segment in segments {
            current_id = *current
                .children
                .get(*segment)
                .ok_or_else(|| DirectoryError::NotFound(join(&current.path, segment)))?;
            current = self.node(current_id)?;
        }
        Ok(current_id)
    }

    /// Inserts a child and returns its assigned absolute path with the change.
    pub(crate) fn add_child(
        &mut self,
        parent_id: NodeId,
        name: &str,
        data: Option<Vec<u8>>,
        mode: CreateMode,
        owner: Option<i64>,
    ) -> Result<(String, Change)> {
        let id = NodeId(self.next_id);
        let parent = self.node_mut(parent_id)?;

        if !mode.is_sequential() && parent.children.contains_key(name) {
            return Err(DirectoryError::AlreadyExists(join(&parent.path, name)).into());
        }
        if parent.mode.is_ephemeral() {
            return Err(DirectoryError::EphemeralViolation(join(&parent.path, name)).into());
        }

        let name = if mode.is_sequential() {
            let sequence = parent.sequence;
            parent.sequence += 1;
            format!("{}{:0width$}", name, sequence, width = SEQUENTIAL_SUFFIX_WIDTH)
        } else {
            name.to_string()
        };
        // A plain child may already carry a name that looks sequential
        if parent.children.contains_key(&name) {
            return Err(DirectoryError::AlreadyExists(join(&parent.path, &name)).into());
        }

        let path = join(&parent.path, &name);
        parent.children.insert(name.clone(), id);
        let owner = if mode.is_ephemeral() { owner } else { None };
        self.nodes.insert(id, Node::new(path.clone(), data, mode, owner));
        self.next_id += 1;

        trace!(path = %path, ?mode, "Node created");
        Ok((
            path,
            Change::Created {
                parent: parent_id,
                name,
                id,
            },
        ))
    }

    pub(crate) fn set_data(
        &mut self,
        id: NodeId,
        data: Option<Vec<u8>>,
    ) -> Result<Change> {
        let node = self.node_mut(id)?;
        let previous = std::mem::replace(&mut node.data, data);
        trace!(path = %node.path, "Node data replaced");
        Ok(Change::DataChanged { id, previous })
    }

    /// Payload copy; the caller never shares storage with the tree.
    pub(crate) fn data(
        &self,
        id: NodeId,
    ) -> Result<Option<Vec<u8>>> {
        Ok(self.node(id)?.data.clone())
    }

    pub(crate) fn children_names(
        &self,
        id: NodeId,
    ) -> Result<HashSet<String>> {
        Ok(self.node(id)?.children.keys().cloned().collect())
    }

    pub(crate) fn delete_child(
        &mut self,
        parent_id: NodeId,
        name: &str,
    ) -> Result<Change> {
        let parent = self.node(parent_id)?;
        let child_path = join(&parent.path, name);
        let id = *parent
            .children
            .get(name)
            .ok_or_else(|| DirectoryError::NotFound(child_path.clone()))?;
        if self.node(id)?.has_children() {
            return Err(DirectoryError::NotEmpty(child_path).into());
        }

        self.node_mut(parent_id)?.children.remove(name);
        let node = self.nodes.remove(&id).ok_or_else(|| DirectoryError::NotFound(child_path.clone()))?;

        trace!(path = %child_path, "Node deleted");
        Ok(Change::Deleted {
            parent: parent_id,
            name: name.to_string(),
            id,
            node,
        })
    }

    /// Undoes a change produced by this tree.
    ///
    /// Changes must be reverted newest first. Sequence counters are left as
    /// they are, so a reverted sequential create never hands its suffix out
    /// again.
    pub(crate) fn revert(
        &mut self,
        change: Change,
    ) {
        match change {
            Change::Created { parent, name, id, .. } => {
                if let Some(parent) = self.nodes.get_mut(&parent) {
                    parent.children.remove(&name);
                }
                self.nodes.remove(&id);
            }
            Change::DataChanged { id, previous } => {
                if let Some(node) = self.nodes.get_mut(&id) {
                    node.data = previous;
                }
            }
            Change::Deleted { parent, name, id, node } => {
                if let Some(parent) = self.nodes.get_mut(&parent) {
                    parent.children.insert(name, id);
                }
                self.nodes.insert(id, node);
            }
        }
    }

    /// Ids of the ephemeral nodes created by `session`, deepest first.
    pub(crate) fn ephemerals_owned_by(
        &self,
        session: i64,
    ) -> Vec<NodeId> {
        let mut owned: Vec<(&NodeId, &Node)> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.owner == Some(session))
            .collect();
        owned.sort_by(|(_, a), (_, b)| b.path.len().cmp(&a.path.len()).then_with(|| a.path.cmp(&b.path)));
        owned.into_iter().map(|(id, _)| *id).collect()
    }

    /// Parent id and local name of `id`, found by walking its stored path.
    pub(crate) fn locate(
        &self,
        id: NodeId,
    ) -> Result<(NodeId, String)> {
        let path = self.node(id)?.path.clone();
        let Some((parent_path, name)) = path.rsplit_once(PATH_SEPARATOR) else {
            return Err(DirectoryError::InvalidArgument("The root node has no parent".to_string()).into());
        };
        let segments: Vec<&str> = parent_path.split(PATH_SEPARATOR).filter(|s| !s.is_empty()).collect();
        Ok((self.resolve(ROOT_ID, &segments)?, name.to_string()))
    }
}
