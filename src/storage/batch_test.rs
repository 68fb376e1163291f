use super::batch::BatchContext;
use super::tree::Change;
use super::tree::NodeId;
use super::tree::NodeTree;
use super::tree::ROOT_ID;
use super::watch::WatchKind;
use super::watch::WatchRegistry;
use super::watch::Watcher;
use crate::CreateMode;

fn watcher() -> Watcher {
    Watcher::new(|| {})
}

fn create(
    tree: &mut NodeTree,
    parent: NodeId,
    name: &str,
) -> (NodeId, Change) {
    let (_, change) = tree.add_child(parent, name, None, CreateMode::Persistent, None).unwrap();
    match change {
        Change::Created { id, .. } => (id, change),
        other => panic!("unexpected change {:?}", other),
    }
}

#[test]
fn create_fires_parent_children_watchers() {
    let mut tree = NodeTree::new();
    let mut watches = WatchRegistry::new();
    let w = watcher();
    watches.register(ROOT_ID, WatchKind::Children, w.clone());
    watches.register(ROOT_ID, WatchKind::Data, watcher());

    let mut ctx = BatchContext::immediate();
    let (_, change) = create(&mut tree, ROOT_ID, "a");
    ctx.record(change, &mut watches);

    // Immediate contexts keep no journal
    assert_eq!(ctx.len(), 0);
    assert_eq!(ctx.into_pending().into_iter().collect::<Vec<_>>(), vec![w]);
    assert_eq!(watches.count(ROOT_ID, WatchKind::Children), 0);
    assert_eq!(watches.count(ROOT_ID, WatchKind::Data), 1);
}

#[test]
fn delete_fires_data_and_parent_but_drops_own_children_watchers() {
    let mut tree = NodeTree::new();
    let mut watches = WatchRegistry::new();
    let (a, _) = create(&mut tree, ROOT_ID, "a");
    let data = watcher();
    let parent_children = watcher();
    let own_children = watcher();
    watches.register(a, WatchKind::Data, data.clone());
    watches.register(a, WatchKind::Children, own_children);
    watches.register(ROOT_ID, WatchKind::Children, parent_children.clone());

    let mut ctx = BatchContext::immediate();
    let change = tree.delete_child(ROOT_ID, "a").unwrap();
    ctx.record(change, &mut watches);

    let pending = ctx.into_pending();
    assert_eq!(pending.len(), 2);
    assert!(pending.contains(&data));
    assert!(pending.contains(&parent_children));
    assert_eq!(watches.count(a, WatchKind::Children), 0);
}

#[test]
fn watcher_armed_on_several_nodes_is_pending_once() {
    let mut tree = NodeTree::new();
    let mut watches = WatchRegistry::new();
    let (a, _) = create(&mut tree, ROOT_ID, "a");
    let shared = watcher();
    watches.register(a, WatchKind::Data, shared.clone());
    watches.register(ROOT_ID, WatchKind::Children, shared.clone());

    let mut ctx = BatchContext::deferred();
    let change = tree.set_data(a, Some(vec![1])).unwrap();
    ctx.record(change, &mut watches);
    let (_, change) = create(&mut tree, ROOT_ID, "b");
    ctx.record(change, &mut watches);

    assert_eq!(ctx.len(), 2);
    assert_eq!(ctx.into_pending().into_iter().collect::<Vec<_>>(), vec![shared]);
}

#[test]
fn rollback_restores_tree_and_rearms_watchers() {
    let mut tree = NodeTree::new();
    let mut watches = WatchRegistry::new();
    let (a, _) = create(&mut tree, ROOT_ID, "a");
    tree.set_data(a, Some(b"v1".to_vec())).unwrap();
    watches.register(a, WatchKind::Data, watcher());
    watches.register(a, WatchKind::Children, watcher());
    watches.register(ROOT_ID, WatchKind::Children, watcher());

    let mut ctx = BatchContext::deferred();
    let change = tree.set_data(a, Some(b"v2".to_vec())).unwrap();
    ctx.record(change, &mut watches);
    let change = tree.delete_child(ROOT_ID, "a").unwrap();
    ctx.record(change, &mut watches);
    let (_, change) = create(&mut tree, ROOT_ID, "b");
    ctx.record(change, &mut watches);

    ctx.rollback(&mut tree, &mut watches);

    assert_eq!(tree.len(), 2);
    assert_eq!(tree.resolve(ROOT_ID, &["a"]).unwrap(), a);
    assert_eq!(tree.data(a).unwrap(), Some(b"v1".to_vec()));
    assert_eq!(watches.count(a, WatchKind::Data), 1);
    assert_eq!(watches.count(a, WatchKind::Children), 1);
    assert_eq!(watches.count(ROOT_ID, WatchKind::Children), 1);
}

#[test]
fn rollback_skips_watchers_of_nodes_created_in_the_batch() {
    let mut tree = NodeTree::new();
    let mut watches = WatchRegistry::new();

    let mut ctx = BatchContext::deferred();
    let (a, change) = create(&mut tree, ROOT_ID, "a");
    ctx.record(change, &mut watches);
    // Armed mid-batch on a node the rollback removes
    watches.register(a, WatchKind::Data, watcher());
    let change = tree.set_data(a, Some(vec![1])).unwrap();
    ctx.record(change, &mut watches);

    ctx.rollback(&mut tree, &mut watches);

    assert_eq!(tree.len(), 1);
    assert_eq!(watches.count(a, WatchKind::Data), 0);
}
