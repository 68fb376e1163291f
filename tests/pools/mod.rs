use std::sync::Arc;

use d_directory::metrics::gather_metrics;
use d_directory::reactor::Reactor;
use d_directory::reactor::TryCatchReactor;
use d_directory::CreateMode;
use d_directory::Directory;
use d_directory::DirectoryNodeConfig;
use d_directory::EntityEvent;
use d_directory::EntityIdSetEvent;
use d_directory::EntityIdSetMonitor;
use d_directory::EntityMonitor;
use d_directory::WatchableEntityManager;
use d_directory::Watcher;
use tokio::sync::mpsc;

use crate::common::ensure_path;
use crate::common::next_event;
use crate::common::pool_manager;
use crate::common::Pool;

fn midonet_config() -> DirectoryNodeConfig {
    let mut config = DirectoryNodeConfig::default();
    config.directory.base_path = "/midonet".to_string();
    config.reactor.identifier = "pool-reactor".to_string();
    config.validate().unwrap()
}

#[tokio::test]
async fn test_pool_lifecycle_is_streamed_to_monitors() {
    let config = midonet_config();
    let (directory, manager) = pool_manager(&config);

    // First pool creates the missing root in the same batch
    let ops = manager.prepare_create(&1, &Pool::new("web")).unwrap();
    assert_eq!(ops.len(), 3);
    directory.multi(ops).unwrap();

    let (ids, mut id_events) = EntityIdSetMonitor::new(manager.clone());
    assert_eq!(ids.start().unwrap(), vec![1]);
    assert_eq!(next_event(&mut id_events).await, EntityIdSetEvent::Created(1));

    let (entities, mut entity_events) = EntityMonitor::new(manager.clone());
    assert_eq!(entities.watch(1).unwrap(), Some(Pool::new("web")));

    let mut updated = Pool::new("web");
    updated.members.push("10.0.0.1".to_string());
    manager.update(&1, &updated).unwrap();
    assert_eq!(next_event(&mut entity_events).await, EntityEvent::Updated(1, updated));

    manager.create(&2, &Pool::new("db")).unwrap();
    assert_eq!(next_event(&mut id_events).await, EntityIdSetEvent::Created(2));

    directory.multi(manager.prepare_delete(&1)).unwrap();
    assert_eq!(next_event(&mut id_events).await, EntityIdSetEvent::Deleted(1));
    assert_eq!(next_event(&mut entity_events).await, EntityEvent::Deleted(1));

    assert_eq!(manager.list_and_watch(None).unwrap(), vec![2]);
    assert!(gather_metrics().contains("directory_batch_outcomes"));
}

#[tokio::test]
async fn test_failed_batch_leaves_pools_untouched() {
    let config = midonet_config();
    let (directory, manager) = pool_manager(&config);
    ensure_path(&directory, manager.root_path());
    manager.create(&1, &Pool::new("web")).unwrap();

    let (ids, mut id_events) = EntityIdSetMonitor::new(manager.clone());
    ids.start().unwrap();
    assert_eq!(next_event(&mut id_events).await, EntityIdSetEvent::Created(1));

    // The duplicate create of pool 1 aborts the whole batch
    let mut ops = manager.prepare_create(&2, &Pool::new("db")).unwrap();
    ops.extend(manager.prepare_create(&1, &Pool::new("again")).unwrap());
    assert!(directory.multi(ops).is_err());

    assert!(!manager.exists(&2));
    assert_eq!(manager.get_and_watch(&1, None).unwrap(), Some(Pool::new("web")));
    assert!(id_events.try_recv().is_err());

    // The id set watch survived the rollback
    manager.create(&3, &Pool::new("cache")).unwrap();
    assert_eq!(next_event(&mut id_events).await, EntityIdSetEvent::Created(3));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dispatched_watcher_reacts_off_the_mutating_thread() {
    let config = midonet_config();
    let (directory, _) = pool_manager(&config);
    let reactor: Arc<dyn Reactor> = Arc::new(TryCatchReactor::from_config(&config.reactor).unwrap());
    ensure_path(&directory, "/midonet/pools");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let reader = directory.clone();
    let watcher = Watcher::dispatched(reactor.clone(), move || {
        let children = reader.get_children("/midonet/pools", None).unwrap();
        let thread = std::thread::current().name().map(str::to_string);
        let _ = tx.send((children.len(), thread));
    });
    directory.get_children("/midonet/pools", Some(watcher)).unwrap();

    directory
        .add("/midonet/pools/lb-", None, CreateMode::PersistentSequential)
        .unwrap();

    let (children, thread) = next_event(&mut rx).await;
    assert_eq!(children, 1);
    assert!(thread.unwrap().starts_with("pool-reactor-"));

    reactor.shut_down_now();
}
