use std::sync::Arc;

use d_directory::CreateMode;
use d_directory::Directory;
use d_directory::DirectoryEntityManager;
use d_directory::EntityIdSetEvent;
use d_directory::EntityIdSetMonitor;
use d_directory::MemoryDirectory;

use crate::common::ensure_path;
use crate::common::next_event;

#[tokio::test]
async fn test_expired_session_removes_its_hosts() {
    let directory = MemoryDirectory::new();
    ensure_path(&directory, "/hosts");
    let agent = directory.with_session(11);
    agent.add("/hosts/h1", Some(b"up".to_vec()), CreateMode::Ephemeral).unwrap();
    directory.with_session(12).add("/hosts/h2", None, CreateMode::Ephemeral).unwrap();

    let shared: Arc<dyn Directory> = Arc::new(directory.clone());
    let manager: DirectoryEntityManager<String, Vec<u8>> = DirectoryEntityManager::new(shared, "/hosts").unwrap();
    let (monitor, mut events) = EntityIdSetMonitor::new(Arc::new(manager));
    monitor.start().unwrap();
    assert_eq!(next_event(&mut events).await, EntityIdSetEvent::Created("h1".to_string()));
    assert_eq!(next_event(&mut events).await, EntityIdSetEvent::Created("h2".to_string()));

    assert_eq!(directory.expire_session(11).unwrap(), 1);

    assert_eq!(next_event(&mut events).await, EntityIdSetEvent::Deleted("h1".to_string()));
    assert!(!directory.has("/hosts/h1"));
    assert!(directory.has("/hosts/h2"));
}

#[tokio::test]
async fn test_sub_directory_handle_keeps_session() {
    let directory = MemoryDirectory::new();
    ensure_path(&directory, "/hosts");
    let hosts = directory.with_session(21).sub_directory("/hosts").unwrap();

    let path = hosts.add("/h-", None, CreateMode::EphemeralSequential).unwrap();
    assert_eq!(path, "/h-0000000000");
    assert_eq!(hosts.session_id(), 21);

    assert_eq!(directory.expire_session(21).unwrap(), 1);
    assert!(hosts.get_children("/", None).unwrap().is_empty());
}
