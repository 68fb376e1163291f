use std::sync::Arc;
use std::time::Duration;

use d_directory::CreateMode;
use d_directory::Directory;
use d_directory::DirectoryEntityManager;
use d_directory::DirectoryNodeConfig;
use d_directory::MemoryDirectory;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

pub const WAIT_FOR_EVENT_IN_MS: u64 = 2000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub name: String,
    pub admin_state_up: bool,
    pub members: Vec<String>,
}

impl Pool {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            admin_state_up: true,
            members: Vec::new(),
        }
    }
}

pub type PoolManager = DirectoryEntityManager<u64, Pool>;

/// A directory and a pool manager rooted at `{base_path}/pools`.
pub fn pool_manager(config: &DirectoryNodeConfig) -> (MemoryDirectory, Arc<PoolManager>) {
    let directory = MemoryDirectory::from_config(&config.directory);
    let root = config.directory.path_builder().unwrap().path(&["pools"]);
    let shared: Arc<dyn Directory> = Arc::new(directory.clone());
    let manager = DirectoryEntityManager::new(shared, root).unwrap();
    (directory, Arc::new(manager))
}

pub fn ensure_path(
    directory: &MemoryDirectory,
    path: &str,
) {
    let mut current = String::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        current = format!("{}/{}", current, segment);
        if !directory.has(&current) {
            directory.add(&current, None, CreateMode::Persistent).unwrap();
        }
    }
}

pub async fn next_event<T>(rx: &mut UnboundedReceiver<T>) -> T {
    timeout(Duration::from_millis(WAIT_FOR_EVENT_IN_MS), rx.recv())
        .await
        .expect("event should arrive in time")
        .expect("channel should be open")
}
