//! In-memory hierarchical coordination store.
//!
//! A ZooKeeper-style namespace of nodes addressed by slash-separated paths,
//! with one-shot watchers, atomic multi-op batches and sub-directory views,
//! plus typed entity managers and monitors built on top of it.
//!
//! ```rust,ignore
//! let directory = MemoryDirectory::new();
//! directory.add("/pools", None, CreateMode::Persistent)?;
//! let pools = directory.get_children("/pools", Some(Watcher::new(|| println!("changed"))))?;
//! ```

mod config;
mod directory;
mod errors;
mod storage;
mod watchable;

pub mod constants;
pub mod metrics;
pub mod reactor;

pub use config::*;
pub use directory::*;
pub use errors::*;
pub use storage::*;
pub use watchable::*;
