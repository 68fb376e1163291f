//! In-memory coordination store
//!
//! [`MemoryDirectory`] composes three layers:
//! - `tree`: the node arena and its structural invariants
//! - `watch`: one-shot data and children watcher sets per node
//! - `batch`: the context threaded through every mutation, which decides
//!   when fired watchers run and journals changes for batch rollback

mod batch;
mod mem_directory;
mod state;
mod tree;
mod watch;

#[cfg(test)]
mod batch_test;

pub use mem_directory::*;
pub use watch::Watcher;
