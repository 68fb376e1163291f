//! Task scheduling for watcher reactions
//!
//! Watchers fire on whatever thread mutated the directory. Components that
//! react with real work (re-reading entities, reconciling state) hand that
//! work to a [`Reactor`] instead, usually through
//! [`Watcher::dispatched`](crate::Watcher::dispatched).

mod try_catch_reactor;

#[cfg(test)]
mod try_catch_reactor_test;

use std::time::Duration;

pub use try_catch_reactor::*;

use crate::Result;

/// A unit of work handed to a reactor
pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub trait Reactor: Send + Sync {
    /// Runs `task` as soon as a worker is free.
    fn submit(
        &self,
        task: Task,
    ) -> Result<()>;

    /// Runs `task` once `delay` has elapsed.
    fn schedule(
        &self,
        task: Task,
        delay: Duration,
    ) -> Result<()>;

    fn current_time_millis(&self) -> u64;

    /// Stops accepting work and abandons anything still queued.
    fn shut_down_now(&self);

    fn is_shut_down(&self) -> bool;
}
