//! Watchable entities
//!
//! Typed entity managers over a [`Directory`](crate::Directory) and the
//! monitors that turn their one-shot watches into continuous event streams.

mod manager;
mod monitor;
mod serializer;


pub use manager::*;
pub use monitor::*;
pub use serializer::*;
