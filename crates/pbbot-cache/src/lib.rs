//! # PB Bot Cache
//!
//! The stateful core of PB Bot: an in-memory mirror of guild prefixes, todo
//! lists and command usage counters, written back to a relational store on a
//! timer, plus the token-bucket rate limiter used by command dispatch.
//!
//! [`PersistentCache`] owns the state, [`Store`] abstracts the database, and
//! [`Scheduler`] drives flush, daily rollover and presence refresh so that
//! rollover never overlaps a flush.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod prefixes;
pub mod rate_limit;
pub mod scheduler;
pub mod sqlite;
pub mod stats;
pub mod store;
pub mod todos;

#[cfg(any(test, feature = "testing"))]
pub mod memory;

pub use cache::*;
pub use prefixes::*;
pub use rate_limit::*;
pub use scheduler::*;
pub use sqlite::*;
pub use stats::*;
pub use store::*;
pub use todos::*;

#[cfg(any(test, feature = "testing"))]
pub use memory::*;
