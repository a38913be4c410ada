//! # PB Bot Commands
//!
//! Prefix commands for PB Bot and the hooks that wrap every invocation:
//! dynamic prefix resolution, the global per-user rate limit, usage
//! recording and error reporting.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod dispatch;
pub mod error;
pub mod framework;
pub mod help;
pub mod ping;
pub mod prefix;
pub mod socketstats;
pub mod stats;
pub mod todo;
pub mod uptime;

pub use dispatch::*;
pub use error::*;
pub use framework::*;
