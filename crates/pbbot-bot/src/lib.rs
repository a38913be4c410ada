//! # PB Bot
//!
//! Multipurpose Discord bot with per-server prefixes, personal todo lists and
//! command usage statistics.
//!
//! This is the binary crate that wires the cache, the scheduler and the
//! Poise framework together and owns the process lifecycle.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod bot;
pub mod error;
pub mod events;
pub mod presence;

pub use bot::*;
pub use error::*;
pub use events::*;
pub use presence::*;
