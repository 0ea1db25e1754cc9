//! # Weather Farm Engine
//!
//! Runtime for Weather Farm.
//!
//! This crate wires the gameplay core to the outside world:
//! - TOML configuration
//! - File-backed preference store
//! - Key bindings for the farm hotkeys
//! - Logging presentation sink
//! - The tokio task that drives days, freezes and commands

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod file_store;
pub mod input;
pub mod presentation;
pub mod scheduler;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::file_store::*;
    pub use crate::input::*;
    pub use crate::presentation::*;
    pub use crate::scheduler::*;
}

pub use prelude::*;
