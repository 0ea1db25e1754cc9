//! # Weather Farm Gameplay
//!
//! The weather scheduling and persistence core of Weather Farm.
//!
//! This crate provides the synchronous engine the scheduler drives:
//! - Weather kinds and injectable randomness
//! - Reference-timezone clock
//! - Date-keyed weather persistence over a key-value store
//! - Run-length weather generation (write-once, lazy)
//! - Effect table for presentation and farmland plots
//! - Farm plots, crop catalog and the save/load bridge
//! - `WeatherEngine`, which ties them together

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod clock;
pub mod date_key;
pub mod effects;
pub mod engine;
pub mod farm;
pub mod generator;
pub mod plants;
pub mod save;
pub mod store;
pub mod weather;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::clock::*;
    pub use crate::date_key::*;
    pub use crate::effects::*;
    pub use crate::engine::*;
    pub use crate::farm::*;
    pub use crate::generator::*;
    pub use crate::plants::*;
    pub use crate::save::*;
    pub use crate::store::*;
    pub use crate::weather::*;
}

pub use prelude::*;
