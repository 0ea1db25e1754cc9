//! Weather kinds and the randomness used to pick them.
//!
//! This module provides:
//! - `WeatherKind`: the closed set of daily weather states
//! - `WeatherSet`: which kinds are in play for a farm
//! - `WeatherDice` / `WeatherRng`: injectable random draws

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Daily weather states.
///
/// Kinds are persisted by name, so adding a variant never invalidates an
/// older save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeatherKind {
    /// Clear skies. Watered crops grow faster, dry ones slower.
    #[default]
    Sunny,
    /// Rain waters every plot.
    Rainy,
    /// Wind may dry out plots.
    Windy,
    /// Snow freezes growth for a while.
    Snowy,
}

impl WeatherKind {
    /// Get the persisted and display name for this kind.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Sunny => "Sunny",
            Self::Rainy => "Rainy",
            Self::Windy => "Windy",
            Self::Snowy => "Snowy",
        }
    }

    /// Get all weather kinds.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Sunny, Self::Rainy, Self::Windy, Self::Snowy]
    }

    /// Parse a persisted name, falling back to `Sunny` for anything unknown.
    #[must_use]
    pub fn parse_or_sunny(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::Sunny)
    }
}

impl fmt::Display for WeatherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Error returned when a persisted weather name is not a known kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown weather kind: {0:?}")]
pub struct ParseWeatherKindError(pub String);

impl FromStr for WeatherKind {
    type Err = ParseWeatherKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|kind| kind.display_name() == s)
            .ok_or_else(|| ParseWeatherKindError(s.to_string()))
    }
}

/// The kinds a farm can roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherSet {
    /// Sunny and rainy only.
    Basic,
    /// Adds wind.
    Breezy,
    /// Every kind, snow included.
    #[default]
    Full,
}

impl WeatherSet {
    /// Kinds available in this set.
    #[must_use]
    pub fn kinds(self) -> &'static [WeatherKind] {
        static ALL: [WeatherKind; 4] = WeatherKind::all();
        match self {
            Self::Basic => &ALL[..2],
            Self::Breezy => &ALL[..3],
            Self::Full => &ALL,
        }
    }

    /// Whether a freshly generated day must differ from the day before.
    ///
    /// With only two kinds this would force strict alternation, so the
    /// basic set draws freely.
    #[must_use]
    pub fn forbids_repeat(self) -> bool {
        self.kinds().len() >= 3
    }
}

/// Source of random draws for weather decisions.
pub trait WeatherDice {
    /// Uniform index in `0..len`. `len` is never zero.
    fn index(&mut self, len: usize) -> usize;

    /// Uniform integer in `low..=high`.
    fn between(&mut self, low: u32, high: u32) -> u32;

    /// Returns true with the given probability.
    fn chance(&mut self, probability: f32) -> bool;
}

/// Default weather randomness backed by `fastrand`.
#[derive(Debug, Clone)]
pub struct WeatherRng {
    rng: fastrand::Rng,
}

impl Default for WeatherRng {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherRng {
    /// Create an RNG seeded from the environment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    /// Create a reproducible RNG.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl WeatherDice for WeatherRng {
    fn index(&mut self, len: usize) -> usize {
        self.rng.usize(..len)
    }

    fn between(&mut self, low: u32, high: u32) -> u32 {
        self.rng.u32(low..=high)
    }

    fn chance(&mut self, probability: f32) -> bool {
        self.rng.f32() < probability
    }
}
