//! ID types for farm entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a farmland plot.
///
/// Plot ids double as the prefix of every persisted per-plot field, so they
/// are stable names rather than generated counters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlotId(String);

impl PlotId {
    /// Creates a plot ID from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates the conventional id for the `index`-th acre (1-based).
    #[must_use]
    pub fn acre(index: usize) -> Self {
        Self(format!("Acre_{index}"))
    }

    /// Returns the plot name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the persisted key for one of this plot's fields.
    #[must_use]
    pub fn field_key(&self, field: &str) -> String {
        format!("{}_{field}", self.0)
    }
}

impl fmt::Display for PlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlotId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
