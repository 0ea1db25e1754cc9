//! Calendar-day keys for persisted weather.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace prefix for weather entries in the preference store.
pub const WEATHER_KEY_PREFIX: &str = "Weather_";

/// Date format used inside weather keys.
const KEY_DATE_FORMAT: &str = "%Y-%m-%d";

/// A calendar date in the reference timezone, with no time-of-day part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Wraps a calendar date.
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Builds a key from year, month and day, if that date exists.
    #[must_use]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Returns the underlying calendar date.
    #[must_use]
    pub const fn date(self) -> NaiveDate {
        self.0
    }

    /// Shifts the date by a signed number of days.
    ///
    /// Returns `None` only at the edges of the representable calendar.
    #[must_use]
    pub fn offset(self, days: i64) -> Option<Self> {
        self.0.checked_add_signed(Duration::days(days)).map(Self)
    }

    /// The following day.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        self.offset(1)
    }

    /// The preceding day.
    #[must_use]
    pub fn previous(self) -> Option<Self> {
        self.offset(-1)
    }

    /// Persisted store key, e.g. `Weather_2024-05-01`.
    #[must_use]
    pub fn store_key(self) -> String {
        format!("{WEATHER_KEY_PREFIX}{}", self.0.format(KEY_DATE_FORMAT))
    }

    /// Three-letter weekday used by the day label (`Mon`, `Tue`, ...).
    #[must_use]
    pub fn weekday_abbrev(self) -> String {
        self.0.format("%a").to_string()
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(KEY_DATE_FORMAT))
    }
}
