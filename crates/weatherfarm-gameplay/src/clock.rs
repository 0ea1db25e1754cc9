//! Reference-timezone clock.
//!
//! The farm's calendar follows one fixed civil timezone regardless of the
//! host locale. This module provides:
//! - `Clock`: the "now" abstraction the engine and scheduler read
//! - `ReferenceClock`: wall clock converted into the reference zone
//! - `FixedClock`: a settable clock for tests and debug sessions

use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::date_key::DateKey;

/// Default reference timezone (UK civil time).
pub const DEFAULT_REFERENCE_ZONE: &str = "Europe/London";

/// Default platform alias tried when the canonical id does not resolve.
pub const DEFAULT_ZONE_ALIAS: &str = "GMT Standard Time";

/// Platform timezone names mapped to their IANA identifiers.
const ZONE_ALIASES: &[(&str, &str)] = &[
    ("GMT Standard Time", "Europe/London"),
    ("Greenwich Standard Time", "Atlantic/Reykjavik"),
    ("W. Europe Standard Time", "Europe/Berlin"),
    ("Romance Standard Time", "Europe/Paris"),
    ("Eastern Standard Time", "America/New_York"),
    ("Central Standard Time", "America/Chicago"),
    ("Pacific Standard Time", "America/Los_Angeles"),
    ("Tokyo Standard Time", "Asia/Tokyo"),
    ("AUS Eastern Standard Time", "Australia/Sydney"),
    ("UTC", "UTC"),
];

/// Source of the current civil time in the reference zone.
pub trait Clock: Send + Sync {
    /// Current civil date-time in the reference zone.
    fn now(&self) -> NaiveDateTime;

    /// Today's date in the reference zone.
    fn today(&self) -> DateKey {
        DateKey::new(self.now().date())
    }

    /// Seconds from now until the next reference-zone midnight.
    ///
    /// Never negative. Callers that sleep on this should clamp small values
    /// up to one second.
    fn seconds_until_next_midnight(&self) -> f64 {
        seconds_until_next_midnight(self.now())
    }
}

/// Seconds between `now` and the following civil midnight.
#[must_use]
pub fn seconds_until_next_midnight(now: NaiveDateTime) -> f64 {
    let Some(tomorrow) = now.date().succ_opt() else {
        return 0.0;
    };
    let midnight = tomorrow.and_time(NaiveTime::MIN);
    let millis = (midnight - now).num_milliseconds();
    (millis.max(0) as f64) / 1000.0
}

/// Seconds between a zoned `now` and the zone's next midnight.
///
/// Counts real elapsed time, so a day that gains or loses an hour at a
/// clock change comes out as 25 or 23 hours. A midnight that does not exist
/// locally falls back to the civil difference.
#[must_use]
pub fn seconds_until_zoned_midnight<T: TimeZone>(now: &DateTime<T>) -> f64 {
    let Some(tomorrow) = now.date_naive().succ_opt() else {
        return 0.0;
    };
    let midnight = tomorrow.and_time(NaiveTime::MIN);
    match now.timezone().from_local_datetime(&midnight).earliest() {
        Some(target) => {
            let millis = (target.naive_utc() - now.naive_utc()).num_milliseconds();
            (millis.max(0) as f64) / 1000.0
        },
        None => seconds_until_next_midnight(now.naive_local()),
    }
}

/// How the reference zone was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneResolution {
    /// A named IANA zone.
    Named(Tz),
    /// Timezone data was unavailable; the host's local time is used.
    HostLocal,
}

/// Wall clock expressed in a fixed reference timezone.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceClock {
    zone: ZoneResolution,
}

impl Default for ReferenceClock {
    fn default() -> Self {
        Self::resolve(DEFAULT_REFERENCE_ZONE, DEFAULT_ZONE_ALIAS)
    }
}

impl ReferenceClock {
    /// Resolves the reference zone.
    ///
    /// Tries the canonical identifier, then the platform alias (directly and
    /// through the alias table), then falls back to host local time with a
    /// warning. Never fails.
    #[must_use]
    pub fn resolve(canonical: &str, alias: &str) -> Self {
        if let Some(tz) = parse_zone(canonical) {
            debug!("Reference timezone resolved to {tz}");
            return Self {
                zone: ZoneResolution::Named(tz),
            };
        }

        warn!("Timezone {canonical:?} not found, trying alias {alias:?}");
        let from_alias = parse_zone(alias).or_else(|| {
            ZONE_ALIASES
                .iter()
                .find(|(name, _)| *name == alias)
                .and_then(|(_, iana)| parse_zone(iana))
        });
        if let Some(tz) = from_alias {
            debug!("Reference timezone resolved to {tz} via alias");
            return Self {
                zone: ZoneResolution::Named(tz),
            };
        }

        warn!("Falling back to host local time; day boundaries may not match {canonical}");
        Self {
            zone: ZoneResolution::HostLocal,
        }
    }

    /// The resolved zone.
    #[must_use]
    pub fn zone(&self) -> ZoneResolution {
        self.zone
    }
}

impl Clock for ReferenceClock {
    fn now(&self) -> NaiveDateTime {
        match self.zone {
            ZoneResolution::Named(tz) => Utc::now().with_timezone(&tz).naive_local(),
            ZoneResolution::HostLocal => Local::now().naive_local(),
        }
    }

    fn seconds_until_next_midnight(&self) -> f64 {
        match self.zone {
            ZoneResolution::Named(tz) => seconds_until_zoned_midnight(&Utc::now().with_timezone(&tz)),
            ZoneResolution::HostLocal => seconds_until_zoned_midnight(&Local::now()),
        }
    }
}

fn parse_zone(name: &str) -> Option<Tz> {
    if name.is_empty() {
        return None;
    }
    name.parse::<Tz>().ok()
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    /// Creates a clock frozen at `now`.
    #[must_use]
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Creates a clock at the given date and time, if valid.
    #[must_use]
    pub fn at(date: DateKey, hour: u32, minute: u32, second: u32) -> Option<Self> {
        date.date().and_hms_opt(hour, minute, second).map(Self::new)
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock() = now;
    }

    /// Advances the clock by whole seconds.
    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock();
        *now += chrono::Duration::seconds(secs);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock()
    }
}
