//! Preference store abstraction and the weather view over it.
//!
//! This module provides:
//! - `PrefValue`: the scalar values a store can hold
//! - `PrefStore`: string-keyed persisted mapping (the external save store)
//! - `MemoryStore`: in-process implementation
//! - `WeatherStore`: date-keyed weather entries on top of any `PrefStore`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use weatherfarm_common::StoreResult;

use crate::date_key::DateKey;
use crate::weather::WeatherKind;

/// A scalar preference value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    /// Integer value (also used for booleans as 0/1).
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// String value.
    Text(String),
}

/// A persisted mapping from string key to scalar value.
///
/// Reads take an explicit default and never fail. Writes are buffered until
/// `flush`, which is the durability barrier: every earlier `set_*` and
/// `delete` is persisted once it returns `Ok`.
pub trait PrefStore: Send {
    /// Raw value for a key.
    fn get(&self, key: &str) -> Option<&PrefValue>;

    /// Stores a raw value.
    fn set(&mut self, key: &str, value: PrefValue);

    /// Removes a key. Removing a missing key is a no-op.
    fn delete(&mut self, key: &str);

    /// Persists all pending writes.
    fn flush(&mut self) -> StoreResult<()>;

    /// Whether a key is present.
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// String value, or `default` if absent or not a string.
    fn get_string(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(PrefValue::Text(s)) => s.clone(),
            _ => default.to_string(),
        }
    }

    /// Integer value, or `default` if absent or not an integer.
    fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.get(key) {
            Some(PrefValue::Int(v)) => *v,
            _ => default,
        }
    }

    /// Float value, or `default` if absent. Integers are widened.
    fn get_float(&self, key: &str, default: f64) -> f64 {
        match self.get(key) {
            Some(PrefValue::Float(v)) => *v,
            Some(PrefValue::Int(v)) => *v as f64,
            _ => default,
        }
    }

    /// Stores a string.
    fn set_string(&mut self, key: &str, value: &str) {
        self.set(key, PrefValue::Text(value.to_string()));
    }

    /// Stores an integer.
    fn set_int(&mut self, key: &str, value: i64) {
        self.set(key, PrefValue::Int(value));
    }

    /// Stores a float.
    fn set_float(&mut self, key: &str, value: f64) {
        self.set(key, PrefValue::Float(value));
    }
}

/// In-memory preference store. `flush` always succeeds.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, PrefValue>,
    flushes: usize,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// How many times `flush` has been called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.flushes
    }
}

impl PrefStore for MemoryStore {
    fn get(&self, key: &str) -> Option<&PrefValue> {
        self.values.get(key)
    }

    fn set(&mut self, key: &str, value: PrefValue) {
        self.values.insert(key.to_string(), value);
    }

    fn delete(&mut self, key: &str) {
        self.values.remove(key);
    }

    fn flush(&mut self) -> StoreResult<()> {
        self.flushes += 1;
        Ok(())
    }
}

/// Date-keyed weather entries on top of a preference store.
pub struct WeatherStore<'a> {
    prefs: &'a mut dyn PrefStore,
}

impl<'a> WeatherStore<'a> {
    /// Wraps a preference store.
    pub fn new(prefs: &'a mut dyn PrefStore) -> Self {
        Self { prefs }
    }

    /// Whether `date` already has weather assigned.
    #[must_use]
    pub fn has(&self, date: DateKey) -> bool {
        self.prefs.has(&date.store_key())
    }

    /// Raw stored name for `date`, if any.
    #[must_use]
    pub fn raw(&self, date: DateKey) -> Option<String> {
        match self.prefs.get(&date.store_key()) {
            Some(PrefValue::Text(s)) => Some(s.clone()),
            Some(_) => Some(String::new()),
            None => None,
        }
    }

    /// Stored kind for `date`, or `default` if absent or unparseable.
    #[must_use]
    pub fn get(&self, date: DateKey, default: WeatherKind) -> WeatherKind {
        self.raw(date)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(default)
    }

    /// Assigns `kind` to `date`, overwriting any existing entry.
    ///
    /// The generator never calls this on an assigned date.
    pub fn set(&mut self, date: DateKey, kind: WeatherKind) {
        self.prefs.set_string(&date.store_key(), kind.display_name());
    }

    /// Removes the entry for `date`.
    pub fn delete(&mut self, date: DateKey) {
        self.prefs.delete(&date.store_key());
    }

    /// Persists pending writes.
    pub fn flush(&mut self) -> StoreResult<()> {
        self.prefs.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> DateKey {
        DateKey::from_ymd(2024, 5, d).expect("valid date")
    }

    #[test]
    fn test_memory_store_typed_access() {
        let mut store = MemoryStore::new();
        store.set_int("PlayerMoney", 250);
        store.set_float("Acre_1_Timer", 2.5);
        store.set_string("Acre_1_PlantName", "Carrot");

        assert_eq!(store.get_int("PlayerMoney", 100), 250);
        assert!((store.get_float("Acre_1_Timer", 0.0) - 2.5).abs() < f64::EPSILON);
        assert_eq!(store.get_string("Acre_1_PlantName", ""), "Carrot");
        assert_eq!(store.get_int("Missing", 7), 7);
        // Type mismatches fall back to the default.
        assert_eq!(store.get_int("Acre_1_PlantName", 3), 3);
        assert!((store.get_float("PlayerMoney", 0.0) - 250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_memory_store_delete_and_flush() {
        let mut store = MemoryStore::new();
        store.set_int("a", 1);
        assert!(store.has("a"));
        store.delete("a");
        store.delete("a");
        assert!(!store.has("a"));
        assert!(store.is_empty());

        store.flush().expect("memory flush");
        assert_eq!(store.flush_count(), 1);
    }

    #[test]
    fn test_weather_store_round_trip() {
        let mut prefs = MemoryStore::new();
        let mut weather = WeatherStore::new(&mut prefs);

        assert!(!weather.has(day(1)));
        weather.set(day(1), WeatherKind::Windy);
        assert!(weather.has(day(1)));
        assert_eq!(weather.get(day(1), WeatherKind::Sunny), WeatherKind::Windy);

        weather.delete(day(1));
        assert!(!weather.has(day(1)));
        assert_eq!(weather.get(day(1), WeatherKind::Sunny), WeatherKind::Sunny);

        drop(weather);
        assert!(prefs.is_empty());
    }

    #[test]
    fn test_weather_store_bad_values_default() {
        let mut prefs = MemoryStore::new();
        prefs.set_string(&day(2).store_key(), "Tornado");
        prefs.set_int(&day(3).store_key(), 4);

        let weather = WeatherStore::new(&mut prefs);
        assert_eq!(weather.get(day(2), WeatherKind::Sunny), WeatherKind::Sunny);
        assert_eq!(weather.get(day(3), WeatherKind::Sunny), WeatherKind::Sunny);
        assert!(weather.has(day(3)));
    }
}
