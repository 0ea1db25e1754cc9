//! Run-length weather generation.
//!
//! Weather is decided lazily and persisted per calendar day. When a day with
//! no assignment is requested, one kind is rolled for a run of consecutive
//! days starting there. Days inside the run that already have weather keep
//! it, so every assignment is write-once.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::date_key::DateKey;
use crate::store::{PrefStore, WeatherStore};
use crate::weather::{WeatherDice, WeatherKind, WeatherRng, WeatherSet};

/// Smallest allowed maximum run length.
pub const MIN_RUN_LENGTH: u32 = 1;
/// Largest allowed maximum run length.
pub const MAX_RUN_LENGTH_LIMIT: u32 = 5;
/// Default maximum run length.
pub const DEFAULT_MAX_RUN_LENGTH: u32 = 3;

/// Configuration for weather generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Upper bound for a run's length, clamped to `1..=5`.
    pub max_run_length: u32,
    /// Kinds that can be rolled.
    pub weather_set: WeatherSet,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_run_length: DEFAULT_MAX_RUN_LENGTH,
            weather_set: WeatherSet::Full,
        }
    }
}

impl GeneratorConfig {
    /// Clamp values to supported ranges.
    pub fn validate(&mut self) {
        self.max_run_length = self
            .max_run_length
            .clamp(MIN_RUN_LENGTH, MAX_RUN_LENGTH_LIMIT);
    }
}

/// The outcome of one generation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    /// First day of the run.
    pub start: DateKey,
    /// Number of days the run spans, including skipped ones.
    pub length: u32,
    /// Kind assigned to the run.
    pub kind: WeatherKind,
    /// Days that were actually written.
    pub written: u32,
}

/// Rolls and persists weather runs.
pub struct WeatherGenerator {
    config: GeneratorConfig,
    dice: Box<dyn WeatherDice + Send>,
}

impl std::fmt::Debug for WeatherGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherGenerator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for WeatherGenerator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

impl WeatherGenerator {
    /// Create a generator with environment-seeded randomness.
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        Self::with_dice(config, WeatherRng::new())
    }

    /// Create a generator with a reproducible seed.
    #[must_use]
    pub fn with_seed(config: GeneratorConfig, seed: u64) -> Self {
        Self::with_dice(config, WeatherRng::with_seed(seed))
    }

    /// Create a generator with custom randomness.
    #[must_use]
    pub fn with_dice(mut config: GeneratorConfig, dice: impl WeatherDice + Send + 'static) -> Self {
        config.validate();
        Self {
            config,
            dice: Box::new(dice),
        }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Shared randomness, also used for per-plot draws.
    pub fn dice(&mut self) -> &mut dyn WeatherDice {
        self.dice.as_mut()
    }

    /// Makes sure `date` has weather, rolling a run if it does not.
    ///
    /// Returns the run when one was generated, `None` if `date` was already
    /// assigned. Calling this repeatedly is always safe.
    pub fn ensure_assigned(&mut self, prefs: &mut dyn PrefStore, date: DateKey) -> Option<Run> {
        let mut store = WeatherStore::new(prefs);
        if store.has(date) {
            return None;
        }

        let previous = date
            .previous()
            .map_or(WeatherKind::Sunny, |prev| store.get(prev, WeatherKind::Sunny));
        let kind = self.roll_kind(previous);
        let length = self.dice.between(MIN_RUN_LENGTH, self.config.max_run_length);

        let mut written = 0;
        for offset in 0..length {
            let Some(day) = date.offset(i64::from(offset)) else {
                break;
            };
            if store.has(day) {
                continue;
            }
            store.set(day, kind);
            written += 1;
            debug!("Assigned {kind} to {day}");
        }

        if let Err(e) = store.flush() {
            warn!("Failed to flush weather run starting {date}: {e}");
        }

        Some(Run {
            start: date,
            length,
            kind,
            written,
        })
    }

    /// Weather for `date`, generating it if needed.
    ///
    /// Never fails: missing or unreadable data reads as `Sunny`.
    pub fn weather_for(&mut self, prefs: &mut dyn PrefStore, date: DateKey) -> WeatherKind {
        self.ensure_assigned(prefs, date);
        WeatherStore::new(prefs).get(date, WeatherKind::Sunny)
    }

    /// Uniform pick from the whole set, ignoring history.
    ///
    /// Used by the test-mode ticker, which bypasses runs entirely.
    pub fn roll_any(&mut self) -> WeatherKind {
        let kinds = self.config.weather_set.kinds();
        kinds[self.dice.index(kinds.len())]
    }

    fn roll_kind(&mut self, previous: WeatherKind) -> WeatherKind {
        let set = self.config.weather_set;
        if !set.forbids_repeat() {
            return self.roll_any();
        }
        let candidates: Vec<WeatherKind> = set
            .kinds()
            .iter()
            .copied()
            .filter(|kind| *kind != previous)
            .collect();
        candidates[self.dice.index(candidates.len())]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    /// Dice that replay scripted answers, then fall back to zero / false.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedDice {
        pub indices: VecDeque<usize>,
        pub lengths: VecDeque<u32>,
        pub chances: VecDeque<bool>,
    }

    impl ScriptedDice {
        pub(crate) fn new(indices: &[usize], lengths: &[u32]) -> Self {
            Self {
                indices: indices.iter().copied().collect(),
                lengths: lengths.iter().copied().collect(),
                chances: VecDeque::new(),
            }
        }
    }

    impl WeatherDice for ScriptedDice {
        fn index(&mut self, len: usize) -> usize {
            self.indices.pop_front().unwrap_or(0).min(len - 1)
        }

        fn between(&mut self, low: u32, high: u32) -> u32 {
            self.lengths.pop_front().unwrap_or(low).clamp(low, high)
        }

        fn chance(&mut self, _probability: f32) -> bool {
            self.chances.pop_front().unwrap_or(false)
        }
    }

    fn day(y: i32, m: u32, d: u32) -> DateKey {
        DateKey::from_ymd(y, m, d).expect("valid date")
    }

    #[test]
    fn test_config_clamps_run_length() {
        let mut config = GeneratorConfig {
            max_run_length: 0,
            ..Default::default()
        };
        config.validate();
        assert_eq!(config.max_run_length, 1);

        config.max_run_length = 9;
        config.validate();
        assert_eq!(config.max_run_length, 5);
    }

    #[test]
    fn test_may_first_scenario() {
        // Previous day is unassigned (Sunny), so candidates are
        // [Rainy, Windy, Snowy]; index 0 picks Rainy. Second roll excludes
        // Rainy: [Sunny, Windy, Snowy].
        let dice = ScriptedDice::new(&[0, 1], &[2, 1]);
        let mut generator = WeatherGenerator::with_dice(GeneratorConfig::default(), dice);
        let mut prefs = MemoryStore::new();

        let run = generator
            .ensure_assigned(&mut prefs, day(2024, 5, 1))
            .expect("fresh run");
        assert_eq!(run.kind, WeatherKind::Rainy);
        assert_eq!(run.length, 2);
        assert_eq!(run.written, 2);

        assert_eq!(generator.weather_for(&mut prefs, day(2024, 5, 1)), WeatherKind::Rainy);
        assert_eq!(generator.weather_for(&mut prefs, day(2024, 5, 2)), WeatherKind::Rainy);

        let third = generator.weather_for(&mut prefs, day(2024, 5, 3));
        assert_ne!(third, WeatherKind::Rainy);
        assert_eq!(third, WeatherKind::Windy);
    }

    #[test]
    fn test_assigned_date_is_a_no_op() {
        let mut generator = WeatherGenerator::with_seed(GeneratorConfig::default(), 1);
        let mut prefs = MemoryStore::new();
        prefs.set_string(&day(2024, 1, 1).store_key(), "Snowy");

        assert!(generator.ensure_assigned(&mut prefs, day(2024, 1, 1)).is_none());
        assert_eq!(prefs.flush_count(), 0);
        assert_eq!(generator.weather_for(&mut prefs, day(2024, 1, 1)), WeatherKind::Snowy);
    }

    #[test]
    fn test_run_skips_assigned_days_without_rerolling() {
        let dice = ScriptedDice::new(&[2], &[3]);
        let mut generator = WeatherGenerator::with_dice(GeneratorConfig::default(), dice);
        let mut prefs = MemoryStore::new();
        prefs.set_string(&day(2024, 5, 2).store_key(), "Sunny");

        let run = generator
            .ensure_assigned(&mut prefs, day(2024, 5, 1))
            .expect("fresh run");
        assert_eq!(run.kind, WeatherKind::Snowy);
        assert_eq!(run.length, 3);
        assert_eq!(run.written, 2);

        let mut store = WeatherStore::new(&mut prefs);
        assert_eq!(store.get(day(2024, 5, 1), WeatherKind::Sunny), WeatherKind::Snowy);
        assert_eq!(store.get(day(2024, 5, 2), WeatherKind::Rainy), WeatherKind::Sunny);
        assert_eq!(store.get(day(2024, 5, 3), WeatherKind::Sunny), WeatherKind::Snowy);
        assert!(!store.has(day(2024, 5, 4)));
        store.flush().expect("flush");
    }

    #[test]
    fn test_flushes_once_per_run() {
        let dice = ScriptedDice::new(&[0], &[3]);
        let mut generator = WeatherGenerator::with_dice(GeneratorConfig::default(), dice);
        let mut prefs = MemoryStore::new();
        generator.ensure_assigned(&mut prefs, day(2024, 5, 1));
        assert_eq!(prefs.flush_count(), 1);
        assert_eq!(prefs.len(), 3);
    }

    #[test]
    fn test_previous_day_read_from_store() {
        // Previous day Windy: candidates [Sunny, Rainy, Snowy].
        let dice = ScriptedDice::new(&[2], &[1]);
        let mut generator = WeatherGenerator::with_dice(GeneratorConfig::default(), dice);
        let mut prefs = MemoryStore::new();
        prefs.set_string(&day(2024, 5, 9).store_key(), "Windy");

        assert_eq!(generator.weather_for(&mut prefs, day(2024, 5, 10)), WeatherKind::Snowy);
    }

    #[test]
    fn test_corrupt_previous_day_counts_as_sunny() {
        let dice = ScriptedDice::new(&[0], &[1]);
        let mut generator = WeatherGenerator::with_dice(GeneratorConfig::default(), dice);
        let mut prefs = MemoryStore::new();
        prefs.set_string(&day(2024, 5, 9).store_key(), "???");

        // Sunny excluded, index 0 of [Rainy, Windy, Snowy].
        assert_eq!(generator.weather_for(&mut prefs, day(2024, 5, 10)), WeatherKind::Rainy);
    }

    #[test]
    fn test_basic_set_allows_repeats() {
        let config = GeneratorConfig {
            max_run_length: 1,
            weather_set: WeatherSet::Basic,
        };
        let dice = ScriptedDice::new(&[0, 0], &[1, 1]);
        let mut generator = WeatherGenerator::with_dice(config, dice);
        let mut prefs = MemoryStore::new();

        assert_eq!(generator.weather_for(&mut prefs, day(2024, 5, 1)), WeatherKind::Sunny);
        assert_eq!(generator.weather_for(&mut prefs, day(2024, 5, 2)), WeatherKind::Sunny);
    }

    #[test]
    fn test_invalid_stored_value_reads_sunny() {
        let mut generator = WeatherGenerator::with_seed(GeneratorConfig::default(), 3);
        let mut prefs = MemoryStore::new();
        prefs.set_string(&day(2024, 5, 1).store_key(), "Blizzard");
        assert_eq!(generator.weather_for(&mut prefs, day(2024, 5, 1)), WeatherKind::Sunny);
        // Still write-once: the bad value is left in place.
        assert_eq!(prefs.get_string(&day(2024, 5, 1).store_key(), ""), "Blizzard");
    }

    #[test]
    fn test_roll_any_stays_in_set() {
        let config = GeneratorConfig {
            weather_set: WeatherSet::Breezy,
            ..Default::default()
        };
        let mut generator = WeatherGenerator::with_seed(config, 11);
        for _ in 0..100 {
            assert_ne!(generator.roll_any(), WeatherKind::Snowy);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_ensure_assigned_is_idempotent(seed in any::<u64>(), offset in 0i64..3650) {
            let date = day(2020, 1, 1).offset(offset).expect("in range");
            let mut generator = WeatherGenerator::with_seed(GeneratorConfig::default(), seed);
            let mut prefs = MemoryStore::new();

            let first = generator.weather_for(&mut prefs, date);
            let snapshot = prefs.clone();
            prop_assert!(generator.ensure_assigned(&mut prefs, date).is_none());
            prop_assert_eq!(generator.weather_for(&mut prefs, date), first);
            prop_assert_eq!(prefs.len(), snapshot.len());
        }

        #[test]
        fn prop_run_containment(seed in any::<u64>(), max_run in 1u32..=5) {
            let config = GeneratorConfig { max_run_length: max_run, weather_set: WeatherSet::Full };
            let mut generator = WeatherGenerator::with_seed(config, seed);
            let mut prefs = MemoryStore::new();
            let start = day(2024, 5, 1);

            let run = generator.ensure_assigned(&mut prefs, start).expect("fresh run");
            prop_assert!(run.length >= 1 && run.length <= max_run);
            prop_assert_eq!(run.written, run.length);
            for i in 0..run.length {
                let d = start.offset(i64::from(i)).expect("in range");
                prop_assert_eq!(generator.weather_for(&mut prefs, d), run.kind);
            }
        }

        #[test]
        fn prop_no_repeat_across_run_boundaries(seed in any::<u64>()) {
            let mut generator = WeatherGenerator::with_seed(GeneratorConfig::default(), seed);
            let mut prefs = MemoryStore::new();
            let mut date = day(2024, 1, 1);
            let mut previous: Option<WeatherKind> = None;

            for _ in 0..120 {
                let fresh = generator.ensure_assigned(&mut prefs, date);
                let kind = generator.weather_for(&mut prefs, date);
                if let (Some(run), Some(prev)) = (fresh, previous) {
                    prop_assert_eq!(run.kind, kind);
                    prop_assert_ne!(kind, prev);
                }
                previous = Some(kind);
                date = date.next().expect("in range");
            }
        }

        #[test]
        fn prop_write_once(seed in any::<u64>(), offsets in proptest::collection::vec(0i64..10, 1..20)) {
            let mut generator = WeatherGenerator::with_seed(GeneratorConfig::default(), seed);
            let mut prefs = MemoryStore::new();
            let base = day(2024, 6, 1);
            let mut seen = std::collections::HashMap::new();

            for p in offsets {
                let d = base.offset(p).expect("in range");
                let kind = generator.weather_for(&mut prefs, d);
                let first = *seen.entry(d).or_insert(kind);
                prop_assert_eq!(first, kind);
            }
            for (d, kind) in seen {
                prop_assert_eq!(generator.weather_for(&mut prefs, d), kind);
            }
        }
    }
}
