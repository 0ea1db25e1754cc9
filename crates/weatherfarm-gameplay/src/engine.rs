//! The weather engine.
//!
//! `WeatherEngine` owns the session's `CurrentState`, the preference store,
//! the generator and the effect table. It is driven from one place (the
//! scheduler task), and plots and presentation are handed in per call.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use weatherfarm_common::{PlotId, StoreResult};

use crate::clock::Clock;
use crate::date_key::DateKey;
use crate::effects::{
    present, EffectTable, ParticleChannel, PresentationSink, PresentationState, BASE_SPEED,
    DEFAULT_NORMAL_INTENSITY, DEFAULT_SUNNY_INTENSITY,
};
use crate::farm::{Farm, PlotRegistry};
use crate::generator::{GeneratorConfig, Run, WeatherGenerator};
use crate::plants::PlantCatalog;
use crate::save::SaveBridge;
use crate::store::{PrefStore, WeatherStore};
use crate::weather::WeatherKind;

/// Default length of the snow freeze window.
pub const DEFAULT_FREEZE_DURATION: Duration = Duration::from_secs(10);

/// `clear_all_stored` reaches this many days before today and one fewer
/// after it (offsets `-60..60`, 120 keys).
pub const CLEAR_WINDOW_DAYS: i64 = 60;

/// Engine tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Generator settings.
    pub generator: GeneratorConfig,
    /// How long snow holds growth at zero.
    pub freeze_duration: Duration,
    /// Light intensity on sunny days.
    pub sunny_light_intensity: f32,
    /// Light intensity on overcast days.
    pub normal_light_intensity: f32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            freeze_duration: DEFAULT_FREEZE_DURATION,
            sunny_light_intensity: DEFAULT_SUNNY_INTENSITY,
            normal_light_intensity: DEFAULT_NORMAL_INTENSITY,
        }
    }
}

/// Session state of the weather engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentState {
    /// The day the engine considers today.
    pub current_date: DateKey,
    /// Weather in effect.
    pub current_weather: WeatherKind,
    /// True only while a snow freeze window is open.
    pub is_freezing: bool,
}

/// What one weather application did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Application {
    /// Day applied.
    pub date: DateKey,
    /// Kind applied.
    pub kind: WeatherKind,
    /// Run generated on the way, if any.
    pub generated: Option<Run>,
    /// Number of plots updated.
    pub plots_affected: usize,
    /// Whether this application opened a freeze window. The caller must
    /// schedule exactly one `end_freeze` after `freeze_duration`.
    pub freeze_started: bool,
}

/// The weather engine.
pub struct WeatherEngine {
    prefs: Box<dyn PrefStore>,
    clock: Arc<dyn Clock>,
    generator: WeatherGenerator,
    effects: EffectTable,
    freeze_duration: Duration,
    state: CurrentState,
    active_particles: Option<ParticleChannel>,
}

impl std::fmt::Debug for WeatherEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherEngine")
            .field("state", &self.state)
            .field("generator", &self.generator)
            .field("freeze_duration", &self.freeze_duration)
            .finish_non_exhaustive()
    }
}

impl WeatherEngine {
    /// Builds an engine. `current_date` starts at the clock's today with
    /// Sunny weather until `start` runs.
    pub fn new(
        settings: EngineSettings,
        prefs: Box<dyn PrefStore>,
        clock: Arc<dyn Clock>,
        generator: WeatherGenerator,
    ) -> Self {
        let today = clock.today();
        Self {
            prefs,
            clock,
            generator,
            effects: EffectTable::with_intensities(
                settings.sunny_light_intensity,
                settings.normal_light_intensity,
            ),
            freeze_duration: settings.freeze_duration,
            state: CurrentState {
                current_date: today,
                current_weather: WeatherKind::Sunny,
                is_freezing: false,
            },
            active_particles: None,
        }
    }

    /// Builds an engine whose generator uses `settings.generator` and an
    /// optional fixed seed.
    pub fn with_seed(
        settings: EngineSettings,
        prefs: Box<dyn PrefStore>,
        clock: Arc<dyn Clock>,
        seed: Option<u64>,
    ) -> Self {
        let generator = match seed {
            Some(seed) => WeatherGenerator::with_seed(settings.generator, seed),
            None => WeatherGenerator::new(settings.generator),
        };
        Self::new(settings, prefs, clock, generator)
    }

    /// Session state.
    #[must_use]
    pub fn state(&self) -> CurrentState {
        self.state
    }

    /// The effect table.
    #[must_use]
    pub fn effects(&self) -> &EffectTable {
        &self.effects
    }

    /// The freeze window length.
    #[must_use]
    pub fn freeze_duration(&self) -> Duration {
        self.freeze_duration
    }

    /// The clock.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// The particle channel currently running, if any.
    #[must_use]
    pub fn active_particles(&self) -> Option<ParticleChannel> {
        self.active_particles
    }

    /// Direct access to the preference store.
    pub fn prefs_mut(&mut self) -> &mut dyn PrefStore {
        self.prefs.as_mut()
    }

    /// Weather for any day, generating it if needed.
    pub fn weather_for(&mut self, date: DateKey) -> WeatherKind {
        self.generator.weather_for(self.prefs.as_mut(), date)
    }

    /// Session start: today's weather is ensured and applied.
    pub fn start(&mut self, plots: &mut dyn PlotRegistry, sink: &mut dyn PresentationSink) -> Application {
        let today = self.clock.today();
        info!("Weather engine starting on {today}");
        self.apply_weather(today, plots, sink)
    }

    /// Real-time step after midnight: re-reads today from the clock.
    pub fn advance_to_today(
        &mut self,
        plots: &mut dyn PlotRegistry,
        sink: &mut dyn PresentationSink,
    ) -> Application {
        let today = self.clock.today();
        self.apply_weather(today, plots, sink)
    }

    /// Manual step: moves one day past the current date.
    pub fn force_advance(
        &mut self,
        plots: &mut dyn PlotRegistry,
        sink: &mut dyn PresentationSink,
    ) -> Application {
        let next = self.state.current_date.next().unwrap_or_else(|| {
            warn!("Calendar exhausted, staying on {}", self.state.current_date);
            self.state.current_date
        });
        self.apply_weather(next, plots, sink)
    }

    /// Test-mode preview tick: a uniformly random kind for the unchanged
    /// date, bypassing runs and the no-repeat rule.
    pub fn preview_tick(
        &mut self,
        plots: &mut dyn PlotRegistry,
        sink: &mut dyn PresentationSink,
    ) -> Application {
        let kind = self.generator.roll_any();
        debug!("Preview tick rolled {kind}");
        self.apply_kind(kind, plots, sink)
    }

    /// Ensures and applies the stored weather for `date`.
    pub fn apply_weather(
        &mut self,
        date: DateKey,
        plots: &mut dyn PlotRegistry,
        sink: &mut dyn PresentationSink,
    ) -> Application {
        let generated = self.generator.ensure_assigned(self.prefs.as_mut(), date);
        if let Some(run) = generated {
            info!(
                "Generated {} run of {} day(s) from {} ({} written)",
                run.kind, run.length, run.start, run.written
            );
        }
        self.state.current_date = date;
        self.state.current_weather = self.generator.weather_for(self.prefs.as_mut(), date);
        let mut application = self.apply_current(plots, sink);
        application.generated = generated;
        application
    }

    /// Applies `kind` to the current date without consulting the store.
    pub fn apply_kind(
        &mut self,
        kind: WeatherKind,
        plots: &mut dyn PlotRegistry,
        sink: &mut dyn PresentationSink,
    ) -> Application {
        self.state.current_weather = kind;
        self.apply_current(plots, sink)
    }

    fn apply_current(
        &mut self,
        plots: &mut dyn PlotRegistry,
        sink: &mut dyn PresentationSink,
    ) -> Application {
        let CurrentState {
            current_date: date,
            current_weather: kind,
            ..
        } = self.state;
        let effect = *self.effects.get(kind);

        present(sink, &mut self.active_particles, &effect.presentation);

        let mut plots_affected = 0;
        for id in plots.plot_ids() {
            if let Some(modifier) = plots.modifier_mut(&id) {
                effect.plot_rule.apply(modifier, self.generator.dice());
                plots_affected += 1;
            }
        }
        debug!("Effects applied to {plots_affected} plots for {kind}");

        let mut freeze_started = false;
        if effect.plot_rule.freezes() {
            if self.state.is_freezing {
                debug!("Freeze already in progress, not starting another");
            } else {
                self.state.is_freezing = true;
                freeze_started = true;
                info!("Crops frozen for {:?}", self.freeze_duration);
            }
        }

        sink.set_day_label(&day_label(date, kind));
        info!("Applied {kind} to {date}");

        Application {
            date,
            kind,
            generated: None,
            plots_affected,
            freeze_started,
        }
    }

    /// Closes the freeze window: every plot still present goes back to base
    /// speed. Returns how many plots were reset.
    pub fn end_freeze(&mut self, plots: &mut dyn PlotRegistry) -> usize {
        let ids: Vec<PlotId> = plots.plot_ids();
        let mut reset = 0;
        for id in &ids {
            match plots.modifier_mut(id) {
                Some(modifier) => {
                    modifier.speed_multiplier = BASE_SPEED;
                    reset += 1;
                },
                None => debug!("Plot {id} vanished during freeze, skipping"),
            }
        }
        self.state.is_freezing = false;
        info!("Crops unfrozen ({reset} plots)");
        reset
    }

    /// Deletes stored weather from 60 days before today to 59 days after.
    ///
    /// The store cannot enumerate keys, so only this window is touched.
    /// Returns how many entries were removed.
    pub fn clear_all_stored(&mut self) -> usize {
        let today = self.clock.today();
        let mut store = WeatherStore::new(self.prefs.as_mut());
        let mut removed = 0;
        for offset in -CLEAR_WINDOW_DAYS..CLEAR_WINDOW_DAYS {
            let Some(day) = today.offset(offset) else {
                continue;
            };
            if store.has(day) {
                store.delete(day);
                removed += 1;
            }
        }
        if let Err(e) = store.flush() {
            warn!("Failed to flush cleared weather: {e}");
        }
        info!("Cleared {removed} stored weather entries");
        removed
    }

    /// Writes money, plots and the current weather to the store.
    pub fn save_game(&mut self, farm: &Farm) -> StoreResult<()> {
        SaveBridge::save(self.prefs.as_mut(), farm, self.state.current_weather)?;
        info!("Game saved");
        Ok(())
    }

    /// Restores money, plots and the saved weather, then re-derives
    /// presentation from the restored kind.
    pub fn load_game(
        &mut self,
        farm: &mut Farm,
        catalog: &PlantCatalog,
        sink: &mut dyn PresentationSink,
    ) -> WeatherKind {
        let kind = SaveBridge::load(self.prefs.as_ref(), farm, catalog);
        self.state.current_weather = kind;
        let presentation = self.effects.presentation(kind);
        present(sink, &mut self.active_particles, &presentation);
        sink.set_day_label(&day_label(self.state.current_date, kind));
        info!("Game loaded ({kind})");
        kind
    }

    /// Presentation for the current weather.
    #[must_use]
    pub fn current_presentation(&self) -> PresentationState {
        self.effects.presentation(self.state.current_weather)
    }
}

/// Day label text, e.g. `Wed - Rainy`.
#[must_use]
pub fn day_label(date: DateKey, kind: WeatherKind) -> String {
    format!("{} - {kind}", date.weekday_abbrev())
}
