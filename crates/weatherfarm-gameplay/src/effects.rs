//! Weather effect table.
//!
//! Each weather kind maps to one `WeatherEffect` row: what the presentation
//! layer shows and how farmland plots react. Adding a kind means adding a
//! row here, nothing else.

use serde::{Deserialize, Serialize};

use crate::farm::PlotModifier;
use crate::weather::{WeatherDice, WeatherKind};

/// Plot speed with no weather applied.
pub const BASE_SPEED: f32 = 1.0;

/// Default light intensity on sunny days.
pub const DEFAULT_SUNNY_INTENSITY: f32 = 1.2;

/// Default light intensity on overcast days.
pub const DEFAULT_NORMAL_INTENSITY: f32 = 0.6;

/// Icon shown for the day's weather.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherIcon {
    /// Sun icon.
    Sun,
    /// Rain cloud icon.
    RainCloud,
    /// Wind icon.
    Wind,
    /// Snowflake icon.
    Snowflake,
}

/// Particle emitter channels. At most one plays at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleChannel {
    /// Falling rain.
    Rain,
    /// Blowing leaves.
    Leaves,
    /// Falling snow.
    Snow,
}

impl ParticleChannel {
    /// Display name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Rain => "Rain",
            Self::Leaves => "Leaves",
            Self::Snow => "Snow",
        }
    }
}

/// Linear RGB light colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightColor {
    /// Red (0.0 - 1.0).
    pub r: f32,
    /// Green (0.0 - 1.0).
    pub g: f32,
    /// Blue (0.0 - 1.0).
    pub b: f32,
}

impl LightColor {
    /// Creates a colour.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

/// Everything the presentation layer needs for one weather kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresentationState {
    /// Weather icon.
    pub icon: WeatherIcon,
    /// Sun light intensity.
    pub light_intensity: f32,
    /// Sun light colour.
    pub light_color: LightColor,
    /// Particle emitter to run, if any.
    pub particles: Option<ParticleChannel>,
}

/// How a weather kind changes a plot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlotRule {
    /// Moisture is left alone; speed depends on it.
    KeepMoisture {
        /// Speed for watered plots.
        watered_speed: f32,
        /// Speed for dry plots.
        dry_speed: f32,
    },
    /// Every plot is watered.
    Water {
        /// Resulting speed.
        speed: f32,
    },
    /// Each plot independently may dry out.
    MaybeDry {
        /// Probability a plot ends up dry.
        dry_chance: f32,
        /// Resulting speed.
        speed: f32,
    },
    /// Plots dry out and stop growing until the freeze ends.
    Freeze,
}

impl PlotRule {
    /// Applies this rule to one plot's modifier.
    pub fn apply(self, modifier: &mut PlotModifier, dice: &mut dyn WeatherDice) {
        match self {
            Self::KeepMoisture {
                watered_speed,
                dry_speed,
            } => {
                modifier.speed_multiplier = if modifier.is_dry {
                    BASE_SPEED * dry_speed
                } else {
                    BASE_SPEED * watered_speed
                };
            },
            Self::Water { speed } => {
                modifier.is_dry = false;
                modifier.speed_multiplier = BASE_SPEED * speed;
            },
            Self::MaybeDry { dry_chance, speed } => {
                modifier.is_dry = dice.chance(dry_chance);
                modifier.speed_multiplier = BASE_SPEED * speed;
            },
            Self::Freeze => {
                modifier.is_dry = true;
                modifier.speed_multiplier = 0.0;
            },
        }
    }

    /// Whether applying this rule starts a freeze window.
    #[must_use]
    pub fn freezes(self) -> bool {
        matches!(self, Self::Freeze)
    }
}

/// One row of the effect table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherEffect {
    /// What the presentation layer shows.
    pub presentation: PresentationState,
    /// What happens to plots.
    pub plot_rule: PlotRule,
}

/// Kind-indexed effect rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectTable {
    rows: [WeatherEffect; 4],
}

impl Default for EffectTable {
    fn default() -> Self {
        Self::with_intensities(DEFAULT_SUNNY_INTENSITY, DEFAULT_NORMAL_INTENSITY)
    }
}

impl EffectTable {
    /// Builds the table with custom sunny and overcast light intensities.
    #[must_use]
    pub fn with_intensities(sunny: f32, normal: f32) -> Self {
        Self {
            rows: [
                // Sunny
                WeatherEffect {
                    presentation: PresentationState {
                        icon: WeatherIcon::Sun,
                        light_intensity: sunny,
                        light_color: LightColor::new(1.0, 0.96, 0.84),
                        particles: None,
                    },
                    plot_rule: PlotRule::KeepMoisture {
                        watered_speed: 1.2,
                        dry_speed: 0.6,
                    },
                },
                // Rainy
                WeatherEffect {
                    presentation: PresentationState {
                        icon: WeatherIcon::RainCloud,
                        light_intensity: normal,
                        light_color: LightColor::new(0.72, 0.78, 0.88),
                        particles: Some(ParticleChannel::Rain),
                    },
                    plot_rule: PlotRule::Water { speed: 1.5 },
                },
                // Windy
                WeatherEffect {
                    presentation: PresentationState {
                        icon: WeatherIcon::Wind,
                        light_intensity: (sunny + normal) / 2.0,
                        light_color: LightColor::new(0.95, 0.95, 0.9),
                        particles: Some(ParticleChannel::Leaves),
                    },
                    plot_rule: PlotRule::MaybeDry {
                        dry_chance: 0.3,
                        speed: 0.8,
                    },
                },
                // Snowy
                WeatherEffect {
                    presentation: PresentationState {
                        icon: WeatherIcon::Snowflake,
                        light_intensity: normal,
                        light_color: LightColor::new(0.85, 0.9, 1.0),
                        particles: Some(ParticleChannel::Snow),
                    },
                    plot_rule: PlotRule::Freeze,
                },
            ],
        }
    }

    /// The row for `kind`.
    #[must_use]
    pub fn get(&self, kind: WeatherKind) -> &WeatherEffect {
        let idx = match kind {
            WeatherKind::Sunny => 0,
            WeatherKind::Rainy => 1,
            WeatherKind::Windy => 2,
            WeatherKind::Snowy => 3,
        };
        &self.rows[idx]
    }

    /// Presentation for `kind`.
    #[must_use]
    pub fn presentation(&self, kind: WeatherKind) -> PresentationState {
        self.get(kind).presentation
    }
}

/// Receives presentation updates.
///
/// Every method defaults to a no-op so a missing channel is simply skipped.
pub trait PresentationSink: Send {
    /// Show the weather icon.
    fn set_icon(&mut self, _icon: WeatherIcon) {}

    /// Set the sun light.
    fn set_light(&mut self, _intensity: f32, _color: LightColor) {}

    /// Start a particle emitter.
    fn start_particles(&mut self, _channel: ParticleChannel) {}

    /// Stop a particle emitter.
    fn stop_particles(&mut self, _channel: ParticleChannel) {}

    /// Update the day label text.
    fn set_day_label(&mut self, _text: &str) {}
}

/// A sink with no channels attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresentation;

impl PresentationSink for NullPresentation {}

/// Pushes `state` to `sink`, keeping at most one particle channel running.
///
/// `active` tracks the running channel and is updated in place.
pub fn present(
    sink: &mut dyn PresentationSink,
    active: &mut Option<ParticleChannel>,
    state: &PresentationState,
) {
    sink.set_icon(state.icon);
    sink.set_light(state.light_intensity, state.light_color);

    if let Some(running) = *active {
        if state.particles != Some(running) {
            sink.stop_particles(running);
            *active = None;
        }
    }
    if let Some(wanted) = state.particles {
        if active.is_none() {
            sink.start_particles(wanted);
            *active = Some(wanted);
        }
    }
}
