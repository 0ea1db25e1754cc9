//! Engine configuration.
//!
//! Provides scheduling, weather, farm and debug settings.
//! Configuration can be loaded from and saved to a TOML file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use weatherfarm_common::{FarmError, FarmResult};
use weatherfarm_gameplay::{
    EngineSettings, GeneratorConfig, WeatherSet, DEFAULT_MAX_RUN_LENGTH, DEFAULT_NORMAL_INTENSITY,
    DEFAULT_REFERENCE_ZONE, DEFAULT_STARTING_MONEY, DEFAULT_SUNNY_INTENSITY, DEFAULT_ZONE_ALIAS,
    MAX_RUN_LENGTH_LIMIT, MIN_RUN_LENGTH,
};

use crate::input::KeyBindings;
use crate::scheduler::ScheduleMode;

/// Configuration file name.
pub const CONFIG_FILE: &str = "weatherfarm.toml";

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "WEATHERFARM_CONFIG";

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Scheduling ===
    /// Advance at real midnight in the reference zone. When false, a preview
    /// tick rolls random weather every `seconds_per_day_for_testing`.
    pub use_real_time: bool,
    /// Preview tick interval in seconds
    pub seconds_per_day_for_testing: f32,
    /// Extra wait after midnight before re-reading the date
    pub midnight_buffer_secs: f32,
    /// IANA identifier of the reference timezone
    pub reference_timezone: String,
    /// Platform name tried when the IANA identifier is unavailable
    pub timezone_alias: String,

    // === Weather ===
    /// Upper bound for generated runs (1-5)
    pub max_run_length: u32,
    /// Kinds that can be rolled
    pub weather_set: WeatherSet,
    /// How long snow holds crop growth at zero, in seconds
    pub freeze_duration_secs: f32,
    /// Random seed (None = random)
    pub rng_seed: Option<u64>,
    /// Light intensity on sunny days
    pub sunny_light_intensity: f32,
    /// Light intensity on overcast days
    pub normal_light_intensity: f32,

    // === Farm ===
    /// Preference store file
    pub store_path: PathBuf,
    /// Number of plots on the farm
    pub plot_count: usize,
    /// Money before any save exists
    pub starting_money: i64,

    // === Debug ===
    /// Log at debug level
    pub debug_logs: bool,

    // === Input ===
    /// Action name to key(s), e.g. `QuickSave = "F5"` or `Quit = "Escape,q"`
    pub key_bindings: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Scheduling
            use_real_time: true,
            seconds_per_day_for_testing: 5.0,
            midnight_buffer_secs: 0.5,
            reference_timezone: DEFAULT_REFERENCE_ZONE.to_string(),
            timezone_alias: DEFAULT_ZONE_ALIAS.to_string(),

            // Weather
            max_run_length: DEFAULT_MAX_RUN_LENGTH,
            weather_set: WeatherSet::Full,
            freeze_duration_secs: 10.0,
            rng_seed: None,
            sunny_light_intensity: DEFAULT_SUNNY_INTENSITY,
            normal_light_intensity: DEFAULT_NORMAL_INTENSITY,

            // Farm
            store_path: PathBuf::from("weatherfarm_prefs.json"),
            plot_count: 6,
            starting_money: DEFAULT_STARTING_MONEY,

            // Debug
            debug_logs: false,

            // Input
            key_bindings: KeyBindings::default().export_to_map(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default file location.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str::<Self>(&contents) {
            Ok(mut config) => {
                config.validate();
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to the default file location.
    pub fn save(&self) -> FarmResult<()> {
        self.save_to(Self::config_path())
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> FarmResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| FarmError::Config(e.to_string()))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// `$WEATHERFARM_CONFIG`, or `weatherfarm.toml` in the working directory.
    #[must_use]
    pub fn config_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.max_run_length = self
            .max_run_length
            .clamp(MIN_RUN_LENGTH, MAX_RUN_LENGTH_LIMIT);
        self.seconds_per_day_for_testing = clamp_secs(self.seconds_per_day_for_testing, 0.1, 3600.0);
        self.midnight_buffer_secs = clamp_secs(self.midnight_buffer_secs, 0.0, 60.0);
        self.freeze_duration_secs = clamp_secs(self.freeze_duration_secs, 0.0, 3600.0);
        self.sunny_light_intensity = self.sunny_light_intensity.clamp(0.0, 8.0);
        self.normal_light_intensity = self.normal_light_intensity.clamp(0.0, 8.0);
        self.plot_count = self.plot_count.min(256);
    }

    /// Rejects settings that cannot be clamped into shape.
    pub fn check(&self) -> FarmResult<()> {
        if self.store_path.as_os_str().is_empty() {
            return Err(FarmError::Config("store_path must not be empty".to_string()));
        }
        if self.reference_timezone.trim().is_empty() {
            return Err(FarmError::Config(
                "reference_timezone must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Settings for the weather engine.
    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        let mut generator = GeneratorConfig {
            max_run_length: self.max_run_length,
            weather_set: self.weather_set,
        };
        generator.validate();
        EngineSettings {
            generator,
            freeze_duration: secs(self.freeze_duration_secs),
            sunny_light_intensity: self.sunny_light_intensity,
            normal_light_intensity: self.normal_light_intensity,
        }
    }

    /// How the scheduler decides when a day passes.
    #[must_use]
    pub fn schedule_mode(&self) -> ScheduleMode {
        if self.use_real_time {
            ScheduleMode::RealTime {
                midnight_buffer: secs(self.midnight_buffer_secs),
            }
        } else {
            ScheduleMode::Preview {
                interval: secs(self.seconds_per_day_for_testing),
            }
        }
    }

    /// Key bindings with config overrides applied.
    #[must_use]
    pub fn key_bindings(&self) -> KeyBindings {
        KeyBindings::from_map(&self.key_bindings)
    }

    /// Default log directive for this config.
    #[must_use]
    pub fn log_directive(&self) -> &'static str {
        if self.debug_logs {
            "weatherfarm=debug"
        } else {
            "weatherfarm=info"
        }
    }
}

/// NaN-safe clamp for second counts.
fn clamp_secs(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Longest wait any setting can ask for.
const MAX_WAIT_SECS: f32 = 86_400.0;

fn secs(value: f32) -> Duration {
    Duration::from_secs_f32(clamp_secs(value, 0.0, MAX_WAIT_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::FarmAction;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.use_real_time);
        assert_eq!(config.max_run_length, 3);
        assert_eq!(config.reference_timezone, "Europe/London");
        assert_eq!(config.timezone_alias, "GMT Standard Time");
        assert!((config.freeze_duration_secs - 10.0).abs() < f32::EPSILON);
        assert_eq!(config.starting_money, 100);
        assert_eq!(config.log_directive(), "weatherfarm=info");
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig {
            max_run_length: 12,
            seconds_per_day_for_testing: 0.0,
            freeze_duration_secs: f32::NAN,
            ..EngineConfig::default()
        };
        config.validate();
        assert_eq!(config.max_run_length, 5);
        assert!((config.seconds_per_day_for_testing - 0.1).abs() < 1e-6);
        assert!(config.freeze_duration_secs.abs() < f32::EPSILON);

        config.max_run_length = 0;
        config.validate();
        assert_eq!(config.max_run_length, 1);
    }

    #[test]
    fn test_check_rejects_empty_paths() {
        let config = EngineConfig {
            store_path: PathBuf::new(),
            ..EngineConfig::default()
        };
        assert!(matches!(config.check(), Err(FarmError::Config(_))));
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("weatherfarm.toml");

        let mut config = EngineConfig::default();
        config.use_real_time = false;
        config.weather_set = WeatherSet::Breezy;
        config.rng_seed = Some(12345);
        config
            .key_bindings
            .insert("ForceAdvance".to_string(), "n".to_string());

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = EngineConfig::load_from(&config_path);
        assert_eq!(loaded, config);
        assert_eq!(
            loaded.key_bindings().action_for_key("n"),
            Some(FarmAction::ForceAdvance)
        );
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("weatherfarm.toml");
        fs::write(&config_path, "max_run_length = 9\nweather_set = \"basic\"\n").expect("write");

        let loaded = EngineConfig::load_from(&config_path);
        assert_eq!(loaded.max_run_length, 5);
        assert_eq!(loaded.weather_set, WeatherSet::Basic);
        assert_eq!(loaded.plot_count, 6);
    }

    #[test]
    fn test_config_load_missing_or_invalid_file() {
        let config = EngineConfig::load_from("/nonexistent/path/weatherfarm.toml");
        assert_eq!(config, EngineConfig::default());

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("weatherfarm.toml");
        fs::write(&config_path, "use_real_time = \"sometimes\"").expect("write");
        assert_eq!(EngineConfig::load_from(&config_path), EngineConfig::default());
    }

    #[test]
    fn test_engine_settings_and_mode() {
        let mut config = EngineConfig::default();
        config.freeze_duration_secs = 2.5;
        let settings = config.engine_settings();
        assert_eq!(settings.freeze_duration, Duration::from_millis(2500));
        assert_eq!(settings.generator.max_run_length, 3);

        assert_eq!(
            config.schedule_mode(),
            ScheduleMode::RealTime {
                midnight_buffer: Duration::from_millis(500)
            }
        );
        config.use_real_time = false;
        assert_eq!(
            config.schedule_mode(),
            ScheduleMode::Preview {
                interval: Duration::from_secs(5)
            }
        );

        config.debug_logs = true;
        assert_eq!(config.log_directive(), "weatherfarm=debug");
    }

    #[test]
    fn test_config_toml_serialization() {
        let config = EngineConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("Failed to serialize");
        assert!(toml_str.contains("max_run_length"));
        assert!(toml_str.contains("weather_set = \"full\""));
        assert!(toml_str.contains("[key_bindings]"));
    }
}
