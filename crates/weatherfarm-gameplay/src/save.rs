//! Save/Load bridge.
//!
//! Money, per-plot fields and the current weather are stored as flat keys in
//! the preference store:
//!
//! | Key | Value |
//! |---|---|
//! | `PlayerMoney` | int |
//! | `<plot>_Stage` | int |
//! | `<plot>_Timer` | float |
//! | `<plot>_IsPlanted` / `_IsDry` / `_IsBought` | 0 or 1 |
//! | `<plot>_PlantName` | string, empty when nothing is planted |
//! | `CurrentWeather` | weather name |

use tracing::{debug, warn};
use weatherfarm_common::StoreResult;

use crate::farm::{Farm, DEFAULT_STARTING_MONEY};
use crate::plants::PlantCatalog;
use crate::store::PrefStore;
use crate::weather::WeatherKind;

/// Key for the player's money.
pub const MONEY_KEY: &str = "PlayerMoney";

/// Key for the weather in effect when the game was saved.
pub const CURRENT_WEATHER_KEY: &str = "CurrentWeather";

const STAGE: &str = "Stage";
const TIMER: &str = "Timer";
const IS_PLANTED: &str = "IsPlanted";
const IS_DRY: &str = "IsDry";
const IS_BOUGHT: &str = "IsBought";
const PLANT_NAME: &str = "PlantName";

/// Reads and writes game state through a `PrefStore`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveBridge;

impl SaveBridge {
    /// Writes every field from live state, then flushes.
    pub fn save(prefs: &mut dyn PrefStore, farm: &Farm, weather: WeatherKind) -> StoreResult<()> {
        prefs.set_int(MONEY_KEY, farm.money);

        for acre in farm.acres() {
            let id = &acre.id;
            prefs.set_int(&id.field_key(STAGE), acre.plant_stage);
            prefs.set_float(&id.field_key(TIMER), f64::from(acre.timer));
            prefs.set_int(&id.field_key(IS_PLANTED), i64::from(acre.is_planted));
            prefs.set_int(&id.field_key(IS_DRY), i64::from(acre.is_dry()));
            prefs.set_int(&id.field_key(IS_BOUGHT), i64::from(acre.is_bought));
            let plant_name = acre
                .selected_plant
                .as_ref()
                .map_or("", |p| p.plant_name.as_str());
            prefs.set_string(&id.field_key(PLANT_NAME), plant_name);
        }

        prefs.set_string(CURRENT_WEATHER_KEY, weather.display_name());
        prefs.flush()?;
        debug!("Saved {} plots, weather {weather}", farm.len());
        Ok(())
    }

    /// Restores money and every plot currently on the farm, and returns the
    /// saved weather (Sunny if missing or unreadable).
    ///
    /// Unknown plant names leave the plot's plant unset. Loading twice
    /// without saving in between gives the same result.
    pub fn load(prefs: &dyn PrefStore, farm: &mut Farm, catalog: &PlantCatalog) -> WeatherKind {
        farm.money = prefs.get_int(MONEY_KEY, DEFAULT_STARTING_MONEY);

        for acre in farm.acres_mut() {
            let id = acre.id.clone();
            acre.plant_stage = prefs.get_int(&id.field_key(STAGE), 0);
            acre.timer = prefs.get_float(&id.field_key(TIMER), 0.0) as f32;
            acre.is_planted = prefs.get_int(&id.field_key(IS_PLANTED), 0) == 1;
            acre.modifier.is_dry = prefs.get_int(&id.field_key(IS_DRY), 1) == 1;
            acre.is_bought = prefs.get_int(&id.field_key(IS_BOUGHT), 1) == 1;

            let plant_name = prefs.get_string(&id.field_key(PLANT_NAME), "");
            acre.selected_plant = None;
            if !plant_name.is_empty() {
                match catalog.find(&plant_name) {
                    Some(plant) => acre.selected_plant = Some(plant.clone()),
                    None => warn!("Plot {id}: unknown plant {plant_name:?}, leaving unset"),
                }
            }
        }

        let raw = prefs.get_string(CURRENT_WEATHER_KEY, WeatherKind::Sunny.display_name());
        match raw.parse() {
            Ok(kind) => kind,
            Err(e) => {
                warn!("{e}, defaulting to Sunny");
                WeatherKind::Sunny
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::farm::Acre;
    use crate::store::MemoryStore;
    use weatherfarm_common::PlotId;

    fn planted_farm(catalog: &PlantCatalog) -> Farm {
        let mut farm = Farm::with_acres(340, 3);
        let acre = farm.acre_mut(&PlotId::acre(1)).expect("acre");
        acre.plant(catalog.find("Wheat").expect("wheat").clone());
        acre.plant_stage = 2;
        acre.timer = 4.25;
        acre.water();
        let acre = farm.acre_mut(&PlotId::acre(3)).expect("acre");
        acre.is_bought = false;
        farm
    }

    #[test]
    fn test_save_writes_flat_keys() {
        let catalog = PlantCatalog::default_crops();
        let farm = planted_farm(&catalog);
        let mut prefs = MemoryStore::new();

        SaveBridge::save(&mut prefs, &farm, WeatherKind::Snowy).expect("save");
        assert_eq!(prefs.get_int("PlayerMoney", 0), 340);
        assert_eq!(prefs.get_int("Acre_1_Stage", 0), 2);
        assert_eq!(prefs.get_int("Acre_1_IsPlanted", 0), 1);
        assert_eq!(prefs.get_int("Acre_1_IsDry", 1), 0);
        assert_eq!(prefs.get_string("Acre_1_PlantName", ""), "Wheat");
        assert_eq!(prefs.get_string("Acre_2_PlantName", "x"), "");
        assert_eq!(prefs.get_int("Acre_3_IsBought", 1), 0);
        assert_eq!(prefs.get_string("CurrentWeather", ""), "Snowy");
        assert_eq!(prefs.flush_count(), 1);
    }

    #[test]
    fn test_round_trip() {
        let catalog = PlantCatalog::default_crops();
        let saved = planted_farm(&catalog);
        let mut prefs = MemoryStore::new();
        SaveBridge::save(&mut prefs, &saved, WeatherKind::Windy).expect("save");

        let mut loaded = Farm::with_acres(0, 3);
        let kind = SaveBridge::load(&prefs, &mut loaded, &catalog);
        assert_eq!(kind, WeatherKind::Windy);
        assert_eq!(loaded, saved);

        // Loading again gives the same state.
        let again = SaveBridge::load(&prefs, &mut loaded, &catalog);
        assert_eq!(again, kind);
        assert_eq!(loaded, saved);
    }

    #[test]
    fn test_load_clears_plant_planted_after_save() {
        let catalog = PlantCatalog::default_crops();
        let saved = planted_farm(&catalog);
        let mut prefs = MemoryStore::new();
        SaveBridge::save(&mut prefs, &saved, WeatherKind::Sunny).expect("save");

        let mut farm = saved.clone();
        let acre = farm.acre_mut(&PlotId::acre(2)).expect("acre");
        acre.plant(catalog.find("Pumpkin").expect("pumpkin").clone());
        farm.money = 7;

        SaveBridge::load(&prefs, &mut farm, &catalog);
        assert!(farm.acre(&PlotId::acre(2)).expect("acre").selected_plant.is_none());
        assert_eq!(farm, saved);
    }

    #[test]
    fn test_load_defaults_on_empty_store() {
        let prefs = MemoryStore::new();
        let mut farm = Farm::with_acres(999, 1);
        let acre = farm.acre_mut(&PlotId::acre(1)).expect("acre");
        acre.water();
        acre.is_bought = false;
        acre.plant_stage = 3;

        let kind = SaveBridge::load(&prefs, &mut farm, &PlantCatalog::default_crops());
        assert_eq!(kind, WeatherKind::Sunny);
        assert_eq!(farm.money, 100);
        let acre = farm.acre(&PlotId::acre(1)).expect("acre");
        assert!(acre.is_dry());
        assert!(acre.is_bought);
        assert!(!acre.is_planted);
        assert_eq!(acre.plant_stage, 0);
        assert!(acre.timer.abs() < f32::EPSILON);
    }

    #[test]
    fn test_unknown_plant_left_unset() {
        let mut prefs = MemoryStore::new();
        prefs.set_string("Acre_1_PlantName", "Mandrake");
        prefs.set_int("Acre_1_IsPlanted", 1);

        let catalog = PlantCatalog::default_crops();
        let mut farm = Farm::new(0);
        let mut acre = Acre::new(PlotId::acre(1));
        acre.plant(catalog.find("Wheat").expect("wheat").clone());
        farm.add_acre(acre);
        SaveBridge::load(&prefs, &mut farm, &catalog);

        let acre = farm.acre(&PlotId::acre(1)).expect("acre");
        assert!(acre.is_planted);
        assert!(acre.selected_plant.is_none());
    }

    #[test]
    fn test_bad_weather_falls_back_to_sunny() {
        let mut prefs = MemoryStore::new();
        prefs.set_string("CurrentWeather", "Sleet");
        let kind = SaveBridge::load(&prefs, &mut Farm::new(0), &PlantCatalog::new());
        assert_eq!(kind, WeatherKind::Sunny);
    }
}
