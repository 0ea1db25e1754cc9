//! Farmland plots as seen by the weather engine.
//!
//! Plots own their growth; the engine only writes the `PlotModifier` pair.
//! `PlotRegistry` is how the engine discovers plots on every application,
//! so plots may come and go between calls.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use weatherfarm_common::PlotId;

use crate::effects::BASE_SPEED;
use crate::plants::PlantDefinition;

/// Default starting money for a new farm.
pub const DEFAULT_STARTING_MONEY: i64 = 100;

/// Weather-driven fields of a plot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotModifier {
    /// Whether the soil is dry.
    pub is_dry: bool,
    /// Growth speed multiplier (1.0 = normal).
    pub speed_multiplier: f32,
}

impl Default for PlotModifier {
    fn default() -> Self {
        Self::new(true)
    }
}

impl PlotModifier {
    /// A modifier at base speed.
    #[must_use]
    pub const fn new(is_dry: bool) -> Self {
        Self {
            is_dry,
            speed_multiplier: BASE_SPEED,
        }
    }
}

/// Enumerates plots and hands out their modifiers.
pub trait PlotRegistry {
    /// Ids of every plot that currently exists.
    fn plot_ids(&self) -> Vec<PlotId>;

    /// Modifier of a plot, or `None` if it no longer exists.
    fn modifier_mut(&mut self, id: &PlotId) -> Option<&mut PlotModifier>;
}

/// One farmland plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acre {
    /// Plot id (also the save-key prefix).
    pub id: PlotId,
    /// Current growth stage index.
    pub plant_stage: i64,
    /// Time spent in the current stage.
    pub timer: f32,
    /// Whether something is planted.
    pub is_planted: bool,
    /// Whether the player owns this plot.
    pub is_bought: bool,
    /// The planted crop, if any.
    pub selected_plant: Option<PlantDefinition>,
    /// Weather-driven fields.
    pub modifier: PlotModifier,
}

impl Acre {
    /// A bought, empty, dry acre.
    #[must_use]
    pub fn new(id: PlotId) -> Self {
        Self {
            id,
            plant_stage: 0,
            timer: 0.0,
            is_planted: false,
            is_bought: true,
            selected_plant: None,
            modifier: PlotModifier::default(),
        }
    }

    /// Whether the soil is dry.
    #[must_use]
    pub fn is_dry(&self) -> bool {
        self.modifier.is_dry
    }

    /// Plants a crop from scratch.
    pub fn plant(&mut self, plant: PlantDefinition) {
        self.selected_plant = Some(plant);
        self.is_planted = true;
        self.plant_stage = 0;
        self.timer = 0.0;
    }

    /// Waters the soil.
    pub fn water(&mut self) {
        self.modifier.is_dry = false;
    }
}

/// The player's farm: money and plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farm {
    /// Player money.
    pub money: i64,
    acres: BTreeMap<PlotId, Acre>,
}

impl Default for Farm {
    fn default() -> Self {
        Self::new(DEFAULT_STARTING_MONEY)
    }
}

impl Farm {
    /// An empty farm.
    #[must_use]
    pub fn new(money: i64) -> Self {
        Self {
            money,
            acres: BTreeMap::new(),
        }
    }

    /// A farm with `count` default acres named `Acre_1..=Acre_count`.
    #[must_use]
    pub fn with_acres(money: i64, count: usize) -> Self {
        let mut farm = Self::new(money);
        for i in 1..=count {
            farm.add_acre(Acre::new(PlotId::acre(i)));
        }
        farm
    }

    /// Adds or replaces an acre.
    pub fn add_acre(&mut self, acre: Acre) {
        self.acres.insert(acre.id.clone(), acre);
    }

    /// Removes an acre.
    pub fn remove_acre(&mut self, id: &PlotId) -> Option<Acre> {
        self.acres.remove(id)
    }

    /// Looks up an acre.
    #[must_use]
    pub fn acre(&self, id: &PlotId) -> Option<&Acre> {
        self.acres.get(id)
    }

    /// Looks up an acre mutably.
    pub fn acre_mut(&mut self, id: &PlotId) -> Option<&mut Acre> {
        self.acres.get_mut(id)
    }

    /// All acres in id order.
    pub fn acres(&self) -> impl Iterator<Item = &Acre> {
        self.acres.values()
    }

    /// All acres in id order, mutably.
    pub fn acres_mut(&mut self) -> impl Iterator<Item = &mut Acre> {
        self.acres.values_mut()
    }

    /// Number of acres.
    #[must_use]
    pub fn len(&self) -> usize {
        self.acres.len()
    }

    /// Whether the farm has no acres.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.acres.is_empty()
    }
}

impl PlotRegistry for Farm {
    fn plot_ids(&self) -> Vec<PlotId> {
        self.acres.keys().cloned().collect()
    }

    fn modifier_mut(&mut self, id: &PlotId) -> Option<&mut PlotModifier> {
        self.acres.get_mut(id).map(|acre| &mut acre.modifier)
    }
}
