//! Crop definitions and the catalog saves resolve them from.
//!
//! Saves store a crop by name only; loading looks the name up here.

use serde::{Deserialize, Serialize};

/// Definition of a crop type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantDefinition {
    /// Display name, also the persisted identifier.
    pub plant_name: String,
    /// Number of visual growth stages.
    pub stage_count: u32,
    /// Seconds spent in each stage at base speed.
    pub seconds_per_stage: f32,
    /// Price of the seed.
    pub seed_price: i64,
    /// Price paid on harvest.
    pub sell_price: i64,
}

impl PlantDefinition {
    /// Create a new plant definition builder.
    #[must_use]
    pub fn builder(name: &str) -> PlantDefinitionBuilder {
        PlantDefinitionBuilder::new(name)
    }
}

/// Builder for plant definitions.
#[derive(Debug)]
pub struct PlantDefinitionBuilder {
    def: PlantDefinition,
}

impl PlantDefinitionBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            def: PlantDefinition {
                plant_name: name.to_string(),
                stage_count: 4,
                seconds_per_stage: 30.0,
                seed_price: 10,
                sell_price: 25,
            },
        }
    }

    /// Set growth stages and their duration.
    #[must_use]
    pub fn growth(mut self, stage_count: u32, seconds_per_stage: f32) -> Self {
        self.def.stage_count = stage_count.max(1);
        self.def.seconds_per_stage = seconds_per_stage.max(0.0);
        self
    }

    /// Set seed and sell prices.
    #[must_use]
    pub fn prices(mut self, seed: i64, sell: i64) -> Self {
        self.def.seed_price = seed;
        self.def.sell_price = sell;
        self
    }

    /// Build the plant definition.
    #[must_use]
    pub fn build(self) -> PlantDefinition {
        self.def
    }
}

/// Known crops, looked up by name.
#[derive(Debug, Clone, Default)]
pub struct PlantCatalog {
    plants: Vec<PlantDefinition>,
}

impl PlantCatalog {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock crops sold in the seed store.
    #[must_use]
    pub fn default_crops() -> Self {
        let mut catalog = Self::new();
        catalog.register(PlantDefinition::builder("Carrot").growth(4, 20.0).prices(5, 12).build());
        catalog.register(PlantDefinition::builder("Wheat").growth(4, 30.0).prices(8, 20).build());
        catalog.register(PlantDefinition::builder("Tomato").growth(5, 35.0).prices(12, 30).build());
        catalog.register(PlantDefinition::builder("Pumpkin").growth(5, 60.0).prices(20, 60).build());
        catalog
    }

    /// Registers a crop. A crop with the same name is replaced.
    pub fn register(&mut self, definition: PlantDefinition) {
        if let Some(existing) = self
            .plants
            .iter_mut()
            .find(|p| p.plant_name == definition.plant_name)
        {
            *existing = definition;
        } else {
            self.plants.push(definition);
        }
    }

    /// Finds a crop by exact name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&PlantDefinition> {
        self.plants.iter().find(|p| p.plant_name == name)
    }

    /// All registered crops.
    #[must_use]
    pub fn all(&self) -> &[PlantDefinition] {
        &self.plants
    }
}
