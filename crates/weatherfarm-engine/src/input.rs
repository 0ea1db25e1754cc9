//! Key bindings for the farm's hotkeys.
//!
//! This module provides:
//! - `FarmAction` enum for all bindable actions
//! - `KeyBinding` with primary/secondary keys
//! - `KeyBindings` lookup with conflict detection
//! - Export/import as a flat map for the config file

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during rebinding.
#[derive(Debug, Error)]
pub enum RebindError {
    /// Key is already bound to another action.
    #[error("Key {key} is already bound to {action:?}")]
    Conflict {
        /// The conflicting key.
        key: String,
        /// The action it's bound to.
        action: FarmAction,
    },

    /// Action name not recognised.
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// Empty key name.
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),
}

/// Result type for rebind operations.
pub type RebindResult<T> = Result<T, RebindError>;

/// All bindable farm actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FarmAction {
    /// Write money, plots and current weather to the store.
    QuickSave,
    /// Restore money, plots and weather from the store.
    QuickLoad,
    /// Jump to the next day.
    ForceAdvance,
    /// Forget stored weather around today.
    ClearWeather,
    /// Leave the game.
    Quit,
}

impl FarmAction {
    /// Every action, in display order.
    pub const ALL: [FarmAction; 5] = [
        FarmAction::QuickSave,
        FarmAction::QuickLoad,
        FarmAction::ForceAdvance,
        FarmAction::ClearWeather,
        FarmAction::Quit,
    ];

    /// Returns the display name for this action.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::QuickSave => "Quick Save",
            Self::QuickLoad => "Quick Load",
            Self::ForceAdvance => "Next Day",
            Self::ClearWeather => "Clear Weather",
            Self::Quit => "Quit",
        }
    }

    /// Identifier used in the config file.
    #[must_use]
    pub fn config_name(self) -> &'static str {
        match self {
            Self::QuickSave => "QuickSave",
            Self::QuickLoad => "QuickLoad",
            Self::ForceAdvance => "ForceAdvance",
            Self::ClearWeather => "ClearWeather",
            Self::Quit => "Quit",
        }
    }
}

impl FromStr for FarmAction {
    type Err = RebindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.config_name() == s)
            .ok_or_else(|| RebindError::UnknownAction(s.to_string()))
    }
}

/// A key binding with primary and optional secondary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    /// The action this binding is for.
    pub action: FarmAction,
    /// Primary key (required).
    pub primary: String,
    /// Secondary key (optional).
    pub secondary: Option<String>,
}

impl KeyBinding {
    /// Creates a new key binding.
    #[must_use]
    pub fn new(action: FarmAction, primary: impl Into<String>) -> Self {
        Self {
            action,
            primary: primary.into(),
            secondary: None,
        }
    }

    /// Creates a key binding with secondary key.
    #[must_use]
    pub fn with_secondary(mut self, secondary: impl Into<String>) -> Self {
        self.secondary = Some(secondary.into());
        self
    }

    /// `"F5"` or `"F5,S"`.
    fn to_config_value(&self) -> String {
        match &self.secondary {
            Some(sec) => format!("{},{sec}", self.primary),
            None => self.primary.clone(),
        }
    }
}

/// The active key bindings.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    bindings: HashMap<FarmAction, KeyBinding>,
    key_to_action: HashMap<String, FarmAction>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = Self {
            bindings: HashMap::new(),
            key_to_action: HashMap::new(),
        };
        for binding in Self::default_bindings() {
            bindings.insert(binding);
        }
        bindings
    }
}

impl KeyBindings {
    /// Returns default key bindings.
    #[must_use]
    pub fn default_bindings() -> Vec<KeyBinding> {
        vec![
            KeyBinding::new(FarmAction::QuickSave, "F5"),
            KeyBinding::new(FarmAction::QuickLoad, "F9"),
            KeyBinding::new(FarmAction::ForceAdvance, "F8"),
            KeyBinding::new(FarmAction::ClearWeather, "F12"),
            KeyBinding::new(FarmAction::Quit, "Escape").with_secondary("q"),
        ]
    }

    /// Defaults, overridden by entries from a config map. Entries that fail
    /// to apply are logged and skipped.
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let mut bindings = Self::default();
        for (action_name, keys) in map {
            if let Err(e) = bindings.apply_entry(action_name, keys) {
                warn!("Ignoring key binding {action_name} = {keys:?}: {e}");
            }
        }
        bindings
    }

    fn apply_entry(&mut self, action_name: &str, keys: &str) -> RebindResult<()> {
        let action: FarmAction = action_name.parse()?;
        let mut parts = keys.split(',').map(str::trim);
        let primary = parts.next().unwrap_or_default();
        self.rebind_primary(action, primary)?;
        match parts.next() {
            Some(secondary) => self.rebind_secondary(action, secondary),
            None => {
                self.clear_secondary(action);
                Ok(())
            },
        }
    }

    fn insert(&mut self, binding: KeyBinding) {
        self.key_to_action.insert(binding.primary.clone(), binding.action);
        if let Some(ref sec) = binding.secondary {
            self.key_to_action.insert(sec.clone(), binding.action);
        }
        self.bindings.insert(binding.action, binding);
    }

    /// Gets the binding for an action.
    #[must_use]
    pub fn get_binding(&self, action: FarmAction) -> Option<&KeyBinding> {
        self.bindings.get(&action)
    }

    /// Gets the action bound to a key.
    #[must_use]
    pub fn action_for_key(&self, key: &str) -> Option<FarmAction> {
        self.key_to_action.get(key).copied()
    }

    fn check_conflict(&self, key: &str, exclude_action: FarmAction) -> Option<FarmAction> {
        self.key_to_action.get(key).copied().filter(|&a| a != exclude_action)
    }

    fn check_key(key: &str) -> RebindResult<()> {
        if key.is_empty() {
            return Err(RebindError::InvalidKey(key.to_string()));
        }
        Ok(())
    }

    /// Rebinds the primary key for an action.
    pub fn rebind_primary(&mut self, action: FarmAction, key: &str) -> RebindResult<()> {
        Self::check_key(key)?;
        if let Some(conflicting) = self.check_conflict(key, action) {
            return Err(RebindError::Conflict {
                key: key.to_string(),
                action: conflicting,
            });
        }

        let binding = self
            .bindings
            .entry(action)
            .or_insert_with(|| KeyBinding::new(action, key));
        self.key_to_action.remove(&binding.primary);
        binding.primary = key.to_string();
        self.key_to_action.insert(key.to_string(), action);

        info!("Rebound {:?} primary to {}", action, key);
        Ok(())
    }

    /// Rebinds the secondary key for an action.
    pub fn rebind_secondary(&mut self, action: FarmAction, key: &str) -> RebindResult<()> {
        Self::check_key(key)?;
        if let Some(conflicting) = self.check_conflict(key, action) {
            return Err(RebindError::Conflict {
                key: key.to_string(),
                action: conflicting,
            });
        }

        let Some(binding) = self.bindings.get_mut(&action) else {
            return self.rebind_primary(action, key);
        };
        if let Some(ref old_sec) = binding.secondary {
            self.key_to_action.remove(old_sec);
        }
        binding.secondary = Some(key.to_string());
        self.key_to_action.insert(key.to_string(), action);

        info!("Rebound {:?} secondary to {}", action, key);
        Ok(())
    }

    /// Clears the secondary key for an action.
    pub fn clear_secondary(&mut self, action: FarmAction) {
        if let Some(binding) = self.bindings.get_mut(&action) {
            if let Some(sec) = binding.secondary.take() {
                self.key_to_action.remove(&sec);
                debug!("Cleared {:?} secondary binding", action);
            }
        }
    }

    /// Exports bindings to a map for the config file.
    #[must_use]
    pub fn export_to_map(&self) -> BTreeMap<String, String> {
        self.bindings
            .values()
            .map(|b| (b.action.config_name().to_string(), b.to_config_value()))
            .collect()
    }
}
