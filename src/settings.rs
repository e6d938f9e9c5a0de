//! Race configuration
//!
//! Chosen by the menu layer (or loaded from JSON by the demo binary) and
//! handed to [`crate::sim::RaceSession::start_race`].

use serde::{Deserialize, Serialize};

use crate::sim::{Difficulty, RaceMode, VehicleClass};

/// Default run seed for AI randomness
pub const DEFAULT_SEED: u64 = 0x5EED_CAFE;

/// Settings for the next race or Grand Prix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceSettings {
    pub mode: RaceMode,
    /// Laps per race
    pub laps: u32,
    /// AI opponents (ignored in time trial; total AI count in spectator mode)
    pub opponents: usize,
    /// AI difficulty tier
    pub difficulty: Difficulty,
    /// Vehicle class for the player
    pub player_class: VehicleClass,
    /// Seed for AI pseudo-randomness
    pub seed: u64,
}

impl Default for RaceSettings {
    fn default() -> Self {
        Self {
            mode: RaceMode::SingleRace,
            laps: 3,
            opponents: 5,
            difficulty: Difficulty::Medium,
            player_class: VehicleClass::Standard,
            seed: DEFAULT_SEED,
        }
    }
}

impl RaceSettings {
    /// Settings for a given mode with everything else at defaults
    pub fn for_mode(mode: RaceMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Parse settings from JSON. Missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Pick the player's class by menu index. Out-of-range indices are ignored.
    pub fn set_player_class_index(&mut self, index: usize) {
        match VehicleClass::from_index(index) {
            Some(class) => self.player_class = class,
            None => log::warn!("Ignoring out-of-range vehicle class index {}", index),
        }
    }

    /// Pick the AI tier by menu index. Out-of-range indices are ignored.
    pub fn set_difficulty_index(&mut self, index: usize) {
        match Difficulty::from_index(index) {
            Some(difficulty) => self.difficulty = difficulty,
            None => log::warn!("Ignoring out-of-range difficulty index {}", index),
        }
    }
}
