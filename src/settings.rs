//! Engine settings
//!
//! Tunables shared by every stage. Stored as JSON; fields missing from the file
//! fall back to their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SettingsError;

/// Weather engine tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSettings {
    /// Run the weather engine at all
    pub enabled: bool,
    /// Shortest time a mode is held before the next roll (ms)
    pub min_hold_ms: u64,
    /// Longest time a mode is held before the next roll (ms)
    pub max_hold_ms: u64,
    /// Interval between storm hazard rolls (ms)
    pub hazard_check_ms: u64,
    /// Probability that a hazard roll produces a strike
    pub hazard_chance: f64,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            min_hold_ms: 15_000,
            max_hold_ms: 35_000,
            hazard_check_ms: 4_000,
            hazard_chance: 0.15,
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Simulation tick cadence (ms)
    pub tick_ms: u64,
    /// Post-terminal display window before a word is retired (ms)
    pub grace_ms: u64,
    /// Misses that end the round
    pub miss_limit: u32,
    /// Fall progress at which a word counts as missed
    pub fall_threshold: f64,
    /// Ambient weather
    pub weather: WeatherSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_ms: SIM_TICK_MS,
            grace_ms: RETIRE_GRACE_MS,
            miss_limit: MISS_LIMIT,
            fall_threshold: FALL_MISS_THRESHOLD,
            weather: WeatherSettings::default(),
        }
    }
}

impl Settings {
    /// Check value ranges the simulation relies on
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.tick_ms == 0 {
            return Err(SettingsError::Invalid {
                field: "tick_ms",
                reason: "must be positive",
            });
        }
        if self.miss_limit == 0 {
            return Err(SettingsError::Invalid {
                field: "miss_limit",
                reason: "must be positive",
            });
        }
        if !(self.fall_threshold > 0.0 && self.fall_threshold <= 1.0) {
            return Err(SettingsError::Invalid {
                field: "fall_threshold",
                reason: "must be in (0, 1]",
            });
        }
        if self.weather.min_hold_ms == 0 || self.weather.min_hold_ms > self.weather.max_hold_ms {
            return Err(SettingsError::Invalid {
                field: "weather.min_hold_ms",
                reason: "must be positive and not above max_hold_ms",
            });
        }
        if self.weather.hazard_check_ms == 0 {
            return Err(SettingsError::Invalid {
                field: "weather.hazard_check_ms",
                reason: "must be positive",
            });
        }
        if !(0.0..=1.0).contains(&self.weather.hazard_chance) {
            return Err(SettingsError::Invalid {
                field: "weather.hazard_chance",
                reason: "must be in [0, 1]",
            });
        }
        Ok(())
    }

    /// Load and validate settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings =
            serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.validate()?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file is absent or broken
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                log::info!("Using default settings ({err})");
                Self::default()
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Settings saved");
        Ok(())
    }
}
