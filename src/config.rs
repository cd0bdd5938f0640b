//! # Auto-park settings
//!
//! Settings are read from a TOML file. Every key has a default, so an empty file
//! (or no file at all) yields the stock behavior: park after pause, done and
//! failure, centered over the bed, at speeds derived from the printer profile.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! profile_mode = "select"
//! selected_profiles = ["prusa_mk3", "ender3"]
//! park_after_done = false
//! home_before_unpark = true
//! park_location = "custom"
//! park_pos_x = 10.0
//! park_pos_y = 200.0
//! park_lift_z = 8.0
//! park_speed = "custom"
//! park_speed_xy = 120.0
//! park_speed_xy_unit = 60.0
//! ```
//!
//! Keys exported by the host settings UI (`parkAfterPause`, `parkSpeedXY_unit`, ...)
//! are accepted as aliases.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Which printer profiles auto-park is active for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileMode {
    #[default]
    All,
    Select,
}

/// Where the head goes when parked.
///
/// Settings files are user-edited, so an unknown location string is kept as
/// [`ParkLocation::Unrecognized`] instead of failing the load. The controller
/// falls back to the origin for it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum ParkLocation {
    #[default]
    Center,
    MinMin,
    MinMax,
    MaxMin,
    MaxMax,
    Custom,
    Unrecognized(String),
}

impl ParkLocation {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Center => "center",
            Self::MinMin => "min",
            Self::MinMax => "min_max",
            Self::MaxMin => "max_min",
            Self::MaxMax => "max",
            Self::Custom => "custom",
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl From<String> for ParkLocation {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "center" => Self::Center,
            "min" | "min_min" => Self::MinMin,
            "min_max" => Self::MinMax,
            "max_min" => Self::MaxMin,
            "max" | "max_max" => Self::MaxMax,
            "custom" => Self::Custom,
            _ => Self::Unrecognized(raw),
        }
    }
}

impl From<ParkLocation> for String {
    fn from(location: ParkLocation) -> Self {
        location.as_str().to_string()
    }
}

impl fmt::Display for ParkLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How park speeds are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParkSpeed {
    /// Use the printer profile's axis limits.
    #[default]
    Auto,
    /// Use the configured speeds scaled by their unit factors.
    Custom,
}

/// Speed units offered for custom park speeds. The factor converts the
/// configured value to mm/min, which is what jog commands expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedUnit {
    MmPerSec,
    MmPerMin,
}

impl SpeedUnit {
    pub fn factor(self) -> f64 {
        match self {
            Self::MmPerSec => 60.0,
            Self::MmPerMin => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::MmPerSec => "mm/s",
            Self::MmPerMin => "mm/m",
        }
    }

    pub fn from_factor(factor: f64) -> Option<Self> {
        [Self::MmPerSec, Self::MmPerMin]
            .into_iter()
            .find(|unit| unit.factor() == factor)
    }
}

/// Auto-park settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AutoParkConfig {
    #[serde(default, alias = "profileMode")]
    pub profile_mode: ProfileMode,
    #[serde(default, alias = "selectedProfiles")]
    pub selected_profiles: Vec<String>,
    #[serde(default = "default_true", alias = "parkAfterPause")]
    pub park_after_pause: bool,
    #[serde(default = "default_true", alias = "parkAfterDone")]
    pub park_after_done: bool,
    #[serde(default = "default_true", alias = "parkAfterFail")]
    pub park_after_fail: bool,
    #[serde(default, alias = "homeBeforeUnpark")]
    pub home_before_unpark: bool,
    #[serde(default, alias = "parkLocation")]
    pub park_location: ParkLocation,
    #[serde(default, alias = "parkSpeed")]
    pub park_speed: ParkSpeed,
    #[serde(default, alias = "parkPosX")]
    pub park_pos_x: f64, // mm
    #[serde(default, alias = "parkPosY")]
    pub park_pos_y: f64, // mm
    #[serde(default = "default_park_lift_z", alias = "parkLiftZ")]
    pub park_lift_z: f64, // mm
    #[serde(default = "default_park_speed_xy", alias = "parkSpeedXY")]
    pub park_speed_xy: f64,
    #[serde(default = "default_park_speed_z", alias = "parkSpeedZ")]
    pub park_speed_z: f64,
    #[serde(default = "default_speed_unit", alias = "parkSpeedXY_unit")]
    pub park_speed_xy_unit: f64,
    #[serde(default = "default_speed_unit", alias = "parkSpeedZ_unit")]
    pub park_speed_z_unit: f64,
}

impl Default for AutoParkConfig {
    fn default() -> Self {
        Self {
            profile_mode: ProfileMode::All,
            selected_profiles: Vec::new(),
            park_after_pause: true,
            park_after_done: true,
            park_after_fail: true,
            home_before_unpark: false,
            park_location: ParkLocation::Center,
            park_speed: ParkSpeed::Auto,
            park_pos_x: 0.0,
            park_pos_y: 0.0,
            park_lift_z: default_park_lift_z(),
            park_speed_xy: default_park_speed_xy(),
            park_speed_z: default_park_speed_z(),
            park_speed_xy_unit: default_speed_unit(),
            park_speed_z_unit: default_speed_unit(),
        }
    }
}

impl AutoParkConfig {
    /// True if at least one of the park triggers is switched on.
    pub fn any_trigger_enabled(&self) -> bool {
        self.park_after_pause || self.park_after_done || self.park_after_fail
    }

    /// Human-readable park speeds, e.g. `custom (xy 100 mm/s, z 20 mm/s)`.
    pub fn speed_summary(&self) -> String {
        fn describe(value: f64, factor: f64) -> String {
            match SpeedUnit::from_factor(factor) {
                Some(unit) => format!("{} {}", value, unit.label()),
                None => format!("{} x{}", value, factor),
            }
        }
        match self.park_speed {
            ParkSpeed::Auto => "auto".to_string(),
            ParkSpeed::Custom => format!(
                "custom (xy {}, z {})",
                describe(self.park_speed_xy, self.park_speed_xy_unit),
                describe(self.park_speed_z, self.park_speed_z_unit)
            ),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.park_lift_z.is_finite() || self.park_lift_z < 0.0 {
            return Err(format!("park_lift_z must be >= 0, got {}", self.park_lift_z));
        }
        if !self.park_pos_x.is_finite() || !self.park_pos_y.is_finite() {
            return Err("park_pos_x and park_pos_y must be finite".to_string());
        }
        let speeds = [
            ("park_speed_xy", self.park_speed_xy),
            ("park_speed_z", self.park_speed_z),
            ("park_speed_xy_unit", self.park_speed_xy_unit),
            ("park_speed_z_unit", self.park_speed_z_unit),
        ];
        for (name, value) in speeds {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{} must be > 0, got {}", name, value));
            }
        }
        if self.profile_mode == ProfileMode::Select && self.selected_profiles.is_empty() {
            tracing::warn!(
                "profile_mode is 'select' but no profiles are selected; auto-park will never run"
            );
        }
        Ok(())
    }
}

/// Holds the live settings and the file they came from.
pub struct ConfigManager {
    config: AutoParkConfig,
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config: AutoParkConfig, config_path: impl Into<PathBuf>) -> Self {
        Self {
            config,
            config_path: config_path.into(),
        }
    }

    pub fn load(config_path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let config_path = config_path.into();
        let config = load_config(&config_path)?;
        Ok(Self { config, config_path })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        save_config(&self.config_path, &self.config)
    }

    /// Re-reads the settings file. The current settings are kept if it fails.
    pub fn reload(&mut self) -> Result<&AutoParkConfig, ConfigError> {
        self.config = load_config(&self.config_path)?;
        Ok(&self.config)
    }

    pub fn get_config(&self) -> &AutoParkConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

fn default_true() -> bool { true }
fn default_park_lift_z() -> f64 { 5.0 }
fn default_park_speed_xy() -> f64 { 100.0 }
fn default_park_speed_z() -> f64 { 20.0 }
fn default_speed_unit() -> f64 { SpeedUnit::MmPerSec.factor() }

pub fn parse_config(contents: &str) -> Result<AutoParkConfig, ConfigError> {
    let config: AutoParkConfig = toml::from_str(contents)?;
    config.validate().map_err(ConfigError::Invalid)?;
    Ok(config)
}

pub fn load_config(path: impl AsRef<Path>) -> Result<AutoParkConfig, ConfigError> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents).inspect_err(|e| {
            tracing::error!("Failed to load settings from '{}': {}", path.display(), e);
        }),
        Err(e) => {
            tracing::error!("Failed to read settings file '{}': {}", path.display(), e);
            Err(ConfigError::Io(e))
        }
    }
}

pub fn save_config(path: impl AsRef<Path>, config: &AutoParkConfig) -> Result<(), ConfigError> {
    let toml_string = toml::to_string(config)?;
    std::fs::write(path, toml_string)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, AutoParkConfig::default());
        assert_eq!(config.park_lift_z, 5.0);
        assert_eq!(config.park_speed_xy_unit, 60.0);
        assert!(config.any_trigger_enabled());
    }

    #[test]
    fn host_keys_are_accepted() {
        let config = parse_config(
            r#"
            profileMode = "select"
            selectedProfiles = ["ender3"]
            parkAfterDone = false
            parkLocation = "min_max"
            parkSpeedXY_unit = 1.0
            "#,
        )
        .unwrap();
        assert_eq!(config.profile_mode, ProfileMode::Select);
        assert_eq!(config.selected_profiles, vec!["ender3".to_string()]);
        assert!(!config.park_after_done);
        assert_eq!(config.park_location, ParkLocation::MinMax);
        assert_eq!(config.park_speed_xy_unit, 1.0);
    }

    #[test]
    fn unknown_location_is_kept() {
        let config = parse_config(r#"park_location = "over_there""#).unwrap();
        assert_eq!(config.park_location, ParkLocation::Unrecognized("over_there".to_string()));
        assert_eq!(config.park_location.to_string(), "over_there");
    }

    #[test]
    fn location_aliases() {
        assert_eq!(ParkLocation::from("min".to_string()), ParkLocation::MinMin);
        assert_eq!(ParkLocation::from("MAX_MAX".to_string()), ParkLocation::MaxMax);
        assert_eq!(String::from(ParkLocation::MaxMax), "max");
    }

    #[test]
    fn unknown_speed_mode_is_rejected() {
        let err = parse_config(r#"park_speed = "ludicrous""#).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = AutoParkConfig::default();
        config.park_lift_z = -1.0;
        assert!(config.validate().is_err());

        let mut config = AutoParkConfig::default();
        config.park_speed_z_unit = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.contains("park_speed_z_unit"));

        let mut config = AutoParkConfig::default();
        config.park_pos_x = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn speed_units() {
        assert_eq!(SpeedUnit::from_factor(60.0), Some(SpeedUnit::MmPerSec));
        assert_eq!(SpeedUnit::from_factor(1.0), Some(SpeedUnit::MmPerMin));
        assert_eq!(SpeedUnit::from_factor(7.0), None);
        assert_eq!(SpeedUnit::MmPerSec.label(), "mm/s");
    }

    #[test]
    fn speed_summary_names_units() {
        assert_eq!(AutoParkConfig::default().speed_summary(), "auto");
        let config = AutoParkConfig {
            park_speed: ParkSpeed::Custom,
            park_speed_z_unit: 1.0,
            park_speed_xy_unit: 30.0,
            ..AutoParkConfig::default()
        };
        assert_eq!(config.speed_summary(), "custom (xy 100 x30, z 20 mm/m)");
    }
}
