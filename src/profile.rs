//! Printer profiles: build volume and per-axis speed limits of a printer.
//!
//! Profiles are only read. Auto-park uses them to resolve the non-custom park
//! locations, the automatic park speeds and the per-profile enable list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::ConfigError;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BuildVolume {
    pub width: f64,
    pub depth: f64,
    #[serde(default = "default_volume_height")]
    pub height: f64,
}

impl Default for BuildVolume {
    fn default() -> Self {
        Self {
            width: 200.0,
            depth: 200.0,
            height: default_volume_height(),
        }
    }
}

/// Axis limit. `speed` is in mm/min, the unit jog commands take.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AxisProfile {
    pub speed: f64,
    #[serde(default)]
    pub inverted: bool,
}

impl AxisProfile {
    pub fn with_speed(speed: f64) -> Self {
        Self { speed, inverted: false }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AxesProfile {
    pub x: AxisProfile,
    pub y: AxisProfile,
    pub z: AxisProfile,
}

impl Default for AxesProfile {
    fn default() -> Self {
        Self {
            x: AxisProfile::with_speed(6000.0),
            y: AxisProfile::with_speed(6000.0),
            z: AxisProfile::with_speed(200.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct PrinterProfile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub volume: BuildVolume,
    #[serde(default)]
    pub axes: AxesProfile,
}

impl PrinterProfile {
    pub fn new(id: impl Into<String>, volume: BuildVolume, axes: AxesProfile) -> Self {
        Self {
            id: Some(id.into()),
            name: None,
            volume,
            axes,
        }
    }

    /// The profile id, if it is present and non-empty.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Supplies the profile of the printer that is currently connected.
pub trait ProfileProvider {
    fn current_profile(&self) -> Option<PrinterProfile>;
}

impl ProfileProvider for PrinterProfile {
    fn current_profile(&self) -> Option<PrinterProfile> {
        Some(self.clone())
    }
}

impl<T: ProfileProvider> ProfileProvider for Option<T> {
    fn current_profile(&self) -> Option<PrinterProfile> {
        self.as_ref().and_then(|provider| provider.current_profile())
    }
}

#[derive(Debug, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    current: Option<String>,
    #[serde(default, rename = "profile")]
    profiles: Vec<PrinterProfile>,
}

/// Library of known profiles with one of them selected as current.
///
/// ```toml
/// current = "ender3"
///
/// [[profile]]
/// id = "ender3"
/// volume = { width = 220.0, depth = 220.0 }
/// axes = { x = { speed = 6000.0 }, y = { speed = 6000.0 }, z = { speed = 300.0 } }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProfileManager {
    profiles: BTreeMap<String, PrinterProfile>,
    current: Option<String>,
}

impl ProfileManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// A manager holding only the stock profile, selected.
    pub fn with_default_profile() -> Self {
        let mut manager = Self::new();
        let stock = PrinterProfile::new("_default", BuildVolume::default(), AxesProfile::default());
        manager.add(stock);
        manager.current = Some("_default".to_string());
        manager
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let file: ProfileFile = toml::from_str(contents)?;
        let mut manager = Self::new();
        for profile in file.profiles {
            if profile.id().is_none() {
                return Err(ConfigError::Invalid("every profile needs a non-empty id".to_string()));
            }
            manager.add(profile);
        }
        if let Some(id) = file.current {
            manager.select(&id)?;
        }
        Ok(manager)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).inspect_err(|e| {
            tracing::error!("Failed to read profile file '{}': {}", path.display(), e);
        })?;
        Self::from_toml(&contents)
    }

    /// Adds a profile, replacing any with the same id. Profiles without an id are dropped.
    pub fn add(&mut self, profile: PrinterProfile) {
        match profile.id().map(str::to_string) {
            Some(id) => {
                self.profiles.insert(id, profile);
            }
            None => tracing::warn!("Ignoring printer profile without an id"),
        }
    }

    pub fn select(&mut self, id: &str) -> Result<(), ConfigError> {
        if !self.profiles.contains_key(id) {
            return Err(ConfigError::Invalid(format!("unknown printer profile '{}'", id)));
        }
        tracing::info!("Current printer profile: {}", id);
        self.current = Some(id.to_string());
        Ok(())
    }

    pub fn deselect(&mut self) {
        self.current = None;
    }

    pub fn get(&self, id: &str) -> Option<&PrinterProfile> {
        self.profiles.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}

impl ProfileProvider for ProfileManager {
    fn current_profile(&self) -> Option<PrinterProfile> {
        self.current.as_deref().and_then(|id| self.get(id)).cloned()
    }
}

fn default_volume_height() -> f64 { 200.0 }
