//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! clock-config.toml file. It covers where to find the native library, the NTP
//! and weather settings, the window geometry, display preferences and the
//! alarms to schedule at start-up.
//!
//! Every section has defaults, so a partial file (or none at all) is valid.

use crate::library::DEFAULT_LIBRARY_PATH;
use crate::{GeoLocation, TemperatureUnit, TimeOfDay};
use chrono::Weekday;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default configuration file name, relative to the working directory.
pub const CONFIG_FILE: &str = "clock-config.toml";

/// Errors raised while reading or writing the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Application configuration loaded from clock-config.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Native library location
    pub library: LibraryConfig,
    /// Time synchronization
    pub ntp: NtpConfig,
    /// Weather service access
    pub weather: WeatherConfig,
    /// Window geometry
    pub window: WindowConfig,
    /// Clock face options
    pub display: DisplayConfig,
    /// Alarms scheduled at start-up
    pub alarms: Vec<AlarmConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Path of the clock_util shared library
    pub path: PathBuf,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        LibraryConfig {
            path: PathBuf::from(DEFAULT_LIBRARY_PATH),
        }
    }
}

/// NTP query and clock correction settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NtpConfig {
    /// NTP server host name
    pub server: String,
    /// Per-operation timeout in seconds
    pub timeout_secs: u64,
    /// Seconds between two drift checks
    pub check_interval_secs: u64,
    /// Drift beyond which the local clock is considered wrong
    pub max_drift_secs: i64,
    /// Set the system clock when drift exceeds `max_drift_secs`; when
    /// false the drift is only reported
    pub apply_correction: bool,
    /// Set the system clock once at start-up
    pub sync_on_start: bool,
}

impl Default for NtpConfig {
    fn default() -> Self {
        NtpConfig {
            server: "pool.ntp.org".to_string(),
            timeout_secs: 5,
            check_interval_secs: 50,
            max_drift_secs: 120,
            apply_correction: true,
            sync_on_start: false,
        }
    }
}

impl NtpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}

/// Weather service settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Service API key; weather is disabled while this is empty
    pub api_key: String,
    pub units: TemperatureUnit,
    pub latitude: f64,
    pub longitude: f64,
    /// Minutes between two weather requests
    pub refresh_minutes: u64,
    pub timeout_secs: u64,
    /// Last known conditions, shown until the first request completes
    pub cache_path: PathBuf,
    /// Cache TTL in minutes
    pub cache_ttl_minutes: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        WeatherConfig {
            api_key: String::new(),
            units: TemperatureUnit::Fahrenheit,
            // Seattle, WA
            latitude: 47.6062,
            longitude: -122.3321,
            refresh_minutes: 360,
            timeout_secs: 30,
            cache_path: PathBuf::from("weather-cache.json"),
            cache_ttl_minutes: 360,
        }
    }
}

impl WeatherConfig {
    pub fn is_enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn location(&self) -> GeoLocation {
        GeoLocation {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_minutes.saturating_mul(60))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_minutes.saturating_mul(60))
    }
}

/// Clock window geometry
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    pub x: i32,
    pub y: i32,
    pub resizable: bool,
    pub hide_title_bar: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            title: "Smart Clock".to_string(),
            width: 480,
            height: 800,
            x: 0,
            y: 0,
            resizable: false,
            hide_title_bar: true,
        }
    }
}

/// Clock face options
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// 24-hour time instead of 12-hour with AM/PM
    pub use_24_hour: bool,
    pub show_seconds: bool,
    /// Redraw period in milliseconds
    pub tick_millis: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            use_24_hour: false,
            show_seconds: true,
            tick_millis: 1000,
        }
    }
}

impl DisplayConfig {
    pub fn tick(&self) -> Duration {
        // A zero period would spin the loop
        Duration::from_millis(self.tick_millis.max(50))
    }
}

/// One `[[alarms]]` entry
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AlarmConfig {
    /// Alarm text; also the key used to remove it
    pub name: String,
    /// Trigger time, `HH:MM` or `HH:MM:SS`
    pub time: TimeOfDay,
    /// Days the alarm applies to, e.g. `["Mon", "Tue"]`
    #[serde(default)]
    pub days: Vec<Weekday>,
    /// Sound file played when the alarm fires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
}

impl Config {
    /// Load configuration from clock-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::try_load_from_path(path) {
            Ok(config) => {
                info!(
                    "Loaded configuration from {} ({} alarms)",
                    path.display(),
                    config.alarms.len()
                );
                config
            }
            Err(ConfigError::Io { .. }) => {
                info!("No config file at {}, using default configuration", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("{e}");
                warn!("Using default configuration");
                Self::default()
            }
        }
    }

    /// Load configuration from specified path, reporting any failure
    pub fn try_load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save current configuration to clock-config.toml
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to_path(CONFIG_FILE)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}
