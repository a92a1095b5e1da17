//! TOML configuration and the typed settings derived from it.
//!
//! [`Config`] mirrors the on-disk `config.toml`: times are plain `HH:MM`
//! strings and weekdays uppercase English names, so hand-edits stay
//! forgiving. [`Config::to_settings`] parses that into the typed
//! [`Settings`] the detection core consumes, and [`SettingsStore`] publishes
//! settings changes to running components over a watch channel.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{ConfigError, Result};
use crate::model::{
    BeaconConfig, TimeWindow, DEFAULT_SCAN_INTERVAL_MS, DEFAULT_TIMEOUT_MINUTES,
};

const CONFIG_FILE: &str = "config.toml";

/// On-disk configuration, stored as `config.toml` in the data directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Weekdays with an office commute, as uppercase English names
    /// (`"MONDAY"`). Empty disables automatic commute tracking.
    #[serde(default)]
    pub commute_days: Vec<String>,

    /// Start of the outbound commute window, `HH:MM`.
    #[serde(default = "default_outbound_start")]
    pub outbound_window_start: String,
    /// End of the outbound commute window, `HH:MM`.
    #[serde(default = "default_outbound_end")]
    pub outbound_window_end: String,

    /// Start of the return commute window, `HH:MM`.
    #[serde(default = "default_return_start")]
    pub return_window_start: String,
    /// End of the return commute window, `HH:MM`.
    #[serde(default = "default_return_end")]
    pub return_window_end: String,

    /// Start of the plausible work window, `HH:MM`.
    #[serde(default = "default_work_start")]
    pub work_window_start: String,
    /// End of the plausible work window, `HH:MM`.
    #[serde(default = "default_work_end")]
    pub work_window_end: String,

    /// UUID of the desk beacon; unset disables home-office detection.
    #[serde(default)]
    pub beacon_uuid: Option<String>,
    /// Minutes without a sighting before the beacon counts as lost.
    #[serde(default = "default_beacon_timeout")]
    pub beacon_timeout_minutes: u32,
    /// Time between beacon scans in milliseconds.
    #[serde(default = "default_beacon_scan_interval")]
    pub beacon_scan_interval_ms: u64,
    /// Minimum signal strength in dBm for a sighting to count; unset
    /// accepts any strength.
    #[serde(default)]
    pub beacon_rssi_threshold: Option<i32>,

    /// Weekly work target in hours.
    #[serde(default = "default_weekly_target")]
    pub weekly_target_hours: f64,
}

fn default_outbound_start() -> String {
    "06:00".to_string()
}

fn default_outbound_end() -> String {
    "09:30".to_string()
}

fn default_return_start() -> String {
    "16:00".to_string()
}

fn default_return_end() -> String {
    "20:00".to_string()
}

fn default_work_start() -> String {
    "06:00".to_string()
}

fn default_work_end() -> String {
    "22:00".to_string()
}

fn default_beacon_timeout() -> u32 {
    DEFAULT_TIMEOUT_MINUTES
}

fn default_beacon_scan_interval() -> u64 {
    DEFAULT_SCAN_INTERVAL_MS
}

fn default_weekly_target() -> f64 {
    40.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            commute_days: Vec::new(),
            outbound_window_start: default_outbound_start(),
            outbound_window_end: default_outbound_end(),
            return_window_start: default_return_start(),
            return_window_end: default_return_end(),
            work_window_start: default_work_start(),
            work_window_end: default_work_end(),
            beacon_uuid: None,
            beacon_timeout_minutes: default_beacon_timeout(),
            beacon_scan_interval_ms: default_beacon_scan_interval(),
            beacon_rssi_threshold: None,
            weekly_target_hours: default_weekly_target(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() || parts.peek().is_none() {
            return Err(invalid("config key is empty".to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| invalid("unknown config key".to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| invalid("unknown config key".to_string()))?;

                // The new value takes the type of the one it replaces;
                // `null` resets optional keys.
                let new_value = if value == "null" {
                    serde_json::Value::Null
                } else {
                    match existing {
                        serde_json::Value::Bool(_) => serde_json::Value::Bool(
                            value
                                .parse::<bool>()
                                .map_err(|e| invalid(e.to_string()))?,
                        ),
                        serde_json::Value::Number(_) => {
                            if let Ok(n) = value.parse::<u64>() {
                                serde_json::Value::Number(n.into())
                            } else if let Ok(n) = value.parse::<i64>() {
                                serde_json::Value::Number(n.into())
                            } else if let Ok(n) = value.parse::<f64>() {
                                serde_json::Number::from_f64(n)
                                    .map(serde_json::Value::Number)
                                    .ok_or_else(|| {
                                        invalid(format!("cannot parse '{value}' as number"))
                                    })?
                            } else {
                                return Err(invalid(format!(
                                    "cannot parse '{value}' as number"
                                )));
                            }
                        }
                        serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                            serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                        }
                        serde_json::Value::Null => serde_json::from_str(value)
                            .unwrap_or_else(|_| serde_json::Value::String(value.into())),
                        _ => serde_json::Value::String(value.into()),
                    }
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| invalid("unknown config key".to_string()))?;
        }

        Err(invalid("unknown config key".to_string()))
    }

    fn path() -> Result<PathBuf> {
        Ok(super::data_dir()?.join(CONFIG_FILE))
    }

    /// Load from the data directory, writing the defaults first if no file
    /// exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        Ok(Self::load_from(&path)?)
    }

    /// Load from an explicit path, writing the defaults there if the file
    /// is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the data directory.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        Ok(self.save_to(&path)?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. Does not persist; call [`save`](Self::save)
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// into the key's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Parses the raw file values into typed [`Settings`].
    ///
    /// Unknown weekday names are skipped with a warning; malformed times
    /// and inverted windows are hard errors.
    pub fn to_settings(&self) -> Result<Settings, ConfigError> {
        let commute_days = self
            .commute_days
            .iter()
            .filter_map(|name| {
                let day = parse_weekday(name);
                if day.is_none() {
                    log::warn!("ignoring unknown commute day {name:?}");
                }
                day
            })
            .collect();

        Ok(Settings {
            commute_days,
            outbound_window: parse_window(
                "outbound_window",
                &self.outbound_window_start,
                &self.outbound_window_end,
            )?,
            return_window: parse_window(
                "return_window",
                &self.return_window_start,
                &self.return_window_end,
            )?,
            work_window: parse_window(
                "work_window",
                &self.work_window_start,
                &self.work_window_end,
            )?,
            beacon_uuid: self.beacon_uuid.clone(),
            beacon_timeout_minutes: self.beacon_timeout_minutes,
            beacon_scan_interval_ms: self.beacon_scan_interval_ms,
            beacon_rssi_threshold: self.beacon_rssi_threshold,
            weekly_target_hours: self.weekly_target_hours,
        })
    }
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    match name {
        "MONDAY" => Some(Weekday::Mon),
        "TUESDAY" => Some(Weekday::Tue),
        "WEDNESDAY" => Some(Weekday::Wed),
        "THURSDAY" => Some(Weekday::Thu),
        "FRIDAY" => Some(Weekday::Fri),
        "SATURDAY" => Some(Weekday::Sat),
        "SUNDAY" => Some(Weekday::Sun),
        _ => None,
    }
}

fn parse_time(key: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("expected HH:MM, got {value:?}"),
    })
}

fn parse_window(key: &str, start: &str, end: &str) -> Result<TimeWindow, ConfigError> {
    let start = parse_time(&format!("{key}_start"), start)?;
    let end = parse_time(&format!("{key}_end"), end)?;
    TimeWindow::new(start, end).ok_or_else(|| ConfigError::InvalidValue {
        key: key.to_string(),
        message: "window start is after its end".to_string(),
    })
}

/// Typed runtime settings derived from [`Config`].
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub commute_days: HashSet<Weekday>,
    pub outbound_window: TimeWindow,
    pub return_window: TimeWindow,
    pub work_window: TimeWindow,
    pub beacon_uuid: Option<String>,
    pub beacon_timeout_minutes: u32,
    pub beacon_scan_interval_ms: u64,
    pub beacon_rssi_threshold: Option<i32>,
    pub weekly_target_hours: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            commute_days: HashSet::new(),
            outbound_window: TimeWindow::default_outbound(),
            return_window: TimeWindow::default_return(),
            work_window: TimeWindow::default_work_time(),
            beacon_uuid: None,
            beacon_timeout_minutes: DEFAULT_TIMEOUT_MINUTES,
            beacon_scan_interval_ms: DEFAULT_SCAN_INTERVAL_MS,
            beacon_rssi_threshold: None,
            weekly_target_hours: 40.0,
        }
    }
}

impl Settings {
    /// Beacon watchdog configuration, when a beacon UUID is set.
    pub fn beacon_config(&self) -> Option<BeaconConfig> {
        self.beacon_uuid.as_ref().map(|uuid| BeaconConfig {
            uuid: uuid.clone(),
            scan_interval_ms: self.beacon_scan_interval_ms,
            timeout_minutes: self.beacon_timeout_minutes,
            rssi_threshold: self.beacon_rssi_threshold,
        })
    }

    /// Daily work target, the weekly target spread over five days.
    pub fn daily_target_hours(&self) -> f64 {
        self.weekly_target_hours / 5.0
    }
}

/// Publishes the current [`Settings`] to running components.
///
/// Components hold a `watch::Receiver` and read the current value on each
/// check, so a settings change takes effect on the next event without any
/// restart choreography.
pub struct SettingsStore {
    tx: watch::Sender<Settings>,
}

impl SettingsStore {
    pub fn new(settings: Settings) -> Self {
        let (tx, _rx) = watch::channel(settings);
        Self { tx }
    }

    /// Builds the store from a parsed config file.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(config.to_settings()?))
    }

    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Settings {
        self.tx.borrow().clone()
    }

    /// Applies an in-place edit and notifies all subscribers.
    pub fn update(&self, edit: impl FnOnce(&mut Settings)) {
        self.tx.send_modify(edit);
    }
}
