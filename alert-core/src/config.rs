use anyhow::{Context, Result, anyhow};
use chrono::{FixedOffset, NaiveDateTime, Offset, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{broadcast, evaluate, forecast};

/// Deployment settings stored on disk as TOML.
///
/// Every field has a default tuned for the Bangkok deployment, so a missing
/// config file is a working config. The broadcast credential deliberately
/// lives in the environment, not here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub latitude: f64,
    pub longitude: f64,

    /// IANA zone name passed to the forecast API; forecast timestamps come
    /// back as local civil time in this zone.
    pub timezone: String,

    /// Fixed UTC offset of `timezone` in whole hours. No daylight saving.
    pub utc_offset_hours: i8,

    /// Daily maximum temperature at or above which a heat alert fires, °C.
    pub heat_threshold_c: f64,

    pub forecast_days: u8,
    pub check_interval_secs: u64,

    /// Forecast API base URL. Only changed for testing against a mock.
    pub forecast_base_url: String,

    /// Broadcast API base URL. Only changed for testing against a mock.
    pub broadcast_base_url: String,

    /// Override for the persisted dedup-state file. Defaults to the
    /// platform data directory.
    pub state_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            latitude: 13.7563,
            longitude: 100.5018,
            timezone: "Asia/Bangkok".to_string(),
            utc_offset_hours: 7,
            heat_threshold_c: evaluate::HEAT_THRESHOLD_C,
            forecast_days: 1,
            check_interval_secs: 600,
            forecast_base_url: forecast::open_meteo::DEFAULT_BASE_URL.to_string(),
            broadcast_base_url: broadcast::line::DEFAULT_BASE_URL.to_string(),
            state_path: None,
        }
    }
}

impl Config {
    /// Load config from the platform config directory, or return defaults
    /// if no file exists yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load config from an explicit path. A missing file means defaults; a
    /// present but unparseable file is an operator error, unlike the state
    /// file.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Path to the persisted notification state file.
    pub fn state_file_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.state_path {
            return Ok(path.clone());
        }

        let dirs = project_dirs()?;
        Ok(dirs.data_dir().join("notified_state.json"))
    }

    /// The location's fixed civil-time offset. Out-of-range values fall
    /// back to UTC rather than failing the cycle.
    pub fn utc_offset(&self) -> FixedOffset {
        let secs = i32::from(self.utc_offset_hours).clamp(-23, 23) * 3600;
        FixedOffset::east_opt(secs).unwrap_or_else(|| Utc.fix())
    }

    /// Current wall-clock time at the target location.
    pub fn now_local(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.utc_offset()).naive_local()
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "weather-alert", "weather-alert")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_bangkok_deployment() {
        let cfg = Config::default();

        assert_eq!(cfg.timezone, "Asia/Bangkok");
        assert_eq!(cfg.utc_offset_hours, 7);
        assert_eq!(cfg.heat_threshold_c, 35.0);
        assert_eq!(cfg.forecast_days, 1);
        assert_eq!(cfg.check_interval(), Duration::from_secs(600));
        assert_eq!(cfg.forecast_base_url, "https://api.open-meteo.com");
        assert_eq!(cfg.broadcast_base_url, "https://api.line.me");
    }

    #[test]
    fn missing_file_loads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_absent_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "latitude = 18.7883\nlongitude = 98.9853\nheat_threshold_c = 38.0\n",
        )
        .unwrap();

        let cfg = Config::load_from(&path).unwrap();

        assert_eq!(cfg.latitude, 18.7883);
        assert_eq!(cfg.heat_threshold_c, 38.0);
        assert_eq!(cfg.timezone, "Asia/Bangkok");
        assert_eq!(cfg.forecast_base_url, "https://api.open-meteo.com");
    }

    #[test]
    fn broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "latitude = \"not a number\"").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn utc_offset_matches_configured_hours() {
        let cfg = Config::default();
        assert_eq!(cfg.utc_offset().local_minus_utc(), 7 * 3600);
    }

    #[test]
    fn explicit_state_path_wins() {
        let cfg = Config {
            state_path: Some(PathBuf::from("/tmp/state.json")),
            ..Config::default()
        };
        assert_eq!(
            cfg.state_file_path().unwrap(),
            PathBuf::from("/tmp/state.json")
        );
    }
}
