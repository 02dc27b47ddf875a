use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::geofence::GeofencePolicy;
use crate::core::state_machine::Rules;
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default = "default_tolerance")]
    pub default_tolerance_m: f64,
    #[serde(default = "default_visitor_tolerance")]
    pub visitor_tolerance_m: f64,
    #[serde(default = "default_lunch_cap")]
    pub lunch_cap_minutes: i64,
    #[serde(default = "default_legal_hours")]
    pub legal_daily_hours: f64,
    #[serde(default = "default_auto_close_after")]
    pub auto_close_after_hours: i64,
    #[serde(default = "default_auto_close_interval")]
    pub auto_close_interval_secs: u64,
    #[serde(default = "default_collaborator_timeout")]
    pub collaborator_timeout_ms: u64,
    #[serde(default = "default_replay_interval")]
    pub replay_interval_secs: u64,
    #[serde(default = "default_max_clock_skew")]
    pub max_clock_skew_secs: i64,
}

fn default_tolerance() -> f64 {
    50.0
}
fn default_visitor_tolerance() -> f64 {
    1000.0
}
fn default_lunch_cap() -> i64 {
    60
}
fn default_legal_hours() -> f64 {
    8.0
}
fn default_auto_close_after() -> i64 {
    8
}
fn default_auto_close_interval() -> u64 {
    3600
}
fn default_collaborator_timeout() -> u64 {
    5000
}
fn default_replay_interval() -> u64 {
    60
}
fn default_max_clock_skew() -> i64 {
    120
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: Self::database_file().to_string_lossy().to_string(),
            default_tolerance_m: default_tolerance(),
            visitor_tolerance_m: default_visitor_tolerance(),
            lunch_cap_minutes: default_lunch_cap(),
            legal_daily_hours: default_legal_hours(),
            auto_close_after_hours: default_auto_close_after(),
            auto_close_interval_secs: default_auto_close_interval(),
            collaborator_timeout_ms: default_collaborator_timeout(),
            replay_interval_secs: default_replay_interval(),
            max_clock_skew_secs: default_max_clock_skew(),
        }
    }
}

impl Config {
    /// Return the configuration directory (`~/.jornada`)
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".jornada")
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("jornada.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("jornada.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        let path = Self::config_file();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            Self::from_yaml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_yaml(content: &str) -> AppResult<Self> {
        let cfg: Config = serde_yaml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.default_tolerance_m <= 0.0 || self.visitor_tolerance_m <= 0.0 {
            return Err(AppError::Config("tolerances must be positive".into()));
        }
        if self.lunch_cap_minutes <= 0 || self.auto_close_after_hours <= 0 {
            return Err(AppError::Config(
                "lunch_cap_minutes and auto_close_after_hours must be positive".into(),
            ));
        }
        if self.legal_daily_hours < 0.0 {
            return Err(AppError::Config("legal_daily_hours cannot be negative".into()));
        }
        if self.auto_close_interval_secs == 0 || self.replay_interval_secs == 0 {
            return Err(AppError::Config("intervals must be at least one second".into()));
        }
        if self.collaborator_timeout_ms == 0 {
            return Err(AppError::Config(
                "collaborator_timeout_ms must be at least one millisecond".into(),
            ));
        }
        if self.max_clock_skew_secs < 0 {
            return Err(AppError::Config("max_clock_skew_secs cannot be negative".into()));
        }
        Ok(())
    }

    /// Write the configuration file and create the config directory.
    pub fn init_all(&self, write_config: bool) -> AppResult<()> {
        fs::create_dir_all(Self::config_dir())?;
        if write_config {
            let yaml = serde_yaml::to_string(self)?;
            fs::write(Self::config_file(), yaml)?;
        }
        Ok(())
    }

    pub fn geofence_policy(&self) -> GeofencePolicy {
        GeofencePolicy {
            default_tolerance_m: self.default_tolerance_m,
            visitor_tolerance_m: self.visitor_tolerance_m,
        }
    }

    pub fn rules(&self) -> Rules {
        Rules {
            lunch_cap: chrono::Duration::minutes(self.lunch_cap_minutes),
        }
    }

    pub fn auto_close_after(&self) -> chrono::Duration {
        chrono::Duration::hours(self.auto_close_after_hours)
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }

    pub fn max_clock_skew(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.max_clock_skew_secs)
    }

    /// Period of the offline queue sweep.
    pub fn replay_interval(&self) -> Duration {
        Duration::from_secs(self.replay_interval_secs)
    }
}
