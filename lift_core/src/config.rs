//! Configuration file support for liftweek.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/liftweek/config.toml`.

use crate::history::DEFAULT_PAGE_SIZE;
use crate::recorder::SessionDefaults;
use crate::{Error, Result, UserId, WeightUnit};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub user: UserConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub history: HistoryConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Identity used when no `--user` is given
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_user: Option<String>,
}

/// Logging-session defaults
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_sets")]
    pub default_sets: u32,

    #[serde(default = "default_reps")]
    pub default_reps: u32,

    #[serde(default)]
    pub default_weight: f64,

    #[serde(default)]
    pub default_unit: WeightUnit,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_sets: default_sets(),
            default_reps: default_reps(),
            default_weight: 0.0,
            default_unit: WeightUnit::Kg,
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// History paging
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("liftweek")
}

fn default_sets() -> u32 {
    3
}

fn default_reps() -> u32 {
    10
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("liftweek")
            .join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reject values that parse but make no sense
    pub fn validate(&self) -> Result<()> {
        let session = &self.session;
        if session.default_sets == 0 || session.default_reps == 0 {
            return Err(Error::Config(
                "session.default_sets and session.default_reps must be at least 1".into(),
            ));
        }
        if !session.default_weight.is_finite() || session.default_weight < 0.0 {
            return Err(Error::Config(format!(
                "session.default_weight must be non-negative, got {}",
                session.default_weight
            )));
        }
        if session.tick_interval_ms == 0 {
            return Err(Error::Config("session.tick_interval_ms must be positive".into()));
        }
        if self.history.page_size == 0 {
            return Err(Error::Config("history.page_size must be positive".into()));
        }
        self.default_user()?;
        Ok(())
    }

    /// The configured default user, if any
    pub fn default_user(&self) -> Result<Option<UserId>> {
        self.user
            .default_user
            .as_deref()
            .map(|id| {
                UserId::new(id)
                    .map_err(|_| Error::Config(format!("user.default_user {:?} is not a valid id", id)))
            })
            .transpose()
    }

    pub fn session_defaults(&self) -> SessionDefaults {
        SessionDefaults {
            sets: self.session.default_sets,
            reps: self.session.default_reps,
            weight: self.session.default_weight,
            unit: self.session.default_unit,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.session.tick_interval_ms)
    }
}
