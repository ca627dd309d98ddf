use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::error::ConfigError;
use crate::pool::DEFAULT_POOL_SIZE;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub time_budget_secs: u32,
    pub penalty_secs: u32,
    /// Seconds added when a random pool number is removed; negative values
    /// turn the removal into a penalty.
    pub removal_bonus_secs: i32,
    pub rounds: usize,
    pub pool_size: u64,
    pub target_min: i64,
    pub target_max: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_budget_secs: 300,
            penalty_secs: 20,
            removal_bonus_secs: 10,
            rounds: 40,
            pool_size: DEFAULT_POOL_SIZE,
            target_min: 10,
            target_max: 999,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_budget_secs == 0 {
            return Err(ConfigError::Invalid("time budget must be at least 1 second".into()));
        }
        if self.rounds == 0 {
            return Err(ConfigError::Invalid("at least one round is required".into()));
        }
        if !(1..=DEFAULT_POOL_SIZE).contains(&self.pool_size) {
            return Err(ConfigError::Invalid(format!(
                "pool size must be between 1 and {DEFAULT_POOL_SIZE}"
            )));
        }
        if self.target_min > self.target_max {
            return Err(ConfigError::Invalid(format!(
                "target range {}..={} is empty",
                self.target_min, self.target_max
            )));
        }
        Ok(())
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Config, ConfigError> {
        let bytes = fs::read(&self.path)?;
        let cfg = serde_json::from_slice::<Config>(&bytes)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if !self.path.exists() {
            return Config::default();
        }
        match self.read() {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring config file");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<(), ConfigError> {
        cfg.validate()?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
