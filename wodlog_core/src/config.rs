//! Configuration file support for wodlog.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/wodlog/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub athlete: AthleteConfig,

    #[serde(default)]
    pub benchmarks: BenchmarkConfig,

    #[serde(default)]
    pub display: DisplayConfig,
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

impl DataConfig {
    pub fn results_path(&self) -> PathBuf {
        self.data_dir.join("results.jsonl")
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join("workouts.json")
    }
}

/// Who results are logged for
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AthleteConfig {
    #[serde(default = "default_athlete_id")]
    pub id: String,
}

impl Default for AthleteConfig {
    fn default() -> Self {
        Self {
            id: default_athlete_id(),
        }
    }
}

/// Benchmark workout names custom workouts may not reuse
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    #[serde(default = "default_benchmarks")]
    pub names: Vec<String>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            names: default_benchmarks(),
        }
    }
}

/// Presentation settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Shown next to weight scores; never stored
    #[serde(default = "default_weight_unit")]
    pub weight_unit: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            weight_unit: default_weight_unit(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_dir().join(".local/share"));
    base.join("wodlog")
}

fn default_athlete_id() -> String {
    "me".into()
}

fn default_benchmarks() -> Vec<String> {
    [
        "Amanda", "Angie", "Annie", "Barbara", "Chelsea", "Cindy", "Diane", "Elizabeth", "Eva",
        "Fran", "Grace", "Helen", "Isabel", "Jackie", "Karen", "Kelly", "Linda", "Mary", "Murph",
        "Nancy",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_weight_unit() -> String {
    "lb".into()
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
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
        let base = dirs::config_dir().unwrap_or_else(|| home_dir().join(".config"));
        base.join("wodlog").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
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

    fn validate(&self) -> Result<()> {
        if self.athlete.id.trim().is_empty() {
            return Err(Error::Config("athlete.id must not be empty".into()));
        }
        Ok(())
    }
}
