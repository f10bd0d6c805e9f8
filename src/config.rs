use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{ParameterOverrides, RadDatabase};
use crate::simulation::{PowerModel, DEFAULT_AREA_SCALE_M2};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub pvgis: PvgisConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub module: ParameterOverrides,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PvgisConfig {
    pub base_url: String,
    #[serde(default = "default_primary_database")]
    pub primary_database: RadDatabase,
    #[serde(default = "default_fallback_database")]
    pub fallback_database: RadDatabase,
    #[serde(default = "default_true")]
    pub use_horizon: bool,
    pub http_timeout_seconds: u64,
}

impl PvgisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }
}

impl Default for PvgisConfig {
    fn default() -> Self {
        Self {
            base_url: "https://re.jrc.ec.europa.eu/api/v5_2".to_string(),
            primary_database: default_primary_database(),
            fallback_database: default_fallback_database(),
            use_horizon: true,
            http_timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub directory: Option<PathBuf>,
}

impl CacheConfig {
    /// Cache directory when caching is enabled
    pub fn active_directory(&self) -> Option<&PathBuf> {
        self.directory.as_ref().filter(|_| self.enabled)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Systems simulated concurrently
    pub workers: usize,
    /// Square metres per unit of registered system area
    #[serde(default = "default_area_scale")]
    pub area_scale_m2: f64,
    pub registrations: PathBuf,
    pub output: PathBuf,
}

fn default_primary_database() -> RadDatabase {
    RadDatabase::PvgisSarah2
}

fn default_fallback_database() -> RadDatabase {
    RadDatabase::PvgisEra5
}

fn default_true() -> bool {
    true
}

fn default_area_scale() -> f64 {
    DEFAULT_AREA_SCALE_M2
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("FPV__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        if config.simulation.workers == 0 {
            anyhow::bail!("simulation.workers must be at least 1");
        }
        PowerModel::new(config.simulation.area_scale_m2).validate()?;
        Ok(config)
    }
}
