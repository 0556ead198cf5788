//! Model configuration, read from TOML.
//!
//! Every section and field is optional; defaults reproduce the reference
//! single-node model: 2030 costs, 4-hour resolution, load in GW scaled to MW,
//! onshore/offshore wind, solar and OCGT, battery (6 h) and underground
//! hydrogen (168 h) storage, and a zero CO2 cap.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TIMESERIES_URL: &str =
    "https://tubcloud.tu-berlin.de/s/pKttFadrbTKSJKF/download/time-series-lecture-2.csv";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub co2: Co2Config,
    #[serde(default)]
    pub solver: SolverSettings,
}

impl ModelConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: ModelConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.data.resolution_hours > 0.0) {
            bail!("data.resolution_hours must be positive");
        }
        if self.storage.battery.max_hours <= 0.0 || self.storage.hydrogen.max_hours <= 0.0 {
            bail!("storage max_hours must be positive");
        }
        if let Some(limit) = self.co2.limit {
            if !limit.is_finite() {
                bail!("co2.limit must be finite");
            }
        }
        for tech in self
            .network
            .renewables
            .iter()
            .chain(&self.network.dispatchable)
        {
            if self.network.carrier(tech).is_none() {
                bail!("technology '{}' has no entry in network.carriers", tech);
            }
        }
        Ok(())
    }

    /// Cost table location: explicit source, else the published table for
    /// `cost_year`.
    pub fn costs_source(&self) -> String {
        self.data
            .costs
            .clone()
            .unwrap_or_else(|| cem_io::costs::technology_data_url(self.data.cost_year))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_cost_year")]
    pub cost_year: u16,
    /// Path or URL of the cost table; derived from `cost_year` when unset
    #[serde(default)]
    pub costs: Option<String>,
    /// Path or URL of the time-series CSV
    #[serde(default = "default_timeseries")]
    pub timeseries: String,
    /// Target resolution after resampling (hours)
    #[serde(default = "default_resolution")]
    pub resolution_hours: f64,
    /// Factor applied to the load column (GW to MW by default)
    #[serde(default = "default_load_scale")]
    pub load_scale: f64,
    #[serde(default = "default_load_column")]
    pub load_column: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            cost_year: default_cost_year(),
            costs: None,
            timeseries: default_timeseries(),
            resolution_hours: default_resolution(),
            load_scale: default_load_scale(),
            load_column: default_load_column(),
        }
    }
}

fn default_cost_year() -> u16 {
    2030
}

fn default_timeseries() -> String {
    DEFAULT_TIMESERIES_URL.to_string()
}

fn default_resolution() -> f64 {
    4.0
}

fn default_load_scale() -> f64 {
    1e3
}

fn default_load_column() -> String {
    "load".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierStyle {
    pub name: String,
    pub color: String,
}

impl CarrierStyle {
    fn new(name: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            color: color.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_bus")]
    pub bus: String,
    /// Carriers with plot colours; emissions come from the cost table
    #[serde(default = "default_carriers")]
    pub carriers: Vec<CarrierStyle>,
    /// Extendable generators whose availability is the time-series column of the same name
    #[serde(default = "default_renewables")]
    pub renewables: Vec<String>,
    /// Extendable generators always available
    #[serde(default = "default_dispatchable")]
    pub dispatchable: Vec<String>,
    /// Snapshot weighting (hours); the resampled resolution when unset
    #[serde(default)]
    pub snapshot_weighting: Option<f64>,
}

impl NetworkConfig {
    pub fn carrier(&self, name: &str) -> Option<&CarrierStyle> {
        self.carriers.iter().find(|c| c.name == name)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bus: default_bus(),
            carriers: default_carriers(),
            renewables: default_renewables(),
            dispatchable: default_dispatchable(),
            snapshot_weighting: None,
        }
    }
}

fn default_bus() -> String {
    "electricity".to_string()
}

fn default_carriers() -> Vec<CarrierStyle> {
    vec![
        CarrierStyle::new("onwind", "dodgerblue"),
        CarrierStyle::new("offwind", "aquamarine"),
        CarrierStyle::new("solar", "gold"),
        CarrierStyle::new("OCGT", "indianred"),
        CarrierStyle::new("hydrogen storage underground", "magenta"),
        CarrierStyle::new("battery storage", "yellowgreen"),
    ]
}

fn default_renewables() -> Vec<String> {
    vec!["onwind".into(), "offwind".into(), "solar".into()]
}

fn default_dispatchable() -> Vec<String> {
    vec!["OCGT".into()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_battery")]
    pub battery: StorageTechConfig,
    #[serde(default = "default_hydrogen")]
    pub hydrogen: StorageTechConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            battery: default_battery(),
            hydrogen: default_hydrogen(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageTechConfig {
    /// Energy to power ratio (hours at full output)
    pub max_hours: f64,
}

fn default_true() -> bool {
    true
}

fn default_battery() -> StorageTechConfig {
    StorageTechConfig { max_hours: 6.0 }
}

fn default_hydrogen() -> StorageTechConfig {
    StorageTechConfig { max_hours: 168.0 }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Co2Config {
    /// Annual cap (tCO2); no constraint when absent
    #[serde(default = "default_co2_limit")]
    pub limit: Option<f64>,
}

impl Default for Co2Config {
    fn default() -> Self {
        Self {
            limit: default_co2_limit(),
        }
    }
}

fn default_co2_limit() -> Option<f64> {
    Some(0.0)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverSettings {
    #[serde(default = "default_lp_solver")]
    pub lp: String,
    /// Solve once without storage and CO2 cap before the main solve
    #[serde(default)]
    pub baseline: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            lp: default_lp_solver(),
            baseline: false,
        }
    }
}

fn default_lp_solver() -> String {
    "clarabel".to_string()
}
