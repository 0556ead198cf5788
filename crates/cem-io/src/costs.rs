//! Technology cost tables.
//!
//! Input is the long format published by the technology-data project: one row
//! per `(technology, parameter)` with `value` and `unit` columns. Loading
//! normalises `/kW` units to `/MW`, pivots to one record per technology,
//! fills defaults, lets gas turbines inherit fuel data from `gas`, and derives
//! annualised capital cost and marginal cost.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use cem_core::{Category, CemError, CemResult, Diagnostics};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// URL of the published cost table for a given year.
pub fn technology_data_url(year: u16) -> String {
    format!(
        "https://raw.githubusercontent.com/PyPSA/technology-data/master/outputs/costs_{}.csv",
        year
    )
}

/// Technologies that take their fuel price and emission factor from `gas`.
pub const GAS_TURBINES: [&str; 2] = ["OCGT", "CCGT"];

/// Annuity factor for discount rate `r` over `n` years.
///
/// Converts an overnight investment into the equal yearly payment that repays
/// it over the lifetime. For `r == 0` this is `1 / n`.
pub fn annuity(r: f64, n: f64) -> f64 {
    if r == 0.0 {
        1.0 / n
    } else {
        r / (1.0 - 1.0 / (1.0 + r).powf(n))
    }
}

/// Values used for parameters a technology does not list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CostDefaults {
    /// Fixed O&M (% of investment per year)
    pub fom: f64,
    /// Variable O&M (EUR/MWh)
    pub vom: f64,
    pub efficiency: f64,
    /// Fuel price (EUR/MWh_th)
    pub fuel: f64,
    /// Overnight investment (EUR/MW)
    pub investment: f64,
    /// Lifetime (years)
    pub lifetime: f64,
    /// Emission factor (tCO2/MWh_th)
    pub co2_intensity: f64,
    pub discount_rate: f64,
}

impl Default for CostDefaults {
    fn default() -> Self {
        Self {
            fom: 0.0,
            vom: 0.0,
            efficiency: 1.0,
            fuel: 0.0,
            investment: 0.0,
            lifetime: 25.0,
            co2_intensity: 0.0,
            discount_rate: 0.07,
        }
    }
}

/// Processed costs of one technology.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnologyCosts {
    pub technology: String,
    pub fom: f64,
    pub vom: f64,
    pub efficiency: f64,
    pub fuel: f64,
    pub investment: f64,
    pub lifetime: f64,
    pub co2_intensity: f64,
    pub discount_rate: f64,
    /// Annualised investment plus fixed O&M (EUR/MW/a)
    pub capital_cost: f64,
    /// Variable O&M plus fuel per unit of output (EUR/MWh)
    pub marginal_cost: f64,
    /// Every parameter as given in the table, after unit normalisation
    #[serde(skip)]
    pub parameters: BTreeMap<String, f64>,
}

impl TechnologyCosts {
    fn from_parameters(
        technology: &str,
        parameters: BTreeMap<String, f64>,
        defaults: &CostDefaults,
    ) -> Self {
        let param = |name: &str, default: f64| parameters.get(name).copied().unwrap_or(default);
        let mut costs = Self {
            technology: technology.to_string(),
            fom: param("FOM", defaults.fom),
            vom: param("VOM", defaults.vom),
            efficiency: param("efficiency", defaults.efficiency),
            fuel: param("fuel", defaults.fuel),
            investment: param("investment", defaults.investment),
            lifetime: param("lifetime", defaults.lifetime),
            co2_intensity: param("CO2 intensity", defaults.co2_intensity),
            discount_rate: param("discount rate", defaults.discount_rate),
            capital_cost: 0.0,
            marginal_cost: 0.0,
            parameters,
        };
        costs.derive();
        costs
    }

    fn derive(&mut self) {
        self.capital_cost =
            (annuity(self.discount_rate, self.lifetime) + self.fom / 100.0) * self.investment;
        self.marginal_cost = self.vom + self.fuel / self.efficiency;
    }

    /// A raw parameter such as `"investment"` or `"efficiency-heat"`.
    pub fn parameter(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).copied()
    }
}

#[derive(Debug, Deserialize)]
struct CostRecord {
    technology: String,
    parameter: String,
    value: Option<String>,
    #[serde(default)]
    unit: Option<String>,
}

/// Processed cost table, keyed by technology name.
#[derive(Debug, Clone, Default)]
pub struct CostTable {
    technologies: BTreeMap<String, TechnologyCosts>,
    /// Rows skipped while loading
    pub diagnostics: Diagnostics,
}

impl CostTable {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("opening cost table {}", path.display()))?;
        Self::from_reader(file, &CostDefaults::default())
            .with_context(|| format!("reading cost table {}", path.display()))
    }

    pub fn from_reader<R: Read>(reader: R, defaults: &CostDefaults) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let mut diagnostics = Diagnostics::new();
        let mut raw: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();

        for (idx, record) in rdr.deserialize::<CostRecord>().enumerate() {
            // Header is line 1
            let line = idx + 2;
            let record = record.with_context(|| format!("parsing cost record at line {}", line))?;
            let Some(text) = record.value.as_deref().filter(|v| !v.is_empty()) else {
                continue;
            };
            let mut value: f64 = match text.parse() {
                Ok(v) => v,
                Err(_) => {
                    diagnostics
                        .error(
                            Category::Parse,
                            format!(
                                "non-numeric value '{}' for {} / {}",
                                text, record.technology, record.parameter
                            ),
                        )
                        .at_line(line);
                    continue;
                }
            };
            if record.unit.as_deref().is_some_and(|u| u.contains("/kW")) {
                value *= 1e3;
            }
            let previous = raw
                .entry(record.technology.clone())
                .or_default()
                .insert(record.parameter.clone(), value);
            if previous.is_some() {
                diagnostics
                    .warn(
                        Category::Duplicate,
                        format!("parameter '{}' listed twice, keeping line {}", record.parameter, line),
                    )
                    .on(&record.technology);
            }
        }

        if raw.is_empty() {
            return Err(CemError::Parse("cost table contains no values".into()).into());
        }
        if !diagnostics.is_empty() {
            warn!("cost table: {}", diagnostics.summary());
        }

        let mut technologies: BTreeMap<String, TechnologyCosts> = raw
            .into_iter()
            .map(|(tech, params)| {
                let costs = TechnologyCosts::from_parameters(&tech, params, defaults);
                (tech, costs)
            })
            .collect();

        if let Some(gas) = technologies.get("gas").cloned() {
            for turbine in GAS_TURBINES {
                if let Some(costs) = technologies.get_mut(turbine) {
                    costs.fuel = gas.fuel;
                    costs.co2_intensity = gas.co2_intensity;
                    costs.derive();
                }
            }
        }

        debug!(technologies = technologies.len(), "processed cost table");
        Ok(Self {
            technologies,
            diagnostics,
        })
    }

    /// Costs of `technology`, or a `NotFound` error naming it.
    pub fn get(&self, technology: &str) -> CemResult<&TechnologyCosts> {
        self.technologies
            .get(technology)
            .ok_or_else(|| CemError::NotFound(format!("technology '{}' in cost table", technology)))
    }

    pub fn contains(&self, technology: &str) -> bool {
        self.technologies.contains_key(technology)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TechnologyCosts> {
        self.technologies.values()
    }

    pub fn len(&self) -> usize {
        self.technologies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.technologies.is_empty()
    }

    /// Insert or replace a technology, e.g. for scenario overrides.
    pub fn insert(&mut self, costs: TechnologyCosts) {
        self.technologies.insert(costs.technology.clone(), costs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
technology,parameter,value,unit,source,further description
OCGT,investment,450,EUR/kWel,DEA,
OCGT,FOM,1.8,%/year,DEA,
OCGT,VOM,4.5,EUR/MWh,DEA,
OCGT,efficiency,0.4,per unit,DEA,
OCGT,lifetime,25,years,DEA,
gas,fuel,21.6,EUR/MWh_th,JRC,
gas,CO2 intensity,0.198,tCO2/MWh_th,Stoichiometric,
solar,investment,400,EUR/kW,,
solar,lifetime,40,years,,
solar,discount rate,0,per unit,,
battery storage,investment,150,EUR/kWh,,
electrolysis,efficiency,n/a,per unit,,
";

    fn table() -> CostTable {
        CostTable::from_reader(TABLE.as_bytes(), &CostDefaults::default()).unwrap()
    }

    #[test]
    fn kw_units_are_scaled_to_mw() {
        let costs = table();
        assert_eq!(costs.get("OCGT").unwrap().investment, 450_000.0);
        // Also applies to /kWh
        assert_eq!(costs.get("battery storage").unwrap().investment, 150_000.0);
        // Units without /kW are untouched
        assert_eq!(costs.get("OCGT").unwrap().vom, 4.5);
    }

    #[test]
    fn missing_parameters_use_defaults() {
        let battery = table().get("battery storage").unwrap().clone();
        assert_eq!(battery.fom, 0.0);
        assert_eq!(battery.efficiency, 1.0);
        assert_eq!(battery.lifetime, 25.0);
        assert_eq!(battery.discount_rate, 0.07);
        assert_eq!(battery.marginal_cost, 0.0);
    }

    #[test]
    fn gas_turbines_inherit_fuel_and_emissions() {
        let ocgt = table().get("OCGT").unwrap().clone();
        assert_eq!(ocgt.fuel, 21.6);
        assert_eq!(ocgt.co2_intensity, 0.198);
        assert!((ocgt.marginal_cost - (4.5 + 21.6 / 0.4)).abs() < 1e-9);
    }

    #[test]
    fn capital_cost_uses_annuity_and_fom() {
        let ocgt = table().get("OCGT").unwrap().clone();
        let expected = (annuity(0.07, 25.0) + 0.018) * 450_000.0;
        assert!((ocgt.capital_cost - expected).abs() < 1e-6);
    }

    #[test]
    fn zero_discount_rate_is_straight_line() {
        assert_eq!(annuity(0.0, 40.0), 0.025);
        let solar = table().get("solar").unwrap().clone();
        assert!((solar.capital_cost - 400_000.0 / 40.0).abs() < 1e-9);
    }

    #[test]
    fn annuity_matches_closed_form() {
        // 7 % over 25 years
        assert!((annuity(0.07, 25.0) - 0.085_810_5).abs() < 1e-6);
    }

    #[test]
    fn non_numeric_values_are_reported() {
        let costs = table();
        assert_eq!(costs.diagnostics.error_count(), 1);
        assert_eq!(costs.diagnostics.issues[0].line, Some(13));
        // Row skipped, technology absent
        assert!(!costs.contains("electrolysis"));
    }

    #[test]
    fn missing_technology_is_named() {
        let err = table().get("fuel cell").unwrap_err();
        assert!(err.to_string().contains("fuel cell"));
    }

    #[test]
    fn empty_table_is_an_error() {
        let header = "technology,parameter,value,unit,source,further description\n";
        assert!(CostTable::from_reader(header.as_bytes(), &CostDefaults::default()).is_err());
    }
}
