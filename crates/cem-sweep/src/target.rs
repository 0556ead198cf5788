//! What a sweep value changes in the network.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use cem_core::{CemError, Network};
use serde::{Deserialize, Serialize};

/// Network attribute a sweep writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    GeneratorCapitalCost,
    GeneratorMarginalCost,
    GeneratorPNomMax,
    StorageUnitCapitalCost,
    StorageUnitMaxHours,
    GlobalConstraintConstant,
}

impl Attribute {
    const ALL: [Attribute; 6] = [
        Attribute::GeneratorCapitalCost,
        Attribute::GeneratorMarginalCost,
        Attribute::GeneratorPNomMax,
        Attribute::StorageUnitCapitalCost,
        Attribute::StorageUnitMaxHours,
        Attribute::GlobalConstraintConstant,
    ];

    /// `(component, attribute)` as written in generic target strings.
    fn parts(&self) -> (&'static str, &'static str) {
        match self {
            Attribute::GeneratorCapitalCost => ("generator", "capital_cost"),
            Attribute::GeneratorMarginalCost => ("generator", "marginal_cost"),
            Attribute::GeneratorPNomMax => ("generator", "p_nom_max"),
            Attribute::StorageUnitCapitalCost => ("storage_unit", "capital_cost"),
            Attribute::StorageUnitMaxHours => ("storage_unit", "max_hours"),
            Attribute::GlobalConstraintConstant => ("global_constraint", "constant"),
        }
    }
}

/// A network attribute plus the factor from sweep units to network units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterTarget {
    pub attribute: Attribute,
    /// Component name
    pub component: String,
    /// Network value = sweep value * scale
    pub scale: f64,
    /// Identifier used in file names and logs
    pub id: String,
    pub title: String,
    pub x_label: String,
}

struct Preset {
    id: &'static str,
    component: &'static str,
    attribute: Attribute,
    scale: f64,
    title: &'static str,
    x_label: &'static str,
    values: &'static [f64],
}

const CO2_LIMIT: Preset = Preset {
    id: "co2-limit",
    component: "CO2Limit",
    attribute: Attribute::GlobalConstraintConstant,
    scale: 1e6,
    title: "Sensitivity on CO2 emissions",
    x_label: "CO2 emissions [Mt/a]",
    values: &[150.0, 0.0],
};

const SOLAR_COST: Preset = Preset {
    id: "solar-cost",
    component: "solar",
    attribute: Attribute::GeneratorCapitalCost,
    scale: 1e3,
    title: "Sensitivity on Solar Capital Cost",
    x_label: "Solar capital cost [k€/MW/a]",
    values: &[0.0, 20.0, 40.0, 60.0, 80.0, 100.0, 150.0],
};

const OFFWIND_POTENTIAL: Preset = Preset {
    id: "offwind-potential",
    component: "offwind",
    attribute: Attribute::GeneratorPNomMax,
    scale: 1e3,
    title: "Sensitivity on Offshore Wind Potential",
    x_label: "Offshore wind potential [GW]",
    values: &[0.0, 50.0, 100.0, 150.0],
};

const PRESETS: [&Preset; 3] = [&CO2_LIMIT, &SOLAR_COST, &OFFWIND_POTENTIAL];

impl ParameterTarget {
    /// Emissions cap `CO2Limit`, values in Mt/a.
    pub fn co2_limit() -> Self {
        Self::from_preset(&CO2_LIMIT)
    }

    /// Annualised capital cost of `solar`, values in k€/MW/a.
    pub fn solar_cost() -> Self {
        Self::from_preset(&SOLAR_COST)
    }

    /// Maximum capacity of `offwind`, values in GW.
    pub fn offwind_potential() -> Self {
        Self::from_preset(&OFFWIND_POTENTIAL)
    }

    fn from_preset(preset: &Preset) -> Self {
        Self {
            attribute: preset.attribute,
            component: preset.component.to_string(),
            scale: preset.scale,
            id: preset.id.to_string(),
            title: preset.title.to_string(),
            x_label: preset.x_label.to_string(),
        }
    }

    pub fn preset_ids() -> impl Iterator<Item = &'static str> {
        PRESETS.into_iter().map(|p| p.id)
    }

    /// Generic target with explicit scale.
    pub fn new(attribute: Attribute, component: impl Into<String>, scale: f64) -> Self {
        let component = component.into();
        let (kind, attr) = attribute.parts();
        Self {
            attribute,
            id: format!("{}-{}", component.replace(' ', "-"), attr.replace('_', "-")),
            title: format!("Sensitivity on {} {} {}", kind.replace('_', " "), component, attr),
            x_label: attr.to_string(),
            component,
            scale,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Candidate values of the built-in targets, in sweep units.
    pub fn default_values(&self) -> Option<Vec<f64>> {
        PRESETS
            .into_iter()
            .find(|p| p.id == self.id)
            .map(|p| p.values.to_vec())
    }

    /// Current network value, in network units.
    pub fn current(&self, network: &Network) -> Result<f64> {
        let missing = || self.missing();
        let value = match self.attribute {
            Attribute::GeneratorCapitalCost => {
                network.generator(&self.component).ok_or_else(missing)?.capital_cost
            }
            Attribute::GeneratorMarginalCost => {
                network.generator(&self.component).ok_or_else(missing)?.marginal_cost
            }
            Attribute::GeneratorPNomMax => {
                network.generator(&self.component).ok_or_else(missing)?.p_nom_max
            }
            Attribute::StorageUnitCapitalCost => {
                network.storage_unit(&self.component).ok_or_else(missing)?.capital_cost
            }
            Attribute::StorageUnitMaxHours => {
                network.storage_unit(&self.component).ok_or_else(missing)?.max_hours
            }
            Attribute::GlobalConstraintConstant => {
                network.global_constraint(&self.component).ok_or_else(missing)?.constant
            }
        };
        Ok(value)
    }

    /// Write a value in network units.
    pub fn set_raw(&self, network: &mut Network, raw: f64) -> Result<()> {
        if self.attribute == Attribute::StorageUnitMaxHours && raw <= 0.0 {
            bail!("max_hours of '{}' must be positive, got {}", self.component, raw);
        }
        let missing = || self.missing();
        let slot = match self.attribute {
            Attribute::GeneratorCapitalCost => {
                &mut network.generator_mut(&self.component).ok_or_else(missing)?.capital_cost
            }
            Attribute::GeneratorMarginalCost => {
                &mut network.generator_mut(&self.component).ok_or_else(missing)?.marginal_cost
            }
            Attribute::GeneratorPNomMax => {
                &mut network.generator_mut(&self.component).ok_or_else(missing)?.p_nom_max
            }
            Attribute::StorageUnitCapitalCost => {
                &mut network.storage_unit_mut(&self.component).ok_or_else(missing)?.capital_cost
            }
            Attribute::StorageUnitMaxHours => {
                &mut network.storage_unit_mut(&self.component).ok_or_else(missing)?.max_hours
            }
            Attribute::GlobalConstraintConstant => {
                &mut network
                    .global_constraint_mut(&self.component)
                    .ok_or_else(missing)?
                    .constant
            }
        };
        *slot = raw;
        Ok(())
    }

    /// Set `value * scale` and return the previous network value.
    pub fn apply(&self, network: &mut Network, value: f64) -> Result<f64> {
        let previous = self.current(network)?;
        self.set_raw(network, value * self.scale)?;
        Ok(previous)
    }

    fn missing(&self) -> anyhow::Error {
        let (kind, _) = self.attribute.parts();
        CemError::NotFound(format!("{} '{}'", kind.replace('_', " "), self.component)).into()
    }
}

impl fmt::Display for ParameterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, attr) = self.attribute.parts();
        write!(f, "{}:{}:{}", kind, self.component, attr)
    }
}

/// Preset id (`co2-limit`, `solar-cost`, `offwind-potential`) or
/// `<component kind>:<name>:<attribute>` with scale 1.
impl FromStr for ParameterTarget {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(preset) = PRESETS.into_iter().find(|p| p.id == s) {
            return Ok(Self::from_preset(preset));
        }
        let mut parts = s.splitn(3, ':');
        let (Some(kind), Some(name), Some(attr)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(unknown_target(s));
        };
        let attribute = Attribute::ALL
            .into_iter()
            .find(|a| a.parts() == (kind, attr))
            .ok_or_else(|| unknown_target(s))?;
        if name.is_empty() {
            bail!("target '{}' has no component name", s);
        }
        Ok(Self::new(attribute, name, 1.0))
    }
}

fn unknown_target(s: &str) -> anyhow::Error {
    let presets: Vec<&str> = ParameterTarget::preset_ids().collect();
    anyhow!(
        "unknown sweep parameter '{}'; use one of {} or <kind>:<name>:<attribute>",
        s,
        presets.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cem_core::{Bus, Carrier, Generator, GlobalConstraint};

    fn network() -> Network {
        let mut network = Network::new();
        network.add_bus(Bus::new("electricity")).unwrap();
        network.add_carrier(Carrier::new("solar")).unwrap();
        network
            .add_generator(
                Generator::new("solar", "electricity", "solar")
                    .extendable()
                    .with_costs(40_000.0, 0.0),
            )
            .unwrap();
        network
            .add_global_constraint(GlobalConstraint::co2_limit("CO2Limit", 0.0))
            .unwrap();
        network
    }

    #[test]
    fn presets_scale_into_network_units() {
        let mut net = network();
        let previous = ParameterTarget::co2_limit().apply(&mut net, 150.0).unwrap();
        assert_eq!(previous, 0.0);
        assert_eq!(net.global_constraint("CO2Limit").unwrap().constant, 150e6);

        let previous = ParameterTarget::solar_cost().apply(&mut net, 20.0).unwrap();
        assert_eq!(previous, 40_000.0);
        assert_eq!(net.generator("solar").unwrap().capital_cost, 20_000.0);
    }

    #[test]
    fn missing_component_is_not_found() {
        let mut net = network();
        let err = ParameterTarget::offwind_potential()
            .apply(&mut net, 50.0)
            .unwrap_err();
        assert!(err.to_string().contains("offwind"));
        assert!(err.downcast_ref::<CemError>().is_some());
    }

    #[test]
    fn parses_presets_and_generic_targets() {
        let t: ParameterTarget = "solar-cost".parse().unwrap();
        assert_eq!(t, ParameterTarget::solar_cost());
        assert_eq!(t.default_values().unwrap().len(), 7);

        let t: ParameterTarget = "storage_unit:battery storage:max_hours".parse().unwrap();
        assert_eq!(t.attribute, Attribute::StorageUnitMaxHours);
        assert_eq!(t.component, "battery storage");
        assert_eq!(t.scale, 1.0);
        assert_eq!(t.to_string(), "storage_unit:battery storage:max_hours");
        assert!(t.default_values().is_none());

        assert!("generator:solar:colour".parse::<ParameterTarget>().is_err());
        assert!("wind".parse::<ParameterTarget>().is_err());
    }
}
