//! Component records attached to a [`Network`](crate::Network).
//!
//! Attribute names follow the usual energy-system modelling vocabulary:
//! `p_nom` is nominal power (MW), `e_nom` nominal energy (MWh), `*_pu`
//! values are per unit of the nominal rating, capital costs are annualised
//! (€/MW/a or €/MWh/a) and marginal costs are €/MWh.

use serde::{Deserialize, Serialize};

use crate::Series;

/// Upper bounds that default to +inf. JSON has no infinity, so they are
/// written as `null` and read back from `null` or a missing field.
mod unbounded {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

fn default_one() -> f64 {
    1.0
}

fn default_infinity() -> f64 {
    f64::INFINITY
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub name: String,
    #[serde(default)]
    pub carrier: String,
}

impl Bus {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            carrier: "AC".to_string(),
        }
    }

    pub fn with_carrier(mut self, carrier: impl Into<String>) -> Self {
        self.carrier = carrier.into();
        self
    }
}

/// Energy carrier or technology label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carrier {
    pub name: String,
    /// Display colour (CSS name or hex)
    #[serde(default)]
    pub color: Option<String>,
    /// Emissions of the primary energy in tCO2/MWh_th
    #[serde(default)]
    pub co2_emissions: f64,
}

impl Carrier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
            co2_emissions: 0.0,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_co2_emissions(mut self, co2: f64) -> Self {
        self.co2_emissions = co2;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub name: String,
    pub bus: String,
    #[serde(default)]
    pub carrier: String,
    /// Installed capacity (MW); the lower bound when extendable
    #[serde(default)]
    pub p_nom: f64,
    #[serde(default)]
    pub p_nom_extendable: bool,
    #[serde(default)]
    pub p_nom_min: f64,
    #[serde(default = "default_infinity", with = "unbounded")]
    pub p_nom_max: f64,
    #[serde(default)]
    pub p_min_pu: Series,
    #[serde(default = "Generator::default_p_max_pu")]
    pub p_max_pu: Series,
    #[serde(default)]
    pub capital_cost: f64,
    #[serde(default)]
    pub marginal_cost: f64,
    /// Electrical output per unit of primary energy
    #[serde(default = "default_one")]
    pub efficiency: f64,
}

impl Generator {
    fn default_p_max_pu() -> Series {
        Series::Static(1.0)
    }

    pub fn new(name: impl Into<String>, bus: impl Into<String>, carrier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bus: bus.into(),
            carrier: carrier.into(),
            p_nom: 0.0,
            p_nom_extendable: false,
            p_nom_min: 0.0,
            p_nom_max: f64::INFINITY,
            p_min_pu: Series::Static(0.0),
            p_max_pu: Series::Static(1.0),
            capital_cost: 0.0,
            marginal_cost: 0.0,
            efficiency: 1.0,
        }
    }

    pub fn with_p_nom(mut self, p_nom: f64) -> Self {
        self.p_nom = p_nom;
        self
    }

    pub fn extendable(mut self) -> Self {
        self.p_nom_extendable = true;
        self
    }

    pub fn with_p_nom_max(mut self, p_nom_max: f64) -> Self {
        self.p_nom_max = p_nom_max;
        self
    }

    pub fn with_p_max_pu(mut self, p_max_pu: impl Into<Series>) -> Self {
        self.p_max_pu = p_max_pu.into();
        self
    }

    pub fn with_costs(mut self, capital_cost: f64, marginal_cost: f64) -> Self {
        self.capital_cost = capital_cost;
        self.marginal_cost = marginal_cost;
        self
    }

    pub fn with_efficiency(mut self, efficiency: f64) -> Self {
        self.efficiency = efficiency;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Load {
    pub name: String,
    pub bus: String,
    #[serde(default)]
    pub carrier: String,
    /// Demand (MW)
    pub p_set: Series,
}

impl Load {
    pub fn new(name: impl Into<String>, bus: impl Into<String>, p_set: impl Into<Series>) -> Self {
        Self {
            name: name.into(),
            bus: bus.into(),
            carrier: String::new(),
            p_set: p_set.into(),
        }
    }
}

/// Storage with a fixed energy-to-power ratio (`max_hours`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageUnit {
    pub name: String,
    pub bus: String,
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub p_nom: f64,
    #[serde(default)]
    pub p_nom_extendable: bool,
    #[serde(default)]
    pub p_nom_min: f64,
    #[serde(default = "default_infinity", with = "unbounded")]
    pub p_nom_max: f64,
    /// Energy capacity in hours at nominal power
    #[serde(default = "default_one")]
    pub max_hours: f64,
    /// €/MW/a, covering both power and `max_hours` of energy
    #[serde(default)]
    pub capital_cost: f64,
    /// €/MWh dispatched
    #[serde(default)]
    pub marginal_cost: f64,
    #[serde(default = "default_one")]
    pub efficiency_store: f64,
    #[serde(default = "default_one")]
    pub efficiency_dispatch: f64,
    /// Fraction of the state of charge lost per hour
    #[serde(default)]
    pub standing_loss: f64,
    #[serde(default)]
    pub cyclic_state_of_charge: bool,
    /// MWh at the start of the horizon when not cyclic
    #[serde(default)]
    pub state_of_charge_initial: f64,
}

impl StorageUnit {
    pub fn new(name: impl Into<String>, bus: impl Into<String>, carrier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bus: bus.into(),
            carrier: carrier.into(),
            p_nom: 0.0,
            p_nom_extendable: false,
            p_nom_min: 0.0,
            p_nom_max: f64::INFINITY,
            max_hours: 1.0,
            capital_cost: 0.0,
            marginal_cost: 0.0,
            efficiency_store: 1.0,
            efficiency_dispatch: 1.0,
            standing_loss: 0.0,
            cyclic_state_of_charge: false,
            state_of_charge_initial: 0.0,
        }
    }

    pub fn extendable(mut self) -> Self {
        self.p_nom_extendable = true;
        self
    }

    pub fn with_max_hours(mut self, hours: f64) -> Self {
        self.max_hours = hours;
        self
    }

    pub fn with_capital_cost(mut self, capital_cost: f64) -> Self {
        self.capital_cost = capital_cost;
        self
    }

    pub fn with_efficiencies(mut self, store: f64, dispatch: f64) -> Self {
        self.efficiency_store = store;
        self.efficiency_dispatch = dispatch;
        self
    }

    pub fn cyclic(mut self) -> Self {
        self.cyclic_state_of_charge = true;
        self
    }
}

/// Energy store with independently sized energy capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub name: String,
    pub bus: String,
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub e_nom: f64,
    #[serde(default)]
    pub e_nom_extendable: bool,
    #[serde(default)]
    pub e_nom_min: f64,
    #[serde(default = "default_infinity", with = "unbounded")]
    pub e_nom_max: f64,
    #[serde(default)]
    pub e_min_pu: Series,
    #[serde(default = "Store::default_e_max_pu")]
    pub e_max_pu: Series,
    /// €/MWh/a
    #[serde(default)]
    pub capital_cost: f64,
    /// €/MWh withdrawn
    #[serde(default)]
    pub marginal_cost: f64,
    #[serde(default)]
    pub standing_loss: f64,
    #[serde(default)]
    pub e_cyclic: bool,
    #[serde(default)]
    pub e_initial: f64,
}

impl Store {
    fn default_e_max_pu() -> Series {
        Series::Static(1.0)
    }

    pub fn new(name: impl Into<String>, bus: impl Into<String>, carrier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bus: bus.into(),
            carrier: carrier.into(),
            e_nom: 0.0,
            e_nom_extendable: false,
            e_nom_min: 0.0,
            e_nom_max: f64::INFINITY,
            e_min_pu: Series::Static(0.0),
            e_max_pu: Series::Static(1.0),
            capital_cost: 0.0,
            marginal_cost: 0.0,
            standing_loss: 0.0,
            e_cyclic: false,
            e_initial: 0.0,
        }
    }

    pub fn extendable(mut self) -> Self {
        self.e_nom_extendable = true;
        self
    }

    pub fn cyclic(mut self) -> Self {
        self.e_cyclic = true;
        self
    }

    pub fn with_capital_cost(mut self, capital_cost: f64) -> Self {
        self.capital_cost = capital_cost;
        self
    }
}

/// Controllable one-way conversion from `bus0` to `bus1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub name: String,
    pub bus0: String,
    pub bus1: String,
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub p_nom: f64,
    #[serde(default)]
    pub p_nom_extendable: bool,
    #[serde(default)]
    pub p_nom_min: f64,
    #[serde(default = "default_infinity", with = "unbounded")]
    pub p_nom_max: f64,
    #[serde(default)]
    pub p_min_pu: Series,
    #[serde(default = "Link::default_p_max_pu")]
    pub p_max_pu: Series,
    /// Output at `bus1` per unit drawn from `bus0`
    #[serde(default = "Link::default_efficiency")]
    pub efficiency: Series,
    /// €/MW/a of input capacity
    #[serde(default)]
    pub capital_cost: f64,
    /// €/MWh drawn from `bus0`
    #[serde(default)]
    pub marginal_cost: f64,
}

impl Link {
    fn default_p_max_pu() -> Series {
        Series::Static(1.0)
    }

    fn default_efficiency() -> Series {
        Series::Static(1.0)
    }

    pub fn new(
        name: impl Into<String>,
        bus0: impl Into<String>,
        bus1: impl Into<String>,
        carrier: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            bus0: bus0.into(),
            bus1: bus1.into(),
            carrier: carrier.into(),
            p_nom: 0.0,
            p_nom_extendable: false,
            p_nom_min: 0.0,
            p_nom_max: f64::INFINITY,
            p_min_pu: Series::Static(0.0),
            p_max_pu: Series::Static(1.0),
            efficiency: Series::Static(1.0),
            capital_cost: 0.0,
            marginal_cost: 0.0,
        }
    }

    pub fn extendable(mut self) -> Self {
        self.p_nom_extendable = true;
        self
    }

    pub fn with_efficiency(mut self, efficiency: impl Into<Series>) -> Self {
        self.efficiency = efficiency.into();
        self
    }

    pub fn with_capital_cost(mut self, capital_cost: f64) -> Self {
        self.capital_cost = capital_cost;
        self
    }
}

/// Bidirectional transmission corridor (transport model, no impedance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub name: String,
    pub bus0: String,
    pub bus1: String,
    /// Thermal rating (MVA, treated as MW)
    #[serde(default)]
    pub s_nom: f64,
    #[serde(default)]
    pub s_nom_extendable: bool,
    #[serde(default)]
    pub s_nom_min: f64,
    #[serde(default = "default_infinity", with = "unbounded")]
    pub s_nom_max: f64,
    #[serde(default = "default_one")]
    pub s_max_pu: f64,
    #[serde(default)]
    pub capital_cost: f64,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Line {
    pub fn new(name: impl Into<String>, bus0: impl Into<String>, bus1: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bus0: bus0.into(),
            bus1: bus1.into(),
            s_nom: 0.0,
            s_nom_extendable: false,
            s_nom_min: 0.0,
            s_nom_max: f64::INFINITY,
            s_max_pu: 1.0,
            capital_cost: 0.0,
            active: true,
        }
    }

    pub fn with_s_nom(mut self, s_nom: f64) -> Self {
        self.s_nom = s_nom;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintSense {
    #[serde(rename = "<=")]
    LessEqual,
    #[serde(rename = ">=")]
    GreaterEqual,
    #[serde(rename = "==")]
    Equal,
}

impl ConstraintSense {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintSense::LessEqual => "<=",
            ConstraintSense::GreaterEqual => ">=",
            ConstraintSense::Equal => "==",
        }
    }
}

impl std::str::FromStr for ConstraintSense {
    type Err = crate::CemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<=" => Ok(ConstraintSense::LessEqual),
            ">=" => Ok(ConstraintSense::GreaterEqual),
            "==" | "=" => Ok(ConstraintSense::Equal),
            other => Err(crate::CemError::Parse(format!(
                "unknown constraint sense '{other}'; use <=, >= or =="
            ))),
        }
    }
}

/// System-wide constraint on a carrier attribute, e.g. an emissions cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalConstraint {
    pub name: String,
    /// Carrier attribute summed over primary energy use (`co2_emissions`)
    pub carrier_attribute: String,
    pub sense: ConstraintSense,
    /// Right-hand side (tCO2/a for `co2_emissions`)
    pub constant: f64,
}

impl GlobalConstraint {
    pub const CO2_EMISSIONS: &'static str = "co2_emissions";

    pub fn co2_limit(name: impl Into<String>, limit: f64) -> Self {
        Self {
            name: name.into(),
            carrier_attribute: Self::CO2_EMISSIONS.to_string(),
            sense: ConstraintSense::LessEqual,
            constant: limit,
        }
    }
}
