//! Capacity-expansion solution data structures.

use std::collections::BTreeMap;
use std::time::Duration;

use cem_core::{Megawatts, TonnesCo2};
use serde::{Deserialize, Serialize};

/// Optimal capacity and per-snapshot flow of a generator, link or line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchResult {
    /// Optimal nominal capacity (MW)
    pub p_nom_opt: f64,
    /// Output per snapshot (MW). For links this is the power drawn at `bus0`,
    /// for lines the flow from `bus0` to `bus1`.
    pub p: Vec<f64>,
}

/// Optimal capacity and operation of a storage unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageResult {
    pub p_nom_opt: f64,
    /// Power fed into the grid per snapshot (MW)
    pub p_dispatch: Vec<f64>,
    /// Power drawn from the grid per snapshot (MW)
    pub p_store: Vec<f64>,
    /// Energy level at the end of each snapshot (MWh)
    pub state_of_charge: Vec<f64>,
}

impl StorageResult {
    /// Net injection (dispatch minus store) per snapshot
    pub fn p(&self) -> Vec<f64> {
        self.p_dispatch
            .iter()
            .zip(&self.p_store)
            .map(|(d, s)| d - s)
            .collect()
    }
}

/// Optimal energy capacity and operation of a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreResult {
    /// Optimal energy capacity (MWh)
    pub e_nom_opt: f64,
    /// Power injected into the bus per snapshot (MW), negative when charging
    pub p: Vec<f64>,
    /// Energy level at the end of each snapshot (MWh)
    pub e: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveStatus {
    Optimal,
}

/// Complete solution of one optimisation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSolution {
    pub status: SolveStatus,
    /// Name of the optimiser that produced the solution
    pub solver: String,
    /// LP objective: capital cost of extendable capacity plus weighted
    /// operating cost (EUR/a). Fixed capacity costs are not included.
    pub objective: f64,
    pub generators: BTreeMap<String, DispatchResult>,
    pub storage_units: BTreeMap<String, StorageResult>,
    pub stores: BTreeMap<String, StoreResult>,
    pub links: BTreeMap<String, DispatchResult>,
    pub lines: BTreeMap<String, DispatchResult>,
    /// Left-hand side of each global constraint at the optimum
    pub global_constraints: BTreeMap<String, f64>,
    /// Emissions over the modelled horizon
    pub co2_emissions: TonnesCo2,
    #[serde(with = "duration_millis")]
    pub solve_time: Duration,
}

impl NetworkSolution {
    pub fn new(solver: impl Into<String>) -> Self {
        Self {
            status: SolveStatus::Optimal,
            solver: solver.into(),
            objective: 0.0,
            generators: BTreeMap::new(),
            storage_units: BTreeMap::new(),
            stores: BTreeMap::new(),
            links: BTreeMap::new(),
            lines: BTreeMap::new(),
            global_constraints: BTreeMap::new(),
            co2_emissions: TonnesCo2(0.0),
            solve_time: Duration::ZERO,
        }
    }

    pub fn generator_capacity(&self, name: &str) -> Option<Megawatts> {
        self.generators.get(name).map(|g| Megawatts(g.p_nom_opt))
    }

    pub fn storage_capacity(&self, name: &str) -> Option<Megawatts> {
        self.storage_units.get(name).map(|s| Megawatts(s.p_nom_opt))
    }

    /// Human-readable summary of optimal capacities.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "{} solution: objective {:.4e} EUR/a, emissions {:.3} Mt, solved in {:.2?}",
            self.solver,
            self.objective,
            self.co2_emissions.to_megatonnes(),
            self.solve_time
        )];
        for (name, gen) in &self.generators {
            lines.push(format!("  Generator {:<30} {:>12.1} MW", name, gen.p_nom_opt));
        }
        for (name, unit) in &self.storage_units {
            lines.push(format!("  StorageUnit {:<28} {:>12.1} MW", name, unit.p_nom_opt));
        }
        for (name, store) in &self.stores {
            lines.push(format!("  Store {:<34} {:>12.1} MWh", name, store.e_nom_opt));
        }
        for (name, link) in &self.links {
            lines.push(format!("  Link {:<35} {:>12.1} MW", name, link.p_nom_opt));
        }
        lines.join("\n")
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_net_injection() {
        let result = StorageResult {
            p_nom_opt: 10.0,
            p_dispatch: vec![5.0, 0.0],
            p_store: vec![0.0, 4.0],
            state_of_charge: vec![0.0, 3.6],
        };
        assert_eq!(result.p(), vec![5.0, -4.0]);
    }

    #[test]
    fn serializes_solve_time_as_millis() {
        let mut solution = NetworkSolution::new("lp-clarabel");
        solution.solve_time = Duration::from_millis(1500);
        let json = serde_json::to_value(&solution).unwrap();
        assert_eq!(json["solve_time"], 1500);
        let back: NetworkSolution = serde_json::from_value(json).unwrap();
        assert_eq!(back.solve_time, Duration::from_millis(1500));
    }
}
