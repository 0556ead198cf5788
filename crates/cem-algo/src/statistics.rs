//! Post-solve statistics grouped by component kind and carrier.
//!
//! Capital expenditure counts every component at its optimal capacity,
//! including non-extendable ones, so the system cost reflects the whole
//! fleet and not just the LP objective. Operational expenditure and energy
//! totals are weighted by snapshot duration and cover the modelled horizon.

use cem_core::{ComponentKind, EurosPerYear, MegawattHours, Network, TonnesCo2};
use serde::Serialize;

use crate::expansion::emissions;
use crate::NetworkSolution;

/// Carrier label used for lines, which carry no carrier of their own.
pub const LINE_CARRIER: &str = "AC";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarrierStatistics {
    pub component: ComponentKind,
    pub carrier: String,
    /// Sum of optimal nominal capacities (MW, MWh for stores)
    pub optimal_capacity: f64,
    /// Energy delivered to the grid
    pub supply: MegawattHours,
    /// Energy drawn from the grid (storage charging, link input)
    pub withdrawal: MegawattHours,
    /// Available but unused generator output
    pub curtailment: MegawattHours,
    /// Supply over capacity times horizon; zero without capacity
    pub capacity_factor: f64,
    pub capex: EurosPerYear,
    pub opex: EurosPerYear,
    pub emissions: TonnesCo2,
}

impl CarrierStatistics {
    fn new(component: ComponentKind, carrier: &str) -> Self {
        Self {
            component,
            carrier: carrier.to_string(),
            optimal_capacity: 0.0,
            supply: MegawattHours(0.0),
            withdrawal: MegawattHours(0.0),
            curtailment: MegawattHours(0.0),
            capacity_factor: 0.0,
            capex: EurosPerYear(0.0),
            opex: EurosPerYear(0.0),
            emissions: TonnesCo2(0.0),
        }
    }

    /// Capex plus opex
    pub fn system_cost(&self) -> EurosPerYear {
        self.capex + self.opex
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkStatistics {
    /// One row per (component kind, carrier), in network order
    pub rows: Vec<CarrierStatistics>,
}

impl NetworkStatistics {
    pub fn compute(network: &Network, solution: &NetworkSolution) -> Self {
        let weights = network.snapshot_weightings();
        let horizon = network.horizon_hours();
        let weighted =
            |values: &[f64], f: &dyn Fn(usize, f64) -> f64| weighted_sum(weights, values, f);
        let mut stats = Self::default();

        for gen in network.generators() {
            let Some(r) = solution.generators.get(&gen.name) else {
                continue;
            };
            let row = stats.row(ComponentKind::Generator, &gen.carrier);
            row.optimal_capacity += r.p_nom_opt;
            row.supply += MegawattHours(weighted(&r.p, &|_, p: f64| p.max(0.0)));
            row.curtailment += MegawattHours(weighted(&r.p, &|t, p: f64| {
                (gen.p_max_pu.at(t) * r.p_nom_opt - p).max(0.0)
            }));
            row.capex += EurosPerYear(gen.capital_cost * r.p_nom_opt);
            row.opex += EurosPerYear(weighted(&r.p, &|_, p: f64| gen.marginal_cost * p));
        }

        for unit in network.storage_units() {
            let Some(r) = solution.storage_units.get(&unit.name) else {
                continue;
            };
            let row = stats.row(ComponentKind::StorageUnit, &unit.carrier);
            row.optimal_capacity += r.p_nom_opt;
            row.supply += MegawattHours(weighted(&r.p_dispatch, &|_, p: f64| p));
            row.withdrawal += MegawattHours(weighted(&r.p_store, &|_, p: f64| p));
            row.capex += EurosPerYear(unit.capital_cost * r.p_nom_opt);
            row.opex += EurosPerYear(weighted(&r.p_dispatch, &|_, p: f64| {
                unit.marginal_cost * p
            }));
        }

        for store in network.stores() {
            let Some(r) = solution.stores.get(&store.name) else {
                continue;
            };
            let row = stats.row(ComponentKind::Store, &store.carrier);
            row.optimal_capacity += r.e_nom_opt;
            row.supply += MegawattHours(weighted(&r.p, &|_, p: f64| p.max(0.0)));
            row.withdrawal += MegawattHours(weighted(&r.p, &|_, p: f64| (-p).max(0.0)));
            row.capex += EurosPerYear(store.capital_cost * r.e_nom_opt);
            row.opex += EurosPerYear(weighted(&r.p, &|_, p: f64| store.marginal_cost * p));
        }

        for link in network.links() {
            let Some(r) = solution.links.get(&link.name) else {
                continue;
            };
            let row = stats.row(ComponentKind::Link, &link.carrier);
            row.optimal_capacity += r.p_nom_opt;
            row.supply += MegawattHours(weighted(&r.p, &|t, p: f64| {
                (link.efficiency.at(t) * p).max(0.0)
            }));
            row.withdrawal += MegawattHours(weighted(&r.p, &|_, p: f64| p.max(0.0)));
            row.capex += EurosPerYear(link.capital_cost * r.p_nom_opt);
            row.opex += EurosPerYear(weighted(&r.p, &|_, p: f64| link.marginal_cost * p));
        }

        for line in network.lines() {
            let Some(r) = solution.lines.get(&line.name) else {
                continue;
            };
            let row = stats.row(ComponentKind::Line, LINE_CARRIER);
            row.optimal_capacity += r.p_nom_opt;
            row.capex += EurosPerYear(line.capital_cost * r.p_nom_opt);
        }

        let emitted = emissions::by_carrier(network, solution);
        for row in &mut stats.rows {
            if matches!(
                row.component,
                ComponentKind::Generator | ComponentKind::StorageUnit | ComponentKind::Store
            ) {
                if let Some(t) = emitted.get(&row.carrier) {
                    row.emissions = TonnesCo2(*t);
                }
            }
            let has_capacity = row.optimal_capacity > 0.0 && horizon > 0.0;
            if has_capacity && row.component != ComponentKind::Store {
                row.capacity_factor = row.supply.value() / (row.optimal_capacity * horizon);
            }
        }
        stats
    }

    fn row(&mut self, component: ComponentKind, carrier: &str) -> &mut CarrierStatistics {
        let idx = match self
            .rows
            .iter()
            .position(|r| r.component == component && r.carrier == carrier)
        {
            Some(idx) => idx,
            None => {
                self.rows.push(CarrierStatistics::new(component, carrier));
                self.rows.len() - 1
            }
        };
        &mut self.rows[idx]
    }

    /// Capex plus opex per carrier, summed over component kinds, in order of
    /// first appearance.
    pub fn system_cost_by_carrier(&self) -> Vec<(String, EurosPerYear)> {
        let mut out: Vec<(String, EurosPerYear)> = Vec::new();
        for row in &self.rows {
            match out.iter_mut().find(|(c, _)| *c == row.carrier) {
                Some((_, cost)) => *cost += row.system_cost(),
                None => out.push((row.carrier.clone(), row.system_cost())),
            }
        }
        out
    }

    pub fn total_system_cost(&self) -> EurosPerYear {
        self.rows.iter().map(|r| r.system_cost()).sum()
    }

    pub fn total_capex(&self) -> EurosPerYear {
        self.rows.iter().map(|r| r.capex).sum()
    }

    pub fn total_opex(&self) -> EurosPerYear {
        self.rows.iter().map(|r| r.opex).sum()
    }

    pub fn total_emissions(&self) -> TonnesCo2 {
        self.rows.iter().map(|r| r.emissions).sum()
    }

    pub fn get(&self, component: ComponentKind, carrier: &str) -> Option<&CarrierStatistics> {
        self.rows
            .iter()
            .find(|r| r.component == component && r.carrier == carrier)
    }
}

fn weighted_sum(weights: &[f64], values: &[f64], f: &dyn Fn(usize, f64) -> f64) -> f64 {
    values
        .iter()
        .enumerate()
        .zip(weights)
        .map(|((t, v), w)| w * f(t, *v))
        .sum()
}
