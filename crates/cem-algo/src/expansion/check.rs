//! Acceptance checks on a solution returned by the LP backend.
//!
//! Interior-point backends can report success on a problem they did not
//! actually solve (e.g. a near dual-infeasible certificate). Such points
//! violate the bus balance or have a negative cost although every cost
//! coefficient is non-negative; both are rejected here.

use cem_core::Network;

use super::solution::NetworkSolution;
use crate::OptimizeError;

/// Absolute balance slack (MW) on top of the relative one.
const BALANCE_ABS_TOL_MW: f64 = 1e-2;
const BALANCE_REL_TOL: f64 = 1e-4;
/// Largest negative objective (EUR/a) accepted as rounding noise.
const OBJECTIVE_TOL_EUR: f64 = 1.0;

/// Reject solutions that do not meet demand or that report a negative
/// objective on a network without negative costs.
pub fn verify(network: &Network, solution: &NetworkSolution) -> Result<(), OptimizeError> {
    check_finite(solution)?;
    check_balance(network, solution)?;
    if costs_non_negative(network) && solution.objective < -OBJECTIVE_TOL_EUR {
        return Err(OptimizeError::Unbounded(format!(
            "objective {:.3e} EUR/a is negative although no cost is",
            solution.objective
        )));
    }
    Ok(())
}

fn check_finite(solution: &NetworkSolution) -> Result<(), OptimizeError> {
    let flows = solution
        .generators
        .values()
        .chain(solution.links.values())
        .chain(solution.lines.values())
        .flat_map(|r| r.p.iter().chain(std::iter::once(&r.p_nom_opt)));
    let storage = solution.storage_units.values().flat_map(|r| {
        r.p_dispatch
            .iter()
            .chain(&r.p_store)
            .chain(&r.state_of_charge)
            .chain(std::iter::once(&r.p_nom_opt))
    });
    let stores = solution
        .stores
        .values()
        .flat_map(|r| r.p.iter().chain(&r.e).chain(std::iter::once(&r.e_nom_opt)));
    if flows.chain(storage).chain(stores).any(|v| !v.is_finite()) {
        return Err(OptimizeError::SolverFailed(
            "solver returned non-finite values".into(),
        ));
    }
    Ok(())
}

/// Net injection minus demand per bus and snapshot must vanish.
fn check_balance(network: &Network, solution: &NetworkSolution) -> Result<(), OptimizeError> {
    let n_t = network.num_snapshots();
    for bus in network.buses() {
        let mut residual = vec![0.0; n_t];
        let mut demand = vec![0.0; n_t];

        for load in network.loads().iter().filter(|l| l.bus == bus.name) {
            for (t, d) in demand.iter_mut().enumerate() {
                *d += load.p_set.at(t);
            }
        }
        for gen in network.generators().iter().filter(|g| g.bus == bus.name) {
            if let Some(r) = solution.generators.get(&gen.name) {
                add(&mut residual, &r.p, 1.0);
            }
        }
        for unit in network.storage_units().iter().filter(|s| s.bus == bus.name) {
            if let Some(r) = solution.storage_units.get(&unit.name) {
                add(&mut residual, &r.p(), 1.0);
            }
        }
        for st in network.stores().iter().filter(|s| s.bus == bus.name) {
            if let Some(r) = solution.stores.get(&st.name) {
                add(&mut residual, &r.p, 1.0);
            }
        }
        for link in network.links() {
            let Some(r) = solution.links.get(&link.name) else {
                continue;
            };
            if link.bus0 == bus.name {
                add(&mut residual, &r.p, -1.0);
            }
            if link.bus1 == bus.name {
                for (t, (acc, p)) in residual.iter_mut().zip(&r.p).enumerate() {
                    *acc += link.efficiency.at(t) * p;
                }
            }
        }
        for line in network.lines() {
            let Some(r) = solution.lines.get(&line.name) else {
                continue;
            };
            if line.bus0 == bus.name {
                add(&mut residual, &r.p, -1.0);
            }
            if line.bus1 == bus.name {
                add(&mut residual, &r.p, 1.0);
            }
        }

        for (t, (supplied, wanted)) in residual.iter().zip(&demand).enumerate() {
            let tol = BALANCE_ABS_TOL_MW + BALANCE_REL_TOL * wanted.abs();
            if (supplied - wanted).abs() > tol {
                return Err(OptimizeError::SolverFailed(format!(
                    "solution does not balance bus '{}' at snapshot {}: supply {:.3} MW, demand {:.3} MW",
                    bus.name, t, supplied, wanted
                )));
            }
        }
    }
    Ok(())
}

fn add(acc: &mut [f64], values: &[f64], sign: f64) {
    for (a, v) in acc.iter_mut().zip(values) {
        *a += sign * v;
    }
}

fn costs_non_negative(network: &Network) -> bool {
    network
        .generators()
        .iter()
        .all(|g| g.capital_cost >= 0.0 && g.marginal_cost >= 0.0)
        && network
            .storage_units()
            .iter()
            .all(|s| s.capital_cost >= 0.0 && s.marginal_cost >= 0.0)
        // Store marginal cost applies to signed power, so any non-zero value can lower the objective.
        && network
            .stores()
            .iter()
            .all(|s| s.capital_cost >= 0.0 && s.marginal_cost == 0.0)
        && network
            .links()
            .iter()
            .all(|l| l.capital_cost >= 0.0 && l.marginal_cost >= 0.0 && l.p_min_pu.min() >= 0.0)
        && network.lines().iter().all(|l| l.capital_cost >= 0.0)
}
