//! LP construction and solve for [`LinearExpansionOptimizer`].

use std::collections::HashMap;
use std::time::Instant;

use cem_core::{ConstraintSense, GlobalConstraint, Network, TonnesCo2};
use good_lp::solvers::clarabel::clarabel;
#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs;
use good_lp::{
    constraint, variable, variables, Constraint, Expression, ProblemVariables, ResolutionError,
    Solution, SolverModel, Variable,
};
use tracing::{debug, info};

use super::check;
use super::emissions;
use super::solution::{DispatchResult, NetworkSolution, StorageResult, StoreResult};
use crate::{LpSolverKind, NetworkOptimizer, OptimizeError};

// The LP is posed in GW/GWh, MEUR and Mt so that coefficients stay close to
// unity; inputs and reported results are in MW/MWh, EUR and t.
const MW_PER_UNIT: f64 = 1e3;
const EUR_PER_UNIT: f64 = 1e6;
const T_PER_UNIT: f64 = 1e6;
/// Cost coefficient per GW (GWh) for a cost given per MW (MWh).
const COST_SCALE: f64 = MW_PER_UNIT / EUR_PER_UNIT;
/// Emission coefficient per GWh for an intensity given per MWh.
const CO2_SCALE: f64 = MW_PER_UNIT / T_PER_UNIT;

/// Single-period linear capacity-expansion optimiser.
#[derive(Debug, Clone, Default)]
pub struct LinearExpansionOptimizer {
    pub solver: LpSolverKind,
}

impl LinearExpansionOptimizer {
    pub fn new(solver: LpSolverKind) -> Self {
        Self { solver }
    }
}

impl NetworkOptimizer for LinearExpansionOptimizer {
    fn name(&self) -> &str {
        match self.solver {
            LpSolverKind::Clarabel => "lp-clarabel",
            #[cfg(feature = "solver-highs")]
            LpSolverKind::Highs => "lp-highs",
        }
    }

    fn optimize(&self, network: &Network) -> Result<NetworkSolution, OptimizeError> {
        let start = Instant::now();
        check_supported(network)?;
        let diagnostics = network.validate();
        if diagnostics.has_errors() {
            let messages: Vec<String> = diagnostics.errors().map(|i| i.to_string()).collect();
            return Err(OptimizeError::NetworkValidation(messages.join("; ")));
        }

        let LpModel {
            vars,
            objective,
            constraints,
            index,
        } = LpModel::build(network)?;
        info!(
            snapshots = network.num_snapshots(),
            constraints = constraints.len(),
            solver = self.solver.as_str(),
            "solving capacity expansion LP"
        );

        let problem = vars.minimise(objective);
        let mut solution = match self.solver {
            LpSolverKind::Clarabel => {
                let solved = solve_with(problem.using(clarabel), constraints)?;
                index.extract(&solved, self.name())
            }
            #[cfg(feature = "solver-highs")]
            LpSolverKind::Highs => {
                let solved = solve_with(problem.using(highs), constraints)?;
                index.extract(&solved, self.name())
            }
        };

        solution.objective = objective_value(network, &solution);
        check::verify(network, &solution)?;
        solution.co2_emissions = TonnesCo2(emissions::total(network, &solution));
        for gc in network.global_constraints() {
            solution
                .global_constraints
                .insert(gc.name.clone(), solution.co2_emissions.value());
        }
        solution.solve_time = start.elapsed();
        info!(
            objective = solution.objective,
            co2_t = solution.co2_emissions.value(),
            elapsed_ms = solution.solve_time.as_millis() as u64,
            "capacity expansion solved"
        );
        Ok(solution)
    }
}

fn solve_with<M>(mut model: M, constraints: Vec<Constraint>) -> Result<M::Solution, OptimizeError>
where
    M: SolverModel<Error = ResolutionError>,
{
    for c in constraints {
        model = model.with(c);
    }
    model.solve().map_err(OptimizeError::from)
}

fn check_supported(network: &Network) -> Result<(), OptimizeError> {
    for gc in network.global_constraints() {
        if gc.carrier_attribute != GlobalConstraint::CO2_EMISSIONS {
            return Err(OptimizeError::Unsupported(format!(
                "global constraint '{}' on carrier attribute '{}'",
                gc.name, gc.carrier_attribute
            )));
        }
    }
    Ok(())
}

/// Nominal capacity: a constant, or a decision variable when extendable.
#[derive(Debug, Clone, Copy)]
enum Capacity {
    Fixed(f64),
    Extendable(Variable),
}

impl Capacity {
    fn new(vars: &mut ProblemVariables, extendable: bool, fixed: f64, min: f64, max: f64) -> Self {
        if !extendable {
            return Capacity::Fixed(fixed / MW_PER_UNIT);
        }
        let mut def = variable().min(min.max(0.0) / MW_PER_UNIT);
        if max.is_finite() {
            def = def.max(max / MW_PER_UNIT);
        }
        Capacity::Extendable(vars.add(def))
    }

    fn scaled(&self, factor: f64) -> Expression {
        match self {
            Capacity::Fixed(value) => Expression::from(factor * value),
            Capacity::Extendable(var) => factor * *var,
        }
    }

    /// Optimal capacity in MW (MWh for stores)
    fn value<S: Solution>(&self, solution: &S) -> f64 {
        MW_PER_UNIT
            * match self {
                Capacity::Fixed(value) => *value,
                Capacity::Extendable(var) => solution.value(*var),
            }
    }
}

struct StorageVars {
    name: String,
    capacity: Capacity,
    dispatch: Vec<Variable>,
    store: Vec<Variable>,
    soc: Vec<Variable>,
}

struct StoreVars {
    name: String,
    capacity: Capacity,
    p: Vec<Variable>,
    e: Vec<Variable>,
}

/// Variable handles needed to read a solution back.
#[derive(Default)]
struct VariableIndex {
    generators: Vec<(String, Capacity, Vec<Variable>)>,
    storage_units: Vec<StorageVars>,
    stores: Vec<StoreVars>,
    links: Vec<(String, Capacity, Vec<Variable>)>,
    lines: Vec<(String, Capacity, Vec<Variable>)>,
}

impl VariableIndex {
    fn extract<S: Solution>(&self, solution: &S, solver: &str) -> NetworkSolution {
        let mut result = NetworkSolution::new(solver);
        for (name, capacity, p) in &self.generators {
            result.generators.insert(
                name.clone(),
                DispatchResult {
                    p_nom_opt: capacity.value(solution),
                    p: values(solution, p),
                },
            );
        }
        for unit in &self.storage_units {
            result.storage_units.insert(
                unit.name.clone(),
                StorageResult {
                    p_nom_opt: unit.capacity.value(solution),
                    p_dispatch: values(solution, &unit.dispatch),
                    p_store: values(solution, &unit.store),
                    state_of_charge: values(solution, &unit.soc),
                },
            );
        }
        for store in &self.stores {
            result.stores.insert(
                store.name.clone(),
                StoreResult {
                    e_nom_opt: store.capacity.value(solution),
                    p: values(solution, &store.p),
                    e: values(solution, &store.e),
                },
            );
        }
        for (name, capacity, p) in &self.links {
            result.links.insert(
                name.clone(),
                DispatchResult {
                    p_nom_opt: capacity.value(solution),
                    p: values(solution, p),
                },
            );
        }
        for (name, capacity, p) in &self.lines {
            result.lines.insert(
                name.clone(),
                DispatchResult {
                    p_nom_opt: capacity.value(solution),
                    p: values(solution, p),
                },
            );
        }
        result
    }
}

/// Variable values converted back to MW (MWh)
fn values<S: Solution>(solution: &S, vars: &[Variable]) -> Vec<f64> {
    vars.iter().map(|v| MW_PER_UNIT * solution.value(*v)).collect()
}

struct LpModel {
    vars: ProblemVariables,
    objective: Expression,
    constraints: Vec<Constraint>,
    index: VariableIndex,
}

/// Per-bus, per-snapshot net injection expressions.
struct Balance {
    injection: Vec<Vec<Expression>>,
    has_terms: Vec<bool>,
}

impl Balance {
    fn new(buses: usize, snapshots: usize) -> Self {
        Self {
            injection: (0..buses)
                .map(|_| (0..snapshots).map(|_| Expression::from(0.0)).collect())
                .collect(),
            has_terms: vec![false; buses],
        }
    }

    fn add(&mut self, bus: usize, t: usize, coefficient: f64, var: Variable) {
        self.injection[bus][t] += coefficient * var;
        self.has_terms[bus] = true;
    }
}

impl LpModel {
    fn build(network: &Network) -> Result<Self, OptimizeError> {
        let n_t = network.num_snapshots();
        let weights = network.snapshot_weightings();
        let bus_index: HashMap<&str, usize> = network
            .buses()
            .iter()
            .enumerate()
            .map(|(i, b)| (b.name.as_str(), i))
            .collect();
        let bus = |name: &str| {
            bus_index.get(name).copied().ok_or_else(|| {
                OptimizeError::NetworkValidation(format!("unknown bus '{}'", name))
            })
        };

        let mut vars = variables!();
        let mut objective = Expression::from(0.0);
        let mut constraints: Vec<Constraint> = Vec::new();
        let mut balance = Balance::new(network.buses().len(), n_t);
        let mut index = VariableIndex::default();

        // Emissions over the horizon, plus the constant part from non-cyclic
        // storage energy.
        let mut co2 = Expression::from(0.0);
        let mut co2_offset = 0.0;
        let mut co2_has_terms = false;

        // === Generators ===
        for gen in network.generators() {
            let b = bus(&gen.bus)?;
            let capacity = Capacity::new(
                &mut vars,
                gen.p_nom_extendable,
                gen.p_nom,
                gen.p_nom_min,
                gen.p_nom_max,
            );
            if let Capacity::Extendable(var) = capacity {
                objective += (gen.capital_cost * COST_SCALE) * var;
            }
            let intensity = network.carrier_co2(&gen.carrier) / gen.efficiency;
            let mut p = Vec::with_capacity(n_t);
            for t in 0..n_t {
                let (lo, hi) = (gen.p_min_pu.at(t), gen.p_max_pu.at(t));
                let var = match capacity {
                    Capacity::Fixed(p_nom) => vars.add(variable().min(lo * p_nom).max(hi * p_nom)),
                    Capacity::Extendable(_) => {
                        let var = vars.add(variable());
                        constraints.push(constraint!(var <= capacity.scaled(hi)));
                        constraints.push(constraint!(var >= capacity.scaled(lo)));
                        var
                    }
                };
                objective += (weights[t] * gen.marginal_cost * COST_SCALE) * var;
                balance.add(b, t, 1.0, var);
                if intensity != 0.0 {
                    co2 += (weights[t] * intensity * CO2_SCALE) * var;
                    co2_has_terms = true;
                }
                p.push(var);
            }
            index.generators.push((gen.name.clone(), capacity, p));
        }

        // === Storage units ===
        for unit in network.storage_units() {
            let b = bus(&unit.bus)?;
            let capacity = Capacity::new(
                &mut vars,
                unit.p_nom_extendable,
                unit.p_nom,
                unit.p_nom_min,
                unit.p_nom_max,
            );
            if let Capacity::Extendable(var) = capacity {
                objective += (unit.capital_cost * COST_SCALE) * var;
            }
            let mut dispatch = Vec::with_capacity(n_t);
            let mut store = Vec::with_capacity(n_t);
            let mut soc = Vec::with_capacity(n_t);
            for t in 0..n_t {
                let d = vars.add(variable().min(0.0));
                let c = vars.add(variable().min(0.0));
                let s = vars.add(variable().min(0.0));
                constraints.push(constraint!(d <= capacity.scaled(1.0)));
                constraints.push(constraint!(c <= capacity.scaled(1.0)));
                constraints.push(constraint!(s <= capacity.scaled(unit.max_hours)));
                objective += (weights[t] * unit.marginal_cost * COST_SCALE) * d;
                balance.add(b, t, 1.0, d);
                balance.add(b, t, -1.0, c);
                dispatch.push(d);
                store.push(c);
                soc.push(s);
            }
            for t in 0..n_t {
                let w = weights[t];
                let decay = (1.0 - unit.standing_loss).powf(w);
                let mut rhs = Expression::from(0.0);
                rhs += (w * unit.efficiency_store) * store[t];
                rhs += (-w / unit.efficiency_dispatch) * dispatch[t];
                if t > 0 {
                    rhs += decay * soc[t - 1];
                } else if unit.cyclic_state_of_charge {
                    rhs += decay * soc[n_t - 1];
                } else {
                    rhs += Expression::from(decay * unit.state_of_charge_initial / MW_PER_UNIT);
                }
                constraints.push(constraint!(soc[t] == rhs));
            }
            let factor = network.carrier_co2(&unit.carrier);
            if factor != 0.0 && !unit.cyclic_state_of_charge && n_t > 0 {
                co2_offset += factor * unit.state_of_charge_initial / T_PER_UNIT;
                co2 += (-factor * CO2_SCALE) * soc[n_t - 1];
                co2_has_terms = true;
            }
            index.storage_units.push(StorageVars {
                name: unit.name.clone(),
                capacity,
                dispatch,
                store,
                soc,
            });
        }

        // === Stores ===
        for st in network.stores() {
            let b = bus(&st.bus)?;
            let capacity = Capacity::new(
                &mut vars,
                st.e_nom_extendable,
                st.e_nom,
                st.e_nom_min,
                st.e_nom_max,
            );
            if let Capacity::Extendable(var) = capacity {
                objective += (st.capital_cost * COST_SCALE) * var;
            }
            let mut p = Vec::with_capacity(n_t);
            let mut e = Vec::with_capacity(n_t);
            for t in 0..n_t {
                let pt = vars.add(variable());
                let et = vars.add(variable());
                constraints.push(constraint!(et <= capacity.scaled(st.e_max_pu.at(t))));
                constraints.push(constraint!(et >= capacity.scaled(st.e_min_pu.at(t))));
                objective += (weights[t] * st.marginal_cost * COST_SCALE) * pt;
                balance.add(b, t, 1.0, pt);
                p.push(pt);
                e.push(et);
            }
            for t in 0..n_t {
                let w = weights[t];
                let decay = (1.0 - st.standing_loss).powf(w);
                let mut rhs = Expression::from(0.0);
                rhs += (-w) * p[t];
                if t > 0 {
                    rhs += decay * e[t - 1];
                } else if st.e_cyclic {
                    rhs += decay * e[n_t - 1];
                } else {
                    rhs += Expression::from(decay * st.e_initial / MW_PER_UNIT);
                }
                constraints.push(constraint!(e[t] == rhs));
            }
            let factor = network.carrier_co2(&st.carrier);
            if factor != 0.0 && !st.e_cyclic && n_t > 0 {
                co2_offset += factor * st.e_initial / T_PER_UNIT;
                co2 += (-factor * CO2_SCALE) * e[n_t - 1];
                co2_has_terms = true;
            }
            index.stores.push(StoreVars {
                name: st.name.clone(),
                capacity,
                p,
                e,
            });
        }

        // === Links ===
        for link in network.links() {
            let (b0, b1) = (bus(&link.bus0)?, bus(&link.bus1)?);
            let capacity = Capacity::new(
                &mut vars,
                link.p_nom_extendable,
                link.p_nom,
                link.p_nom_min,
                link.p_nom_max,
            );
            if let Capacity::Extendable(var) = capacity {
                objective += (link.capital_cost * COST_SCALE) * var;
            }
            let mut p = Vec::with_capacity(n_t);
            for t in 0..n_t {
                let var = vars.add(variable());
                constraints.push(constraint!(var <= capacity.scaled(link.p_max_pu.at(t))));
                constraints.push(constraint!(var >= capacity.scaled(link.p_min_pu.at(t))));
                objective += (weights[t] * link.marginal_cost * COST_SCALE) * var;
                balance.add(b0, t, -1.0, var);
                balance.add(b1, t, link.efficiency.at(t), var);
                p.push(var);
            }
            index.links.push((link.name.clone(), capacity, p));
        }

        // === Lines (transport model) ===
        for line in network.lines().iter().filter(|l| l.active) {
            let (b0, b1) = (bus(&line.bus0)?, bus(&line.bus1)?);
            let capacity = Capacity::new(
                &mut vars,
                line.s_nom_extendable,
                line.s_nom,
                line.s_nom_min,
                line.s_nom_max,
            );
            if let Capacity::Extendable(var) = capacity {
                objective += (line.capital_cost * COST_SCALE) * var;
            }
            let mut flow = Vec::with_capacity(n_t);
            for t in 0..n_t {
                let var = vars.add(variable());
                constraints.push(constraint!(var <= capacity.scaled(line.s_max_pu)));
                constraints.push(constraint!(var >= capacity.scaled(-line.s_max_pu)));
                balance.add(b0, t, -1.0, var);
                balance.add(b1, t, 1.0, var);
                flow.push(var);
            }
            index.lines.push((line.name.clone(), capacity, flow));
        }

        // === Bus energy balance ===
        let mut demand = vec![vec![0.0; n_t]; network.buses().len()];
        for load in network.loads() {
            let b = bus(&load.bus)?;
            for (t, d) in demand[b].iter_mut().enumerate() {
                *d += load.p_set.at(t) / MW_PER_UNIT;
            }
        }
        for (b, (injections, has_terms)) in balance
            .injection
            .into_iter()
            .zip(balance.has_terms)
            .enumerate()
        {
            if !has_terms {
                if let Some(t) = demand[b].iter().position(|d| d.abs() > 1e-9) {
                    return Err(OptimizeError::Infeasible(format!(
                        "bus '{}' has demand at snapshot {} but nothing can supply it",
                        network.buses()[b].name,
                        t
                    )));
                }
                continue;
            }
            for (t, injection) in injections.into_iter().enumerate() {
                constraints.push(constraint!(injection == demand[b][t]));
            }
        }

        // === Global constraints ===
        for gc in network.global_constraints() {
            let constant = gc.constant / T_PER_UNIT;
            if constant.is_infinite() {
                let slack = match gc.sense {
                    ConstraintSense::LessEqual => constant > 0.0,
                    ConstraintSense::GreaterEqual => constant < 0.0,
                    ConstraintSense::Equal => false,
                };
                if slack {
                    continue;
                }
                return Err(OptimizeError::Infeasible(format!(
                    "global constraint '{}' requires emissions {} {}",
                    gc.name,
                    gc.sense.as_str(),
                    gc.constant
                )));
            }
            if !co2_has_terms {
                if !sense_holds(gc.sense, co2_offset, constant) {
                    return Err(OptimizeError::Infeasible(format!(
                        "global constraint '{}' cannot hold: emissions are fixed at {} t",
                        gc.name,
                        co2_offset * T_PER_UNIT
                    )));
                }
                continue;
            }
            let lhs = co2.clone() + Expression::from(co2_offset);
            constraints.push(match gc.sense {
                ConstraintSense::LessEqual => constraint!(lhs <= constant),
                ConstraintSense::GreaterEqual => constraint!(lhs >= constant),
                ConstraintSense::Equal => constraint!(lhs == constant),
            });
            debug!(name = %gc.name, constant = gc.constant, "added emission constraint");
        }

        Ok(Self {
            vars,
            objective,
            constraints,
            index,
        })
    }
}

fn sense_holds(sense: ConstraintSense, lhs: f64, rhs: f64) -> bool {
    match sense {
        ConstraintSense::LessEqual => lhs <= rhs + 1e-9,
        ConstraintSense::GreaterEqual => lhs >= rhs - 1e-9,
        ConstraintSense::Equal => (lhs - rhs).abs() <= 1e-9,
    }
}

/// Objective recomputed from the solution values: capital cost of
/// extendable capacity plus weighted marginal cost.
fn objective_value(network: &Network, solution: &NetworkSolution) -> f64 {
    let weights = network.snapshot_weightings();
    let weighted = |p: &[f64], mc: f64| -> f64 {
        p.iter().zip(weights).map(|(p, w)| w * mc * p).sum()
    };
    let mut total = 0.0;
    for gen in network.generators() {
        if let Some(r) = solution.generators.get(&gen.name) {
            if gen.p_nom_extendable {
                total += gen.capital_cost * r.p_nom_opt;
            }
            total += weighted(&r.p, gen.marginal_cost);
        }
    }
    for unit in network.storage_units() {
        if let Some(r) = solution.storage_units.get(&unit.name) {
            if unit.p_nom_extendable {
                total += unit.capital_cost * r.p_nom_opt;
            }
            total += weighted(&r.p_dispatch, unit.marginal_cost);
        }
    }
    for st in network.stores() {
        if let Some(r) = solution.stores.get(&st.name) {
            if st.e_nom_extendable {
                total += st.capital_cost * r.e_nom_opt;
            }
            total += weighted(&r.p, st.marginal_cost);
        }
    }
    for link in network.links() {
        if let Some(r) = solution.links.get(&link.name) {
            if link.p_nom_extendable {
                total += link.capital_cost * r.p_nom_opt;
            }
            total += weighted(&r.p, link.marginal_cost);
        }
    }
    for line in network.lines() {
        if let Some(r) = solution.lines.get(&line.name) {
            if line.s_nom_extendable {
                total += line.capital_cost * r.p_nom_opt;
            }
        }
    }
    total
}
