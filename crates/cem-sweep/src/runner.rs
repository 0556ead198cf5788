use std::time::Instant;

use anyhow::{Context, Result};
use cem_algo::{NetworkOptimizer, NetworkStatistics};
use cem_core::Network;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::target::ParameterTarget;

/// What to do when the optimiser fails for one value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop and return the error.
    #[default]
    Abort,
    /// Record the error for that value and continue.
    Record,
}

/// Outcome of one sweep value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Sweep value, in sweep units
    pub value: f64,
    /// Total system cost (EUR/a); `None` when the solve failed
    pub total_cost: Option<f64>,
    /// System cost per carrier (EUR/a), in network order
    #[serde(default)]
    pub cost_by_carrier: Vec<(String, f64)>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub solve_time_ms: u64,
}

impl RunResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Re-solves a network once per candidate value of one parameter.
///
/// Runs are sequential: each value is written into the shared network before
/// its solve, and the original value is put back when the sweep ends, also
/// when it ends with an error.
pub struct SensitivityRunner<'a, O: NetworkOptimizer + ?Sized> {
    optimizer: &'a O,
    policy: FailurePolicy,
}

impl<'a, O: NetworkOptimizer + ?Sized> SensitivityRunner<'a, O> {
    pub fn new(optimizer: &'a O) -> Self {
        Self {
            optimizer,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// One [`RunResult`] per value, in input order.
    pub fn run(
        &self,
        network: &mut Network,
        target: &ParameterTarget,
        values: &[f64],
    ) -> Result<Vec<RunResult>> {
        let original = target.current(network)?;
        let outcome = self.sweep(network, target, values);
        target
            .set_raw(network, original)
            .with_context(|| format!("restoring {}", target))?;
        outcome
    }

    fn sweep(
        &self,
        network: &mut Network,
        target: &ParameterTarget,
        values: &[f64],
    ) -> Result<Vec<RunResult>> {
        let mut results = Vec::with_capacity(values.len());
        for (idx, &value) in values.iter().enumerate() {
            target
                .apply(network, value)
                .with_context(|| format!("setting {} = {}", target, value))?;
            let started = Instant::now();
            let solved = self.optimizer.optimize(network);
            let solve_time_ms = started.elapsed().as_millis() as u64;

            match solved {
                Ok(solution) => {
                    let stats = NetworkStatistics::compute(network, &solution);
                    let total = stats.total_system_cost();
                    info!(
                        parameter = %target.id,
                        step = idx + 1,
                        of = values.len(),
                        value,
                        system_cost_bn = total.to_billions(),
                        "sweep point solved"
                    );
                    results.push(RunResult {
                        value,
                        total_cost: Some(total.value()),
                        cost_by_carrier: stats
                            .system_cost_by_carrier()
                            .into_iter()
                            .map(|(carrier, cost)| (carrier, cost.value()))
                            .collect(),
                        error: None,
                        solve_time_ms,
                    });
                }
                Err(err) => match self.policy {
                    FailurePolicy::Abort => {
                        return Err(anyhow::Error::new(err)
                            .context(format!("optimising with {} = {}", target, value)));
                    }
                    FailurePolicy::Record => {
                        warn!(parameter = %target.id, value, error = %err, "sweep point failed");
                        results.push(RunResult {
                            value,
                            total_cost: None,
                            cost_by_carrier: Vec::new(),
                            error: Some(err.to_string()),
                            solve_time_ms,
                        });
                    }
                },
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Attribute;
    use cem_algo::{DispatchResult, NetworkSolution, OptimizeError};
    use cem_core::{Bus, Carrier, Generator};

    /// Builds every generator at 1 MW, so system cost equals the summed
    /// capital costs. Fails when any capital cost is negative.
    struct UnitBuilder;

    impl NetworkOptimizer for UnitBuilder {
        fn name(&self) -> &str {
            "unit-builder"
        }

        fn optimize(&self, network: &Network) -> Result<NetworkSolution, OptimizeError> {
            let mut solution = NetworkSolution::new(self.name());
            for gen in network.generators() {
                if gen.capital_cost < 0.0 {
                    return Err(OptimizeError::Unbounded(gen.name.clone()));
                }
                solution.generators.insert(
                    gen.name.clone(),
                    DispatchResult {
                        p_nom_opt: 1.0,
                        p: vec![0.0; network.num_snapshots()],
                    },
                );
            }
            Ok(solution)
        }
    }

    fn network() -> Network {
        let mut network = Network::new();
        network.add_bus(Bus::new("electricity")).unwrap();
        for (name, cost) in [("solar", 40_000.0), ("onwind", 100_000.0)] {
            network.add_carrier(Carrier::new(name)).unwrap();
            network
                .add_generator(
                    Generator::new(name, "electricity", name)
                        .extendable()
                        .with_costs(cost, 0.0),
                )
                .unwrap();
        }
        network
    }

    #[test]
    fn one_result_per_value_in_order() {
        let mut net = network();
        let values = [0.0, 20.0, 40.0, 60.0, 80.0, 100.0, 150.0];
        let results = SensitivityRunner::new(&UnitBuilder)
            .run(&mut net, &ParameterTarget::solar_cost(), &values)
            .unwrap();

        assert_eq!(results.len(), values.len());
        for (result, value) in results.iter().zip(values) {
            assert_eq!(result.value, value);
            assert_eq!(result.total_cost, Some(value * 1e3 + 100_000.0));
        }
        assert_eq!(results[1].cost_by_carrier[0], ("solar".to_string(), 20_000.0));
    }

    #[test]
    fn repeated_value_gives_same_cost() {
        let mut net = network();
        let results = SensitivityRunner::new(&UnitBuilder)
            .run(&mut net, &ParameterTarget::solar_cost(), &[60.0, 60.0])
            .unwrap();
        assert_eq!(results[0].total_cost, results[1].total_cost);
    }

    #[test]
    fn attribute_is_restored() {
        let mut net = network();
        SensitivityRunner::new(&UnitBuilder)
            .run(&mut net, &ParameterTarget::solar_cost(), &[0.0, 150.0])
            .unwrap();
        assert_eq!(net.generator("solar").unwrap().capital_cost, 40_000.0);
    }

    #[test]
    fn abort_returns_first_error_and_restores() {
        let mut net = network();
        let target = ParameterTarget::new(Attribute::GeneratorCapitalCost, "onwind", 1.0);
        let err = SensitivityRunner::new(&UnitBuilder)
            .run(&mut net, &target, &[10.0, -1.0, 20.0])
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OptimizeError>(),
            Some(OptimizeError::Unbounded(_))
        ));
        assert!(format!("{err:#}").contains("-1"));
        assert_eq!(net.generator("onwind").unwrap().capital_cost, 100_000.0);
    }

    #[test]
    fn record_policy_keeps_going() {
        let mut net = network();
        let target = ParameterTarget::new(Attribute::GeneratorCapitalCost, "onwind", 1.0);
        let results = SensitivityRunner::new(&UnitBuilder)
            .with_policy(FailurePolicy::Record)
            .run(&mut net, &target, &[10.0, -1.0, 20.0])
            .unwrap();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(!results[1].is_ok());
        assert_eq!(results[1].total_cost, None);
        assert_eq!(results[2].total_cost, Some(40_020.0));
    }

    #[test]
    fn empty_values_give_empty_results() {
        let mut net = network();
        let results = SensitivityRunner::new(&UnitBuilder)
            .run(&mut net, &ParameterTarget::solar_cost(), &[])
            .unwrap();
        assert!(results.is_empty());
    }
}
