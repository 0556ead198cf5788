//! End-to-end expansion run: inputs, network, optional baseline, storage,
//! emissions cap, one solve.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use cem_algo::{NetworkOptimizer, NetworkSolution, NetworkStatistics};
use cem_core::Network;
use cem_io::{CostTable, DataSource, SourceCache, TimeSeries};
use serde::Serialize;
use tracing::info;

use crate::builder::{add_storage_units, apply_co2_limit, create_network};
use crate::config::ModelConfig;

/// Preprocessed cost table and time series.
#[derive(Debug, Clone)]
pub struct ExpansionInputs {
    pub costs: CostTable,
    pub timeseries: TimeSeries,
}

impl ExpansionInputs {
    /// Wrap already processed inputs.
    pub fn new(costs: CostTable, timeseries: TimeSeries) -> Self {
        Self { costs, timeseries }
    }

    /// Load both inputs from local files and preprocess the time series.
    pub fn from_paths(costs: &Path, timeseries: &Path, config: &ModelConfig) -> Result<Self> {
        let table = CostTable::from_path(costs)?;
        let raw = TimeSeries::from_path(timeseries)?;
        Ok(Self::new(table, prepare_timeseries(raw, config)?))
    }

    /// Load the configured sources, downloading remote ones through `cache`.
    pub fn load(config: &ModelConfig, cache: &SourceCache) -> Result<Self> {
        let costs_src: DataSource = config.costs_source().parse()?;
        let ts_src: DataSource = config.data.timeseries.parse()?;
        let costs_path = cache
            .resolve(&costs_src)
            .with_context(|| format!("resolving cost data {}", costs_src))?;
        let ts_path = cache
            .resolve(&ts_src)
            .with_context(|| format!("resolving time series {}", ts_src))?;

        let table = CostTable::from_path(&costs_path)?;
        let raw = TimeSeries::from_path(&ts_path)?;
        Ok(Self::new(table, prepare_timeseries(raw, config)?))
    }
}

/// Scale the load column and resample to the configured resolution.
///
/// Resampling runs even when the input already has that resolution, so
/// snapshots always start on midnight-anchored bucket boundaries.
pub fn prepare_timeseries(mut ts: TimeSeries, config: &ModelConfig) -> Result<TimeSeries> {
    ts.scale_column(&config.data.load_column, config.data.load_scale)?;
    ts.resample(config.data.resolution_hours)
        .with_context(|| format!("resampling to {} h", config.data.resolution_hours))
}

/// Network with storage and emissions cap as configured, ready to solve.
pub fn build_network(inputs: &ExpansionInputs, config: &ModelConfig) -> Result<Network> {
    let mut network = create_network(&inputs.timeseries, &inputs.costs, config)?;
    if config.storage.enabled {
        add_storage_units(&mut network, &inputs.costs, config)?;
    }
    if let Some(limit) = config.co2.limit {
        apply_co2_limit(&mut network, limit)?;
    }
    Ok(network)
}

/// Solution and statistics of one solve.
#[derive(Debug, Clone, Serialize)]
pub struct SolvedRun {
    pub solution: NetworkSolution,
    pub statistics: NetworkStatistics,
}

impl SolvedRun {
    fn solve<O: NetworkOptimizer + ?Sized>(network: &Network, optimizer: &O) -> Result<Self> {
        let solution = optimizer
            .optimize(network)
            .with_context(|| format!("optimising with {}", optimizer.name()))?;
        let statistics = NetworkStatistics::compute(network, &solution);
        Ok(Self {
            solution,
            statistics,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ExpansionOutcome {
    /// Network as solved, including storage and emissions cap
    pub network: Network,
    pub solution: NetworkSolution,
    pub statistics: NetworkStatistics,
    /// Solve without storage and emissions cap, when requested
    pub baseline: Option<SolvedRun>,
}

impl ExpansionOutcome {
    /// Human-readable summary of costs, capacities and emissions.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.solution.summary());
        let _ = writeln!(
            out,
            "system cost: {:.3} bn EUR/a (capex {:.3}, opex {:.3})",
            self.statistics.total_system_cost().to_billions(),
            self.statistics.total_capex().to_billions(),
            self.statistics.total_opex().to_billions()
        );
        let _ = writeln!(
            out,
            "emissions: {:.3} Mt CO2",
            self.solution.co2_emissions.to_megatonnes()
        );
        for row in &self.statistics.rows {
            let _ = writeln!(
                out,
                "  {:<12} {:<30} {:>12.1} MW  cf {:>5.3}",
                row.component.as_str(),
                row.carrier,
                row.optimal_capacity,
                row.capacity_factor
            );
        }
        if let Some(base) = &self.baseline {
            let _ = writeln!(
                out,
                "baseline (no storage, no cap): {:.3} bn EUR/a",
                base.statistics.total_system_cost().to_billions()
            );
        }
        out
    }
}

/// Build the network, optionally solve a baseline, then add storage and the
/// emissions cap and solve once more.
pub fn run_capacity_expansion<O: NetworkOptimizer + ?Sized>(
    inputs: &ExpansionInputs,
    config: &ModelConfig,
    optimizer: &O,
) -> Result<ExpansionOutcome> {
    let mut network = create_network(&inputs.timeseries, &inputs.costs, config)?;

    let baseline = if config.solver.baseline {
        let run = SolvedRun::solve(&network, optimizer).context("baseline solve")?;
        info!(
            system_cost_bn = run.statistics.total_system_cost().to_billions(),
            "baseline solved"
        );
        Some(run)
    } else {
        None
    };

    if config.storage.enabled {
        add_storage_units(&mut network, &inputs.costs, config)?;
    }
    if let Some(limit) = config.co2.limit {
        apply_co2_limit(&mut network, limit)?;
    }

    let SolvedRun {
        solution,
        statistics,
    } = SolvedRun::solve(&network, optimizer)?;
    info!(
        system_cost_bn = statistics.total_system_cost().to_billions(),
        emissions_mt = solution.co2_emissions.to_megatonnes(),
        "capacity expansion solved"
    );

    Ok(ExpansionOutcome {
        network,
        solution,
        statistics,
        baseline,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::builder::fixtures::{costs, series};
    use crate::builder::CO2_LIMIT;
    use cem_algo::{DispatchResult, OptimizeError};

    /// Sizes every generator to peak load and counts calls.
    #[derive(Default)]
    struct PeakSizer {
        calls: AtomicUsize,
    }

    impl NetworkOptimizer for PeakSizer {
        fn name(&self) -> &str {
            "peak-sizer"
        }

        fn optimize(&self, network: &Network) -> Result<NetworkSolution, OptimizeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let peak = network.stats().peak_load_mw;
            let mut solution = NetworkSolution::new(self.name());
            for gen in network.generators() {
                solution.generators.insert(
                    gen.name.clone(),
                    DispatchResult {
                        p_nom_opt: peak,
                        p: vec![0.0; network.num_snapshots()],
                    },
                );
            }
            Ok(solution)
        }
    }

    struct AlwaysInfeasible;

    impl NetworkOptimizer for AlwaysInfeasible {
        fn name(&self) -> &str {
            "infeasible"
        }

        fn optimize(&self, _: &Network) -> Result<NetworkSolution, OptimizeError> {
            Err(OptimizeError::Infeasible("no feasible dispatch".into()))
        }
    }

    #[test]
    fn single_solve_by_default() {
        let inputs = ExpansionInputs::new(costs(), series());
        let optimizer = PeakSizer::default();
        let outcome =
            run_capacity_expansion(&inputs, &ModelConfig::default(), &optimizer).unwrap();

        assert_eq!(optimizer.calls.load(Ordering::SeqCst), 1);
        assert!(outcome.baseline.is_none());
        assert_eq!(outcome.network.storage_units().len(), 2);
        assert_eq!(outcome.network.global_constraint(CO2_LIMIT).unwrap().constant, 0.0);
        assert!(outcome.statistics.total_system_cost().value() > 0.0);
        assert!(outcome.summary().contains("system cost"));
    }

    #[test]
    fn baseline_solves_before_storage() {
        let inputs = ExpansionInputs::new(costs(), series());
        let mut config = ModelConfig::default();
        config.solver.baseline = true;
        config.storage.enabled = false;
        config.co2.limit = None;

        let optimizer = PeakSizer::default();
        let outcome = run_capacity_expansion(&inputs, &config, &optimizer).unwrap();
        assert_eq!(optimizer.calls.load(Ordering::SeqCst), 2);
        assert!(outcome.baseline.is_some());
        assert!(outcome.network.storage_units().is_empty());
        assert!(outcome.network.global_constraints().is_empty());
    }

    #[test]
    fn optimiser_error_propagates() {
        let inputs = ExpansionInputs::new(costs(), series());
        let err = run_capacity_expansion(&inputs, &ModelConfig::default(), &AlwaysInfeasible)
            .unwrap_err();
        let cause = err.downcast_ref::<OptimizeError>().unwrap();
        assert!(matches!(cause, OptimizeError::Infeasible(_)));
    }

    #[test]
    fn timeseries_is_scaled_and_resampled() {
        let raw = TimeSeries::from_reader(crate::builder::fixtures::SERIES.as_bytes()).unwrap();
        let ts = prepare_timeseries(raw, &ModelConfig::default()).unwrap();
        assert_eq!(ts.len(), 2);
        assert_eq!(ts.resolution_hours(), 4.0);
        assert_eq!(ts.column("load").unwrap(), vec![50_000.0, 58_000.0]);
    }

    #[test]
    fn matching_resolution_is_still_aligned_to_midnight() {
        let csv = "\
utc_time,load,onwind,offwind,solar
2015-01-01 02:00:00,50,0.5,0.6,0.0
2015-01-01 06:00:00,60,0.4,0.7,0.2
2015-01-01 10:00:00,70,0.3,0.5,0.6
";
        let raw = TimeSeries::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(raw.resolution_hours(), 4.0);

        let ts = prepare_timeseries(raw, &ModelConfig::default()).unwrap();
        let starts: Vec<String> = ts.index().iter().map(|t| t.format("%H:%M").to_string()).collect();
        assert_eq!(starts, ["00:00", "04:00", "08:00"]);
        assert_eq!(ts.column("load").unwrap(), vec![50_000.0, 60_000.0, 70_000.0]);
    }

    #[test]
    fn build_network_applies_configured_cap() {
        let inputs = ExpansionInputs::new(costs(), series());
        let mut config = ModelConfig::default();
        config.co2.limit = Some(1e6);
        let network = build_network(&inputs, &config).unwrap();
        assert_eq!(network.global_constraint(CO2_LIMIT).unwrap().constant, 1e6);
    }
}
