use std::path::Path;

use anyhow::Result;
use cem_algo::{NetworkOptimizer, NetworkSolution, NetworkStatistics};
use cem_cli::InputArgs;
use cem_io::save_network;
use cem_model::run_capacity_expansion;
use cem_viz::dispatch_chart;
use serde::Serialize;
use tracing::info;

use super::util::{load_config, load_inputs, optimizer};

pub struct ExpandArgs<'a> {
    pub inputs: &'a InputArgs,
    pub co2_limit: Option<f64>,
    pub skip_storage: bool,
    pub baseline: bool,
    pub out: &'a Path,
    pub dispatch_chart: Option<&'a Path>,
    pub period: Option<&'a str>,
}

#[derive(Serialize)]
struct ExpansionResults<'a> {
    solution: &'a NetworkSolution,
    statistics: &'a NetworkStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    baseline: Option<&'a NetworkStatistics>,
}

pub fn handle(config_path: Option<&Path>, args: ExpandArgs<'_>) -> Result<()> {
    let mut config = load_config(config_path, args.inputs)?;
    if let Some(limit) = args.co2_limit {
        config.co2.limit = Some(limit);
    }
    if args.skip_storage {
        config.storage.enabled = false;
    }
    if args.baseline {
        config.solver.baseline = true;
    }

    let inputs = load_inputs(&config)?;
    let optimizer = optimizer(&config)?;
    info!(solver = optimizer.name(), "running capacity expansion");
    let outcome = run_capacity_expansion(&inputs, &config, &optimizer)?;
    print!("{}", outcome.summary());

    let results = ExpansionResults {
        solution: &outcome.solution,
        statistics: &outcome.statistics,
        baseline: outcome.baseline.as_ref().map(|b| &b.statistics),
    };
    save_network(args.out, &outcome.network, Some(&results))?;
    println!("network written to {}", args.out.display());

    if let Some(path) = args.dispatch_chart {
        let chart = dispatch_chart(&outcome.network, &outcome.solution, args.period)?;
        chart.write_json(path)?;
        println!("dispatch chart written to {}", path.display());
    }
    Ok(())
}
