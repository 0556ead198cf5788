use std::path::Path;

use anyhow::{Context, Result};
use cem_algo::{LinearExpansionOptimizer, LpSolverKind};
use cem_io::SourceCache;
use cem_model::{ExpansionInputs, ModelConfig};
use cem_cli::InputArgs;
use tracing::info;

/// Config file (or defaults) with command-line overrides applied.
pub fn load_config(path: Option<&Path>, inputs: &InputArgs) -> Result<ModelConfig> {
    let mut config = match path {
        Some(path) => ModelConfig::from_path(path)?,
        None => ModelConfig::default(),
    };
    if let Some(costs) = &inputs.costs {
        config.data.costs = Some(costs.clone());
    }
    if let Some(ts) = &inputs.timeseries {
        config.data.timeseries = ts.clone();
    }
    if let Some(solver) = &inputs.solver {
        config.solver.lp = solver.clone();
    }
    config.validate()?;
    Ok(config)
}

pub fn load_inputs(config: &ModelConfig) -> Result<ExpansionInputs> {
    let cache = SourceCache::default_location()?;
    info!(
        costs = %config.costs_source(),
        timeseries = %config.data.timeseries,
        "loading inputs"
    );
    ExpansionInputs::load(config, &cache)
}

pub fn optimizer(config: &ModelConfig) -> Result<LinearExpansionOptimizer> {
    let kind: LpSolverKind = config
        .solver
        .lp
        .parse()
        .with_context(|| format!("solver '{}'", config.solver.lp))?;
    Ok(LinearExpansionOptimizer::new(kind))
}
