use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use cem_algo::NetworkOptimizer;
use cem_cli::InputArgs;
use cem_model::build_network;
use cem_sweep::{
    load_sweep_spec, FailurePolicy, ParameterTarget, ResolvedSweep, SensitivityReport,
    SensitivityRunner,
};
use tabwriter::TabWriter;
use tracing::info;

use super::util::{load_config, load_inputs, optimizer};

pub struct SweepArgs<'a> {
    pub inputs: &'a InputArgs,
    pub parameter: Option<&'a str>,
    pub values: &'a [f64],
    pub spec: Option<&'a Path>,
    pub continue_on_error: bool,
    pub out: &'a Path,
}

pub fn handle(config_path: Option<&Path>, args: SweepArgs<'_>) -> Result<()> {
    // Resolve what to sweep before loading any data
    let sweeps = match (args.spec, args.parameter) {
        (Some(spec), _) => load_sweep_spec(spec)?.resolve()?,
        (None, Some(parameter)) => vec![single_sweep(parameter, args.values)?],
        (None, None) => return Err(anyhow!("either --parameter or --spec is required")),
    };

    let config = load_config(config_path, args.inputs)?;
    let inputs = load_inputs(&config)?;
    let mut network = build_network(&inputs, &config)?;
    let optimizer = optimizer(&config)?;
    let policy = if args.continue_on_error {
        FailurePolicy::Record
    } else {
        FailurePolicy::Abort
    };
    let runner = SensitivityRunner::new(&optimizer).with_policy(policy);

    fs::create_dir_all(args.out)
        .with_context(|| format!("creating output directory '{}'", args.out.display()))?;

    for sweep in sweeps {
        info!(
            sweep = %sweep.name,
            parameter = %sweep.target,
            points = sweep.values.len(),
            "starting sweep"
        );
        let results = runner.run(&mut network, &sweep.target, &sweep.values)?;
        let report = SensitivityReport::new(&sweep.name, sweep.target, optimizer.name(), results);

        report.write_csv(&args.out.join(format!("{}.csv", sweep.name)))?;
        report.write_manifest(&args.out.join(format!("{}.json", sweep.name)))?;
        report
            .to_area_chart(&network)?
            .write_json(&args.out.join(format!("{}.chart.json", sweep.name)))?;
        print_report(&report)?;
    }
    Ok(())
}

fn single_sweep(parameter: &str, values: &[f64]) -> Result<ResolvedSweep> {
    let target: ParameterTarget = parameter.parse()?;
    let values = if values.is_empty() {
        target
            .default_values()
            .ok_or_else(|| anyhow!("--values is required for '{}'", parameter))?
    } else {
        values.to_vec()
    };
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(anyhow!("sweep '{}' has non-finite value {}", target.id, bad));
    }
    Ok(ResolvedSweep {
        name: target.id.clone(),
        target,
        values,
    })
}

fn print_report(report: &SensitivityReport) -> Result<()> {
    println!("{}", report.target.title);
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "VALUE\tSYSTEM COST [bn EUR/a]\tSTATUS")?;
    for result in &report.results {
        let cost = result
            .total_cost
            .map(|c| format!("{:.3}", c / 1e9))
            .unwrap_or_else(|| "-".to_string());
        let status = result.error.as_deref().unwrap_or("ok");
        writeln!(writer, "{}\t{}\t{}", result.value, cost, status)?;
    }
    writer.flush()?;
    Ok(())
}
