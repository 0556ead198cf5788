use std::process::ExitCode;

use cem_cli::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::FmtSubscriber;

mod commands;

use crate::commands::{costs, expand, sweep, validate};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install logger: {err}");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.config.as_deref();
    match &cli.command {
        Commands::Costs {
            costs,
            year,
            technologies,
        } => costs::handle(config, costs.as_deref(), *year, technologies),
        Commands::Expand {
            inputs,
            co2_limit,
            skip_storage,
            baseline,
            out,
            dispatch_chart,
            period,
        } => expand::handle(
            config,
            expand::ExpandArgs {
                inputs,
                co2_limit: *co2_limit,
                skip_storage: *skip_storage,
                baseline: *baseline,
                out,
                dispatch_chart: dispatch_chart.as_deref(),
                period: period.as_deref(),
            },
        ),
        Commands::Sweep {
            inputs,
            parameter,
            values,
            spec,
            continue_on_error,
            out,
        } => sweep::handle(
            config,
            sweep::SweepArgs {
                inputs,
                parameter: parameter.as_deref(),
                values,
                spec: spec.as_deref(),
                continue_on_error: *continue_on_error,
                out,
            },
        ),
        Commands::Validate { network } => validate::handle(network),
    }
}
