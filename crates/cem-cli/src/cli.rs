use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Capacity-expansion modelling and sensitivity sweeps", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    /// Model configuration (TOML); defaults apply when omitted
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Input locations shared by the commands that build a model.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Cost table: path or URL (default: the published table for the cost year)
    #[arg(long)]
    pub costs: Option<String>,

    /// Hourly time series: path or URL
    #[arg(long)]
    pub timeseries: Option<String>,

    /// LP backend (e.g. clarabel, highs)
    #[arg(long)]
    pub solver: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the processed technology cost table
    Costs {
        /// Cost table: path or URL
        #[arg(long)]
        costs: Option<String>,
        /// Cost year of the published table
        #[arg(long)]
        year: Option<u16>,
        /// Only these technologies (repeatable)
        #[arg(long = "tech")]
        technologies: Vec<String>,
    },
    /// Build the model, add storage and the CO2 cap, and optimise once
    Expand {
        #[command(flatten)]
        inputs: InputArgs,
        /// CO2 cap in tCO2 (overrides the config)
        #[arg(long)]
        co2_limit: Option<f64>,
        /// Do not add battery and hydrogen storage
        #[arg(long)]
        skip_storage: bool,
        /// Solve once without storage and cap before the main solve
        #[arg(long)]
        baseline: bool,
        /// Output network with results (JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        out: PathBuf,
        /// Write a dispatch chart spec (JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        dispatch_chart: Option<PathBuf>,
        /// Timestamp prefix selecting the dispatch chart period, e.g. 2015-07
        #[arg(long, requires = "dispatch_chart")]
        period: Option<String>,
    },
    /// Re-optimise for each value of one parameter
    Sweep {
        #[command(flatten)]
        inputs: InputArgs,
        /// co2-limit, solar-cost, offwind-potential or <kind>:<name>:<attribute>
        #[arg(long, conflicts_with = "spec", required_unless_present = "spec")]
        parameter: Option<String>,
        /// Comma-separated values (preset defaults when omitted)
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true, requires = "parameter")]
        values: Vec<f64>,
        /// Sweep spec file (YAML or JSON) with one or more sweeps
        #[arg(long, value_hint = ValueHint::FilePath)]
        spec: Option<PathBuf>,
        /// Record failed points and keep going
        #[arg(long)]
        continue_on_error: bool,
        /// Output directory for CSV, manifest and chart files
        #[arg(long, value_hint = ValueHint::DirPath)]
        out: PathBuf,
    },
    /// Check an exported network for modelling issues
    Validate {
        /// Network JSON written by `expand`
        #[arg(long, value_hint = ValueHint::FilePath)]
        network: PathBuf,
    },
}
