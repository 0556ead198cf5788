//! # cem-model: Single-node capacity-expansion model
//!
//! Turns a technology cost table and hourly load and capacity-factor series
//! into a [`cem_core::Network`] and solves it:
//!
//! 1. [`create_network`]: one bus, carriers with colours and emission factors,
//!    the demand, extendable OCGT and renewable generators.
//! 2. [`add_storage_units`]: battery and underground hydrogen storage.
//! 3. [`apply_co2_limit`]: emissions cap as a global constraint.
//! 4. [`run_capacity_expansion`]: the steps above plus an optional baseline
//!    solve, through any [`cem_algo::NetworkOptimizer`].
//!
//! Defaults live in [`ModelConfig`] and can be overridden from TOML.

pub mod builder;
pub mod config;
pub mod pipeline;

pub use builder::{add_storage_units, apply_co2_limit, create_network, CO2_LIMIT};
pub use config::{CarrierStyle, ModelConfig};
pub use pipeline::{
    build_network, prepare_timeseries, run_capacity_expansion, ExpansionInputs, ExpansionOutcome,
    SolvedRun,
};
