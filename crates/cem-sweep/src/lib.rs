//! # cem-sweep: Sensitivity analysis of system cost
//!
//! Re-optimises one network for each candidate value of a single parameter
//! and collects total and per-carrier system cost:
//!
//! - [`ParameterTarget`]: which attribute a value changes and how it is scaled
//!   (`co2-limit` in Mt/a, `solar-cost` in k€/MW/a, `offwind-potential` in GW,
//!   or any generator, storage unit or global constraint attribute);
//! - [`SensitivityRunner`]: sequential sweep with a [`FailurePolicy`];
//! - [`SweepSpec`]: named sweeps read from YAML or JSON;
//! - [`SensitivityReport`]: CSV, JSON manifest and stacked area chart output.

pub mod report;
pub mod runner;
pub mod spec;
pub mod target;

pub use report::{load_manifest, SensitivityReport, SYSTEM_COST_LABEL};
pub use runner::{FailurePolicy, RunResult, SensitivityRunner};
pub use spec::{load_sweep_spec, ResolvedSweep, SweepDefinition, SweepSpec};
pub use target::{Attribute, ParameterTarget};
