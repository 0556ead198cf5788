//! # cem-algo: Capacity-expansion optimisation
//!
//! Builds and solves the linear capacity-expansion problem for a
//! [`cem_core::Network`] and derives per-carrier statistics from the result.
//!
//! | Item | Role |
//! |------|------|
//! | [`NetworkOptimizer`] | Trait every optimiser implements; callers depend only on it |
//! | [`LinearExpansionOptimizer`] | LP formulation solved through `good_lp` |
//! | [`LpSolverKind`] | Backend selection (`clarabel`, `highs` with `solver-highs`) |
//! | [`NetworkSolution`] | Optimal capacities, dispatch, storage levels, emissions |
//! | [`NetworkStatistics`] | Capex, opex, supply, curtailment per carrier |
//!
//! ## Example
//!
//! ```no_run
//! use cem_algo::{LinearExpansionOptimizer, NetworkOptimizer, NetworkStatistics};
//! use cem_core::Network;
//!
//! # fn load() -> Network { Network::new() }
//! let network = load();
//! let optimizer = LinearExpansionOptimizer::default();
//! let solution = optimizer.optimize(&network)?;
//! let stats = NetworkStatistics::compute(&network, &solution);
//! println!("system cost: {:.2} bn EUR/a", stats.total_system_cost().to_billions());
//! # Ok::<(), cem_algo::OptimizeError>(())
//! ```

pub mod error;
pub mod expansion;
pub mod solver;
pub mod statistics;
pub mod traits;

pub use error::OptimizeError;
pub use expansion::{
    DispatchResult, LinearExpansionOptimizer, NetworkSolution, SolveStatus, StorageResult,
    StoreResult,
};
pub use solver::LpSolverKind;
pub use statistics::{CarrierStatistics, NetworkStatistics};
pub use traits::NetworkOptimizer;
