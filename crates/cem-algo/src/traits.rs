//! The seam between model orchestration and numerical optimisation.
//!
//! Sweeps and the expansion pipeline only see [`NetworkOptimizer`], so tests
//! can substitute a deterministic stand-in and other formulations can be
//! added without touching callers.

use cem_core::Network;

use crate::{NetworkSolution, OptimizeError};

/// Solves a network for optimal capacities and dispatch.
pub trait NetworkOptimizer: Send + Sync {
    /// Short identifier used in logs and manifests (e.g. "lp-clarabel")
    fn name(&self) -> &str;

    /// Run one blocking optimisation. The network is only read.
    fn optimize(&self, network: &Network) -> Result<NetworkSolution, OptimizeError>;
}

impl<T: NetworkOptimizer + ?Sized> NetworkOptimizer for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn optimize(&self, network: &Network) -> Result<NetworkSolution, OptimizeError> {
        (**self).optimize(network)
    }
}

impl<T: NetworkOptimizer + ?Sized> NetworkOptimizer for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn optimize(&self, network: &Network) -> Result<NetworkSolution, OptimizeError> {
        (**self).optimize(network)
    }
}
