//! Optimisation failures.

use cem_core::CemError;
use good_lp::ResolutionError;
use thiserror::Error;

/// Errors raised while building or solving a capacity-expansion problem.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizeError {
    /// The network failed validation before an LP was built
    #[error("Network validation error: {0}")]
    NetworkValidation(String),

    /// No dispatch and investment satisfies all constraints
    #[error("Problem infeasible: {0}")]
    Infeasible(String),

    /// Objective can decrease without bound (e.g. negative costs on unbounded capacity)
    #[error("Problem unbounded: {0}")]
    Unbounded(String),

    /// Model feature the formulation does not cover
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Any other solver-reported failure
    #[error("Solver failed: {0}")]
    SolverFailed(String),
}

impl From<ResolutionError> for OptimizeError {
    fn from(err: ResolutionError) -> Self {
        match err {
            ResolutionError::Infeasible => {
                OptimizeError::Infeasible("solver reported primal infeasibility".into())
            }
            ResolutionError::Unbounded => {
                OptimizeError::Unbounded("solver reported an unbounded objective".into())
            }
            ResolutionError::Other(msg) => OptimizeError::SolverFailed(msg.to_string()),
            ResolutionError::Str(msg) => OptimizeError::SolverFailed(msg),
            #[allow(unreachable_patterns)]
            other => OptimizeError::SolverFailed(other.to_string()),
        }
    }
}

impl From<OptimizeError> for CemError {
    fn from(err: OptimizeError) -> Self {
        CemError::Solver(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_errors_map_to_variants() {
        assert!(matches!(
            OptimizeError::from(ResolutionError::Infeasible),
            OptimizeError::Infeasible(_)
        ));
        assert!(matches!(
            OptimizeError::from(ResolutionError::Str("iteration limit".into())),
            OptimizeError::SolverFailed(msg) if msg == "iteration limit"
        ));
    }

    #[test]
    fn converts_into_crate_error() {
        let err: CemError = OptimizeError::Unsupported("links with bus2".into()).into();
        assert!(err.to_string().starts_with("Solver error: Unsupported"));
    }
}
