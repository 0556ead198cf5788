//! Error type shared by the cem crates.
//!
//! Optimiser failures have their own type (`cem_algo::OptimizeError`) and
//! convert into [`CemError::Solver`] where the two meet.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CemError {
    /// Malformed input values or tables
    #[error("Parse error: {0}")]
    Parse(String),

    /// Physically meaningless attribute values
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Solver error: {0}")]
    Solver(String),

    /// Duplicate names and dangling bus or carrier references
    #[error("Network error: {0}")]
    Network(String),

    /// Lookup of a component, technology or attribute that does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

pub type CemResult<T> = Result<T, CemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_kind() {
        let err = CemError::Network("duplicate generator 'solar'".into());
        assert_eq!(err.to_string(), "Network error: duplicate generator 'solar'");
        let err = CemError::NotFound("technology 'fusion' in cost table".into());
        assert!(err.to_string().starts_with("Not found"));
    }

    #[test]
    fn propagates_through_question_mark() {
        fn inner() -> CemResult<()> {
            Err(CemError::Validation("negative efficiency".into()))
        }

        fn outer() -> CemResult<()> {
            inner()?;
            Ok(())
        }

        assert!(matches!(outer(), Err(CemError::Validation(_))));
    }

    #[test]
    fn converts_into_anyhow() {
        let err: anyhow::Error = CemError::Solver("infeasible".into()).into();
        assert!(err.downcast_ref::<CemError>().is_some());
    }
}
