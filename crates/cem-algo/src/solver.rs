//! LP backend selection.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail};
use serde::{Deserialize, Serialize};

/// LP backends `good_lp` can hand the expansion problem to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LpSolverKind {
    /// Interior point, pure Rust; always built
    #[default]
    Clarabel,
    #[cfg(feature = "solver-highs")]
    Highs,
}

/// Backends compiled into this build, in order of preference.
const COMPILED: &[LpSolverKind] = &[
    LpSolverKind::Clarabel,
    #[cfg(feature = "solver-highs")]
    LpSolverKind::Highs,
];

/// Backends that exist behind a cargo feature, with the feature name.
const OPTIONAL: &[(&str, &str)] = &[("highs", "solver-highs")];

impl LpSolverKind {
    pub fn available() -> Vec<&'static str> {
        COMPILED.iter().map(LpSolverKind::as_str).collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LpSolverKind::Clarabel => "clarabel",
            #[cfg(feature = "solver-highs")]
            LpSolverKind::Highs => "highs",
        }
    }
}

impl fmt::Display for LpSolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LpSolverKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        if let Some(kind) = COMPILED.iter().find(|k| k.as_str() == wanted) {
            return Ok(*kind);
        }
        if let Some((_, feature)) = OPTIONAL.iter().find(|(name, _)| *name == wanted) {
            bail!("lp solver '{wanted}' requires building with the {feature} feature");
        }
        Err(anyhow!(
            "unknown lp solver '{}'; supported values: {}",
            wanted,
            LpSolverKind::available().join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(" Clarabel".parse::<LpSolverKind>().unwrap(), LpSolverKind::Clarabel);
        assert_eq!(LpSolverKind::default().as_str(), "clarabel");
        assert!(LpSolverKind::available().contains(&"clarabel"));
    }

    #[test]
    fn unknown_solver_lists_alternatives() {
        let err = "gurobi".parse::<LpSolverKind>().unwrap_err();
        assert!(err.to_string().contains("clarabel"));
    }

    #[cfg(not(feature = "solver-highs"))]
    #[test]
    fn feature_gated_solver_names_the_feature() {
        let err = "highs".parse::<LpSolverKind>().unwrap_err();
        assert!(err.to_string().contains("solver-highs"));
    }
}
