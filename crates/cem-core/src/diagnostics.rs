//! Findings collected while validating a network or reading input tables.
//!
//! Each finding has a [`Severity`], a [`Category`] for grouping and, where it
//! applies, the component or file it concerns.
//!
//! ```
//! use cem_core::diagnostics::{Category, Diagnostics};
//!
//! let mut diag = Diagnostics::new();
//! diag.warn(Category::Structure, "Network has no loads");
//! diag.error(Category::Series, "p_set has 3 values for 4 snapshots")
//!     .on("Load demand");
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.error_count(), 1);
//! assert_eq!(diag.summary(), "1 warning, 1 error");
//! ```

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The model can still be optimised
    Warning,
    /// Optimising the model will fail
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Missing buses, snapshots, loads or supply
    Structure,
    /// Time series lengths and per-unit bounds
    Series,
    /// Capacity bounds and peak coverage
    Capacity,
    Cost,
    /// Global constraints
    Constraint,
    /// Islanded buses
    Topology,
    /// Unreadable values in input tables
    Parse,
    /// Repeated entries in input tables
    Duplicate,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Structure => "structure",
            Category::Series => "series",
            Category::Capacity => "capacity",
            Category::Cost => "cost",
            Category::Constraint => "constraint",
            Category::Topology => "topology",
            Category::Parse => "parse",
            Category::Duplicate => "duplicate",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    /// Component or file concerned, e.g. "Generator solar"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    /// 1-based line for findings in input files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl DiagnosticIssue {
    pub fn new(severity: Severity, category: Category, message: impl Into<String>) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            entity: None,
            line: None,
        }
    }

    pub fn on(&mut self, entity: impl Into<String>) -> &mut Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn at_line(&mut self, line: usize) -> &mut Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "[{severity}:{}] {}", self.category, self.message)?;
        if let Some(entity) = &self.entity {
            write!(f, " ({entity})")?;
        }
        if let Some(line) = self.line {
            write!(f, " at line {line}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding; the returned issue can be tagged with an entity or line.
    pub fn push(
        &mut self,
        severity: Severity,
        category: Category,
        message: impl Into<String>,
    ) -> &mut DiagnosticIssue {
        self.issues
            .push(DiagnosticIssue::new(severity, category, message));
        let last = self.issues.len() - 1;
        &mut self.issues[last]
    }

    pub fn warn(&mut self, category: Category, message: impl Into<String>) -> &mut DiagnosticIssue {
        self.push(Severity::Warning, category, message)
    }

    pub fn error(&mut self, category: Category, message: impl Into<String>) -> &mut DiagnosticIssue {
        self.push(Severity::Error, category, message)
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.with_severity(Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    /// "No issues", "1 warning", "2 warnings, 1 error", ...
    pub fn summary(&self) -> String {
        fn count(n: usize, noun: &str) -> String {
            if n == 1 {
                format!("1 {noun}")
            } else {
                format!("{n} {noun}s")
            }
        }
        match (self.warning_count(), self.error_count()) {
            (0, 0) => "No issues".to_string(),
            (w, 0) => count(w, "warning"),
            (0, e) => count(e, "error"),
            (w, e) => format!("{}, {}", count(w, "warning"), count(e, "error")),
        }
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {issue}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_by_severity() {
        let mut diag = Diagnostics::new();
        assert_eq!(diag.summary(), "No issues");
        diag.warn(Category::Series, "short");
        assert_eq!(diag.summary(), "1 warning");
        diag.error(Category::Structure, "no buses");
        diag.error(Category::Structure, "no snapshots");
        assert_eq!(diag.summary(), "1 warning, 2 errors");
    }

    #[test]
    fn display_includes_entity_and_line() {
        let mut diag = Diagnostics::new();
        diag.error(Category::Parse, "bad value")
            .on("costs.csv")
            .at_line(12);
        assert_eq!(
            diag.issues[0].to_string(),
            "[error:parse] bad value (costs.csv) at line 12"
        );
    }

    #[test]
    fn filters_by_category() {
        let mut diag = Diagnostics::new();
        diag.warn(Category::Capacity, "a");
        diag.error(Category::Constraint, "b");
        diag.warn(Category::Capacity, "c");
        assert_eq!(diag.in_category(Category::Capacity).count(), 2);
        assert!(diag.has_errors());
        assert!(!diag.is_empty());
    }

    #[test]
    fn serializes_lowercase_tags() {
        let mut diag = Diagnostics::new();
        diag.warn(Category::Topology, "islands");
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["issues"][0]["severity"], "warning");
        assert_eq!(json["issues"][0]["category"], "topology");
        assert!(json["issues"][0].get("line").is_none());
    }
}
