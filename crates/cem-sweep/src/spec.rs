use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::target::ParameterTarget;

/// File listing one or more named sweeps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepSpec {
    #[serde(default)]
    pub sweeps: Vec<SweepDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepDefinition {
    pub name: String,
    /// Preset id or `<kind>:<name>:<attribute>`
    pub parameter: String,
    /// Candidate values; the preset defaults when empty
    #[serde(default)]
    pub values: Vec<f64>,
    /// Overrides the target's unit scale
    pub scale: Option<f64>,
    pub title: Option<String>,
    pub x_label: Option<String>,
}

/// A sweep definition with its target resolved.
#[derive(Debug, Clone)]
pub struct ResolvedSweep {
    pub name: String,
    pub target: ParameterTarget,
    pub values: Vec<f64>,
}

impl SweepDefinition {
    pub fn resolve(&self) -> Result<ResolvedSweep> {
        let mut target: ParameterTarget = self
            .parameter
            .parse()
            .with_context(|| format!("sweep '{}'", self.name))?;
        if let Some(scale) = self.scale {
            target = target.with_scale(scale);
        }
        if let Some(title) = &self.title {
            target.title = title.clone();
        }
        if let Some(x_label) = &self.x_label {
            target.x_label = x_label.clone();
        }
        let values = if self.values.is_empty() {
            target.default_values().ok_or_else(|| {
                anyhow!(
                    "sweep '{}' must list values; '{}' has no defaults",
                    self.name,
                    self.parameter
                )
            })?
        } else {
            self.values.clone()
        };
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(anyhow!("sweep '{}' has non-finite value {}", self.name, bad));
        }
        Ok(ResolvedSweep {
            name: self.name.clone(),
            target,
            values,
        })
    }
}

pub fn load_sweep_spec(path: &Path) -> Result<SweepSpec> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading sweep spec '{}'", path.display()))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            serde_yaml::from_str(&data).context("parsing sweep spec yaml")
        }
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            serde_json::from_str(&data).context("parsing sweep spec json")
        }
        _ => serde_yaml::from_str(&data)
            .or_else(|_| serde_json::from_str(&data))
            .context("parsing sweep spec"),
    }
}

impl SweepSpec {
    /// Resolve every sweep, rejecting empty specs, blank or duplicate names
    /// and unusable values.
    pub fn resolve(&self) -> Result<Vec<ResolvedSweep>> {
        if self.sweeps.is_empty() {
            return Err(anyhow!("sweep spec contains no sweeps"));
        }
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(self.sweeps.len());
        for sweep in &self.sweeps {
            if sweep.name.trim().is_empty() {
                return Err(anyhow!("sweep name cannot be empty"));
            }
            if !seen.insert(sweep.name.clone()) {
                return Err(anyhow!("duplicate sweep name '{}' in spec", sweep.name));
            }
            resolved.push(sweep.resolve()?);
        }
        Ok(resolved)
    }

    pub fn validate(&self) -> Result<()> {
        self.resolve().map(|_| ())
    }
}
