use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result};
use cem_core::Network;
use cem_viz::{AreaChart, XValues};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::runner::RunResult;
use crate::target::ParameterTarget;

pub const SYSTEM_COST_LABEL: &str = "System cost [bn€/a]";

/// Fixed vertical range of sensitivity charts (bn€/a).
pub const SYSTEM_COST_RANGE: (f64, f64) = (0.0, 100.0);

/// Results of one sweep with enough metadata to plot and trace them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityReport {
    pub run_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub target: ParameterTarget,
    pub solver: String,
    pub results: Vec<RunResult>,
}

impl SensitivityReport {
    pub fn new(
        name: impl Into<String>,
        target: ParameterTarget,
        solver: impl Into<String>,
        results: Vec<RunResult>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
            target,
            solver: solver.into(),
            results,
        }
    }

    /// Carriers across all successful runs, in order of first appearance.
    pub fn carriers(&self) -> Vec<String> {
        let mut carriers: Vec<String> = Vec::new();
        for (carrier, _) in self.results.iter().flat_map(|r| &r.cost_by_carrier) {
            if !carriers.contains(carrier) {
                carriers.push(carrier.clone());
            }
        }
        carriers
    }

    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.is_ok()).count()
    }

    /// One row per value: the value, cost per carrier and total in bn€/a,
    /// and the error of failed runs.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let carriers = self.carriers();
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("creating sweep csv '{}'", path.display()))?;

        let mut header = vec![self.target.id.clone()];
        header.extend(carriers.iter().cloned());
        header.push("total".to_string());
        header.push("error".to_string());
        writer.write_record(&header)?;

        for result in &self.results {
            let mut row = vec![result.value.to_string()];
            for carrier in &carriers {
                let cell = match result.total_cost {
                    Some(_) => format_bn(carrier_cost(result, carrier)),
                    None => String::new(),
                };
                row.push(cell);
            }
            row.push(result.total_cost.map(format_bn).unwrap_or_default());
            row.push(result.error.clone().unwrap_or_default());
            writer.write_record(&row)?;
        }
        writer
            .flush()
            .with_context(|| format!("writing sweep csv '{}'", path.display()))?;
        Ok(())
    }

    pub fn write_manifest(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating manifest directory '{}'", parent.display()))?;
        }
        let json =
            serde_json::to_string_pretty(self).context("serializing sweep manifest to JSON")?;
        fs::write(path, json)
            .with_context(|| format!("writing sweep manifest '{}'", path.display()))?;
        Ok(())
    }

    /// Stacked system cost by carrier over the swept values. Failed runs are
    /// left out; colours come from the network's carriers.
    pub fn to_area_chart(&self, network: &Network) -> Result<AreaChart> {
        let ok: Vec<&RunResult> = self.results.iter().filter(|r| r.is_ok()).collect();
        let x = ok.iter().map(|r| r.value).collect();
        let mut chart = AreaChart::new(&self.target.title, XValues::Numeric(x))
            .with_labels(&self.target.x_label, SYSTEM_COST_LABEL)
            .with_y_range(SYSTEM_COST_RANGE.0, SYSTEM_COST_RANGE.1);
        for carrier in self.carriers() {
            let values = ok
                .iter()
                .map(|r| carrier_cost(r, &carrier) / 1e9)
                .collect();
            let color = network.carrier_color(&carrier).map(str::to_string);
            chart.push_area(carrier, color, values)?;
        }
        Ok(chart)
    }
}

pub fn load_manifest(path: &Path) -> Result<SensitivityReport> {
    let file =
        File::open(path).with_context(|| format!("opening sweep manifest '{}'", path.display()))?;
    serde_json::from_reader(file)
        .with_context(|| format!("parsing sweep manifest '{}'", path.display()))
}

fn carrier_cost(result: &RunResult, carrier: &str) -> f64 {
    result
        .cost_by_carrier
        .iter()
        .find(|(c, _)| c == carrier)
        .map(|(_, cost)| *cost)
        .unwrap_or(0.0)
}

fn format_bn(euros: f64) -> String {
    format!("{:.6}", euros / 1e9)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cem_core::{Bus, Carrier};

    fn report() -> SensitivityReport {
        let results = vec![
            RunResult {
                value: 150.0,
                total_cost: Some(30e9),
                cost_by_carrier: vec![("OCGT".into(), 10e9), ("solar".into(), 20e9)],
                error: None,
                solve_time_ms: 5,
            },
            RunResult {
                value: 0.0,
                total_cost: None,
                cost_by_carrier: Vec::new(),
                error: Some("Problem infeasible: test".into()),
                solve_time_ms: 1,
            },
            RunResult {
                value: 50.0,
                total_cost: Some(45e9),
                cost_by_carrier: vec![("solar".into(), 25e9), ("battery storage".into(), 20e9)],
                error: None,
                solve_time_ms: 7,
            },
        ];
        SensitivityReport::new("co2", ParameterTarget::co2_limit(), "lp-clarabel", results)
    }

    #[test]
    fn csv_has_one_row_per_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("co2.csv");
        report().write_csv(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "co2-limit,OCGT,solar,battery storage,total,error");
        assert_eq!(lines[1], "150,10.000000,20.000000,0.000000,30.000000,");
        assert_eq!(lines[2], "0,,,,,Problem infeasible: test");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn manifest_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("co2.json");
        let report = report();
        report.write_manifest(&path).unwrap();
        let back = load_manifest(&path).unwrap();
        assert_eq!(back.run_id, report.run_id);
        assert_eq!(back.results, report.results);
        assert_eq!(back.failures(), 1);
    }

    #[test]
    fn chart_skips_failed_runs() {
        let mut network = Network::new();
        network.add_bus(Bus::new("electricity")).unwrap();
        network
            .add_carrier(Carrier::new("solar").with_color("gold"))
            .unwrap();

        let chart = report().to_area_chart(&network).unwrap();
        assert_eq!(chart.title, "Sensitivity on CO2 emissions");
        assert_eq!(chart.y_label, SYSTEM_COST_LABEL);
        assert_eq!(chart.y_range, Some((0.0, 100.0)));
        assert_eq!(chart.x, XValues::Numeric(vec![150.0, 50.0]));
        assert_eq!(chart.areas.len(), 3);
        assert_eq!(chart.areas[1].color.as_deref(), Some("gold"));
        assert_eq!(chart.areas[1].values, vec![20.0, 25.0]);
        assert_eq!(chart.totals(), vec![30.0, 45.0]);
    }
}
