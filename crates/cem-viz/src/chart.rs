use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Horizontal axis positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum XValues {
    Numeric(Vec<f64>),
    Time(Vec<NaiveDateTime>),
}

impl XValues {
    pub fn len(&self) -> usize {
        match self {
            XValues::Numeric(v) => v.len(),
            XValues::Time(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaSeries {
    pub label: String,
    #[serde(default)]
    pub color: Option<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSeries {
    pub label: String,
    #[serde(default)]
    pub color: Option<String>,
    pub values: Vec<f64>,
}

/// Lower and upper edge of one stacked area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Band {
    pub label: String,
    pub color: Option<String>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Stacked area chart with optional overlaid lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x: XValues,
    /// Stacked in order, positive values upwards and negative values downwards
    pub areas: Vec<AreaSeries>,
    #[serde(default)]
    pub lines: Vec<LineSeries>,
    #[serde(default)]
    pub y_range: Option<(f64, f64)>,
}

impl AreaChart {
    pub fn new(title: impl Into<String>, x: XValues) -> Self {
        Self {
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            x,
            areas: Vec::new(),
            lines: Vec::new(),
            y_range: None,
        }
    }

    pub fn with_labels(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    pub fn with_y_range(mut self, min: f64, max: f64) -> Self {
        self.y_range = Some((min, max));
        self
    }

    pub fn push_area(
        &mut self,
        label: impl Into<String>,
        color: Option<String>,
        values: Vec<f64>,
    ) -> Result<()> {
        let label = label.into();
        self.check_len(&label, values.len())?;
        self.areas.push(AreaSeries {
            label,
            color,
            values,
        });
        Ok(())
    }

    pub fn push_line(
        &mut self,
        label: impl Into<String>,
        color: Option<String>,
        values: Vec<f64>,
    ) -> Result<()> {
        let label = label.into();
        self.check_len(&label, values.len())?;
        self.lines.push(LineSeries {
            label,
            color,
            values,
        });
        Ok(())
    }

    fn check_len(&self, label: &str, len: usize) -> Result<()> {
        if len != self.x.len() {
            bail!(
                "series '{}' has {} values but the chart has {} x positions",
                label,
                len,
                self.x.len()
            );
        }
        Ok(())
    }

    /// Stack the areas: positive values accumulate upwards from zero and
    /// negative values downwards, each series on top of the previous ones.
    pub fn cumulative_bands(&self) -> Vec<Band> {
        let n = self.x.len();
        let mut pos = vec![0.0; n];
        let mut neg = vec![0.0; n];
        self.areas
            .iter()
            .map(|area| {
                let mut lower = Vec::with_capacity(n);
                let mut upper = Vec::with_capacity(n);
                for (i, &v) in area.values.iter().enumerate() {
                    if v >= 0.0 {
                        lower.push(pos[i]);
                        pos[i] += v;
                        upper.push(pos[i]);
                    } else {
                        upper.push(neg[i]);
                        neg[i] += v;
                        lower.push(neg[i]);
                    }
                }
                Band {
                    label: area.label.clone(),
                    color: area.color.clone(),
                    lower,
                    upper,
                }
            })
            .collect()
    }

    /// Sum of all areas at each x position.
    pub fn totals(&self) -> Vec<f64> {
        (0..self.x.len())
            .map(|i| self.areas.iter().map(|a| a.values[i]).sum())
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("writing chart {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart() -> AreaChart {
        let mut chart = AreaChart::new("Sensitivity", XValues::Numeric(vec![0.0, 50.0]))
            .with_labels("potential [GW]", "System cost [bn€/a]")
            .with_y_range(0.0, 100.0);
        chart
            .push_area("solar", Some("gold".into()), vec![10.0, 8.0])
            .unwrap();
        chart
            .push_area("battery", None, vec![-2.0, 3.0])
            .unwrap();
        chart
            .push_area("onwind", Some("dodgerblue".into()), vec![5.0, -1.0])
            .unwrap();
        chart
    }

    #[test]
    fn bands_stack_by_sign() {
        let bands = chart().cumulative_bands();
        assert_eq!(bands[0].lower, vec![0.0, 0.0]);
        assert_eq!(bands[0].upper, vec![10.0, 8.0]);
        assert_eq!(bands[1].lower, vec![-2.0, 8.0]);
        assert_eq!(bands[1].upper, vec![0.0, 11.0]);
        assert_eq!(bands[2].lower, vec![10.0, -1.0]);
        assert_eq!(bands[2].upper, vec![15.0, 0.0]);
    }

    #[test]
    fn mismatched_series_is_rejected() {
        let mut chart = chart();
        let err = chart.push_line("load", None, vec![1.0]).unwrap_err();
        assert!(err.to_string().contains("load"));
    }

    #[test]
    fn json_file_roundtrip() {
        let chart = chart();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.json");
        chart.write_json(&path).unwrap();
        let back: AreaChart =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, chart);
        assert_eq!(back.totals(), vec![13.0, 10.0]);
    }
}
