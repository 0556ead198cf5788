//! Time-indexed input tables: demand and per-technology capacity factors.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::debug;

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a timestamp cell. Accepts `YYYY-MM-DD HH:MM:SS`, the ISO `T`
/// variant, RFC 3339 (offset dropped) and bare dates.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.naive_local());
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(ts) = date.and_hms_opt(0, 0, 0) {
            return Ok(ts);
        }
    }
    bail!("unrecognised timestamp '{}'", text)
}

/// Column-oriented table indexed by timestamp. Missing cells are `None`.
#[derive(Debug, Clone, Serialize)]
pub struct TimeSeries {
    index: Vec<NaiveDateTime>,
    names: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
    resolution_hours: f64,
}

impl TimeSeries {
    pub fn new(index: Vec<NaiveDateTime>, resolution_hours: f64) -> Self {
        Self {
            index,
            names: Vec::new(),
            columns: Vec::new(),
            resolution_hours,
        }
    }

    /// Add or replace a column; its length must match the index.
    pub fn insert_column(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<()> {
        if values.len() != self.index.len() {
            bail!(
                "column '{}' has {} values for {} timestamps",
                name,
                values.len(),
                self.index.len()
            );
        }
        match self.names.iter().position(|n| n == name) {
            Some(idx) => self.columns[idx] = values,
            None => {
                self.names.push(name.to_string());
                self.columns.push(values);
            }
        }
        Ok(())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("opening time series {}", path.display()))?;
        Self::from_reader(file).with_context(|| format!("reading time series {}", path.display()))
    }

    /// Read a CSV whose first column is the timestamp. The resolution is
    /// taken from the first two rows (one hour for a single row).
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr.headers().context("reading header row")?.clone();
        if headers.len() < 2 {
            bail!("expected a timestamp column followed by at least one value column");
        }
        let names: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
        let mut index = Vec::new();
        let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); names.len()];

        for (idx, record) in rdr.records().enumerate() {
            let line = idx + 2;
            let record = record.with_context(|| format!("reading line {}", line))?;
            let stamp = record
                .get(0)
                .ok_or_else(|| anyhow!("line {} has no timestamp", line))?;
            index.push(parse_timestamp(stamp).with_context(|| format!("line {}", line))?);
            for (col, values) in columns.iter_mut().enumerate() {
                let cell = record.get(col + 1).unwrap_or("");
                let value = if cell.is_empty() {
                    None
                } else {
                    Some(cell.parse::<f64>().with_context(|| {
                        format!("line {}: column '{}' value '{}'", line, names[col], cell)
                    })?)
                };
                values.push(value);
            }
        }

        let resolution_hours = match (index.first(), index.get(1)) {
            (Some(a), Some(b)) => (*b - *a).num_seconds() as f64 / 3600.0,
            _ => 1.0,
        };
        debug!(
            rows = index.len(),
            columns = names.len(),
            resolution_hours,
            "loaded time series"
        );
        Ok(Self {
            index,
            names,
            columns,
            resolution_hours,
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Hours represented by each row.
    pub fn resolution_hours(&self) -> f64 {
        self.resolution_hours
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| anyhow!("time series has no column '{}'", name))
    }

    /// Raw column including gaps.
    pub fn column_raw(&self, name: &str) -> Result<&[Option<f64>]> {
        Ok(&self.columns[self.position(name)?])
    }

    /// Column values; fails on the first gap, naming its timestamp.
    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        self.column_raw(name)?
            .iter()
            .zip(&self.index)
            .map(|(value, ts)| {
                value.ok_or_else(|| anyhow!("column '{}' has no value at {}", name, ts))
            })
            .collect()
    }

    /// Multiply a column in place, e.g. `load` from GW to MW.
    pub fn scale_column(&mut self, name: &str, factor: f64) -> Result<()> {
        let idx = self.position(name)?;
        for value in self.columns[idx].iter_mut().flatten() {
            *value *= factor;
        }
        Ok(())
    }

    /// Aggregate into buckets of `hours`, anchored at midnight of the first
    /// day. Each bucket keeps the first present value of every column; empty
    /// buckets become gaps.
    pub fn resample(&self, hours: f64) -> Result<Self> {
        if !(hours > 0.0 && hours.is_finite()) {
            bail!("resample step must be positive, got {} h", hours);
        }
        let step = (hours * 3600.0).round() as i64;
        if step == 0 {
            bail!("resample step of {} h is below one second", hours);
        }
        let Some(first) = self.index.iter().min() else {
            return Ok(Self::new(Vec::new(), hours));
        };
        let origin = first
            .date()
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow!("invalid origin for {}", first))?;
        let bucket_of = |ts: &NaiveDateTime| (*ts - origin).num_seconds().div_euclid(step);

        // Stable ordering by time keeps "first" well defined for unsorted input.
        let mut order: Vec<usize> = (0..self.index.len()).collect();
        order.sort_by_key(|&i| self.index[i]);

        let first_bucket = bucket_of(&self.index[order[0]]);
        let last_bucket = bucket_of(&self.index[order[order.len() - 1]]);
        let buckets = (last_bucket - first_bucket + 1) as usize;

        let index = (0..buckets)
            .map(|b| origin + Duration::seconds((first_bucket + b as i64) * step))
            .collect();
        let mut columns = vec![vec![None; buckets]; self.columns.len()];
        for &row in &order {
            let bucket = (bucket_of(&self.index[row]) - first_bucket) as usize;
            for (col, values) in self.columns.iter().enumerate() {
                if columns[col][bucket].is_none() {
                    columns[col][bucket] = values[row];
                }
            }
        }

        debug!(from = self.len(), to = buckets, hours, "resampled time series");
        Ok(Self {
            index,
            names: self.names.clone(),
            columns,
            resolution_hours: hours,
        })
    }
}
