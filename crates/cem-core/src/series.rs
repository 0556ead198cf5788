use serde::{Deserialize, Serialize};

/// An attribute that is either constant or given per snapshot.
///
/// Serialises untagged, so `0.9` and `[0.1, 0.4, 0.8]` are both valid in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Series {
    Static(f64),
    Varying(Vec<f64>),
}

impl Series {
    /// Value at snapshot `t`. Static values repeat; varying series must
    /// have been checked against the snapshot count beforehand.
    #[inline]
    pub fn at(&self, t: usize) -> f64 {
        match self {
            Series::Static(v) => *v,
            Series::Varying(values) => values[t],
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Series::Static(_))
    }

    /// Whether the series can be indexed for `snapshots` steps.
    pub fn fits(&self, snapshots: usize) -> bool {
        match self {
            Series::Static(_) => true,
            Series::Varying(values) => values.len() == snapshots,
        }
    }

    pub fn len(&self) -> Option<usize> {
        match self {
            Series::Static(_) => None,
            Series::Varying(values) => Some(values.len()),
        }
    }

    pub fn min(&self) -> f64 {
        match self {
            Series::Static(v) => *v,
            Series::Varying(values) => values.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }

    pub fn max(&self) -> f64 {
        match self {
            Series::Static(v) => *v,
            Series::Varying(values) => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }

    /// Expand into one value per snapshot.
    pub fn to_vec(&self, snapshots: usize) -> Vec<f64> {
        (0..snapshots).map(|t| self.at(t)).collect()
    }
}

impl Default for Series {
    fn default() -> Self {
        Series::Static(0.0)
    }
}

impl From<f64> for Series {
    fn from(value: f64) -> Self {
        Series::Static(value)
    }
}

impl From<Vec<f64>> for Series {
    fn from(values: Vec<f64>) -> Self {
        Series::Varying(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_series_repeats() {
        let s = Series::from(0.5);
        assert_eq!(s.at(0), 0.5);
        assert_eq!(s.at(1000), 0.5);
        assert!(s.fits(17));
    }

    #[test]
    fn varying_series_checks_length() {
        let s = Series::from(vec![0.1, 0.9, 0.4]);
        assert!(s.fits(3));
        assert!(!s.fits(4));
        assert_eq!(s.max(), 0.9);
        assert_eq!(s.min(), 0.1);
    }

    #[test]
    fn untagged_json() {
        let s: Series = serde_json::from_str("[1.0, 2.0]").unwrap();
        assert_eq!(s, Series::Varying(vec![1.0, 2.0]));
        let s: Series = serde_json::from_str("3.5").unwrap();
        assert_eq!(s, Series::Static(3.5));
    }
}
