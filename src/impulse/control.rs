//! Discretized control candidates and per-point control assignments

use crate::error::{GmwbError, Result};

/// Ordered candidate withdrawal fractions scanned by the policy search.
///
/// Candidates are scanned in stored order; on an exact tie the earlier
/// candidate wins.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSet {
    values: Vec<f64>,
}

impl ControlSet {
    /// `{0, 1/k, 2/k, ..., 1}`: `k` equal intervals, `k + 1` candidates
    pub fn uniform(intervals: usize) -> Result<Self> {
        if intervals == 0 {
            return Err(GmwbError::InvalidConfig(
                "control partition needs at least one interval".to_string(),
            ));
        }
        let values = (0..=intervals)
            .map(|i| i as f64 / intervals as f64)
            .collect();
        Ok(Self { values })
    }

    /// Explicit candidates; each must lie in [0, 1]
    pub fn from_values(values: Vec<f64>) -> Result<Self> {
        if let Some(&lambda) = values.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(GmwbError::InvalidControl { lambda });
        }
        Ok(Self { values })
    }

    /// No candidates at all; every point falls back to "no withdrawal"
    pub fn empty() -> Self {
        Self { values: Vec::new() }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One control value per grid point, indexed by the grid's linear index
#[derive(Debug, Clone, PartialEq)]
pub struct ControlField {
    values: Vec<f64>,
}

impl ControlField {
    /// Field of `size` points, all set to "no withdrawal"
    pub fn zeros(size: usize) -> Self {
        Self::uniform(size, 0.0)
    }

    /// Field with the same control at every point
    pub fn uniform(size: usize, value: f64) -> Self {
        Self {
            values: vec![value; size],
        }
    }

    pub fn from_vec(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn value(&self, index: usize) -> f64 {
        self.values[index]
    }

    pub fn set(&mut self, index: usize, value: f64) {
        self.values[index] = value;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of points whose control differs from `other`
    pub fn changed_from(&self, other: &ControlField) -> usize {
        self.values
            .iter()
            .zip(&other.values)
            .filter(|(a, b)| a != b)
            .count()
            + self.values.len().abs_diff(other.values.len())
    }
}
