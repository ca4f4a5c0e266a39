//! Non-uniform ordered axis

use serde::{Deserialize, Serialize};

use crate::error::{GmwbError, Result};

/// Strictly increasing set of ticks along one dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    ticks: Vec<f64>,
}

impl Axis {
    /// Create an axis from explicit ticks
    pub fn new(ticks: Vec<f64>) -> Result<Self> {
        if ticks.len() < 2 {
            return Err(GmwbError::InvalidGrid(format!(
                "an axis needs at least 2 ticks, got {}",
                ticks.len()
            )));
        }
        if ticks.iter().any(|t| !t.is_finite()) {
            return Err(GmwbError::InvalidGrid("axis ticks must be finite".to_string()));
        }
        if ticks.windows(2).any(|w| w[1] <= w[0]) {
            return Err(GmwbError::InvalidGrid(
                "axis ticks must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { ticks })
    }

    /// Uniform ticks `start, start + step, ..., end` (end inclusive)
    pub fn range(start: f64, step: f64, end: f64) -> Result<Self> {
        if !(step > 0.0) || !(end > start) {
            return Err(GmwbError::InvalidGrid(format!(
                "invalid range {start}:{step}:{end}"
            )));
        }
        let count = ((end - start) / step + 0.5).floor() as usize;
        let ticks = (0..=count).map(|i| start + i as f64 * step).collect();
        Self::new(ticks)
    }

    /// Number of ticks
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn ticks(&self) -> &[f64] {
        &self.ticks
    }

    pub fn first(&self) -> f64 {
        self.ticks[0]
    }

    pub fn last(&self) -> f64 {
        self.ticks[self.ticks.len() - 1]
    }

    /// Axis with a new tick midway between each adjacent pair
    pub fn refined(&self) -> Self {
        let mut ticks = Vec::with_capacity(2 * self.ticks.len() - 1);
        for pair in self.ticks.windows(2) {
            ticks.push(pair[0]);
            ticks.push(0.5 * (pair[0] + pair[1]));
        }
        ticks.push(self.last());
        Self { ticks }
    }

    /// Lower bracketing index and the interpolation weight on that node.
    ///
    /// Values at or below the first tick return `(0, 1.0)`; values at or
    /// above the last tick return `(len - 2, 0.0)`. Never extrapolates.
    pub fn bracket(&self, x: f64) -> (usize, f64) {
        let t = &self.ticks;
        let n = t.len();

        if !(x > t[0]) {
            return (0, 1.0);
        }
        if x >= t[n - 1] {
            return (n - 2, 0.0);
        }

        let lower = t.partition_point(|&v| v <= x) - 1;
        let weight = (t[lower + 1] - x) / (t[lower + 1] - t[lower]);
        (lower, weight)
    }
}

impl std::ops::Index<usize> for Axis {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.ticks[i]
    }
}
