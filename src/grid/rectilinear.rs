//! Rectilinear (tensor-product) grid over investment and guarantee base

use serde::{Deserialize, Serialize};

use super::{Axis, InterpolationGrid};
use crate::error::{GmwbError, Result};

/// Two-dimensional grid: axis 0 is the investment account S, axis 1 the
/// withdrawal guarantee base W.
///
/// Points are indexed `i0 + n0 * i1`, so S varies fastest and the
/// W-neighbour of a point sits `n0` entries further on. Enumeration via
/// [`RectilinearGrid2::nodes`] follows the same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectilinearGrid2 {
    investment: Axis,
    withdrawal: Axis,
}

impl RectilinearGrid2 {
    pub fn new(investment: Axis, withdrawal: Axis) -> Self {
        Self { investment, withdrawal }
    }

    /// Investment (S) axis
    pub fn investment(&self) -> &Axis {
        &self.investment
    }

    /// Guarantee base (W) axis
    pub fn withdrawal(&self) -> &Axis {
        &self.withdrawal
    }

    /// Axis sizes in index order
    pub fn shape(&self) -> (usize, usize) {
        (self.investment.len(), self.withdrawal.len())
    }

    /// Axis indices of a linear index
    pub fn axis_indices(&self, index: usize) -> (usize, usize) {
        let n0 = self.investment.len();
        (index % n0, index / n0)
    }

    /// Iterate over `(index, S, W)` in linear index order
    pub fn nodes(&self) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        let n0 = self.investment.len();
        self.withdrawal.ticks().iter().enumerate().flat_map(move |(i1, &w)| {
            self.investment
                .ticks()
                .iter()
                .enumerate()
                .map(move |(i0, &s)| (i0 + n0 * i1, s, w))
        })
    }

    /// Sample a function of (S, W) at every grid point
    pub fn vector<F>(&self, f: F) -> Vec<f64>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.nodes().map(|(_, s, w)| f(s, w)).collect()
    }

    /// Bilinear interpolation of grid values at an arbitrary point (clamped)
    pub fn interpolate(&self, values: &[f64], s: f64, w: f64) -> Result<f64> {
        if values.len() != self.size() {
            return Err(GmwbError::DimensionMismatch {
                expected: self.size(),
                actual: values.len(),
            });
        }

        let [(i0, w0), (i1, w1)] = self.interpolation_data((s, w));
        let j = self.index(i0, i1);
        let n0 = self.stride();

        Ok(w0 * w1 * values[j]
            + w0 * (1.0 - w1) * values[j + n0]
            + (1.0 - w0) * w1 * values[j + 1]
            + (1.0 - w0) * (1.0 - w1) * values[j + 1 + n0])
    }

    /// Insert a new tick between each adjacent pair on both axes
    pub fn refine(&mut self) {
        self.investment = self.investment.refined();
        self.withdrawal = self.withdrawal.refined();
    }
}

impl InterpolationGrid for RectilinearGrid2 {
    fn size(&self) -> usize {
        self.investment.len() * self.withdrawal.len()
    }

    fn stride(&self) -> usize {
        self.investment.len()
    }

    fn index(&self, i0: usize, i1: usize) -> usize {
        i0 + self.investment.len() * i1
    }

    fn node(&self, index: usize) -> (f64, f64) {
        let (i0, i1) = self.axis_indices(index);
        (self.investment[i0], self.withdrawal[i1])
    }

    fn interpolation_data(&self, point: (f64, f64)) -> [(usize, f64); 2] {
        [self.investment.bracket(point.0), self.withdrawal.bracket(point.1)]
    }
}
