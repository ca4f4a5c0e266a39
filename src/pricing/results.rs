//! Output structures for a pricing run

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::grid::{InterpolationGrid, RectilinearGrid2};
use crate::pde::IterationStats;

/// Contract value at one reporting point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfacePoint {
    pub investment: f64,
    pub withdrawal: f64,
    pub value: f64,
}

/// Solution of one refinement level at the valuation date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelResult {
    /// Refinement level (0 = coarsest)
    pub level: usize,

    /// Solution grid used at this level
    pub grid: RectilinearGrid2,

    /// Number of candidate controls scanned per point
    pub controls: usize,

    /// Number of backward timesteps
    pub timesteps: usize,

    /// Value at every grid point, in linear index order
    pub values: Vec<f64>,

    /// Fixed-point iterations per timestep
    pub iterations: IterationStats,

    /// Values sampled on the reporting grid
    pub surface: Vec<SurfacePoint>,
}

impl LevelResult {
    /// Bilinearly interpolated value at (S, W)
    pub fn value_at(&self, s: f64, w: f64) -> Result<f64> {
        self.grid.interpolate(&self.values, s, w)
    }

    /// Get summary statistics
    pub fn summary(&self) -> LevelSummary {
        let (investment_nodes, withdrawal_nodes) = self.grid.shape();
        LevelSummary {
            level: self.level,
            nodes: self.grid.size(),
            investment_nodes,
            withdrawal_nodes,
            controls: self.controls,
            timesteps: self.timesteps,
            average_iterations: self.iterations.average(),
            max_iterations: self.iterations.max(),
            non_converged_steps: self.iterations.non_converged,
        }
    }
}

/// Summary statistics for a refinement level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelSummary {
    pub level: usize,
    pub nodes: usize,
    pub investment_nodes: usize,
    pub withdrawal_nodes: usize,
    pub controls: usize,
    pub timesteps: usize,
    pub average_iterations: f64,
    pub max_iterations: usize,
    pub non_converged_steps: usize,
}
