//! Run configuration for a GMWB valuation

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::contract::ContractTerms;
use crate::error::{GmwbError, Result};
use crate::grid::{Axis, RectilinearGrid2};
use crate::impulse::DEFAULT_EPSILON;

/// Investment axis of the reference run, clustered around S = 100
pub const DEFAULT_INVESTMENT_TICKS: [f64; 65] = [
    0., 5., 10., 15., 20., 25., 30., 35., 40., 45., 50., 55., 60., 65., 70., 72.5, 75., 77.5, 80.,
    82., 84., 86., 88., 90., 91., 92., 93., 94., 95., 96., 97., 98., 99., 100., 101., 102., 103.,
    104., 105., 106., 107., 108., 109., 110., 112., 114., 116., 118., 120., 123., 126., 130.,
    135., 140., 145., 150., 160., 175., 200., 225., 250., 300., 500., 750., 1000.,
];

/// Configuration for a pricing run
///
/// Every field has a default, so a JSON file only needs the overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Market and contract parameters
    #[serde(default)]
    pub terms: ContractTerms,

    /// Control partition size at level 0 (n); level l uses n * 2^l intervals
    #[serde(default = "default_control_intervals")]
    pub control_intervals: usize,

    /// Timesteps at level 0 (N); level l uses N * 2^l
    #[serde(default = "default_timesteps")]
    pub timesteps: usize,

    /// Number of refinement levels to solve
    #[serde(default = "default_refinement")]
    pub refinement: usize,

    /// Investment (S) axis ticks at level 0
    #[serde(default = "default_investment_ticks")]
    pub investment_ticks: Vec<f64>,

    /// Guarantee base (W) axis ticks at level 0
    #[serde(default = "default_withdrawal_ticks")]
    pub withdrawal_ticks: Vec<f64>,

    /// Cash-flow regularization and exhaustion threshold
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Fixed-point tolerance; the penalty weight is its reciprocal
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Cap on fixed-point iterations per timestep
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Relative residual target of the linear solver
    #[serde(default = "default_solver_tolerance")]
    pub solver_tolerance: f64,

    /// Spacing of the reported surface in both S and W
    #[serde(default = "default_print_step")]
    pub print_step: f64,

    /// Upper bound of the reported surface in both S and W
    #[serde(default = "default_print_max")]
    pub print_max: f64,
}

fn default_control_intervals() -> usize {
    10
}

fn default_timesteps() -> usize {
    100
}

fn default_refinement() -> usize {
    2
}

fn default_investment_ticks() -> Vec<f64> {
    DEFAULT_INVESTMENT_TICKS.to_vec()
}

fn default_withdrawal_ticks() -> Vec<f64> {
    (0..=100).map(|i| 2.0 * i as f64).collect()
}

fn default_epsilon() -> f64 {
    DEFAULT_EPSILON
}

fn default_tolerance() -> f64 {
    1e-6
}

fn default_max_iterations() -> usize {
    100
}

fn default_solver_tolerance() -> f64 {
    1e-10
}

fn default_print_step() -> f64 {
    25.0
}

fn default_print_max() -> f64 {
    200.0
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            terms: ContractTerms::default(),
            control_intervals: default_control_intervals(),
            timesteps: default_timesteps(),
            refinement: default_refinement(),
            investment_ticks: default_investment_ticks(),
            withdrawal_ticks: default_withdrawal_ticks(),
            epsilon: default_epsilon(),
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
            solver_tolerance: default_solver_tolerance(),
            print_step: default_print_step(),
            print_max: default_print_max(),
        }
    }
}

impl PricingConfig {
    /// Load a configuration from a JSON file
    pub fn from_json_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Level-0 solution grid
    pub fn grid(&self) -> Result<RectilinearGrid2> {
        Ok(RectilinearGrid2::new(
            Axis::new(self.investment_ticks.clone())?,
            Axis::new(self.withdrawal_ticks.clone())?,
        ))
    }

    /// Grid on which results are reported
    pub fn print_grid(&self) -> Result<RectilinearGrid2> {
        Ok(RectilinearGrid2::new(
            Axis::range(0.0, self.print_step, self.print_max)?,
            Axis::range(0.0, self.print_step, self.print_max)?,
        ))
    }

    pub fn validate(&self) -> Result<()> {
        self.terms.validate()?;

        if self.control_intervals == 0 || self.timesteps == 0 || self.refinement == 0 {
            return Err(GmwbError::InvalidConfig(
                "control intervals, timesteps and refinement levels must be positive".to_string(),
            ));
        }
        if self.investment_ticks.first().is_some_and(|&s| s < 0.0)
            || self.withdrawal_ticks.first().is_some_and(|&w| w < 0.0)
        {
            return Err(GmwbError::InvalidConfig(
                "grid axes must be non-negative".to_string(),
            ));
        }
        if !(self.epsilon > 0.0) || !(self.tolerance > 0.0) || !(self.solver_tolerance > 0.0) {
            return Err(GmwbError::InvalidConfig(
                "epsilon and tolerances must be positive".to_string(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(GmwbError::InvalidConfig(
                "max_iterations must be positive".to_string(),
            ));
        }
        self.grid()?;
        self.print_grid()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::InterpolationGrid;

    #[test]
    fn test_default_reference_grid() {
        let config = PricingConfig::default();
        assert!(config.validate().is_ok());

        let grid = config.grid().unwrap();
        assert_eq!(grid.shape(), (65, 101));
        assert_eq!(grid.withdrawal().last(), 200.0);
        assert_eq!(config.print_grid().unwrap().size(), 81);
    }

    #[test]
    fn test_json_overrides() {
        let json = r#"{
            "terms": {"penalty_rate": 0.05},
            "refinement": 1,
            "withdrawal_ticks": [0.0, 50.0, 100.0]
        }"#;
        let config: PricingConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.terms.penalty_rate, 0.05);
        assert_eq!(config.terms.volatility, 0.20);
        assert_eq!(config.refinement, 1);
        assert_eq!(config.timesteps, 100);
        assert_eq!(config.grid().unwrap().shape(), (65, 3));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = PricingConfig {
            timesteps: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PricingConfig {
            withdrawal_ticks: vec![-2.0, 0.0, 2.0],
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PricingConfig {
            investment_ticks: vec![0.0, 10.0, 5.0],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
