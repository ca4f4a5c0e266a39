//! GMWB Pricer - Impulse-control PDE valuation of Guaranteed Minimum Withdrawal Benefits
//!
//! This library provides:
//! - Rectilinear (S, W) grids with bilinear interpolation
//! - The withdrawal impulse operator: transition matrix and cash-flow vector
//! - Policy search over a finite set of withdrawal fractions
//! - Black-Scholes diffusion, BDF time stepping and a penalty solver for the
//!   resulting quasi-variational inequality
//! - A refinement-level pricing driver with convergence tables and CSV output

pub mod error;
pub mod grid;
pub mod linalg;
pub mod contract;
pub mod impulse;
pub mod pde;
pub mod pricing;

// Re-export commonly used types
pub use error::{GmwbError, Result};
pub use grid::{Axis, InterpolationGrid, RectilinearGrid2};
pub use contract::{ConstantSchedule, ContractSchedule, ContractTerms, Schedule, SurrenderSchedule};
pub use impulse::{ControlField, ControlSet, ControlledLinearSystem, PolicySearch, WithdrawalOperator};
pub use pricing::{LevelResult, PricingConfig, PricingEngine};
