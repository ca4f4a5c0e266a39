//! GMWB pricing driver: refinement levels, backward stepping and reporting

mod config;
mod engine;
mod results;
mod report;

pub use config::{PricingConfig, DEFAULT_INVESTMENT_TICKS};
pub use engine::PricingEngine;
pub use results::{LevelResult, SurfacePoint, LevelSummary};
pub use report::{convergence_table, write_surface_csv, ConvergenceRow};
