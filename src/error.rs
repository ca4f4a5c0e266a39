//! Error type shared by the grid, operators and solvers

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, GmwbError>;

#[derive(Debug, Error)]
pub enum GmwbError {
    #[error("Invalid control: lambda = {lambda} is outside [0, 1]")]
    InvalidControl { lambda: f64 },

    #[error("Invalid state: S = {s}, W = {w} (both must be non-negative)")]
    InvalidState { s: f64, w: f64 },

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Linear solver breakdown: {0}")]
    SolverBreakdown(String),

    #[error("Linear solver did not converge after {iterations} iterations (residual: {residual:e})")]
    SolverNotConverged { iterations: usize, residual: f64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GmwbError {
    fn from(e: serde_json::Error) -> Self {
        GmwbError::Serialization(e.to_string())
    }
}

impl From<csv::Error> for GmwbError {
    fn from(e: csv::Error) -> Self {
        GmwbError::Serialization(e.to_string())
    }
}
