//! Sparse linear algebra used by the timestep systems
//!
//! - [`SparseBuilder`] / [`SparseMatrix`]: reserve, insert, finalize to CSR
//! - [`BiCgStab`]: Jacobi-preconditioned BiCGSTAB for the non-symmetric
//!   penalized systems

mod sparse;
mod bicgstab;

pub use sparse::{SparseBuilder, SparseMatrix};
pub use bicgstab::{BiCgStab, LinearSolver};

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub(crate) fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}
