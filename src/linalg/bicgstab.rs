//! Jacobi-preconditioned BiCGSTAB

use super::{dot, norm, SparseMatrix};
use crate::error::{GmwbError, Result};

/// Solves `A x = b` for a square sparse `A`
pub trait LinearSolver {
    /// `guess` seeds the iteration; iterative solvers converge faster when it
    /// is the previous iterate.
    fn solve(&self, a: &SparseMatrix, b: &[f64], guess: &[f64]) -> Result<Vec<f64>>;
}

/// Stabilized bi-conjugate gradient solver with a diagonal preconditioner
#[derive(Debug, Clone)]
pub struct BiCgStab {
    /// Relative residual target `|b - A x| <= tolerance * |b|`
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for BiCgStab {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 10_000,
        }
    }
}

impl LinearSolver for BiCgStab {
    fn solve(&self, a: &SparseMatrix, b: &[f64], guess: &[f64]) -> Result<Vec<f64>> {
        let n = a.rows();
        if a.cols() != n || b.len() != n || guess.len() != n {
            return Err(GmwbError::DimensionMismatch {
                expected: n,
                actual: b.len().min(guess.len()).min(a.cols()),
            });
        }

        let b_norm = norm(b);
        if b_norm == 0.0 {
            return Ok(vec![0.0; n]);
        }
        let target = self.tolerance * b_norm;

        let inv_diag: Vec<f64> = a
            .diagonal()
            .into_iter()
            .map(|d| if d != 0.0 { 1.0 / d } else { 1.0 })
            .collect();
        let precondition =
            |v: &[f64]| -> Vec<f64> { v.iter().zip(&inv_diag).map(|(x, d)| x * d).collect() };

        let mut x = guess.to_vec();
        let ax = a.mul_vec(&x)?;
        let mut r: Vec<f64> = b.iter().zip(&ax).map(|(bi, ai)| bi - ai).collect();
        let mut residual = norm(&r);
        if residual <= target {
            return Ok(x);
        }

        let r_hat = r.clone();
        let mut rho = 1.0;
        let mut alpha = 1.0;
        let mut omega = 1.0;
        let mut v = vec![0.0; n];
        let mut p = vec![0.0; n];

        for _ in 0..self.max_iterations {
            let rho_next = dot(&r_hat, &r);
            if rho_next == 0.0 || !rho_next.is_finite() {
                return Err(GmwbError::SolverBreakdown(format!(
                    "rho = {rho_next} with residual {residual:e}"
                )));
            }

            let beta = (rho_next / rho) * (alpha / omega);
            rho = rho_next;
            for i in 0..n {
                p[i] = r[i] + beta * (p[i] - omega * v[i]);
            }

            let y = precondition(&p);
            v = a.mul_vec(&y)?;
            let denom = dot(&r_hat, &v);
            if denom == 0.0 {
                return Err(GmwbError::SolverBreakdown(
                    "r_hat is orthogonal to A p".to_string(),
                ));
            }
            alpha = rho / denom;

            let s: Vec<f64> = r.iter().zip(&v).map(|(ri, vi)| ri - alpha * vi).collect();
            if norm(&s) <= target {
                x.iter_mut().zip(&y).for_each(|(xi, yi)| *xi += alpha * yi);
                return Ok(x);
            }

            let z = precondition(&s);
            let t = a.mul_vec(&z)?;
            let tt = dot(&t, &t);
            if tt == 0.0 {
                return Err(GmwbError::SolverBreakdown("A z vanished".to_string()));
            }
            omega = dot(&t, &s) / tt;

            for i in 0..n {
                x[i] += alpha * y[i] + omega * z[i];
                r[i] = s[i] - omega * t[i];
            }

            residual = norm(&r);
            if residual <= target {
                return Ok(x);
            }
            if omega == 0.0 {
                return Err(GmwbError::SolverBreakdown("omega vanished".to_string()));
            }
        }

        Err(GmwbError::SolverNotConverged {
            iterations: self.max_iterations,
            residual: residual / b_norm,
        })
    }
}
