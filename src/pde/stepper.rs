//! Backward time stepping from expiry to the valuation date

use crate::error::{GmwbError, Result};
use crate::linalg::SparseMatrix;

/// Uniform steps from `expiry` back to zero
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverseConstantStepper {
    expiry: f64,
    steps: usize,
}

impl ReverseConstantStepper {
    pub fn new(expiry: f64, steps: usize) -> Result<Self> {
        if !(expiry > 0.0) || steps == 0 {
            return Err(GmwbError::InvalidConfig(format!(
                "cannot step back from {expiry} in {steps} steps"
            )));
        }
        Ok(Self { expiry, steps })
    }

    pub fn expiry(&self) -> f64 {
        self.expiry
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn step_size(&self) -> f64 {
        self.expiry / self.steps as f64
    }

    /// Time reached after `k` backward steps (`k = 0` is expiry)
    pub fn time(&self, k: usize) -> f64 {
        if k >= self.steps {
            0.0
        } else {
            self.expiry - k as f64 * self.step_size()
        }
    }
}

/// Backward differentiation in time-to-expiry.
///
/// The first step is implicit Euler (BDF1); later steps are BDF2 using the
/// two most recent solutions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bdf {
    step_size: f64,
}

impl Bdf {
    pub fn new(step_size: f64) -> Self {
        Self { step_size }
    }

    /// Continuation system `(A, b)` for the next step.
    ///
    /// `latest` is the most recent solution, `previous` the one before it
    /// (absent on the first step).
    pub fn continuation(
        &self,
        operator: &SparseMatrix,
        latest: &[f64],
        previous: Option<&[f64]>,
    ) -> Result<(SparseMatrix, Vec<f64>)> {
        let n = operator.rows();
        if latest.len() != n {
            return Err(GmwbError::DimensionMismatch {
                expected: n,
                actual: latest.len(),
            });
        }

        match previous {
            None => {
                let a = SparseMatrix::identity(n).add_scaled(-self.step_size, operator)?;
                Ok((a, latest.to_vec()))
            }
            Some(previous) => {
                if previous.len() != n {
                    return Err(GmwbError::DimensionMismatch {
                        expected: n,
                        actual: previous.len(),
                    });
                }
                let a = SparseMatrix::identity(n)
                    .scale(1.5)
                    .add_scaled(-self.step_size, operator)?;
                let b = latest
                    .iter()
                    .zip(previous)
                    .map(|(v1, v0)| 2.0 * v1 - 0.5 * v0)
                    .collect();
                Ok((a, b))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::{BiCgStab, LinearSolver};
    use approx::assert_relative_eq;

    #[test]
    fn test_stepper_times() {
        let stepper = ReverseConstantStepper::new(10.0, 4).unwrap();
        assert_eq!(stepper.step_size(), 2.5);
        assert_eq!(stepper.time(0), 10.0);
        assert_eq!(stepper.time(1), 7.5);
        assert_eq!(stepper.time(4), 0.0);
        assert!(ReverseConstantStepper::new(10.0, 0).is_err());
    }

    #[test]
    fn test_bdf_integrates_decay() {
        // dV/dtau = -r V on a single node, exact solution exp(-r tau)
        let r = 0.05;
        let steps = 200;
        let stepper = ReverseConstantStepper::new(10.0, steps).unwrap();
        let bdf = Bdf::new(stepper.step_size());
        let operator = SparseMatrix::identity(1).scale(-r);
        let solver = BiCgStab::default();

        let mut previous: Option<Vec<f64>> = None;
        let mut latest = vec![1.0];
        for _ in 0..steps {
            let (a, b) = bdf
                .continuation(&operator, &latest, previous.as_deref())
                .unwrap();
            let next = solver.solve(&a, &b, &latest).unwrap();
            previous = Some(std::mem::replace(&mut latest, next));
        }

        assert_relative_eq!(latest[0], (-r * 10.0_f64).exp(), max_relative = 1e-4);
    }
}
