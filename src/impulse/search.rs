//! Per-point minimization over a discretized control set

use rayon::prelude::*;

use super::{ControlField, ControlSet, ControlledLinearSystem};
use crate::error::{GmwbError, Result};

/// Chooses, at every grid point, the candidate control minimizing the
/// system residual `A V - b` against a fixed value snapshot.
///
/// Points without a meaningful decision (see
/// [`ControlledLinearSystem::is_controllable`]) and searches over an empty
/// candidate set resolve to 0, i.e. no withdrawal.
#[derive(Debug, Clone)]
pub struct PolicySearch {
    controls: ControlSet,
}

impl PolicySearch {
    pub fn new(controls: ControlSet) -> Self {
        Self { controls }
    }

    pub fn controls(&self) -> &ControlSet {
        &self.controls
    }

    /// Optimal control field for `values` at time `t`
    pub fn search<S>(&self, system: &S, t: f64, values: &[f64]) -> Result<ControlField>
    where
        S: ControlledLinearSystem + Sync,
    {
        let n = system.size();
        if values.len() != n {
            return Err(GmwbError::DimensionMismatch {
                expected: n,
                actual: values.len(),
            });
        }

        let chosen = (0..n)
            .into_par_iter()
            .map(|i| self.best_control(system, t, i, values))
            .collect::<Result<Vec<f64>>>()?;

        Ok(ControlField::from_vec(chosen))
    }

    /// Scan every candidate at one point; the first strict minimum wins
    pub fn best_control<S>(&self, system: &S, t: f64, index: usize, values: &[f64]) -> Result<f64>
    where
        S: ControlledLinearSystem,
    {
        if self.controls.is_empty() || !system.is_controllable(index) {
            return Ok(0.0);
        }

        let mut best: Option<(f64, f64)> = None;
        for &candidate in self.controls.values() {
            let residual = system.residual(t, index, candidate, values)?;
            match best {
                Some((_, lowest)) if residual >= lowest => {}
                _ => best = Some((candidate, residual)),
            }
        }

        Ok(best.map_or(0.0, |(candidate, _)| candidate))
    }
}
