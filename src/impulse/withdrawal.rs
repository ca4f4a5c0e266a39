//! Withdrawal impulse: post-withdrawal transition and net cash flow

use rayon::prelude::*;

use super::{ControlField, ControlledLinearSystem};
use crate::contract::ContractSchedule;
use crate::error::{GmwbError, Result};
use crate::grid::InterpolationGrid;
use crate::linalg::{SparseBuilder, SparseMatrix};

/// Regularization subtracted from every cash flow.
///
/// Also the threshold below which the guarantee base counts as exhausted.
pub const DEFAULT_EPSILON: f64 = 1e-12;

/// The four bracketing nodes of a post-withdrawal state and their bilinear
/// weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionRow {
    pub indices: [usize; 4],
    pub weights: [f64; 4],
}

impl TransitionRow {
    /// Reconstructed value `sum_k weights[k] * values[indices[k]]`
    pub fn apply(&self, values: &[f64]) -> f64 {
        self.indices
            .iter()
            .zip(&self.weights)
            .map(|(&j, &w)| w * values[j])
            .sum()
    }
}

/// Impulse operator for a withdrawal of `lambda * W` at every grid point
pub struct WithdrawalOperator<'a, G, C> {
    grid: &'a G,
    schedule: &'a C,
    epsilon: f64,
}

impl<'a, G, C> WithdrawalOperator<'a, G, C>
where
    G: InterpolationGrid + Sync,
    C: ContractSchedule + Sync,
{
    pub fn new(grid: &'a G, schedule: &'a C) -> Self {
        Self {
            grid,
            schedule,
            epsilon: DEFAULT_EPSILON,
        }
    }

    /// Override the regularization / exhaustion threshold
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn grid(&self) -> &G {
        self.grid
    }

    /// Bracketing nodes and weights of the state reached from point `index`
    /// by withdrawing `lambda * W`.
    ///
    /// The investment is floored at zero and the guarantee base shrinks to
    /// `(1 - lambda) W`. Off-grid targets are clamped by the grid.
    pub fn transition_row(&self, index: usize, lambda: f64) -> Result<TransitionRow> {
        let (s, w) = self.grid.node(index);
        check_state(s, w)?;
        check_control(lambda)?;

        let post_s = (s - lambda * w).max(0.0);
        let post_w = (1.0 - lambda) * w;

        let [(i0, w0), (i1, w1)] = self.grid.interpolation_data((post_s, post_w));
        let j = self.grid.index(i0, i1);
        let n0 = self.grid.stride();

        Ok(TransitionRow {
            indices: [j, j + n0, j + 1, j + 1 + n0],
            weights: [
                w0 * w1,
                w0 * (1.0 - w1),
                (1.0 - w0) * w1,
                (1.0 - w0) * (1.0 - w1),
            ],
        })
    }

    /// Cash paid to the policyholder for withdrawing `lambda * W` at (t, S, W)
    pub fn cashflow(&self, t: f64, s: f64, w: f64, lambda: f64) -> Result<f64> {
        check_state(s, w)?;

        // Guarantee exhausted: nothing to withdraw
        if w <= self.epsilon {
            return Ok(-self.epsilon);
        }

        check_control(lambda)?;

        let allowance = self.schedule.contract_rate(t, s, w);
        let lambda_w = lambda * w;

        if lambda < (allowance / w).min(1.0) {
            return Ok(lambda_w - self.epsilon);
        }

        let kappa = self.schedule.penalty_rate(t, s, w);
        Ok(lambda_w - kappa * (lambda_w - allowance) - self.epsilon)
    }

    /// `I - M`, where row `i` of `M` holds the four transition weights of
    /// point `i` under `control`.
    ///
    /// The transition itself does not depend on `t`; only the control
    /// snapshot for that time enters.
    pub fn assemble_transition(&self, _t: f64, control: &ControlField) -> Result<SparseMatrix> {
        let n = self.grid.size();
        check_field(control, n)?;

        let rows: Vec<TransitionRow> = (0..n)
            .into_par_iter()
            .map(|i| self.transition_row(i, control.value(i)))
            .collect::<Result<_>>()?;

        let mut builder = SparseBuilder::with_capacity(n, n, 4);
        for (i, row) in rows.iter().enumerate() {
            for (&j, &weight) in row.indices.iter().zip(&row.weights) {
                builder.push(i, j, weight);
            }
        }
        let m = builder.build()?;

        SparseMatrix::identity(n).sub(&m)
    }

    /// Cash flow at every grid point under `control`
    pub fn assemble_cashflow(&self, t: f64, control: &ControlField) -> Result<Vec<f64>> {
        let n = self.grid.size();
        check_field(control, n)?;

        (0..n)
            .into_par_iter()
            .map(|i| {
                let (s, w) = self.grid.node(i);
                self.cashflow(t, s, w, control.value(i))
            })
            .collect()
    }
}

impl<'a, G, C> ControlledLinearSystem for WithdrawalOperator<'a, G, C>
where
    G: InterpolationGrid + Sync,
    C: ContractSchedule + Sync,
{
    fn size(&self) -> usize {
        self.grid.size()
    }

    fn register_control(&self) -> ControlField {
        ControlField::zeros(self.grid.size())
    }

    fn a(&self, t: f64, control: &ControlField) -> Result<SparseMatrix> {
        self.assemble_transition(t, control)
    }

    fn b(&self, t: f64, control: &ControlField) -> Result<Vec<f64>> {
        self.assemble_cashflow(t, control)
    }

    fn residual(&self, t: f64, index: usize, value: f64, values: &[f64]) -> Result<f64> {
        let (s, w) = self.grid.node(index);
        let row = self.transition_row(index, value)?;
        let cash = self.cashflow(t, s, w, value)?;
        Ok(values[index] - row.apply(values) - cash)
    }

    fn is_controllable(&self, index: usize) -> bool {
        self.grid.node(index).1 > self.epsilon
    }
}

fn check_control(lambda: f64) -> Result<()> {
    if (0.0..=1.0).contains(&lambda) {
        Ok(())
    } else {
        Err(GmwbError::InvalidControl { lambda })
    }
}

fn check_state(s: f64, w: f64) -> Result<()> {
    if s >= 0.0 && w >= 0.0 {
        Ok(())
    } else {
        Err(GmwbError::InvalidState { s, w })
    }
}

fn check_field(control: &ControlField, size: usize) -> Result<()> {
    if control.len() == size {
        Ok(())
    } else {
        Err(GmwbError::DimensionMismatch {
            expected: size,
            actual: control.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{ConstantSchedule, SurrenderSchedule};
    use crate::grid::{Axis, RectilinearGrid2};
    use approx::assert_abs_diff_eq;

    const EPS: f64 = DEFAULT_EPSILON;

    fn test_grid() -> RectilinearGrid2 {
        RectilinearGrid2::new(
            Axis::new(vec![
                0.0, 10.0, 25.0, 50.0, 75.0, 90.0, 100.0, 110.0, 125.0, 150.0, 200.0, 300.0,
            ])
            .unwrap(),
            Axis::range(0.0, 10.0, 100.0).unwrap(),
        )
    }

    fn test_schedule() -> ConstantSchedule {
        ConstantSchedule::new(5.0, 0.1)
    }

    #[test]
    fn test_weights_are_convex_for_all_points_and_controls() {
        let grid = test_grid();
        let schedule = test_schedule();
        let op = WithdrawalOperator::new(&grid, &schedule);

        for i in 0..grid.size() {
            for k in 0..=20 {
                let lambda = k as f64 / 20.0;
                let row = op.transition_row(i, lambda).unwrap();
                let sum: f64 = row.weights.iter().sum();
                assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-9);
                for &w in &row.weights {
                    assert!((0.0..=1.0).contains(&w), "weight {w} at point {i}, lambda {lambda}");
                }
                for &j in &row.indices {
                    assert!(j < grid.size());
                }
            }
        }
    }

    #[test]
    fn test_zero_withdrawal_is_identity() {
        let grid = test_grid();
        let schedule = test_schedule();
        let op = WithdrawalOperator::new(&grid, &schedule);
        let values = grid.vector(|s, w| s * s + 3.0 * w);

        for i in 0..grid.size() {
            let row = op.transition_row(i, 0.0).unwrap();
            assert_abs_diff_eq!(row.apply(&values), values[i], epsilon = 1e-9);
        }

        // I - M vanishes under the zero control
        let a = op.assemble_transition(0.0, &op.register_control()).unwrap();
        assert_eq!(a.nnz(), grid.size() * 4);
        let image = a.mul_vec(&values).unwrap();
        for v in image {
            assert_abs_diff_eq!(v, 0.0, epsilon = 1e-9);
        }

        let (s, w) = grid.node(grid.index(6, 5));
        assert_eq!(op.cashflow(0.0, s, w, 0.0).unwrap(), -EPS);
    }

    #[test]
    fn test_transition_targets_post_withdrawal_state() {
        let grid = test_grid();
        let schedule = test_schedule();
        let op = WithdrawalOperator::new(&grid, &schedule);

        // (S, W) = (100, 100), lambda = 0.5: target (50, 50), which is a node
        let i = grid.index(6, 10);
        assert_eq!(grid.node(i), (100.0, 100.0));
        let row = op.transition_row(i, 0.5).unwrap();
        assert_eq!(row.indices[0], grid.index(3, 5));
        assert_eq!(row.weights[0], 1.0);

        // Linear functions are reconstructed exactly off-grid
        let i = grid.index(6, 5);
        let values = grid.vector(|s, w| 2.0 * s + w);
        let row = op.transition_row(i, 0.35).unwrap();
        let expected = 2.0 * (100.0 - 0.35 * 50.0) + 0.65 * 50.0;
        assert_abs_diff_eq!(row.apply(&values), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_investment_floored_at_zero() {
        let grid = test_grid();
        let schedule = test_schedule();
        let op = WithdrawalOperator::new(&grid, &schedule);

        // (S, W) = (10, 100), full withdrawal lands on (0, 0)
        let i = grid.index(1, 10);
        let row = op.transition_row(i, 1.0).unwrap();
        assert_eq!(row.indices[0], grid.index(0, 0));
        assert_abs_diff_eq!(row.weights[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cashflow_reference_scenario() {
        let grid = test_grid();
        let schedule = test_schedule();
        let op = WithdrawalOperator::new(&grid, &schedule);

        // Threshold min(5 / 50, 1) = 0.1
        let free = op.cashflow(1.0, 100.0, 50.0, 0.05).unwrap();
        assert_eq!(free, 2.5 - EPS);

        let penalized = op.cashflow(1.0, 100.0, 50.0, 0.5).unwrap();
        assert_abs_diff_eq!(penalized, 23.0 - EPS, epsilon = 1e-12);
    }

    #[test]
    fn test_cashflow_continuous_at_free_allowance() {
        let grid = test_grid();
        let schedule = test_schedule();
        let op = WithdrawalOperator::new(&grid, &schedule);

        let w = 50.0;
        let threshold = (5.0_f64 / w).min(1.0);
        let h = 1e-9;

        let below = op.cashflow(0.0, 100.0, w, threshold - h).unwrap();
        let at = op.cashflow(0.0, 100.0, w, threshold).unwrap();
        let above = op.cashflow(0.0, 100.0, w, threshold + h).unwrap();

        assert_abs_diff_eq!(at, 5.0 - EPS, epsilon = 1e-12);
        assert_abs_diff_eq!(below, at, epsilon = 1e-6);
        assert_abs_diff_eq!(above, at, epsilon = 1e-6);
        // Slope drops from W to (1 - kappa) W across the threshold
        assert!(at - below > above - at);
    }

    #[test]
    fn test_exhausted_guarantee_pays_minus_epsilon() {
        let grid = test_grid();
        let schedule = test_schedule();
        let op = WithdrawalOperator::new(&grid, &schedule);

        for lambda in [0.0, 0.3, 1.0] {
            assert_eq!(op.cashflow(0.0, 100.0, 0.0, lambda).unwrap(), -EPS);
            assert_eq!(op.cashflow(0.0, 100.0, EPS / 2.0, lambda).unwrap(), -EPS);
        }

        // On the W = 0 line every withdrawal is a no-op
        let values = grid.vector(|s, w| s + w * w);
        let i = grid.index(4, 0);
        let row = op.transition_row(i, 0.7).unwrap();
        assert_abs_diff_eq!(row.apply(&values), values[i], epsilon = 1e-12);
        assert!(!op.is_controllable(i));
        assert!(op.is_controllable(grid.index(4, 1)));
    }

    #[test]
    fn test_invalid_inputs_fail_fast() {
        let grid = test_grid();
        let schedule = test_schedule();
        let op = WithdrawalOperator::new(&grid, &schedule);

        assert!(matches!(
            op.transition_row(5, 1.5),
            Err(GmwbError::InvalidControl { .. })
        ));
        assert!(matches!(
            op.cashflow(0.0, 100.0, 50.0, -0.1),
            Err(GmwbError::InvalidControl { .. })
        ));
        assert!(matches!(
            op.cashflow(0.0, 100.0, 50.0, f64::NAN),
            Err(GmwbError::InvalidControl { .. })
        ));
        assert!(matches!(
            op.cashflow(0.0, 100.0, -1.0, 0.1),
            Err(GmwbError::InvalidState { .. })
        ));

        let mut control = op.register_control();
        control.set(7, 2.0);
        assert!(op.assemble_transition(0.0, &control).is_err());
        assert!(op.assemble_cashflow(0.0, &ControlField::zeros(3)).is_err());
    }

    #[test]
    fn test_assembly_is_pure() {
        let grid = test_grid();
        let schedule = SurrenderSchedule::default_7_year(1.0);
        let op = WithdrawalOperator::new(&grid, &schedule);

        let control = ControlField::from_vec(
            (0..grid.size()).map(|i| (i % 7) as f64 / 6.0).collect(),
        );

        let a1 = op.assemble_transition(2.5, &control).unwrap();
        let a2 = op.assemble_transition(2.5, &control).unwrap();
        assert_eq!(a1, a2);

        let b1 = op.assemble_cashflow(2.5, &control).unwrap();
        let b2 = op.assemble_cashflow(2.5, &control).unwrap();
        assert_eq!(
            b1.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            b2.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_cashflow_uses_time_dependent_penalty() {
        let grid = test_grid();
        let schedule = SurrenderSchedule::new(1.0, vec![0.5, 0.2]);
        let op = WithdrawalOperator::new(&grid, &schedule);

        // lambda W = 10, allowance 1, excess 9
        let year_one = op.cashflow(0.5, 100.0, 50.0, 0.2).unwrap();
        let year_two = op.cashflow(1.5, 100.0, 50.0, 0.2).unwrap();
        let year_three = op.cashflow(2.5, 100.0, 50.0, 0.2).unwrap();
        assert_abs_diff_eq!(year_one, 10.0 - 4.5 - EPS, epsilon = 1e-12);
        assert_abs_diff_eq!(year_two, 10.0 - 1.8 - EPS, epsilon = 1e-12);
        assert_abs_diff_eq!(year_three, 10.0 - EPS, epsilon = 1e-12);
    }

    #[test]
    fn test_residual_matches_assembled_system() {
        let grid = test_grid();
        let schedule = test_schedule();
        let op = WithdrawalOperator::new(&grid, &schedule);
        let values = grid.vector(|s, w| s.max(0.9 * w));
        let control = ControlField::uniform(grid.size(), 0.3);

        let a = op.a(1.0, &control).unwrap();
        let b = op.b(1.0, &control).unwrap();
        let av = a.mul_vec(&values).unwrap();

        for i in 0..grid.size() {
            let r = op.residual(1.0, i, 0.3, &values).unwrap();
            assert_abs_diff_eq!(r, av[i] - b[i], epsilon = 1e-9);
        }
    }
}
