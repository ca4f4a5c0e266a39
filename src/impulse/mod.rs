//! Withdrawal impulse operator and the control policy search that drives it
//!
//! At every timestep the policyholder may withdraw a fraction lambda of the
//! guarantee base W. The [`WithdrawalOperator`] describes one such decision
//! as a linear system `(I - M) V = b`: `M` reconstructs the value at the
//! post-withdrawal state by bilinear interpolation and `b` is the cash paid
//! out net of surrender penalties. [`PolicySearch`] picks, per grid point,
//! the lambda minimizing the impulse residual `(I - M) V - b`.
//!
//! # Architecture
//!
//! The operator is a pure function of (time, grid, schedule, control
//! snapshot). The control assignment is passed in explicitly as a
//! [`ControlField`]; nothing is cached between calls.

mod control;
mod search;
mod withdrawal;

pub use control::{ControlField, ControlSet};
pub use search::PolicySearch;
pub use withdrawal::{TransitionRow, WithdrawalOperator, DEFAULT_EPSILON};

use crate::error::Result;
use crate::linalg::SparseMatrix;

/// A linear system `A(t) V = b(t)` parameterised by one control per grid point
///
/// This is the coupling between an impulse operator and the iteration
/// machinery: the policy search evaluates [`residual`](Self::residual) for
/// candidate controls, and the penalty method assembles `A` and `b` for the
/// chosen field.
pub trait ControlledLinearSystem {
    /// Number of unknowns
    fn size(&self) -> usize;

    /// Fresh control field for this system, one free value per grid point
    fn register_control(&self) -> ControlField;

    /// System matrix for a control assignment
    fn a(&self, t: f64, control: &ControlField) -> Result<SparseMatrix>;

    /// Right-hand side for a control assignment
    fn b(&self, t: f64, control: &ControlField) -> Result<Vec<f64>>;

    /// Row `index` of `A V - b` when that point uses control `value`
    fn residual(&self, t: f64, index: usize, value: f64, values: &[f64]) -> Result<f64>;

    /// Whether any control other than "do nothing" applies at `index`
    fn is_controllable(&self, _index: usize) -> bool {
        true
    }
}
