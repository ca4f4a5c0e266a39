//! Continuation PDE and the iteration machinery around the impulse operator
//!
//! - [`BlackScholes`]: lognormal diffusion of the investment account
//! - [`ReverseConstantStepper`] / [`Bdf`]: backward time stepping
//! - [`PenaltyMethod`]: couples continuation and impulse regimes
//! - [`ToleranceIteration`]: fixed-point driver within a timestep

mod black_scholes;
mod stepper;
mod penalty;
mod iteration;

pub use black_scholes::BlackScholes;
pub use stepper::{Bdf, ReverseConstantStepper};
pub use penalty::{PenaltyMethod, PenaltySolve};
pub use iteration::{IterationStats, ToleranceIteration};
