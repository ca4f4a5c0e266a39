//! Backward-in-time valuation across refinement levels

use log::{debug, info, warn};

use super::config::PricingConfig;
use super::results::{LevelResult, SurfacePoint};
use crate::contract::{ConstantSchedule, ContractSchedule, Schedule, SurrenderSchedule};
use crate::error::Result;
use crate::grid::RectilinearGrid2;
use crate::impulse::{ControlSet, ControlledLinearSystem, PolicySearch, WithdrawalOperator};
use crate::linalg::{BiCgStab, SparseMatrix};
use crate::pde::{
    Bdf, BlackScholes, IterationStats, PenaltyMethod, ReverseConstantStepper, ToleranceIteration,
};

/// Main pricing engine
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    /// Create a new engine; the configuration is validated up front
    pub fn new(config: PricingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Solve every refinement level, refining the grid between levels
    pub fn run(&self) -> Result<Vec<LevelResult>> {
        let mut grid = self.config.grid()?;
        let mut results = Vec::with_capacity(self.config.refinement);

        for level in 0..self.config.refinement {
            let result = self.price_level(&grid, level)?;
            let summary = result.summary();
            info!(
                "level {}: {} nodes, {} controls, {} steps, {:.2} inner iterations on average",
                level,
                summary.nodes,
                summary.controls,
                summary.timesteps,
                summary.average_iterations
            );
            results.push(result);
            grid.refine();
        }

        Ok(results)
    }

    /// Withdrawal schedule for a step of size `dt` (allowance G dt)
    pub fn schedule(&self, dt: f64) -> Schedule {
        let terms = &self.config.terms;
        let allowance = terms.allowance_per_step(dt);
        match &terms.surrender_charges {
            Some(charges) => Schedule::Surrender(SurrenderSchedule::new(allowance, charges.clone())),
            None => Schedule::Constant(ConstantSchedule::new(allowance, terms.penalty_rate)),
        }
    }

    /// Value the contract on `grid` at refinement `level`
    pub fn price_level(&self, grid: &RectilinearGrid2, level: usize) -> Result<LevelResult> {
        let terms = &self.config.terms;
        let pow2l = 1usize << level;

        let controls = ControlSet::uniform(self.config.control_intervals * pow2l)?;
        let control_count = controls.len();
        let stepper = ReverseConstantStepper::new(terms.maturity, self.config.timesteps * pow2l)?;
        let dt = stepper.step_size();
        let schedule = self.schedule(dt);

        let impulse = WithdrawalOperator::new(grid, &schedule).with_epsilon(self.config.epsilon);
        let diffusion =
            BlackScholes::new(terms.rate, terms.volatility, terms.hedging_fee).operator(grid)?;
        let bdf = Bdf::new(dt);
        let timestep = TimestepSolver {
            system: &impulse,
            search: PolicySearch::new(controls),
            penalty: PenaltyMethod::from_tolerance(self.config.tolerance)?,
            iteration: ToleranceIteration {
                tolerance: self.config.tolerance,
                scale: 1.0,
                max_iterations: self.config.max_iterations,
            },
            solver: BiCgStab {
                tolerance: self.config.solver_tolerance,
                ..BiCgStab::default()
            },
        };

        // Payoff at expiry: the larger of the investment and a penalized
        // surrender of the remaining guarantee
        let maturity = terms.maturity;
        let mut latest =
            grid.vector(|s, w| s.max((1.0 - schedule.penalty_rate(maturity, s, w)) * w));
        let mut previous: Option<Vec<f64>> = None;
        let mut stats = IterationStats::default();

        for k in 1..=stepper.steps() {
            let t = stepper.time(k);
            let (a1, b1) = bdf.continuation(&diffusion, &latest, previous.as_deref())?;
            let (next, iterations, converged) = timestep.solve(t, (&a1, &b1), &latest)?;
            stats.record(iterations, converged);
            previous = Some(std::mem::replace(&mut latest, next));
        }

        let surface = self
            .config
            .print_grid()?
            .nodes()
            .map(|(_, s, w)| {
                Ok(SurfacePoint {
                    investment: s,
                    withdrawal: w,
                    value: grid.interpolate(&latest, s, w)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(LevelResult {
            level,
            grid: grid.clone(),
            controls: control_count,
            timesteps: stepper.steps(),
            values: latest,
            iterations: stats,
            surface,
        })
    }
}

/// Fixed-point loop for one timestep: policy search, then penalized solve,
/// until successive iterates agree
struct TimestepSolver<'a, S> {
    system: &'a S,
    search: PolicySearch,
    penalty: PenaltyMethod,
    iteration: ToleranceIteration,
    solver: BiCgStab,
}

impl<'a, S> TimestepSolver<'a, S>
where
    S: ControlledLinearSystem + Sync,
{
    /// Returns the new values, the iteration count and whether it converged
    fn solve(
        &self,
        t: f64,
        continuation: (&SparseMatrix, &[f64]),
        start: &[f64],
    ) -> Result<(Vec<f64>, usize, bool)> {
        let mut iterate = start.to_vec();

        for k in 1..=self.iteration.max_iterations {
            let control = self.search.search(self.system, t, &iterate)?;
            let step = self
                .penalty
                .solve(t, continuation, self.system, &control, &iterate, &self.solver)?;

            let done = self.iteration.converged(&iterate, &step.values);
            iterate = step.values;
            if done {
                debug!(
                    "t = {:.4}: converged in {} iterations ({} points exercising)",
                    t, k, step.penalized
                );
                return Ok((iterate, k, true));
            }
        }

        warn!(
            "t = {:.4}: no convergence after {} iterations",
            t, self.iteration.max_iterations
        );
        Ok((iterate, self.iteration.max_iterations, false))
    }
}
