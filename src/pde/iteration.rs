//! Fixed-point convergence test and iteration bookkeeping

use serde::{Deserialize, Serialize};

/// Stops a fixed-point iteration once successive iterates agree to a
/// relative tolerance:
/// `max_i |new_i - old_i| / max(scale, |new_i|) < tolerance`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceIteration {
    pub tolerance: f64,
    pub scale: f64,
    pub max_iterations: usize,
}

impl Default for ToleranceIteration {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            scale: 1.0,
            max_iterations: 100,
        }
    }
}

impl ToleranceIteration {
    pub fn relative_change(&self, old: &[f64], new: &[f64]) -> f64 {
        old.iter()
            .zip(new)
            .map(|(o, n)| (n - o).abs() / n.abs().max(self.scale))
            .fold(0.0, f64::max)
    }

    pub fn converged(&self, old: &[f64], new: &[f64]) -> bool {
        self.relative_change(old, new) < self.tolerance
    }
}

/// Inner iteration counts recorded per timestep
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IterationStats {
    pub iterations: Vec<usize>,
    /// Timesteps that hit the iteration cap before converging
    pub non_converged: usize,
}

impl IterationStats {
    pub fn record(&mut self, iterations: usize, converged: bool) {
        self.iterations.push(iterations);
        if !converged {
            self.non_converged += 1;
        }
    }

    pub fn average(&self) -> f64 {
        if self.iterations.is_empty() {
            return 0.0;
        }
        self.iterations.iter().sum::<usize>() as f64 / self.iterations.len() as f64
    }

    pub fn max(&self) -> usize {
        self.iterations.iter().copied().max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_change_uses_scale_floor() {
        let it = ToleranceIteration::default();
        // Small values are measured against the scale, large ones relatively
        assert_eq!(it.relative_change(&[0.0, 100.0], &[0.5, 100.0]), 0.5);
        assert_eq!(it.relative_change(&[0.0, 100.0], &[0.0, 200.0]), 0.5);
        assert!(it.converged(&[1.0, 2.0], &[1.0, 2.0 + 1e-9]));
        assert!(!it.converged(&[1.0, 2.0], &[1.0, 2.1]));
    }

    #[test]
    fn test_stats_average() {
        let mut stats = IterationStats::default();
        assert_eq!(stats.average(), 0.0);

        stats.record(2, true);
        stats.record(4, true);
        stats.record(100, false);
        assert_eq!(stats.average(), 106.0 / 3.0);
        assert_eq!(stats.max(), 100);
        assert_eq!(stats.non_converged, 1);
    }
}
