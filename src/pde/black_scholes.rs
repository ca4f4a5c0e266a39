//! Finite-difference discretization of the lognormal diffusion operator

use crate::error::Result;
use crate::grid::{InterpolationGrid, RectilinearGrid2};
use crate::linalg::{SparseBuilder, SparseMatrix};

/// `L V = 1/2 sigma^2 S^2 V_SS + (r - alpha) S V_S - r V` acting along the
/// investment axis of every guarantee-base line.
///
/// Central differences are used where they give non-negative neighbour
/// weights; otherwise the drift is upwinded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackScholes {
    pub rate: f64,
    pub volatility: f64,
    pub hedging_fee: f64,
}

impl BlackScholes {
    pub fn new(rate: f64, volatility: f64, hedging_fee: f64) -> Self {
        Self {
            rate,
            volatility,
            hedging_fee,
        }
    }

    /// Drift of the investment account net of the hedging fee
    pub fn drift(&self) -> f64 {
        self.rate - self.hedging_fee
    }

    /// Neighbour weights `(alpha, beta)` for V_{i-1}, V_{i+1} at an interior node
    fn interior_weights(&self, s: f64, h_minus: f64, h_plus: f64) -> (f64, f64) {
        let diffusion = self.volatility * self.volatility * s * s;
        let drift = self.drift() * s;
        let span = h_minus + h_plus;

        let down = diffusion / (h_minus * span);
        let up = diffusion / (h_plus * span);

        let central = (down - drift / span, up + drift / span);
        if central.0 >= 0.0 && central.1 >= 0.0 {
            return central;
        }

        if drift >= 0.0 {
            (down, up + drift / h_plus)
        } else {
            (down - drift / h_minus, up)
        }
    }

    /// Sparse matrix of `L` over the grid's linear index space
    pub fn operator(&self, grid: &RectilinearGrid2) -> Result<SparseMatrix> {
        let axis = grid.investment().ticks();
        let n0 = axis.len();
        let (_, n1) = grid.shape();
        let mut builder = SparseBuilder::with_capacity(grid.size(), grid.size(), 3);

        for i1 in 0..n1 {
            for i0 in 0..n0 {
                let row = grid.index(i0, i1);
                let s = axis[i0];

                if i0 == 0 {
                    // Lower boundary: no diffusion, one-sided drift (vanishes at S = 0)
                    let h = axis[1] - axis[0];
                    let mu = self.drift() * s / h;
                    builder.push(row, row, -mu - self.rate);
                    builder.push(row, row + 1, mu);
                } else if i0 == n0 - 1 {
                    // Upper boundary: value assumed linear in S
                    let h = axis[i0] - axis[i0 - 1];
                    let mu = self.drift() * s / h;
                    builder.push(row, row - 1, -mu);
                    builder.push(row, row, mu - self.rate);
                } else {
                    let (alpha, beta) =
                        self.interior_weights(s, s - axis[i0 - 1], axis[i0 + 1] - s);
                    builder.push(row, row - 1, alpha);
                    builder.push(row, row, -(alpha + beta + self.rate));
                    builder.push(row, row + 1, beta);
                }
            }
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Axis;
    use approx::assert_abs_diff_eq;

    fn test_grid() -> RectilinearGrid2 {
        RectilinearGrid2::new(
            Axis::new(vec![0.0, 5.0, 20.0, 50.0, 80.0, 100.0, 120.0, 200.0, 500.0]).unwrap(),
            Axis::range(0.0, 50.0, 100.0).unwrap(),
        )
    }

    #[test]
    fn test_linear_payoff_is_annihilated() {
        let grid = test_grid();
        let bs = BlackScholes::new(0.05, 0.2, 0.0);
        let l = bs.operator(&grid).unwrap();

        // L S = r S - r S = 0 everywhere, boundaries included
        let values = grid.vector(|s, _| s);
        for v in l.mul_vec(&values).unwrap() {
            assert_abs_diff_eq!(v, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_constant_is_discounted() {
        let grid = test_grid();
        let bs = BlackScholes::new(0.05, 0.2, 0.01);
        let l = bs.operator(&grid).unwrap();

        for v in l.mul_vec(&vec![1.0; grid.size()]).unwrap() {
            assert_abs_diff_eq!(v, -0.05, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_off_diagonals_non_negative() {
        let grid = test_grid();
        let bs = BlackScholes::new(0.05, 0.05, 0.0);
        let l = bs.operator(&grid).unwrap();
        let (n0, _) = grid.shape();

        for i in 0..grid.size() {
            if i % n0 == n0 - 1 {
                continue;
            }
            for (j, v) in l.row(i) {
                if j != i {
                    assert!(v >= 0.0, "L[{i}, {j}] = {v}");
                }
            }
        }
    }

    #[test]
    fn test_lines_are_decoupled() {
        let grid = test_grid();
        let l = BlackScholes::new(0.05, 0.2, 0.0).operator(&grid).unwrap();
        let (n0, _) = grid.shape();

        for i in 0..grid.size() {
            for (j, _) in l.row(i) {
                assert_eq!(i / n0, j / n0);
            }
        }
    }
}
