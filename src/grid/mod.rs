//! Structured two-dimensional mesh over (investment S, guarantee base W)
//!
//! The withdrawal operator only needs the [`InterpolationGrid`] capability:
//! a fixed point enumeration, linear indexing from axis indices, the stride
//! between W-neighbours and clamped bilinear interpolation data. Any grid
//! geometry providing those (uniform, non-uniform, refined) can drive it.

mod axis;
mod rectilinear;

pub use axis::Axis;
pub use rectilinear::RectilinearGrid2;

/// Capability required by operators that reconstruct off-grid points
pub trait InterpolationGrid {
    /// Total number of grid points
    fn size(&self) -> usize;

    /// Offset between a point and its neighbour one tick up the W axis
    fn stride(&self) -> usize;

    /// Linear index of the point with axis indices (i0, i1)
    fn index(&self, i0: usize, i1: usize) -> usize;

    /// Coordinates (S, W) of the point with the given linear index
    fn node(&self, index: usize) -> (f64, f64);

    /// Per-axis bracketing data for an arbitrary point.
    ///
    /// Each entry is `(lower_index, weight_on_lower)`; the upper node
    /// `lower_index + 1` carries `1 - weight_on_lower`. Points outside the
    /// covered domain are clamped to the nearest boundary node.
    fn interpolation_data(&self, point: (f64, f64)) -> [(usize, f64); 2];
}
