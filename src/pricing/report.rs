//! Convergence tables and CSV export

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::LevelResult;
use crate::error::Result;
use crate::grid::InterpolationGrid;

/// Value at a reference point across refinement levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceRow {
    pub level: usize,
    pub nodes: usize,
    pub timesteps: usize,
    pub value: f64,
    /// Change from the previous level
    pub change: Option<f64>,
    /// Ratio of successive changes (about 4 for second-order convergence)
    pub ratio: Option<f64>,
}

/// Build a convergence table for the value at (S, W)
pub fn convergence_table(results: &[LevelResult], s: f64, w: f64) -> Result<Vec<ConvergenceRow>> {
    let mut rows: Vec<ConvergenceRow> = Vec::with_capacity(results.len());

    for result in results {
        let value = result.value_at(s, w)?;
        let change = rows.last().map(|prev| value - prev.value);
        let ratio = match (rows.last().and_then(|prev| prev.change), change) {
            (Some(prev), Some(curr)) if curr != 0.0 => Some(prev / curr),
            _ => None,
        };

        rows.push(ConvergenceRow {
            level: result.level,
            nodes: result.grid.size(),
            timesteps: result.timesteps,
            value,
            change,
            ratio,
        });
    }

    Ok(rows)
}

/// Write the reporting surface of a level as `investment,withdrawal,value`
pub fn write_surface_csv(result: &LevelResult, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for point in &result.surface {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Axis, RectilinearGrid2};
    use crate::pde::IterationStats;
    use crate::pricing::SurfacePoint;
    use approx::assert_relative_eq;

    fn level(level: usize, value: f64) -> LevelResult {
        let grid = RectilinearGrid2::new(
            Axis::new(vec![0.0, 200.0]).unwrap(),
            Axis::new(vec![0.0, 200.0]).unwrap(),
        );
        LevelResult {
            level,
            grid,
            controls: 11,
            timesteps: 100,
            values: vec![value; 4],
            iterations: IterationStats::default(),
            surface: vec![SurfacePoint {
                investment: 100.0,
                withdrawal: 100.0,
                value,
            }],
        }
    }

    #[test]
    fn test_convergence_ratios() {
        let results = vec![level(0, 104.0), level(1, 105.0), level(2, 105.25)];
        let table = convergence_table(&results, 100.0, 100.0).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table[0].change, None);
        assert_eq!(table[1].change, Some(1.0));
        assert_eq!(table[1].ratio, None);
        assert_relative_eq!(table[2].ratio.unwrap(), 4.0);
    }

    #[test]
    fn test_surface_csv_round_trip() {
        let path = std::env::temp_dir().join(format!("gmwb_surface_{}.csv", std::process::id()));
        write_surface_csv(&level(0, 101.5), &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("investment,withdrawal,value"));
        assert_eq!(lines.next(), Some("100.0,100.0,101.5"));
        std::fs::remove_file(&path).unwrap();
    }
}
