//! Compressed sparse row matrix with a coordinate-list builder

use crate::error::{GmwbError, Result};

/// Coordinate-list accumulator for a [`SparseMatrix`].
///
/// Entries may be pushed in any order. Duplicates are summed when the
/// matrix is built; explicit zeros are kept so a fixed per-row structure
/// survives finalization.
#[derive(Debug, Clone)]
pub struct SparseBuilder {
    rows: usize,
    cols: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl SparseBuilder {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            entries: Vec::new(),
        }
    }

    /// Builder with room for `per_row` entries in every row
    pub fn with_capacity(rows: usize, cols: usize, per_row: usize) -> Self {
        Self {
            rows,
            cols,
            entries: Vec::with_capacity(rows * per_row),
        }
    }

    /// Insert a value; panics in debug builds on out-of-range coordinates
    pub fn push(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(row < self.rows && col < self.cols);
        self.entries.push((row, col, value));
    }

    /// Finalize into CSR form with sorted column indices per row
    pub fn build(mut self) -> Result<SparseMatrix> {
        if let Some(&(r, c, _)) = self
            .entries
            .iter()
            .find(|&&(r, c, _)| r >= self.rows || c >= self.cols)
        {
            return Err(GmwbError::InvalidGrid(format!(
                "entry ({r}, {c}) outside a {}x{} matrix",
                self.rows, self.cols
            )));
        }

        self.entries.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut row_ptr = vec![0usize; self.rows + 1];
        let mut col_idx = Vec::with_capacity(self.entries.len());
        let mut values: Vec<f64> = Vec::with_capacity(self.entries.len());
        let mut last: Option<(usize, usize)> = None;

        for (r, c, v) in self.entries {
            if last == Some((r, c)) {
                if let Some(tail) = values.last_mut() {
                    *tail += v;
                }
                continue;
            }
            col_idx.push(c);
            values.push(v);
            row_ptr[r + 1] += 1;
            last = Some((r, c));
        }

        for r in 0..self.rows {
            row_ptr[r + 1] += row_ptr[r];
        }

        Ok(SparseMatrix {
            rows: self.rows,
            cols: self.cols,
            row_ptr,
            col_idx,
            values,
        })
    }
}

/// Compressed sparse row matrix
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    rows: usize,
    cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl SparseMatrix {
    pub fn identity(n: usize) -> Self {
        Self::from_diagonal(&vec![1.0; n])
    }

    pub fn from_diagonal(diagonal: &[f64]) -> Self {
        let n = diagonal.len();
        Self {
            rows: n,
            cols: n,
            row_ptr: (0..=n).collect(),
            col_idx: (0..n).collect(),
            values: diagonal.to_vec(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored entries (explicit zeros included)
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Stored entries of one row as `(column, value)`
    pub fn row(&self, r: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_ptr[r]..self.row_ptr[r + 1];
        self.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Entry at (r, c), zero when not stored
    pub fn get(&self, r: usize, c: usize) -> f64 {
        let range = self.row_ptr[r]..self.row_ptr[r + 1];
        match self.col_idx[range.clone()].binary_search(&c) {
            Ok(k) => self.values[range.start + k],
            Err(_) => 0.0,
        }
    }

    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.rows.min(self.cols)).map(|i| self.get(i, i)).collect()
    }

    pub fn mul_vec(&self, x: &[f64]) -> Result<Vec<f64>> {
        if x.len() != self.cols {
            return Err(GmwbError::DimensionMismatch {
                expected: self.cols,
                actual: x.len(),
            });
        }
        Ok((0..self.rows)
            .map(|r| self.row(r).map(|(c, v)| v * x[c]).sum())
            .collect())
    }

    pub fn scale(&self, factor: f64) -> Self {
        let mut out = self.clone();
        out.values.iter_mut().for_each(|v| *v *= factor);
        out
    }

    /// Multiply row `i` by `factors[i]`
    pub fn scale_rows(&self, factors: &[f64]) -> Result<Self> {
        if factors.len() != self.rows {
            return Err(GmwbError::DimensionMismatch {
                expected: self.rows,
                actual: factors.len(),
            });
        }
        let mut out = self.clone();
        for (r, &f) in factors.iter().enumerate() {
            for v in &mut out.values[self.row_ptr[r]..self.row_ptr[r + 1]] {
                *v *= f;
            }
        }
        Ok(out)
    }

    /// `self + factor * other`, merging the sparsity patterns
    pub fn add_scaled(&self, factor: f64, other: &SparseMatrix) -> Result<Self> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(GmwbError::DimensionMismatch {
                expected: self.rows * self.cols,
                actual: other.rows * other.cols,
            });
        }

        let mut row_ptr = Vec::with_capacity(self.rows + 1);
        let mut col_idx = Vec::with_capacity(self.nnz() + other.nnz());
        let mut values = Vec::with_capacity(self.nnz() + other.nnz());
        row_ptr.push(0);

        for r in 0..self.rows {
            let mut a = self.row(r).peekable();
            let mut b = other.row(r).peekable();
            loop {
                let next = match (a.peek(), b.peek()) {
                    (Some(&(ca, va)), Some(&(cb, vb))) => {
                        if ca == cb {
                            a.next();
                            b.next();
                            (ca, va + factor * vb)
                        } else if ca < cb {
                            a.next();
                            (ca, va)
                        } else {
                            b.next();
                            (cb, factor * vb)
                        }
                    }
                    (Some(&(ca, va)), None) => {
                        a.next();
                        (ca, va)
                    }
                    (None, Some(&(cb, vb))) => {
                        b.next();
                        (cb, factor * vb)
                    }
                    (None, None) => break,
                };
                col_idx.push(next.0);
                values.push(next.1);
            }
            row_ptr.push(col_idx.len());
        }

        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            row_ptr,
            col_idx,
            values,
        })
    }

    pub fn add(&self, other: &SparseMatrix) -> Result<Self> {
        self.add_scaled(1.0, other)
    }

    pub fn sub(&self, other: &SparseMatrix) -> Result<Self> {
        self.add_scaled(-1.0, other)
    }
}
