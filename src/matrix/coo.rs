//! Coordinate (triplet) sparse matrix format

use rayon::prelude::*;
use sprs::{CsMat, TriMat};

use crate::error::{BenchError, Result};

/// A sparse matrix in coordinate format, exactly as read from a Matrix Market file
///
/// The three parallel arrays hold **1-based** indices, which is what the
/// solver's C interface expects (`IRN`, `JCN`, `A`). Duplicate entries are
/// allowed and are summed by whoever assembles the matrix.
///
/// The only invariant is `rows.len() == cols.len() == values.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct CooMatrix {
    /// Number of rows
    pub n_rows: usize,

    /// Number of columns
    pub n_cols: usize,

    /// 1-based row indices (IRN)
    pub rows: Vec<i32>,

    /// 1-based column indices (JCN)
    pub cols: Vec<i32>,

    /// Entry values (A)
    pub values: Vec<f64>,
}

impl CooMatrix {
    /// Creates an empty matrix with room for `nnz` entries
    pub fn with_capacity(n_rows: usize, n_cols: usize, nnz: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            rows: Vec::with_capacity(nnz),
            cols: Vec::with_capacity(nnz),
            values: Vec::with_capacity(nnz),
        }
    }

    /// Creates a matrix from 1-based triplet arrays
    ///
    /// Fails if the arrays have different lengths or an index falls outside
    /// the matrix.
    pub fn from_triplets(
        n_rows: usize,
        n_cols: usize,
        rows: Vec<i32>,
        cols: Vec<i32>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if rows.len() != values.len() || cols.len() != values.len() {
            return Err(BenchError::InvalidArgument(format!(
                "triplet arrays differ in length: {} rows, {} cols, {} values",
                rows.len(),
                cols.len(),
                values.len()
            )));
        }
        let matrix = Self {
            n_rows,
            n_cols,
            rows,
            cols,
            values,
        };
        for (k, (&r, &c)) in matrix.rows.iter().zip(&matrix.cols).enumerate() {
            if !matrix.contains(r, c) {
                return Err(BenchError::IndexOutOfRange {
                    line: k + 1,
                    row: r.max(0) as usize,
                    col: c.max(0) as usize,
                    nrows: n_rows,
                    ncols: n_cols,
                });
            }
        }
        Ok(matrix)
    }

    /// Appends one 1-based entry
    pub fn push(&mut self, row: i32, col: i32, value: f64) {
        self.rows.push(row);
        self.cols.push(col);
        self.values.push(value);
    }

    /// Number of stored entries (duplicates counted)
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Whether a 1-based index pair lies inside the matrix
    pub fn contains(&self, row: i32, col: i32) -> bool {
        row >= 1 && col >= 1 && row as usize <= self.n_rows && col as usize <= self.n_cols
    }

    /// Iterates over entries as 0-based `(row, col, value)`
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows
            .iter()
            .zip(&self.cols)
            .zip(&self.values)
            .map(|((&r, &c), &v)| ((r - 1) as usize, (c - 1) as usize, v))
    }

    /// Percentage of the `n_rows * n_rows` entries that are not stored
    ///
    /// This is the figure printed in the statistics table; it follows the
    /// drivers' convention of measuring against a square matrix of order
    /// `n_rows`.
    pub fn sparsity_percent(&self) -> f64 {
        let total = self.n_rows as f64 * self.n_rows as f64;
        if total == 0.0 {
            return 0.0;
        }
        (total - self.nnz() as f64) / total * 100.0
    }

    /// Computes `y = A x`
    ///
    /// With `symmetric` set, the stored entries are one triangle of a
    /// symmetric matrix and every off-diagonal entry also contributes its
    /// mirror image.
    pub fn matvec(&self, x: &[f64], symmetric: bool) -> Vec<f64> {
        assert_eq!(x.len(), self.n_cols, "x must have n_cols entries");

        let n_rows = self.n_rows;
        let chunk = (self.nnz() / rayon::current_num_threads().max(1)).max(4096);

        self.rows
            .par_chunks(chunk)
            .zip(self.cols.par_chunks(chunk))
            .zip(self.values.par_chunks(chunk))
            .fold(
                || vec![0.0; n_rows],
                |mut y, ((rows, cols), values)| {
                    for ((&r, &c), &v) in rows.iter().zip(cols).zip(values) {
                        let (i, j) = ((r - 1) as usize, (c - 1) as usize);
                        y[i] += v * x[j];
                        if symmetric && i != j {
                            y[j] += v * x[i];
                        }
                    }
                    y
                },
            )
            .reduce(
                || vec![0.0; n_rows],
                |mut a, b| {
                    a.iter_mut().zip(b).for_each(|(a, b)| *a += b);
                    a
                },
            )
    }

    /// Assembles the matrix into CSR form, summing duplicates
    ///
    /// With `symmetric` set, off-diagonal entries are mirrored so the result
    /// holds the full matrix.
    pub fn to_csr(&self, symmetric: bool) -> CsMat<f64> {
        let mut tri = TriMat::with_capacity((self.n_rows, self.n_cols), self.nnz() * 2);
        for (i, j, v) in self.iter() {
            tri.add_triplet(i, j, v);
            if symmetric && i != j {
                tri.add_triplet(j, i, v);
            }
        }
        tri.to_csr()
    }
}
