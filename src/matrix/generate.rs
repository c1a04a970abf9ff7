//! Small model problems for demos, tests and benches
//!
//! All generators return 1-based [`CooMatrix`] values. With `lower_only`
//! set, only the lower triangle of a symmetric matrix is produced, which is
//! how symmetric systems are handed to the solver.

use crate::matrix::CooMatrix;

/// Diagonal matrix with the given entries
pub fn diagonal(entries: &[f64]) -> CooMatrix {
    let n = entries.len();
    let mut m = CooMatrix::with_capacity(n, n, n);
    for (i, &v) in entries.iter().enumerate() {
        let k = (i + 1) as i32;
        m.push(k, k, v);
    }
    m
}

/// Tridiagonal `[-1 2 -1]` matrix of order `n`
pub fn laplacian_1d(n: usize, lower_only: bool) -> CooMatrix {
    let mut m = CooMatrix::with_capacity(n, n, 3 * n);
    for i in 1..=n as i32 {
        if i > 1 {
            m.push(i, i - 1, -1.0);
        }
        m.push(i, i, 2.0);
        if i < n as i32 && !lower_only {
            m.push(i, i + 1, -1.0);
        }
    }
    m
}

/// Five-point Laplacian on an `nx` by `nx` grid (order `nx * nx`)
pub fn laplacian_2d(nx: usize, lower_only: bool) -> CooMatrix {
    let n = nx * nx;
    let mut m = CooMatrix::with_capacity(n, n, 5 * n);
    let idx = |x: usize, y: usize| (y * nx + x + 1) as i32;

    for y in 0..nx {
        for x in 0..nx {
            let k = idx(x, y);
            if y > 0 {
                m.push(k, idx(x, y - 1), -1.0);
            }
            if x > 0 {
                m.push(k, idx(x - 1, y), -1.0);
            }
            m.push(k, k, 4.0);
            if !lower_only {
                if x + 1 < nx {
                    m.push(k, idx(x + 1, y), -1.0);
                }
                if y + 1 < nx {
                    m.push(k, idx(x, y + 1), -1.0);
                }
            }
        }
    }
    m
}
