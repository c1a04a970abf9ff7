//! Native reference backend
//!
//! A small direct solver in Rust that follows the same job protocol and
//! INFOG conventions as MUMPS, so the drivers and the test suite can run
//! without the external library.
//!
//! - **Analysis**: reverse Cuthill-McKee ordering of the symmetrized
//!   pattern (via `sprs`) and the resulting band widths.
//! - **Factorization**: banded LU in compact row storage. Partial pivoting
//!   for `SYM = 0/2`; no pivoting and a positive-pivot check for `SYM = 1`.
//!   Row updates of each elimination step run on a rayon pool.
//! - **Solve**: forward/backward substitution followed by up to ICNTL(10)
//!   steps of iterative refinement.

use ndarray::{s, Array2, ArrayViewMut1, Axis};
use rayon::prelude::*;
use sprs::TriMat;

use super::control::{self, ControlParameters};
use super::{Diagnostics, HostRole, Job, SolverBackend, Symmetry};
use crate::constants::*;
use crate::error::{BenchError, Result};
use crate::matrix::CooMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Uninitialized,
    Initialized,
    Analyzed,
    Factorized,
}

/// The problem as handed over by the host, 0-based
#[derive(Debug, Clone)]
struct Problem {
    n: usize,
    entries: Vec<(usize, usize, f64)>,
    ignored: usize,
    rhs: Vec<f64>,
}

/// Result of the analysis phase
#[derive(Debug, Clone)]
struct Analysis {
    /// `order[new] = old`
    order: Vec<usize>,
    /// Full (mirrored) entries in the new numbering
    entries: Vec<(usize, usize, f64)>,
    lower: usize,
    upper: usize,
    max_abs: f64,
}

impl Analysis {
    /// Row width of the compact band storage, including pivoting fill
    fn width(&self) -> usize {
        2 * self.lower + self.upper + 1
    }
}

/// Banded LU factors in compact row storage
///
/// Row `i` holds columns `i - lower ..= i + lower + upper`, so entry
/// `(i, j)` lives at `band[[i, j + lower - i]]`. Multipliers are stored in
/// place of the eliminated entries and row interchanges are recorded in
/// `pivots` (LINPACK style).
#[derive(Debug, Clone)]
struct BandLu {
    band: Array2<f64>,
    pivots: Vec<usize>,
    lower: usize,
    upper: usize,
}

/// Pure-Rust solver speaking the MUMPS job protocol
pub struct NativeBackend {
    pool: rayon::ThreadPool,
    threads: usize,
    symmetry: Symmetry,
    host: HostRole,
    refinement_steps: usize,
    /// Largest compact band, in entries, the factorization will allocate
    max_band_entries: usize,
    stage: Stage,
    problem: Option<Problem>,
    analysis: Option<Analysis>,
    factors: Option<BandLu>,
    solution: Vec<f64>,
}

impl NativeBackend {
    /// Creates a backend whose factorization runs on `threads` workers
    pub fn with_threads(threads: usize) -> Result<Self> {
        Ok(Self {
            pool: build_pool(threads)?,
            threads: threads.max(1),
            symmetry: Symmetry::default(),
            host: HostRole::default(),
            refinement_steps: 0,
            max_band_entries: NATIVE_MAX_BAND_ENTRIES,
            stage: Stage::Uninitialized,
            problem: None,
            analysis: None,
            factors: None,
            solution: Vec::new(),
        })
    }

    #[cfg(test)]
    fn with_band_limit(threads: usize, max_band_entries: usize) -> Result<Self> {
        let mut backend = Self::with_threads(threads)?;
        backend.max_band_entries = max_band_entries;
        Ok(backend)
    }

    fn analyze(&mut self) -> Diagnostics {
        let problem = match &self.problem {
            Some(p) => p,
            None => return Diagnostics::error(INFO_ERR_ORDER, 0),
        };
        if problem.n < 1 {
            return Diagnostics::error(INFO_ERR_ORDER, problem.n as i32);
        }
        if problem.entries.is_empty() {
            return Diagnostics::error(INFO_ERR_NNZ, 0);
        }

        let analysis = analyze_pattern(problem, self.symmetry.is_symmetric());
        tracing::debug!(
            n = problem.n,
            lower = analysis.lower,
            upper = analysis.upper,
            "native analysis: RCM band widths"
        );

        let estimate = problem.n.saturating_mul(analysis.width());
        let mut diag = if problem.ignored > 0 {
            Diagnostics::error(INFO_WARN_OUT_OF_RANGE, problem.ignored as i32)
        } else {
            Diagnostics::ok()
        };
        diag.infog[2] = estimate.min(i32::MAX as usize) as i32;

        self.analysis = Some(analysis);
        self.factors = None;
        self.stage = Stage::Analyzed;
        diag
    }

    fn factorize(&mut self) -> Diagnostics {
        let (problem, analysis) = match (&self.problem, &self.analysis) {
            (Some(p), Some(a)) => (p, a),
            _ => return Diagnostics::error(INFO_ERR_JOB_SEQUENCE, JOB_FACTORIZE),
        };

        let entries = problem.n.saturating_mul(analysis.width());
        if entries > self.max_band_entries {
            tracing::warn!(
                entries,
                limit = self.max_band_entries,
                "band storage exceeds native backend limit"
            );
            return Diagnostics::error(INFO_ERR_ALLOCATION, problem.n as i32);
        }

        let pivoting = self.symmetry != Symmetry::PositiveDefinite;
        let tolerance = NATIVE_PIVOT_TOLERANCE * analysis.max_abs;
        let result = self
            .pool
            .install(|| factor_band(problem.n, analysis, pivoting, tolerance));

        match result {
            Ok(lu) => {
                self.factors = Some(lu);
                self.stage = Stage::Factorized;
                Diagnostics::ok()
            }
            Err(column) => {
                // Report the column in the user's numbering
                let original = analysis.order[column] + 1;
                self.factors = None;
                self.stage = Stage::Analyzed;
                Diagnostics::error(INFO_ERR_SINGULAR, original as i32)
            }
        }
    }

    fn solve(&mut self) -> Diagnostics {
        let (problem, analysis, lu) = match (&self.problem, &self.analysis, &self.factors) {
            (Some(p), Some(a), Some(f)) => (p, a, f),
            _ => return Diagnostics::error(INFO_ERR_JOB_SEQUENCE, JOB_SOLVE),
        };

        // Work in the new numbering throughout
        let b: Vec<f64> = analysis.order.iter().map(|&old| problem.rhs[old]).collect();
        let mut x = b.clone();
        lu.solve_in_place(&mut x);

        for step in 0..self.refinement_steps {
            let mut r = residual(&analysis.entries, &x, &b);
            let norm = r.iter().map(|v| v * v).sum::<f64>().sqrt();
            tracing::trace!(step, residual = norm, "iterative refinement");
            if norm == 0.0 {
                break;
            }
            lu.solve_in_place(&mut r);
            x.iter_mut().zip(&r).for_each(|(x, d)| *x += d);
        }

        let mut solution = vec![0.0; problem.n];
        for (new, &old) in analysis.order.iter().enumerate() {
            solution[old] = x[new];
        }
        self.solution = solution;
        Diagnostics::ok()
    }

    fn reset(&mut self) {
        self.problem = None;
        self.analysis = None;
        self.factors = None;
        self.refinement_steps = 0;
    }
}

impl SolverBackend for NativeBackend {
    fn name(&self) -> &'static str {
        "native"
    }

    fn configure(&mut self, symmetry: Symmetry, host: HostRole) {
        self.symmetry = symmetry;
        self.host = host;
    }

    fn set_control(&mut self, params: &ControlParameters) {
        if let Some(steps) = params.get(control::ITERATIVE_REFINEMENT) {
            self.refinement_steps = steps.unsigned_abs() as usize;
        }
        if let Some(threads) = params.get(control::THREADS).filter(|&t| t > 0) {
            let threads = threads as usize;
            if threads != self.threads {
                match build_pool(threads) {
                    Ok(pool) => {
                        self.pool = pool;
                        self.threads = threads;
                    }
                    Err(err) => tracing::warn!(%err, "keeping previous thread pool"),
                }
            }
        }
        if let Some(ordering) = params.get(control::ORDERING) {
            tracing::debug!(ordering, "native backend always orders with RCM");
        }
    }

    fn define_problem(&mut self, matrix: &CooMatrix, rhs: &[f64]) {
        let n = matrix.n_rows;
        let mut ignored = 0;
        let entries = matrix
            .iter()
            .filter(|&(i, j, _)| {
                let keep = i < n && j < n;
                if !keep {
                    ignored += 1;
                }
                keep
            })
            .collect();

        let mut rhs = rhs.to_vec();
        rhs.resize(n, 0.0);

        self.problem = Some(Problem {
            n,
            entries,
            ignored,
            rhs,
        });
        self.analysis = None;
        self.factors = None;
        if self.stage > Stage::Initialized {
            self.stage = Stage::Initialized;
        }
    }

    fn execute(&mut self, job: Job) -> Diagnostics {
        let required = match job {
            Job::Init => Stage::Uninitialized,
            Job::End => Stage::Initialized,
            Job::Analyze => Stage::Initialized,
            Job::Factorize => Stage::Analyzed,
            Job::Solve => Stage::Factorized,
        };
        if job != Job::Init && self.stage < required {
            return Diagnostics::error(INFO_ERR_JOB_SEQUENCE, job.code());
        }

        match job {
            Job::Init => {
                self.reset();
                self.stage = Stage::Initialized;
                tracing::debug!(
                    symmetry = ?self.symmetry,
                    host = ?self.host,
                    threads = self.threads,
                    "native instance initialized"
                );
                Diagnostics::ok()
            }
            Job::End => {
                self.reset();
                self.stage = Stage::Uninitialized;
                Diagnostics::ok()
            }
            Job::Analyze => self.analyze(),
            Job::Factorize => self.factorize(),
            Job::Solve => self.solve(),
        }
    }

    fn solution(&self) -> &[f64] {
        &self.solution
    }
}

fn build_pool(threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .map_err(|e| BenchError::Backend(format!("failed to build thread pool: {}", e)))
}

/// Orders the symmetrized pattern with RCM and measures the band
fn analyze_pattern(problem: &Problem, symmetric: bool) -> Analysis {
    let n = problem.n;

    let mut full = Vec::with_capacity(problem.entries.len() * if symmetric { 2 } else { 1 });
    for &(i, j, v) in &problem.entries {
        full.push((i, j, v));
        if symmetric && i != j {
            full.push((j, i, v));
        }
    }

    let mut pattern = TriMat::with_capacity((n, n), full.len() * 2);
    for &(i, j, _) in &full {
        if i != j {
            pattern.add_triplet(i, j, 1.0);
            pattern.add_triplet(j, i, 1.0);
        }
    }
    let pattern: sprs::CsMat<f64> = pattern.to_csr();
    let ordering = sprs::linalg::reverse_cuthill_mckee(pattern.view());

    let order: Vec<usize> = (0..n).map(|new| ordering.perm.at(new)).collect();
    let mut position = vec![0; n];
    for (new, &old) in order.iter().enumerate() {
        position[old] = new;
    }

    let mut lower = 0;
    let mut upper = 0;
    let mut max_abs: f64 = 0.0;
    let entries: Vec<(usize, usize, f64)> = full
        .into_iter()
        .map(|(i, j, v)| {
            let (pi, pj) = (position[i], position[j]);
            lower = lower.max(pi.saturating_sub(pj));
            upper = upper.max(pj.saturating_sub(pi));
            max_abs = max_abs.max(v.abs());
            (pi, pj, v)
        })
        .collect();

    Analysis {
        order,
        entries,
        lower,
        upper,
        max_abs,
    }
}

/// Factors the permuted matrix; on failure returns the offending column
fn factor_band(
    n: usize,
    analysis: &Analysis,
    pivoting: bool,
    tolerance: f64,
) -> std::result::Result<BandLu, usize> {
    let kl = analysis.lower;
    let ku = analysis.upper;
    let mut band = Array2::<f64>::zeros((n, analysis.width()));
    for &(i, j, v) in &analysis.entries {
        band[[i, j + kl - i]] += v;
    }

    let mut pivots = Vec::with_capacity(n);
    for k in 0..n {
        let last_row = (k + kl).min(n - 1);
        let last_col = (k + kl + ku).min(n - 1);

        let mut p = k;
        if pivoting {
            let mut best = band[[k, kl]].abs();
            for i in k + 1..=last_row {
                let v = band[[i, k + kl - i]].abs();
                if v > best {
                    best = v;
                    p = i;
                }
            }
        }
        pivots.push(p);

        let pivot = band[[p, k + kl - p]];
        if pivot.abs() <= tolerance || (!pivoting && pivot <= 0.0) {
            return Err(k);
        }

        if p != k {
            for j in k..=last_col {
                let a = band[[k, j + kl - k]];
                band[[k, j + kl - k]] = band[[p, j + kl - p]];
                band[[p, j + kl - p]] = a;
            }
        }

        if last_row == k {
            continue;
        }

        let (head, mut tail) = band.view_mut().split_at(Axis(0), k + 1);
        let pivot_row = head.row(k);
        let update = |(r, mut row): (usize, ArrayViewMut1<f64>)| {
            let i = k + 1 + r;
            let at = k + kl - i;
            let l = row[at] / pivot;
            row[at] = l;
            if l != 0.0 {
                for j in k + 1..=last_col {
                    row[j + kl - i] -= l * pivot_row[j + kl - k];
                }
            }
        };

        let mut rows = tail.slice_mut(s![..last_row - k, ..]);
        if last_row - k >= NATIVE_PARALLEL_ROW_THRESHOLD {
            rows.axis_iter_mut(Axis(0))
                .into_par_iter()
                .enumerate()
                .for_each(&update);
        } else {
            rows.axis_iter_mut(Axis(0)).enumerate().for_each(&update);
        }
    }

    Ok(BandLu {
        band,
        pivots,
        lower: kl,
        upper: ku,
    })
}

impl BandLu {
    /// Overwrites `b` with the solution of `LU x = b`
    fn solve_in_place(&self, b: &mut [f64]) {
        let n = b.len();
        let kl = self.lower;

        for k in 0..n {
            let p = self.pivots[k];
            if p != k {
                b.swap(k, p);
            }
            let bk = b[k];
            if bk != 0.0 {
                for i in k + 1..=(k + kl).min(n - 1) {
                    b[i] -= self.band[[i, k + kl - i]] * bk;
                }
            }
        }

        for k in (0..n).rev() {
            let last_col = (k + kl + self.upper).min(n - 1);
            let mut sum = b[k];
            for j in k + 1..=last_col {
                sum -= self.band[[k, j + kl - k]] * b[j];
            }
            b[k] = sum / self.band[[k, kl]];
        }
    }
}

/// `b - A x` for entries in a common numbering
fn residual(entries: &[(usize, usize, f64)], x: &[f64], b: &[f64]) -> Vec<f64> {
    let mut r = b.to_vec();
    for &(i, j, v) in entries {
        r[i] -= v * x[j];
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::generate;
    use crate::solver::check;

    fn run(backend: &mut NativeBackend, matrix: &CooMatrix, rhs: &[f64]) -> Result<Vec<f64>> {
        check(Job::Init, backend.execute(Job::Init))?;
        backend.define_problem(matrix, rhs);
        for job in [Job::Analyze, Job::Factorize, Job::Solve] {
            check(job, backend.execute(job))?;
        }
        Ok(backend.solution().to_vec())
    }

    #[test]
    fn test_two_by_two_diagonal() {
        let mut backend = NativeBackend::with_threads(1).unwrap();
        backend.configure(Symmetry::Unsymmetric, HostRole::Working);
        let x = run(&mut backend, &generate::diagonal(&[1.0, 2.0]), &[1.0, 4.0]).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-14);
        assert!((x[1] - 2.0).abs() < 1e-14);
    }

    #[test]
    fn test_unsymmetric_needs_pivoting() {
        // [0 1]
        // [2 3]
        let m = CooMatrix::from_triplets(2, 2, vec![1, 2, 2], vec![2, 1, 2], vec![1.0, 2.0, 3.0])
            .unwrap();
        let mut backend = NativeBackend::with_threads(1).unwrap();
        backend.configure(Symmetry::Unsymmetric, HostRole::Working);

        // x = [1, 1]
        let x = run(&mut backend, &m, &[1.0, 5.0]).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12, "{:?}", x);
        assert!((x[1] - 1.0).abs() < 1e-12, "{:?}", x);
    }

    #[test]
    fn test_symmetric_lower_storage() {
        let a = generate::laplacian_2d(4, true);
        assert_eq!(a.n_rows, 16);
        let ones = vec![1.0; 16];
        let b = a.matvec(&ones, true);

        for sym in [Symmetry::PositiveDefinite, Symmetry::GeneralSymmetric] {
            let mut backend = NativeBackend::with_threads(2).unwrap();
            backend.configure(sym, HostRole::Working);
            let x = run(&mut backend, &a, &b).unwrap();
            let err: f64 = x.iter().map(|v| (v - 1.0).powi(2)).sum::<f64>().sqrt();
            assert!(err < 1e-10, "{:?}: error {}", sym, err);
        }
    }

    #[test]
    fn test_parallel_row_updates_match() {
        // Wide band so elimination steps cross the parallel threshold
        let a = generate::laplacian_2d(80, false);
        let ones = vec![1.0; a.n_rows];
        let b = a.matvec(&ones, false);

        let mut backend = NativeBackend::with_threads(4).unwrap();
        backend.configure(Symmetry::Unsymmetric, HostRole::Working);
        let x = run(&mut backend, &a, &b).unwrap();
        let err = x.iter().map(|v| (v - 1.0).abs()).fold(0.0, f64::max);
        assert!(err < 1e-8, "max error {}", err);
    }

    #[test]
    fn test_singular_matrix_reports_minus_ten() {
        // Second row is a multiple of the first
        let m = CooMatrix::from_triplets(
            2,
            2,
            vec![1, 1, 2, 2],
            vec![1, 2, 1, 2],
            vec![1.0, 2.0, 2.0, 4.0],
        )
        .unwrap();
        let mut backend = NativeBackend::with_threads(1).unwrap();
        backend.configure(Symmetry::Unsymmetric, HostRole::Working);
        let err = run(&mut backend, &m, &[1.0, 1.0]).unwrap_err();
        assert_eq!(err.diagnostics().map(|d| d.status()), Some(INFO_ERR_SINGULAR));
    }

    #[test]
    fn test_spd_rejects_negative_pivot() {
        let m = generate::diagonal(&[1.0, -2.0]);
        let mut backend = NativeBackend::with_threads(1).unwrap();
        backend.configure(Symmetry::PositiveDefinite, HostRole::Working);
        let err = run(&mut backend, &m, &[1.0, 1.0]).unwrap_err();
        assert_eq!(err.diagnostics().map(|d| d.infog), Some([INFO_ERR_SINGULAR, 2, 0]));

        let mut backend = NativeBackend::with_threads(1).unwrap();
        backend.configure(Symmetry::GeneralSymmetric, HostRole::Working);
        let x = run(&mut backend, &m, &[1.0, 1.0]).unwrap();
        assert!((x[1] + 0.5).abs() < 1e-14);
    }

    #[test]
    fn test_job_sequence_is_enforced() {
        let mut backend = NativeBackend::with_threads(1).unwrap();
        assert_eq!(backend.execute(Job::Analyze).status(), INFO_ERR_JOB_SEQUENCE);

        backend.execute(Job::Init);
        backend.define_problem(&generate::diagonal(&[2.0]), &[2.0]);
        assert_eq!(backend.execute(Job::Solve).status(), INFO_ERR_JOB_SEQUENCE);
        assert_eq!(backend.execute(Job::Factorize).status(), INFO_ERR_JOB_SEQUENCE);
        assert!(!backend.execute(Job::Analyze).is_error());
        assert!(!backend.execute(Job::Factorize).is_error());
        assert!(!backend.execute(Job::Solve).is_error());
        assert_eq!(backend.solution(), &[1.0]);

        assert!(!backend.execute(Job::End).is_error());
        assert_eq!(backend.execute(Job::End).status(), INFO_ERR_JOB_SEQUENCE);
    }

    #[test]
    fn test_empty_problem_is_rejected() {
        let mut backend = NativeBackend::with_threads(1).unwrap();
        backend.execute(Job::Init);
        assert_eq!(backend.execute(Job::Analyze).status(), INFO_ERR_ORDER);

        backend.define_problem(&CooMatrix::with_capacity(3, 3, 0), &[0.0; 3]);
        assert_eq!(backend.execute(Job::Analyze).infog, [INFO_ERR_NNZ, 0, 0]);
    }

    #[test]
    fn test_refinement_keeps_solution() {
        let a = generate::laplacian_1d(50, false);
        let b = a.matvec(&vec![1.0; 50], false);

        let mut backend = NativeBackend::with_threads(1).unwrap();
        backend.configure(Symmetry::Unsymmetric, HostRole::Working);
        backend.execute(Job::Init);
        let mut params = ControlParameters::empty();
        params.set(control::ITERATIVE_REFINEMENT, 3);
        backend.set_control(&params);
        backend.define_problem(&a, &b);
        for job in [Job::Analyze, Job::Factorize, Job::Solve] {
            assert!(!backend.execute(job).is_error());
        }
        assert!(backend.solution().iter().all(|v| (v - 1.0).abs() < 1e-10));
    }

    #[test]
    fn test_band_over_limit_reports_allocation_error() {
        let a = generate::laplacian_1d(10, false);
        let b = a.matvec(&vec![1.0; 10], false);

        let mut backend = NativeBackend::with_threads(1).unwrap();
        backend.configure(Symmetry::Unsymmetric, HostRole::Working);
        backend.execute(Job::Init);
        backend.define_problem(&a, &b);
        let estimate = backend.execute(Job::Analyze).infog[2] as usize;
        assert!(estimate >= 10 * 4, "estimate {}", estimate);

        let mut backend = NativeBackend::with_band_limit(1, estimate - 1).unwrap();
        backend.configure(Symmetry::Unsymmetric, HostRole::Working);
        backend.execute(Job::Init);
        backend.define_problem(&a, &b);
        assert!(!backend.execute(Job::Analyze).is_error());
        let factorization = backend.execute(Job::Factorize);
        assert_eq!(factorization.infog, [INFO_ERR_ALLOCATION, 10, 0]);
        assert_eq!(backend.execute(Job::Solve).status(), INFO_ERR_JOB_SEQUENCE);

        // Exactly at the limit still factors
        let mut backend = NativeBackend::with_band_limit(1, estimate).unwrap();
        backend.configure(Symmetry::Unsymmetric, HostRole::Working);
        let x = run(&mut backend, &a, &b).unwrap();
        assert!(x.iter().all(|v| (v - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_out_of_range_entries_are_ignored_with_warning() {
        let mut m = generate::diagonal(&[2.0, 4.0]);
        m.push(3, 1, 7.0);
        m.push(0, 2, 7.0);

        let mut backend = NativeBackend::with_threads(1).unwrap();
        backend.configure(Symmetry::Unsymmetric, HostRole::Working);
        backend.execute(Job::Init);
        backend.define_problem(&m, &[2.0, 4.0]);

        let analysis = backend.execute(Job::Analyze);
        assert!(analysis.is_warning());
        assert_eq!(analysis.status(), INFO_WARN_OUT_OF_RANGE);
        assert_eq!(analysis.infog[1], 2);

        assert!(!backend.execute(Job::Factorize).is_error());
        assert!(!backend.execute(Job::Solve).is_error());
        assert_eq!(backend.solution(), &[1.0, 1.0]);
    }
}
