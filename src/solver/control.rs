//! ICNTL control parameters
//!
//! Indices are 1-based to match the solver documentation, so `set(7, 5)`
//! is ICNTL(7) = 5.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::constants::*;
use crate::error::{BenchError, Result};

/// ICNTL(1): output stream for error messages
pub const ERROR_STREAM: usize = 1;
/// ICNTL(2): output stream for diagnostics and warnings
pub const DIAGNOSTIC_STREAM: usize = 2;
/// ICNTL(3): output stream for global information
pub const GLOBAL_STREAM: usize = 3;
/// ICNTL(4): print level
pub const PRINT_LEVEL: usize = 4;
/// ICNTL(7): symmetric permutation (ordering) used during analysis
pub const ORDERING: usize = 7;
/// ICNTL(10): maximum number of iterative refinement steps
pub const ITERATIVE_REFINEMENT: usize = 10;
/// ICNTL(14): percentage increase of the estimated working space
pub const WORKSPACE_RELAXATION: usize = 14;
/// ICNTL(16): number of OpenMP threads
pub const THREADS: usize = 16;
/// ICNTL(22): out-of-core factorization
pub const OUT_OF_CORE: usize = 22;
/// ICNTL(23): maximum working memory per process in MB
pub const MAX_MEMORY_MB: usize = 23;
/// ICNTL(24): null pivot row detection
pub const NULL_PIVOT_DETECTION: usize = 24;

/// A set of ICNTL overrides applied after [`Job::Init`](super::Job::Init)
///
/// Entries that are not set keep whatever the library chose at
/// initialization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControlParameters {
    values: BTreeMap<usize, i32>,
}

impl ControlParameters {
    /// No overrides at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// The benchmark's standard settings
    ///
    /// With `verbose` unset, the output streams are redirected so that only
    /// errors reach the terminal; with it set, ICNTL(1..=4) keep the
    /// library defaults.
    pub fn benchmark_defaults(verbose: bool) -> Self {
        let mut c = Self::empty();
        if !verbose {
            c.set(ERROR_STREAM, DEFAULT_ICNTL_ERROR_STREAM);
            c.set(DIAGNOSTIC_STREAM, DEFAULT_ICNTL_DIAGNOSTIC_STREAM);
            c.set(GLOBAL_STREAM, DEFAULT_ICNTL_GLOBAL_STREAM);
            c.set(PRINT_LEVEL, DEFAULT_ICNTL_PRINT_LEVEL);
        }
        c.set(ORDERING, DEFAULT_ICNTL_ORDERING);
        c.set(ITERATIVE_REFINEMENT, DEFAULT_ICNTL_REFINEMENT);
        c.set(OUT_OF_CORE, DEFAULT_ICNTL_OUT_OF_CORE);
        c.set(NULL_PIVOT_DETECTION, DEFAULT_ICNTL_NULL_PIVOT);
        c.set(WORKSPACE_RELAXATION, DEFAULT_ICNTL_WORKSPACE_RELAX);
        c.set(MAX_MEMORY_MB, DEFAULT_ICNTL_MAX_MEMORY_MB);
        c
    }

    /// Settings that silence the library completely (used by the demo)
    pub fn silent() -> Self {
        let mut c = Self::empty();
        c.set(ERROR_STREAM, -1);
        c.set(DIAGNOSTIC_STREAM, -1);
        c.set(GLOBAL_STREAM, -1);
        c.set(PRINT_LEVEL, 0);
        c
    }

    /// Sets ICNTL(`index`)
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside `1..=60`; use [`ControlOverride`] to
    /// validate user input.
    pub fn set(&mut self, index: usize, value: i32) -> &mut Self {
        assert!(
            (1..=ICNTL_LEN).contains(&index),
            "ICNTL index {} out of range 1..={}",
            index,
            ICNTL_LEN
        );
        self.values.insert(index, value);
        self
    }

    /// ICNTL(`index`) if it has been set
    pub fn get(&self, index: usize) -> Option<i32> {
        self.values.get(&index).copied()
    }

    /// Applies a list of validated overrides on top of these settings
    pub fn apply(&mut self, overrides: &[ControlOverride]) {
        for o in overrides {
            self.set(o.index, o.value);
        }
    }

    /// Iterates over `(index, value)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, i32)> + '_ {
        self.values.iter().map(|(&k, &v)| (k, v))
    }
}

/// A single `I=V` override as given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlOverride {
    pub index: usize,
    pub value: i32,
}

impl FromStr for ControlOverride {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        let (index, value) = s
            .split_once('=')
            .ok_or_else(|| BenchError::InvalidArgument(format!("'{}' is not of the form I=V", s)))?;

        let index: usize = index
            .trim()
            .parse()
            .map_err(|_| BenchError::InvalidArgument(format!("invalid ICNTL index '{}'", index)))?;
        if !(1..=ICNTL_LEN).contains(&index) {
            return Err(BenchError::InvalidArgument(format!(
                "ICNTL index {} out of range 1..={}",
                index, ICNTL_LEN
            )));
        }
        let value: i32 = value
            .trim()
            .parse()
            .map_err(|_| BenchError::InvalidArgument(format!("invalid ICNTL value '{}'", value)))?;

        Ok(Self { index, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benchmark_defaults() {
        let quiet = ControlParameters::benchmark_defaults(false);
        assert_eq!(quiet.get(PRINT_LEVEL), Some(1));
        assert_eq!(quiet.get(ORDERING), Some(5));
        assert_eq!(quiet.get(MAX_MEMORY_MB), Some(250_000));
        assert_eq!(quiet.get(NULL_PIVOT_DETECTION), Some(1));

        let verbose = ControlParameters::benchmark_defaults(true);
        assert_eq!(verbose.get(PRINT_LEVEL), None);
        assert_eq!(verbose.get(ORDERING), Some(5));
    }

    #[test]
    fn test_overrides() {
        let o: ControlOverride = "7=7".parse().unwrap();
        assert_eq!(o, ControlOverride { index: 7, value: 7 });
        assert!("0=1".parse::<ControlOverride>().is_err());
        assert!("61=1".parse::<ControlOverride>().is_err());
        assert!("7".parse::<ControlOverride>().is_err());
        assert!("7=x".parse::<ControlOverride>().is_err());

        let mut c = ControlParameters::benchmark_defaults(false);
        c.apply(&[o, ControlOverride { index: 16, value: 4 }]);
        assert_eq!(c.get(ORDERING), Some(7));
        assert_eq!(c.get(THREADS), Some(4));
    }
}
