//! Process and thread environment
//!
//! The benchmark runs as one process per MPI rank. With the `mumps` feature
//! the communicator is real (`MPI_Init` through the C shim); otherwise the
//! rank and size are taken from whatever launcher started the process, so a
//! native run under `mpirun` still prints from a single rank.

use crate::error::Result;

/// Launcher variables holding the rank, in lookup order
const RANK_VARS: &[&str] = &["OMPI_COMM_WORLD_RANK", "PMI_RANK", "PMIX_RANK", "SLURM_PROCID"];

/// Launcher variables holding the number of ranks, in lookup order
const SIZE_VARS: &[&str] = &["OMPI_COMM_WORLD_SIZE", "PMI_SIZE", "SLURM_NTASKS"];

/// The world communicator of this run
///
/// Dropping it finalizes MPI when it was initialized here.
#[derive(Debug)]
pub struct Communicator {
    rank: usize,
    size: usize,
    owns_mpi: bool,
}

impl Communicator {
    /// Initializes MPI (feature `mumps`) and queries rank and size
    #[cfg(feature = "mumps")]
    pub fn init() -> Result<Self> {
        use crate::error::BenchError;
        use crate::solver::ffi;

        // SAFETY: the shim checks MPI_Initialized before calling MPI_Init
        let status = unsafe { ffi::bench_mpi_init() };
        if status != 0 {
            return Err(BenchError::Backend(format!("MPI_Init failed with code {}", status)));
        }

        let mut rank = 0;
        let mut size = 1;
        // SAFETY: out-pointers refer to live locals
        unsafe {
            ffi::bench_mpi_rank(&mut rank);
            ffi::bench_mpi_size(&mut size);
        }

        tracing::debug!(rank, size, "MPI initialized");
        Ok(Self {
            rank: rank.max(0) as usize,
            size: size.max(1) as usize,
            owns_mpi: true,
        })
    }

    /// Reads rank and size from the launcher environment
    #[cfg(not(feature = "mumps"))]
    pub fn init() -> Result<Self> {
        Ok(Self::from_env(|key| std::env::var(key).ok()))
    }

    /// Rank and size from a variable lookup; defaults to a single process
    pub fn from_env<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |vars: &[&str]| {
            vars.iter()
                .find_map(|v| lookup(v).and_then(|s| s.trim().parse::<usize>().ok()))
        };

        let size = first(SIZE_VARS).unwrap_or(1).max(1);
        let rank = first(RANK_VARS).unwrap_or(0).min(size - 1);
        Self {
            rank,
            size,
            owns_mpi: false,
        }
    }

    /// A single-process communicator
    pub fn single() -> Self {
        Self {
            rank: 0,
            size: 1,
            owns_mpi: false,
        }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Rank 0 reads the matrix, defines the problem and reports
    pub fn is_host(&self) -> bool {
        self.rank == 0
    }
}

impl Drop for Communicator {
    fn drop(&mut self) {
        if self.owns_mpi {
            finalize_mpi();
        }
    }
}

#[cfg(feature = "mumps")]
fn finalize_mpi() {
    // SAFETY: only called by the communicator that initialized MPI
    let status = unsafe { crate::solver::ffi::bench_mpi_finalize() };
    if status != 0 {
        tracing::warn!(status, "MPI_Finalize failed");
    }
}

#[cfg(not(feature = "mumps"))]
fn finalize_mpi() {}

/// Worker threads per rank
///
/// Honors `OMP_NUM_THREADS` (first entry of a nested list such as `8,2`),
/// falling back to the number of logical CPUs.
pub fn detect_thread_count() -> usize {
    threads_from(std::env::var("OMP_NUM_THREADS").ok().as_deref())
}

fn threads_from(omp_num_threads: Option<&str>) -> usize {
    omp_num_threads
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or_else(num_cpus::get)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_is_single_process() {
        let comm = Communicator::from_env(lookup(&[]));
        assert_eq!(comm.rank(), 0);
        assert_eq!(comm.size(), 1);
        assert!(comm.is_host());
    }

    #[test]
    fn test_launcher_variables() {
        let comm = Communicator::from_env(lookup(&[
            ("OMPI_COMM_WORLD_RANK", "3"),
            ("OMPI_COMM_WORLD_SIZE", "4"),
        ]));
        assert_eq!((comm.rank(), comm.size()), (3, 4));
        assert!(!comm.is_host());

        let comm = Communicator::from_env(lookup(&[("SLURM_PROCID", "1"), ("SLURM_NTASKS", "2")]));
        assert_eq!((comm.rank(), comm.size()), (1, 2));
    }

    #[test]
    fn test_thread_count() {
        assert_eq!(threads_from(Some("6")), 6);
        assert_eq!(threads_from(Some("8,2")), 8);
        assert_eq!(threads_from(Some("0")), num_cpus::get());
        assert_eq!(threads_from(None), num_cpus::get());
    }
}
