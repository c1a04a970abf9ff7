//! Centralized constants for the benchmark drivers
//!
//! Solver job codes, ICNTL defaults and timing-loop sizes live here rather
//! than being scattered through the drivers.

// ============================================================================
// SOLVER PROTOCOL
// ============================================================================

/// JOB value that initializes a solver instance
pub const JOB_INIT: i32 = -1;

/// JOB value that terminates a solver instance and releases its memory
pub const JOB_END: i32 = -2;

/// JOB value for the analysis (symbolic) phase
pub const JOB_ANALYZE: i32 = 1;

/// JOB value for the numerical factorization phase
pub const JOB_FACTORIZE: i32 = 2;

/// JOB value for the solve (forward/backward substitution) phase
pub const JOB_SOLVE: i32 = 3;

/// Fortran communicator value meaning "use MPI_COMM_WORLD"
pub const USE_COMM_WORLD: i32 = -987654;

/// Number of ICNTL entries exposed by the solver
pub const ICNTL_LEN: usize = 60;

/// Number of INFOG entries
pub const INFOG_LEN: usize = 80;

/// Number of RINFOG entries
pub const RINFOG_LEN: usize = 40;

// ============================================================================
// INFOG STATUS CODES
// ============================================================================

/// Entries outside `1..=N` were ignored (warning)
pub const INFO_WARN_OUT_OF_RANGE: i32 = 1;

/// NNZ is out of range
pub const INFO_ERR_NNZ: i32 = -2;

/// JOB has an invalid value or was called out of sequence
pub const INFO_ERR_JOB_SEQUENCE: i32 = -3;

/// Matrix is numerically singular
pub const INFO_ERR_SINGULAR: i32 = -10;

/// Workspace allocation refused
pub const INFO_ERR_ALLOCATION: i32 = -13;

/// N is out of range
pub const INFO_ERR_ORDER: i32 = -16;

// ============================================================================
// ICNTL DEFAULTS
// ============================================================================

/// Output stream for error messages
pub const DEFAULT_ICNTL_ERROR_STREAM: i32 = 6;

/// Output stream for diagnostics (0 suppresses them)
pub const DEFAULT_ICNTL_DIAGNOSTIC_STREAM: i32 = 0;

/// Output stream for global information
pub const DEFAULT_ICNTL_GLOBAL_STREAM: i32 = 6;

/// Print level: errors only
pub const DEFAULT_ICNTL_PRINT_LEVEL: i32 = 1;

/// Ordering: METIS, treated as automatic when METIS is not available
pub const DEFAULT_ICNTL_ORDERING: i32 = 5;

/// Maximum number of iterative refinement steps
pub const DEFAULT_ICNTL_REFINEMENT: i32 = 0;

/// Percentage increase of the estimated working space
pub const DEFAULT_ICNTL_WORKSPACE_RELAX: i32 = 20;

/// In-core factorization
pub const DEFAULT_ICNTL_OUT_OF_CORE: i32 = 0;

/// Maximum working memory per process, in MB
pub const DEFAULT_ICNTL_MAX_MEMORY_MB: i32 = 250_000;

/// Null pivot detection enabled
pub const DEFAULT_ICNTL_NULL_PIVOT: i32 = 1;

// ============================================================================
// TIMING LOOPS
// ============================================================================

/// Warm-up calls per phase before the timed hot calls in performance mode
pub const COLD_CALLS: usize = 5;

/// Hot calls per phase when `--iter` is not given
pub const DEFAULT_HOT_CALLS: usize = 10;

// ============================================================================
// NATIVE BACKEND
// ============================================================================

/// Largest band storage (in f64 entries) the native backend will allocate
pub const NATIVE_MAX_BAND_ENTRIES: usize = 1 << 27;

/// Minimum number of rows in an elimination step before rayon is used
pub const NATIVE_PARALLEL_ROW_THRESHOLD: usize = 64;

/// Relative pivot threshold below which a pivot counts as zero
pub const NATIVE_PIVOT_TOLERANCE: f64 = 1e-14;
