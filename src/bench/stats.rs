//! Benchmark statistics and their textual reports

use std::fmt::{self, Write as _};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{BenchError, Result};
use crate::solver::Symmetry;

/// Average wall time of each solver phase
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhaseTimings {
    pub analysis: Duration,
    pub factorization: Duration,
    pub solve: Duration,
}

impl PhaseTimings {
    /// Analysis + factorization + solve
    pub fn afs(&self) -> Duration {
        self.analysis + self.factorization + self.solve
    }

    /// Factorization + solve
    pub fn fs(&self) -> Duration {
        self.factorization + self.solve
    }
}

/// Everything a driver reports about one run
#[derive(Debug, Clone, PartialEq)]
pub struct BenchStats {
    /// Matrix file name as given on the command line
    pub name: String,
    pub nrows: usize,
    pub ncols: usize,
    pub nnz: usize,
    pub mpi_ranks: usize,
    pub threads: usize,
    pub symmetry: Symmetry,
    pub sparsity_percent: f64,
    pub timings: PhaseTimings,
    pub relative_error: f64,
}

/// `‖x − 1‖₂ / √n`, the error against the all-ones exact solution
pub fn relative_error(solution: &[f64]) -> f64 {
    if solution.is_empty() {
        return 0.0;
    }
    let sum: f64 = solution.iter().map(|x| (x - 1.0) * (x - 1.0)).sum();
    sum.sqrt() / (solution.len() as f64).sqrt()
}

/// Report layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Fixed-width table with a header row
    #[default]
    Table,
    /// The table with the relative error in scientific notation
    TableScientific,
    /// One comma separated line
    Csv,
    /// `$$$` framed summary followed by a comma separated line
    Summary,
}

impl FromStr for OutputFormat {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "table-sci" => Ok(OutputFormat::TableScientific),
            "csv" => Ok(OutputFormat::Csv),
            "summary" => Ok(OutputFormat::Summary),
            other => Err(BenchError::InvalidArgument(format!(
                "unknown output format '{}' (expected table, table-sci, csv or summary)",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::TableScientific => write!(f, "table-sci"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Summary => write!(f, "summary"),
        }
    }
}

const TABLE_COLUMNS: [(&str, usize); 12] = [
    ("M", 12),
    ("N", 12),
    ("nnz", 12),
    ("mpi_ranks", 12),
    ("omp_thrds", 12),
    ("sparsity_%", 12),
    ("analysis_time", 16),
    ("fact_time", 16),
    ("solve_time", 16),
    ("afs_time", 16),
    ("fs_time", 16),
    ("relativeError", 12),
];

const SUMMARY_RULE: &str = "$$$$$$$$$$$$$$$$$$$$$$$$$$$$$$$$$$$$$$$";

impl BenchStats {
    /// Renders the report in `format`
    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => self.render_table(),
            OutputFormat::TableScientific => self.render_table_scientific(),
            OutputFormat::Csv => self.render_csv(),
            OutputFormat::Summary => self.render_summary(),
        }
    }

    /// Header row and value row, left aligned, times in scientific notation
    /// and the relative error with two decimals
    pub fn render_table(&self) -> String {
        self.table(format!("{:.2}", self.relative_error))
    }

    /// [`render_table`](Self::render_table) with a `1.50e-15` style error
    pub fn render_table_scientific(&self) -> String {
        self.table(scientific(self.relative_error))
    }

    fn table(&self, relative_error: String) -> String {
        let t = &self.timings;
        let values = [
            self.nrows.to_string(),
            self.ncols.to_string(),
            self.nnz.to_string(),
            self.mpi_ranks.to_string(),
            self.threads.to_string(),
            format!("{:.2}", self.sparsity_percent),
            scientific(secs(t.analysis)),
            scientific(secs(t.factorization)),
            scientific(secs(t.solve)),
            scientific(secs(t.afs())),
            scientific(secs(t.fs())),
            relative_error,
        ];

        let mut out = String::from("\n");
        for (name, width) in TABLE_COLUMNS {
            let _ = write!(out, "{:<width$}", name, width = width);
        }
        out.push('\n');
        for ((_, width), value) in TABLE_COLUMNS.iter().zip(&values) {
            let _ = write!(out, "{:<width$}", value, width = *width);
        }
        out.push('\n');
        out
    }

    /// `name, ranks, threads, sym, nrows, nnz, sparsity, a, f, s, afs, fs, error`
    pub fn render_csv(&self) -> String {
        let t = &self.timings;
        format!(
            "{}, {}, {}, {}, {}, {}, {:5.2}, {:5.2}, {:5.2}, {:5.2}, {:5.2}, {:5.2}, {:5.2}\n",
            self.name,
            self.mpi_ranks,
            self.threads,
            self.symmetry.code(),
            self.nrows,
            self.nnz,
            self.sparsity_percent,
            secs(t.analysis),
            secs(t.factorization),
            secs(t.solve),
            secs(t.afs()),
            secs(t.fs()),
            self.relative_error,
        )
    }

    /// Framed summary plus `name, nrows, nnz, sparsity, ranks, threads,
    /// symbolic, numeric, solve, total, error`
    pub fn render_summary(&self) -> String {
        let t = &self.timings;
        let mut out = String::new();
        let _ = writeln!(out, " - comm_size = {}", self.mpi_ranks);
        let _ = writeln!(out, " - matrix_name = {}", self.name);
        let _ = writeln!(out, "\n{}", SUMMARY_RULE);
        let _ = writeln!(out, "Relative Error is: {} ", scientific_long(self.relative_error));
        let _ = writeln!(out, "Time Symbolic:     {:10.2} ", secs(t.analysis));
        let _ = writeln!(out, "Time Numeric:      {:10.2} ", secs(t.factorization));
        let _ = writeln!(out, "Time Solve:        {:10.2} ", secs(t.solve));
        let _ = writeln!(out, "Time S+N+S:        {:10.2} ", secs(t.afs()));
        let _ = writeln!(out, "{}", SUMMARY_RULE);
        let _ = writeln!(
            out,
            "{}, {}, {}, {:5.2}, {}, {}, {:5.2}, {:5.2}, {:5.2}, {:5.2}, {:5.2}",
            self.name,
            self.nrows,
            self.nnz,
            self.sparsity_percent,
            self.mpi_ranks,
            self.threads,
            secs(t.analysis),
            secs(t.factorization),
            secs(t.solve),
            secs(t.afs()),
            self.relative_error,
        );
        out
    }
}

fn secs(d: Duration) -> f64 {
    d.as_secs_f64()
}

/// `1.23e-04`: two decimals and a signed exponent of at least two digits
fn scientific(x: f64) -> String {
    c_exponent(format!("{:.2e}", x))
}

/// `1.234568e-04`
fn scientific_long(x: f64) -> String {
    c_exponent(format!("{:.6e}", x))
}

fn c_exponent(rust: String) -> String {
    match rust.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => rust,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BenchStats {
        BenchStats {
            name: "lap.mtx".to_string(),
            nrows: 4,
            ncols: 4,
            nnz: 10,
            mpi_ranks: 1,
            threads: 2,
            symmetry: Symmetry::GeneralSymmetric,
            sparsity_percent: 37.5,
            timings: PhaseTimings {
                analysis: Duration::from_millis(250),
                factorization: Duration::from_millis(500),
                solve: Duration::from_millis(250),
            },
            relative_error: 1.5e-15,
        }
    }

    #[test]
    fn test_relative_error() {
        assert_eq!(relative_error(&[1.0, 1.0, 1.0]), 0.0);
        assert!((relative_error(&[2.0, 1.0, 1.0, 1.0]) - 0.5).abs() < 1e-15);
        assert_eq!(relative_error(&[]), 0.0);
    }

    #[test]
    fn test_scientific_matches_printf() {
        assert_eq!(scientific(0.000123), "1.23e-04");
        assert_eq!(scientific(12345.0), "1.23e+04");
        assert_eq!(scientific(0.0), "0.00e+00");
        assert_eq!(scientific_long(1.5e-15), "1.500000e-15");
    }

    #[test]
    fn test_table_layout() {
        let table = sample().render_table();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].is_empty());
        assert!(lines[1].starts_with("M           N           nnz"));
        assert!(lines[1].contains("analysis_time   fact_time"));
        assert!(lines[2].starts_with("4           4           10          1           2           37.50"));
        assert!(lines[2].contains("2.50e-01"));
        assert!(lines[2].contains("1.00e+00"));
        assert!(lines[2].trim_end().ends_with(" 0.00"));
    }

    #[test]
    fn test_scientific_table_keeps_small_errors() {
        let mut stats = sample();
        let fixed = stats.render(OutputFormat::Table);
        let sci = stats.render(OutputFormat::TableScientific);
        assert!(sci.lines().nth(2).unwrap().trim_end().ends_with("1.50e-15"));
        assert_eq!(fixed.lines().nth(1), sci.lines().nth(1));

        stats.relative_error = 0.256;
        let fixed = stats.render(OutputFormat::Table);
        assert!(fixed.lines().nth(2).unwrap().trim_end().ends_with(" 0.26"));
    }

    #[test]
    fn test_csv_line() {
        assert_eq!(
            sample().render_csv(),
            "lap.mtx, 1, 2, 2, 4, 10, 37.50,  0.25,  0.50,  0.25,  1.00,  0.75,  0.00\n"
        );
    }

    #[test]
    fn test_summary_block() {
        let summary = sample().render_summary();
        assert!(summary.contains("Relative Error is: 1.500000e-15"));
        assert!(summary.contains("Time S+N+S:              1.00"));
        assert_eq!(summary.matches(SUMMARY_RULE).count(), 2);
        assert!(summary
            .trim_end()
            .ends_with("lap.mtx, 4, 10, 37.50, 1, 2,  0.25,  0.50,  0.25,  1.00,  0.00"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!(
            "table-sci".parse::<OutputFormat>().unwrap(),
            OutputFormat::TableScientific
        );
        assert_eq!(OutputFormat::TableScientific.to_string(), "table-sci");
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
