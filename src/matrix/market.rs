//! Matrix Market reader/writer
//!
//! Only the coordinate format is handled. Supported banners are
//!
//! ```text
//! %%MatrixMarket matrix coordinate {real|double|integer|pattern} {general|symmetric}
//! ```

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{BenchError, Result};
use crate::matrix::CooMatrix;

const BANNER: &str = "%%MatrixMarket";

/// Upper bound on the entries reserved up front from the declared count
const MAX_PREALLOCATED_ENTRIES: usize = 1 << 20;

/// Numeric field of the stored entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Real,
    Integer,
    /// No value column; every entry is 1.0
    Pattern,
}

/// Storage symmetry declared by the banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketSymmetry {
    General,
    /// Only one triangle is stored
    Symmetric,
}

/// How strictly the banner line is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderPolicy {
    /// Banner must name a supported object/format/field/symmetry
    #[default]
    Strict,
    /// First line is taken as-is without validation
    Lenient,
}

/// Parsed `%%MatrixMarket` banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixMarketHeader {
    pub field: Field,
    pub symmetry: MarketSymmetry,
}

impl Default for MatrixMarketHeader {
    fn default() -> Self {
        Self {
            field: Field::Real,
            symmetry: MarketSymmetry::General,
        }
    }
}

impl MatrixMarketHeader {
    /// Parses and validates a banner line
    pub fn parse(line: &str) -> Result<Self> {
        let tokens: Vec<String> = line.split_whitespace().map(|t| t.to_lowercase()).collect();

        if tokens.first().map(String::as_str) != Some("%%matrixmarket") {
            return Err(BenchError::parse(1, format!("missing {} banner", BANNER)));
        }
        if tokens.len() != 5 {
            return Err(BenchError::parse(
                1,
                format!("banner has {} fields, expected 5", tokens.len()),
            ));
        }
        if tokens[1] != "matrix" {
            return Err(BenchError::UnsupportedHeader {
                what: "object",
                value: tokens[1].clone(),
            });
        }
        if tokens[2] != "coordinate" {
            return Err(BenchError::UnsupportedHeader {
                what: "format",
                value: tokens[2].clone(),
            });
        }

        let field = match tokens[3].as_str() {
            "real" | "double" => Field::Real,
            "integer" => Field::Integer,
            "pattern" => Field::Pattern,
            other => {
                return Err(BenchError::UnsupportedHeader {
                    what: "field",
                    value: other.to_string(),
                })
            }
        };

        let symmetry = match tokens[4].as_str() {
            "general" => MarketSymmetry::General,
            "symmetric" => MarketSymmetry::Symmetric,
            other => {
                return Err(BenchError::UnsupportedHeader {
                    what: "symmetry",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self { field, symmetry })
    }

    /// Whether only one triangle of the matrix is stored
    pub fn is_symmetric(&self) -> bool {
        self.symmetry == MarketSymmetry::Symmetric
    }
}

impl fmt::Display for MatrixMarketHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            Field::Real => "real",
            Field::Integer => "integer",
            Field::Pattern => "pattern",
        };
        let symmetry = match self.symmetry {
            MarketSymmetry::General => "general",
            MarketSymmetry::Symmetric => "symmetric",
        };
        write!(f, "{} matrix coordinate {} {}", BANNER, field, symmetry)
    }
}

/// A matrix together with the banner it was read with
#[derive(Debug, Clone)]
pub struct MarketMatrix {
    pub header: MatrixMarketHeader,
    pub matrix: CooMatrix,
}

/// Reads a Matrix Market coordinate file
pub fn read_matrix_market<P: AsRef<Path>>(path: P, policy: HeaderPolicy) -> Result<MarketMatrix> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| BenchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_matrix_market(BufReader::new(file), policy).map_err(|err| match err {
        BenchError::Io { source, .. } => BenchError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// Reads only the banner of a Matrix Market file
///
/// Used by ranks that take part in the solve without holding the matrix.
pub fn read_header<P: AsRef<Path>>(path: P, policy: HeaderPolicy) -> Result<MatrixMarketHeader> {
    let path = path.as_ref();
    let io_err = |source| BenchError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut banner = String::new();
    BufReader::new(File::open(path).map_err(io_err)?)
        .read_line(&mut banner)
        .map_err(io_err)?;
    match policy {
        HeaderPolicy::Strict => MatrixMarketHeader::parse(banner.trim_end()),
        HeaderPolicy::Lenient => Ok(MatrixMarketHeader::parse(banner.trim_end()).unwrap_or_default()),
    }
}

/// Parses Matrix Market text from any buffered reader
pub fn parse_matrix_market<R: BufRead>(reader: R, policy: HeaderPolicy) -> Result<MarketMatrix> {
    let mut lines = reader.lines().enumerate().map(|(i, line)| {
        line.map(|l| (i + 1, l)).map_err(|source| BenchError::Io {
            path: Default::default(),
            source,
        })
    });

    // Banner
    let (_, banner) = lines
        .next()
        .transpose()?
        .ok_or_else(|| BenchError::parse(1, "empty file"))?;
    let header = match policy {
        HeaderPolicy::Strict => MatrixMarketHeader::parse(&banner)?,
        HeaderPolicy::Lenient => MatrixMarketHeader::parse(&banner).unwrap_or_default(),
    };

    // Dimension line, after any comments
    let mut last_line = 1;
    let (dim_line_no, dim_line) = loop {
        match lines.next().transpose()? {
            Some((no, line)) => {
                last_line = no;
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed.starts_with('%') {
                    continue;
                }
                break (no, line);
            }
            None => return Err(BenchError::parse(last_line, "missing dimension line")),
        }
    };
    let (n_rows, n_cols, nnz) = parse_dimensions(dim_line_no, &dim_line)?;

    // The declared count is untrusted; vectors grow past the cap as needed
    let mut matrix = CooMatrix::with_capacity(n_rows, n_cols, nnz.min(MAX_PREALLOCATED_ENTRIES));
    let mut surplus = 0;
    for item in lines {
        let (no, line) = item?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('%') {
            continue;
        }
        if matrix.nnz() == nnz {
            surplus += 1;
            continue;
        }

        let (row, col, value) = parse_entry(no, trimmed, header.field)?;
        if !matrix.contains(row, col) {
            return Err(BenchError::IndexOutOfRange {
                line: no,
                row: row.max(0) as usize,
                col: col.max(0) as usize,
                nrows: n_rows,
                ncols: n_cols,
            });
        }
        matrix.push(row, col, value);
    }

    if matrix.nnz() != nnz || surplus > 0 {
        return Err(BenchError::EntryCount {
            expected: nnz,
            found: matrix.nnz() + surplus,
        });
    }

    Ok(MarketMatrix { header, matrix })
}

fn parse_dimensions(line_no: usize, line: &str) -> Result<(usize, usize, usize)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(BenchError::parse(
            line_no,
            "dimension line must be 'rows cols nnz'",
        ));
    }

    let parse = |s: &str, what: &str| -> Result<usize> {
        s.parse::<usize>()
            .map_err(|_| BenchError::parse(line_no, format!("invalid {} '{}'", what, s)))
    };
    let n_rows = parse(parts[0], "number of rows")?;
    let n_cols = parse(parts[1], "number of columns")?;
    let nnz = parse(parts[2], "number of non-zeros")?;

    if n_rows > i32::MAX as usize || n_cols > i32::MAX as usize {
        return Err(BenchError::parse(
            line_no,
            "dimensions exceed the solver's 32-bit index range",
        ));
    }
    Ok((n_rows, n_cols, nnz))
}

fn parse_entry(line_no: usize, line: &str, field: Field) -> Result<(i32, i32, f64)> {
    let mut parts = line.split_whitespace();

    let mut index = |what: &str| -> Result<i32> {
        let token = parts
            .next()
            .ok_or_else(|| BenchError::parse(line_no, format!("missing {} index", what)))?;
        token
            .parse::<i32>()
            .map_err(|_| BenchError::parse(line_no, format!("invalid {} index '{}'", what, token)))
    };
    let row = index("row")?;
    let col = index("column")?;

    let value = match field {
        Field::Pattern => 1.0,
        Field::Real | Field::Integer => {
            let token = parts
                .next()
                .ok_or_else(|| BenchError::parse(line_no, "missing value"))?;
            token
                .parse::<f64>()
                .map_err(|_| BenchError::parse(line_no, format!("invalid value '{}'", token)))?
        }
    };
    Ok((row, col, value))
}

/// Writes a matrix in Matrix Market coordinate format
pub fn write_matrix_market<P: AsRef<Path>>(
    path: P,
    matrix: &CooMatrix,
    header: &MatrixMarketHeader,
) -> Result<()> {
    let path = path.as_ref();
    let io_err = |source| BenchError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut out = BufWriter::new(File::create(path).map_err(io_err)?);
    writeln!(out, "{}", header).map_err(io_err)?;
    writeln!(out, "{} {} {}", matrix.n_rows, matrix.n_cols, matrix.nnz()).map_err(io_err)?;
    for ((r, c), v) in matrix.rows.iter().zip(&matrix.cols).zip(&matrix.values) {
        if header.field == Field::Pattern {
            writeln!(out, "{} {}", r, c).map_err(io_err)?;
        } else {
            writeln!(out, "{} {} {:e}", r, c, v).map_err(io_err)?;
        }
    }
    out.flush().map_err(io_err)
}
