//! Matrix Market reading and writing against real files

use std::io::Write;

use mumps_bench::matrix::{
    generate, read_header, read_matrix_market, write_matrix_market, Field, HeaderPolicy,
    MarketSymmetry, MatrixMarketHeader,
};
use mumps_bench::BenchError;
use tempfile::NamedTempFile;

fn mtx_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_read_general_real() {
    let file = mtx_file(
        "%%MatrixMarket matrix coordinate real general\n\
         % a comment\n\
         3 3 4\n\
         1 1 4.0\n\
         2 2 5.0\n\
         3 3 6.0\n\
         3 1 -1.5\n",
    );

    let m = read_matrix_market(file.path(), HeaderPolicy::Strict).unwrap();
    assert_eq!(m.header.field, Field::Real);
    assert!(!m.header.is_symmetric());
    assert_eq!(m.matrix.n_rows, 3);
    assert_eq!(m.matrix.nnz(), 4);
    assert_eq!(m.matrix.rows, vec![1, 2, 3, 3]);
    assert_eq!(m.matrix.cols, vec![1, 2, 3, 1]);
    assert_eq!(m.matrix.values[3], -1.5);
}

#[test]
fn test_missing_file() {
    let err = read_matrix_market("/nonexistent/dir/a.mtx", HeaderPolicy::Strict).unwrap_err();
    match err {
        BenchError::Io { path, .. } => assert!(path.ends_with("a.mtx")),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_malformed_headers_rejected() {
    for banner in [
        "%%MatrixMarket matrix array real general",
        "%%MatrixMarket matrix coordinate complex general",
        "%%MatrixMarket matrix coordinate real hermitian",
        "%%MatrixMarket vector coordinate real general",
        "not a banner at all",
    ] {
        let file = mtx_file(&format!("{}\n1 1 1\n1 1 1.0\n", banner));
        assert!(
            read_matrix_market(file.path(), HeaderPolicy::Strict).is_err(),
            "accepted '{}'",
            banner
        );
    }
}

#[test]
fn test_lenient_policy_ignores_banner() {
    let file = mtx_file("whatever the first line says\n2 2 2\n1 1 1.0\n2 2 2.0\n");
    let m = read_matrix_market(file.path(), HeaderPolicy::Lenient).unwrap();
    assert_eq!(m.header, MatrixMarketHeader::default());
    assert_eq!(m.matrix.nnz(), 2);
}

#[test]
fn test_errors_carry_line_numbers() {
    let file = mtx_file("%%MatrixMarket matrix coordinate real general\n2 2 2\n1 1 1.0\n2 x 2.0\n");
    match read_matrix_market(file.path(), HeaderPolicy::Strict).unwrap_err() {
        BenchError::Parse { line, .. } => assert_eq!(line, 4),
        other => panic!("unexpected error {:?}", other),
    }

    let file = mtx_file("%%MatrixMarket matrix coordinate real general\n2 2 1\n3 1 1.0\n");
    match read_matrix_market(file.path(), HeaderPolicy::Strict).unwrap_err() {
        BenchError::IndexOutOfRange { line, row, .. } => {
            assert_eq!(line, 3);
            assert_eq!(row, 3);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_entry_count_mismatch() {
    let file = mtx_file("%%MatrixMarket matrix coordinate real general\n2 2 3\n1 1 1.0\n2 2 2.0\n");
    assert!(matches!(
        read_matrix_market(file.path(), HeaderPolicy::Strict),
        Err(BenchError::EntryCount {
            expected: 3,
            found: 2
        })
    ));
}

#[test]
fn test_written_file_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lap.mtx");
    let header = MatrixMarketHeader {
        field: Field::Real,
        symmetry: MarketSymmetry::Symmetric,
    };
    let original = generate::laplacian_2d(4, true);
    write_matrix_market(&path, &original, &header).unwrap();

    let m = read_matrix_market(&path, HeaderPolicy::Strict).unwrap();
    assert_eq!(m.header, header);
    assert_eq!(m.matrix, original);
    assert_eq!(read_header(&path, HeaderPolicy::Strict).unwrap(), header);
}
