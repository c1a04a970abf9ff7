//! Sparse matrix storage and Matrix Market I/O

pub mod coo;
pub mod generate;
pub mod market;

pub use coo::CooMatrix;
pub use market::{
    parse_matrix_market, read_header, read_matrix_market, write_matrix_market, Field, HeaderPolicy,
    MarketMatrix, MarketSymmetry, MatrixMarketHeader,
};
