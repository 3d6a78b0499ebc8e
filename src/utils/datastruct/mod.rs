pub mod csr;

pub use csr::{CsrMatrix, RowView, SparseRow};
