//! Numeric kernels invoked from compute bodies.
//!
//! Everything here is a pure function: no retained state, no knowledge of the
//! graph. Compute bodies wrap these and the graph handles caching, staleness,
//! and error propagation.

pub mod chol;
pub mod cov;
pub mod linalg;

pub use chol::{cholesky, incomplete_cholesky, CholOptions, PivotedFactor};
pub use cov::{cov_matrix, cross_cov_matrix, CovKernel, CovParams};
pub use linalg::Matrix;
