//! Dense row-major matrices and the small set of linear-algebra operations
//! the covariance and factorization kernels need.
//!
//! Deliberately minimal: the graph treats kernels as opaque pure functions,
//! and nothing here retains state between calls.

use num_traits::Float;

use crate::error::KernelError;

/// A dense matrix in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T: Float = f64> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T: Float> Matrix<T> {
    /// A `rows x cols` matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![T::zero(); rows * cols],
            rows,
            cols,
        }
    }

    /// The `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i * n + i] = T::one();
        }
        m
    }

    /// Build from a flat row-major buffer.
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self, KernelError> {
        if data.len() != rows * cols {
            return Err(KernelError::DimensionMismatch {
                expected: format!("{} elements ({rows}x{cols})", rows * cols),
                got: format!("{} elements", data.len()),
            });
        }
        Ok(Self { data, rows, cols })
    }

    /// Build from rows. All rows must have equal length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, KernelError> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(nrows * ncols);
        for row in &rows {
            if row.len() != ncols {
                return Err(KernelError::DimensionMismatch {
                    expected: format!("row of length {ncols}"),
                    got: format!("row of length {}", row.len()),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            rows: nrows,
            cols: ncols,
        })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Element at `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if out of bounds.
    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[i * self.cols + j]
    }

    /// Set element at `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if out of bounds.
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        self.data[i * self.cols + j] = value;
    }

    /// Row `i` as a slice.
    pub fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// The underlying row-major buffer.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// The main diagonal.
    pub fn diagonal(&self) -> Vec<T> {
        (0..self.rows.min(self.cols))
            .map(|i| self.get(i, i))
            .collect()
    }

    /// Whether the matrix is square.
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Whether the matrix is symmetric to within `tol`.
    pub fn is_symmetric(&self, tol: T) -> bool {
        if !self.is_square() {
            return false;
        }
        for i in 0..self.rows {
            for j in (i + 1)..self.cols {
                if (self.get(i, j) - self.get(j, i)).abs() > tol {
                    return false;
                }
            }
        }
        true
    }

    /// The transpose.
    pub fn transpose(&self) -> Self {
        let mut out = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.set(j, i, self.get(i, j));
            }
        }
        out
    }

    /// Matrix-vector product `A x`.
    pub fn mat_vec(&self, x: &[T]) -> Result<Vec<T>, KernelError> {
        if x.len() != self.cols {
            return Err(KernelError::DimensionMismatch {
                expected: format!("vector of length {}", self.cols),
                got: format!("vector of length {}", x.len()),
            });
        }
        let mut out = Vec::with_capacity(self.rows);
        for i in 0..self.rows {
            let mut sum = T::zero();
            for j in 0..self.cols {
                sum = sum + self.get(i, j) * x[j];
            }
            out.push(sum);
        }
        Ok(out)
    }

    /// Matrix product `A B`.
    pub fn mat_mul(&self, other: &Self) -> Result<Self, KernelError> {
        if self.cols != other.rows {
            return Err(KernelError::DimensionMismatch {
                expected: format!("{} rows", self.cols),
                got: format!("{} rows", other.rows),
            });
        }
        let mut out = Self::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a_ik = self.get(i, k);
                for j in 0..other.cols {
                    let v = out.get(i, j) + a_ik * other.get(k, j);
                    out.set(i, j, v);
                }
            }
        }
        Ok(out)
    }
}
