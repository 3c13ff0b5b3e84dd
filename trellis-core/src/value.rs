//! The value type flowing through the graph.
//!
//! A `Value` is opaque to the cache: staleness is decided by upstream
//! generation counters, never by comparing values. `PartialEq` exists for
//! tests and for callers that want it, but nothing on the evaluation path
//! relies on it — equality of large numeric results is not assumed cheap.
//!
//! Array payloads sit behind `Arc` so that handing a cached value to a
//! compute body is a pointer copy, not a matrix copy. Values are immutable
//! once produced; replacing a cached value swaps the whole `Value`.

use std::sync::Arc;

use crate::error::KernelError;
use crate::kernels::linalg::Matrix;

/// An opaque, immutable-once-produced result of a computation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A scalar quantity.
    Scalar(f64),
    /// A dense vector.
    Vector(Arc<Vec<f64>>),
    /// A dense row-major matrix.
    Matrix(Arc<Matrix<f64>>),
}

impl Value {
    /// Convenience constructor for vector values.
    pub fn vector(data: Vec<f64>) -> Self {
        Value::Vector(Arc::new(data))
    }

    /// Convenience constructor for matrix values.
    pub fn matrix(m: Matrix<f64>) -> Self {
        Value::Matrix(Arc::new(m))
    }

    /// Name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Vector(_) => "vector",
            Value::Matrix(_) => "matrix",
        }
    }

    /// Extract a scalar, or fail with a typed error.
    pub fn as_scalar(&self) -> Result<f64, KernelError> {
        match self {
            Value::Scalar(v) => Ok(*v),
            other => Err(KernelError::TypeMismatch {
                expected: "scalar",
                got: other.kind(),
            }),
        }
    }

    /// Extract a vector, or fail with a typed error.
    pub fn as_vector(&self) -> Result<&[f64], KernelError> {
        match self {
            Value::Vector(v) => Ok(v.as_slice()),
            other => Err(KernelError::TypeMismatch {
                expected: "vector",
                got: other.kind(),
            }),
        }
    }

    /// Extract a matrix, or fail with a typed error.
    pub fn as_matrix(&self) -> Result<&Matrix<f64>, KernelError> {
        match self {
            Value::Matrix(m) => Ok(m),
            other => Err(KernelError::TypeMismatch {
                expected: "matrix",
                got: other.kind(),
            }),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::vector(v)
    }
}

impl From<Matrix<f64>> for Value {
    fn from(m: Matrix<f64>) -> Self {
        Value::matrix(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_accessor() {
        let v = Value::Scalar(2.5);
        assert_eq!(v.as_scalar().unwrap(), 2.5);
        assert!(v.as_vector().is_err());
        assert!(v.as_matrix().is_err());
    }

    #[test]
    fn vector_accessor() {
        let v = Value::vector(vec![1.0, 2.0]);
        assert_eq!(v.as_vector().unwrap(), &[1.0, 2.0]);
        assert!(v.as_scalar().is_err());
    }

    #[test]
    fn type_mismatch_names_variants() {
        let err = Value::vector(vec![]).as_scalar().unwrap_err();
        match err {
            KernelError::TypeMismatch { expected, got } => {
                assert_eq!(expected, "scalar");
                assert_eq!(got, "vector");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn clone_shares_array_storage() {
        let v = Value::vector(vec![0.0; 1024]);
        let w = v.clone();
        match (&v, &w) {
            (Value::Vector(a), Value::Vector(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => unreachable!(),
        }
    }
}
