//! Cholesky factorization kernels.
//!
//! Two variants: the dense lower-triangular factorization, and a pivoted
//! incomplete factorization that stops at a rank/tolerance bound. Covariance
//! matrices built from clustered coordinates are numerically low-rank, and
//! the incomplete factor is what makes large GP-style models tractable.
//!
//! Both are pure functions of their inputs and fail with typed errors on
//! ill-conditioned matrices; the graph wraps those into `ComputeFailure` so
//! a sampler can treat them as rejected proposals.

use num_traits::Float;
use serde::{Deserialize, Serialize};

use crate::error::KernelError;
use crate::kernels::linalg::Matrix;

/// Bounds for the incomplete factorization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CholOptions {
    /// Maximum rank of the returned factor.
    pub max_rank: usize,
    /// Stop once the trace of the residual falls at or below this value.
    pub tolerance: f64,
}

impl Default for CholOptions {
    fn default() -> Self {
        Self {
            max_rank: usize::MAX,
            tolerance: 1e-10,
        }
    }
}

fn require_symmetric<T: Float>(a: &Matrix<T>) -> Result<(), KernelError> {
    let tol = T::from(1e-8).unwrap_or_else(T::zero);
    if !a.is_square() || !a.is_symmetric(tol) {
        return Err(KernelError::DimensionMismatch {
            expected: "square symmetric matrix".to_string(),
            got: format!("{}x{} matrix", a.rows(), a.cols()),
        });
    }
    Ok(())
}

/// Dense Cholesky factorization: lower-triangular `L` with `A = L L^T`.
///
/// Fails with `NotPositiveDefinite` on a non-positive pivot.
pub fn cholesky<T: Float>(a: &Matrix<T>) -> Result<Matrix<T>, KernelError> {
    require_symmetric(a)?;
    let n = a.rows();
    let mut lower = Matrix::zeros(n, n);

    for i in 0..n {
        for j in 0..=i {
            let mut sum = T::zero();
            if j == i {
                for k in 0..j {
                    let l_jk = lower.get(j, k);
                    sum = sum + l_jk * l_jk;
                }
                let diag = a.get(j, j) - sum;
                if diag <= T::zero() {
                    return Err(KernelError::NotPositiveDefinite { pivot: j });
                }
                lower.set(j, j, diag.sqrt());
            } else {
                for k in 0..j {
                    sum = sum + lower.get(i, k) * lower.get(j, k);
                }
                let l_jj = lower.get(j, j);
                if l_jj <= T::zero() {
                    return Err(KernelError::NotPositiveDefinite { pivot: j });
                }
                lower.set(i, j, (a.get(i, j) - sum) / l_jj);
            }
        }
    }

    Ok(lower)
}

/// Result of the pivoted incomplete factorization: an `n x rank` factor with
/// `L L^T ~ A` up to the requested tolerance.
#[derive(Debug, Clone)]
pub struct PivotedFactor<T: Float = f64> {
    /// The low-rank factor, rows in original order.
    pub factor: Matrix<T>,
    /// Pivot order: original indices of the chosen columns, best first.
    pub pivots: Vec<usize>,
    /// Number of columns actually used.
    pub rank: usize,
    /// Trace of the residual `A - L L^T` at termination.
    pub residual: f64,
}

impl<T: Float> PivotedFactor<T> {
    /// The `n x n` approximation `L L^T`, for diagnostics and tests.
    pub fn reconstruct(&self) -> Matrix<T> {
        let n = self.factor.rows();
        let k = self.factor.cols();
        let mut out = Matrix::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                let mut sum = T::zero();
                for m in 0..k {
                    sum = sum + self.factor.get(i, m) * self.factor.get(j, m);
                }
                out.set(i, j, sum);
            }
        }
        out
    }
}

/// Pivoted incomplete Cholesky factorization.
///
/// Greedily selects the largest remaining diagonal at each step and stops as
/// soon as the residual trace falls within `opts.tolerance`. Fails with
/// `FactorizationFailure` if `opts.max_rank` columns cannot get there, and
/// `NotPositiveDefinite` if a pivot goes non-positive while the residual is
/// still above tolerance.
pub fn incomplete_cholesky<T: Float>(
    a: &Matrix<T>,
    opts: &CholOptions,
) -> Result<PivotedFactor<T>, KernelError> {
    require_symmetric(a)?;
    let n = a.rows();
    let kmax = opts.max_rank.min(n);
    let tol = T::from(opts.tolerance).unwrap_or_else(T::zero);

    let mut diag = a.diagonal();
    let mut perm: Vec<usize> = (0..n).collect();
    let mut lower = Matrix::zeros(n, kmax);
    let mut rank = kmax;

    for m in 0..kmax {
        // Residual trace over the not-yet-factored block.
        let mut residual = T::zero();
        for &p in &perm[m..] {
            residual = residual + diag[p];
        }
        if residual <= tol {
            rank = m;
            break;
        }

        // Greedy pivot: largest remaining diagonal.
        let best = (m..n)
            .max_by(|&i, &j| {
                diag[perm[i]]
                    .partial_cmp(&diag[perm[j]])
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(m);
        perm.swap(m, best);

        let p_m = perm[m];
        let pivot = diag[p_m];
        if pivot <= T::zero() {
            return Err(KernelError::NotPositiveDefinite { pivot: m });
        }
        let l_mm = pivot.sqrt();
        lower.set(p_m, m, l_mm);

        for i in (m + 1)..n {
            let r = perm[i];
            let mut sum = T::zero();
            for j in 0..m {
                sum = sum + lower.get(r, j) * lower.get(p_m, j);
            }
            let l_rm = (a.get(r, p_m) - sum) / l_mm;
            lower.set(r, m, l_rm);
            diag[r] = diag[r] - l_rm * l_rm;
        }
    }

    let mut residual = T::zero();
    for &p in &perm[rank..] {
        residual = residual + diag[p];
    }
    let residual_f64 = residual.to_f64().unwrap_or(f64::NAN);
    if residual > tol {
        return Err(KernelError::FactorizationFailure {
            rank,
            residual: residual_f64,
            tolerance: opts.tolerance,
        });
    }

    // Truncate to the columns actually used.
    let mut factor = Matrix::zeros(n, rank);
    for i in 0..n {
        for j in 0..rank {
            factor.set(i, j, lower.get(i, j));
        }
    }

    Ok(PivotedFactor {
        factor,
        pivots: perm[..rank].to_vec(),
        rank,
        residual: residual_f64.max(0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::kernels::cov::{cov_matrix, CovKernel, CovParams};

    fn spd2() -> Matrix<f64> {
        Matrix::from_vec(vec![4.0, 2.0, 2.0, 3.0], 2, 2).unwrap()
    }

    #[test]
    fn dense_cholesky_of_known_matrix() {
        let l = cholesky(&spd2()).unwrap();
        assert_relative_eq!(l.get(0, 0), 2.0);
        assert_relative_eq!(l.get(1, 0), 1.0);
        assert_relative_eq!(l.get(1, 1), 2.0_f64.sqrt());
        assert_relative_eq!(l.get(0, 1), 0.0);
    }

    #[test]
    fn dense_cholesky_reconstructs_input() {
        let a = Matrix::from_vec(
            vec![6.0, 3.0, 1.0, 3.0, 5.0, 2.0, 1.0, 2.0, 4.0],
            3,
            3,
        )
        .unwrap();
        let l = cholesky(&a).unwrap();
        let back = l.mat_mul(&l.transpose()).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(back.get(i, j), a.get(i, j), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn dense_cholesky_rejects_indefinite_matrix() {
        let a = Matrix::from_vec(vec![1.0, 2.0, 2.0, 1.0], 2, 2).unwrap();
        assert!(matches!(
            cholesky(&a),
            Err(KernelError::NotPositiveDefinite { .. })
        ));
    }

    #[test]
    fn dense_cholesky_rejects_asymmetric_matrix() {
        let a = Matrix::from_vec(vec![1.0, 0.5, 0.1, 1.0], 2, 2).unwrap();
        assert!(matches!(
            cholesky(&a),
            Err(KernelError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn incomplete_recovers_rank_one_matrix_exactly() {
        // A = v v^T has rank one; a single pivot column suffices.
        let v = [1.0, 2.0, 3.0];
        let mut a = Matrix::zeros(3, 3);
        for i in 0..3 {
            for j in 0..3 {
                a.set(i, j, v[i] * v[j]);
            }
        }

        let f = incomplete_cholesky(&a, &CholOptions::default()).unwrap();
        assert_eq!(f.rank, 1);

        let back = f.reconstruct();
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(back.get(i, j), a.get(i, j), epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn incomplete_detects_duplicate_points() {
        // Two identical coordinates make the covariance matrix exactly
        // rank-deficient; the pivoted factorization should stop early.
        let x = Matrix::from_rows(vec![vec![0.0], vec![0.0], vec![1.0]]).unwrap();
        let a = cov_matrix(CovKernel::SquaredExponential, &x, &CovParams::default()).unwrap();

        let f = incomplete_cholesky(&a, &CholOptions::default()).unwrap();
        assert_eq!(f.rank, 2);

        let back = f.reconstruct();
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(back.get(i, j), a.get(i, j), epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn incomplete_fails_when_rank_bound_is_too_small() {
        let a: Matrix = Matrix::identity(3);
        let opts = CholOptions {
            max_rank: 1,
            tolerance: 1e-12,
        };
        match incomplete_cholesky(&a, &opts) {
            Err(KernelError::FactorizationFailure {
                rank, residual, ..
            }) => {
                assert_eq!(rank, 1);
                assert_relative_eq!(residual, 2.0, epsilon = 1e-12);
            }
            other => panic!("expected FactorizationFailure, got {other:?}"),
        }
    }

    #[test]
    fn incomplete_full_rank_matches_input() {
        let a = spd2();
        let f = incomplete_cholesky(&a, &CholOptions::default()).unwrap();
        assert_eq!(f.rank, 2);

        let back = f.reconstruct();
        for i in 0..2 {
            for j in 0..2 {
                assert_relative_eq!(back.get(i, j), a.get(i, j), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn pivots_are_distinct_original_indices() {
        let x = Matrix::from_rows(vec![vec![0.0], vec![2.0], vec![5.0]]).unwrap();
        let a = cov_matrix(CovKernel::Exponential, &x, &CovParams::default()).unwrap();
        let f = incomplete_cholesky(&a, &CholOptions::default()).unwrap();

        let mut seen = f.pivots.clone();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), f.pivots.len());
        assert!(f.pivots.iter().all(|&p| p < 3));
    }
}
