//! Covariance-function kernels.
//!
//! Each kernel maps a pair of coordinate points to a covariance through their
//! Euclidean distance. Coordinates are handed in as an `n x d` matrix, one
//! point per row; the output is the dense covariance matrix. These are pure
//! functions: same inputs, same matrix, no retained state.

use serde::{Deserialize, Serialize};

use crate::error::KernelError;
use crate::kernels::linalg::Matrix;

/// The stationary covariance families on offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CovKernel {
    /// `a^2 exp(-r^2 / (2 l^2))` — infinitely smooth.
    SquaredExponential,
    /// `a^2 exp(-r / l)` — rough, Ornstein-Uhlenbeck in 1D.
    Exponential,
    /// Matern with smoothness 3/2.
    Matern32,
    /// Matern with smoothness 5/2.
    Matern52,
}

/// Kernel hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CovParams {
    /// Marginal standard deviation `a`.
    pub amplitude: f64,
    /// Length scale `l`.
    pub length_scale: f64,
}

impl Default for CovParams {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            length_scale: 1.0,
        }
    }
}

impl CovParams {
    fn validate(&self) -> Result<(), KernelError> {
        if !(self.amplitude > 0.0) {
            return Err(KernelError::InvalidParameter {
                name: "amplitude",
                value: self.amplitude,
            });
        }
        if !(self.length_scale > 0.0) {
            return Err(KernelError::InvalidParameter {
                name: "length_scale",
                value: self.length_scale,
            });
        }
        Ok(())
    }
}

impl CovKernel {
    /// Covariance at distance `r`.
    pub fn apply(&self, r: f64, params: &CovParams) -> f64 {
        let a2 = params.amplitude * params.amplitude;
        let s = r / params.length_scale;
        match self {
            CovKernel::SquaredExponential => a2 * (-0.5 * s * s).exp(),
            CovKernel::Exponential => a2 * (-s).exp(),
            CovKernel::Matern32 => {
                let t = 3.0_f64.sqrt() * s;
                a2 * (1.0 + t) * (-t).exp()
            }
            CovKernel::Matern52 => {
                let t = 5.0_f64.sqrt() * s;
                a2 * (1.0 + t + t * t / 3.0) * (-t).exp()
            }
        }
    }
}

fn euclidean(p: &[f64], q: &[f64]) -> f64 {
    p.iter()
        .zip(q)
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>()
        .sqrt()
}

/// Dense covariance matrix of a point set against itself.
///
/// `x` is `n x d`, one coordinate point per row. The result is symmetric
/// `n x n` with `a^2` on the diagonal.
pub fn cov_matrix(
    kernel: CovKernel,
    x: &Matrix<f64>,
    params: &CovParams,
) -> Result<Matrix<f64>, KernelError> {
    params.validate()?;
    let n = x.rows();
    let mut out = Matrix::zeros(n, n);
    for i in 0..n {
        out.set(i, i, kernel.apply(0.0, params));
        for j in (i + 1)..n {
            let v = kernel.apply(euclidean(x.row(i), x.row(j)), params);
            out.set(i, j, v);
            out.set(j, i, v);
        }
    }
    Ok(out)
}

/// Cross-covariance of two point sets: `x` is `n x d`, `y` is `m x d`,
/// result is `n x m`.
pub fn cross_cov_matrix(
    kernel: CovKernel,
    x: &Matrix<f64>,
    y: &Matrix<f64>,
    params: &CovParams,
) -> Result<Matrix<f64>, KernelError> {
    params.validate()?;
    if x.cols() != y.cols() {
        return Err(KernelError::DimensionMismatch {
            expected: format!("points of dimension {}", x.cols()),
            got: format!("points of dimension {}", y.cols()),
        });
    }
    let mut out = Matrix::zeros(x.rows(), y.rows());
    for i in 0..x.rows() {
        for j in 0..y.rows() {
            out.set(i, j, kernel.apply(euclidean(x.row(i), y.row(j)), params));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line(points: &[f64]) -> Matrix<f64> {
        Matrix::from_rows(points.iter().map(|&p| vec![p]).collect()).unwrap()
    }

    #[test]
    fn diagonal_is_amplitude_squared() {
        let x = line(&[0.0, 1.0, 5.0]);
        let params = CovParams {
            amplitude: 2.0,
            length_scale: 1.0,
        };
        let c = cov_matrix(CovKernel::SquaredExponential, &x, &params).unwrap();
        for i in 0..3 {
            assert_relative_eq!(c.get(i, i), 4.0);
        }
    }

    #[test]
    fn covariance_is_symmetric_and_decaying() {
        let x = line(&[0.0, 0.5, 3.0]);
        let c = cov_matrix(CovKernel::Matern32, &x, &CovParams::default()).unwrap();

        assert!(c.is_symmetric(1e-15));
        // Nearer points correlate more strongly.
        assert!(c.get(0, 1) > c.get(0, 2));
        assert!(c.get(0, 2) > 0.0);
    }

    #[test]
    fn squared_exponential_matches_closed_form() {
        let x = line(&[0.0, 2.0]);
        let params = CovParams {
            amplitude: 1.0,
            length_scale: 2.0,
        };
        let c = cov_matrix(CovKernel::SquaredExponential, &x, &params).unwrap();
        // exp(-r^2 / (2 l^2)) with r = 2, l = 2.
        assert_relative_eq!(c.get(0, 1), (-0.5_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn exponential_matches_closed_form() {
        let x = line(&[1.0, 4.0]);
        let c = cov_matrix(CovKernel::Exponential, &x, &CovParams::default()).unwrap();
        assert_relative_eq!(c.get(0, 1), (-3.0_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn matern_kernels_are_one_at_zero_distance() {
        let p = CovParams::default();
        assert_relative_eq!(CovKernel::Matern32.apply(0.0, &p), 1.0);
        assert_relative_eq!(CovKernel::Matern52.apply(0.0, &p), 1.0);
    }

    #[test]
    fn invalid_params_are_rejected() {
        let x = line(&[0.0, 1.0]);
        let bad = CovParams {
            amplitude: 1.0,
            length_scale: 0.0,
        };
        let err = cov_matrix(CovKernel::Exponential, &x, &bad).unwrap_err();
        assert!(matches!(
            err,
            KernelError::InvalidParameter {
                name: "length_scale",
                ..
            }
        ));
    }

    #[test]
    fn cross_cov_checks_point_dimension() {
        let x = line(&[0.0, 1.0]);
        let y = Matrix::from_rows(vec![vec![0.0, 0.0]]).unwrap();
        assert!(
            cross_cov_matrix(CovKernel::Exponential, &x, &y, &CovParams::default()).is_err()
        );
    }

    #[test]
    fn cross_cov_shape() {
        let x = line(&[0.0, 1.0, 2.0]);
        let y = line(&[0.5]);
        let c =
            cross_cov_matrix(CovKernel::SquaredExponential, &x, &y, &CovParams::default())
                .unwrap();
        assert_eq!(c.rows(), 3);
        assert_eq!(c.cols(), 1);
    }
}
