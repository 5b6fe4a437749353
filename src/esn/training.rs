//! Ridge-regression readout training

use nalgebra::DVector;
use ndarray::{Array1, Array2};

use super::to_dmatrix;
use crate::error::{EsnError, Result};

/// Normal equations of the readout problem for one set of collected states.
///
/// `X X^T` and `X Y` depend only on the states and targets, so they are
/// formed once and reused for every regularization value.
#[derive(Debug, Clone)]
pub struct NormalEquations {
    /// X X^T, (feature_dim x feature_dim)
    gram: Array2<f64>,
    /// X Y, (feature_dim)
    cross: Array1<f64>,
}

impl NormalEquations {
    /// Build from a feature matrix (features x timepoints) and its targets
    pub fn new(features: &Array2<f64>, targets: &Array1<f64>) -> Result<Self> {
        if features.ncols() != targets.len() {
            return Err(EsnError::DimensionMismatch {
                expected: features.ncols(),
                got: targets.len(),
            });
        }
        if targets.is_empty() {
            return Err(EsnError::data("no training samples left after segmentation"));
        }

        Ok(Self {
            gram: features.dot(&features.t()),
            cross: features.dot(targets),
        })
    }

    /// Number of readout weights
    pub fn feature_dim(&self) -> usize {
        self.cross.len()
    }

    /// Solve `(X X^T + lambda I) w = X Y` with an LU factorization
    pub fn solve(&self, regularization: f64) -> Result<Array1<f64>> {
        let mut a = self.gram.clone();
        a.diag_mut().mapv_inplace(|d| d + regularization);

        let b = DVector::from_iterator(self.cross.len(), self.cross.iter().copied());
        let w = to_dmatrix(&a)
            .lu()
            .solve(&b)
            .ok_or(EsnError::SingularSystem { regularization })?;

        if w.iter().any(|v| !v.is_finite()) {
            return Err(EsnError::SingularSystem { regularization });
        }

        Ok(Array1::from_iter(w.iter().copied()))
    }
}

/// Fit a readout in one call
pub fn ridge_regression(
    features: &Array2<f64>,
    targets: &Array1<f64>,
    regularization: f64,
) -> Result<Array1<f64>> {
    NormalEquations::new(features, targets)?.solve(regularization)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Features [1, x] for x in [0, 1), targets y = 1 + 2x
    fn linear_problem(n: usize) -> (Array2<f64>, Array1<f64>) {
        let mut features = Array2::ones((2, n));
        for i in 0..n {
            features[[1, i]] = i as f64 / n as f64;
        }
        let targets = features.row(1).mapv(|x| 1.0 + 2.0 * x);
        (features, targets)
    }

    #[test]
    fn test_ridge_recovers_linear_map() {
        let (features, targets) = linear_problem(100);
        let w = ridge_regression(&features, &targets, 1e-9).unwrap();

        assert_abs_diff_eq!(w[0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(w[1], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_regularization_shrinks_weights() {
        let (features, targets) = linear_problem(50);
        let equations = NormalEquations::new(&features, &targets).unwrap();

        let loose = equations.solve(1e-6).unwrap();
        let tight = equations.solve(100.0).unwrap();
        assert!(tight.dot(&tight) < loose.dot(&loose));
    }

    #[test]
    fn test_singular_system_is_an_error() {
        let (mut features, targets) = linear_problem(20);
        features.row_mut(1).fill(0.0);

        let result = ridge_regression(&features, &targets, 0.0);
        assert!(matches!(result, Err(EsnError::SingularSystem { .. })));

        // Any positive regularization makes the system solvable again
        assert!(ridge_regression(&features, &targets, 1e-3).is_ok());
    }

    #[test]
    fn test_dimension_mismatch() {
        let (features, _) = linear_problem(10);
        let targets = Array1::zeros(9);
        assert!(matches!(
            NormalEquations::new(&features, &targets),
            Err(EsnError::DimensionMismatch { expected: 10, got: 9 })
        ));
    }
}
