//! Reservoir construction and spectral scaling

use nalgebra::Schur;
use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::to_dmatrix;
use crate::error::{EsnError, Result};

/// Half-width of the interval all reservoir weights are drawn from
pub const WEIGHT_RANGE: f64 = 0.5;

/// Iteration cap for the Schur decomposition behind the spectral radius
const EIGEN_MAX_ITERATIONS: usize = 10_000;

/// Unscaled random weights of one reservoir draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservoirWeights {
    /// Input matrix (size x 2), columns are [bias, input]
    w_in: Array2<f64>,
    /// Recurrent matrix (size x size)
    w_res: Array2<f64>,
    /// Largest eigenvalue modulus of `w_res`
    max_eigenvalue: f64,
}

impl ReservoirWeights {
    /// Draw a new reservoir.
    ///
    /// Exactly `round(sparsity * size^2)` recurrent weights are zero; the
    /// positions of the zeros are random.
    pub fn build<R: Rng>(size: usize, sparsity: f64, rng: &mut R) -> Result<Self> {
        if size == 0 {
            return Err(EsnError::Eigen("reservoir size must be positive".into()));
        }

        let w_res = sparse_recurrent(size, sparsity, rng)?;
        let max_eigenvalue = spectral_radius(&w_res)?;
        if max_eigenvalue <= f64::EPSILON {
            return Err(EsnError::Eigen(
                "recurrent matrix has zero spectral radius".into(),
            ));
        }

        let dist = Uniform::new(-WEIGHT_RANGE, WEIGHT_RANGE);
        let w_in = Array2::random_using((size, 2), dist, rng);

        Ok(Self {
            w_in,
            w_res,
            max_eigenvalue,
        })
    }

    /// Number of neurons
    pub fn size(&self) -> usize {
        self.w_res.nrows()
    }

    pub fn input_weights(&self) -> &Array2<f64> {
        &self.w_in
    }

    pub fn recurrent_weights(&self) -> &Array2<f64> {
        &self.w_res
    }

    /// Cached spectral radius of the unscaled recurrent matrix
    pub fn max_eigenvalue(&self) -> f64 {
        self.max_eigenvalue
    }

    /// Count of exact-zero recurrent weights
    pub fn zero_count(&self) -> usize {
        self.w_res.iter().filter(|&&w| w == 0.0).count()
    }
}

/// Draw an unscaled `size x size` recurrent matrix with exactly
/// `round(sparsity * size^2)` zero entries at shuffled positions.
pub fn sparse_recurrent<R: Rng>(size: usize, sparsity: f64, rng: &mut R) -> Result<Array2<f64>> {
    let dist = Uniform::new(-WEIGHT_RANGE, WEIGHT_RANGE);
    let total = size * size;
    let num_zero = ((sparsity * total as f64).round() as usize).min(total);

    let mut values: Vec<f64> = (0..total).map(|_| rng.sample(dist)).collect();
    values[..num_zero].fill(0.0);
    values.shuffle(rng);

    Array2::from_shape_vec((size, size), values).map_err(|e| EsnError::data(e.to_string()))
}

/// Scale the input matrix by `scaling`
pub fn scale_input(w_in: &Array2<f64>, scaling: f64) -> Array2<f64> {
    w_in * scaling
}

/// Rescale the recurrent matrix so its spectral radius becomes `radius`
pub fn scale_recurrent(w_res: &Array2<f64>, radius: f64, max_eigenvalue: f64) -> Array2<f64> {
    w_res * (radius / max_eigenvalue)
}

/// Largest eigenvalue modulus of a square matrix (general eigensolver)
pub fn spectral_radius(matrix: &Array2<f64>) -> Result<f64> {
    if matrix.nrows() != matrix.ncols() {
        return Err(EsnError::DimensionMismatch {
            expected: matrix.nrows(),
            got: matrix.ncols(),
        });
    }
    if matrix.is_empty() {
        return Err(EsnError::Eigen("empty matrix".into()));
    }

    let schur = Schur::try_new(to_dmatrix(matrix), f64::EPSILON, EIGEN_MAX_ITERATIONS)
        .ok_or_else(|| EsnError::Eigen("Schur decomposition did not converge".into()))?;

    Ok(schur
        .complex_eigenvalues()
        .iter()
        .map(|lambda| lambda.re.hypot(lambda.im))
        .fold(0.0, f64::max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_reservoir_shapes() {
        let mut rng = StdRng::seed_from_u64(42);
        let reservoir = ReservoirWeights::build(30, 0.8, &mut rng).unwrap();

        assert_eq!(reservoir.size(), 30);
        assert_eq!(reservoir.recurrent_weights().dim(), (30, 30));
        assert_eq!(reservoir.input_weights().dim(), (30, 2));
        assert!(reservoir
            .input_weights()
            .iter()
            .chain(reservoir.recurrent_weights().iter())
            .all(|w| w.abs() <= WEIGHT_RANGE));
    }

    #[test]
    fn test_exact_zero_count() {
        let cases = [(10, 0.0), (10, 0.5), (17, 0.85), (25, 0.333), (8, 0.99), (6, 1.0), (1, 1.0)];
        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            for &(size, sparsity) in &cases {
                let w_res = sparse_recurrent(size, sparsity, &mut rng).unwrap();
                let expected = (sparsity * (size * size) as f64).round() as usize;
                let zeros = w_res.iter().filter(|&&w| w == 0.0).count();
                assert_eq!(w_res.dim(), (size, size));
                assert_eq!(zeros, expected, "seed {seed} size {size} sparsity {sparsity}");
            }
        }
    }

    #[test]
    fn test_built_reservoir_keeps_zero_count() {
        let mut rng = StdRng::seed_from_u64(1);
        let reservoir = ReservoirWeights::build(17, 0.85, &mut rng).unwrap();
        assert_eq!(reservoir.zero_count(), (0.85f64 * 289.0).round() as usize);
    }

    #[test]
    fn test_zero_positions_are_shuffled() {
        let mut rng = StdRng::seed_from_u64(3);
        let w_res = sparse_recurrent(10, 0.5, &mut rng).unwrap();
        let leading_zeros = w_res.iter().take(50).filter(|&&w| w == 0.0).count();
        assert!(leading_zeros < 50);
    }

    #[test]
    fn test_scaled_spectral_radius_is_exact() {
        let mut rng = StdRng::seed_from_u64(7);
        let reservoir = ReservoirWeights::build(40, 0.8, &mut rng).unwrap();

        for &radius in &[0.5, 0.9, 1.25] {
            let scaled = scale_recurrent(
                reservoir.recurrent_weights(),
                radius,
                reservoir.max_eigenvalue(),
            );
            assert_abs_diff_eq!(spectral_radius(&scaled).unwrap(), radius, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_scale_input() {
        let w_in = array![[1.0, -2.0], [0.5, 0.25]];
        assert_eq!(scale_input(&w_in, 2.0), array![[2.0, -4.0], [1.0, 0.5]]);
    }

    #[test]
    fn test_spectral_radius_complex_pair() {
        // Rotation by 90 degrees scaled by 2: eigenvalues are +-2i
        let m = array![[0.0, -2.0], [2.0, 0.0]];
        assert_abs_diff_eq!(spectral_radius(&m).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_reservoir_fails() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            ReservoirWeights::build(0, 0.5, &mut rng),
            Err(EsnError::Eigen(_))
        ));
    }

    #[test]
    fn test_fully_sparse_reservoir_fails() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(ReservoirWeights::build(5, 1.0, &mut rng).is_err());
    }
}
