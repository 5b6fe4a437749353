//! Leaky-integrator state recurrence

use ndarray::{s, Array1, Array2};

use crate::error::{EsnError, Result};

/// Drives a scaled reservoir over a scalar input sequence.
///
/// The state starts at all ones and evolves as
/// `x(t+1) = (1 - a) x(t) + a tanh(W_in [1, u(t)] + W x(t))`.
/// The driver holds no randomness, so equal inputs give equal outputs.
#[derive(Debug, Clone, Copy)]
pub struct StateDriver<'a> {
    w_in: &'a Array2<f64>,
    w_res: &'a Array2<f64>,
    leaking_rate: f64,
}

impl<'a> StateDriver<'a> {
    pub fn new(w_in: &'a Array2<f64>, w_res: &'a Array2<f64>, leaking_rate: f64) -> Self {
        Self {
            w_in,
            w_res,
            leaking_rate,
        }
    }

    /// Reservoir size
    pub fn size(&self) -> usize {
        self.w_res.nrows()
    }

    /// Length of a feature vector `[1, u, x]`
    pub fn feature_dim(&self) -> usize {
        self.size() + 2
    }

    /// Collect the feature matrix for training.
    ///
    /// Column `t` holds `[1, u(t), x(t+1)]`, one column per input sample.
    pub fn collect_states(&self, input: &Array1<f64>) -> Array2<f64> {
        let mut features = Array2::zeros((self.feature_dim(), input.len()));
        let mut x = Array1::ones(self.size());

        for (t, &u) in input.iter().enumerate() {
            self.update(&mut x, u);
            let mut column = features.column_mut(t);
            column[0] = 1.0;
            column[1] = u;
            column.slice_mut(s![2..]).assign(&x);
        }

        features
    }

    /// Produce readout predictions for every input sample but the last.
    ///
    /// The final slot has no successor input and stays at zero.
    pub fn predict(&self, w_out: &Array1<f64>, input: &Array1<f64>) -> Result<Array1<f64>> {
        if w_out.len() != self.feature_dim() {
            return Err(EsnError::DimensionMismatch {
                expected: self.feature_dim(),
                got: w_out.len(),
            });
        }

        let mut predictions = Array1::zeros(input.len());
        let mut x = Array1::ones(self.size());
        let w_state = w_out.slice(s![2..]);

        for t in 0..input.len().saturating_sub(1) {
            let u = input[t];
            self.update(&mut x, u);
            predictions[t] = w_out[0] + w_out[1] * u + w_state.dot(&x);
        }

        Ok(predictions)
    }

    fn update(&self, x: &mut Array1<f64>, u: f64) {
        let a = self.leaking_rate;
        let mut pre = self.w_res.dot(&*x);
        pre.scaled_add(1.0, &self.w_in.column(0));
        pre.scaled_add(u, &self.w_in.column(1));
        x.zip_mut_with(&pre, |xi, &p| *xi = (1.0 - a) * *xi + a * p.tanh());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn tiny_reservoir() -> (Array2<f64>, Array2<f64>) {
        let w_in = array![[0.1, 0.5], [-0.2, 0.3]];
        let w_res = array![[0.0, 0.4], [-0.3, 0.0]];
        (w_in, w_res)
    }

    #[test]
    fn test_first_state_by_hand() {
        let (w_in, w_res) = tiny_reservoir();
        let driver = StateDriver::new(&w_in, &w_res, 0.5);
        let features = driver.collect_states(&array![2.0]);

        // x(0) = [1, 1]; pre = W_in [1, 2] + W x(0)
        let pre0: f64 = 0.1 + 0.5 * 2.0 + 0.4;
        let pre1: f64 = -0.2 + 0.3 * 2.0 - 0.3;
        assert_eq!(features.column(0)[0], 1.0);
        assert_eq!(features.column(0)[1], 2.0);
        assert_abs_diff_eq!(features[[2, 0]], 0.5 + 0.5 * pre0.tanh(), epsilon = 1e-12);
        assert_abs_diff_eq!(features[[3, 0]], 0.5 + 0.5 * pre1.tanh(), epsilon = 1e-12);
    }

    #[test]
    fn test_collect_states_shape() {
        let (w_in, w_res) = tiny_reservoir();
        let driver = StateDriver::new(&w_in, &w_res, 0.3);
        let input = Array1::linspace(-1.0, 1.0, 12);
        let features = driver.collect_states(&input);

        assert_eq!(features.dim(), (4, 12));
        assert!(features.row(0).iter().all(|&v| v == 1.0));
        assert_eq!(features.row(1).to_owned(), input);
    }

    #[test]
    fn test_predictions_match_readout_of_states() {
        let (w_in, w_res) = tiny_reservoir();
        let driver = StateDriver::new(&w_in, &w_res, 0.7);
        let input = array![0.3, -0.1, 0.8, 0.2, -0.5];
        let w_out = array![0.2, -1.0, 0.5, 0.25];

        let features = driver.collect_states(&input);
        let predictions = driver.predict(&w_out, &input).unwrap();

        assert_eq!(predictions.len(), input.len());
        for t in 0..input.len() - 1 {
            assert_abs_diff_eq!(predictions[t], w_out.dot(&features.column(t)), epsilon = 1e-12);
        }
        assert_eq!(predictions[input.len() - 1], 0.0);
    }

    #[test]
    fn test_deterministic() {
        let (w_in, w_res) = tiny_reservoir();
        let driver = StateDriver::new(&w_in, &w_res, 0.4);
        let input = Array1::linspace(0.0, 3.0, 20).mapv(f64::sin);
        assert_eq!(driver.collect_states(&input), driver.collect_states(&input));
    }

    #[test]
    fn test_readout_dimension_checked() {
        let (w_in, w_res) = tiny_reservoir();
        let driver = StateDriver::new(&w_in, &w_res, 0.4);
        let result = driver.predict(&array![1.0, 2.0], &array![0.0, 1.0]);
        assert!(matches!(
            result,
            Err(EsnError::DimensionMismatch { expected: 4, got: 2 })
        ));
    }
}
