//! Echo State Network Core Implementation
//!
//! This module provides the engine behind the grid search:
//! - Reservoir construction and spectral scaling
//! - State driving and readout prediction
//! - Trial segmentation of series, states and predictions
//! - Ridge-regression readout training
//! - Grid search with best-model tracking across restarts

mod driver;
mod reservoir;
mod search;
mod segment;
mod training;

pub use driver::StateDriver;
pub use reservoir::{
    scale_input, scale_recurrent, sparse_recurrent, spectral_radius, ReservoirWeights, WEIGHT_RANGE,
};
pub use search::{rng_for_restart, CandidateScore, GridSearch, SearchOutcome};
pub use segment::{target_data, TrialLayout};
pub use training::{ridge_regression, NormalEquations};

use std::fmt;
use std::path::Path;

use nalgebra::DMatrix;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{EsnError, Result};

/// The four tuned hyperparameters of one candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub leaking_rate: f64,
    pub spectral_radius: f64,
    pub input_scaling: f64,
    pub regularization: f64,
}

impl fmt::Display for Hyperparameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}",
            self.leaking_rate, self.spectral_radius, self.input_scaling, self.regularization
        )
    }
}

/// A candidate model: one reservoir draw at one point of the grid.
///
/// The unscaled reservoir is kept next to the scaled matrices so a new
/// scaling or radius is a single multiplication away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSet {
    reservoir: ReservoirWeights,
    w_in_scaled: Array2<f64>,
    w_res_scaled: Array2<f64>,
    /// Segmented training features (features x timepoints)
    #[serde(skip)]
    states: Array2<f64>,
    w_out: Option<Array1<f64>>,
    params: Hyperparameters,
    validation_error: Option<f64>,
}

impl WeightSet {
    /// Wrap a fresh reservoir; scaled matrices start equal to the unscaled ones.
    pub fn new(reservoir: ReservoirWeights) -> Self {
        let params = Hyperparameters {
            leaking_rate: 1.0,
            spectral_radius: reservoir.max_eigenvalue(),
            input_scaling: 1.0,
            regularization: 0.0,
        };
        Self {
            w_in_scaled: reservoir.input_weights().clone(),
            w_res_scaled: reservoir.recurrent_weights().clone(),
            states: Array2::zeros((0, 0)),
            w_out: None,
            params,
            validation_error: None,
            reservoir,
        }
    }

    pub fn set_input_scaling(&mut self, scaling: f64) {
        self.w_in_scaled = scale_input(self.reservoir.input_weights(), scaling);
        self.params.input_scaling = scaling;
    }

    pub fn set_spectral_radius(&mut self, radius: f64) {
        self.w_res_scaled = scale_recurrent(
            self.reservoir.recurrent_weights(),
            radius,
            self.reservoir.max_eigenvalue(),
        );
        self.params.spectral_radius = radius;
    }

    pub fn set_leaking_rate(&mut self, rate: f64) {
        self.params.leaking_rate = rate;
    }

    /// Driver over the current scaled matrices and leaking rate
    pub fn driver(&self) -> StateDriver<'_> {
        StateDriver::new(&self.w_in_scaled, &self.w_res_scaled, self.params.leaking_rate)
    }

    /// Drive the training series and keep its segmented feature matrix
    pub fn collect_training_states(
        &mut self,
        input: &Array1<f64>,
        layout: &TrialLayout,
    ) -> Result<&Array2<f64>> {
        let features = self.driver().collect_states(input);
        self.states = layout.segment_columns(&features)?;
        self.w_out = None;
        Ok(&self.states)
    }

    /// Solve the readout for one regularization value
    pub fn train_readout(&mut self, equations: &NormalEquations, regularization: f64) -> Result<()> {
        self.params.regularization = regularization;
        self.w_out = None;
        self.w_out = Some(equations.solve(regularization)?);
        Ok(())
    }

    /// Readout predictions over a whole series
    pub fn predict(&self, input: &Array1<f64>) -> Result<Array1<f64>> {
        let w_out = self.w_out.as_ref().ok_or(EsnError::NotTrained)?;
        self.driver().predict(w_out, input)
    }

    /// Readout predictions with washout and horizon removed per trial
    pub fn predict_segmented(
        &self,
        input: &Array1<f64>,
        layout: &TrialLayout,
    ) -> Result<Array1<f64>> {
        layout.segment(&self.predict(input)?)
    }

    pub fn set_validation_error(&mut self, error: Option<f64>) {
        self.validation_error = error;
    }

    pub fn params(&self) -> Hyperparameters {
        self.params
    }

    pub fn validation_error(&self) -> Option<f64> {
        self.validation_error
    }

    pub fn reservoir(&self) -> &ReservoirWeights {
        &self.reservoir
    }

    pub fn scaled_input_weights(&self) -> &Array2<f64> {
        &self.w_in_scaled
    }

    pub fn scaled_recurrent_weights(&self) -> &Array2<f64> {
        &self.w_res_scaled
    }

    /// Segmented training features of the last collection
    pub fn states(&self) -> &Array2<f64> {
        &self.states
    }

    pub fn readout(&self) -> Option<&Array1<f64>> {
        self.w_out.as_ref()
    }

    pub fn is_trained(&self) -> bool {
        self.w_out.is_some()
    }

    /// Save the model to a file (training states are not stored)
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let encoded = bincode::serialize(self)?;
        std::fs::write(path, encoded)?;
        Ok(())
    }

    /// Load a model from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path)?;
        let model = bincode::deserialize(&data)?;
        Ok(model)
    }
}

/// Copy an ndarray matrix into nalgebra for decompositions
pub(crate) fn to_dmatrix(matrix: &Array2<f64>) -> DMatrix<f64> {
    let (rows, cols) = matrix.dim();
    DMatrix::from_fn(rows, cols, |i, j| matrix[[i, j]])
}
