//! Run configuration: hyperparameter grids and reservoir options

use serde::{Deserialize, Serialize};

use crate::error::{EsnError, Result};

/// Configuration for an ESN grid search
///
/// Each grid lists the candidate values tried for one hyperparameter. A grid
/// with a single value fixes that hyperparameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsnConfig {
    /// Candidate leaking rates (0 < a <= 1)
    pub leaking_rates: Vec<f64>,
    /// Candidate spectral radii of the scaled recurrent matrix
    pub spectral_radii: Vec<f64>,
    /// Candidate ridge regularization strengths
    pub regularizations: Vec<f64>,
    /// Candidate scalings of the input matrix
    pub input_scalings: Vec<f64>,
    /// Number of neurons in the reservoir
    pub reservoir_size: usize,
    /// Fraction of recurrent weights that are exactly zero
    pub sparsity: f64,
    /// Forecast horizon in samples
    pub steps: usize,
    /// Samples discarded at the start of every trial
    pub washout: usize,
    /// Number of independently drawn reservoirs
    pub restarts: usize,
    /// Base seed for reservoir generation
    pub seed: Option<u64>,
}

impl Default for EsnConfig {
    fn default() -> Self {
        Self {
            leaking_rates: vec![0.3],
            spectral_radii: vec![0.9],
            regularizations: vec![1e-6],
            input_scalings: vec![0.5],
            reservoir_size: 200,
            sparsity: 0.85,
            steps: 1,
            washout: 0,
            restarts: 3,
            seed: None,
        }
    }
}

impl EsnConfig {
    /// Set the reservoir size
    pub fn reservoir_size(mut self, size: usize) -> Self {
        self.reservoir_size = size;
        self
    }

    /// Set the sparsity
    pub fn sparsity(mut self, sparsity: f64) -> Self {
        self.sparsity = sparsity;
        self
    }

    /// Set the forecast horizon
    pub fn steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    /// Set the washout period
    pub fn washout(mut self, washout: usize) -> Self {
        self.washout = washout;
        self
    }

    /// Set the number of random restarts
    pub fn restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    /// Set the leaking rate grid
    pub fn leaking_rates(mut self, rates: Vec<f64>) -> Self {
        self.leaking_rates = rates;
        self
    }

    /// Set the spectral radius grid
    pub fn spectral_radii(mut self, radii: Vec<f64>) -> Self {
        self.spectral_radii = radii;
        self
    }

    /// Set the regularization grid
    pub fn regularizations(mut self, regs: Vec<f64>) -> Self {
        self.regularizations = regs;
        self
    }

    /// Set the input scaling grid
    pub fn input_scalings(mut self, scalings: Vec<f64>) -> Self {
        self.input_scalings = scalings;
        self
    }

    /// Set the random seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of scored combinations per restart
    pub fn grid_size(&self) -> usize {
        self.input_scalings.len()
            * self.spectral_radii.len()
            * self.leaking_rates.len()
            * self.regularizations.len()
    }

    /// True when any grid holds more than one candidate
    pub fn is_sweep(&self) -> bool {
        self.leaking_rates.len() > 1
            || self.spectral_radii.len() > 1
            || self.regularizations.len() > 1
            || self.input_scalings.len() > 1
    }

    /// Check the configuration before any computation runs.
    ///
    /// `has_validation` tells whether a validation series is available;
    /// model selection over more than one candidate needs one.
    pub fn validate(&self, has_validation: bool) -> Result<()> {
        check_grid(&self.input_scalings, "input scalings", |v| v > 0.0)?;
        check_grid(&self.spectral_radii, "spectral radii", |v| v > 0.0)?;
        check_grid(&self.leaking_rates, "leaking rates", |v| v > 0.0 && v <= 1.0)?;
        check_grid(&self.regularizations, "regularizations", |v| v >= 0.0)?;

        if self.reservoir_size == 0 {
            return Err(EsnError::config("reservoir size must be positive"));
        }
        if !(0.0..=1.0).contains(&self.sparsity) {
            return Err(EsnError::config(format!(
                "sparsity must lie in [0, 1], got {}",
                self.sparsity
            )));
        }
        if self.steps == 0 {
            return Err(EsnError::config("steps must be positive"));
        }
        if self.restarts == 0 {
            return Err(EsnError::config(
                "number of random initializations must be positive",
            ));
        }
        if self.is_sweep() && !has_validation {
            return Err(EsnError::config(
                "validation data is required if using multiple values for a given option",
            ));
        }

        Ok(())
    }
}

fn check_grid(values: &[f64], name: &str, accept: impl Fn(f64) -> bool) -> Result<()> {
    if values.is_empty() {
        return Err(EsnError::config(format!("no {} specified", name)));
    }
    if let Some(bad) = values.iter().find(|&&v| !v.is_finite() || !accept(v)) {
        return Err(EsnError::config(format!("invalid value {} in {}", bad, name)));
    }
    Ok(())
}
