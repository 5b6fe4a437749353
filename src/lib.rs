//! # ESN Forecast Library
//!
//! Echo State Networks for multi-step forecasting of trial-structured series.
//!
//! This library trains a fixed random reservoir with a ridge-regression
//! readout and selects hyperparameters by grid search over several random
//! reservoir draws, scoring each candidate on validation data.
//!
//! ## Features
//!
//! - **ESN Core**: reservoir construction with exact sparsity and spectral
//!   normalization, leaky-integrator state driving, ridge readout
//! - **Model selection**: grid search over input scaling, spectral radius,
//!   leaking rate and regularization, repeated over random restarts
//! - **Data**: binary series/prediction files and the parameters file
//! - **Utils**: validation error and prediction metrics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use esn_forecast::{data, EsnConfig, GridSearch};
//!
//! fn main() -> anyhow::Result<()> {
//!     let train = data::read_series("train.bin")?;
//!     let validation = data::read_series("validation.bin")?;
//!
//!     let config = EsnConfig::default()
//!         .reservoir_size(200)
//!         .washout(50)
//!         .spectral_radii(vec![0.8, 0.9, 0.99])
//!         .regularizations(vec![1e-8, 1e-6, 1e-4]);
//!
//!     let outcome = GridSearch::new(config).run(&train, Some(&validation))?;
//!     println!("best: {}", outcome.best.params());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod esn;
pub mod pipeline;
pub mod utils;

// Re-export main types for convenience
pub use config::EsnConfig;
pub use data::Series;
pub use error::{EsnError, Result};
pub use esn::{GridSearch, Hyperparameters, SearchOutcome, TrialLayout, WeightSet};
pub use pipeline::{RunOptions, RunSummary};
pub use utils::{validation_error, PredictionMetrics};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration presets
pub mod presets {
    use crate::EsnConfig;

    /// Single small reservoir, fixed hyperparameters
    pub fn quick() -> EsnConfig {
        EsnConfig::default()
            .reservoir_size(50)
            .sparsity(0.8)
            .restarts(1)
    }

    /// Medium reservoir with a short regularization sweep
    pub fn standard() -> EsnConfig {
        EsnConfig::default()
            .reservoir_size(200)
            .sparsity(0.85)
            .restarts(3)
            .regularizations(vec![1e-8, 1e-6, 1e-4])
    }

    /// Full sweep over every hyperparameter
    pub fn wide_sweep() -> EsnConfig {
        EsnConfig::default()
            .reservoir_size(400)
            .sparsity(0.9)
            .restarts(5)
            .leaking_rates(vec![0.1, 0.3, 0.5, 0.7, 0.9])
            .spectral_radii(vec![0.6, 0.8, 0.9, 0.99])
            .input_scalings(vec![0.1, 0.5, 1.0])
            .regularizations(vec![1e-8, 1e-6, 1e-4, 1e-2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_presets() {
        let quick = presets::quick();
        assert_eq!(quick.reservoir_size, 50);
        assert!(quick.validate(false).is_ok());

        let standard = presets::standard();
        assert_eq!(standard.grid_size(), 3);
        assert!(standard.validate(false).is_err());
        assert!(standard.validate(true).is_ok());

        let wide = presets::wide_sweep();
        assert_eq!(wide.grid_size(), 5 * 4 * 3 * 4);
    }
}
