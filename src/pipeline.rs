//! End-to-end training run: load series, search, write outputs

use std::fs;
use std::path::PathBuf;

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::EsnConfig;
use crate::data::{self, Series};
use crate::error::{EsnError, Result};
use crate::esn::{target_data, GridSearch, Hyperparameters, TrialLayout, WeightSet};
use crate::utils::PredictionMetrics;

/// Files and options of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOptions {
    pub train: PathBuf,
    pub validation: Option<PathBuf>,
    pub test: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub config: EsnConfig,
    /// Also write the best model with bincode
    pub save_model: bool,
}

impl RunOptions {
    pub fn new(train: impl Into<PathBuf>, output_dir: impl Into<PathBuf>, config: EsnConfig) -> Self {
        Self {
            train: train.into(),
            validation: None,
            test: None,
            output_dir: output_dir.into(),
            config,
            save_model: false,
        }
    }

    pub fn validation(mut self, path: impl Into<PathBuf>) -> Self {
        self.validation = Some(path.into());
        self
    }

    pub fn test(mut self, path: impl Into<PathBuf>) -> Self {
        self.test = Some(path.into());
        self
    }

    pub fn save_model(mut self, save: bool) -> Self {
        self.save_model = save;
        self
    }

    /// Checks that need no data: required files and grid/validation rules
    pub fn validate(&self) -> Result<()> {
        if self.train.as_os_str().is_empty() {
            return Err(EsnError::config("a training file is required"));
        }
        if self.validation.is_none() && self.test.is_none() {
            return Err(EsnError::config(
                "a validation file and/or a test file is required",
            ));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(EsnError::config("an output directory is required"));
        }
        self.config.validate(self.validation.is_some())
    }
}

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub best: Hyperparameters,
    pub validation_error: Option<f64>,
    /// Metrics of the best model on the segmented validation series
    pub validation_metrics: Option<PredictionMetrics>,
    pub candidates_scored: usize,
    pub parameters_path: PathBuf,
    pub predictions_path: Option<PathBuf>,
    pub model_path: Option<PathBuf>,
}

/// Run a complete training session
pub fn run(options: &RunOptions) -> Result<RunSummary> {
    options.validate()?;

    info!("Loading data...");
    let train = data::read_series(&options.train)?;
    let validation = options.validation.as_ref().map(data::read_series).transpose()?;
    let test = options.test.as_ref().map(data::read_series).transpose()?;

    let outcome = GridSearch::new(options.config.clone()).run(&train, validation.as_ref())?;
    let best = outcome.best;

    fs::create_dir_all(&options.output_dir)?;
    let parameters_path = data::write_parameters(&options.output_dir, &best.params())?;
    info!("Wrote {}", parameters_path.display());

    let validation_metrics = validation
        .as_ref()
        .map(|series| evaluate(&best, series, &options.config))
        .transpose()?;

    let predictions_path = match &test {
        Some(series) => {
            info!("Generating predictions...");
            let predictions = best.predict(&series.values)?;
            let path = data::write_predictions(
                &options.output_dir,
                series.trial_length,
                options.config.steps,
                &predictions.to_vec(),
            )?;
            info!("Wrote {}", path.display());
            Some(path)
        }
        None => None,
    };

    let model_path = if options.save_model {
        let path = options.output_dir.join(data::MODEL_FILE);
        best.save(&path)?;
        info!("Wrote {}", path.display());
        Some(path)
    } else {
        None
    };

    Ok(RunSummary {
        best: best.params(),
        validation_error: best.validation_error(),
        validation_metrics,
        candidates_scored: outcome.candidates.len(),
        parameters_path,
        predictions_path,
        model_path,
    })
}

fn evaluate(model: &WeightSet, series: &Series, config: &EsnConfig) -> Result<PredictionMetrics> {
    let layout = TrialLayout::new(series.trial_length, config.washout, config.steps)?;
    let targets = layout.segment(&target_data(&series.values, config.steps))?;
    let predictions = model.predict_segmented(&series.values, &layout)?;
    Ok(PredictionMetrics::calculate(
        &predictions.to_vec(),
        &targets.to_vec(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_validation_or_test() {
        let options = RunOptions::new("train.bin", "out", EsnConfig::default());
        assert!(matches!(options.validate(), Err(EsnError::Config(_))));
        assert!(options.clone().test("test.bin").validate().is_ok());
        assert!(options.validation("val.bin").validate().is_ok());
    }

    #[test]
    fn test_requires_output_dir() {
        let options = RunOptions::new("train.bin", "", EsnConfig::default()).test("test.bin");
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_sweep_requires_validation_file() {
        let config = EsnConfig::default().regularizations(vec![1e-6, 1e-4]);
        let options = RunOptions::new("train.bin", "out", config).test("test.bin");
        assert!(matches!(options.validate(), Err(EsnError::Config(_))));
    }

    #[test]
    fn test_missing_train_file_fails_before_training() {
        let dir = tempfile::tempdir().unwrap();
        let options = RunOptions::new(dir.path().join("missing.bin"), dir.path(), EsnConfig::default())
            .test(dir.path().join("missing_test.bin"));
        assert!(matches!(run(&options), Err(EsnError::Data(_))));
        assert!(!dir.path().join(data::PARAMETERS_FILE).exists());
    }
}
