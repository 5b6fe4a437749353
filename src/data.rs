//! Series, parameters and predictions files
//!
//! Series and predictions are flat little-endian `f64` streams with a small
//! header. A series file is `[trial_length][num_trials][values...]`; a
//! predictions file is `[trial_length][num_trials][steps][predictions...]`.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use ndarray::Array1;

use crate::error::{EsnError, Result};
use crate::esn::Hyperparameters;

/// File name of the best hyperparameters inside the output directory
pub const PARAMETERS_FILE: &str = "esn_parameters.txt";
/// File name of the test predictions inside the output directory
pub const PREDICTIONS_FILE: &str = "esn_prediction.bin";
/// File name of the serialized best model inside the output directory
pub const MODEL_FILE: &str = "esn_model.bin";

const F64_BYTES: usize = std::mem::size_of::<f64>();

/// A scalar time series made of equal-length trials
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub trial_length: usize,
    pub values: Array1<f64>,
}

impl Series {
    /// Create a series; its length must be a whole number of trials.
    pub fn new(trial_length: usize, values: Array1<f64>) -> Result<Self> {
        if trial_length == 0 {
            return Err(EsnError::data("trial length must be positive"));
        }
        if values.len() % trial_length != 0 {
            return Err(EsnError::PartialTrial {
                len: values.len(),
                trial_length,
            });
        }
        Ok(Self {
            trial_length,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn num_trials(&self) -> usize {
        self.values.len() / self.trial_length
    }

    /// Decode `[trial_length][num_trials][values...]`
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let fields = decode_f64s(bytes)?;
        if fields.len() < 2 {
            return Err(EsnError::data("series header is truncated"));
        }

        let trial_length = header_count(fields[0], "trial length")?;
        let num_trials = header_count(fields[1], "number of trials")?;
        let payload = &fields[2..];
        let expected = trial_length
            .checked_mul(num_trials)
            .filter(|&count| count <= payload.len())
            .ok_or_else(|| {
                EsnError::data(format!(
                    "header claims {} trials of {} but only {} values follow",
                    num_trials,
                    trial_length,
                    payload.len()
                ))
            })?;
        if payload.len() != expected {
            return Err(EsnError::data(format!(
                "expected {} values ({} trials of {}), found {}",
                expected,
                num_trials,
                trial_length,
                payload.len()
            )));
        }

        Self::new(trial_length, Array1::from_vec(payload.to_vec()))
    }

    /// Encode as `[trial_length][num_trials][values...]`
    pub fn to_bytes(&self) -> Vec<u8> {
        let header = [self.trial_length as f64, self.num_trials() as f64];
        encode_f64s(header.iter().chain(self.values.iter()))
    }
}

/// Read a series file; an empty series is an error
pub fn read_series(path: impl AsRef<Path>) -> Result<Series> {
    let path = path.as_ref();
    let bytes = fs::read(path)
        .map_err(|e| EsnError::data(format!("cannot read {}: {}", path.display(), e)))?;
    let series = Series::from_bytes(&bytes)
        .map_err(|e| EsnError::data(format!("{}: {}", path.display(), e)))?;
    if series.is_empty() {
        return Err(EsnError::data(format!("{} holds no samples", path.display())));
    }

    info!(
        "Loaded {} ({} trials of {} samples)",
        path.display(),
        series.num_trials(),
        series.trial_length
    );
    Ok(series)
}

/// Write a series file
pub fn write_series(path: impl AsRef<Path>, series: &Series) -> Result<()> {
    fs::write(path, series.to_bytes())?;
    Ok(())
}

/// Write the best hyperparameters as
/// `leaking rate, spectral radius, input scaling, regularization`
pub fn write_parameters(dir: impl AsRef<Path>, params: &Hyperparameters) -> Result<PathBuf> {
    let path = dir.as_ref().join(PARAMETERS_FILE);
    fs::write(&path, format!("{}\n", params))?;
    Ok(path)
}

/// Read a parameters file written by [`write_parameters`]
pub fn read_parameters(path: impl AsRef<Path>) -> Result<Hyperparameters> {
    let text = fs::read_to_string(path)?;
    let values = text
        .split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(|field| {
            field
                .parse::<f64>()
                .map_err(|e| EsnError::data(format!("bad parameter '{}': {}", field, e)))
        })
        .collect::<Result<Vec<f64>>>()?;

    match values[..] {
        [leaking_rate, spectral_radius, input_scaling, regularization] => Ok(Hyperparameters {
            leaking_rate,
            spectral_radius,
            input_scaling,
            regularization,
        }),
        _ => Err(EsnError::data(format!(
            "expected 4 parameters, found {}",
            values.len()
        ))),
    }
}

/// Write test predictions with a `[trial_length][num_trials][steps]` header
pub fn write_predictions(
    dir: impl AsRef<Path>,
    trial_length: usize,
    steps: usize,
    predictions: &[f64],
) -> Result<PathBuf> {
    if trial_length == 0 {
        return Err(EsnError::data("trial length must be positive"));
    }
    let path = dir.as_ref().join(PREDICTIONS_FILE);
    let header = [
        trial_length as f64,
        (predictions.len() / trial_length) as f64,
        steps as f64,
    ];
    fs::write(&path, encode_f64s(header.iter().chain(predictions)))?;
    Ok(path)
}

fn decode_f64s(bytes: &[u8]) -> Result<Vec<f64>> {
    if bytes.len() % F64_BYTES != 0 {
        return Err(EsnError::data(format!(
            "{} bytes is not a whole number of doubles",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(F64_BYTES)
        .map(|chunk| {
            let mut raw = [0u8; F64_BYTES];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect())
}

fn encode_f64s<'a>(values: impl Iterator<Item = &'a f64>) -> Vec<u8> {
    values.flat_map(|v| v.to_le_bytes()).collect()
}

fn header_count(value: f64, name: &str) -> Result<usize> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(EsnError::data(format!("invalid {} in header: {}", name, value)));
    }
    Ok(value as usize)
}
