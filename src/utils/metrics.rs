//! Prediction error metrics

use serde::{Deserialize, Serialize};

/// Normalized root-sum-squared error in percent:
/// `100 * sqrt(sum((y - p)^2) / sum((y - mean(y))^2))`.
///
/// Returns `None` when the error is undefined: no samples, mismatched
/// lengths, or a target without variance.
pub fn validation_error(targets: &[f64], predictions: &[f64]) -> Option<f64> {
    if targets.is_empty() || targets.len() != predictions.len() {
        return None;
    }

    let mean = targets.iter().sum::<f64>() / targets.len() as f64;
    let ss_res: f64 = targets
        .iter()
        .zip(predictions)
        .map(|(y, p)| (y - p).powi(2))
        .sum();
    let ss_tot: f64 = targets.iter().map(|y| (y - mean).powi(2)).sum();

    if ss_tot <= 0.0 || !ss_tot.is_finite() {
        return None;
    }

    let error = 100.0 * (ss_res / ss_tot).sqrt();
    error.is_finite().then_some(error)
}

/// Prediction quality metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionMetrics {
    /// Mean Squared Error
    pub mse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// R-squared (coefficient of determination)
    pub r_squared: f64,
    /// Normalized error in percent, see [`validation_error`]
    pub nrmse: Option<f64>,
}

impl PredictionMetrics {
    /// Calculate metrics from predictions and actuals
    pub fn calculate(predictions: &[f64], actuals: &[f64]) -> Self {
        let n = predictions.len().min(actuals.len());
        if n == 0 {
            return Self::default();
        }
        let predictions = &predictions[..n];
        let actuals = &actuals[..n];

        let mut se_sum = 0.0;
        let mut ae_sum = 0.0;
        for (p, a) in predictions.iter().zip(actuals) {
            let error = p - a;
            se_sum += error * error;
            ae_sum += error.abs();
        }

        let mse = se_sum / n as f64;
        let mae = ae_sum / n as f64;
        let rmse = mse.sqrt();

        let actual_mean: f64 = actuals.iter().sum::<f64>() / n as f64;
        let ss_tot: f64 = actuals.iter().map(|a| (a - actual_mean).powi(2)).sum();
        let r_squared = if ss_tot > 0.0 { 1.0 - se_sum / ss_tot } else { 0.0 };

        Self {
            mse,
            mae,
            rmse,
            r_squared,
            nrmse: validation_error(actuals, predictions),
        }
    }

    /// Print summary
    pub fn print_summary(&self) {
        println!("=== Prediction Metrics ===");
        println!("MSE:        {:.6}", self.mse);
        println!("MAE:        {:.6}", self.mae);
        println!("RMSE:       {:.6}", self.rmse);
        println!("R-squared:  {:.4}", self.r_squared);
        match self.nrmse {
            Some(nrmse) => println!("NRMSE:      {:.2}%", nrmse),
            None => println!("NRMSE:      undefined"),
        }
    }
}
