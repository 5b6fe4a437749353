//! Evaluation utilities

pub mod metrics;

pub use metrics::{validation_error, PredictionMetrics};
