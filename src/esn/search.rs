//! Hyperparameter grid search and model selection
//!
//! For every restart a new reservoir is drawn. The grid is walked with input
//! scaling outermost, then spectral radius, then leaking rate; the training
//! series is driven once per such triple. Regularization is innermost since
//! varying it only needs another linear solve.

use log::{debug, info, warn};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{
    target_data, Hyperparameters, NormalEquations, ReservoirWeights, TrialLayout, WeightSet,
};
use crate::config::EsnConfig;
use crate::data::Series;
use crate::error::{EsnError, Result};
use crate::utils::validation_error;

/// Score of one evaluated grid point
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    /// Zero-based restart index
    pub restart: usize,
    pub params: Hyperparameters,
    /// `None` without validation data or when the error is undefined
    pub validation_error: Option<f64>,
    /// Whether this candidate became the best so far
    pub promoted: bool,
}

/// Result of a finished search
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// The selected model
    pub best: WeightSet,
    /// Every candidate scored, in iteration order
    pub candidates: Vec<CandidateScore>,
}

/// Validation series prepared once for every candidate
struct ValidationSet<'a> {
    input: &'a Array1<f64>,
    layout: TrialLayout,
    targets: Vec<f64>,
}

/// Grid search over input scaling, spectral radius, leaking rate and
/// regularization, repeated over independent reservoir draws.
#[derive(Debug, Clone)]
pub struct GridSearch {
    config: EsnConfig,
}

impl GridSearch {
    pub fn new(config: EsnConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EsnConfig {
        &self.config
    }

    /// Run the full search.
    ///
    /// Without validation data every candidate is accepted in turn, so the
    /// last one iterated is returned.
    pub fn run(&self, train: &Series, validation: Option<&Series>) -> Result<SearchOutcome> {
        let config = &self.config;
        config.validate(validation.is_some())?;

        if train.is_empty() {
            return Err(EsnError::data("training data is empty"));
        }
        let train_layout = TrialLayout::new(train.trial_length, config.washout, config.steps)?;
        let train_targets = train_layout.segment(&target_data(&train.values, config.steps))?;

        let validation = validation.map(|v| self.prepare_validation(v)).transpose()?;

        let total = config.restarts * config.grid_size();
        let mut best: Option<WeightSet> = None;
        let mut candidates = Vec::with_capacity(total);

        for restart in 0..config.restarts {
            info!("Training network {}/{}", restart + 1, config.restarts);

            let mut rng = rng_for_restart(config.seed, restart);
            let reservoir =
                match ReservoirWeights::build(config.reservoir_size, config.sparsity, &mut rng) {
                    Ok(reservoir) => reservoir,
                    Err(e) if e.is_numerical() => {
                        warn!("Skipping restart {}: {}", restart + 1, e);
                        continue;
                    }
                    Err(e) => return Err(e),
                };
            let mut weights = WeightSet::new(reservoir);

            for &scaling in &config.input_scalings {
                weights.set_input_scaling(scaling);
                for &radius in &config.spectral_radii {
                    weights.set_spectral_radius(radius);
                    for &rate in &config.leaking_rates {
                        weights.set_leaking_rate(rate);
                        weights.collect_training_states(&train.values, &train_layout)?;
                        let equations = NormalEquations::new(weights.states(), &train_targets)?;

                        for &regularization in &config.regularizations {
                            if let Err(e) = weights.train_readout(&equations, regularization) {
                                if e.is_numerical() {
                                    warn!("Skipping {}: {}", weights.params(), e);
                                    continue;
                                }
                                return Err(e);
                            }

                            let score = match &validation {
                                Some(set) => score(&weights, set)?,
                                None => None,
                            };
                            weights.set_validation_error(score);

                            let promoted =
                                improves(score, best.as_ref(), validation.is_some());
                            if promoted {
                                best = Some(weights.clone());
                            }

                            match score {
                                Some(error) => debug!("  {:.4} : {}", error, weights.params()),
                                None => debug!("  unscored : {}", weights.params()),
                            }
                            if promoted && validation.is_some() {
                                info!(
                                    "[{}/{}] New best {:?} : {}",
                                    candidates.len() + 1,
                                    total,
                                    score,
                                    weights.params()
                                );
                            }

                            candidates.push(CandidateScore {
                                restart,
                                params: weights.params(),
                                validation_error: score,
                                promoted,
                            });
                        }
                    }
                }
            }
        }

        let best = best.ok_or(EsnError::NoCandidate)?;
        info!(
            "Best model: {} (validation error {:?})",
            best.params(),
            best.validation_error()
        );

        Ok(SearchOutcome { best, candidates })
    }

    fn prepare_validation<'a>(&self, series: &'a Series) -> Result<ValidationSet<'a>> {
        if series.is_empty() {
            return Err(EsnError::data("validation data is empty"));
        }
        let layout = TrialLayout::new(series.trial_length, self.config.washout, self.config.steps)?;
        let targets = layout.segment(&target_data(&series.values, self.config.steps))?;
        Ok(ValidationSet {
            input: &series.values,
            layout,
            targets: targets.to_vec(),
        })
    }
}

fn score(weights: &WeightSet, set: &ValidationSet<'_>) -> Result<Option<f64>> {
    let predictions = weights.predict_segmented(set.input, &set.layout)?;
    Ok(validation_error(&set.targets, &predictions.to_vec()))
}

/// Promotion rule: strictly lower error wins, a scored candidate beats an
/// unscored best, and without validation data every candidate wins.
fn improves(candidate: Option<f64>, best: Option<&WeightSet>, has_validation: bool) -> bool {
    let Some(best) = best else {
        return true;
    };
    if !has_validation {
        return true;
    }
    match (candidate, best.validation_error()) {
        (Some(error), Some(best_error)) => error < best_error,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Odd 64-bit constant spreading restart indices across the seed space
const RESTART_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Independent generator for one restart.
///
/// With a base seed the stream is reproducible; otherwise it is seeded from
/// the operating system. The restart index is mixed into the seed so nearby
/// base seeds do not share reservoirs.
pub fn rng_for_restart(seed: Option<u64>, restart: usize) -> StdRng {
    match seed {
        Some(seed) => {
            StdRng::seed_from_u64(seed ^ (restart as u64).wrapping_mul(RESTART_SEED_MIX))
        }
        None => StdRng::from_entropy(),
    }
}
