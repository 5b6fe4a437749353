//! Train an ESN with hyperparameter grid search
//!
//! Usage: cargo run --bin esn -- -t train.bin -v val.bin -p test.bin -d out \
//!     -l 0.2 -l 0.4 -s 0.9 -i 0.5 -r 1e-6 -r 1e-4 -k 1 -w 50

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use esn_forecast::{pipeline, EsnConfig, RunOptions};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Train an Echo State Network with hyperparameter grid search",
    after_help = "The -l -r -s -i options can be given more than once; validation data \
                  is then used to find the best value, e.g. -l 0.2 -l 0.4 -l 0.6"
)]
struct Args {
    /// Training data file
    #[arg(short = 't', long)]
    train: PathBuf,

    /// Validation data file
    #[arg(short = 'v', long)]
    validation: Option<PathBuf>,

    /// Test data file
    #[arg(short = 'p', long)]
    test: Option<PathBuf>,

    /// Output directory
    #[arg(short = 'd', long)]
    output_dir: PathBuf,

    /// Leaking rate (repeatable)
    #[arg(short = 'l', long = "leaking-rate", required = true)]
    leaking_rates: Vec<f64>,

    /// Regularization (repeatable)
    #[arg(short = 'r', long = "regularization", required = true)]
    regularizations: Vec<f64>,

    /// Spectral radius (repeatable)
    #[arg(short = 's', long = "spectral-radius", required = true)]
    spectral_radii: Vec<f64>,

    /// Input scaling (repeatable)
    #[arg(short = 'i', long = "input-scaling", required = true)]
    input_scalings: Vec<f64>,

    /// Number of steps to forecast ahead
    #[arg(short = 'k', long)]
    steps: usize,

    /// Washout samples discarded per trial
    #[arg(short = 'w', long)]
    washout: usize,

    /// Reservoir size
    #[arg(short = 'n', long, default_value = "200")]
    reservoir_size: usize,

    /// Connection sparsity (fraction of zero recurrent weights)
    #[arg(short = 'c', long, default_value = "0.85")]
    sparsity: f64,

    /// Number of random initializations
    #[arg(short = 'x', long, default_value = "3")]
    restarts: usize,

    /// Random seed for reproducible reservoirs
    #[arg(long)]
    seed: Option<u64>,

    /// Also save the best model
    #[arg(long)]
    save_model: bool,
}

impl Args {
    fn into_options(self) -> RunOptions {
        let mut config = EsnConfig::default()
            .leaking_rates(self.leaking_rates)
            .regularizations(self.regularizations)
            .spectral_radii(self.spectral_radii)
            .input_scalings(self.input_scalings)
            .steps(self.steps)
            .washout(self.washout)
            .reservoir_size(self.reservoir_size)
            .sparsity(self.sparsity)
            .restarts(self.restarts);
        config.seed = self.seed;

        RunOptions {
            train: self.train,
            validation: self.validation,
            test: self.test,
            output_dir: self.output_dir,
            config,
            save_model: self.save_model,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let options = Args::parse().into_options();

    print_options(&options);
    options.validate().context("invalid options")?;

    let summary = pipeline::run(&options)?;

    println!("\n=== Best Hyperparameters ===");
    println!("Leaking rate:     {}", summary.best.leaking_rate);
    println!("Spectral radius:  {}", summary.best.spectral_radius);
    println!("Input scaling:    {}", summary.best.input_scaling);
    println!("Regularization:   {}", summary.best.regularization);
    match summary.validation_error {
        Some(error) => println!("Validation error: {:.4}%", error),
        None => println!("Validation error: n/a"),
    }
    println!("Candidates scored: {}", summary.candidates_scored);

    if let Some(metrics) = &summary.validation_metrics {
        println!();
        metrics.print_summary();
    }

    println!("\nParameters saved to {}", summary.parameters_path.display());
    if let Some(path) = &summary.predictions_path {
        println!("Predictions saved to {}", path.display());
    }
    if let Some(path) = &summary.model_path {
        println!("Model saved to {}", path.display());
    }

    Ok(())
}

fn print_options(options: &RunOptions) {
    let name = |path: &Option<PathBuf>| {
        path.as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    let config = &options.config;

    println!("Network parameters:");
    println!("  train filename -- {}", name(&Some(options.train.clone())));
    println!("  test filename -- {}", name(&options.test));
    println!("  validation filename -- {}", name(&options.validation));
    println!("  output directory -- {}", options.output_dir.display());
    println!("  input scaling -- {:?}", config.input_scalings);
    println!("  spectral radii -- {:?}", config.spectral_radii);
    println!("  leaking rates -- {:?}", config.leaking_rates);
    println!("  regularizations -- {:?}", config.regularizations);
    println!("  steps -- {}", config.steps);
    println!("  washout -- {}", config.washout);
    println!("  sparsity -- {}", config.sparsity);
    println!("  reservoir size -- {}", config.reservoir_size);
    println!("  number of random initializations -- {}", config.restarts);
}
