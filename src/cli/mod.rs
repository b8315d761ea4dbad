//! Command-line parsing for the `creg` regression tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code. Every tunable can also be set through a
//! `CREG_*` environment variable (or a `.env` file).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::ResponseTransform;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "creg",
    version,
    about = "OLS / WLS inference and cross-validated lasso for county-level survey data"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit OLS (or two-stage WLS) and print the coefficient table.
    Fit(FitArgs),
    /// Cross-validate a lasso path on a training period and predict the application period.
    Lasso(LassoArgs),
    /// Run both pipelines on a seeded synthetic dataset.
    Demo(DemoArgs),
}

/// Input table and model columns, shared by `fit` and `lasso`.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// CSV file with one row per county-period.
    #[arg(long, value_name = "CSV", env = "CREG_CSV")]
    pub csv: PathBuf,

    /// Response column (e.g. `cli`).
    #[arg(long, env = "CREG_RESPONSE")]
    pub response: String,

    /// Comma-separated predictor columns, in model order.
    #[arg(long, value_delimiter = ',', required = true, env = "CREG_PREDICTORS")]
    pub predictors: Vec<String>,

    /// Transformation applied to the response before fitting.
    #[arg(long, value_enum, default_value_t = ResponseTransform::Identity, env = "CREG_TRANSFORM")]
    pub transform: ResponseTransform,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Two-stage WLS with weights 1/ŷ from a first-stage OLS fit.
    #[arg(long)]
    pub weighted: bool,

    /// Comma-separated coefficients to test jointly against zero.
    #[arg(long = "test", value_delimiter = ',')]
    pub test_terms: Vec<String>,

    /// Significance level for the joint F-test.
    #[arg(long, default_value_t = 0.05, env = "CREG_ALPHA")]
    pub alpha: f64,

    /// Print t-based confidence intervals at this level (e.g. 0.95).
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Print leverage / studentized residual / Cook's distance diagnostics.
    #[arg(long)]
    pub diagnostics: bool,

    /// Rows shown in the influence table.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Write the fitted model (and diagnostics / test, if computed) to JSON.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct LassoArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Column used for the time split (e.g. `period`).
    #[arg(long, env = "CREG_SPLIT_COLUMN")]
    pub split_column: String,

    /// Rows with `split_column < split_at` train; the rest are predicted.
    #[arg(long, env = "CREG_SPLIT_AT")]
    pub split_at: f64,

    #[command(flatten)]
    pub cv: CvArgs,

    /// Write the full selection (CV curve, path, model, predictions) to JSON.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Write application-period predictions to CSV.
    #[arg(long = "export-predictions")]
    pub export_predictions: Option<PathBuf>,
}

/// Cross-validation knobs, shared by `lasso` and `demo`.
#[derive(Debug, Args, Clone)]
pub struct CvArgs {
    /// Number of CV folds.
    #[arg(long, default_value_t = 10, env = "CREG_FOLDS")]
    pub folds: usize,

    /// Seed for the fold shuffle.
    #[arg(long, default_value_t = 42, env = "CREG_SEED")]
    pub seed: u64,

    /// Use contiguous folds in row order instead of a seeded shuffle.
    #[arg(long)]
    pub contiguous: bool,

    /// Length of the auto-generated lambda sequence.
    #[arg(long, default_value_t = 100, env = "CREG_N_LAMBDA")]
    pub n_lambda: usize,

    /// Smallest-to-largest lambda ratio (default depends on n vs p).
    #[arg(long, env = "CREG_LAMBDA_RATIO")]
    pub lambda_ratio: Option<f64>,

    /// Explicit comma-separated lambda sequence (overrides the auto sequence).
    #[arg(long, value_delimiter = ',')]
    pub lambdas: Option<Vec<f64>>,

    /// Standardize predictors before fitting (coefficients stay on the original scale).
    #[arg(long)]
    pub standardize: bool,

    /// Fit folds on one thread.
    #[arg(long)]
    pub sequential: bool,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Synthetic rows.
    #[arg(short = 'n', long, default_value_t = 200)]
    pub n: usize,

    /// Seed for the synthetic data.
    #[arg(long = "data-seed", default_value_t = 7)]
    pub data_seed: u64,

    #[command(flatten)]
    pub cv: CvArgs,
}
